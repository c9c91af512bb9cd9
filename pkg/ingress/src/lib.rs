//! Configuration synthesis: turns ingresses and live cluster state into the
//! render-ready model of upstreams, servers, locations and stream services.
//!
//! Entry point is [`Synthesizer::build_configuration`].

pub mod annotations;
pub mod backends;
pub mod canary;
pub mod config;
pub mod configuration;
pub mod endpoints;
pub mod model;
pub mod servers;
pub mod stream;
pub mod synthesizer;
pub mod upstreams;

pub use config::{Config, ListenPorts};
pub use configuration::Synthesis;
pub use model::Configuration;
pub use synthesizer::Synthesizer;
