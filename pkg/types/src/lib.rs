//! Cluster object model consumed by configuration synthesis.

pub mod annotations;
pub mod config;
pub mod configmap;
pub mod endpoint;
pub mod ingress;
pub mod secret;
pub mod service;
pub mod validate;
