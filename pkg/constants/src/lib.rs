//! Centralized constants for the ingress synthesis workspace.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod ingress;
pub mod network;
pub mod paths;
