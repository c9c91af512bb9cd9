//! Certificate material owned by the controller itself.

pub mod fake;

pub use fake::FakeCertificate;
