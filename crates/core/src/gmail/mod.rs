//! Gmail credential lifecycle
//!
//! The lifecycle manager owns the canonical in-memory credential for the
//! process lifetime; stores and refreshers are injected through the port
//! traits in [`ports`].

pub mod lifecycle;
pub mod ports;
