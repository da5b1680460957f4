//! Cross-cutting helpers shared by the service and server crates:
//! logging setup, startup environment checks, Prometheus metrics and
//! small response types.

pub mod types;
pub mod utils;
pub mod env;
pub mod metrics;
