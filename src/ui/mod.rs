//! Terminal output helpers

pub mod logging;
pub mod progress;
