//! SmartLog Control - terminal front end for the logistics assistant
//!
//! Modules are exposed for integration testing.

pub mod errors;
pub mod logging;
pub mod repl;
pub mod startup;
pub mod voice;
