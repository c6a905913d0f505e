//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, the seen-URL cache, cron parsing and text helpers.

pub mod cache;
pub mod constants;
pub mod cron;
pub mod text;

pub use cache::*;
pub use constants::*;
pub use cron::*;
pub use text::*;
