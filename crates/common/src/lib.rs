//! Shared value types used across the ribbonscape crates.

pub mod types;

pub use types::{Color, Transform};

pub fn crate_info() -> &'static str {
    "ribbonscape-common v0.1.0"
}
