//! Foundation module - small utilities shared by the wrapper layer
//!
//! - Slot-map backed id tables used by the native surface
//! - Logging setup

pub mod collections;
pub mod logging;
