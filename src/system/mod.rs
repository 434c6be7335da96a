//! Process-level plumbing

pub mod logging;
