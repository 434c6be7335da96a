//! Tabletrail - loyalty visit & rewards engine for restaurant ordering
//!
//! Groups a pseudonymous visitor's orders into visits, gates rewards on
//! banked visits and keeps a convertible points ledger.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//!
//! # Architecture
//! - `loyalty`: Pure rules (session state machine, eligibility, gift lifecycle, rewards)
//! - `storage`: SeaORM backends, row locks and the points ledger
//! - `services`: Transactional orchestration shared by HTTP and tests
//! - `api`: HTTP services and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging

pub mod api;
pub mod config;
pub mod errors;
pub mod loyalty;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
