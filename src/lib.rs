//! VoxCourier - resilient step-by-step interview recorder
//!
//! This crate records interview answers one step at a time from the
//! microphone and uploads each answer to a collector service, surviving
//! transient network failures and interrupted runs.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, HTTP collector, session file, etc.)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
