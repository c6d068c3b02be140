//! Collector service adapters

pub mod http;

pub use http::HttpCollector;
