//! Configuration domain

pub mod app_config;

pub use app_config::{default_prompts, AppConfig, DEFAULT_COLLECTOR_URL, DEFAULT_STEPS};
