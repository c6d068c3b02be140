//! Application configuration value object

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::transfer::RetryPolicy;

/// Default collector base URL
pub const DEFAULT_COLLECTOR_URL: &str = "http://127.0.0.1:8002";

/// Default number of interview steps
pub const DEFAULT_STEPS: u32 = 5;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub collector_url: Option<String>,
    pub steps: Option<u32>,
    pub retry_budget: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub cues: Option<bool>,
    pub prompts: Option<Vec<String>>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            collector_url: Some(DEFAULT_COLLECTOR_URL.to_string()),
            steps: Some(DEFAULT_STEPS),
            retry_budget: Some(RetryPolicy::DEFAULT_BUDGET),
            base_delay_ms: Some(RetryPolicy::DEFAULT_BASE_DELAY.as_millis() as u64),
            cues: Some(false),
            prompts: Some(default_prompts()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            collector_url: other.collector_url.or(self.collector_url),
            steps: other.steps.or(self.steps),
            retry_budget: other.retry_budget.or(self.retry_budget),
            base_delay_ms: other.base_delay_ms.or(self.base_delay_ms),
            cues: other.cues.or(self.cues),
            prompts: other.prompts.or(self.prompts),
        }
    }

    pub fn collector_url_or_default(&self) -> String {
        self.collector_url
            .clone()
            .unwrap_or_else(|| DEFAULT_COLLECTOR_URL.to_string())
    }

    /// Step count; a configured prompt list wins so the two never
    /// disagree.
    pub fn steps_or_default(&self) -> u32 {
        if let Some(prompts) = &self.prompts {
            if !prompts.is_empty() {
                return prompts.len() as u32;
            }
        }
        self.steps.unwrap_or(DEFAULT_STEPS)
    }

    pub fn retry_policy_or_default(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_budget.unwrap_or(RetryPolicy::DEFAULT_BUDGET),
            self.base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(RetryPolicy::DEFAULT_BASE_DELAY),
        )
    }

    pub fn cues_or_default(&self) -> bool {
        self.cues.unwrap_or(false)
    }

    pub fn prompts_or_default(&self) -> Vec<String> {
        match &self.prompts {
            Some(prompts) if !prompts.is_empty() => prompts.clone(),
            _ => default_prompts(),
        }
    }
}

/// Built-in step prompts shown before each recording
pub fn default_prompts() -> Vec<String> {
    [
        "Please introduce yourself and explain why you are interested in this position.",
        "What is your experience with handling network errors and file uploads?",
        "Why is a secure transport important for an application recording audio?",
        "How would you ensure an upload completes despite temporary network failures?",
        "Do you have any questions for us?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
