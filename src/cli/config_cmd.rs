//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    // Validate key
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }

    // Validate value based on key type
    validate_config_value(key, value)?;

    // Load existing config
    let mut config = store.load().await?;

    // Update the appropriate field
    match key {
        "collector_url" => config.collector_url = Some(value.to_string()),
        "steps" => config.steps = Some(parse_u32(key, value)?),
        "retry_budget" => config.retry_budget = Some(parse_u32(key, value)?),
        "base_delay_ms" => {
            config.base_delay_ms =
                Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| ConfigError::ValidationError {
                            key: key.to_string(),
                            message: "Value must be a non-negative integer".to_string(),
                        })?,
                )
        }
        "cues" => {
            config.cues = Some(parse_bool(value).map_err(|_| ConfigError::ValidationError {
                key: key.to_string(),
                message: "Value must be 'true' or 'false'".to_string(),
            })?)
        }
        _ => unreachable!(), // Already validated
    }

    // Save config
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    // Validate key
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }

    let config = store.load().await?;

    let value = match key {
        "collector_url" => config.collector_url,
        "steps" => config.steps.map(|n| n.to_string()),
        "retry_budget" => config.retry_budget.map(|n| n.to_string()),
        "base_delay_ms" => config.base_delay_ms.map(|n| n.to_string()),
        "cues" => config.cues.map(|b| b.to_string()),
        _ => unreachable!(),
    };

    match value {
        Some(v) => presenter.output(&v),
        None => presenter.output("(not set)"),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    presenter.key_value(
        "collector_url",
        config.collector_url.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "steps",
        &config
            .steps
            .map(|n| n.to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    presenter.key_value(
        "retry_budget",
        &config
            .retry_budget
            .map(|n| n.to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    presenter.key_value(
        "base_delay_ms",
        &config
            .base_delay_ms
            .map(|n| n.to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    presenter.key_value(
        "cues",
        &config
            .cues
            .map(|b| b.to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
    );

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "steps" => {
            let n = parse_u32(key, value)?;
            if n == 0 {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be at least 1".to_string(),
                });
            }
        }
        "retry_budget" => {
            parse_u32(key, value)?;
        }
        "base_delay_ms" => {
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be a non-negative integer".to_string(),
                })?;
        }
        "cues" => {
            parse_bool(value).map_err(|_| ConfigError::ValidationError {
                key: key.to_string(),
                message: "Value must be 'true' or 'false'".to_string(),
            })?;
        }
        _ => {} // collector_url accepts any string
    }
    Ok(())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::ValidationError {
            key: key.to_string(),
            message: "Value must be a non-negative integer".to_string(),
        })
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert_eq!(parse_bool("yes"), Ok(true));
        assert_eq!(parse_bool("no"), Ok(false));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("invalid").is_err());
    }

    #[test]
    fn validate_steps_valid() {
        assert!(validate_config_value("steps", "5").is_ok());
        assert!(validate_config_value("steps", "1").is_ok());
    }

    #[test]
    fn validate_steps_invalid() {
        assert!(validate_config_value("steps", "0").is_err());
        assert!(validate_config_value("steps", "lots").is_err());
        assert!(validate_config_value("steps", "-1").is_err());
    }

    #[test]
    fn validate_retry_budget() {
        assert!(validate_config_value("retry_budget", "0").is_ok());
        assert!(validate_config_value("retry_budget", "3").is_ok());
        assert!(validate_config_value("retry_budget", "never").is_err());
    }

    #[test]
    fn validate_base_delay() {
        assert!(validate_config_value("base_delay_ms", "2000").is_ok());
        assert!(validate_config_value("base_delay_ms", "soon").is_err());
    }

    #[test]
    fn validate_cues() {
        assert!(validate_config_value("cues", "true").is_ok());
        assert!(validate_config_value("cues", "maybe").is_err());
    }
}
