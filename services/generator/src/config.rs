use patient_sim_core::workflow::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_REALISM_THRESHOLD, WorkflowConfig,
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4";
const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 120;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub openai_api_key: SecretString,
    pub api_base: String,
    pub chat_model: String,
    pub evaluator_model: String,
    pub realism_threshold: f64,
    pub max_attempts: usize,
    /// `None` when `ORACLE_TIMEOUT_SECS` is `0`.
    pub oracle_timeout: Option<Duration>,
    pub log_level: Level,
    pub prompts_path: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let api_base =
            std::env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        let evaluator_model =
            std::env::var("EVALUATOR_MODEL").unwrap_or_else(|_| chat_model.clone());

        let realism_threshold = parse_var("REALISM_THRESHOLD", DEFAULT_REALISM_THRESHOLD)?;
        if !(0.0..=1.0).contains(&realism_threshold) {
            return Err(ConfigError::InvalidValue(
                "REALISM_THRESHOLD".to_string(),
                format!("{} is outside [0, 1]", realism_threshold),
            ));
        }

        let max_attempts = parse_var("MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let timeout_secs = parse_var("ORACLE_TIMEOUT_SECS", DEFAULT_ORACLE_TIMEOUT_SECS)?;
        let oracle_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        Ok(Self {
            openai_api_key,
            api_base,
            chat_model,
            evaluator_model,
            realism_threshold,
            max_attempts,
            oracle_timeout,
            log_level,
            prompts_path,
        })
    }

    /// The workflow tuning carried by this configuration.
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            realism_threshold: self.realism_threshold,
            max_attempts: self.max_attempts,
            oracle_timeout: self.oracle_timeout,
        }
    }
}

/// Parses an optional variable, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_API_BASE");
            env::remove_var("CHAT_MODEL");
            env::remove_var("EVALUATOR_MODEL");
            env::remove_var("REALISM_THRESHOLD");
            env::remove_var("MAX_ATTEMPTS");
            env::remove_var("ORACLE_TIMEOUT_SECS");
            env::remove_var("RUST_LOG");
            env::remove_var("PROMPTS_PATH");
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.openai_api_key.expose_secret(), "test-openai-key");
        assert_eq!(config.api_base, "https://api.openai.com/v1");
        assert_eq!(config.chat_model, "gpt-4");
        assert_eq!(config.evaluator_model, "gpt-4");
        assert_eq!(config.realism_threshold, 0.7);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.oracle_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.prompts_path, PathBuf::from("./prompts"));
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "custom-openai-key");
            env::set_var("OPENAI_API_BASE", "http://localhost:11434/v1");
            env::set_var("CHAT_MODEL", "gpt-4o");
            env::set_var("EVALUATOR_MODEL", "gpt-4o-mini");
            env::set_var("REALISM_THRESHOLD", "0.85");
            env::set_var("MAX_ATTEMPTS", "5");
            env::set_var("ORACLE_TIMEOUT_SECS", "0");
            env::set_var("RUST_LOG", "debug");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.api_base, "http://localhost:11434/v1");
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.evaluator_model, "gpt-4o-mini");
        assert_eq!(config.realism_threshold, 0.85);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.oracle_timeout, None);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.prompts_path, PathBuf::from("/custom/prompts"));

        let workflow = config.workflow_config();
        assert_eq!(workflow.realism_threshold, 0.85);
        assert_eq!(workflow.max_attempts, 5);
        assert_eq!(workflow.oracle_timeout, None);
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_threshold() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("REALISM_THRESHOLD", "1.5");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "REALISM_THRESHOLD"),
            _ => panic!("Expected InvalidValue for REALISM_THRESHOLD"),
        }

        unsafe {
            env::set_var("REALISM_THRESHOLD", "high");
        }
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidValue(var, _)) if var == "REALISM_THRESHOLD"
        ));
    }

    #[test]
    #[serial]
    fn test_config_zero_attempts() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("MAX_ATTEMPTS", "0");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, msg) => {
                assert_eq!(var, "MAX_ATTEMPTS");
                assert!(msg.contains("at least 1"));
            }
            _ => panic!("Expected InvalidValue for MAX_ATTEMPTS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }
}
