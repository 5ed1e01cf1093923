use clap::Parser;
use std::time::Duration;

/// Endpoint used when nothing is configured
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/predict";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("timeout must be at least one second")]
    ZeroTimeout,
}

/// Plant leaf disease detection
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Settings {
    /// Base URL of the classification endpoint
    #[arg(long, env = "LEAF_PREDICT_URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Skip the plant selection modal and post to the bare endpoint
    #[arg(
        long,
        env = "LEAF_NO_SPECIES_SELECTOR",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub no_species_selector: bool,

    /// Command that takes a photo; "{output}" is replaced by the target file
    #[arg(long, env = "LEAF_CAPTURE_COMMAND")]
    pub capture_command: Option<String>,

    /// Give up on a prediction after this many seconds (no limit by default)
    #[arg(long, env = "LEAF_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Check the values clap cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };

        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    pub fn species_selector(&self) -> bool {
        !self.no_species_selector
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    const ENV_VARS: [&str; 4] = [
        "LEAF_PREDICT_URL",
        "LEAF_NO_SPECIES_SELECTOR",
        "LEAF_CAPTURE_COMMAND",
        "LEAF_TIMEOUT_SECS",
    ];

    /// Serializes tests that read the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Take the lock with every LEAF_* variable unset
    fn clean_env() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
        guard
    }

    fn try_parse(args: &[&str]) -> Result<Settings, clap::Error> {
        let mut argv = vec!["leaf-disease-detector"];
        argv.extend_from_slice(args);
        Settings::try_parse_from(argv)
    }

    fn parse(args: &[&str]) -> Settings {
        let _env = clean_env();
        try_parse(args).unwrap()
    }

    #[test]
    fn test_defaults_ignore_shell_environment() {
        let _env = clean_env();
        let settings = try_parse(&[]).unwrap();
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert!(settings.species_selector());
        assert_eq!(settings.capture_command, None);
        assert_eq!(settings.timeout(), None);
    }

    #[test]
    fn test_species_selector_env_accepts_numbers() {
        let _env = clean_env();

        std::env::set_var("LEAF_NO_SPECIES_SELECTOR", "1");
        let disabled = try_parse(&[]);
        std::env::set_var("LEAF_NO_SPECIES_SELECTOR", "0");
        let enabled = try_parse(&[]);
        std::env::remove_var("LEAF_NO_SPECIES_SELECTOR");

        assert!(!disabled.unwrap().species_selector());
        assert!(enabled.unwrap().species_selector());
    }

    #[test]
    fn test_endpoint_from_env() {
        let _env = clean_env();

        std::env::set_var("LEAF_PREDICT_URL", "http://10.0.0.5:9000/predict");
        let settings = try_parse(&[]);
        std::env::remove_var("LEAF_PREDICT_URL");

        assert_eq!(settings.unwrap().endpoint, "http://10.0.0.5:9000/predict");
    }

    #[test]
    fn test_endpoint_flag() {
        let settings = parse(&["--endpoint", "https://plants.example.com/predict"]);
        assert_eq!(settings.endpoint, "https://plants.example.com/predict");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_species_selector_toggle() {
        assert!(parse(&["--endpoint", DEFAULT_ENDPOINT]).species_selector());
        assert!(!parse(&["--no-species-selector"]).species_selector());
    }

    #[test]
    fn test_timeout() {
        let settings = parse(&["--timeout-secs", "15"]);
        assert_eq!(settings.timeout(), Some(Duration::from_secs(15)));

        let settings = parse(&["--timeout-secs", "0"]);
        assert!(matches!(settings.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        for endpoint in ["not a url", "ftp://10.0.2.2/predict", "file:///tmp/predict"] {
            let settings = parse(&["--endpoint", endpoint]);
            assert!(
                matches!(settings.validate(), Err(ConfigError::InvalidEndpoint { .. })),
                "{endpoint} should be rejected"
            );
        }
    }
}
