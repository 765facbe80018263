//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::speech::CommandSpeech;

/// Classification endpoint used when none is configured
pub const DEFAULT_CLASSIFIER_URL: &str = "https://emotion-reflection-tool-1.onrender.com/";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Classification service endpoint
    pub classifier_url: String,

    /// Transport timeout for classification requests
    pub request_timeout: Option<Duration>,

    /// External recognizer acting as the speech engine
    pub speech: Option<CommandSpeech>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup("REFLECTION_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME").context("HOME is not set")?;
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("reflection")
            }
        };

        let socket_path = lookup("REFLECTION_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("reflection.sock"));

        let classifier_url = lookup("REFLECTION_CLASSIFIER_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string());

        let request_timeout = lookup("REFLECTION_REQUEST_TIMEOUT_SECS")
            .map(|secs| {
                secs.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("invalid REFLECTION_REQUEST_TIMEOUT_SECS: {}", secs))
            })
            .transpose()?;

        let speech = lookup("REFLECTION_SPEECH_COMMAND")
            .and_then(|line| CommandSpeech::from_command_line(&line));

        Ok(Self {
            socket_path,
            data_dir,
            classifier_url,
            request_timeout,
            speech,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load_with(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load_with(&[("HOME", "/home/tester")]).unwrap();
        assert_eq!(
            config.socket_path,
            PathBuf::from("/home/tester/.local/share/reflection/reflection.sock")
        );
        assert_eq!(config.classifier_url, DEFAULT_CLASSIFIER_URL);
        assert!(config.request_timeout.is_none());
        assert!(config.speech.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = load_with(&[
            ("REFLECTION_DATA_DIR", "/tmp/reflect"),
            ("REFLECTION_CLASSIFIER_URL", "http://localhost:8000/analyze"),
            ("REFLECTION_REQUEST_TIMEOUT_SECS", "15"),
            ("REFLECTION_SPEECH_COMMAND", "listen-once --lang en-US"),
        ])
        .unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/reflect/reflection.sock"));
        assert_eq!(config.classifier_url, "http://localhost:8000/analyze");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.speech.unwrap().program(), "listen-once");
    }

    #[test]
    fn test_config_requires_home_without_data_dir() {
        assert!(load_with(&[]).is_err());
    }

    #[test]
    fn test_config_rejects_bad_timeout() {
        let err = load_with(&[("HOME", "/h"), ("REFLECTION_REQUEST_TIMEOUT_SECS", "soon")])
            .unwrap_err();
        assert!(err.to_string().contains("REFLECTION_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_blank_speech_command_means_unsupported() {
        let config = load_with(&[("HOME", "/h"), ("REFLECTION_SPEECH_COMMAND", "  ")]).unwrap();
        assert!(config.speech.is_none());
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("a").join("b");
        let config = load_with(&[("REFLECTION_DATA_DIR", data_dir.to_str().unwrap())]).unwrap();
        config.ensure_dirs().unwrap();
        assert!(data_dir.is_dir());
    }
}
