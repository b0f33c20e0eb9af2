//! Configuration management for voxkb
//!
//! Precedence for every setting: environment > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::completion::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use crate::locale::Locale;
use crate::voice::VoiceSettings;
use crate::{Error, Result};

use file::VoxkbConfigFile;

/// Default completion request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default knowledge base location, relative to the working directory
const DEFAULT_KNOWLEDGE: &str = "knowledge.json";

/// voxkb configuration
#[derive(Debug)]
pub struct Config {
    /// Deployment locale (response language, speech language, UI strings)
    pub locale: Locale,

    /// Knowledge base path or URL
    pub knowledge: String,

    /// Completion endpoint configuration
    pub completion: CompletionConfig,

    /// Credential configuration
    pub credential: CredentialConfig,

    /// Speech output configuration
    pub speech: SpeechConfig,
}

/// Completion endpoint configuration
///
/// Temperature and the reply length cap are deliberately absent.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Chat-completions URL
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Credential configuration
#[derive(Debug)]
pub struct CredentialConfig {
    /// Token file written by `voxkb token set`
    pub file: PathBuf,

    /// Token from `VOXKB_TOKEN`; takes precedence over the file
    pub token: Option<SecretString>,
}

/// Speech output configuration
#[derive(Debug, Clone, Copy)]
pub struct SpeechConfig {
    /// Speaking rate multiplier (0.1 to 10.0)
    pub rate: f32,

    /// Voice pitch (0.0 to 2.0)
    pub pitch: f32,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the locale is unknown or a numeric value is out of range
    pub fn from_sources(fc: VoxkbConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let locale = match env("VOXKB_LOCALE").or(fc.locale) {
            Some(value) => value.parse()?,
            None => Locale::default(),
        };

        let knowledge = env("VOXKB_KNOWLEDGE")
            .or(fc.knowledge)
            .unwrap_or_else(|| DEFAULT_KNOWLEDGE.to_string());

        let completion = CompletionConfig {
            endpoint: env("VOXKB_ENDPOINT")
                .or(fc.completion.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: env("VOXKB_MODEL")
                .or(fc.completion.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(
                env("VOXKB_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .or(fc.completion.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        };

        if completion.timeout.is_zero() {
            return Err(Error::Config("completion timeout must be positive".to_string()));
        }

        let credential = CredentialConfig {
            file: env("VOXKB_CREDENTIAL_FILE")
                .or(fc.credential.file)
                .map_or_else(default_credential_file, PathBuf::from),
            token: env("VOXKB_TOKEN")
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
        };

        let speech = SpeechConfig {
            rate: env("VOXKB_SPEECH_RATE")
                .and_then(|s| s.parse().ok())
                .or(fc.speech.rate)
                .unwrap_or(1.0),
            pitch: env("VOXKB_SPEECH_PITCH")
                .and_then(|s| s.parse().ok())
                .or(fc.speech.pitch)
                .unwrap_or(1.0),
        };

        if !(0.1..=10.0).contains(&speech.rate) {
            return Err(Error::Config(format!(
                "speech rate {} out of range (0.1 to 10.0)",
                speech.rate
            )));
        }
        if !(0.0..=2.0).contains(&speech.pitch) {
            return Err(Error::Config(format!(
                "speech pitch {} out of range (0.0 to 2.0)",
                speech.pitch
            )));
        }

        Ok(Self {
            locale,
            knowledge,
            completion,
            credential,
            speech,
        })
    }

    /// Credential store selected by this configuration
    ///
    /// A token from the environment lives in memory only; otherwise the
    /// token file is used.
    #[must_use]
    pub fn credential_store(&self) -> Arc<dyn CredentialStore> {
        match &self.credential.token {
            Some(token) => {
                tracing::debug!("using credential from VOXKB_TOKEN");
                Arc::new(MemoryCredentialStore::new(Some(token.expose_secret())))
            }
            None => Arc::new(FileCredentialStore::new(self.credential.file.clone())),
        }
    }

    /// Voice parameters for spoken output
    #[must_use]
    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            lang: self.locale.tag().to_string(),
            rate: self.speech.rate,
            pitch: self.speech.pitch,
        }
    }
}

/// Default token file: `~/.config/voxkb/token`
fn default_credential_file() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".config/voxkb/token"),
        |d| d.config_dir().join("voxkb").join("token"),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(VoxkbConfigFile::default(), env_from(&[])).unwrap();

        assert_eq!(config.locale, Locale::Hungarian);
        assert_eq!(config.knowledge, "knowledge.json");
        assert_eq!(config.completion.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.timeout, Duration::from_secs(30));
        assert!(config.credential.token.is_none());
        assert!(config.credential.file.ends_with("voxkb/token"));
        assert!((config.speech.rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_env_overrides_file() {
        let fc: VoxkbConfigFile = toml::from_str(
            r#"
            locale = "hu"
            knowledge = "from-file.json"

            [completion]
            model = "file-model"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            fc,
            env_from(&[("VOXKB_LOCALE", "en-US"), ("VOXKB_MODEL", "env-model")]),
        )
        .unwrap();

        assert_eq!(config.locale, Locale::English);
        assert_eq!(config.completion.model, "env-model");
        assert_eq!(config.knowledge, "from-file.json");
        assert_eq!(config.completion.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_numeric_env_falls_back() {
        let config = Config::from_sources(
            VoxkbConfigFile::default(),
            env_from(&[("VOXKB_TIMEOUT_SECS", "soon")]),
        )
        .unwrap();
        assert_eq!(config.completion.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(
            Config::from_sources(VoxkbConfigFile::default(), env_from(&[("VOXKB_LOCALE", "xx")]))
                .is_err()
        );
        assert!(
            Config::from_sources(
                VoxkbConfigFile::default(),
                env_from(&[("VOXKB_SPEECH_RATE", "50")])
            )
            .is_err()
        );
        assert!(
            Config::from_sources(
                VoxkbConfigFile::default(),
                env_from(&[("VOXKB_TIMEOUT_SECS", "0")])
            )
            .is_err()
        );
    }

    #[test]
    fn test_env_token_uses_memory_store() {
        let config = Config::from_sources(
            VoxkbConfigFile::default(),
            env_from(&[("VOXKB_TOKEN", "ghp_env")]),
        )
        .unwrap();

        let store = config.credential_store();
        assert_eq!(store.get().unwrap().bearer(), "Bearer ghp_env");
    }

    #[test]
    fn test_voice_settings_follow_locale() {
        let config = Config::from_sources(
            VoxkbConfigFile::default(),
            env_from(&[("VOXKB_LOCALE", "en"), ("VOXKB_SPEECH_PITCH", "1.5")]),
        )
        .unwrap();

        let voice = config.voice_settings();
        assert_eq!(voice.lang, "en-US");
        assert!((voice.pitch - 1.5).abs() < f32::EPSILON);
    }
}
