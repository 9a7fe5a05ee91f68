use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::normalize::Language;
use crate::util::retry::RetryConfig;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// ジョブが省略したパラメータの既定値と外部リソースの設定。
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    seed: u64,
    language: Language,
    translator_url: Option<String>,
    translator_api_key: Option<String>,
    translator_timeout: Duration,
    translation_max_attempts: usize,
    translation_backoff_ms: u64,
    sentiment_lexicon: Option<PathBuf>,
    sentiment_lemmas: Option<PathBuf>,
    sentiment_lexicon_language: Language,
    cluster_threshold: f64,
    sub_clusters: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 42,
            language: Language::English,
            translator_url: None,
            translator_api_key: None,
            translator_timeout: Duration::from_millis(10_000),
            translation_max_attempts: 5,
            translation_backoff_ms: 1000,
            sentiment_lexicon: None,
            sentiment_lemmas: None,
            sentiment_lexicon_language: Language::Spanish,
            cluster_threshold: 0.5,
            sub_clusters: 2,
        }
    }
}

impl Config {
    /// 環境変数から設定値を読み込み、検証する。すべて任意で、未設定なら既定値を使う。
    ///
    /// # Errors
    /// 値のパースに失敗した場合、または見出し語辞書だけが指定された場合は
    /// [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let seed = parse_u64("ANALYTICS_SEED", 42)?;
        let language = parse_language("ANALYTICS_LANGUAGE", "english")?;

        let translator_url = env::var("ANALYTICS_TRANSLATOR_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let translator_api_key = env::var("ANALYTICS_TRANSLATOR_API_KEY").ok();
        let translator_timeout = parse_duration_ms("ANALYTICS_TRANSLATOR_TIMEOUT_MS", 10_000)?;

        // Retry settings (fixed backoff)
        let translation_max_attempts = parse_usize("ANALYTICS_TRANSLATION_MAX_ATTEMPTS", 5)?;
        if translation_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "ANALYTICS_TRANSLATION_MAX_ATTEMPTS",
                source: anyhow::anyhow!("must be greater than zero"),
            });
        }
        let translation_backoff_ms = parse_u64("ANALYTICS_TRANSLATION_BACKOFF_MS", 1000)?;

        let sentiment_lexicon = env::var("ANALYTICS_SENTIMENT_LEXICON").ok().map(PathBuf::from);
        let sentiment_lemmas = env::var("ANALYTICS_SENTIMENT_LEMMAS").ok().map(PathBuf::from);
        if sentiment_lemmas.is_some() && sentiment_lexicon.is_none() {
            return Err(ConfigError::Missing("ANALYTICS_SENTIMENT_LEXICON"));
        }
        let sentiment_lexicon_language =
            parse_language("ANALYTICS_SENTIMENT_LEXICON_LANGUAGE", "spanish")?;

        let cluster_threshold = parse_f64("ANALYTICS_CLUSTER_THRESHOLD", 0.5)?;
        if !(cluster_threshold > 0.0 && cluster_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                name: "ANALYTICS_CLUSTER_THRESHOLD",
                source: anyhow::anyhow!("must be within (0, 1], got {cluster_threshold}"),
            });
        }
        let sub_clusters = parse_usize("ANALYTICS_SUB_CLUSTERS", 2)?;
        if sub_clusters < 2 {
            return Err(ConfigError::Invalid {
                name: "ANALYTICS_SUB_CLUSTERS",
                source: anyhow::anyhow!("must be at least 2"),
            });
        }

        Ok(Self {
            seed,
            language,
            translator_url,
            translator_api_key,
            translator_timeout,
            translation_max_attempts,
            translation_backoff_ms,
            sentiment_lexicon,
            sentiment_lemmas,
            sentiment_lexicon_language,
            cluster_threshold,
            sub_clusters,
        })
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn translator_url(&self) -> Option<&str> {
        self.translator_url.as_deref()
    }

    #[must_use]
    pub fn translator_api_key(&self) -> Option<&str> {
        self.translator_api_key.as_deref()
    }

    #[must_use]
    pub fn translator_timeout(&self) -> Duration {
        self.translator_timeout
    }

    /// 翻訳の再試行設定（固定間隔）。
    #[must_use]
    pub fn translation_retry(&self) -> RetryConfig {
        RetryConfig::fixed(self.translation_max_attempts, self.translation_backoff_ms)
    }

    #[must_use]
    pub fn sentiment_lexicon(&self) -> Option<&PathBuf> {
        self.sentiment_lexicon.as_ref()
    }

    #[must_use]
    pub fn sentiment_lemmas(&self) -> Option<&PathBuf> {
        self.sentiment_lemmas.as_ref()
    }

    #[must_use]
    pub fn sentiment_lexicon_language(&self) -> Language {
        self.sentiment_lexicon_language
    }

    #[must_use]
    pub fn cluster_threshold(&self) -> f64 {
        self.cluster_threshold
    }

    #[must_use]
    pub fn sub_clusters(&self) -> usize {
        self.sub_clusters
    }
}

fn parse_language(name: &'static str, default: &str) -> Result<Language, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<Language>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let ms = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(ms))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 12] = [
        "ANALYTICS_SEED",
        "ANALYTICS_LANGUAGE",
        "ANALYTICS_TRANSLATOR_URL",
        "ANALYTICS_TRANSLATOR_API_KEY",
        "ANALYTICS_TRANSLATOR_TIMEOUT_MS",
        "ANALYTICS_TRANSLATION_MAX_ATTEMPTS",
        "ANALYTICS_TRANSLATION_BACKOFF_MS",
        "ANALYTICS_SENTIMENT_LEXICON",
        "ANALYTICS_SENTIMENT_LEMMAS",
        "ANALYTICS_SENTIMENT_LEXICON_LANGUAGE",
        "ANALYTICS_CLUSTER_THRESHOLD",
        "ANALYTICS_SUB_CLUSTERS",
    ];

    fn set_env(name: &str, value: &str) {
        // SAFETY: tests run sequentially and assign valid UTF-8 values.
        unsafe {
            env::set_var(name, value);
        }
    }

    fn reset_env() {
        for key in KEYS {
            // SAFETY: tests run sequentially and clean up deterministic keys.
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn from_env_uses_defaults_when_unset() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();

        let config = Config::from_env().expect("config should load");

        assert_eq!(config, Config::default());
        assert_eq!(config.language(), Language::English);
        assert!(config.translator_url().is_none());
        assert_eq!(config.translator_timeout(), Duration::from_millis(10_000));
        assert_eq!(config.translation_retry(), RetryConfig::fixed(5, 1000));
        assert!((config.cluster_threshold() - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.sub_clusters(), 2);
    }

    #[test]
    fn from_env_overrides_values() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("ANALYTICS_SEED", "7");
        set_env("ANALYTICS_LANGUAGE", "es");
        set_env("ANALYTICS_TRANSLATOR_URL", "http://localhost:5000/");
        set_env("ANALYTICS_TRANSLATION_MAX_ATTEMPTS", "3");
        set_env("ANALYTICS_TRANSLATION_BACKOFF_MS", "250");
        set_env("ANALYTICS_SENTIMENT_LEXICON", "/tmp/fr.tsv");
        set_env("ANALYTICS_SENTIMENT_LEXICON_LANGUAGE", "french");
        set_env("ANALYTICS_CLUSTER_THRESHOLD", "0.3");

        let config = Config::from_env().expect("config should load");

        assert_eq!(config.seed(), 7);
        assert_eq!(config.language(), Language::Spanish);
        assert_eq!(config.translator_url(), Some("http://localhost:5000/"));
        assert_eq!(config.translation_retry(), RetryConfig::fixed(3, 250));
        assert_eq!(config.sentiment_lexicon(), Some(&PathBuf::from("/tmp/fr.tsv")));
        assert_eq!(config.sentiment_lexicon_language(), Language::French);
        assert!((config.cluster_threshold() - 0.3).abs() < f64::EPSILON);
        reset_env();
    }

    #[test]
    fn from_env_rejects_invalid_values() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("ANALYTICS_SEED", "forty-two");
        let error = Config::from_env().expect_err("bad seed");
        assert!(matches!(error, ConfigError::Invalid { name: "ANALYTICS_SEED", .. }));

        reset_env();
        set_env("ANALYTICS_LANGUAGE", "klingon");
        let error = Config::from_env().expect_err("bad language");
        assert!(matches!(error, ConfigError::Invalid { name: "ANALYTICS_LANGUAGE", .. }));

        reset_env();
        set_env("ANALYTICS_SUB_CLUSTERS", "1");
        assert!(Config::from_env().is_err());
        reset_env();
    }

    #[test]
    fn lemmas_without_lexicon_is_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("ANALYTICS_SENTIMENT_LEMMAS", "/tmp/lemmas.tsv");

        let error = Config::from_env().expect_err("lexicon required");

        assert!(matches!(error, ConfigError::Missing("ANALYTICS_SENTIMENT_LEXICON")));
        reset_env();
    }
}
