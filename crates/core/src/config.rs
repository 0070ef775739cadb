//! Pipeline configuration: TOML file, then environment, then caller overrides.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, Yt2BlogError},
    provider::Provider,
};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_WEB_SEARCH_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub provider: Provider,
    /// Overrides the provider's default model when set.
    pub model: Option<String>,
    /// Overrides the provider's endpoint when set.
    pub api_url: Option<String>,
    pub request_timeout_secs: u64,
    pub web_search_max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            api_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            web_search_max_tokens: DEFAULT_WEB_SEARCH_MAX_TOKENS,
        }
    }
}

/// `<config dir>/yt2blog/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("yt2blog").join(CONFIG_FILE_NAME))
}

impl PipelineConfig {
    /// Load from `path`, or from the default location when it exists, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw).map_err(|e| Yt2BlogError::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        config.validate(&path.display().to_string())?;
        Ok(config)
    }

    /// Apply `YT2BLOG_PROVIDER`, `YT2BLOG_MODEL`, `YT2BLOG_API_URL` and
    /// `YT2BLOG_TIMEOUT_SECS` read through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = env("YT2BLOG_PROVIDER") {
            self.provider = provider.parse()?;
        }
        if let Some(model) = env("YT2BLOG_MODEL") {
            self.model = Some(model);
        }
        if let Some(url) = env("YT2BLOG_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(secs) = env("YT2BLOG_TIMEOUT_SECS") {
            self.request_timeout_secs =
                secs.trim().parse().map_err(|_| Yt2BlogError::Config {
                    path: "YT2BLOG_TIMEOUT_SECS".to_string(),
                    reason: format!("expected whole seconds, got {secs:?}"),
                })?;
        }

        self.validate("environment")?;
        Ok(self)
    }

    fn validate(&self, origin: &str) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Yt2BlogError::Config {
                path: origin.to_string(),
                reason: "request_timeout_secs must be > 0".to_string(),
            });
        }
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(Yt2BlogError::Config {
                path: origin.to_string(),
                reason: "model must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.config().model)
    }

    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.provider.config().api_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_follow_provider() {
        let config = PipelineConfig::default();
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.api_url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "provider = \"grok\"\nrequest_timeout_secs = 30\n",
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.provider, Provider::Grok);
        assert_eq!(config.model(), "grok-4-fast");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.web_search_max_tokens, DEFAULT_WEB_SEARCH_MAX_TOKENS);
    }

    #[test]
    fn rejects_unknown_keys_and_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "temprature = 0.2\n").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&path),
            Err(Yt2BlogError::Config { .. })
        ));

        std::fs::write(&path, "request_timeout_secs = 0\n").unwrap();
        assert!(PipelineConfig::from_file(&path).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("YT2BLOG_PROVIDER", "gemini"),
            ("YT2BLOG_MODEL", "gemini-2.5-pro"),
            ("YT2BLOG_TIMEOUT_SECS", "45"),
            ("YT2BLOG_API_URL", ""),
        ]
        .into_iter()
        .collect();

        let config = PipelineConfig::default()
            .with_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.model(), "gemini-2.5-pro");
        assert_eq!(config.request_timeout_secs, 45);
        assert!(config.api_url.is_none());
    }

    #[test]
    fn bad_timeout_in_environment_is_config_error() {
        let result = PipelineConfig::default()
            .with_env_overrides(|k| (k == "YT2BLOG_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert!(matches!(result, Err(Yt2BlogError::Config { .. })));
    }
}
