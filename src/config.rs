use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::CliError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

pub const TOKEN_ENV: &str = "AURYVIA_TOKEN";
pub const API_URL_ENV: &str = "AURYVIA_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub profile: String,
    pub profiles: HashMap<String, ProfileConfig>,
}

impl Default for CliConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("default".to_string(), ProfileConfig::default());
        Self {
            profile: "default".to_string(),
            profiles,
        }
    }
}

pub fn config_path() -> Result<PathBuf, CliError> {
    let base = dirs::config_dir().ok_or_else(|| {
        CliError::Generic("Could not resolve config directory for this OS.".to_string())
    })?;
    Ok(base.join("auryvia").join("config.json"))
}

pub fn load_config() -> Result<CliConfig, CliError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<CliConfig, CliError> {
    if !path.exists() {
        return Ok(CliConfig::default());
    }

    let text = fs::read_to_string(path)?;
    let mut config: CliConfig = serde_json::from_str(&text)?;
    let profile = config.profile.clone();
    ensure_profile(&mut config, &profile);
    Ok(config)
}

pub fn save_config(config: &CliConfig) -> Result<PathBuf, CliError> {
    let path = config_path()?;
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &CliConfig, path: &Path) -> Result<(), CliError> {
    let parent = path
        .parent()
        .ok_or_else(|| CliError::Generic("Invalid config path.".to_string()))?;
    fs::create_dir_all(parent)?;
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    tracing::debug!(path = %path.display(), "config saved");
    Ok(())
}

pub fn active_profile_name(config: &CliConfig, profile_override: Option<&str>) -> String {
    profile_override
        .map(|s| s.to_string())
        .unwrap_or_else(|| config.profile.clone())
}

pub fn ensure_profile(config: &mut CliConfig, profile_name: &str) {
    config
        .profiles
        .entry(profile_name.to_string())
        .or_default();
}

pub fn profile_ref<'a>(config: &'a CliConfig, profile_name: &str) -> Option<&'a ProfileConfig> {
    config.profiles.get(profile_name)
}

pub fn profile_mut<'a>(
    config: &'a mut CliConfig,
    profile_name: &str,
) -> Option<&'a mut ProfileConfig> {
    config.profiles.get_mut(profile_name)
}

/// Base URL precedence: `--api-url`, then `AURYVIA_API_URL`, then the profile.
pub fn resolve_api_url(
    config: &CliConfig,
    profile_name: &str,
    api_override: Option<&str>,
) -> Result<String, CliError> {
    let env_url = non_empty_env(API_URL_ENV);
    if let Some(url) = api_override.or(env_url.as_deref()) {
        validate_url(url)?;
        return Ok(url.to_string());
    }

    let profile = profile_ref(config, profile_name)
        .ok_or_else(|| CliError::Usage(format!("Profile '{profile_name}' does not exist.")))?;
    validate_url(&profile.api_url)?;
    Ok(profile.api_url.clone())
}

pub fn resolve_token(config: &CliConfig, profile_name: &str) -> Option<String> {
    non_empty_env(TOKEN_ENV).or_else(|| {
        profile_ref(config, profile_name)
            .and_then(|p| p.token.clone())
            .filter(|t| !t.trim().is_empty())
    })
}

pub fn validate_url(value: &str) -> Result<(), CliError> {
    let parsed = Url::parse(value)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(CliError::Usage(
            "API URL must use http:// or https://.".to_string(),
        ));
    }
    Ok(())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.profile, "default");
        assert_eq!(
            profile_ref(&config, "default").unwrap().api_url,
            DEFAULT_API_URL
        );
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = CliConfig::default();
        ensure_profile(&mut config, "staging");
        let staging = profile_mut(&mut config, "staging").unwrap();
        staging.api_url = "https://staging.example.com".to_string();
        staging.token = Some("tok-123".to_string());
        config.profile = "staging".to_string();
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile, "staging");
        let staging = profile_ref(&loaded, "staging").unwrap();
        assert_eq!(staging.api_url, "https://staging.example.com");
        assert_eq!(staging.token.as_deref(), Some("tok-123"));
    }

    #[test]
    fn active_profile_missing_from_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"profile":"work","profiles":{}}"#).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert!(profile_ref(&loaded, "work").is_some());
    }

    #[test]
    fn override_wins_over_profile_url() {
        let config = CliConfig::default();
        let url = resolve_api_url(&config, "default", Some("https://api.example.com")).unwrap();
        assert_eq!(url, "https://api.example.com");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(CliError::Usage(_))
        ));
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("https://example.com").is_ok());
    }

    #[test]
    fn unknown_profile_is_a_usage_error() {
        let config = CliConfig::default();
        assert!(matches!(
            resolve_api_url(&config, "nope", None),
            Err(CliError::Usage(_))
        ));
    }
}
