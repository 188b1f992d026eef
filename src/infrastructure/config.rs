use crate::domain::series::{AnalysisPolicy, DEFAULT_RANGE, DEFAULT_REQUIRED, Trend};
use crate::infrastructure::hub_store::{DEFAULT_ENDPOINT, DEFAULT_REVISION};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

pub const API_TOKEN_VAR: &str = "API_TOKEN";
pub const USERNAME_VAR: &str = "ADMIN_USERNAME";
pub const PASSWORD_VAR: &str = "ADMIN_PASSWORD";
pub const HUB_TOKEN_VAR: &str = "HF_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub dana: DanaSettings,
    pub hub: HubSettings,
    pub policy: PolicySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DanaSettings {
    pub url: Option<String>,
    pub api_token: Option<String>,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HubSettings {
    pub endpoint: String,
    pub revision: String,
    pub dataset_id: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PolicySettings {
    pub range: String,
    pub required: u32,
}

impl DanaSettings {
    pub fn api_token(&self) -> anyhow::Result<&str> {
        self.api_token
            .as_deref()
            .with_context(|| format!("{} is not set", API_TOKEN_VAR))
    }
}

impl HubSettings {
    pub fn token(&self) -> anyhow::Result<&str> {
        self.token
            .as_deref()
            .with_context(|| format!("{} is not set", HUB_TOKEN_VAR))
    }
}

impl PolicySettings {
    pub fn to_policy(&self) -> AnalysisPolicy {
        AnalysisPolicy {
            range: self.range.clone(),
            required: self.required,
            trend: Trend::Smaller,
        }
    }
}

/// Load settings from defaults, an optional settings file and the environment.
///
/// `env` looks up a variable by name; tokens are only ever taken from it.
pub fn load_settings<F>(path: Option<&Path>, env: F) -> anyhow::Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = config::Config::builder()
        .set_default("dana.username", "admin")?
        .set_default("dana.password", "admin")?
        .set_default("hub.endpoint", DEFAULT_ENDPOINT)?
        .set_default("hub.revision", DEFAULT_REVISION)?
        .set_default("policy.range", DEFAULT_RANGE)?
        .set_default("policy.required", i64::from(DEFAULT_REQUIRED))?;

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .set_override_option("dana.api_token", env(API_TOKEN_VAR))?
        .set_override_option("dana.username", env(USERNAME_VAR))?
        .set_override_option("dana.password", env(PASSWORD_VAR))?
        .set_override_option("hub.token", env(HUB_TOKEN_VAR))?
        .build()
        .context("Failed to load settings")?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = load_settings(None, env_of(&[])).unwrap();
        assert_eq!(settings.dana.username, "admin");
        assert_eq!(settings.dana.password, "admin");
        assert!(settings.dana.url.is_none());
        assert!(settings.dana.api_token().is_err());
        assert!(settings.hub.token().is_err());
        assert_eq!(settings.hub.endpoint, "https://huggingface.co");
        assert_eq!(settings.policy.to_policy(), AnalysisPolicy::default());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = load_settings(
            None,
            env_of(&[
                ("API_TOKEN", "secret"),
                ("ADMIN_USERNAME", "root"),
                ("ADMIN_PASSWORD", "hunter2"),
                ("HF_TOKEN", "hf_x"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.dana.api_token().unwrap(), "secret");
        assert_eq!(settings.dana.username, "root");
        assert_eq!(settings.dana.password, "hunter2");
        assert_eq!(settings.hub.token().unwrap(), "hf_x");
    }

    #[test]
    fn test_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dana.toml");
        fs::write(
            &path,
            "[dana]\nurl = \"http://dana.local:7000\"\nusername = \"bench\"\n\n[hub]\ndataset_id = \"org/bench\"\n\n[policy]\nrange = \"10%\"\nrequired = 5\n",
        )
        .unwrap();

        let settings = load_settings(Some(path.as_path()), env_of(&[("ADMIN_USERNAME", "from-env")])).unwrap();
        assert_eq!(settings.dana.url.as_deref(), Some("http://dana.local:7000"));
        assert_eq!(settings.dana.username, "from-env");
        assert_eq!(settings.hub.dataset_id.as_deref(), Some("org/bench"));
        assert_eq!(settings.policy.range, "10%");
        assert_eq!(settings.policy.required, 5);
    }
}
