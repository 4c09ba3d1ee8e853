use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::app::Runtime;
use crate::config::{ensure_profile, profile_mut, save_config, validate_url};
use crate::errors::{CliError, redact_secret};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file and the active profile
    Init {
        #[arg(long = "api-url")]
        api_url: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Print the effective value of a key for the active profile
    Get {
        key: ConfigKey,
        #[arg(long)]
        show_token: bool,
    },
    /// Store a key on the active profile
    Set { key: ConfigKey, value: String },
    /// List profiles
    Profiles,
    /// Make a profile the default
    Use { profile: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigKey {
    #[value(name = "apiUrl")]
    ApiUrl,
    #[value(name = "token")]
    Token,
}

impl ConfigKey {
    fn name(self) -> &'static str {
        match self {
            ConfigKey::ApiUrl => "apiUrl",
            ConfigKey::Token => "token",
        }
    }
}

pub async fn handle(runtime: &mut Runtime, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Init { api_url, token } => init(runtime, api_url, token),
        ConfigCommand::Get { key, show_token } => get(runtime, key, show_token),
        ConfigCommand::Set { key, value } => set(runtime, key, value),
        ConfigCommand::Profiles => profiles(runtime),
        ConfigCommand::Use { profile } => use_profile(runtime, profile),
    }
}

fn init(
    runtime: &mut Runtime,
    api_url: Option<String>,
    token: Option<String>,
) -> Result<(), CliError> {
    let name = runtime.active_profile();
    if let Some(url) = api_url.as_deref() {
        validate_url(url)?;
    }
    let token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    ensure_profile(&mut runtime.config, &name);
    if let Some(profile) = profile_mut(&mut runtime.config, &name) {
        if let Some(url) = api_url {
            profile.api_url = url;
        }
        if token.is_some() {
            profile.token = token;
        }
    }
    runtime.config.profile = name.clone();
    runtime.config_path = save_config(&runtime.config)?;

    if runtime.output.json {
        runtime.output.print_json(&json!({
            "ok": true,
            "profile": name,
            "path": runtime.config_path,
        }))?;
    } else {
        runtime.output.print_human(&format!(
            "Profile '{name}' written to {}",
            runtime.config_path.display()
        ));
    }
    Ok(())
}

/// Reports the value actually in effect, so flag and env overrides show up.
fn get(runtime: &mut Runtime, key: ConfigKey, show_token: bool) -> Result<(), CliError> {
    let value = match key {
        ConfigKey::ApiUrl => Some(runtime.resolved_api_url()?),
        ConfigKey::Token => runtime
            .resolved_token()
            .map(|t| if show_token { t } else { redact_secret(&t) }),
    };

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "key": key.name(), "value": value }))?;
    } else {
        runtime
            .output
            .print_human(value.as_deref().unwrap_or("(not set)"));
    }
    Ok(())
}

fn set(runtime: &mut Runtime, key: ConfigKey, value: String) -> Result<(), CliError> {
    let name = runtime.active_profile();
    if let ConfigKey::ApiUrl = key {
        validate_url(&value)?;
    }

    ensure_profile(&mut runtime.config, &name);
    let profile = profile_mut(&mut runtime.config, &name)
        .ok_or_else(|| CliError::Generic(format!("Profile '{name}' could not be created.")))?;
    match key {
        ConfigKey::ApiUrl => profile.api_url = value,
        ConfigKey::Token => {
            let trimmed = value.trim();
            profile.token = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
    }
    runtime.config_path = save_config(&runtime.config)?;

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "key": key.name() }))?;
    } else {
        runtime
            .output
            .print_human(&format!("Updated {} on '{name}'.", key.name()));
    }
    Ok(())
}

fn profiles(runtime: &mut Runtime) -> Result<(), CliError> {
    let active = runtime.active_profile();
    let mut entries: Vec<_> = runtime.config.profiles.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    if runtime.output.json {
        let payload: Vec<_> = entries
            .iter()
            .map(|(name, profile)| {
                json!({
                    "name": name,
                    "active": **name == active,
                    "apiUrl": profile.api_url,
                    "signedIn": profile.token.as_deref().is_some_and(|t| !t.is_empty()),
                })
            })
            .collect();
        return runtime.output.print_json(&json!({ "profiles": payload }));
    }

    for (name, profile) in entries {
        let marker = if *name == active { "*" } else { " " };
        let signed_in = if profile.token.is_some() {
            " (signed in)"
        } else {
            ""
        };
        runtime
            .output
            .print_human(&format!("{marker} {name}  {}{signed_in}", profile.api_url));
    }
    Ok(())
}

fn use_profile(runtime: &mut Runtime, name: String) -> Result<(), CliError> {
    ensure_profile(&mut runtime.config, &name);
    runtime.config.profile = name.clone();
    runtime.config_path = save_config(&runtime.config)?;

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "profile": name }))?;
    } else {
        runtime.output.print_human(&format!("Active profile: {name}"));
    }
    Ok(())
}
