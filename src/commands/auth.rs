use clap::Subcommand;
use serde_json::json;

use crate::app::Runtime;
use crate::backend::Backend;
use crate::config::{ensure_profile, profile_mut, save_config};
use crate::errors::{CliError, redact_secret};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store a bearer token issued by the identity provider
    Login {
        /// Token to store; prompted for (hidden) when omitted
        #[arg(long)]
        token: Option<String>,
    },
    /// Forget the active profile's token
    Logout,
    /// Show whether the active profile is signed in
    Status {
        /// Confirm the token with the backend
        #[arg(long)]
        verify: bool,
    },
}

pub async fn handle(runtime: &mut Runtime, command: AuthCommand) -> Result<(), CliError> {
    match command {
        AuthCommand::Login { token } => login(runtime, token),
        AuthCommand::Logout => logout(runtime),
        AuthCommand::Status { verify } => status(runtime, verify).await,
    }
}

fn login(runtime: &mut Runtime, token: Option<String>) -> Result<(), CliError> {
    let token = match token {
        Some(t) => t,
        None if is_ci() || runtime.output.json => {
            return Err(CliError::Usage(
                "No terminal to prompt on. Pass `--token` explicitly.".to_string(),
            ));
        }
        None => rpassword::prompt_password("Bearer token: ")
            .map_err(|e| CliError::Generic(format!("Failed reading token: {e}")))?,
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::Usage("Token cannot be empty.".to_string()));
    }

    let name = runtime.active_profile();
    ensure_profile(&mut runtime.config, &name);
    if let Some(profile) = profile_mut(&mut runtime.config, &name) {
        profile.token = Some(token.to_string());
    }
    runtime.config_path = save_config(&runtime.config)?;
    tracing::info!(profile = %name, "token stored");

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "profile": name }))?;
    } else {
        runtime
            .output
            .print_human(&format!("Signed in on profile '{name}'."));
    }
    Ok(())
}

fn logout(runtime: &mut Runtime) -> Result<(), CliError> {
    let name = runtime.active_profile();
    let had_token = profile_mut(&mut runtime.config, &name)
        .and_then(|p| p.token.take())
        .is_some();
    if had_token {
        runtime.config_path = save_config(&runtime.config)?;
    }

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "removed": had_token }))?;
    } else if had_token {
        runtime.output.print_human("Signed out.");
    } else {
        runtime.output.print_human("No token stored for this profile.");
    }
    Ok(())
}

async fn status(runtime: &mut Runtime, verify: bool) -> Result<(), CliError> {
    let name = runtime.active_profile();
    let token = runtime.resolved_token();

    let onboarded = match (&token, verify) {
        (Some(token), true) => Some(runtime.backend()?.check_onboarding(token).await?),
        _ => None,
    };

    if runtime.output.json {
        return runtime.output.print_json(&json!({
            "profile": name,
            "signedIn": token.is_some(),
            "token": token.as_deref().map(redact_secret),
            "onboarded": onboarded,
        }));
    }

    match &token {
        Some(t) => runtime.output.print_human(&format!(
            "Signed in on '{name}' with token {}",
            redact_secret(t)
        )),
        None => runtime
            .output
            .print_human(&format!("Not signed in on '{name}'.")),
    }
    if let Some(onboarded) = onboarded {
        runtime.output.print_human(if onboarded {
            "Token accepted; accessibility profile on file."
        } else {
            "Token accepted; onboarding not completed yet."
        });
    }
    Ok(())
}

fn is_ci() -> bool {
    std::env::var("CI")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
