use clap::Subcommand;
use serde_json::json;

use crate::app::Runtime;
use crate::backend::Backend;
use crate::errors::CliError;

#[derive(Debug, Subcommand)]
pub enum OnboardingCommand {
    /// Whether your accessibility profile has been filled in
    Status,
}

pub async fn handle(runtime: &Runtime, command: OnboardingCommand) -> Result<(), CliError> {
    match command {
        OnboardingCommand::Status => {
            let token = runtime.require_token()?;
            let onboarded = runtime.backend()?.check_onboarding(&token).await?;
            if runtime.output.json {
                return runtime.output.print_json(&json!({ "onboarded": onboarded }));
            }
            runtime.output.print_human(if onboarded {
                "Onboarding complete."
            } else {
                "Onboarding not completed. Run `auryvia tui --onboarding` to set up your profile."
            });
            Ok(())
        }
    }
}
