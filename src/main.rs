mod api;
mod app;
mod backend;
mod commands;
mod config;
mod errors;
mod logging;
mod model;
mod onboarding;
mod output;
mod parse;
mod planner;
mod tui;

use clap::{Parser, Subcommand};

use crate::app::Runtime;
use crate::commands::aids::{
    ChecklistArgs, CommCardArgs, HotelRequestArgs, ReshuffleArgs, ScriptArgs, SensoryArgs,
};
use crate::commands::auth::AuthCommand;
use crate::commands::config::ConfigCommand;
use crate::commands::onboarding::OnboardingCommand;
use crate::commands::plan::{PlanArgs, PricesArgs};
use crate::commands::trips::TripsCommand;
use crate::commands::tui::TuiArgs;
use crate::errors::CliError;
use crate::output::{OutputMode, print_error};

#[derive(Debug, Parser)]
#[command(
    name = "auryvia",
    version,
    about = "Auryvia: accessibility-first AI trip planning from the terminal."
)]
struct Cli {
    #[arg(long, global = true)]
    profile: Option<String>,
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true)]
    quiet: bool,
    #[arg(long, global = true, default_value_t = 30_000)]
    timeout: u64,
    #[arg(long, global = true)]
    verbose: bool,
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Turn a free-text trip idea into a day-by-day itinerary
    Plan(PlanArgs),
    /// Look up flight and hotel prices for a destination
    Prices(PricesArgs),
    Trips {
        #[command(subcommand)]
        command: TripsCommand,
    },
    /// Packing checklist for a trip
    Checklist(ChecklistArgs),
    /// Dietary communication card in a local language
    CommCard(CommCardArgs),
    /// Short dialogue to rehearse before a social situation
    Script(ScriptArgs),
    /// Email to a hotel describing accessibility needs
    HotelRequest(HotelRequestArgs),
    /// Suggest a gentler swap for one activity of a saved itinerary
    Reshuffle(ReshuffleArgs),
    /// Sensory fingerprint (noise, light, crowds) of a place
    Sensory(SensoryArgs),
    Onboarding {
        #[command(subcommand)]
        command: OnboardingCommand,
    },
    Tui(TuiArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = OutputMode {
        json: cli.json,
        quiet: cli.quiet,
        verbose: cli.verbose,
        debug: cli.debug,
    };

    if let Err(err) = logging::init(cli.debug) {
        output.print_verbose(&format!("Logging disabled: {err}"));
    }

    let result = run(cli, output.clone()).await;
    if let Err(err) = result {
        tracing::error!(error = %err, "command failed");
        print_error(&err, &output);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli, output: OutputMode) -> Result<(), CliError> {
    let config = config::load_config()?;
    let config_path = config::config_path()?;

    let mut runtime = Runtime {
        output,
        config,
        config_path,
        profile_override: cli.profile,
        api_url_override: cli.api_url,
        timeout_ms: cli.timeout,
    };

    match cli.command {
        Commands::Config { command } => commands::config::handle(&mut runtime, command).await,
        Commands::Auth { command } => commands::auth::handle(&mut runtime, command).await,
        Commands::Plan(args) => commands::plan::handle(&runtime, args).await,
        Commands::Prices(args) => commands::plan::prices(&runtime, args).await,
        Commands::Trips { command } => commands::trips::handle(&runtime, command).await,
        Commands::Checklist(args) => commands::aids::checklist(&runtime, args).await,
        Commands::CommCard(args) => commands::aids::comm_card(&runtime, args).await,
        Commands::Script(args) => commands::aids::script(&runtime, args).await,
        Commands::HotelRequest(args) => commands::aids::hotel_request(&runtime, args).await,
        Commands::Reshuffle(args) => commands::aids::reshuffle(&runtime, args).await,
        Commands::Sensory(args) => commands::aids::sensory(&runtime, args).await,
        Commands::Onboarding { command } => commands::onboarding::handle(&runtime, command).await,
        Commands::Tui(args) => commands::tui::handle(&runtime, args).await,
    }
}
