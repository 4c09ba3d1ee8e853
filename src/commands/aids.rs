//! One-shot accessibility aids. Each is a single stateless request.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::Value;

use crate::app::Runtime;
use crate::backend::Backend;
use crate::errors::CliError;
use crate::model::{
    AccessibilityFlags, ChecklistRequest, CommCardRequest, HotelRequest, Itinerary,
    SensoryProfile,
};
use crate::parse::response::decode_itinerary;

pub const DEFAULT_RESHUFFLE_CONSTRAINT: &str = "low-energy";

#[derive(Debug, Args)]
pub struct ChecklistArgs {
    #[arg(long)]
    pub destination: String,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub mobility: bool,
    #[arg(long)]
    pub sensory: bool,
    #[arg(long)]
    pub dietary: bool,
}

#[derive(Debug, Args)]
pub struct CommCardArgs {
    /// Where the card will be shown, e.g. a restaurant name
    #[arg(long)]
    pub place: String,
    /// Dietary restriction; repeat for several
    #[arg(long = "dietary")]
    pub dietary: Vec<String>,
    #[arg(long, default_value = "Japanese")]
    pub language: String,
}

#[derive(Debug, Args)]
pub struct ScriptArgs {
    /// The situation to rehearse, e.g. "checking in at a ryokan"
    pub context: String,
}

#[derive(Debug, Args)]
pub struct HotelRequestArgs {
    #[arg(long)]
    pub hotel: String,
    /// Accessibility need; repeat for several
    #[arg(long = "need")]
    pub needs: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ReshuffleArgs {
    /// Itinerary JSON, as printed by `plan --json`
    #[arg(long)]
    pub itinerary: PathBuf,
    #[arg(long, default_value = DEFAULT_RESHUFFLE_CONSTRAINT)]
    pub constraint: String,
}

#[derive(Debug, Args)]
pub struct SensoryArgs {
    pub location: String,
}

pub async fn checklist(runtime: &Runtime, args: ChecklistArgs) -> Result<(), CliError> {
    let flag = |on: bool| on.then_some(true);
    let request = ChecklistRequest {
        destination: args.destination,
        trip_title: args.title,
        accessibility: Some(AccessibilityFlags {
            mobility: flag(args.mobility),
            sensory: flag(args.sensory),
            dietary: flag(args.dietary),
        }),
    };
    let items = runtime.backend()?.generate_checklist(&request).await?;

    if runtime.output.json {
        return runtime
            .output
            .print_json(&serde_json::json!({ "checklist": items }));
    }
    runtime.output.print_list(
        &format!("Preparation checklist for {}", request.trip_title),
        &items,
    );
    Ok(())
}

pub async fn comm_card(runtime: &Runtime, args: CommCardArgs) -> Result<(), CliError> {
    let request = CommCardRequest {
        place: args.place,
        dietary: args.dietary,
        language: args.language,
    };
    let card = runtime.backend()?.generate_comm_card(&request).await?;

    if runtime.output.json {
        return runtime.output.print_json(&card);
    }
    runtime.output.print_human(&card.en);
    runtime.output.print_human("");
    runtime.output.print_human(&card.jp);
    Ok(())
}

pub async fn script(runtime: &Runtime, args: ScriptArgs) -> Result<(), CliError> {
    let script = runtime.backend()?.generate_script(&args.context).await?;

    if runtime.output.json {
        return runtime.output.print_json(&script);
    }
    runtime.output.print_list("You say", &script.user);
    runtime.output.print_list("They may say", &script.staff);
    if !script.tips.is_empty() {
        runtime.output.print_human("");
        runtime.output.print_human(&format!("Tip: {}", script.tips));
    }
    Ok(())
}

pub async fn hotel_request(runtime: &Runtime, args: HotelRequestArgs) -> Result<(), CliError> {
    let request = HotelRequest {
        hotel: args.hotel,
        needs: args.needs,
    };
    let email = runtime.backend()?.compose_hotel_request(&request).await?;

    if runtime.output.json {
        return runtime
            .output
            .print_json(&serde_json::json!({ "email": email }));
    }
    runtime.output.print_human(&email);
    Ok(())
}

pub async fn reshuffle(runtime: &Runtime, args: ReshuffleArgs) -> Result<(), CliError> {
    let itinerary = read_itinerary(&args.itinerary)?;
    let suggestion = runtime
        .backend()?
        .reshuffle_day(&itinerary, &args.constraint)
        .await?;

    if runtime.output.json {
        return runtime.output.print_json(&suggestion);
    }
    runtime.output.print_human(&format!(
        "How about swapping {} for {} instead?",
        suggestion.replace, suggestion.suggestion
    ));
    Ok(())
}

pub async fn sensory(runtime: &Runtime, args: SensoryArgs) -> Result<(), CliError> {
    let profile = runtime.backend()?.sensory_profile(&args.location).await?;

    if runtime.output.json {
        return runtime.output.print_json(&profile);
    }
    runtime
        .output
        .print_human(&format!("Sensory fingerprint for {}", args.location));
    runtime.output.print_human(&fingerprint_line(&profile));
    if !profile.summary.is_empty() {
        runtime.output.print_human(&profile.summary);
    }
    Ok(())
}

/// One-line meter rendering shared with the TUI status area.
pub fn fingerprint_line(profile: &SensoryProfile) -> String {
    format!(
        "🔊 {}  👁 {}  👥 {}",
        meter(profile.audio),
        meter(profile.visual),
        meter(profile.crowds)
    )
}

fn meter(value: f64) -> String {
    let level = value.clamp(0.0, 100.0);
    let filled = (level / 20.0).round() as usize;
    format!("{}{} {:>3.0}", "█".repeat(filled), "░".repeat(5 - filled), level)
}

/// Accepts either a bare itinerary or the `plan --json` envelope around it.
fn read_itinerary(path: &Path) -> Result<Itinerary, CliError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    let value = match value.get("itinerary") {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => value,
    };
    decode_itinerary(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::kerala;

    #[test]
    fn meter_is_clamped_and_rounded() {
        assert_eq!(meter(0.0), "░░░░░   0");
        assert_eq!(meter(52.0), "███░░  52");
        assert_eq!(meter(180.0), "█████ 100");
    }

    #[test]
    fn itinerary_files_may_be_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("bare.json");
        let wrapped = dir.path().join("wrapped.json");
        let itinerary = serde_json::to_value(kerala()).unwrap();
        fs::write(&bare, itinerary.to_string()).unwrap();
        fs::write(
            &wrapped,
            serde_json::json!({ "itinerary": itinerary, "saved": false }).to_string(),
        )
        .unwrap();

        assert_eq!(read_itinerary(&bare).unwrap(), kerala());
        assert_eq!(read_itinerary(&wrapped).unwrap(), kerala());
    }
}
