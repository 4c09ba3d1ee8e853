use clap::Args;
use serde_json::json;

use crate::app::Runtime;
use crate::backend::Backend;
use crate::errors::CliError;
use crate::model::{BookingData, Itinerary};
use crate::output::OutputMode;
use crate::planner::{Phase, Planner, PriceLookup, SaveStatus};

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Describe the trip in your own words, e.g. "5 days in Kerala"
    pub idea: String,
    /// Save the itinerary to your library once it is ready
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct PricesArgs {
    pub destination: String,
}

/// Runs the same lifecycle as the interactive planner, headless.
pub async fn handle(runtime: &Runtime, args: PlanArgs) -> Result<(), CliError> {
    let backend = runtime.backend()?;
    let mut planner = Planner::new(backend, runtime.resolved_token());
    planner.set_idea(args.idea);
    if !planner.submit() {
        let message = planner
            .state()
            .notice
            .as_ref()
            .map(|n| n.message.clone())
            .unwrap_or_else(|| "Nothing to plan.".to_string());
        return Err(CliError::Usage(message));
    }

    let steps = planner.steps();
    let mut shown = None;
    while let Phase::Thinking { step } = planner.state().phase {
        if shown != Some(step) {
            runtime.output.print_progress(steps[step].label);
            shown = Some(step);
        }
        planner.recv().await;
    }

    if let Phase::Failed(reason) = &planner.state().phase {
        let reason = reason.clone();
        return Err(planner.take_error().unwrap_or(CliError::Generic(reason)));
    }

    while planner.state().price_lookup == PriceLookup::Pending {
        planner.recv().await;
    }

    let saved = if args.save {
        planner.save();
        while planner.state().save_status == Some(SaveStatus::Saving) {
            planner.recv().await;
        }
        match &planner.state().save_status {
            Some(SaveStatus::LoginRequired) => {
                return Err(CliError::Auth(SaveStatus::LoginRequired.to_string()));
            }
            Some(status @ SaveStatus::Failed(_)) => {
                return Err(CliError::Generic(status.to_string()));
            }
            other => other.as_ref().is_some_and(SaveStatus::is_success),
        }
    } else {
        false
    };

    let state = planner.state();
    let Some(itinerary) = state.itinerary.as_ref() else {
        return Err(CliError::Generic("No itinerary came back.".to_string()));
    };

    if runtime.output.json {
        return runtime.output.print_json(&json!({
            "itinerary": itinerary,
            "booking": state.booking(),
            "saved": saved,
        }));
    }

    print_itinerary(&runtime.output, itinerary);
    if let Some(booking) = state.booking() {
        print_booking(&runtime.output, booking);
    }
    if saved {
        runtime.output.print_human("");
        runtime.output.print_human(&SaveStatus::Saved.to_string());
    }
    Ok(())
}

pub async fn prices(runtime: &Runtime, args: PricesArgs) -> Result<(), CliError> {
    let destination = args.destination.trim();
    if destination.is_empty() {
        return Err(CliError::Usage("Destination cannot be empty.".to_string()));
    }
    let booking = runtime.backend()?.mock_prices(destination).await?;

    if runtime.output.json {
        runtime.output.print_json(&booking)
    } else {
        print_booking(&runtime.output, &booking);
        Ok(())
    }
}

pub fn print_itinerary(output: &OutputMode, itinerary: &Itinerary) {
    output.print_human(&itinerary.trip_title);
    if let Some(destination) = itinerary.destination() {
        output.print_human(&format!("  {destination}"));
    }

    let mut flat = itinerary.flatten().peekable();
    for (day_pos, day) in itinerary.itinerary.iter().enumerate() {
        output.print_human("");
        output.print_human(&format!("Day {}: {}", day.day, day.title));
        while let Some((r, activity)) = flat.next_if(|(r, _)| r.day == day_pos) {
            let pin = if activity.coords().is_some() { "📍" } else { "  " };
            output.print_human(&format!(
                "  [{:>2}] {pin} {:<9} {} ({})",
                r.index, activity.time, activity.description, activity.category
            ));
        }
    }
}

pub fn print_booking(output: &OutputMode, booking: &BookingData) {
    output.print_human("");
    output.print_human(&format!(
        "✈️  {}  ₹{}",
        booking.flights.airline, booking.flights.price
    ));
    output.print_human(&format!(
        "🏨 {}  ₹{} / night",
        booking.hotels.name, booking.hotels.price_per_night
    ));
}
