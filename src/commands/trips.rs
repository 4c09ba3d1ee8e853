use clap::Subcommand;

use crate::app::Runtime;
use crate::backend::Backend;
use crate::errors::CliError;
use crate::model::Trip;
use crate::output::OutputMode;

#[derive(Debug, Subcommand)]
pub enum TripsCommand {
    /// Your saved trips, split into upcoming and past
    Mine,
    /// Trips other travellers have shared
    Public,
}

pub async fn handle(runtime: &Runtime, command: TripsCommand) -> Result<(), CliError> {
    let backend = runtime.backend()?;
    match command {
        TripsCommand::Mine => {
            let token = runtime.require_token()?;
            let trips = backend.my_trips(Some(&token)).await?;
            if runtime.output.json {
                return runtime.output.print_json(&trips);
            }
            print_trips(&runtime.output, "Upcoming", &trips.upcoming);
            runtime.output.print_human("");
            print_trips(&runtime.output, "Past", &trips.past);
        }
        TripsCommand::Public => {
            let trips = backend.public_trips().await?;
            if runtime.output.json {
                return runtime.output.print_json(&trips);
            }
            print_trips(&runtime.output, "Discover", &trips);
        }
    }
    Ok(())
}

fn print_trips(output: &OutputMode, heading: &str, trips: &[Trip]) {
    let lines: Vec<String> = trips.iter().map(trip_line).collect();
    output.print_list(heading, &lines);
}

pub fn trip_line(trip: &Trip) -> String {
    let mut line = format!("{} ({})", trip.trip_title, trip.destination);
    if let Some(range) = trip.date_range() {
        line.push_str(&format!(" {range}"));
    }
    let badges = accessibility_badges(trip);
    if !badges.is_empty() {
        line.push_str(&format!(" [{}]", badges.join(", ")));
    }
    line.push_str(&format!(" #{}", trip.id));
    line
}

pub fn accessibility_badges(trip: &Trip) -> Vec<&'static str> {
    let Some(flags) = &trip.accessibility else {
        return Vec::new();
    };
    [
        (flags.mobility, "♿ mobility"),
        (flags.sensory, "🔇 sensory"),
        (flags.dietary, "🥗 dietary"),
    ]
    .into_iter()
    .filter_map(|(flag, label)| flag.unwrap_or(false).then_some(label))
    .collect()
}
