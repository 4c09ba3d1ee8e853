//! Wire types shared by the backend boundary, the planner and the TUI.
//!
//! Field names follow the backend's JSON (camelCase, except where the backend
//! itself uses snake_case such as `price_per_night`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub trip_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub itinerary: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub time: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl Activity {
    /// Map position as `(lat, lng)`. `(0, 0)` is what the backend emits for
    /// "unknown", so it is treated as no position at all.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if !(lat == 0.0 && lng == 0.0) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Position of one activity in the flattened, day-major index space shared by
/// the map and the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRef {
    pub index: usize,
    pub day: usize,
    pub activity: usize,
}

impl Itinerary {
    pub fn flatten(&self) -> impl Iterator<Item = (ActivityRef, &Activity)> + '_ {
        self.itinerary
            .iter()
            .enumerate()
            .flat_map(|(day_pos, day)| {
                day.activities
                    .iter()
                    .enumerate()
                    .map(move |(activity_pos, activity)| (day_pos, activity_pos, activity))
            })
            .enumerate()
            .map(|(index, (day, activity, value))| {
                (
                    ActivityRef {
                        index,
                        day,
                        activity,
                    },
                    value,
                )
            })
    }

    pub fn activity_count(&self) -> usize {
        self.itinerary.iter().map(|d| d.activities.len()).sum()
    }

    pub fn activity_at(&self, index: usize) -> Option<(ActivityRef, &Activity)> {
        self.flatten().nth(index)
    }

    #[cfg(test)]
    pub fn index_of(&self, day: usize, activity: usize) -> Option<usize> {
        let day_entry = self.itinerary.get(day)?;
        if activity >= day_entry.activities.len() {
            return None;
        }
        let before: usize = self.itinerary[..day]
            .iter()
            .map(|d| d.activities.len())
            .sum();
        Some(before + activity)
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingData {
    pub flights: FlightQuote,
    pub hotels: HotelQuote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightQuote {
    pub airline: String,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelQuote {
    pub name: String,
    pub price_per_night: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobilityPrefs {
    pub wheelchair: bool,
    pub avoid_stairs: bool,
    pub frequent_rests: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensoryPrefs {
    pub noise: u8,
    pub visual: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingProfile {
    pub mobility: MobilityPrefs,
    pub sensory: SensoryPrefs,
    pub dietary: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobility: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub trip_title: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<AccessibilityFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_past: Option<bool>,
}

impl Trip {
    pub fn date_range(&self) -> Option<String> {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => Some(format!("{start} - {end}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyTrips {
    #[serde(default)]
    pub upcoming: Vec<Trip>,
    #[serde(default)]
    pub past: Vec<Trip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistRequest {
    pub destination: String,
    pub trip_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<AccessibilityFlags>,
}

impl From<&Trip> for ChecklistRequest {
    fn from(trip: &Trip) -> Self {
        Self {
            destination: trip.destination.clone(),
            trip_title: trip.trip_title.clone(),
            accessibility: trip.accessibility.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommCardRequest {
    pub place: String,
    pub dietary: Vec<String>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommCard {
    pub en: String,
    pub jp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialScript {
    #[serde(default)]
    pub user: Vec<String>,
    #[serde(default)]
    pub staff: Vec<String>,
    #[serde(default)]
    pub tips: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRequest {
    pub hotel: String,
    pub needs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReshuffleSuggestion {
    pub replace: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensoryProfile {
    pub audio: f64,
    pub visual: f64,
    pub crowds: f64,
    #[serde(default)]
    pub summary: String,
}
