// Response schemas for the backend. Every successful payload passes through
// here before it reaches the planner or the TUI.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::CliError;
use crate::model::Itinerary;

/// Decode a payload into a typed response, naming the endpoint on failure.
pub fn decode<T: DeserializeOwned>(endpoint: &str, payload: Value) -> Result<T, CliError> {
    serde_json::from_value(payload).map_err(|e| CliError::parse(endpoint, e))
}

/// Decode an itinerary and check that day numbers are unique.
pub fn decode_itinerary(payload: Value) -> Result<Itinerary, CliError> {
    if payload.get("raw").is_some() && payload.get("itinerary").is_none() {
        return Err(CliError::parse("generate", "response was not JSON"));
    }
    let itinerary: Itinerary = decode("generate", payload)?;

    let mut seen = HashSet::new();
    for day in &itinerary.itinerary {
        if !seen.insert(day.day) {
            return Err(CliError::parse(
                "generate",
                format!("day {} appears more than once", day.day),
            ));
        }
    }
    Ok(itinerary)
}

/// Human-readable detail of an error payload: `error`, `message`, or the raw
/// text body the backend wrote.
pub fn extract_error_message(payload: &Value) -> Option<String> {
    ["error", "message", "raw"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Acknowledgement text of a write endpoint.
pub fn extract_ack(payload: &Value) -> String {
    extract_error_message(payload).unwrap_or_else(|| "ok".to_string())
}

/// `{"checklist": [...]}`; anything that is not a list of strings yields an
/// empty checklist.
pub fn extract_checklist(payload: &Value) -> Vec<String> {
    payload
        .get("checklist")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Anything but an explicit `true` means the wizard still has to run.
pub fn extract_onboarded(payload: &Value) -> bool {
    payload
        .get("onboarded")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

pub fn extract_email(payload: &Value) -> Result<String, CliError> {
    payload
        .get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| CliError::parse("compose-hotel-request", "missing `email`"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::BookingData;

    #[test]
    fn decodes_the_kerala_response() {
        let payload = json!({
            "tripTitle": "Kerala Adventure",
            "itinerary": [{
                "day": 1,
                "title": "Arrival",
                "activities": [{"time": "10am", "description": "Backwater cruise", "category": "Activity"}]
            }]
        });
        let itinerary = decode_itinerary(payload).unwrap();
        assert_eq!(itinerary.trip_title, "Kerala Adventure");
        assert_eq!(itinerary.destination, None);
        assert_eq!(itinerary.activity_count(), 1);
    }

    #[test]
    fn missing_title_is_a_parse_error() {
        let payload = json!({ "itinerary": [] });
        let err = decode_itinerary(payload).unwrap_err();
        assert!(matches!(err, CliError::Parse { ref endpoint, .. } if endpoint == "generate"));
    }

    #[test]
    fn non_json_body_is_a_parse_error() {
        let payload = json!({ "raw": "The AI Brain is thinking too hard" });
        assert!(matches!(
            decode_itinerary(payload),
            Err(CliError::Parse { .. })
        ));
    }

    #[test]
    fn duplicate_days_are_rejected() {
        let payload = json!({
            "tripTitle": "Loop",
            "itinerary": [
                {"day": 1, "title": "A", "activities": []},
                {"day": 1, "title": "B", "activities": []}
            ]
        });
        let err = decode_itinerary(payload).unwrap_err();
        assert!(err.to_string().contains("day 1 appears more than once"));
    }

    #[test]
    fn booking_requires_both_quotes() {
        let ok = json!({
            "flights": {"airline": "IndiGo", "price": 9000},
            "hotels": {"name": "Leela", "price_per_night": 7000}
        });
        let booking: BookingData = decode("mock-prices", ok).unwrap();
        assert_eq!(booking.hotels.price_per_night, 7000);

        let partial = json!({ "flights": {"airline": "IndiGo", "price": 9000} });
        assert!(decode::<BookingData>("mock-prices", partial).is_err());
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        assert_eq!(
            extract_error_message(&json!({"error": "nope", "raw": "x"})).as_deref(),
            Some("nope")
        );
        assert_eq!(
            extract_error_message(&json!({"raw": "Invalid ID token\n"})).as_deref(),
            Some("Invalid ID token")
        );
        assert_eq!(extract_error_message(&json!({})), None);
    }

    #[test]
    fn checklist_tolerates_odd_shapes() {
        assert_eq!(
            extract_checklist(&json!({"checklist": ["Passport", 3, "Meds"]})),
            vec!["Passport".to_string(), "Meds".to_string()]
        );
        assert!(extract_checklist(&json!({"checklist": "Passport"})).is_empty());
    }

    #[test]
    fn onboarded_defaults_to_false() {
        assert!(extract_onboarded(&json!({"onboarded": true})));
        assert!(!extract_onboarded(&json!({"onboarded": false})));
        assert!(!extract_onboarded(&json!({})));
        assert!(!extract_onboarded(&json!({"onboarded": "yes"})));
    }
}
