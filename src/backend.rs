//! Typed endpoints of the itinerary backend.
//!
//! The planner, the onboarding flow and the TUI talk to [`Backend`]; the HTTP
//! implementation lives in [`HttpBackend`] and tests substitute an in-memory
//! fake.

use serde_json::json;

use crate::api::ApiClient;
use crate::errors::CliError;
use crate::model::{
    BookingData, ChecklistRequest, CommCard, CommCardRequest, HotelRequest, Itinerary, MyTrips,
    OnboardingProfile, ReshuffleSuggestion, SensoryProfile, SocialScript, Trip,
};
use crate::parse::response::{
    decode, decode_itinerary, extract_ack, extract_checklist, extract_email, extract_onboarded,
};

pub mod paths {
    pub const GENERATE: &str = "/api/generate";
    pub const MOCK_PRICES: &str = "/api/mock-prices";
    pub const SAVE_TRIP: &str = "/api/save-trip";
    pub const SAVE_PROFILE: &str = "/api/save-profile";
    pub const CHECK_ONBOARDING: &str = "/api/check-onboarding";
    pub const MY_TRIPS: &str = "/api/my-trips";
    pub const PUBLIC_TRIPS: &str = "/api/public-trips";
    pub const GENERATE_CHECKLIST: &str = "/api/generate-checklist";
    pub const GENERATE_COMM_CARD: &str = "/api/generate-comm-card";
    pub const GENERATE_SCRIPT: &str = "/api/generate-script";
    pub const COMPOSE_HOTEL_REQUEST: &str = "/api/compose-hotel-request";
    pub const RESHUFFLE_DAY: &str = "/api/reshuffle-day";
    pub const SENSORY_PROFILE: &str = "/api/sensory-profile";
}

/// Backend operations. Each is a single request/response exchange.
#[trait_variant::make(Backend: Send)]
pub trait LocalBackend {
    /// Generate an itinerary from free text. The idea is sent verbatim.
    async fn generate(&self, idea: &str) -> Result<Itinerary, CliError>;

    async fn mock_prices(&self, destination: &str) -> Result<BookingData, CliError>;

    /// Persist a trip for the bearer's account. Returns the backend's ack text.
    async fn save_trip(&self, token: &str, itinerary: &Itinerary) -> Result<String, CliError>;

    async fn save_profile(&self, token: &str, profile: &OnboardingProfile)
    -> Result<(), CliError>;

    async fn check_onboarding(&self, token: &str) -> Result<bool, CliError>;

    async fn my_trips(&self, token: Option<&str>) -> Result<MyTrips, CliError>;

    async fn public_trips(&self) -> Result<Vec<Trip>, CliError>;

    async fn generate_checklist(&self, request: &ChecklistRequest)
    -> Result<Vec<String>, CliError>;

    async fn generate_comm_card(&self, request: &CommCardRequest) -> Result<CommCard, CliError>;

    async fn generate_script(&self, context: &str) -> Result<SocialScript, CliError>;

    async fn compose_hotel_request(&self, request: &HotelRequest) -> Result<String, CliError>;

    async fn reshuffle_day(
        &self,
        itinerary: &Itinerary,
        constraint: &str,
    ) -> Result<ReshuffleSuggestion, CliError>;

    async fn sensory_profile(&self, location: &str) -> Result<SensoryProfile, CliError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    api: ApiClient,
}

impl HttpBackend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl Backend for HttpBackend {
    async fn generate(&self, idea: &str) -> Result<Itinerary, CliError> {
        let res = self.api.post_text(paths::GENERATE, idea.to_string()).await?;
        decode_itinerary(res.json)
    }

    async fn mock_prices(&self, destination: &str) -> Result<BookingData, CliError> {
        let body = json!({ "destination": destination });
        let res = self.api.post_json(paths::MOCK_PRICES, body, None).await?;
        decode("mock-prices", res.json)
    }

    async fn save_trip(&self, token: &str, itinerary: &Itinerary) -> Result<String, CliError> {
        let body = json!({ "itinerary": itinerary });
        let res = self.api.post_json(paths::SAVE_TRIP, body, Some(token)).await?;
        Ok(extract_ack(&res.json))
    }

    async fn save_profile(&self, token: &str, profile: &OnboardingProfile) -> Result<(), CliError> {
        let body = serde_json::to_value(profile)?;
        self.api
            .post_json(paths::SAVE_PROFILE, body, Some(token))
            .await?;
        Ok(())
    }

    async fn check_onboarding(&self, token: &str) -> Result<bool, CliError> {
        let res = self.api.get_json(paths::CHECK_ONBOARDING, Some(token)).await?;
        Ok(extract_onboarded(&res.json))
    }

    async fn my_trips(&self, token: Option<&str>) -> Result<MyTrips, CliError> {
        let res = self.api.get_json(paths::MY_TRIPS, token).await?;
        decode("my-trips", res.json)
    }

    async fn public_trips(&self) -> Result<Vec<Trip>, CliError> {
        let res = self.api.get_json(paths::PUBLIC_TRIPS, None).await?;
        decode("public-trips", res.json)
    }

    async fn generate_checklist(&self, request: &ChecklistRequest) -> Result<Vec<String>, CliError> {
        let body = serde_json::to_value(request)?;
        let res = self.api.post_json(paths::GENERATE_CHECKLIST, body, None).await?;
        Ok(extract_checklist(&res.json))
    }

    async fn generate_comm_card(&self, request: &CommCardRequest) -> Result<CommCard, CliError> {
        let body = serde_json::to_value(request)?;
        let res = self.api.post_json(paths::GENERATE_COMM_CARD, body, None).await?;
        decode("generate-comm-card", res.json)
    }

    async fn generate_script(&self, context: &str) -> Result<SocialScript, CliError> {
        let body = json!({ "context": context });
        let res = self.api.post_json(paths::GENERATE_SCRIPT, body, None).await?;
        decode("generate-script", res.json)
    }

    async fn compose_hotel_request(&self, request: &HotelRequest) -> Result<String, CliError> {
        let body = serde_json::to_value(request)?;
        let res = self
            .api
            .post_json(paths::COMPOSE_HOTEL_REQUEST, body, None)
            .await?;
        extract_email(&res.json)
    }

    async fn reshuffle_day(
        &self,
        itinerary: &Itinerary,
        constraint: &str,
    ) -> Result<ReshuffleSuggestion, CliError> {
        let body = json!({ "itinerary": itinerary, "constraint": constraint });
        let res = self.api.post_json(paths::RESHUFFLE_DAY, body, None).await?;
        decode("reshuffle-day", res.json)
    }

    async fn sensory_profile(&self, location: &str) -> Result<SensoryProfile, CliError> {
        let body = json!({ "location": location });
        let res = self.api.post_json(paths::SENSORY_PROFILE, body, None).await?;
        decode("sensory-profile", res.json)
    }
}
