// Background fetches for the TUI screens. Each reports back over the TUI
// channel; the planner runs its own lifecycle tasks.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::Backend;
use crate::model::{ChecklistRequest, Itinerary, OnboardingProfile};
use crate::onboarding::{needs_onboarding, submit_profile};
use crate::tui::types::TuiMsg;

pub fn spawn_onboarding_check<B>(backend: Arc<B>, tx: mpsc::UnboundedSender<TuiMsg>, token: String)
where
    B: Backend + Sync + 'static,
{
    tokio::spawn(async move {
        let needed = needs_onboarding(backend.as_ref(), Some(&token)).await;
        let _ = tx.send(TuiMsg::OnboardingCheck(needed));
    });
}

pub fn spawn_profile_save<B>(
    backend: Arc<B>,
    tx: mpsc::UnboundedSender<TuiMsg>,
    token: String,
    profile: OnboardingProfile,
) where
    B: Backend + Sync + 'static,
{
    tokio::spawn(async move {
        let res = submit_profile(backend.as_ref(), &token, &profile).await;
        let _ = tx.send(TuiMsg::ProfileSaved(res));
    });
}

pub fn spawn_my_trips_fetch<B>(
    backend: Arc<B>,
    tx: mpsc::UnboundedSender<TuiMsg>,
    token: Option<String>,
) where
    B: Backend + Sync + 'static,
{
    tokio::spawn(async move {
        let res = backend.my_trips(token.as_deref()).await;
        let _ = tx.send(TuiMsg::MyTrips(res));
    });
}

pub fn spawn_public_trips_fetch<B>(backend: Arc<B>, tx: mpsc::UnboundedSender<TuiMsg>)
where
    B: Backend + Sync + 'static,
{
    tokio::spawn(async move {
        let res = backend.public_trips().await;
        let _ = tx.send(TuiMsg::PublicTrips(res));
    });
}

pub fn spawn_checklist_fetch<B>(
    backend: Arc<B>,
    tx: mpsc::UnboundedSender<TuiMsg>,
    trip_id: String,
    request: ChecklistRequest,
) where
    B: Backend + Sync + 'static,
{
    tokio::spawn(async move {
        let result = backend.generate_checklist(&request).await;
        let _ = tx.send(TuiMsg::Checklist { trip_id, result });
    });
}

pub fn spawn_reshuffle<B>(
    backend: Arc<B>,
    tx: mpsc::UnboundedSender<TuiMsg>,
    itinerary: Itinerary,
    constraint: String,
) where
    B: Backend + Sync + 'static,
{
    tokio::spawn(async move {
        let res = backend.reshuffle_day(&itinerary, &constraint).await;
        let _ = tx.send(TuiMsg::Reshuffle(res));
    });
}

pub fn spawn_sensory_fetch<B>(backend: Arc<B>, tx: mpsc::UnboundedSender<TuiMsg>, location: String)
where
    B: Backend + Sync + 'static,
{
    tokio::spawn(async move {
        let result = backend.sensory_profile(&location).await;
        let _ = tx.send(TuiMsg::Sensory { location, result });
    });
}
