// Applies background fetch results to the app state.

use tokio::sync::mpsc;

use crate::backend::Backend;
use crate::tui::types::{App, Loadable, Mode, TuiMsg};

use super::async_ops::spawn_sensory_fetch;

pub fn handle_tui_msg<B>(app: &mut App<B>, msg: TuiMsg)
where
    B: Backend + Sync + 'static,
{
    match msg {
        TuiMsg::OnboardingCheck(needed) => {
            app.bg_tasks = app.bg_tasks.saturating_sub(1);
            if needed && app.onboarding.is_none() {
                app.open_onboarding();
                app.status = "Welcome! Tell us a little about how you travel.".to_string();
            }
        }
        TuiMsg::ProfileSaved(res) => {
            app.bg_tasks = app.bg_tasks.saturating_sub(1);
            match res {
                Ok(()) => {
                    app.onboarding = None;
                    if app.mode == Mode::Onboarding {
                        app.mode = Mode::EditIdea;
                    }
                    app.status = "Profile saved. Your trips will respect it.".to_string();
                }
                Err(err) => {
                    if let Some(wizard) = app.onboarding.as_mut() {
                        wizard.save_failed();
                    }
                    app.status = format!("Could not save your profile: {err}");
                }
            }
        }
        TuiMsg::MyTrips(res) => {
            app.bg_tasks = app.bg_tasks.saturating_sub(1);
            app.library = match res {
                Ok(trips) => {
                    let any = !trips.upcoming.is_empty() || !trips.past.is_empty();
                    app.library_state.select(any.then_some(0));
                    Loadable::Ready(trips)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "loading library failed");
                    Loadable::Failed(err.to_string())
                }
            };
        }
        TuiMsg::PublicTrips(res) => {
            app.bg_tasks = app.bg_tasks.saturating_sub(1);
            let trips = res.unwrap_or_else(|err| {
                tracing::warn!(error = %err, "loading public trips failed");
                Vec::new()
            });
            app.discover_state
                .select((!trips.is_empty()).then_some(0));
            app.discover = Loadable::Ready(trips);
        }
        TuiMsg::Checklist { trip_id, result } => {
            app.bg_tasks = app.bg_tasks.saturating_sub(1);
            let Some(dialog) = app.checklist.as_mut().filter(|d| d.trip_id == trip_id) else {
                return;
            };
            dialog.items = match result {
                Ok(items) => Loadable::Ready(items),
                Err(err) => Loadable::Failed(err.to_string()),
            };
        }
        TuiMsg::Reshuffle(res) => {
            app.bg_tasks = app.bg_tasks.saturating_sub(1);
            if app.mode != Mode::Reshuffle {
                return;
            }
            app.reshuffle = match res {
                Ok(suggestion) => Loadable::Ready(suggestion),
                Err(err) => {
                    tracing::warn!(error = %err, "reshuffle failed");
                    Loadable::Failed(err.to_string())
                }
            };
        }
        TuiMsg::Sensory { location, result } => {
            app.bg_tasks = app.bg_tasks.saturating_sub(1);
            if app.sensory_for.as_deref() != Some(location.as_str()) {
                return;
            }
            app.sensory = match result {
                Ok(profile) => Loadable::Ready(profile),
                Err(err) => {
                    tracing::warn!(error = %err, %location, "sensory profile unavailable");
                    Loadable::Failed(err.to_string())
                }
            };
        }
    }
}

/// Runs after planner results are applied: keeps the list scroll and the
/// destination's sensory fingerprint in step with the itinerary.
pub fn sync_with_planner<B>(app: &mut App<B>, tx: &mpsc::UnboundedSender<TuiMsg>)
where
    B: Backend + Sync + 'static,
{
    let destination = app
        .planner
        .state()
        .itinerary
        .as_ref()
        .and_then(|i| i.destination())
        .map(str::to_string);

    match destination {
        Some(location) if app.sensory_for.as_deref() != Some(location.as_str()) => {
            app.sensory_for = Some(location.clone());
            app.sensory = Loadable::Loading;
            app.bg_tasks = app.bg_tasks.saturating_add(1);
            spawn_sensory_fetch(app.backend.clone(), tx.clone(), location);
        }
        Some(_) => {}
        None => {
            if app.sensory_for.take().is_some() {
                app.sensory = Loadable::Idle;
            }
            if app.planner.state().itinerary.is_none() {
                app.list_scroll.reset();
            }
        }
    }
}
