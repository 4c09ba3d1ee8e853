use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::backend::Backend;
use crate::errors::CliError;
use crate::model::{BookingData, Itinerary};

use super::selection::{SelectionController, SelectionState};
use super::task::TaskGuard;
use super::thinking::{THINKING_STEPS, ThinkingStep, step_offset, total_duration};

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Thinking { step: usize },
    Fulfilled,
    Failed(String),
}

impl Phase {
    pub fn is_thinking(&self) -> bool {
        matches!(self, Phase::Thinking { .. })
    }
}

/// Dependent price lookup, entered only from `Fulfilled` when the itinerary
/// names a destination.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceLookup {
    None,
    Pending,
    Done(BookingData),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    LoginRequired,
    Saving,
    Saved,
    Failed(String),
}

impl SaveStatus {
    pub fn is_success(&self) -> bool {
        self.to_string().starts_with("Saved")
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::LoginRequired => write!(f, "You must be logged in to save trips."),
            SaveStatus::Saving => write!(f, "Saving..."),
            SaveStatus::Saved => write!(f, "Saved to your library!"),
            SaveStatus::Failed(detail) => write!(f, "Error saving: {detail}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerState {
    pub idea: String,
    pub phase: Phase,
    pub itinerary: Option<Itinerary>,
    pub price_lookup: PriceLookup,
    pub save_status: Option<SaveStatus>,
    pub notice: Option<Notice>,
}

impl Default for PlannerState {
    fn default() -> Self {
        Self {
            idea: String::new(),
            phase: Phase::Idle,
            itinerary: None,
            price_lookup: PriceLookup::None,
            save_status: None,
            notice: None,
        }
    }
}

impl PlannerState {
    pub fn booking(&self) -> Option<&BookingData> {
        match &self.price_lookup {
            PriceLookup::Done(booking) => Some(booking),
            _ => None,
        }
    }

    fn activity_count(&self) -> usize {
        self.itinerary
            .as_ref()
            .map(Itinerary::activity_count)
            .unwrap_or(0)
    }
}

/// Results flowing back from spawned work. `epoch` ties a result to the
/// submission that produced it.
#[derive(Debug)]
pub enum PlannerMsg {
    ThinkingAdvanced { epoch: u64, step: usize },
    Generated { epoch: u64, result: Result<Itinerary, CliError> },
    Prices { epoch: u64, result: Result<BookingData, CliError> },
    Saved { epoch: u64, result: Result<String, CliError> },
    SelectionExpired { token: u64 },
}

/// Owns the idea, the request lifecycle, and the selection shared by the map
/// and the list. Dropping the planner cancels every timer and request it
/// started.
pub struct Planner<B> {
    backend: Arc<B>,
    principal: Option<String>,
    steps: &'static [ThinkingStep],
    state: PlannerState,
    selection: SelectionController,
    epoch: u64,
    last_error: Option<CliError>,
    request: Option<TaskGuard>,
    save_task: Option<TaskGuard>,
    tx: mpsc::UnboundedSender<PlannerMsg>,
    rx: mpsc::UnboundedReceiver<PlannerMsg>,
}

impl<B> Planner<B>
where
    B: Backend + Sync + 'static,
{
    pub fn new(backend: Arc<B>, principal: Option<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            principal,
            steps: THINKING_STEPS,
            state: PlannerState::default(),
            selection: SelectionController::new(tx.clone()),
            epoch: 0,
            last_error: None,
            request: None,
            save_task: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn steps(&self) -> &'static [ThinkingStep] {
        self.steps
    }

    pub fn set_idea(&mut self, idea: impl Into<String>) {
        self.state.idea = idea.into();
    }

    /// The error behind the latest `Failed` phase, for callers that need its
    /// kind rather than its text.
    pub fn take_error(&mut self) -> Option<CliError> {
        self.last_error.take()
    }

    pub fn clear_notice(&mut self) {
        self.state.notice = None;
    }

    /// Anything still in flight that the UI should animate for.
    pub fn is_busy(&self) -> bool {
        self.state.phase.is_thinking()
            || self.state.price_lookup == PriceLookup::Pending
            || self.state.save_status == Some(SaveStatus::Saving)
    }

    /// Start a new request for the current idea. Blank ideas are rejected
    /// locally without touching the network.
    pub fn submit(&mut self) -> bool {
        if self.state.idea.trim().is_empty() {
            self.state.notice = Some(Notice::new(
                NoticeLevel::Warning,
                "Tell us where you'd like to go first.",
            ));
            return false;
        }
        if self.state.phase.is_thinking() {
            self.state.notice = Some(Notice::new(
                NoticeLevel::Info,
                "Already planning, hang tight...",
            ));
            return false;
        }

        self.reset_results();
        self.epoch += 1;
        self.state.phase = Phase::Thinking { step: 0 };
        self.request = Some(spawn_request(
            self.backend.clone(),
            self.tx.clone(),
            self.epoch,
            self.state.idea.clone(),
            self.steps,
        ));
        tracing::info!(epoch = self.epoch, "itinerary requested");
        true
    }

    /// Persist the current itinerary for the signed-in principal.
    pub fn save(&mut self) -> bool {
        if self.state.phase != Phase::Fulfilled {
            return false;
        }
        let Some(itinerary) = self.state.itinerary.clone() else {
            return false;
        };
        let Some(token) = self.principal.clone() else {
            self.state.save_status = Some(SaveStatus::LoginRequired);
            return false;
        };
        if self.state.save_status == Some(SaveStatus::Saving) {
            return false;
        }

        self.state.save_status = Some(SaveStatus::Saving);
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let epoch = self.epoch;
        self.save_task = Some(TaskGuard::spawn(async move {
            let result = backend.save_trip(&token, &itinerary).await;
            let _ = tx.send(PlannerMsg::Saved { epoch, result });
        }));
        true
    }

    pub fn hover(&mut self, index: Option<usize>) {
        let count = self.state.activity_count();
        self.selection.hover(index, count);
    }

    pub fn select(&mut self, index: usize) -> bool {
        let count = self.state.activity_count();
        self.selection.select(index, count)
    }

    pub fn take_scroll_request(&mut self) -> Option<usize> {
        self.selection.take_scroll_request()
    }

    pub fn handle(&mut self, msg: PlannerMsg) {
        match msg {
            PlannerMsg::ThinkingAdvanced { epoch, step } => {
                if epoch == self.epoch && self.state.phase.is_thinking() {
                    self.state.phase = Phase::Thinking { step };
                }
            }
            PlannerMsg::Generated { epoch, result } => {
                if epoch != self.epoch {
                    tracing::debug!(epoch, current = self.epoch, "dropping stale itinerary");
                    return;
                }
                match result {
                    Ok(itinerary) => {
                        tracing::info!(
                            title = %itinerary.trip_title,
                            activities = itinerary.activity_count(),
                            "itinerary ready"
                        );
                        self.state.price_lookup = if itinerary.destination().is_some() {
                            PriceLookup::Pending
                        } else {
                            PriceLookup::None
                        };
                        self.state.itinerary = Some(itinerary);
                        self.state.phase = Phase::Fulfilled;
                        self.selection.reset();
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "itinerary generation failed");
                        self.state.notice = Some(Notice::new(
                            NoticeLevel::Error,
                            format!("Could not plan this trip: {err}"),
                        ));
                        self.state.phase = Phase::Failed(err.to_string());
                        self.last_error = Some(err);
                    }
                }
            }
            PlannerMsg::Prices { epoch, result } => {
                if epoch != self.epoch || self.state.price_lookup != PriceLookup::Pending {
                    return;
                }
                self.state.price_lookup = match result {
                    Ok(booking) => PriceLookup::Done(booking),
                    Err(err) => {
                        tracing::warn!(error = %err, "price lookup failed");
                        PriceLookup::Failed
                    }
                };
            }
            PlannerMsg::Saved { epoch, result } => {
                self.save_task = None;
                if epoch != self.epoch {
                    return;
                }
                match result {
                    Ok(ack) => {
                        tracing::info!(%ack, "trip saved");
                        self.state.save_status = Some(SaveStatus::Saved);
                        self.state.notice = Some(Notice::new(
                            NoticeLevel::Success,
                            "✅ Trip saved to your library!",
                        ));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "saving trip failed");
                        self.state.save_status = Some(SaveStatus::Failed(err.to_string()));
                    }
                }
            }
            PlannerMsg::SelectionExpired { token } => self.selection.expire(token),
        }
    }

    /// Apply every result that has already arrived. Returns how many.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.handle(msg);
            applied += 1;
        }
        applied
    }

    /// Wait for the next result and apply it.
    pub async fn recv(&mut self) -> bool {
        match self.rx.recv().await {
            Some(msg) => {
                self.handle(msg);
                true
            }
            None => false,
        }
    }

    fn reset_results(&mut self) {
        self.request = None;
        self.last_error = None;
        self.state.itinerary = None;
        self.state.price_lookup = PriceLookup::None;
        self.state.save_status = None;
        self.state.notice = None;
        self.selection.reset();
    }
}

/// Walks the thinking schedule from `started`, then generates, then (only when
/// a destination came back) looks up prices.
fn spawn_request<B>(
    backend: Arc<B>,
    tx: mpsc::UnboundedSender<PlannerMsg>,
    epoch: u64,
    idea: String,
    steps: &'static [ThinkingStep],
) -> TaskGuard
where
    B: Backend + Sync + 'static,
{
    let started = Instant::now();
    TaskGuard::spawn(async move {
        for step in 1..steps.len() {
            sleep_until(started + step_offset(steps, step)).await;
            if tx.send(PlannerMsg::ThinkingAdvanced { epoch, step }).is_err() {
                return;
            }
        }
        sleep_until(started + total_duration(steps)).await;

        tracing::debug!(epoch, "dispatching generate");
        let result = backend.generate(&idea).await;
        let destination = result
            .as_ref()
            .ok()
            .and_then(|itinerary| itinerary.destination().map(str::to_string));
        if tx.send(PlannerMsg::Generated { epoch, result }).is_err() {
            return;
        }

        let Some(destination) = destination else {
            return;
        };
        let result = backend.mock_prices(&destination).await;
        let _ = tx.send(PlannerMsg::Prices { epoch, result });
    })
}
