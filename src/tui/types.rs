use std::sync::Arc;
use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;

use crate::backend::Backend;
use crate::errors::CliError;
use crate::model::{MyTrips, ReshuffleSuggestion, SensoryProfile, Trip};
use crate::onboarding::OnboardingWizard;
use crate::planner::Planner;

use super::map::Marker;
use super::list::SmoothScroll;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Plan,
    Library,
    Discover,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Plan, Screen::Library, Screen::Discover];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Plan => "Plan",
            Screen::Library => "Library",
            Screen::Discover => "Discover",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Screen::Plan => Screen::Library,
            Screen::Library => Screen::Discover,
            Screen::Discover => Screen::Plan,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Screen::Plan => Screen::Discover,
            Screen::Library => Screen::Plan,
            Screen::Discover => Screen::Library,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    EditIdea,
    Onboarding,
    Checklist,
    Reshuffle,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryTab {
    Upcoming,
    Past,
}

/// A value fetched for one screen or dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }
}

#[derive(Debug, Clone)]
pub struct ChecklistDialog {
    pub trip_id: String,
    pub trip_title: String,
    pub items: Loadable<Vec<String>>,
}

/// Screen areas recorded while drawing, used to resolve mouse positions.
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    pub list_area: Rect,
    pub map_area: Rect,
    pub markers: Vec<Marker>,
}

pub struct App<B> {
    pub screen: Screen,
    pub mode: Mode,
    pub should_quit: bool,

    pub api_url: String,
    pub profile: String,
    pub token: Option<String>,
    pub backend: Arc<B>,
    pub planner: Planner<B>,

    pub input: Vec<char>,
    pub cursor: usize,

    pub list_scroll: SmoothScroll,
    pub hit: HitMap,

    pub library: Loadable<MyTrips>,
    pub library_tab: LibraryTab,
    pub library_state: ListState,
    pub discover: Loadable<Vec<Trip>>,
    pub discover_state: ListState,

    pub sensory: Loadable<SensoryProfile>,
    pub sensory_for: Option<String>,

    pub onboarding: Option<OnboardingWizard>,
    pub onboarding_focus: usize,
    pub checklist: Option<ChecklistDialog>,
    pub reshuffle: Loadable<ReshuffleSuggestion>,

    pub status: String,
    pub spinner_step: u64,
    pub spinner_last: Instant,
    pub bg_tasks: u32,
}

impl<B> App<B>
where
    B: Backend + Sync + 'static,
{
    pub fn new(backend: Arc<B>, token: Option<String>, api_url: String, profile: String) -> Self {
        Self {
            screen: Screen::Plan,
            mode: Mode::EditIdea,
            should_quit: false,
            api_url,
            profile,
            planner: Planner::new(backend.clone(), token.clone()),
            token,
            backend,
            input: Vec::new(),
            cursor: 0,
            list_scroll: SmoothScroll::default(),
            hit: HitMap::default(),
            library: Loadable::Idle,
            library_tab: LibraryTab::Upcoming,
            library_state: ListState::default(),
            discover: Loadable::Idle,
            discover_state: ListState::default(),
            sensory: Loadable::Idle,
            sensory_for: None,
            onboarding: None,
            onboarding_focus: 0,
            checklist: None,
            reshuffle: Loadable::Idle,
            status: "Describe a trip and press Enter.".to_string(),
            spinner_step: 0,
            spinner_last: Instant::now(),
            bg_tasks: 0,
        }
    }

    pub fn signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn input_text(&self) -> String {
        self.input.iter().collect()
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.chars().collect();
        self.cursor = self.input.len();
    }

    /// Trips shown under the active library tab.
    pub fn library_trips(&self) -> &[Trip] {
        match (self.library.ready(), self.library_tab) {
            (Some(trips), LibraryTab::Upcoming) => &trips.upcoming,
            (Some(trips), LibraryTab::Past) => &trips.past,
            (None, _) => &[],
        }
    }

    /// Index the keyboard acts on: the selection if any, else the hover.
    pub fn focused_activity(&self) -> Option<usize> {
        let selection = self.planner.selection();
        selection.selected.or(selection.hovered)
    }

    pub fn is_animating(&self) -> bool {
        self.planner.is_busy() || self.bg_tasks > 0 || self.list_scroll.is_moving()
    }

    pub fn open_onboarding(&mut self) {
        if self.onboarding.is_none() {
            self.onboarding = Some(OnboardingWizard::new());
            self.onboarding_focus = 0;
        }
        self.mode = Mode::Onboarding;
    }
}

#[derive(Debug)]
pub enum TuiMsg {
    OnboardingCheck(bool),
    ProfileSaved(Result<(), CliError>),
    MyTrips(Result<MyTrips, CliError>),
    PublicTrips(Result<Vec<Trip>, CliError>),
    Checklist {
        trip_id: String,
        result: Result<Vec<String>, CliError>,
    },
    Reshuffle(Result<ReshuffleSuggestion, CliError>),
    Sensory {
        location: String,
        result: Result<SensoryProfile, CliError>,
    },
}
