// Keyboard and mouse input for the TUI.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::backend::Backend;
use crate::commands::aids::DEFAULT_RESHUFFLE_CONSTRAINT;
use crate::errors::CliError;
use crate::model::ChecklistRequest;
use crate::onboarding::{MobilityToggle, OnboardingStep, Slider};
use crate::planner::Phase;
use crate::tui::list::{index_at, row_of, rows};
use crate::tui::map::{marker_at, osm_url};
use crate::tui::types::{App, ChecklistDialog, LibraryTab, Loadable, Mode, Screen, TuiMsg};

use super::async_ops::{
    spawn_checklist_fetch, spawn_my_trips_fetch, spawn_profile_save, spawn_public_trips_fetch,
    spawn_reshuffle,
};

const TOGGLES: [MobilityToggle; 3] = [
    MobilityToggle::Wheelchair,
    MobilityToggle::AvoidStairs,
    MobilityToggle::FrequentRests,
];
const SLIDERS: [Slider; 2] = [Slider::Noise, Slider::Visual];
const SLIDER_STEP: i32 = 5;
const WHEEL_ROWS: i64 = 3;

pub fn handle_event<B>(
    tx: &mpsc::UnboundedSender<TuiMsg>,
    app: &mut App<B>,
    event: Event,
) -> Result<(), CliError>
where
    B: Backend + Sync + 'static,
{
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(tx, app, key),
        Event::Mouse(mouse) => {
            handle_mouse(app, mouse);
            Ok(())
        }
        _ => Ok(()),
    }
}

pub fn handle_key<B>(
    tx: &mpsc::UnboundedSender<TuiMsg>,
    app: &mut App<B>,
    key: KeyEvent,
) -> Result<(), CliError>
where
    B: Backend + Sync + 'static,
{
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    match app.mode {
        Mode::Help => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                app.mode = Mode::Browse;
            }
            Ok(())
        }
        Mode::Checklist => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.checklist = None;
                app.mode = Mode::Browse;
            }
            Ok(())
        }
        Mode::Reshuffle => {
            // Accept and decline both just close; the itinerary is not rewritten.
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('n')
            ) {
                app.reshuffle = Loadable::Idle;
                app.mode = Mode::Browse;
            }
            Ok(())
        }
        Mode::Onboarding => {
            handle_onboarding_key(tx, app, key);
            Ok(())
        }
        Mode::EditIdea => {
            handle_edit_key(app, key);
            Ok(())
        }
        Mode::Browse => handle_browse_key(tx, app, key),
    }
}

fn handle_edit_key<B>(app: &mut App<B>, key: KeyEvent)
where
    B: Backend + Sync + 'static,
{
    match key.code {
        KeyCode::Esc => app.mode = Mode::Browse,
        KeyCode::Enter => {
            app.planner.clear_notice();
            app.planner.set_idea(app.input_text());
            if app.planner.submit() {
                app.list_scroll.reset();
                app.mode = Mode::Browse;
                app.status = "Planning your trip...".to_string();
            }
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                app.input.remove(app.cursor);
            }
        }
        KeyCode::Delete => {
            if app.cursor < app.input.len() {
                app.input.remove(app.cursor);
            }
        }
        KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Right => app.cursor = (app.cursor + 1).min(app.input.len()),
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.input.len(),
        KeyCode::Char(c) => {
            app.input.insert(app.cursor, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_browse_key<B>(
    tx: &mpsc::UnboundedSender<TuiMsg>,
    app: &mut App<B>,
    key: KeyEvent,
) -> Result<(), CliError>
where
    B: Backend + Sync + 'static,
{
    app.planner.clear_notice();
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            return Ok(());
        }
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.mode = Mode::Help;
            return Ok(());
        }
        KeyCode::Tab => {
            let next = app.screen.next();
            enter_screen(tx, app, next);
            return Ok(());
        }
        KeyCode::BackTab => {
            let prev = app.screen.prev();
            enter_screen(tx, app, prev);
            return Ok(());
        }
        KeyCode::Char(c @ '1'..='3') => {
            let screen = Screen::ALL[usize::from(c as u8 - b'1')];
            enter_screen(tx, app, screen);
            return Ok(());
        }
        KeyCode::Char('a') => {
            app.open_onboarding();
            return Ok(());
        }
        _ => {}
    }

    match app.screen {
        Screen::Plan => handle_plan_key(tx, app, key),
        Screen::Library => {
            handle_library_key(tx, app, key);
            Ok(())
        }
        Screen::Discover => {
            let len = discover_len(app);
            match key.code {
                KeyCode::Up => step_list(&mut app.discover_state, len, -1),
                KeyCode::Down => step_list(&mut app.discover_state, len, 1),
                KeyCode::Char('R') | KeyCode::F(5) => enter_screen(tx, app, Screen::Discover),
                _ => {}
            }
            Ok(())
        }
    }
}

fn handle_plan_key<B>(
    tx: &mpsc::UnboundedSender<TuiMsg>,
    app: &mut App<B>,
    key: KeyEvent,
) -> Result<(), CliError>
where
    B: Backend + Sync + 'static,
{
    match key.code {
        KeyCode::Char('e') | KeyCode::Char('i') | KeyCode::Char('/') => {
            app.mode = Mode::EditIdea;
            app.cursor = app.input.len();
        }
        KeyCode::Up => move_hover(app, -1),
        KeyCode::Down => move_hover(app, 1),
        KeyCode::Enter => {
            if let Some(index) = app.planner.selection().hovered {
                app.planner.select(index);
            }
        }
        KeyCode::PageUp => page(app, -1),
        KeyCode::PageDown => page(app, 1),
        KeyCode::Char('s') => {
            if app.planner.state().phase != Phase::Fulfilled {
                app.status = "Nothing to save yet.".to_string();
            } else if app.planner.save() {
                app.status = "Saving...".to_string();
            } else if let Some(status) = &app.planner.state().save_status {
                app.status = status.to_string();
            }
        }
        KeyCode::Char('r') => {
            let Some(itinerary) = app.planner.state().itinerary.clone() else {
                app.status = "Plan a trip first.".to_string();
                return Ok(());
            };
            app.reshuffle = Loadable::Loading;
            app.mode = Mode::Reshuffle;
            app.bg_tasks = app.bg_tasks.saturating_add(1);
            spawn_reshuffle(
                app.backend.clone(),
                tx.clone(),
                itinerary,
                DEFAULT_RESHUFFLE_CONSTRAINT.to_string(),
            );
        }
        KeyCode::Char('o') => open_focused_in_browser(app)?,
        _ => {}
    }
    Ok(())
}

fn handle_library_key<B>(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App<B>, key: KeyEvent)
where
    B: Backend + Sync + 'static,
{
    match key.code {
        KeyCode::Left | KeyCode::Right | KeyCode::Char('t') => {
            app.library_tab = match app.library_tab {
                LibraryTab::Upcoming => LibraryTab::Past,
                LibraryTab::Past => LibraryTab::Upcoming,
            };
            let len = app.library_trips().len();
            app.library_state.select((len > 0).then_some(0));
        }
        KeyCode::Up => {
            let len = app.library_trips().len();
            step_list(&mut app.library_state, len, -1);
        }
        KeyCode::Down => {
            let len = app.library_trips().len();
            step_list(&mut app.library_state, len, 1);
        }
        KeyCode::Char('c') => {
            if app.library_tab != LibraryTab::Upcoming {
                app.status = "Checklists are for upcoming trips.".to_string();
                return;
            }
            let Some(trip) = app
                .library_state
                .selected()
                .and_then(|i| app.library_trips().get(i))
                .cloned()
            else {
                return;
            };
            app.checklist = Some(ChecklistDialog {
                trip_id: trip.id.clone(),
                trip_title: trip.trip_title.clone(),
                items: Loadable::Loading,
            });
            app.mode = Mode::Checklist;
            app.bg_tasks = app.bg_tasks.saturating_add(1);
            spawn_checklist_fetch(
                app.backend.clone(),
                tx.clone(),
                trip.id.clone(),
                ChecklistRequest::from(&trip),
            );
        }
        KeyCode::Char('R') | KeyCode::F(5) => enter_screen(tx, app, Screen::Library),
        _ => {}
    }
}

fn handle_onboarding_key<B>(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App<B>, key: KeyEvent)
where
    B: Backend + Sync + 'static,
{
    let Some(wizard) = app.onboarding.as_mut() else {
        app.mode = Mode::Browse;
        return;
    };
    let focus = &mut app.onboarding_focus;
    let step = wizard.step();

    match (step, key.code) {
        (OnboardingStep::Mobility, KeyCode::Esc) => {
            app.onboarding = None;
            app.mode = Mode::EditIdea;
            app.status = "Onboarding skipped. Press `a` to finish it later.".to_string();
        }
        (_, KeyCode::Esc) | (_, KeyCode::BackTab) => {
            wizard.back();
            *focus = 0;
        }
        (OnboardingStep::Mobility, KeyCode::Up) => *focus = focus.saturating_sub(1),
        (OnboardingStep::Mobility, KeyCode::Down) => *focus = (*focus + 1).min(TOGGLES.len() - 1),
        (OnboardingStep::Mobility, KeyCode::Char(' ')) => {
            wizard.toggle(TOGGLES[(*focus).min(TOGGLES.len() - 1)]);
        }
        (OnboardingStep::Sensory, KeyCode::Up) => *focus = focus.saturating_sub(1),
        (OnboardingStep::Sensory, KeyCode::Down) => *focus = (*focus + 1).min(SLIDERS.len() - 1),
        (OnboardingStep::Sensory, KeyCode::Left) => {
            wizard.nudge_slider(SLIDERS[(*focus).min(SLIDERS.len() - 1)], -SLIDER_STEP);
        }
        (OnboardingStep::Sensory, KeyCode::Right) => {
            wizard.nudge_slider(SLIDERS[(*focus).min(SLIDERS.len() - 1)], SLIDER_STEP);
        }
        (OnboardingStep::Mobility | OnboardingStep::Sensory, KeyCode::Enter | KeyCode::Tab) => {
            wizard.next();
            *focus = 0;
        }
        (OnboardingStep::Dietary, KeyCode::Char(c)) => wizard.push_tag_char(c),
        (OnboardingStep::Dietary, KeyCode::Backspace) => wizard.pop_tag_char(),
        (OnboardingStep::Dietary, KeyCode::Up) => *focus = focus.saturating_sub(1),
        (OnboardingStep::Dietary, KeyCode::Down) => {
            let last = wizard.profile().dietary.len().saturating_sub(1);
            *focus = (*focus + 1).min(last);
        }
        (OnboardingStep::Dietary, KeyCode::Delete) => {
            wizard.remove_tag(*focus);
            let last = wizard.profile().dietary.len().saturating_sub(1);
            *focus = (*focus).min(last);
        }
        (OnboardingStep::Dietary, KeyCode::Enter) => {
            wizard.add_tag();
        }
        (OnboardingStep::Dietary, KeyCode::F(10)) => {
            // A half-typed tag still counts.
            wizard.add_tag();
            let Some(profile) = wizard.finish() else {
                return;
            };
            match app.token.clone() {
                Some(token) => {
                    app.status = "Saving your profile...".to_string();
                    app.bg_tasks = app.bg_tasks.saturating_add(1);
                    spawn_profile_save(app.backend.clone(), tx.clone(), token, profile);
                }
                None => {
                    wizard.save_failed();
                    app.status = "You must be logged in to save your profile.".to_string();
                }
            }
        }
        _ => {}
    }
}

fn handle_mouse<B>(app: &mut App<B>, mouse: MouseEvent)
where
    B: Backend + Sync + 'static,
{
    if app.screen != Screen::Plan || !matches!(app.mode, Mode::Browse | Mode::EditIdea) {
        return;
    }
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Moved => {
            let target = list_index_at(app, x, y).or_else(|| map_index_at(app, x, y));
            app.planner.hover(target);
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = map_index_at(app, x, y) {
                app.planner.select(index);
            }
        }
        MouseEventKind::ScrollUp if inside(app.hit.list_area, x, y) => {
            wheel(app, -WHEEL_ROWS);
        }
        MouseEventKind::ScrollDown if inside(app.hit.list_area, x, y) => {
            wheel(app, WHEEL_ROWS);
        }
        _ => {}
    }
}

/// Switch screens; Library and Discover re-fetch every time they are entered,
/// unless a fetch for that screen is still in flight.
pub fn enter_screen<B>(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App<B>, screen: Screen)
where
    B: Backend + Sync + 'static,
{
    app.screen = screen;
    match screen {
        Screen::Plan => {}
        Screen::Library if app.library.is_loading() => {}
        Screen::Discover if app.discover.is_loading() => {}
        Screen::Library => {
            app.library = Loadable::Loading;
            app.bg_tasks = app.bg_tasks.saturating_add(1);
            spawn_my_trips_fetch(app.backend.clone(), tx.clone(), app.token.clone());
        }
        Screen::Discover => {
            app.discover = Loadable::Loading;
            app.bg_tasks = app.bg_tasks.saturating_add(1);
            spawn_public_trips_fetch(app.backend.clone(), tx.clone());
        }
    }
}

/// Ease the list so `index` sits in the middle of it.
pub fn scroll_to_activity<B>(app: &mut App<B>, index: usize)
where
    B: Backend + Sync + 'static,
{
    let Some(itinerary) = app.planner.state().itinerary.as_ref() else {
        return;
    };
    let rows = rows(itinerary);
    if let Some(row) = row_of(&rows, index) {
        let viewport = usize::from(app.hit.list_area.height);
        app.list_scroll.center_on(row, viewport, rows.len());
    }
}

fn move_hover<B>(app: &mut App<B>, delta: i64)
where
    B: Backend + Sync + 'static,
{
    let count = app
        .planner
        .state()
        .itinerary
        .as_ref()
        .map(|i| i.activity_count())
        .unwrap_or(0);
    if count == 0 {
        return;
    }
    let last = count as i64 - 1;
    let next = match app.planner.selection().hovered {
        None if delta > 0 => 0,
        None => last,
        Some(current) => (current as i64 + delta).clamp(0, last),
    };
    app.planner.hover(Some(next as usize));
    scroll_to_activity(app, next as usize);
}

fn page<B>(app: &mut App<B>, direction: i64)
where
    B: Backend + Sync + 'static,
{
    let viewport = i64::from(app.hit.list_area.height.max(1));
    wheel(app, direction * viewport);
}

fn wheel<B>(app: &mut App<B>, delta: i64)
where
    B: Backend + Sync + 'static,
{
    let Some(itinerary) = app.planner.state().itinerary.as_ref() else {
        return;
    };
    let content = rows(itinerary).len();
    let viewport = usize::from(app.hit.list_area.height);
    app.list_scroll.jump_by(delta, viewport, content);
}

fn list_index_at<B>(app: &App<B>, x: u16, y: u16) -> Option<usize>
where
    B: Backend + Sync + 'static,
{
    if !inside(app.hit.list_area, x, y) {
        return None;
    }
    let itinerary = app.planner.state().itinerary.as_ref()?;
    let line = app.list_scroll.offset() + usize::from(y - app.hit.list_area.y);
    index_at(&rows(itinerary), line)
}

fn map_index_at<B>(app: &App<B>, x: u16, y: u16) -> Option<usize>
where
    B: Backend + Sync + 'static,
{
    if !inside(app.hit.map_area, x, y) {
        return None;
    }
    marker_at(&app.hit.markers, x, y)
}

fn open_focused_in_browser<B>(app: &mut App<B>) -> Result<(), CliError>
where
    B: Backend + Sync + 'static,
{
    let coords = app.focused_activity().and_then(|index| {
        let itinerary = app.planner.state().itinerary.as_ref()?;
        itinerary.activity_at(index)?.1.coords()
    });
    let Some((lat, lng)) = coords else {
        app.status = "That activity has no map position.".to_string();
        return Ok(());
    };
    let url = osm_url(lat, lng);
    open::that(&url).map_err(|e| CliError::Generic(format!("Failed to open browser: {e}")))?;
    app.status = format!("Opened {url}");
    Ok(())
}

fn discover_len<B>(app: &App<B>) -> usize {
    app.discover.ready().map(Vec::len).unwrap_or(0)
}

fn step_list(state: &mut ratatui::widgets::ListState, len: usize, delta: i64) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0) as i64;
    let next = (current + delta).clamp(0, len as i64 - 1);
    state.select(Some(next as usize));
}

fn inside(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crossterm::event::KeyEventState;

    use super::*;
    use crate::backend::fake::{Call, FakeBackend};
    use crate::model::fixtures::three_days;
    use crate::tui::handlers::message::handle_tui_msg;
    use crate::tui::map::Marker;

    fn app(backend: FakeBackend, token: Option<&str>) -> App<FakeBackend> {
        App::new(
            Arc::new(backend),
            token.map(str::to_string),
            "http://localhost:8080".to_string(),
            "default".to_string(),
        )
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn type_text(
        tx: &mpsc::UnboundedSender<TuiMsg>,
        app: &mut App<FakeBackend>,
        text: &str,
    ) {
        for c in text.chars() {
            handle_event(tx, app, press(KeyCode::Char(c))).unwrap();
        }
    }

    async fn fulfilled(app: &mut App<FakeBackend>) {
        while app.planner.state().phase != Phase::Fulfilled {
            tokio::time::timeout(Duration::from_secs(60), app.planner.recv())
                .await
                .unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn typing_and_enter_submits_the_idea_verbatim() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::returning(three_days()), None);
        type_text(&tx, &mut app, " Kyoto, slowly ");
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, Mode::Browse);
        assert!(app.planner.state().phase.is_thinking());
        fulfilled(&mut app).await;
        assert_eq!(
            app.backend.call_kinds()[0],
            Call::Generate(" Kyoto, slowly ".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn blank_idea_stays_in_edit_mode() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::returning(three_days()), None);
        type_text(&tx, &mut app, "   ");
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, Mode::EditIdea);
        assert!(app.planner.state().notice.is_some());
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(app.backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn arrows_hover_and_enter_selects() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::returning(three_days()), None);
        app.set_input("Kyoto");
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        fulfilled(&mut app).await;

        handle_event(&tx, &mut app, press(KeyCode::Down)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Down)).unwrap();
        assert_eq!(app.planner.selection().hovered, Some(1));
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        assert_eq!(app.planner.selection().selected, Some(1));
        assert_eq!(app.planner.take_scroll_request(), Some(1));

        for _ in 0..10 {
            handle_event(&tx, &mut app, press(KeyCode::Down)).unwrap();
        }
        assert_eq!(app.planner.selection().hovered, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn mouse_hovers_list_rows_and_clicks_select_markers() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::returning(three_days()), None);
        app.set_input("Kyoto");
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        fulfilled(&mut app).await;

        app.hit.list_area = Rect::new(0, 2, 30, 20);
        app.hit.map_area = Rect::new(40, 2, 30, 20);
        app.hit.markers = vec![Marker {
            index: 3,
            x: 50,
            y: 10,
        }];

        // Row 2 of the list is activity 1; row 0 is the first day header.
        handle_event(&tx, &mut app, mouse(MouseEventKind::Moved, 5, 4)).unwrap();
        assert_eq!(app.planner.selection().hovered, Some(1));
        handle_event(&tx, &mut app, mouse(MouseEventKind::Moved, 5, 2)).unwrap();
        assert_eq!(app.planner.selection().hovered, None);

        handle_event(&tx, &mut app, mouse(MouseEventKind::Moved, 50, 10)).unwrap();
        assert_eq!(app.planner.selection().hovered, Some(3));
        handle_event(
            &tx,
            &mut app,
            mouse(MouseEventKind::Down(MouseButton::Left), 50, 10),
        )
        .unwrap();
        assert_eq!(app.planner.selection().selected, Some(3));

        handle_event(&tx, &mut app, mouse(MouseEventKind::Moved, 35, 30)).unwrap();
        assert_eq!(app.planner.selection().hovered, None);
        assert_eq!(app.planner.selection().selected, Some(3));
    }

    #[tokio::test]
    async fn onboarding_by_keyboard_posts_one_profile() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::default(), Some("tok"));
        app.open_onboarding();

        handle_event(&tx, &mut app, press(KeyCode::Char(' '))).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Right)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Right)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Esc)).unwrap();
        assert_eq!(
            app.onboarding.as_ref().unwrap().step(),
            OnboardingStep::Mobility
        );
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        type_text(&tx, &mut app, "nuts");
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::F(10))).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::F(10))).unwrap();

        let msg = rx.recv().await.unwrap();
        handle_tui_msg(&mut app, msg);
        assert!(app.onboarding.is_none());

        let calls = app.backend.call_kinds();
        assert_eq!(calls.len(), 1);
        let Call::SaveProfile { profile, .. } = &calls[0] else {
            panic!("unexpected {:?}", calls[0]);
        };
        assert!(profile.mobility.wheelchair);
        assert_eq!(profile.sensory.noise, 10);
        assert_eq!(profile.dietary, vec!["nuts"]);
    }

    #[tokio::test]
    async fn enter_on_the_dietary_step_only_adds_tags() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::default(), Some("tok"));
        app.open_onboarding();
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();

        type_text(&tx, &mut app, "gluten");
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();

        let wizard = app.onboarding.as_ref().unwrap();
        assert_eq!(wizard.step(), OnboardingStep::Dietary);
        assert_eq!(wizard.profile().dietary, vec!["gluten"]);
        assert!(!wizard.is_saving());
        assert_eq!(app.bg_tasks, 0);
        assert_eq!(app.mode, Mode::Onboarding);
    }

    #[tokio::test]
    async fn finish_key_includes_a_half_typed_tag() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::default(), Some("tok"));
        app.open_onboarding();
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Enter)).unwrap();
        type_text(&tx, &mut app, "shellfish");
        handle_event(&tx, &mut app, press(KeyCode::F(10))).unwrap();

        let msg = rx.recv().await.unwrap();
        handle_tui_msg(&mut app, msg);
        let calls = app.backend.call_kinds();
        let Call::SaveProfile { profile, .. } = &calls[0] else {
            panic!("unexpected {:?}", calls[0]);
        };
        assert_eq!(profile.dietary, vec!["shellfish"]);
    }

    #[tokio::test]
    async fn reload_while_loading_does_not_refetch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::default(), Some("tok"));
        app.mode = Mode::Browse;
        handle_event(&tx, &mut app, press(KeyCode::Char('2'))).unwrap();
        handle_event(&tx, &mut app, press(KeyCode::Char('R'))).unwrap();
        assert_eq!(app.bg_tasks, 1);

        let msg = rx.recv().await.unwrap();
        handle_tui_msg(&mut app, msg);
        assert_eq!(app.backend.call_kinds(), vec![Call::MyTrips]);

        handle_event(&tx, &mut app, press(KeyCode::Char('R'))).unwrap();
        let msg = rx.recv().await.unwrap();
        handle_tui_msg(&mut app, msg);
        assert_eq!(app.backend.call_kinds(), vec![Call::MyTrips, Call::MyTrips]);
    }

    #[tokio::test]
    async fn library_checklist_targets_the_selected_upcoming_trip() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = app(FakeBackend::default(), Some("tok"));
        app.screen = Screen::Library;
        app.mode = Mode::Browse;
        app.library = Loadable::Ready(crate::model::MyTrips {
            upcoming: vec![crate::model::Trip {
                id: "t9".to_string(),
                trip_title: "Lisbon Light".to_string(),
                destination: "Lisbon".to_string(),
                start_date: None,
                end_date: None,
                accessibility: None,
                image_url: None,
                is_past: None,
            }],
            past: Vec::new(),
        });
        app.library_state.select(Some(0));

        handle_event(&tx, &mut app, press(KeyCode::Char('c'))).unwrap();
        assert_eq!(app.mode, Mode::Checklist);
        let msg = rx.recv().await.unwrap();
        handle_tui_msg(&mut app, msg);
        assert_eq!(
            app.checklist.as_ref().unwrap().items,
            Loadable::Ready(vec!["Passport".to_string()])
        );
        assert_eq!(app.backend.call_kinds(), vec![Call::Checklist("Lisbon".to_string())]);
    }
}
