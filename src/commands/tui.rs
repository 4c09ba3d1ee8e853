use std::io;
use std::time::{Duration, Instant};

use clap::Args;
use crossterm::cursor::Show;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::Runtime;
use crate::backend::Backend;
use crate::commands::aids::fingerprint_line;
use crate::commands::trips::trip_line;
use crate::errors::CliError;
use crate::model::{BookingData, Itinerary};
use crate::onboarding::{OnboardingStep, SLIDER_MAX};
use crate::planner::{Highlight, NoticeLevel, Phase, PriceLookup, SaveStatus};
use crate::tui::handlers::async_ops::spawn_onboarding_check;
use crate::tui::handlers::key::scroll_to_activity;
use crate::tui::handlers::{handle_event, handle_tui_msg, sync_with_planner};
use crate::tui::list::{ListRow, rows};
use crate::tui::map::place_markers;
use crate::tui::types::*;

#[derive(Debug, Args)]
pub struct TuiArgs {
    /// Pre-fill the trip idea, e.g. "5 days in Kerala"
    #[arg(long)]
    pub idea: Option<String>,
    /// Open the accessibility onboarding wizard right away
    #[arg(long)]
    pub onboarding: bool,
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, CliError> {
        enable_raw_mode()
            .map_err(|e| CliError::Generic(format!("Failed to enable raw mode: {e}")))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .map_err(|e| CliError::Generic(format!("Failed to enter alternate screen: {e}")))?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableMouseCapture, Show, LeaveAlternateScreen);
    }
}

pub async fn handle(runtime: &Runtime, args: TuiArgs) -> Result<(), CliError> {
    if runtime.output.json {
        return Err(CliError::Usage(
            "`--json` is not supported for `auryvia tui`.".to_string(),
        ));
    }

    let backend = runtime.backend()?;
    let api_url = runtime.resolved_api_url()?;
    let profile = runtime.active_profile();
    let token = runtime.resolved_token();

    let mut app = App::new(backend, token, api_url, profile);
    if let Some(idea) = args.idea.as_deref() {
        app.set_input(idea);
    }

    let guard = TerminalGuard::enter()?;

    let term_backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(term_backend)
        .map_err(|e| CliError::Generic(format!("Failed to init terminal: {e}")))?;
    terminal
        .clear()
        .map_err(|e| CliError::Generic(format!("Failed to clear terminal: {e}")))?;
    terminal
        .hide_cursor()
        .map_err(|e| CliError::Generic(format!("Failed to hide cursor: {e}")))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<TuiMsg>();
    if args.onboarding {
        app.open_onboarding();
    } else if let Some(token) = app.token.clone() {
        app.bg_tasks = app.bg_tasks.saturating_add(1);
        spawn_onboarding_check(app.backend.clone(), tx.clone(), token);
    }
    tracing::info!(signed_in = app.signed_in(), "tui started");

    loop {
        update_spinner(&mut app);
        app.list_scroll.tick();

        app.planner.pump();
        sync_with_planner(&mut app, &tx);
        if let Some(index) = app.planner.take_scroll_request() {
            scroll_to_activity(&mut app, index);
        }

        terminal
            .draw(|f| ui(f, &mut app))
            .map_err(|e| CliError::Generic(format!("Failed to draw: {e}")))?;

        if app.should_quit {
            break;
        }

        while let Ok(msg) = rx.try_recv() {
            handle_tui_msg(&mut app, msg);
        }

        // Faster cadence while something moves on screen.
        let poll_ms = if app.is_animating() { 33 } else { 120 };
        if crossterm::event::poll(Duration::from_millis(poll_ms))
            .map_err(|e| CliError::Generic(format!("Event poll failed: {e}")))?
        {
            let event = crossterm::event::read()
                .map_err(|e| CliError::Generic(format!("Event read failed: {e}")))?;
            if let Err(err) = handle_event(&tx, &mut app, event) {
                tracing::warn!(error = %err, "input handler failed");
                app.status = format!("Error: {err}");
            }
        }
        // Let spawned work make progress between frames.
        tokio::task::yield_now().await;
    }

    terminal
        .show_cursor()
        .map_err(|e| CliError::Generic(format!("Failed to restore cursor: {e}")))?;
    drop(guard);
    tracing::info!("tui closed");
    Ok(())
}

fn ui<B>(f: &mut Frame<'_>, app: &mut App<B>)
where
    B: Backend + Sync + 'static,
{
    let size = f.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Min(1),    // screen body
            Constraint::Length(1), // status bar
        ])
        .split(size);

    render_header(f, app, layout[0]);
    match app.screen {
        Screen::Plan => render_plan(f, app, layout[1]),
        Screen::Library => render_library(f, app, layout[1]),
        Screen::Discover => render_discover(f, app, layout[1]),
    }
    render_status_bar(f, app, layout[2]);

    match app.mode {
        Mode::Onboarding => {
            let area = centered_rect(70, 70, size);
            f.render_widget(Clear, area);
            render_onboarding_popup(f, app, area);
        }
        Mode::Checklist => {
            let area = centered_rect(60, 60, size);
            f.render_widget(Clear, area);
            f.render_widget(render_checklist(app), area);
        }
        Mode::Reshuffle => {
            let area = centered_rect(60, 35, size);
            f.render_widget(Clear, area);
            f.render_widget(render_reshuffle(app), area);
        }
        Mode::Help => {
            let area = centered_rect(70, 70, size);
            f.render_widget(Clear, area);
            f.render_widget(render_help(), area);
        }
        Mode::Browse | Mode::EditIdea => {}
    }
}

fn render_header<B>(f: &mut Frame<'_>, app: &App<B>, area: Rect)
where
    B: Backend + Sync + 'static,
{
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let base = Style::default().fg(Color::Black).bg(Color::White);
    let mut spans = vec![Span::styled(
        " ✦ Auryvia ",
        Style::default()
            .fg(Color::White)
            .bg(c_brand())
            .add_modifier(Modifier::BOLD),
    )];
    for (i, screen) in Screen::ALL.iter().enumerate() {
        let label = format!(" {} {} ", i + 1, screen.title());
        let style = if *screen == app.screen {
            Style::default().fg(c_brand()).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default()
        };
        spans.push(Span::styled(label, style));
    }
    let left = Paragraph::new(Line::from(spans)).style(base);

    let who = if app.signed_in() { "signed in" } else { "guest" };
    let right = Paragraph::new(format!(" api={}  profile={}  {who} ", app.api_url, app.profile))
        .style(base)
        .alignment(Alignment::Right);

    f.render_widget(left, cols[0]);
    f.render_widget(right, cols[1]);
}

fn render_plan<B>(f: &mut Frame<'_>, app: &mut App<B>, area: Rect)
where
    B: Backend + Sync + 'static,
{
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // idea input
            Constraint::Min(4),    // thinking / result
            Constraint::Length(5), // booking, sensory, save
        ])
        .split(area);

    f.render_widget(render_input(app), layout[0]);
    if app.mode == Mode::EditIdea {
        let x = layout[0]
            .x
            .saturating_add(1)
            .saturating_add(IDEA_PROMPT.width() as u16)
            .saturating_add(app.input[..app.cursor].iter().collect::<String>().width() as u16);
        let y = layout[0].y.saturating_add(1);
        f.set_cursor_position((x.min(layout[0].right().saturating_sub(2)), y));
    }

    let phase = app.planner.state().phase.clone();
    match phase {
        Phase::Thinking { step } => {
            app.hit = HitMap::default();
            f.render_widget(render_thinking(app, step), layout[1]);
        }
        Phase::Failed(message) => {
            app.hit = HitMap::default();
            let p = Paragraph::new(Text::from(vec![
                Line::from(Span::styled(
                    "We couldn't plan this trip.",
                    Style::default().fg(c_err()).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(message),
                Line::from(""),
                Line::from(Span::styled(
                    "Press `e` to adjust your idea and try again.",
                    Style::default().fg(c_muted()),
                )),
            ]))
            .block(rounded_block(" Plan "))
            .wrap(Wrap { trim: false });
            f.render_widget(p, layout[1]);
        }
        Phase::Fulfilled => render_result(f, app, layout[1]),
        Phase::Idle => {
            app.hit = HitMap::default();
            let p = Paragraph::new(Text::from(vec![
                Line::from(Span::styled(
                    "Where do you want to go?",
                    Style::default().fg(c_brand()).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from("Describe a trip in your own words, e.g. \"5 days in Kerala, slow pace\"."),
                Line::from("Your accessibility profile shapes every plan."),
            ]))
            .block(rounded_block(" Plan "))
            .wrap(Wrap { trim: false });
            f.render_widget(p, layout[1]);
        }
    }

    f.render_widget(render_trip_info(app), layout[2]);
}

const IDEA_PROMPT: &str = "✈ ";

fn render_input<B>(app: &App<B>) -> Paragraph<'static>
where
    B: Backend + Sync + 'static,
{
    let editing = app.mode == Mode::EditIdea;
    let border = if editing { c_brand() } else { c_muted() };
    let title = if editing {
        " Trip idea (Enter to plan, Esc to browse) "
    } else {
        " Trip idea (e to edit) "
    };
    let text = app.input_text();
    let body = if text.is_empty() && !editing {
        Span::styled("5 days in Kerala...", Style::default().fg(c_muted()))
    } else {
        Span::raw(text)
    };
    Paragraph::new(Line::from(vec![
        Span::styled(IDEA_PROMPT, Style::default().fg(c_brand())),
        body,
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(title),
    )
}

fn render_thinking<B>(app: &App<B>, current: usize) -> Paragraph<'static>
where
    B: Backend + Sync + 'static,
{
    let mut lines = vec![
        Line::from(Span::styled(
            "Crafting your journey",
            Style::default().fg(c_brand()).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (i, step) in app.planner.steps().iter().enumerate() {
        let line = if i < current {
            Line::from(vec![
                Span::styled(" ✓ ", Style::default().fg(c_ok())),
                Span::styled(step.label, Style::default().fg(c_muted())),
            ])
        } else if i == current {
            Line::from(vec![
                Span::styled(
                    format!(" {} ", spinner_frame(app.spinner_step)),
                    Style::default().fg(c_brand()),
                ),
                Span::styled(step.label, Style::default().add_modifier(Modifier::BOLD)),
            ])
        } else {
            Line::from(Span::styled(
                format!("   {}", step.label),
                Style::default().fg(c_muted()),
            ))
        };
        lines.push(line);
    }
    Paragraph::new(Text::from(lines)).block(rounded_block(" Thinking "))
}

fn render_result<B>(f: &mut Frame<'_>, app: &mut App<B>, area: Rect)
where
    B: Backend + Sync + 'static,
{
    let Some(itinerary) = app.planner.state().itinerary.clone() else {
        return;
    };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let list_block = rounded_block(" Itinerary ").title(
        Line::from(format!(" {} ", truncate_to_width(&itinerary.trip_title, 40)))
            .alignment(Alignment::Right),
    );
    let list_inner = list_block.inner(cols[0]);
    let lines = itinerary_lines(
        &itinerary,
        app.planner.selection(),
        list_inner.width as usize,
    );
    let list = Paragraph::new(Text::from(lines))
        .block(list_block)
        .scroll((app.list_scroll.offset() as u16, 0));
    f.render_widget(list, cols[0]);
    app.hit.list_area = list_inner;

    let map_block = rounded_block(" Map (click a marker) ");
    let map_inner = map_block.inner(cols[1]);
    f.render_widget(map_block, cols[1]);
    let markers = place_markers(&itinerary, map_inner);
    if markers.is_empty() {
        let p = Paragraph::new("No mapped locations for this trip.")
            .style(Style::default().fg(c_muted()))
            .alignment(Alignment::Center);
        f.render_widget(p, map_inner);
    }
    let selection = app.planner.selection();
    let buf = f.buffer_mut();
    for marker in &markers {
        let (glyph, style) = match selection.highlight(marker.index) {
            Highlight::Selected => (
                "★",
                Style::default().fg(c_star()).add_modifier(Modifier::BOLD),
            ),
            Highlight::Hovered => ("◉", Style::default().fg(c_sparkle())),
            Highlight::Neutral => ("●", Style::default().fg(c_heart())),
        };
        buf.set_string(marker.x, marker.y, glyph, style);
    }
    app.hit.map_area = map_inner;
    app.hit.markers = markers;
}

/// One line per list row, styled by the current highlight. Activity rows come
/// in flattened order, so one pass over `flatten()` feeds them.
fn itinerary_lines(
    itinerary: &Itinerary,
    selection: crate::planner::SelectionState,
    width: usize,
) -> Vec<Line<'static>> {
    let mut activities = itinerary.flatten();
    rows(itinerary)
        .into_iter()
        .map(|row| match row {
            ListRow::Gap => Line::from(""),
            ListRow::Day(pos) => {
                let day = &itinerary.itinerary[pos];
                Line::from(Span::styled(
                    truncate_to_width(&format!("Day {}: {}", day.day, day.title), width),
                    Style::default().fg(c_brand()).add_modifier(Modifier::BOLD),
                ))
            }
            ListRow::Activity(_) => {
                let Some((r, activity)) = activities.next() else {
                    return Line::from("");
                };
                let index = r.index;
                let pin = if activity.coords().is_some() { "📍" } else { "  " };
                let text = truncate_to_width(
                    &format!(" {pin} {:<9} {}", activity.time, activity.description),
                    width,
                );
                let style = match selection.highlight(index) {
                    Highlight::Selected => Style::default()
                        .fg(Color::Black)
                        .bg(c_star())
                        .add_modifier(Modifier::BOLD),
                    Highlight::Hovered => Style::default().fg(Color::Black).bg(c_sparkle()),
                    Highlight::Neutral => Style::default(),
                };
                Line::from(Span::styled(text, style))
            }
        })
        .collect()
}

fn render_trip_info<B>(app: &App<B>) -> Paragraph<'static>
where
    B: Backend + Sync + 'static,
{
    let state = app.planner.state();
    let mut lines = Vec::new();

    match &state.price_lookup {
        PriceLookup::Pending => lines.push(Line::from(Span::styled(
            format!("{} Checking live prices...", spinner_frame(app.spinner_step)),
            Style::default().fg(c_muted()),
        ))),
        PriceLookup::Done(booking) => lines.push(booking_line(booking)),
        PriceLookup::None | PriceLookup::Failed => {}
    }

    if let Some(location) = &app.sensory_for {
        let text = match &app.sensory {
            Loadable::Ready(profile) => format!("{location}: {}", fingerprint_line(profile)),
            Loadable::Loading => format!("{location}: reading the sensory fingerprint..."),
            Loadable::Failed(_) | Loadable::Idle => {
                format!("{location}: sensory fingerprint unavailable")
            }
        };
        lines.push(Line::from(text));
    }

    if let Some(status) = &state.save_status {
        let color = match status {
            SaveStatus::Saved => c_ok(),
            SaveStatus::Saving => c_muted(),
            SaveStatus::LoginRequired => c_warn(),
            SaveStatus::Failed(_) => c_err(),
        };
        lines.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(color),
        )));
    } else if state.phase == Phase::Fulfilled {
        lines.push(Line::from(Span::styled(
            "s save  r reshuffle  o open in map  ↑↓ browse  Enter select",
            Style::default().fg(c_muted()),
        )));
    }

    Paragraph::new(Text::from(lines))
        .block(rounded_block(" Trip "))
        .wrap(Wrap { trim: true })
}

fn booking_line(booking: &BookingData) -> Line<'static> {
    Line::from(vec![
        Span::styled("✈ ", Style::default().fg(c_sparkle())),
        Span::raw(format!(
            "{}  ₹{}   ",
            booking.flights.airline, booking.flights.price
        )),
        Span::styled("🏨 ", Style::default().fg(c_heart())),
        Span::raw(format!(
            "{}  ₹{} / night",
            booking.hotels.name, booking.hotels.price_per_night
        )),
    ])
}

fn render_library<B>(f: &mut Frame<'_>, app: &mut App<B>, area: Rect)
where
    B: Backend + Sync + 'static,
{
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let tab = |label: &'static str, active: bool| {
        if active {
            Span::styled(
                format!(" {label} "),
                Style::default().fg(Color::White).bg(c_brand()),
            )
        } else {
            Span::styled(format!(" {label} "), Style::default().fg(c_muted()))
        }
    };
    let tabs = Line::from(vec![
        tab("Upcoming", app.library_tab == LibraryTab::Upcoming),
        Span::raw(" "),
        tab("Past", app.library_tab == LibraryTab::Past),
        Span::styled("   t switch  c checklist  R reload", Style::default().fg(c_muted())),
    ]);
    f.render_widget(Paragraph::new(tabs), layout[0]);

    let block = rounded_block(" My Trips ");
    match &app.library {
        Loadable::Idle | Loadable::Loading => {
            let p = Paragraph::new(format!("{} Loading your trips...", spinner_frame(app.spinner_step)))
                .block(block);
            f.render_widget(p, layout[1]);
        }
        Loadable::Failed(message) => {
            let p = Paragraph::new(format!("Could not load your trips: {message}"))
                .style(Style::default().fg(c_err()))
                .block(block)
                .wrap(Wrap { trim: false });
            f.render_widget(p, layout[1]);
        }
        _ => {
            let empty = match app.library_tab {
                LibraryTab::Upcoming => "No upcoming trips yet. Plan one from the Plan tab.",
                LibraryTab::Past => "No past trips.",
            };
            let list = trip_list(app.library_trips(), empty, block);
            f.render_stateful_widget(list, layout[1], &mut app.library_state);
        }
    }
}

fn render_discover<B>(f: &mut Frame<'_>, app: &mut App<B>, area: Rect)
where
    B: Backend + Sync + 'static,
{
    let block = rounded_block(" Discover (R reload) ");
    match &app.discover {
        Loadable::Ready(trips) => {
            let list = trip_list(trips, "No public trips to show.", block);
            f.render_stateful_widget(list, area, &mut app.discover_state);
        }
        _ => {
            let p = Paragraph::new(format!(
                "{} Finding inspiration...",
                spinner_frame(app.spinner_step)
            ))
            .block(block);
            f.render_widget(p, area);
        }
    }
}

fn trip_list(
    trips: &[crate::model::Trip],
    empty: &'static str,
    block: Block<'static>,
) -> List<'static> {
    let items: Vec<ListItem<'static>> = if trips.is_empty() {
        vec![ListItem::new(Span::styled(empty, Style::default().fg(c_muted())))]
    } else {
        trips.iter().map(|t| ListItem::new(trip_line(t))).collect()
    };
    List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(c_sparkle()))
        .highlight_symbol("› ")
}

fn render_status_bar<B>(f: &mut Frame<'_>, app: &App<B>, area: Rect)
where
    B: Backend + Sync + 'static,
{
    let (text, color) = match &app.planner.state().notice {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => c_sparkle(),
                NoticeLevel::Success => c_ok(),
                NoticeLevel::Warning => c_warn(),
                NoticeLevel::Error => c_err(),
            };
            (notice.message.clone(), color)
        }
        None => (app.status.clone(), Color::White),
    };
    let busy = if app.bg_tasks > 0 || app.planner.is_busy() {
        format!("{} ", spinner_frame(app.spinner_step))
    } else {
        "  ".to_string()
    };
    let hint = "? help  Tab screens  q quit ";
    let room = (area.width as usize).saturating_sub(hint.width() + busy.width() + 1);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(hint.width() as u16)])
        .split(area);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(busy, Style::default().fg(c_brand())),
            Span::styled(truncate_to_width(&text, room), Style::default().fg(color)),
        ])),
        cols[0],
    );
    f.render_widget(
        Paragraph::new(hint)
            .style(Style::default().fg(c_muted()))
            .alignment(Alignment::Right),
        cols[1],
    );
}

const MOBILITY_LABELS: [&str; 3] = [
    "I use a wheelchair",
    "Avoid stairs where possible",
    "I need frequent rest stops",
];
const SLIDER_LABELS: [&str; 2] = ["Noise sensitivity", "Visual sensitivity"];

fn render_onboarding_popup<B>(f: &mut Frame<'_>, app: &App<B>, area: Rect)
where
    B: Backend + Sync + 'static,
{
    let Some(wizard) = app.onboarding.as_ref() else {
        return;
    };
    let step = wizard.step();
    let focus = app.onboarding_focus;
    let profile = wizard.profile();

    let dots: String = OnboardingStep::ALL
        .iter()
        .map(|s| if s.index() <= step.index() { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ");
    let mut lines = vec![
        Line::from(Span::styled(dots, Style::default().fg(c_brand()))),
        Line::from(Span::styled(
            step.title(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(step.subtitle(), Style::default().fg(c_muted()))),
        Line::from(""),
    ];

    let cursor = |i: usize| if i == focus { "› " } else { "  " };
    match step {
        OnboardingStep::Mobility => {
            let flags = [
                profile.mobility.wheelchair,
                profile.mobility.avoid_stairs,
                profile.mobility.frequent_rests,
            ];
            for (i, (label, on)) in MOBILITY_LABELS.iter().zip(flags).enumerate() {
                let mark = if on { "[x]" } else { "[ ]" };
                lines.push(Line::from(format!("{}{mark} {label}", cursor(i))));
            }
            lines.push(Line::from(""));
            lines.push(hint_line("↑↓ move  Space toggle  Enter next  Esc skip"));
        }
        OnboardingStep::Sensory => {
            let values = [profile.sensory.noise, profile.sensory.visual];
            for (i, (label, value)) in SLIDER_LABELS.iter().zip(values).enumerate() {
                lines.push(Line::from(format!("{}{label}", cursor(i))));
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(slider_bar(value, 20), Style::default().fg(c_sparkle())),
                    Span::raw(format!(" {value:>3}")),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(hint_line("↑↓ move  ←→ adjust  Enter next  Esc back"));
        }
        OnboardingStep::Dietary => {
            lines.push(Line::from(vec![
                Span::raw("Add: "),
                Span::styled(
                    format!("{}▏", wizard.tag_input()),
                    Style::default().fg(c_sparkle()),
                ),
            ]));
            lines.push(Line::from(""));
            if profile.dietary.is_empty() {
                lines.push(Line::from(Span::styled(
                    "No restrictions added.",
                    Style::default().fg(c_muted()),
                )));
            }
            for (i, tag) in profile.dietary.iter().enumerate() {
                lines.push(Line::from(format!("{}• {tag}", cursor(i))));
            }
            lines.push(Line::from(""));
            let hint = if wizard.is_saving() {
                "Saving your profile..."
            } else {
                "type + Enter add  Del remove  F10 finish  Esc back"
            };
            lines.push(hint_line(hint));
        }
    }

    let title = format!(" Welcome · step {}/{} ", step.index() + 1, OnboardingStep::ALL.len());
    let p = Paragraph::new(Text::from(lines))
        .block(rounded_block(&title).border_style(Style::default().fg(c_brand())))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn render_checklist<B>(app: &App<B>) -> Paragraph<'static>
where
    B: Backend + Sync + 'static,
{
    let mut lines = Vec::new();
    let title = match &app.checklist {
        Some(dialog) => {
            match &dialog.items {
                Loadable::Ready(items) if items.is_empty() => {
                    lines.push(Line::from("Nothing special to pack."));
                }
                Loadable::Ready(items) => {
                    for item in items {
                        lines.push(Line::from(format!("☐ {item}")));
                    }
                }
                Loadable::Failed(message) => lines.push(Line::from(Span::styled(
                    format!("Could not build a checklist: {message}"),
                    Style::default().fg(c_err()),
                ))),
                Loadable::Loading | Loadable::Idle => lines.push(Line::from(format!(
                    "{} Packing your bags...",
                    spinner_frame(app.spinner_step)
                ))),
            }
            format!(" Checklist · {} ", dialog.trip_title)
        }
        None => " Checklist ".to_string(),
    };
    lines.push(Line::from(""));
    lines.push(hint_line("Esc close"));
    Paragraph::new(Text::from(lines))
        .block(rounded_block(&title))
        .wrap(Wrap { trim: false })
}

fn render_reshuffle<B>(app: &App<B>) -> Paragraph<'static>
where
    B: Backend + Sync + 'static,
{
    let mut lines = Vec::new();
    match &app.reshuffle {
        Loadable::Ready(s) => {
            lines.push(Line::from(vec![
                Span::raw("How about we swap "),
                Span::styled(s.replace.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" with "),
                Span::styled(
                    s.suggestion.clone(),
                    Style::default().fg(c_ok()).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" instead?"),
            ]));
            lines.push(Line::from(""));
            lines.push(hint_line("y accept  n keep my plan"));
        }
        Loadable::Failed(message) => {
            lines.push(Line::from(Span::styled(
                format!("No suggestion right now: {message}"),
                Style::default().fg(c_err()),
            )));
            lines.push(Line::from(""));
            lines.push(hint_line("Esc close"));
        }
        Loadable::Loading | Loadable::Idle => lines.push(Line::from(format!(
            "{} Looking for a gentler alternative...",
            spinner_frame(app.spinner_step)
        ))),
    }
    Paragraph::new(Text::from(lines))
        .block(rounded_block(" Feeling tired? "))
        .wrap(Wrap { trim: false })
}

fn render_help() -> Paragraph<'static> {
    let lines = vec![
        Line::from(vec![Span::styled(
            "Auryvia TUI",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Tab / 1-3: switch screens"),
        Line::from("e: edit trip idea, Enter: plan it"),
        Line::from("↑↓: browse activities, Enter: select"),
        Line::from("Mouse: hover rows or markers, click a marker to select"),
        Line::from("PgUp/PgDn, wheel: scroll itinerary"),
        Line::from("s: save trip   r: reshuffle   o: open activity in a map"),
        Line::from("a: accessibility profile"),
        Line::from("Library: t switch tab, c packing checklist, R reload"),
        Line::from("q / Esc: quit (or close popup)"),
        Line::from(""),
        Line::from("Saving needs a signed-in profile: run `auryvia auth login`."),
    ];

    Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help (Esc to close)"),
        )
        .wrap(Wrap { trim: false })
}

fn rounded_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title.to_string())
}

fn hint_line(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(c_muted())))
}

fn slider_bar(value: u8, cells: usize) -> String {
    let filled = (usize::from(value) * cells + usize::from(SLIDER_MAX) / 2) / usize::from(SLIDER_MAX);
    let filled = filled.min(cells);
    format!("{}{}", "━".repeat(filled), "┄".repeat(cells - filled))
}

fn c_star() -> Color {
    Color::Rgb(255, 205, 86)
}

fn c_heart() -> Color {
    Color::Rgb(255, 45, 149)
}

fn c_sparkle() -> Color {
    Color::Rgb(0, 255, 255)
}

fn c_brand() -> Color {
    Color::Rgb(131, 56, 236)
}

fn c_ok() -> Color {
    Color::Rgb(22, 163, 74)
}

fn c_warn() -> Color {
    Color::Rgb(245, 158, 11)
}

fn c_err() -> Color {
    Color::Rgb(220, 38, 38)
}

fn c_muted() -> Color {
    Color::Rgb(100, 116, 139)
}

// Base animation cadence; the list easing runs on every frame instead.
const SPINNER_INTERVAL_MS: u64 = 275;
const SPINNER_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];

fn spinner_frame(step: u64) -> &'static str {
    SPINNER_FRAMES[(step % SPINNER_FRAMES.len() as u64) as usize]
}

fn update_spinner<B>(app: &mut App<B>)
where
    B: Backend + Sync + 'static,
{
    if !app.is_animating() {
        return;
    }
    let now = Instant::now();
    if now.duration_since(app.spinner_last) >= Duration::from_millis(SPINNER_INTERVAL_MS) {
        app.spinner_last = now;
        app.spinner_step = app.spinner_step.wrapping_add(1);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let popup_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);

    popup_layout[1]
}

fn truncate_to_width(input: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if input.width() <= max_width {
        return input.to_string();
    }

    const ELLIPSIS: &str = "…";
    let ell_w = ELLIPSIS.width();
    if max_width <= ell_w {
        return ELLIPSIS.to_string();
    }

    let mut out = String::new();
    let mut w = 0usize;
    for ch in input.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if w + cw + ell_w > max_width {
            break;
        }
        out.push(ch);
        w += cw;
    }
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::backend::TestBackend;

    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::model::fixtures::three_days;

    fn draw(app: &mut App<FakeBackend>) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for row in buf.content.chunks(buf.area.width as usize) {
            for cell in row {
                out.push_str(cell.symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("Kyoto", 10), "Kyoto");
        assert_eq!(truncate_to_width("Philosopher's path", 8), "Philoso…");
        assert_eq!(truncate_to_width("京都の庭園", 5), "京都…");
        assert_eq!(truncate_to_width("anything", 0), "");
    }

    #[test]
    fn slider_bar_fills_proportionally() {
        assert_eq!(slider_bar(0, 4), "┄┄┄┄");
        assert_eq!(slider_bar(50, 4), "━━┄┄");
        assert_eq!(slider_bar(100, 4), "━━━━");
    }

    #[test]
    fn itinerary_lines_follow_row_order() {
        let itinerary = three_days();
        let selection = crate::planner::SelectionState {
            hovered: Some(3),
            selected: Some(1),
        };
        let lines = itinerary_lines(&itinerary, selection, 60);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

        assert_eq!(text.len(), rows(&itinerary).len());
        assert!(text[0].starts_with("Day 1: Temples"));
        assert!(text[2].contains("Tea house"));
        assert!(text[7].contains("Moss garden"));
        assert!(text[9].contains("Quiet dinner"));
        assert_eq!(lines[2].spans[0].style.bg, Some(c_star()));
        assert_eq!(lines[8].spans[0].style.bg, Some(c_sparkle()));
        assert_eq!(lines[7].spans[0].style.bg, None);
    }

    #[tokio::test(start_paused = true)]
    async fn fulfilled_plan_records_hit_areas_and_markers() {
        let mut itinerary = three_days();
        itinerary.itinerary[0].activities[0].lat = Some(34.9949);
        itinerary.itinerary[0].activities[0].lng = Some(135.7850);
        itinerary.itinerary[2].activities[1].lat = Some(35.0270);
        itinerary.itinerary[2].activities[1].lng = Some(135.7948);
        let mut app = App::new(
            Arc::new(FakeBackend::returning(itinerary)),
            None,
            "http://localhost:8080".to_string(),
            "default".to_string(),
        );
        app.planner.set_idea("Kyoto");
        app.planner.submit();
        while app.planner.state().phase != Phase::Fulfilled {
            app.planner.recv().await;
        }
        app.mode = Mode::Browse;

        let terminal = draw(&mut app);
        assert!(app.hit.list_area.height > 0);
        assert!(app.hit.map_area.width > 0);
        let indices: Vec<usize> = app.hit.markers.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 3]);

        let text = screen_text(&terminal);
        assert!(text.contains("Day 1: Temples"));
        assert!(text.contains("Moss garden"));
    }

    #[tokio::test(start_paused = true)]
    async fn thinking_screen_lists_every_step() {
        let mut app = App::new(
            Arc::new(FakeBackend::returning(three_days())),
            None,
            "http://localhost:8080".to_string(),
            "default".to_string(),
        );
        app.planner.set_idea("Kyoto");
        app.planner.submit();

        let terminal = draw(&mut app);
        let text = screen_text(&terminal);
        for step in app.planner.steps() {
            assert!(text.contains(step.label), "missing {}", step.label);
        }
        assert!(app.hit.markers.is_empty());
    }
}
