mod details_flow;
mod keymap;
mod record_flow;
#[cfg(test)]
mod test_support;
mod theme;
mod ui;

use std::io::{Stdout, stdout};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use details_flow::DetailsScreen;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Color;
use ratatui::text::Text;
use ratatui::widgets::{List, ListItem, ListState};
use record_flow::RecordScreen;
use treetally_app::App;

use crate::keymap::is_ctrl_c;
use crate::ui::modal::render_error_modal;
use crate::ui::screen::render_screen_frame;
use crate::ui::text::{compact_hint, focus_line, label_value_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    Completed,
    BackAtRoot,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootMenuExit {
    Action(RootAction),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootAction {
    Record,
    Details,
}

impl RootAction {
    fn title(self) -> &'static str {
        match self {
            Self::Record => "Record tree",
            Self::Details => "Student details",
        }
    }
}

const ROOT_ACTIONS: [RootAction; 2] = [RootAction::Record, RootAction::Details];

pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub(crate) fn enter() -> Result<Self> {
        let terminal = enter_with_ops(
            || enable_raw_mode().context("failed to enable raw mode"),
            || {
                let mut out = stdout();
                execute!(out, EnterAlternateScreen, Hide)
                    .context("failed to enter alternate screen")
            },
            || {
                let backend = CrosstermBackend::new(stdout());
                Terminal::new(backend).context("failed to create terminal backend")
            },
            || {
                let mut out = stdout();
                execute!(out, Show, LeaveAlternateScreen)
                    .context("failed to restore terminal screen during rollback")
            },
            || disable_raw_mode().context("failed to disable raw mode during rollback"),
        )?;
        Ok(Self { terminal })
    }

    pub(crate) fn draw<F>(&mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        self.terminal
            .draw(draw_fn)
            .context("failed to render terminal")?;
        Ok(())
    }

    pub(crate) fn autoresize(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .context("failed to autoresize terminal")?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(self.terminal.backend_mut(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Runs terminal setup steps in order, undoing the completed ones if a later step fails.
fn enter_with_ops<T, EnableRawMode, EnterAltScreen, CreateTerminal, LeaveAltScreen, DisableRawMode>(
    mut enable_raw_mode_op: EnableRawMode,
    mut enter_alt_screen_op: EnterAltScreen,
    mut create_terminal_op: CreateTerminal,
    mut leave_alt_screen_op: LeaveAltScreen,
    mut disable_raw_mode_op: DisableRawMode,
) -> Result<T>
where
    EnableRawMode: FnMut() -> Result<()>,
    EnterAltScreen: FnMut() -> Result<()>,
    CreateTerminal: FnMut() -> Result<T>,
    LeaveAltScreen: FnMut() -> Result<()>,
    DisableRawMode: FnMut() -> Result<()>,
{
    enable_raw_mode_op()?;

    if let Err(error) = enter_alt_screen_op() {
        return Err(failure_with_rollback(
            error,
            false,
            &mut leave_alt_screen_op,
            &mut disable_raw_mode_op,
        ));
    }

    match create_terminal_op() {
        Ok(terminal) => Ok(terminal),
        Err(error) => Err(failure_with_rollback(
            error,
            true,
            &mut leave_alt_screen_op,
            &mut disable_raw_mode_op,
        )),
    }
}

fn failure_with_rollback<LeaveAltScreen, DisableRawMode>(
    setup_error: anyhow::Error,
    alt_screen_entered: bool,
    leave_alt_screen_op: &mut LeaveAltScreen,
    disable_raw_mode_op: &mut DisableRawMode,
) -> anyhow::Error
where
    LeaveAltScreen: FnMut() -> Result<()>,
    DisableRawMode: FnMut() -> Result<()>,
{
    let mut cleanup_failures = Vec::<String>::new();

    if alt_screen_entered && let Err(error) = leave_alt_screen_op() {
        cleanup_failures.push(format!(
            "failed to restore alternate screen during rollback: {error:#}"
        ));
    }

    if let Err(error) = disable_raw_mode_op() {
        cleanup_failures.push(format!(
            "failed to disable raw mode during rollback: {error:#}"
        ));
    }

    if cleanup_failures.is_empty() {
        setup_error
    } else {
        anyhow!(
            "{setup_error:#}\nterminal rollback cleanup failed: {}",
            cleanup_failures.join("\n")
        )
    }
}

#[derive(Debug)]
struct RootScreen {
    selected: usize,
}

impl RootScreen {
    fn new() -> Self {
        Self { selected: 0 }
    }

    fn on_key(&mut self, key: crossterm::event::KeyEvent) -> Option<RootMenuExit> {
        if keymap::is_back(key) || keymap::is_quit(key) {
            return Some(RootMenuExit::Exit);
        }

        if keymap::is_up(key) {
            self.selected = self.selected.saturating_sub(1);
            return None;
        }

        if keymap::is_down(key) {
            if self.selected + 1 < ROOT_ACTIONS.len() {
                self.selected += 1;
            }
            return None;
        }

        if keymap::is_confirm(key) {
            return Some(RootMenuExit::Action(ROOT_ACTIONS[self.selected]));
        }

        None
    }

    fn render(&self, frame: &mut ratatui::Frame<'_>, signed_in: Option<&str>) {
        let key_text = compact_hint(
            frame.area().width,
            "Enter: select    Up/Down or j/k: move    Esc/q: exit",
            "Enter: select    j/k: move    Esc/q: exit",
            "Enter: select | j/k: move | Esc/q: exit",
        );
        let header = Text::from(vec![
            label_value_line("Signed in as", signed_in.unwrap_or("not signed in")),
            focus_line("Choose what you want to do"),
        ]);
        let body = render_screen_frame(frame, "treetally", header, key_text);

        let items: Vec<ListItem<'_>> = ROOT_ACTIONS
            .iter()
            .map(|action| ListItem::new(action.title()))
            .collect();
        let list = List::new(items)
            .block(theme::chrome(focus_line("Actions")))
            .highlight_style(theme::list_highlight(Color::Cyan));

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, body, &mut state);
    }
}

enum ActiveScreen {
    Root(RootScreen),
    Record(Box<RecordScreen>),
    Details(Box<DetailsScreen>),
}

enum Transition {
    Open(RootAction),
    Return(UiExit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainReason {
    Timeout,
    AfterInput,
}

trait RootLoopTickTarget {
    fn on_tick(&mut self) -> Result<()>;
    fn should_drain_loader_after_input(&self) -> bool;
}

impl RootLoopTickTarget for RecordScreen {
    fn on_tick(&mut self) -> Result<()> {
        RecordScreen::on_tick(self)
    }

    fn should_drain_loader_after_input(&self) -> bool {
        RecordScreen::should_drain_loader_after_input(self)
    }
}

impl RootLoopTickTarget for DetailsScreen {
    fn on_tick(&mut self) -> Result<()> {
        DetailsScreen::on_tick(self)
    }

    fn should_drain_loader_after_input(&self) -> bool {
        DetailsScreen::should_drain_loader_after_input(self)
    }
}

fn root_loop_drain_helper<T: RootLoopTickTarget>(
    target: &mut T,
    reason: DrainReason,
) -> Result<bool> {
    if !matches!(reason, DrainReason::Timeout) && !target.should_drain_loader_after_input() {
        return Ok(false);
    }

    target.on_tick()?;
    Ok(true)
}

fn root_loop_drain_loader(active: &mut ActiveScreen, reason: DrainReason) -> Result<bool> {
    match active {
        ActiveScreen::Root(_) => Ok(false),
        ActiveScreen::Record(screen) => root_loop_drain_helper(screen.as_mut(), reason),
        ActiveScreen::Details(screen) => root_loop_drain_helper(screen.as_mut(), reason),
    }
}

pub fn run_root(app: &App<'_>) -> Result<UiExit> {
    let signed_in = app.resolve_identity()?;
    let mut session = TerminalSession::enter()?;
    let mut active = ActiveScreen::Root(RootScreen::new());
    let mut global_error: Option<String> = None;
    const TICK_RATE: Duration = Duration::from_millis(120);

    loop {
        session.draw(|frame| {
            match &active {
                ActiveScreen::Root(screen) => screen.render(frame, signed_in.as_deref()),
                ActiveScreen::Record(screen) => screen.render(frame),
                ActiveScreen::Details(screen) => screen.render(frame),
            }

            if let Some(message) = global_error.as_deref() {
                render_global_error(frame, message);
            }
        })?;

        let has_event = event::poll(TICK_RATE).context("failed to poll terminal event")?;
        if !has_event {
            if let Err(error) = root_loop_drain_loader(&mut active, DrainReason::Timeout) {
                global_error = Some(format!("{error:#}"));
            }
            continue;
        }

        let event = event::read().context("failed to read terminal event")?;
        let key = match event {
            Event::Resize(_, _) => {
                session.autoresize()?;
                continue;
            }
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press) => key,
            _ => continue,
        };

        if is_ctrl_c(key) {
            return Ok(UiExit::Canceled);
        }

        if global_error.is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                global_error = None;
            }
            continue;
        }

        let transition = match &mut active {
            ActiveScreen::Root(screen) => match screen.on_key(key) {
                Some(RootMenuExit::Action(action)) => Some(Transition::Open(action)),
                Some(RootMenuExit::Exit) => Some(Transition::Return(UiExit::Completed)),
                None => None,
            },
            ActiveScreen::Record(screen) => match screen.on_key(key, app) {
                Ok(value) => value.map(Transition::Return),
                Err(error) => {
                    global_error = Some(format!("{error:#}"));
                    None
                }
            },
            ActiveScreen::Details(screen) => match screen.on_key(key, app) {
                Ok(value) => value.map(Transition::Return),
                Err(error) => {
                    global_error = Some(format!("{error:#}"));
                    None
                }
            },
        };

        if let Some(transition) = transition {
            match transition {
                Transition::Open(RootAction::Record) => match RecordScreen::new(app) {
                    Ok(screen) => active = ActiveScreen::Record(Box::new(screen)),
                    Err(error) => global_error = Some(format!("{error:#}")),
                },
                Transition::Open(RootAction::Details) => {
                    active = ActiveScreen::Details(Box::new(DetailsScreen::new(app)));
                }
                Transition::Return(UiExit::Canceled) => return Ok(UiExit::Canceled),
                Transition::Return(UiExit::Completed) => return Ok(UiExit::Completed),
                Transition::Return(UiExit::BackAtRoot) => {
                    active = ActiveScreen::Root(RootScreen::new());
                }
            }
        }

        if global_error.is_none()
            && let Err(error) = root_loop_drain_loader(&mut active, DrainReason::AfterInput)
        {
            global_error = Some(format!("{error:#}"));
        }
    }
}

fn render_global_error(frame: &mut ratatui::Frame<'_>, message: &str) {
    let text = format!("Operation failed.\n\n{message}");
    render_error_modal(frame, &text, "Enter/Esc: continue");
}

pub(crate) fn centered_rect(
    percent_x: u16,
    percent_y: u16,
    area: ratatui::layout::Rect,
) -> ratatui::layout::Rect {
    let pct_x = percent_x.min(100);
    let pct_y = percent_y.min(100);

    let [_, vertical, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .areas(area);
    let [_, horizontal, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .areas(vertical);
    horizontal
}
