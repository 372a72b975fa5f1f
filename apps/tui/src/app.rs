//! Core TUI application state and event loop.

use std::io;
use std::time::Duration;

use bidflow_core::{ProgressReporter, SessionStore, VaultChange, Workbench};
use bidflow_ingest::load_uploads;
use bidflow_shared::SessionId;
use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::screens::{Action, Screen, ScreenId, View};
use crate::widgets::status_bar;

/// Application state.
pub(crate) struct App {
    /// Currently active screen tab.
    pub active_tab: usize,
    /// Available screens.
    pub screens: Vec<ScreenId>,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
    /// Per-screen state.
    pub screen_states: Vec<Screen>,
    bench: Workbench,
    runtime: Runtime,
    sessions: SessionStore,
    session_id: SessionId,
}

impl App {
    pub(crate) fn new(bench: Workbench) -> Result<Self> {
        let screens = vec![
            ScreenId::Vault,
            ScreenId::Decompose,
            ScreenId::Respond,
            ScreenId::Export,
        ];
        let screen_states = screens.iter().map(|s| Screen::new(*s)).collect();
        let mut sessions = SessionStore::new();
        let session_id = sessions.create();
        info!(session = %session_id, model = bench.model_id(), "session opened");

        Ok(Self {
            active_tab: 0,
            screens,
            should_quit: false,
            status: "Ready — press ? for help".to_string(),
            show_help: false,
            screen_states,
            bench,
            runtime: Runtime::new()?,
            sessions,
            session_id,
        })
    }

    fn current_screen(&self) -> &Screen {
        &self.screen_states[self.active_tab]
    }

    fn view(&self) -> View<'_> {
        View {
            session: self.sessions.get(&self.session_id),
            profile: self.bench.profile(),
            export_file: &self.bench.config().export.file_name,
        }
    }

    /// Drop the current session and start an empty one.
    fn reset_session(&mut self) {
        self.sessions.remove(&self.session_id);
        self.session_id = self.sessions.create();
        self.screen_states = self.screens.iter().map(|s| Screen::new(*s)).collect();
        self.active_tab = 0;
        info!(session = %self.session_id, "session reset");
        self.status = "New session started.".to_string();
    }

    /// Run one action against the session. Blocks until it finishes.
    fn perform(&mut self, action: Action) {
        let Some(session) = self.sessions.get_mut(&self.session_id) else {
            self.status = "No active session. Press Ctrl-N to start one.".to_string();
            return;
        };
        let progress = LogProgress;

        let outcome = match action {
            Action::SyncVault(paths) => load_uploads(&paths)
                .and_then(|files| self.bench.sync_vault(session, &files))
                .map(|change| {
                    let count = session.vault().map_or(0, |v| v.documents().len());
                    match change {
                        VaultChange::Created => {
                            format!("Vault synchronized with {count} documents.")
                        }
                        VaultChange::Unchanged => {
                            format!("Vault unchanged ({count} documents); results kept.")
                        }
                        VaultChange::Replaced => format!(
                            "Vault replaced with {count} documents; earlier results cleared."
                        ),
                    }
                }),
            Action::Decompose => self
                .runtime
                .block_on(self.bench.run_decomposition(session, &progress))
                .map(|_| "Global decomposition complete!".to_string()),
            Action::Respond => self
                .runtime
                .block_on(self.bench.run_responses(session, &progress))
                .map(|result| {
                    if result.missing_ids.is_empty() {
                        "Global response generation complete!".to_string()
                    } else {
                        format!(
                            "Responses generated; not addressed: {}",
                            result.missing_ids.join(", ")
                        )
                    }
                }),
            Action::Export(dir) => self
                .bench
                .export(session, &dir)
                .map(|path| format!("Exported to {}", path.display())),
        };

        self.status = match outcome {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "action failed");
                e.user_message()
            }
        };
    }
}

/// Progress reporter that writes to the log file.
struct LogProgress;

impl ProgressReporter for LogProgress {
    fn phase(&self, name: &str) {
        info!(phase = name, "pipeline phase");
    }

    fn task_started(&self, title: &str, current: usize, total: usize) {
        info!(task = title, current, total, "task started");
    }

    fn task_finished(&self, title: &str, chars: usize) {
        info!(task = title, chars, "task finished");
    }
}

/// Entry point: sets up terminal, runs event loop, restores terminal.
pub(crate) fn run(bench: Workbench) -> Result<()> {
    let app = App::new(bench)?;

    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = handle_key(&mut app, key.code, key.modifiers) {
                    app.status = action.busy_message().to_string();
                    terminal.draw(|f| draw(f, &app))?;
                    app.perform(action);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    // Global keybindings (always active)
    match code {
        KeyCode::Char('q') | KeyCode::Char('c')
            if modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.should_quit = true;
            return None;
        }
        KeyCode::Char('n') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.reset_session();
            return None;
        }
        KeyCode::Char('q') if !app.current_screen().is_editing() => {
            app.should_quit = true;
            return None;
        }
        KeyCode::Char('?') if !app.current_screen().is_editing() => {
            app.show_help = !app.show_help;
            return None;
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            return None;
        }
        // Tab navigation with number keys
        KeyCode::Char(c @ '1'..='4') if !app.current_screen().is_editing() => {
            let idx = (c as usize) - ('1' as usize);
            if idx < app.screens.len() {
                app.active_tab = idx;
                app.status = format!("{}", app.screens[idx]);
            }
            return None;
        }
        KeyCode::Tab if !app.current_screen().is_editing() => {
            app.active_tab = (app.active_tab + 1) % app.screens.len();
            app.status = format!("{}", app.screens[app.active_tab]);
            return None;
        }
        KeyCode::BackTab if !app.current_screen().is_editing() => {
            app.active_tab = if app.active_tab == 0 {
                app.screens.len() - 1
            } else {
                app.active_tab - 1
            };
            app.status = format!("{}", app.screens[app.active_tab]);
            return None;
        }
        _ => {}
    }

    // If help is showing, consume any key to dismiss
    if app.show_help {
        app.show_help = false;
        return None;
    }

    // Delegate to current screen
    let view = View {
        session: app.sessions.get(&app.session_id),
        profile: app.bench.profile(),
        export_file: &app.bench.config().export.file_name,
    };
    app.screen_states[app.active_tab].handle_key(code, modifiers, &view)
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    // Tab bar; phase 2 is dimmed until a decomposition exists
    let phase_two = app
        .sessions
        .get(&app.session_id)
        .is_some_and(|s| s.phase_two_available());
    let tab_titles: Vec<Line> = app
        .screens
        .iter()
        .map(|s| {
            let line = Line::from(format!("{s}"));
            if *s == ScreenId::Respond && !phase_two {
                line.style(Style::default().fg(Color::DarkGray))
            } else {
                line
            }
        })
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" BidFlow · Global Response Architecture "),
        )
        .select(app.active_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");

    f.render_widget(tabs, chunks[0]);

    // Content area: delegate to screen
    app.current_screen().draw(f, chunks[1], &app.view());

    // Status bar
    let bar = status_bar(&app.status);
    f.render_widget(bar, chunks[2]);

    // Help overlay
    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-4          Switch to screen"),
        Line::from("  Tab/S-Tab    Next/previous screen"),
        Line::from("  Ctrl-N       Start a new session"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Screen-specific:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  Enter        Edit / run the stage / export"),
        Line::from("  Esc          Stop editing"),
        Line::from("  ↑/↓ PgUp/Dn  Scroll results"),
        Line::from("  p            Toggle business identity (Vault)"),
        Line::from("  e            Edit output directory (Export)"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help — press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
