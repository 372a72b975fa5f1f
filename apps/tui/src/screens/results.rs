//! Phase screens: run a pipeline stage and read its result.

use bidflow_shared::PipelineResult;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::{Action, View};
use crate::widgets::hint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Decomposition,
    Responses,
}

pub(crate) struct ResultsScreen {
    stage: Stage,
    scroll: u16,
}

impl ResultsScreen {
    pub(crate) fn new(stage: Stage) -> Self {
        Self { stage, scroll: 0 }
    }

    fn result<'a>(&self, view: &View<'a>) -> Option<&'a PipelineResult> {
        let session = view.session?;
        match self.stage {
            Stage::Decomposition => session.decomposition(),
            Stage::Responses => session.responses(),
        }
    }

    /// Whether this stage can run. Phase 2 is only offered once phase 1 is stored.
    fn available(&self, view: &View<'_>) -> bool {
        view.session.is_some_and(|s| match self.stage {
            Stage::Decomposition => s.vault().is_some(),
            Stage::Responses => s.phase_two_available(),
        })
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, view: &View<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1), // Hint
                Constraint::Min(1),    // Result
            ])
            .split(area);

        let hint_text = match (self.stage, self.available(view)) {
            (Stage::Decomposition, false) => "Synchronize the tender pack on the Vault tab first.",
            (Stage::Responses, false) => "Phase 2 unlocks once the decomposition is complete.",
            (Stage::Decomposition, true) => {
                "Enter to decompose & audit compliance gates · ↑/↓ PgUp/PgDn to scroll"
            }
            (Stage::Responses, true) => {
                "Enter to generate scored weighted responses · ↑/↓ PgUp/PgDn to scroll"
            }
        };
        f.render_widget(hint(hint_text), chunks[0]);

        let title = match self.stage {
            Stage::Decomposition => " Compliance & Scored Map ",
            Stage::Responses => " Submission-Ready Pack ",
        };

        let mut lines: Vec<Line> = Vec::new();
        match self.result(view) {
            Some(result) => {
                if !result.missing_ids.is_empty() {
                    lines.push(
                        Line::from(format!("Not addressed: {}", result.missing_ids.join(", ")))
                            .style(Style::default().fg(Color::Yellow)),
                    );
                    lines.push(Line::from(""));
                }
                lines.extend(result.raw.lines().map(|l| Line::from(l.to_string())));
                lines.push(Line::from(""));
                lines.push(
                    Line::from(format!(
                        "{} · {}",
                        result.model,
                        result.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
                    ))
                    .style(Style::default().fg(Color::DarkGray)),
                );
            }
            None => lines.push(Line::from("Nothing here yet.").style(Style::default().fg(Color::DarkGray))),
        }

        let body = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(body, chunks[1]);
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        view: &View<'_>,
    ) -> Option<Action> {
        match code {
            KeyCode::Enter if self.available(view) => {
                self.scroll = 0;
                return Some(match self.stage {
                    Stage::Decomposition => Action::Decompose,
                    Stage::Responses => Action::Respond,
                });
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(20),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(20),
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
        None
    }
}
