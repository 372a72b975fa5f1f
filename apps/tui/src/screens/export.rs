//! "Export" screen: write the submission pack to disk.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::{Action, View};
use crate::widgets::{hint, text_input};

pub(crate) struct ExportScreen {
    dir: String,
    editing: bool,
}

impl ExportScreen {
    pub(crate) fn new() -> Self {
        Self {
            dir: ".".to_string(),
            editing: false,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    fn ready(view: &View<'_>) -> bool {
        view.session.and_then(|s| s.responses()).is_some()
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, view: &View<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Directory
                Constraint::Length(1), // Hint
                Constraint::Min(1),    // Summary
            ])
            .split(area);

        f.render_widget(text_input("Output directory", &self.dir, self.editing), chunks[0]);

        let hint_text = if self.editing {
            "Type a directory · Esc to stop editing"
        } else if Self::ready(view) {
            "e to edit the directory · Enter to download the global bid pack"
        } else {
            "Generate responses in phase 2 before exporting."
        };
        f.render_widget(hint(hint_text), chunks[1]);

        let summary = match view.session.and_then(|s| s.responses()) {
            Some(result) => vec![
                Line::from(format!("File:      {}", view.export_file)),
                Line::from(format!("Size:      {} characters", result.raw.chars().count())),
                Line::from(format!("Model:     {}", result.model)),
                Line::from(format!(
                    "Generated: {}",
                    result.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
                )),
            ],
            None => vec![Line::from(format!("File:      {}", view.export_file))],
        };
        let block = Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title(" Submission "));
        f.render_widget(block, chunks[2]);
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        view: &View<'_>,
    ) -> Option<Action> {
        if self.editing {
            match code {
                KeyCode::Esc | KeyCode::Enter => self.editing = false,
                KeyCode::Backspace => {
                    self.dir.pop();
                }
                KeyCode::Char(c) => self.dir.push(c),
                _ => {}
            }
            return None;
        }

        match code {
            KeyCode::Char('e') => self.editing = true,
            KeyCode::Enter if Self::ready(view) => {
                let dir = if self.dir.trim().is_empty() { "." } else { self.dir.trim() };
                return Some(Action::Export(PathBuf::from(dir)));
            }
            _ => {}
        }
        None
    }
}
