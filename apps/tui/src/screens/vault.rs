//! "Vault" screen: tender PDF paths, synchronized documents, business profile.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use super::{Action, View};
use crate::widgets::{hint, text_input};

pub(crate) struct VaultScreen {
    input: String,
    editing: bool,
    show_profile: bool,
}

impl VaultScreen {
    pub(crate) fn new() -> Self {
        Self {
            input: String::new(),
            editing: false,
            show_profile: false,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, view: &View<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Paths
                Constraint::Length(1), // Hint
                Constraint::Min(1),    // Vault / profile
            ])
            .split(area);

        f.render_widget(
            text_input("Tender pack PDFs (comma-separated paths)", &self.input, self.editing),
            chunks[0],
        );

        let hint_text = if self.editing {
            "Type paths · Enter to synchronize · Esc to stop editing"
        } else {
            "Enter to edit paths · p to toggle the business identity"
        };
        f.render_widget(hint(hint_text), chunks[1]);

        let body = if self.show_profile {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[2])
        } else {
            Layout::default()
                .constraints([Constraint::Percentage(100)])
                .split(chunks[2])
        };

        let vault = view.session.and_then(|s| s.vault());
        let items: Vec<ListItem> = match vault {
            Some(vault) => {
                let mut items: Vec<ListItem> = vault
                    .documents()
                    .iter()
                    .map(|name| ListItem::new(format!("  {name}")))
                    .collect();
                items.push(ListItem::new(""));
                items.push(
                    ListItem::new(format!(
                        "  {} characters · fingerprint {}",
                        vault.char_len(),
                        &vault.fingerprint()[..12]
                    ))
                    .style(Style::default().fg(Color::DarkGray)),
                );
                items
            }
            None => vec![ListItem::new("  No documents yet.").style(Style::default().fg(Color::DarkGray))],
        };
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Project Vault "));
        f.render_widget(list, body[0]);

        if self.show_profile {
            let title = if view.profile.is_fallback() {
                " Business Identity (built-in) "
            } else {
                " Business Identity "
            };
            let profile = Paragraph::new(view.profile.text.as_str())
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(profile, body[1]);
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Option<Action> {
        if self.editing {
            match code {
                KeyCode::Esc => self.editing = false,
                KeyCode::Enter => {
                    let paths = parse_paths(&self.input);
                    if !paths.is_empty() {
                        self.editing = false;
                        return Some(Action::SyncVault(paths));
                    }
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            }
            return None;
        }

        match code {
            KeyCode::Enter | KeyCode::Char('e') => self.editing = true,
            KeyCode::Char('p') => self.show_profile = !self.show_profile,
            _ => {}
        }
        None
    }
}

fn parse_paths(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}
