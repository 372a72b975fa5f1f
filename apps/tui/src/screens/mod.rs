//! TUI screen definitions.
//!
//! Each screen corresponds to a tab. Screens own their input state and
//! return an [`Action`] when the user asks for work; the app performs it
//! against the session.

mod export;
mod results;
mod vault;

use std::fmt;
use std::path::PathBuf;

use bidflow_core::Session;
use bidflow_shared::Profile;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;

use results::Stage;

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Vault,
    Decompose,
    Respond,
    Export,
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vault => write!(f, "Vault"),
            Self::Decompose => write!(f, "Phase 1: Decompose"),
            Self::Respond => write!(f, "Phase 2: Respond"),
            Self::Export => write!(f, "Export"),
        }
    }
}

/// Work requested by a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    SyncVault(Vec<PathBuf>),
    Decompose,
    Respond,
    Export(PathBuf),
}

impl Action {
    /// Status shown while the action blocks the UI.
    pub(crate) fn busy_message(&self) -> &'static str {
        match self {
            Self::SyncVault(_) => "Synchronizing project vault...",
            Self::Decompose => "Performing phase 1: tender decomposition and compliance audit...",
            Self::Respond => "Architecting weighted responses...",
            Self::Export(_) => "Exporting submission pack...",
        }
    }
}

/// Read-only data screens draw from.
pub(crate) struct View<'a> {
    pub session: Option<&'a Session>,
    pub profile: &'a Profile,
    pub export_file: &'a str,
}

/// Per-screen state and behaviour.
pub(crate) enum Screen {
    Vault(vault::VaultScreen),
    Results(results::ResultsScreen),
    Export(export::ExportScreen),
}

impl Screen {
    pub(crate) fn new(id: ScreenId) -> Self {
        match id {
            ScreenId::Vault => Self::Vault(vault::VaultScreen::new()),
            ScreenId::Decompose => Self::Results(results::ResultsScreen::new(Stage::Decomposition)),
            ScreenId::Respond => Self::Results(results::ResultsScreen::new(Stage::Responses)),
            ScreenId::Export => Self::Export(export::ExportScreen::new()),
        }
    }

    /// Whether the current screen has an active text input field.
    pub(crate) fn is_editing(&self) -> bool {
        match self {
            Self::Vault(s) => s.is_editing(),
            Self::Export(s) => s.is_editing(),
            Self::Results(_) => false,
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, view: &View<'_>) {
        match self {
            Self::Vault(s) => s.draw(f, area, view),
            Self::Results(s) => s.draw(f, area, view),
            Self::Export(s) => s.draw(f, area, view),
        }
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        view: &View<'_>,
    ) -> Option<Action> {
        match self {
            Self::Vault(s) => s.handle_key(code, modifiers),
            Self::Results(s) => s.handle_key(code, modifiers, view),
            Self::Export(s) => s.handle_key(code, modifiers, view),
        }
    }
}
