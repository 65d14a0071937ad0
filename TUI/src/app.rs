use arboard::Clipboard;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::action::Intent;
use crate::command::{Command, CommandError, CommandParser};
use crate::config::{Config, COMMANDS};
use crate::conversation::ConversationStore;
use crate::model::{ChatSession, Mode};
use crate::responder::ResponseSimulator;
use crate::scheduler::{ReplyDue, ReplyScheduler};
use crate::store::{IgnoreReason, Outcome, StoreState};
use crate::ui_state::{Focus, UIState};

/// Starter prompts offered on the welcome screen.
pub fn suggestions(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Chat => &[
            "Explain quantum computing",
            "Help me write an email",
            "What's the meaning of life?",
        ],
        Mode::Image => &[
            "A futuristic city at night",
            "Abstract digital art",
            "A serene mountain landscape",
        ],
        Mode::Math => &[
            "Solve: 2x² + 5x - 3 = 0",
            "Integrate sin(x)cos(x)",
            "Explain Euler's identity",
        ],
        Mode::Code => &[
            "Build a React component",
            "Debug my Python code",
            "Explain Big O notation",
        ],
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("no chat to copy")]
    NoActiveChat,
    #[error("could not serialize chat: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),
}

pub struct App {
    pub store: ConversationStore<StdRng>,
    pub ui: UIState,
    pub config: Config,
    pub animation_frame: usize,
    pub animation_tick: u64,
    pub should_quit: bool,
}

impl App {
    /// Must be called inside a tokio runtime (replies run as tokio tasks).
    pub fn new(config: Config) -> Self {
        let initial = StoreState {
            current_mode: config.initial_mode,
            sidebar_open: config.start_sidebar_open,
            is_dark: config.start_dark,
            ..StoreState::default()
        };
        let (scheduler, due_rx) = ReplyScheduler::new(config.reply_delay());
        let store = ConversationStore::new(initial, ResponseSimulator::from_entropy(), scheduler, due_rx);

        Self {
            store,
            ui: UIState::new(),
            config,
            animation_frame: 0,
            animation_tick: 0,
            should_quit: false,
        }
    }

    pub fn state(&self) -> &StoreState {
        self.store.state()
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.store.active_session()
    }

    /// Welcome screen replaces the message list until the active chat has messages.
    pub fn showing_welcome(&self) -> bool {
        self.active_session().map_or(true, |s| s.messages.is_empty())
    }

    /// Check if command popup should be shown
    pub fn showing_command_popup(&self) -> bool {
        self.ui.input.starts_with('/') && !self.ui.input.contains(char::is_whitespace)
    }

    /// Get filtered commands based on current input
    pub fn get_filtered_commands(&self) -> Vec<(&'static str, &'static str)> {
        if !self.ui.input.starts_with('/') {
            return vec![];
        }
        let filter = &self.ui.input[1..];
        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd[1..].starts_with(filter))
            .copied()
            .collect()
    }

    /// Move selection up in command popup
    pub fn command_select_up(&mut self) {
        let filtered = self.get_filtered_commands();
        if filtered.is_empty() {
            return;
        }

        // Cycle: None -> last command -> ... -> 0 -> None
        self.ui.command_selection = match self.ui.command_selection {
            None => Some(filtered.len() - 1),
            Some(0) => None,
            Some(n) => Some(n - 1),
        };
    }

    /// Move selection down in command popup
    pub fn command_select_down(&mut self) {
        let filtered = self.get_filtered_commands();
        if filtered.is_empty() {
            return;
        }

        // Cycle: None -> 0 -> 1 -> ... -> last -> None
        self.ui.command_selection = match self.ui.command_selection {
            None => Some(0),
            Some(n) if n >= filtered.len() - 1 => None,
            Some(n) => Some(n + 1),
        };
    }

    /// Apply selected command to input
    pub fn apply_command_selection(&mut self) {
        if let Some(idx) = self.ui.command_selection {
            let filtered = self.get_filtered_commands();
            if let Some((cmd, _)) = filtered.get(idx) {
                self.ui.input = cmd.to_string();
            }
        }
        self.ui.command_selection = None;
    }

    /// Reset command selection when input changes
    pub fn reset_command_selection(&mut self) {
        self.ui.command_selection = None;
    }

    pub fn tick(&mut self) {
        self.animation_tick += 1;
        self.animation_frame = (self.animation_frame + 1) % self.config.animation_frame_mod;

        if self.animation_tick % self.config.status_timeout_ticks == 0 {
            self.ui.status_message = None;
        }

        // Replies that fired since the last frame
        self.store.drain_due();
        self.sync_view();
    }

    /// Follows store changes: jump to the newest message and track the active session.
    fn sync_view(&mut self) {
        let revision = self.store.revision();
        if revision == self.ui.seen_revision {
            return;
        }
        self.ui.seen_revision = revision;
        self.ui.scroll_offset = 0;

        let state = self.store.state();
        if let Some(idx) = state
            .active_session_id
            .and_then(|id| state.sessions.iter().position(|s| s.id == id))
        {
            self.ui.sidebar_cursor = idx;
        }
        if !state.sidebar_open && self.ui.focus == Focus::Sidebar {
            self.ui.focus = Focus::Input;
        }
    }

    /// Appends typed or pasted text, dropping carriage returns and honouring the length limit.
    pub fn push_input(&mut self, text: &str) {
        let room = self
            .config
            .input_max_chars
            .saturating_sub(self.ui.input.chars().count());
        let filtered: String = text.chars().filter(|c| *c != '\r').take(room).collect();
        self.ui.input.push_str(&filtered);
        self.reset_command_selection();
    }

    /// Alt+Enter (or Shift+Enter where the terminal reports it).
    pub fn insert_newline(&mut self) {
        self.push_input("\n");
    }

    pub fn submit_input(&mut self) {
        let text = self.ui.input.trim().to_string();
        if text.is_empty() {
            if self.showing_welcome() {
                self.send_suggestion();
            }
            return;
        }

        if text.starts_with('/') {
            self.handle_command(&text);
            return;
        }

        if !self.send_text(&text).is_ignored() {
            self.ui.input.clear();
        }
    }

    pub fn send_text(&mut self, text: &str) -> Outcome {
        let outcome = self.store.send_message(text);
        if outcome == Outcome::Ignored(IgnoreReason::ReplyPending) {
            self.ui.status_message = Some("NexusAI is still replying (/stop to cancel)".to_string());
        }
        self.sync_view();
        outcome
    }

    /// Sends the highlighted welcome-screen suggestion for the current mode.
    pub fn send_suggestion(&mut self) {
        let prompts = suggestions(self.state().current_mode);
        if let Some(prompt) = prompts.get(self.ui.suggestion_cursor.min(prompts.len() - 1)) {
            self.send_text(prompt);
        }
    }

    fn handle_command(&mut self, input: &str) {
        match CommandParser::parse(input, self.state().current_mode) {
            Ok(Command::Store(Intent::CancelReply)) => {
                if self.store.cancel_reply() == Outcome::Ignored(IgnoreReason::NothingToCancel) {
                    self.ui.status_message = Some("Nothing to cancel".to_string());
                }
            }
            Ok(Command::Store(intent)) => {
                self.store.dispatch(intent);
            }
            Ok(Command::Help) => self.ui.show_help = true,
            Ok(Command::CopyChat) => match self.copy_chat() {
                Ok(bytes) => {
                    info!(bytes, "chat copied to clipboard");
                    self.ui.status_message = Some("Chat copied to clipboard".to_string());
                }
                Err(e) => {
                    warn!(error = %e, "copy failed");
                    self.ui.status_message = Some(e.to_string());
                }
            },
            Ok(Command::Quit) => self.should_quit = true,
            Err(CommandError::NotACommand) => {}
            Err(e) => self.ui.status_message = Some(e.to_string()),
        }
        self.ui.input.clear();
        self.reset_command_selection();
        self.sync_view();
    }

    /// Serializes the active chat to JSON and places it on the clipboard.
    pub fn copy_chat(&self) -> Result<usize, CopyError> {
        let json = self.chat_json()?;
        let len = json.len();
        Clipboard::new()?.set_text(json)?;
        Ok(len)
    }

    pub fn chat_json(&self) -> Result<String, CopyError> {
        let session = self.active_session().ok_or(CopyError::NoActiveChat)?;
        Ok(serde_json::to_string_pretty(session)?)
    }

    pub fn resolve_reply(&mut self, due: ReplyDue) {
        self.store.resolve(due);
        self.sync_view();
    }

    pub fn new_chat(&mut self) {
        let mode = self.state().current_mode;
        self.store.create_session(mode);
        self.ui.focus = Focus::Input;
        self.sync_view();
    }

    pub fn cycle_mode(&mut self) {
        let next = self.state().current_mode.next();
        self.store.set_mode(next);
        self.ui.suggestion_cursor = 0;
    }

    pub fn toggle_sidebar(&mut self) {
        self.store.toggle_sidebar();
        self.sync_view();
    }

    pub fn toggle_dark_mode(&mut self) {
        self.store.toggle_dark_mode();
    }

    /// Shift+Tab: move arrow-key focus between the session list and the input.
    pub fn cycle_focus(&mut self) {
        let state = self.state();
        let sidebar_usable = state.sidebar_open && !state.sessions.is_empty();
        self.ui.focus = match self.ui.focus {
            Focus::Input if sidebar_usable => Focus::Sidebar,
            _ => Focus::Input,
        };
    }

    pub fn move_up(&mut self) {
        if self.showing_command_popup() {
            self.command_select_up();
        } else if self.ui.focus == Focus::Sidebar {
            self.ui.sidebar_cursor = self.ui.sidebar_cursor.saturating_sub(1);
        } else if self.showing_welcome() && self.ui.input.is_empty() {
            self.ui.suggestion_cursor = self.ui.suggestion_cursor.saturating_sub(1);
        } else {
            self.scroll_up();
        }
    }

    pub fn move_down(&mut self) {
        if self.showing_command_popup() {
            self.command_select_down();
        } else if self.ui.focus == Focus::Sidebar {
            let last = self.state().sessions.len().saturating_sub(1);
            self.ui.sidebar_cursor = (self.ui.sidebar_cursor + 1).min(last);
        } else if self.showing_welcome() && self.ui.input.is_empty() {
            let last = suggestions(self.state().current_mode).len() - 1;
            self.ui.suggestion_cursor = (self.ui.suggestion_cursor + 1).min(last);
        } else {
            self.scroll_down();
        }
    }

    /// Enter while the sidebar has focus.
    pub fn select_highlighted_session(&mut self) {
        let Some(id) = self.state().sessions.get(self.ui.sidebar_cursor).map(|s| s.id) else {
            return;
        };
        self.store.select_session(id);
        self.ui.focus = Focus::Input;
        self.sync_view();
    }

    /// Rough upper bound on rendered lines for the active chat.
    fn max_scroll(&self) -> usize {
        self.active_session().map_or(0, |s| {
            s.messages
                .iter()
                .map(|m| m.content.lines().count() + 4)
                .sum()
        })
    }

    pub fn scroll_up(&mut self) {
        self.ui.scroll_offset = (self.ui.scroll_offset + self.config.scroll_step).min(self.max_scroll());
    }

    pub fn scroll_down(&mut self) {
        self.ui.scroll_offset = self.ui.scroll_offset.saturating_sub(self.config.scroll_step);
    }

    pub fn shutdown(&mut self) {
        self.store.shutdown();
    }
}
