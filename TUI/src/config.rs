//! Application configuration and constants.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::model::Mode;

const DEFAULT_REPLY_DELAY_MS: u64 = 1800;

pub struct Config {
    /// Main loop tick rate in milliseconds (target 60 FPS = ~16ms)
    pub tick_rate_ms: u64,

    /// Delay before a canned reply replaces the typing placeholder
    pub reply_delay_ms: u64,

    /// How many ticks to show status messages (180 = ~3s at 60fps)
    pub status_timeout_ticks: u64,

    /// Modulo for animation frame counter
    pub animation_frame_mod: usize,

    /// Lines to scroll per key press
    pub scroll_step: usize,

    /// Width of the sidebar in characters
    pub sidebar_width: u16,

    /// Maximum characters accepted in the input box
    pub input_max_chars: usize,

    /// Mode selected at startup
    pub initial_mode: Mode,
    pub start_dark: bool,
    pub start_sidebar_open: bool,

    /// Where tracing output goes (the terminal belongs to the UI)
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_ms: 16,
            reply_delay_ms: DEFAULT_REPLY_DELAY_MS,
            status_timeout_ticks: 180,
            animation_frame_mod: 360,
            scroll_step: 3,
            sidebar_width: 30,
            input_max_chars: 4000,
            initial_mode: Mode::Chat,
            start_dark: true,
            start_sidebar_open: true,
            log_file: std::env::temp_dir().join("nexus-tui.log"),
        }
    }
}

/// Command line flags.
#[derive(Debug, Parser)]
#[command(name = "nexus")]
#[command(version)]
#[command(about = "NexusAI: multi-mode chat assistant for the terminal")]
#[command(long_about = None)]
pub struct Cli {
    /// Reply delay in milliseconds
    #[arg(long, value_name = "N", default_value_t = DEFAULT_REPLY_DELAY_MS)]
    pub delay_ms: u64,

    /// Initial mode: chat, image, math or code
    #[arg(long, value_name = "MODE", default_value_t = Mode::Chat)]
    pub mode: Mode,

    /// Start with the light theme
    #[arg(long)]
    pub light: bool,

    /// Start with the sidebar hidden
    #[arg(long)]
    pub no_sidebar: bool,

    /// Write logs to PATH (filter with RUST_LOG)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            reply_delay_ms: self.delay_ms,
            initial_mode: self.mode,
            start_dark: !self.light,
            start_sidebar_open: !self.no_sidebar,
            log_file: self.log_file.unwrap_or(defaults.log_file),
            ..defaults
        }
    }
}

impl Config {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

/// Slash commands shown in the popup
pub const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show keys and commands"),
    ("/new", "Start a new chat [mode]"),
    ("/mode", "Switch mode <chat|image|math|code>"),
    ("/stop", "Cancel the pending reply"),
    ("/sidebar", "Show or hide the sidebar"),
    ("/theme", "Toggle dark / light theme"),
    ("/copy", "Copy this chat as JSON"),
    ("/quit", "Exit NexusAI"),
];
