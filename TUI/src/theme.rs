//! Dark and light colour palettes.

use ratatui::style::Color;

use crate::model::Mode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub bg: Color,
    pub panel: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub muted: Color,
    pub border: Color,
    pub border_accent: Color,
    pub primary: Color,
    pub user_bubble: Color,
    pub highlight_bg: Color,
    pub code_bg: Color,
    pub code_fg: Color,
    pub warning: Color,
}

// Deep night palette
pub const DARK: Palette = Palette {
    bg: Color::Rgb(12, 12, 16),
    panel: Color::Rgb(18, 18, 24),
    text: Color::Rgb(240, 240, 245),
    text_secondary: Color::Rgb(180, 180, 190),
    muted: Color::Rgb(105, 116, 133),
    border: Color::Rgb(45, 50, 60),
    border_accent: Color::Rgb(70, 85, 110),
    primary: Color::Rgb(101, 150, 243),
    user_bubble: Color::Rgb(84, 112, 156),
    highlight_bg: Color::Rgb(32, 36, 48),
    code_bg: Color::Rgb(40, 44, 52),
    code_fg: Color::Rgb(171, 178, 191),
    warning: Color::Rgb(204, 92, 68),
};

// Paper palette
pub const LIGHT: Palette = Palette {
    bg: Color::Rgb(248, 248, 250),
    panel: Color::Rgb(238, 239, 243),
    text: Color::Rgb(24, 26, 32),
    text_secondary: Color::Rgb(70, 74, 84),
    muted: Color::Rgb(120, 126, 138),
    border: Color::Rgb(210, 213, 220),
    border_accent: Color::Rgb(160, 170, 190),
    primary: Color::Rgb(52, 100, 210),
    user_bubble: Color::Rgb(52, 100, 210),
    highlight_bg: Color::Rgb(222, 228, 242),
    code_bg: Color::Rgb(232, 234, 238),
    code_fg: Color::Rgb(40, 44, 52),
    warning: Color::Rgb(186, 64, 42),
};

pub fn palette(is_dark: bool) -> &'static Palette {
    if is_dark {
        &DARK
    } else {
        &LIGHT
    }
}

/// Accent colour for a mode (tabs, badges, sidebar glyphs).
pub fn mode_color(mode: Mode) -> Color {
    match mode {
        Mode::Chat => Color::Rgb(101, 150, 243),
        Mode::Image => Color::Rgb(211, 164, 234),
        Mode::Math => Color::Rgb(234, 208, 148),
        Mode::Code => Color::Rgb(131, 179, 102),
    }
}
