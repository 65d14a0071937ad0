#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Sidebar,
}

#[derive(Default)]
pub struct UIState {
    pub input: String,
    pub scroll_offset: usize,
    pub status_message: Option<String>,

    // Command popup state
    pub command_selection: Option<usize>,

    // Highlighted row in the session list
    pub sidebar_cursor: usize,

    // Highlighted suggestion on the welcome screen
    pub suggestion_cursor: usize,

    // Which panel receives arrow keys
    pub focus: Focus,

    pub show_help: bool,

    // Store revision last drawn, for auto-scroll
    pub seen_revision: u64,
}

impl UIState {
    pub fn new() -> Self {
        Self::default()
    }
}
