use crate::model::{Mode, SessionId};
use crate::store::CompletionKey;

/// State transitions understood by the conversation store.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Open an empty "New Chat" session and make it active
    CreateSession(Mode),
    /// Send user text to the active session (opening one if needed)
    SendMessage(String),
    /// Switch the active session
    SelectSession(SessionId),
    /// Change the mode used for new sessions and messages
    SetMode(Mode),
    ToggleSidebar,
    ToggleDarkMode,
    /// Abandon the pending reply of the active session
    CancelReply,
    /// Deliver the reply for a scheduled completion
    CompleteReply { key: CompletionKey, content: String },
}

impl Intent {
    /// Short name for log lines; never includes message text.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::CreateSession(_) => "create_session",
            Intent::SendMessage(_) => "send_message",
            Intent::SelectSession(_) => "select_session",
            Intent::SetMode(_) => "set_mode",
            Intent::ToggleSidebar => "toggle_sidebar",
            Intent::ToggleDarkMode => "toggle_dark_mode",
            Intent::CancelReply => "cancel_reply",
            Intent::CompleteReply { .. } => "complete_reply",
        }
    }
}
