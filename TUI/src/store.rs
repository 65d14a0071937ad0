//! Conversation state and its transition function.
//!
//! [`StoreState::apply`] never mutates the receiver: it returns the next state
//! together with an [`Outcome`] telling the owner what happened, including any
//! reply that now has to be scheduled.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::action::Intent;
use crate::model::{
    derive_title, ChatSession, Message, MessageId, Mode, SessionId, DEFAULT_TITLE,
    FIRST_MESSAGE_TITLE_CHARS, NEW_SESSION_TITLE_CHARS,
};

/// Identifies one deferred completion: the session and the placeholder it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompletionKey {
    pub session_id: SessionId,
    pub placeholder_id: MessageId,
}

/// A reply the owner must schedule after a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReply {
    pub key: CompletionKey,
    /// Mode in effect when the message was sent
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyMessage,
    UnknownSession,
    ReplyPending,
    StaleCompletion,
    NothingToCancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    AwaitingReply(PendingReply),
    ReplyDelivered(CompletionKey),
    ReplyCancelled(CompletionKey),
    Ignored(IgnoreReason),
}

impl Outcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored(_))
    }
}

pub struct Transition {
    pub state: StoreState,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreState {
    /// Newest first
    pub sessions: Vec<ChatSession>,
    pub active_session_id: Option<SessionId>,
    pub current_mode: Mode,
    pub sidebar_open: bool,
    pub is_dark: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            active_session_id: None,
            current_mode: Mode::Chat,
            sidebar_open: true,
            is_dark: true,
        }
    }
}

impl StoreState {
    pub fn session(&self, id: SessionId) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.active_session_id.and_then(|id| self.session(id))
    }

    /// Computes the state that follows `intent` at time `now`.
    pub fn apply(&self, intent: Intent, now: DateTime<Utc>) -> Transition {
        let mut state = self.clone();
        let outcome = state.reduce(intent, now);
        Transition { state, outcome }
    }

    fn session_mut(&mut self, id: SessionId) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    fn reduce(&mut self, intent: Intent, now: DateTime<Utc>) -> Outcome {
        match intent {
            Intent::CreateSession(mode) => {
                self.open_session(DEFAULT_TITLE.to_string(), mode, now);
                Outcome::Applied
            }
            Intent::SendMessage(text) => self.send_message(&text, now),
            Intent::SelectSession(id) => {
                if self.session(id).is_none() {
                    return Outcome::Ignored(IgnoreReason::UnknownSession);
                }
                self.active_session_id = Some(id);
                Outcome::Applied
            }
            Intent::SetMode(mode) => {
                self.current_mode = mode;
                Outcome::Applied
            }
            Intent::ToggleSidebar => {
                self.sidebar_open = !self.sidebar_open;
                Outcome::Applied
            }
            Intent::ToggleDarkMode => {
                self.is_dark = !self.is_dark;
                Outcome::Applied
            }
            Intent::CancelReply => self.cancel_reply(),
            Intent::CompleteReply { key, content } => self.complete_reply(key, &content, now),
        }
    }

    fn open_session(&mut self, title: String, mode: Mode, now: DateTime<Utc>) -> SessionId {
        let session = ChatSession::new(title, mode, now);
        let id = session.id;
        self.sessions.insert(0, session);
        self.active_session_id = Some(id);
        id
    }

    fn send_message(&mut self, text: &str, now: DateTime<Utc>) -> Outcome {
        if text.trim().is_empty() {
            return Outcome::Ignored(IgnoreReason::EmptyMessage);
        }
        if self.active_session().is_some_and(ChatSession::is_awaiting_reply) {
            return Outcome::Ignored(IgnoreReason::ReplyPending);
        }

        let mode = self.current_mode;
        let session_id = match self.active_session().map(|s| s.id) {
            Some(id) => id,
            None => self.open_session(derive_title(text, NEW_SESSION_TITLE_CHARS), mode, now),
        };
        let Some(session) = self.session_mut(session_id) else {
            return Outcome::Ignored(IgnoreReason::UnknownSession);
        };

        if session.messages.is_empty() {
            session.title = derive_title(text, FIRST_MESSAGE_TITLE_CHARS);
        }

        let placeholder = Message::placeholder(mode, now);
        let key = CompletionKey {
            session_id,
            placeholder_id: placeholder.id,
        };
        session.messages.push(Message::user(text, mode, now));
        session.messages.push(placeholder);

        Outcome::AwaitingReply(PendingReply { key, mode })
    }

    fn cancel_reply(&mut self) -> Outcome {
        let Some(session_id) = self.active_session().map(|s| s.id) else {
            return Outcome::Ignored(IgnoreReason::NothingToCancel);
        };
        let Some(session) = self.session_mut(session_id) else {
            return Outcome::Ignored(IgnoreReason::NothingToCancel);
        };
        let Some(idx) = session.messages.iter().position(|m| m.is_typing) else {
            return Outcome::Ignored(IgnoreReason::NothingToCancel);
        };

        let placeholder = session.messages.remove(idx);
        Outcome::ReplyCancelled(CompletionKey {
            session_id,
            placeholder_id: placeholder.id,
        })
    }

    fn complete_reply(&mut self, key: CompletionKey, content: &str, now: DateTime<Utc>) -> Outcome {
        let Some(session) = self.session_mut(key.session_id) else {
            return Outcome::Ignored(IgnoreReason::StaleCompletion);
        };
        let Some(idx) = session
            .messages
            .iter()
            .position(|m| m.is_typing && m.id == key.placeholder_id)
        else {
            return Outcome::Ignored(IgnoreReason::StaleCompletion);
        };

        let placeholder = session.messages.remove(idx);
        session
            .messages
            .push(Message::assistant(content, placeholder.mode, now));
        Outcome::ReplyDelivered(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn step(state: &StoreState, intent: Intent) -> (StoreState, Outcome) {
        let t = state.apply(intent, now());
        (t.state, t.outcome)
    }

    fn send(state: &StoreState, text: &str) -> (StoreState, PendingReply) {
        let (next, outcome) = step(state, Intent::SendMessage(text.to_string()));
        match outcome {
            Outcome::AwaitingReply(pending) => (next, pending),
            other => panic!("expected a pending reply, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let state = StoreState::default();
        assert!(state.sessions.is_empty());
        assert_eq!(state.active_session_id, None);
        assert_eq!(state.current_mode, Mode::Chat);
        assert!(state.sidebar_open);
        assert!(state.is_dark);
    }

    #[test]
    fn test_create_session_goes_to_front_and_becomes_active() {
        let (state, _) = step(&StoreState::default(), Intent::CreateSession(Mode::Chat));
        let (state, outcome) = step(&state, Intent::CreateSession(Mode::Math));

        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(state.sessions.len(), 2);
        let front = &state.sessions[0];
        assert_eq!(front.title, "New Chat");
        assert_eq!(front.mode, Mode::Math);
        assert!(front.messages.is_empty());
        assert_eq!(state.active_session_id, Some(front.id));
    }

    #[test]
    fn test_apply_leaves_receiver_untouched() {
        let state = StoreState::default();
        let _ = state.apply(Intent::SendMessage("hello".into()), now());
        assert_eq!(state, StoreState::default());
    }

    #[test]
    fn test_send_appends_user_message_and_placeholder() {
        let (state, pending) = send(&StoreState::default(), "hello there");
        let session = state.active_session().unwrap();

        assert_eq!(session.messages.len(), 2);
        let user = &session.messages[0];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello there");
        assert!(!user.is_typing);

        let placeholder = &session.messages[1];
        assert_eq!(placeholder.role, Role::Assistant);
        assert!(placeholder.is_typing);
        assert!(placeholder.content.is_empty());

        assert_eq!(pending.key.session_id, session.id);
        assert_eq!(pending.key.placeholder_id, placeholder.id);
        assert_eq!(pending.mode, Mode::Chat);
    }

    #[test]
    fn test_send_blank_text_is_noop() {
        let (state, _) = step(&StoreState::default(), Intent::CreateSession(Mode::Chat));
        for text in ["", "   ", "\n\t "] {
            let (next, outcome) = step(&state, Intent::SendMessage(text.into()));
            assert_eq!(outcome, Outcome::Ignored(IgnoreReason::EmptyMessage));
            assert_eq!(next, state);
        }
    }

    #[test]
    fn test_first_send_without_session_creates_one_in_current_mode() {
        let (state, _) = step(&StoreState::default(), Intent::SetMode(Mode::Code));
        let (state, pending) = send(&state, "Build a React component");

        assert_eq!(state.sessions.len(), 1);
        let session = &state.sessions[0];
        assert_eq!(state.active_session_id, Some(session.id));
        assert_eq!(session.mode, Mode::Code);
        assert_eq!(session.title, "Build a React component");
        assert_eq!(pending.mode, Mode::Code);
    }

    #[test]
    fn test_first_message_title_rules() {
        let (state, _) = send(&StoreState::default(), "Explain quantum computing");
        assert_eq!(state.sessions[0].title, "Explain quantum computing");

        let long = "x".repeat(50);
        let (state, _) = send(&StoreState::default(), &long);
        assert_eq!(state.sessions[0].title, format!("{}...", "x".repeat(35)));

        let (state, _) = step(&StoreState::default(), Intent::CreateSession(Mode::Chat));
        let (state, _) = send(&state, "Help me write an email");
        assert_eq!(state.sessions[0].title, "Help me write an email");
    }

    #[test]
    fn test_later_messages_keep_title() {
        let (state, pending) = send(&StoreState::default(), "first question");
        let (state, _) = step(
            &state,
            Intent::CompleteReply {
                key: pending.key,
                content: "answer".into(),
            },
        );
        let (state, _) = send(&state, "a completely different second question");
        assert_eq!(state.sessions[0].title, "first question");
        assert_eq!(state.sessions[0].messages.len(), 4);
    }

    #[test]
    fn test_complete_replaces_placeholder() {
        let (state, pending) = send(&StoreState::default(), "hi");
        let later = now() + Duration::milliseconds(1800);
        let t = state.apply(
            Intent::CompleteReply {
                key: pending.key,
                content: "canned".into(),
            },
            later,
        );

        assert_eq!(t.outcome, Outcome::ReplyDelivered(pending.key));
        let session = t.state.active_session().unwrap();
        assert_eq!(session.messages.len(), 2);
        assert!(session.messages.iter().all(|m| !m.is_typing));
        let reply = &session.messages[1];
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "canned");
        assert_eq!(reply.timestamp, later);
        assert_ne!(reply.id, pending.key.placeholder_id);
    }

    #[test]
    fn test_reply_uses_mode_at_send_time() {
        let (state, pending) = send(&StoreState::default(), "integrate this");
        let (state, _) = step(&state, Intent::SetMode(Mode::Math));
        let (state, _) = step(
            &state,
            Intent::CompleteReply {
                key: pending.key,
                content: "ok".into(),
            },
        );
        let session = state.active_session().unwrap();
        assert_eq!(session.messages[1].mode, Mode::Chat);
    }

    #[test]
    fn test_send_while_pending_is_ignored() {
        let (state, _) = send(&StoreState::default(), "one");
        let (next, outcome) = step(&state, Intent::SendMessage("two".into()));
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::ReplyPending));
        assert_eq!(next, state);
    }

    #[test]
    fn test_pending_reply_in_other_session_does_not_block() {
        let (state, first) = send(&StoreState::default(), "one");
        let (state, _) = step(&state, Intent::CreateSession(Mode::Chat));
        let (state, second) = send(&state, "two");
        assert_ne!(first.key.session_id, second.key.session_id);
        assert!(state.sessions.iter().all(|s| s.is_awaiting_reply()));
    }

    #[test]
    fn test_completion_for_unknown_placeholder_is_stale() {
        let (state, pending) = send(&StoreState::default(), "hi");
        let bogus = CompletionKey {
            session_id: pending.key.session_id,
            placeholder_id: MessageId::generate(),
        };
        let (next, outcome) = step(
            &state,
            Intent::CompleteReply {
                key: bogus,
                content: "x".into(),
            },
        );
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::StaleCompletion));
        assert_eq!(next, state);

        let missing_session = CompletionKey {
            session_id: SessionId::generate(),
            placeholder_id: pending.key.placeholder_id,
        };
        let (_, outcome) = step(
            &state,
            Intent::CompleteReply {
                key: missing_session,
                content: "x".into(),
            },
        );
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::StaleCompletion));
    }

    #[test]
    fn test_completion_after_cancel_is_stale() {
        let (state, pending) = send(&StoreState::default(), "hi");
        let (state, outcome) = step(&state, Intent::CancelReply);
        assert_eq!(outcome, Outcome::ReplyCancelled(pending.key));
        assert_eq!(state.active_session().unwrap().messages.len(), 1);

        let (_, outcome) = step(
            &state,
            Intent::CompleteReply {
                key: pending.key,
                content: "late".into(),
            },
        );
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::StaleCompletion));
    }

    #[test]
    fn test_cancel_without_pending_reply() {
        let (_, outcome) = step(&StoreState::default(), Intent::CancelReply);
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NothingToCancel));
    }

    #[test]
    fn test_select_session_validates_id() {
        let (state, _) = step(&StoreState::default(), Intent::CreateSession(Mode::Chat));
        let first = state.sessions[0].id;
        let (state, _) = step(&state, Intent::CreateSession(Mode::Image));

        let (state, outcome) = step(&state, Intent::SelectSession(first));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(state.active_session_id, Some(first));

        let (next, outcome) = step(&state, Intent::SelectSession(SessionId::generate()));
        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::UnknownSession));
        assert_eq!(next.active_session_id, Some(first));
    }

    #[test]
    fn test_set_mode_never_touches_sessions() {
        let (state, _) = step(&StoreState::default(), Intent::CreateSession(Mode::Image));
        let (state, _) = send(&state, "a futuristic city at night");
        let (next, _) = step(&state, Intent::SetMode(Mode::Code));

        assert_eq!(next.current_mode, Mode::Code);
        assert_eq!(next.sessions, state.sessions);
        assert_eq!(next.sessions[0].mode, Mode::Image);
    }

    #[test]
    fn test_toggles_flip() {
        let (state, _) = step(&StoreState::default(), Intent::ToggleSidebar);
        let (state, _) = step(&state, Intent::ToggleDarkMode);
        assert!(!state.sidebar_open);
        assert!(!state.is_dark);
        let (state, _) = step(&state, Intent::ToggleSidebar);
        assert!(state.sidebar_open);
    }

    #[test]
    fn test_at_most_one_placeholder_per_session() {
        let mut state = StoreState::default();
        for text in ["a", "b", "c"] {
            let (next, _) = step(&state, Intent::SendMessage(text.into()));
            state = next;
        }
        let typing = state.sessions[0]
            .messages
            .iter()
            .filter(|m| m.is_typing)
            .count();
        assert_eq!(typing, 1);
    }
}
