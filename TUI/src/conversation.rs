//! Single-writer owner of the conversation state.
//!
//! Every change goes through [`ConversationStore::dispatch`], which runs the
//! pure transition, swaps in the new snapshot and performs the side effects
//! (scheduling or cancelling reply timers). Fired timers come back through
//! [`ConversationStore::next_due`] and are applied by
//! [`ConversationStore::resolve`] on the same task, so writes never interleave.

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::action::Intent;
use crate::model::{ChatSession, Mode, SessionId};
use crate::responder::{IndexSource, ResponseSimulator};
use crate::scheduler::{ReplyDue, ReplyScheduler};
use crate::store::{IgnoreReason, Outcome, StoreState};

pub struct ConversationStore<S> {
    state: StoreState,
    revision: u64,
    simulator: ResponseSimulator<S>,
    scheduler: ReplyScheduler,
    due_rx: UnboundedReceiver<ReplyDue>,
}

impl<S: IndexSource> ConversationStore<S> {
    pub fn new(
        initial: StoreState,
        simulator: ResponseSimulator<S>,
        scheduler: ReplyScheduler,
        due_rx: UnboundedReceiver<ReplyDue>,
    ) -> Self {
        debug!(delay_ms = scheduler.delay().as_millis() as u64, "conversation store ready");
        Self {
            state: initial,
            revision: 0,
            simulator,
            scheduler,
            due_rx,
        }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.state.active_session()
    }

    /// Bumped on every applied transition; lets the view detect changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pending_replies(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn dispatch(&mut self, intent: Intent) -> Outcome {
        let name = intent.name();
        let transition = self.state.apply(intent, Utc::now());

        match &transition.outcome {
            Outcome::Ignored(reason) => {
                debug!(intent = name, ?reason, "intent ignored");
                return transition.outcome;
            }
            Outcome::AwaitingReply(pending) => {
                self.scheduler.schedule(*pending);
            }
            Outcome::ReplyCancelled(key) => {
                self.scheduler.cancel(key);
            }
            Outcome::Applied | Outcome::ReplyDelivered(_) => {}
        }

        let created = transition.state.sessions.len() > self.state.sessions.len();
        self.state = transition.state;
        self.revision += 1;

        if created {
            if let Some(session) = self.state.sessions.first() {
                info!(session = %session.id, mode = %session.mode, "session created");
            }
        }
        debug!(intent = name, revision = self.revision, "intent applied");
        transition.outcome
    }

    /// Waits for the next reply timer to fire.
    pub async fn next_due(&mut self) -> Option<ReplyDue> {
        self.due_rx.recv().await
    }

    /// Applies a fired reply: picks a canned response and swaps it in for the placeholder.
    pub fn resolve(&mut self, due: ReplyDue) -> Outcome {
        if !self.scheduler.complete(&due.key) {
            debug!(session = %due.key.session_id, "dropping reply for cancelled completion");
            return Outcome::Ignored(IgnoreReason::StaleCompletion);
        }

        let content = self.simulator.generate(due.mode).to_string();
        let outcome = self.dispatch(Intent::CompleteReply {
            key: due.key,
            content,
        });
        match &outcome {
            Outcome::ReplyDelivered(key) => {
                info!(session = %key.session_id, mode = %due.mode, "reply delivered");
            }
            other => {
                warn!(session = %due.key.session_id, outcome = ?other, "reply could not be delivered");
            }
        }
        outcome
    }

    /// Applies every reply that has already fired without waiting.
    pub fn drain_due(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(due) = self.due_rx.try_recv() {
            if matches!(self.resolve(due), Outcome::ReplyDelivered(_)) {
                applied += 1;
            }
        }
        applied
    }

    pub fn shutdown(&mut self) {
        let pending = self.scheduler.pending();
        self.scheduler.cancel_all();
        if pending > 0 {
            info!(pending, "cancelled outstanding replies on shutdown");
        }
    }

    pub fn create_session(&mut self, mode: Mode) -> Outcome {
        self.dispatch(Intent::CreateSession(mode))
    }

    pub fn send_message(&mut self, text: &str) -> Outcome {
        self.dispatch(Intent::SendMessage(text.to_string()))
    }

    pub fn select_session(&mut self, id: SessionId) -> Outcome {
        self.dispatch(Intent::SelectSession(id))
    }

    pub fn set_mode(&mut self, mode: Mode) -> Outcome {
        self.dispatch(Intent::SetMode(mode))
    }

    pub fn toggle_sidebar(&mut self) -> Outcome {
        self.dispatch(Intent::ToggleSidebar)
    }

    pub fn toggle_dark_mode(&mut self) -> Outcome {
        self.dispatch(Intent::ToggleDarkMode)
    }

    pub fn cancel_reply(&mut self) -> Outcome {
        self.dispatch(Intent::CancelReply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::responder::canned_responses;
    use crate::responder::tests::Scripted;
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(1800);

    fn store(picks: &[usize]) -> ConversationStore<Scripted> {
        let (scheduler, rx) = ReplyScheduler::new(DELAY);
        ConversationStore::new(
            StoreState::default(),
            ResponseSimulator::new(Scripted::new(picks)),
            scheduler,
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_reply_after_delay() {
        let mut store = store(&[1]);
        let start = tokio::time::Instant::now();
        assert!(matches!(store.send_message("hello"), Outcome::AwaitingReply(_)));

        let session = store.active_session().unwrap();
        assert_eq!(session.messages.len(), 2);
        assert!(session.messages[1].is_typing);
        assert_eq!(store.pending_replies(), 1);

        let due = store.next_due().await.unwrap();
        assert!(start.elapsed() >= DELAY);
        assert!(matches!(store.resolve(due), Outcome::ReplyDelivered(_)));

        let session = store.active_session().unwrap();
        assert_eq!(session.messages.len(), 2);
        assert!(session.messages.iter().all(|m| !m.is_typing));
        let reply = &session.messages[1];
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, canned_responses(Mode::Chat)[1]);
        assert_eq!(store.pending_replies(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_drawn_from_mode_at_send_time() {
        let mut store = store(&[0]);
        store.set_mode(Mode::Code);
        store.send_message("Debug my Python code");
        store.set_mode(Mode::Image);

        let due = store.next_due().await.unwrap();
        store.resolve(due);

        let reply = &store.active_session().unwrap().messages[1];
        assert_eq!(reply.mode, Mode::Code);
        assert_eq!(reply.content, canned_responses(Mode::Code)[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholder_still_present_before_delay() {
        let mut store = store(&[]);
        store.send_message("hi");

        let early = tokio::time::timeout(DELAY - Duration::from_millis(1), store.next_due()).await;
        assert!(early.is_err());
        assert_eq!(store.drain_due(), 0);
        assert!(store.active_session().unwrap().is_awaiting_reply());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reply_drops_late_completion() {
        let mut store = store(&[]);
        let Outcome::AwaitingReply(pending) = store.send_message("hi") else {
            panic!("send should schedule a reply");
        };
        assert_eq!(store.cancel_reply(), Outcome::ReplyCancelled(pending.key));
        assert_eq!(store.pending_replies(), 0);

        let late = ReplyDue {
            key: pending.key,
            mode: pending.mode,
        };
        let revision = store.revision();
        assert_eq!(store.resolve(late), Outcome::Ignored(IgnoreReason::StaleCompletion));
        assert_eq!(store.revision(), revision);

        let session = store.active_session().unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::User);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_due_applies_fired_replies() {
        let mut store = store(&[]);
        store.send_message("one");
        store.create_session(Mode::Math);
        store.send_message("two");

        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(store.drain_due(), 2);
        assert!(store.state().sessions.iter().all(|s| !s.is_awaiting_reply()));
    }

    #[tokio::test]
    async fn test_ignored_intent_does_not_bump_revision() {
        let mut store = store(&[]);
        store.create_session(Mode::Chat);
        let revision = store.revision();
        let before = store.state().clone();

        assert!(store.send_message("   ").is_ignored());
        assert!(store.select_session(SessionId::generate()).is_ignored());
        assert_eq!(store.revision(), revision);
        assert_eq!(store.state(), &before);
    }

    #[tokio::test]
    async fn test_ui_toggles_and_selection() {
        let mut store = store(&[]);
        store.create_session(Mode::Chat);
        let first = store.state().sessions[0].id;
        store.create_session(Mode::Math);

        store.select_session(first);
        store.toggle_sidebar();
        store.toggle_dark_mode();

        let state = store.state();
        assert_eq!(state.active_session_id, Some(first));
        assert!(!state.sidebar_open);
        assert!(!state.is_dark);
        store.shutdown();
    }
}
