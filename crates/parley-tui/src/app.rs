//! Application state and update logic for the parley TUI.
//!
//! The app is the only writer to the [`ConversationStore`]. A reply request
//! runs elsewhere; its outcome comes back through [`App::complete_reply`].

use std::time::{Duration, Instant};

use parley_engine::{
    record_outcome, Config, ConversationStore, KeyValueStore, Reaction, ReplyError,
    TypingScheduler,
};
use tracing::debug;

use crate::event::Action;
use crate::theme::Theme;
use crate::widgets::{Reveal, StatusBarContent, TextInputState, TranscriptState};

const HINTS: &str = "^K new  ^D delete  ^P/^N switch  ^Y/^X react  ^B sidebar  Esc quit";

/// Store type the TUI runs on.
pub type Store = ConversationStore<Box<dyn KeyValueStore>>;

/// A user message handed off for a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub conversation_id: String,
    pub text: String,
}

/// The reply currently being revealed.
#[derive(Debug)]
struct ActiveReveal {
    conversation_id: String,
    message_id: String,
    scheduler: TypingScheduler,
}

/// Application state.
pub struct App {
    pub store: Store,
    pub theme: Theme,
    pub input: TextInputState,
    pub transcript: TranscriptState,
    pub show_sidebar: bool,
    pub should_quit: bool,
    typing_interval: Duration,
    reveal: Option<ActiveReveal>,
    /// Conversation waiting on the reply in flight.
    pending: Option<String>,
}

impl App {
    /// Build the app over an initialized store.
    ///
    /// Messages still flagged as typing from an earlier session have no live
    /// reveal, so they are finished up front and shown in full.
    pub fn new(store: Store, config: &Config) -> Self {
        let mut app = Self {
            store,
            theme: Theme::from_choice(config.theme),
            input: TextInputState::new(),
            transcript: TranscriptState::default(),
            show_sidebar: true,
            should_quit: false,
            typing_interval: config.typing_interval(),
            reveal: None,
            pending: None,
        };
        app.settle_stale_typing();
        app
    }

    /// Create an app over an in-memory store.
    #[cfg(test)]
    pub fn new_for_test() -> Self {
        let backend: Box<dyn KeyValueStore> = Box::new(parley_engine::MemoryStore::new());
        Self::new(ConversationStore::open(backend), &Config::default())
    }

    /// Apply an action. Returns a submission when a message was sent.
    pub fn handle_action(&mut self, action: Action) -> Option<Submission> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Send => return self.submit_input(),
            Action::NewChat => self.new_chat(),
            Action::DeleteChat => self.delete_current(),
            Action::PrevChat => self.switch_by(-1),
            Action::NextChat => self.switch_by(1),
            Action::ReactUp => self.react(Reaction::Up),
            Action::ReactDown => self.react(Reaction::Down),
            Action::ToggleSidebar => self.show_sidebar = !self.show_sidebar,
            Action::CycleTheme => self.theme = Theme::from_choice(self.theme.choice.next()),
            Action::ScrollUp(n) => self.transcript.scroll_up(n),
            Action::ScrollDown(n) => self.transcript.scroll_down(n),
            Action::None => {}
            edit => self.edit_input(edit),
        }
        None
    }

    /// Record the typed message and hand it off for a reply.
    ///
    /// Refused while a reply is pending, for blank input, or when the
    /// selection does not resolve.
    pub fn submit_input(&mut self) -> Option<Submission> {
        if self.pending.is_some() || self.input.is_blank() {
            return None;
        }
        let conversation_id = self.store.current()?.id.clone();

        let text = self.input.take();
        self.store.record_user_message(&conversation_id, text.clone())?;
        self.pending = Some(conversation_id.clone());
        self.transcript.follow();
        Some(Submission {
            conversation_id,
            text,
        })
    }

    /// Record the settled reply into the conversation that asked for it.
    ///
    /// A fresh reply is revealed if that conversation is on screen and shown
    /// in full otherwise. Nothing is recorded if it was deleted meanwhile.
    pub fn complete_reply(&mut self, outcome: Result<String, ReplyError>, now: Instant) {
        let Some(conversation_id) = self.pending.take() else {
            debug!("Reply settled with nothing pending");
            return;
        };
        let Some(message) = record_outcome(&mut self.store, &conversation_id, outcome) else {
            return;
        };
        if !message.is_typing {
            return;
        }

        if self.store.current_id() == Some(conversation_id.as_str()) {
            self.cancel_reveal();
            let mut scheduler = TypingScheduler::new(self.typing_interval);
            scheduler.start(message.content.clone(), now);
            self.reveal = Some(ActiveReveal {
                conversation_id,
                message_id: message.id,
                scheduler,
            });
            self.on_tick(now);
        } else {
            self.store.finish_typing(&conversation_id, &message.id);
        }
    }

    /// Advance the reveal to `now`, finishing the message when done.
    pub fn on_tick(&mut self, now: Instant) {
        let Some(active) = self.reveal.as_mut() else {
            return;
        };
        active.scheduler.advance_to(now);
        if !active.scheduler.in_progress() {
            self.finish_reveal();
        }
    }

    /// Finish any reveal before the app goes away.
    pub fn shutdown(&mut self) {
        self.cancel_reveal();
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the conversation on screen is the one waiting for a reply.
    pub fn thinking_here(&self) -> bool {
        self.pending.is_some() && self.pending.as_deref() == self.store.current_id()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    /// Revealed prefix for the transcript, if the reveal is on screen.
    pub fn reveal_view(&self) -> Option<Reveal<'_>> {
        self.reveal
            .as_ref()
            .filter(|r| self.store.current_id() == Some(r.conversation_id.as_str()))
            .map(|r| Reveal {
                message_id: &r.message_id,
                revealed: r.scheduler.revealed(),
            })
    }

    pub fn status_content(&self) -> StatusBarContent {
        let current = self.store.current();
        let activity = if self.thinking_here() {
            Some("thinking".to_string())
        } else if self.reveal_view().is_some() {
            Some("typing".to_string())
        } else {
            None
        };
        StatusBarContent {
            title: current.map_or_else(String::new, |c| c.title.clone()),
            message_count: current.map_or(0, |c| c.messages.len()),
            activity,
            hint: Some(HINTS.to_string()),
        }
    }

    fn edit_input(&mut self, action: Action) {
        if self.is_waiting() {
            return;
        }
        match action {
            Action::Insert(c) => self.input.insert(c),
            Action::Newline => self.input.insert('\n'),
            Action::Backspace => self.input.backspace(),
            Action::Delete => self.input.delete(),
            Action::Left => self.input.move_left(),
            Action::Right => self.input.move_right(),
            Action::Home => self.input.move_home(),
            Action::End => self.input.move_end(),
            _ => {}
        }
    }

    fn new_chat(&mut self) {
        self.cancel_reveal();
        self.store.create_new();
        self.transcript.follow();
    }

    fn delete_current(&mut self) {
        let Some(id) = self.store.current_id().map(str::to_string) else {
            return;
        };
        self.cancel_reveal();
        self.store.delete(&id);
        self.transcript.follow();
    }

    /// Move the selection through the conversation list, wrapping around.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn switch_by(&mut self, delta: isize) {
        let conversations = self.store.conversations();
        let len = conversations.len();
        if len < 2 {
            return;
        }
        let index = self
            .store
            .current_id()
            .and_then(|id| conversations.iter().position(|c| c.id == id))
            .unwrap_or(0);
        let next = (index as isize + delta).rem_euclid(len as isize) as usize;
        let target = conversations[next].id.clone();

        self.cancel_reveal();
        self.store.switch_current(target);
        self.transcript.follow();
    }

    /// React to the latest assistant message of the current conversation.
    fn react(&mut self, reaction: Reaction) {
        let Some((conversation_id, message_id)) = self
            .store
            .current()
            .and_then(|c| c.last_assistant().map(|m| (c.id.clone(), m.id.clone())))
        else {
            return;
        };
        self.store
            .toggle_reaction(&conversation_id, &message_id, reaction);
    }

    /// Tear down the reveal and show its message in full.
    fn cancel_reveal(&mut self) {
        if let Some(active) = self.reveal.as_mut() {
            active.scheduler.cancel();
        }
        self.finish_reveal();
    }

    fn finish_reveal(&mut self) {
        if let Some(active) = self.reveal.take() {
            self.store
                .finish_typing(&active.conversation_id, &active.message_id);
        }
    }

    fn settle_stale_typing(&mut self) {
        let stale: Vec<(String, String)> = self
            .store
            .conversations()
            .iter()
            .flat_map(|c| {
                c.messages
                    .iter()
                    .filter(|m| m.is_typing)
                    .map(move |m| (c.id.clone(), m.id.clone()))
            })
            .collect();
        for (conversation_id, message_id) in stale {
            debug!(%conversation_id, %message_id, "Finishing stale typing message");
            self.store.finish_typing(&conversation_id, &message_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_engine::{MemoryStore, Message, Role, DEFAULT_TITLE, STORAGE_KEY};

    const TICK: Duration = Duration::from_millis(20);

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(Action::Insert(c));
        }
    }

    fn send(app: &mut App, text: &str) -> Submission {
        type_text(app, text);
        app.handle_action(Action::Send).unwrap()
    }

    fn current_messages(app: &App) -> Vec<Message> {
        app.store.current().unwrap().messages.clone()
    }

    #[test]
    fn test_new_app_has_fresh_conversation() {
        let app = App::new_for_test();
        assert_eq!(app.store.conversations().len(), 1);
        assert_eq!(app.store.current().unwrap().title, DEFAULT_TITLE);
        assert!(!app.is_waiting());
        assert!(app.show_sidebar);
    }

    #[test]
    fn test_send_records_user_message_first() {
        let mut app = App::new_for_test();
        let submission = send(&mut app, "Explain the theory of relativity please");

        assert_eq!(submission.text, "Explain the theory of relativity please");
        assert_eq!(
            Some(submission.conversation_id.as_str()),
            app.store.current_id()
        );
        let messages = current_messages(&app);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(
            app.store.current().unwrap().title,
            "Explain the theory of relativity..."
        );
        assert!(app.input.content().is_empty());
        assert!(app.is_waiting());
        assert!(app.thinking_here());
    }

    #[test]
    fn test_blank_input_not_sent() {
        let mut app = App::new_for_test();
        type_text(&mut app, "   ");
        assert!(app.handle_action(Action::Send).is_none());
        assert!(current_messages(&app).is_empty());
    }

    #[test]
    fn test_only_one_pending_reply() {
        let mut app = App::new_for_test();
        send(&mut app, "first");

        // Input is locked while waiting
        type_text(&mut app, "second");
        assert!(app.input.content().is_empty());
        assert!(app.submit_input().is_none());
        assert_eq!(current_messages(&app).len(), 1);
    }

    #[test]
    fn test_reply_is_revealed_then_finished() {
        let mut app = App::new_for_test();
        send(&mut app, "Hi");

        let t0 = Instant::now();
        app.complete_reply(Ok("Hello".into()), t0);
        assert!(!app.is_waiting());
        assert!(app.is_revealing());

        let reply = current_messages(&app)[1].clone();
        assert!(reply.is_typing);
        assert_eq!(app.reveal_view().unwrap().revealed, "");

        app.on_tick(t0 + TICK * 2);
        assert_eq!(app.reveal_view().unwrap().revealed, "He");
        assert_eq!(app.status_content().activity.as_deref(), Some("typing"));

        app.on_tick(t0 + TICK * 5);
        assert!(!app.is_revealing());
        assert!(!current_messages(&app)[1].is_typing);
        assert_eq!(current_messages(&app)[1].content, "Hello");
    }

    #[test]
    fn test_failure_shown_without_reveal() {
        let mut app = App::new_for_test();
        send(&mut app, "Hi");
        app.complete_reply(
            Err(ReplyError::Status {
                status: 500,
                body: "boom".into(),
            }),
            Instant::now(),
        );

        assert!(!app.is_revealing());
        let messages = current_messages(&app);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "❌ Error: HTTP 500: boom");
        assert!(!messages[1].is_typing);
        assert!(!app.is_waiting());
    }

    #[test]
    fn test_reply_lands_in_originating_conversation() {
        let mut app = App::new_for_test();
        let submission = send(&mut app, "Question");
        app.handle_action(Action::NewChat);
        assert_ne!(app.store.current_id(), Some(submission.conversation_id.as_str()));
        assert!(!app.thinking_here());

        app.complete_reply(Ok("Answer".into()), Instant::now());

        // Off screen: stored finished, no reveal
        assert!(!app.is_revealing());
        assert!(current_messages(&app).is_empty());
        let origin = app.store.get(&submission.conversation_id).unwrap();
        assert_eq!(origin.messages.len(), 2);
        assert!(!origin.messages[1].is_typing);
    }

    #[test]
    fn test_reply_after_delete_is_dropped() {
        let mut app = App::new_for_test();
        let submission = send(&mut app, "Question");
        app.handle_action(Action::DeleteChat);

        app.complete_reply(Ok("Answer".into()), Instant::now());
        assert!(app.store.get(&submission.conversation_id).is_none());
        assert!(current_messages(&app).is_empty());
        assert!(!app.is_waiting());
    }

    #[test]
    fn test_switching_away_finishes_reveal() {
        let mut app = App::new_for_test();
        let first = app.store.current_id().unwrap().to_string();
        app.handle_action(Action::NewChat);
        app.handle_action(Action::NextChat);
        assert_eq!(app.store.current_id(), Some(first.as_str()));

        send(&mut app, "Hi");
        let t0 = Instant::now();
        app.complete_reply(Ok("A long answer".into()), t0);
        app.on_tick(t0 + TICK);
        assert!(app.is_revealing());

        app.handle_action(Action::PrevChat);
        assert!(!app.is_revealing());
        let origin = app.store.get(&first).unwrap();
        assert!(!origin.messages[1].is_typing);
        assert_eq!(origin.messages[1].content, "A long answer");
    }

    #[test]
    fn test_switch_wraps_around() {
        let mut app = App::new_for_test();
        let a = app.store.current_id().unwrap().to_string();
        let b = app.store.create_new();
        app.store.switch_current(b.clone());

        app.handle_action(Action::PrevChat);
        assert_eq!(app.store.current_id(), Some(a.as_str()));
        app.handle_action(Action::NextChat);
        assert_eq!(app.store.current_id(), Some(b.as_str()));
        app.handle_action(Action::NextChat);
        assert_eq!(app.store.current_id(), Some(a.as_str()));
    }

    #[test]
    fn test_reactions_toggle_on_latest_reply() {
        let mut app = App::new_for_test();
        send(&mut app, "Hi");
        let t0 = Instant::now();
        app.complete_reply(Ok("Hello".into()), t0);
        app.on_tick(t0 + TICK * 10);

        app.handle_action(Action::ReactUp);
        assert_eq!(current_messages(&app)[1].reaction, Some(Reaction::Up));
        app.handle_action(Action::ReactUp);
        assert_eq!(current_messages(&app)[1].reaction, None);
        app.handle_action(Action::ReactUp);
        app.handle_action(Action::ReactDown);
        assert_eq!(current_messages(&app)[1].reaction, Some(Reaction::Down));
    }

    #[test]
    fn test_reaction_without_reply_is_noop() {
        let mut app = App::new_for_test();
        send(&mut app, "Hi");
        app.handle_action(Action::ReactUp);
        assert!(current_messages(&app)[0].reaction.is_none());
    }

    #[test]
    fn test_delete_keeps_collection_non_empty() {
        let mut app = App::new_for_test();
        for _ in 0..3 {
            app.handle_action(Action::DeleteChat);
            assert_eq!(app.store.conversations().len(), 1);
            assert!(app.store.current().is_some());
        }
    }

    #[test]
    fn test_stale_typing_finished_on_startup() {
        let raw = r#"[{
            "id": "c1",
            "title": "Old",
            "createdAt": 1700000000000,
            "updatedAt": 1700000000000,
            "messages": [
                {"id": "m1", "role": "assistant", "content": "left mid-reveal", "timestamp": 1700000000000, "isTyping": true}
            ]
        }]"#;
        let backend: Box<dyn KeyValueStore> = Box::new(MemoryStore::with_value(STORAGE_KEY, raw));
        let app = App::new(ConversationStore::open(backend), &Config::default());

        let messages = current_messages(&app);
        assert!(!messages[0].is_typing);
        assert!(!app.is_revealing());
    }

    #[test]
    fn test_theme_cycle_and_sidebar_toggle() {
        let mut app = App::new_for_test();
        app.handle_action(Action::CycleTheme);
        assert_eq!(app.theme.name(), "light");
        app.handle_action(Action::ToggleSidebar);
        assert!(!app.show_sidebar);
    }

    #[test]
    fn test_multiline_input() {
        let mut app = App::new_for_test();
        type_text(&mut app, "line one");
        app.handle_action(Action::Newline);
        type_text(&mut app, "line two");
        let submission = app.handle_action(Action::Send).unwrap();
        assert_eq!(submission.text, "line one\nline two");
    }

    #[test]
    fn test_quit() {
        let mut app = App::new_for_test();
        app.handle_action(Action::Quit);
        assert!(app.should_quit);
    }
}
