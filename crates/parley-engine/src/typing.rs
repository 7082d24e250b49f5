//! Timed character-by-character reveal ("typing effect").
//!
//! [`TypingScheduler`] is a pure state machine that owns no timer: it keeps
//! the deadline of its next tick and is driven by whoever owns it, so a UI
//! event loop and a virtual test clock drive it the same way.
//! [`RevealHandle`] drives one on a tokio task and publishes frames.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default delay between revealed characters.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(20);

/// Reveal lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealState {
    /// Nothing started yet.
    #[default]
    Idle,
    /// Ticks are pending.
    Revealing,
    /// The full text is revealed.
    Complete,
    /// Torn down; no further transitions.
    Cancelled,
}

/// Reveals a string one character per interval.
#[derive(Debug, Clone)]
pub struct TypingScheduler {
    interval: Duration,
    state: RevealState,
    text: String,
    /// Byte length of the revealed prefix (always on a char boundary).
    revealed_len: usize,
    deadline: Option<Instant>,
}

impl TypingScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: RevealState::Idle,
            text: String::new(),
            revealed_len: 0,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    /// Whether characters remain to be revealed.
    pub fn in_progress(&self) -> bool {
        self.state == RevealState::Revealing
    }

    /// The full target text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The prefix revealed so far.
    pub fn revealed(&self) -> &str {
        &self.text[..self.revealed_len]
    }

    /// When the next tick is due, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Start revealing `text` from scratch, discarding any reveal in flight.
    ///
    /// Empty text completes immediately without scheduling a tick.
    pub fn start(&mut self, text: impl Into<String>, now: Instant) {
        if self.state == RevealState::Cancelled {
            debug!("Ignoring start on a cancelled reveal");
            return;
        }

        self.text = text.into();
        self.revealed_len = 0;
        if self.text.is_empty() {
            self.state = RevealState::Complete;
            self.deadline = None;
        } else {
            self.state = RevealState::Revealing;
            self.deadline = Some(now + self.interval);
        }
    }

    /// Restart only if `text` differs from the current target.
    ///
    /// Returns whether a restart happened.
    pub fn retarget(&mut self, text: &str, now: Instant) -> bool {
        if self.state != RevealState::Idle && self.text == text {
            return false;
        }
        self.start(text, now);
        self.state != RevealState::Cancelled
    }

    /// Reveal exactly one more character.
    ///
    /// Returns whether the revealed prefix changed.
    pub fn tick(&mut self) -> bool {
        if self.state != RevealState::Revealing {
            return false;
        }

        let Some(next) = self.text[self.revealed_len..].chars().next() else {
            self.complete();
            return false;
        };
        self.revealed_len += next.len_utf8();

        if self.revealed_len == self.text.len() {
            self.complete();
        } else {
            self.deadline = self.deadline.map(|due| due + self.interval);
        }
        true
    }

    /// Apply every tick due at or before `now`. Returns the number applied.
    pub fn advance_to(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Some(due) = self.deadline {
            if due > now {
                break;
            }
            if !self.tick() {
                break;
            }
            applied += 1;
        }
        applied
    }

    /// Tear down: drop the pending tick and refuse further transitions.
    pub fn cancel(&mut self) {
        self.state = RevealState::Cancelled;
        self.deadline = None;
    }

    fn complete(&mut self) {
        self.state = RevealState::Complete;
        self.deadline = None;
    }
}

impl Default for TypingScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

/// Snapshot of a reveal published by [`RevealHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealFrame {
    pub revealed: String,
    pub in_progress: bool,
}

impl RevealFrame {
    fn of(scheduler: &TypingScheduler) -> Self {
        Self {
            revealed: scheduler.revealed().to_string(),
            in_progress: scheduler.in_progress(),
        }
    }
}

/// A reveal running on a tokio task.
///
/// Dropping the handle aborts the task; no frame is published afterwards.
#[derive(Debug)]
pub struct RevealHandle {
    rx: watch::Receiver<RevealFrame>,
    task: JoinHandle<()>,
}

impl RevealHandle {
    /// Spawn a reveal of `text` on the current tokio runtime.
    pub fn spawn(text: impl Into<String>, interval: Duration) -> Self {
        let mut scheduler = TypingScheduler::new(interval);
        scheduler.start(text, tokio::time::Instant::now().into_std());

        let (tx, rx) = watch::channel(RevealFrame::of(&scheduler));
        let task = tokio::spawn(async move {
            while let Some(deadline) = scheduler.deadline() {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
                scheduler.advance_to(tokio::time::Instant::now().into_std());
                if tx.send(RevealFrame::of(&scheduler)).is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    /// The latest published frame.
    pub fn frame(&self) -> RevealFrame {
        self.rx.borrow().clone()
    }

    /// Another receiver for the same frames.
    pub fn subscribe(&self) -> watch::Receiver<RevealFrame> {
        self.rx.clone()
    }

    /// Wait for the next frame. Returns `None` once the reveal has ended.
    pub async fn changed(&mut self) -> Option<RevealFrame> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Cancel the reveal immediately.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    fn started(text: &str) -> (TypingScheduler, Instant) {
        let now = Instant::now();
        let mut scheduler = TypingScheduler::new(TICK);
        scheduler.start(text, now);
        (scheduler, now)
    }

    #[test]
    fn test_starts_idle() {
        let scheduler = TypingScheduler::default();
        assert_eq!(scheduler.state(), RevealState::Idle);
        assert_eq!(scheduler.interval(), DEFAULT_INTERVAL);
        assert!(!scheduler.in_progress());
        assert_eq!(scheduler.revealed(), "");
    }

    #[test]
    fn test_reveals_one_char_per_tick() {
        let (mut scheduler, _) = started("hello");
        assert!(scheduler.in_progress());
        assert_eq!(scheduler.revealed(), "");

        let mut seen = Vec::new();
        while scheduler.tick() {
            seen.push(scheduler.revealed().to_string());
        }

        assert_eq!(seen, vec!["h", "he", "hel", "hell", "hello"]);
        assert_eq!(scheduler.state(), RevealState::Complete);
        assert!(!scheduler.in_progress());
        assert!(scheduler.deadline().is_none());
    }

    #[test]
    fn test_n_ticks_complete_the_reveal() {
        for text in ["a", "ab", "typing effect", "naïve café"] {
            let (mut scheduler, _) = started(text);
            for _ in 0..text.chars().count() {
                assert!(scheduler.tick());
            }
            assert_eq!(scheduler.revealed(), text);
            assert!(!scheduler.in_progress());
            assert!(!scheduler.tick());
        }
    }

    #[test]
    fn test_empty_text_completes_immediately() {
        let (mut scheduler, _) = started("");
        assert!(!scheduler.in_progress());
        assert_eq!(scheduler.state(), RevealState::Complete);
        assert!(scheduler.deadline().is_none());
        assert!(!scheduler.tick());
    }

    #[test]
    fn test_restart_discards_old_text() {
        let (mut scheduler, now) = started("abc");
        scheduler.tick();
        assert_eq!(scheduler.revealed(), "a");

        scheduler.start("xyz", now);
        assert_eq!(scheduler.revealed(), "");
        assert!(scheduler.in_progress());

        let mut seen = Vec::new();
        while scheduler.tick() {
            seen.push(scheduler.revealed().to_string());
        }
        assert_eq!(seen, vec!["x", "xy", "xyz"]);
    }

    #[test]
    fn test_complete_then_new_text_restarts() {
        let (mut scheduler, now) = started("ab");
        scheduler.advance_to(now + TICK * 10);
        assert_eq!(scheduler.state(), RevealState::Complete);

        scheduler.start("cd", now);
        assert_eq!(scheduler.state(), RevealState::Revealing);
        assert_eq!(scheduler.revealed(), "");
    }

    #[test]
    fn test_advance_to_follows_virtual_clock() {
        let (mut scheduler, t0) = started("abcd");
        assert_eq!(scheduler.deadline(), Some(t0 + TICK));

        assert_eq!(scheduler.advance_to(t0 + TICK / 2), 0);
        assert_eq!(scheduler.revealed(), "");

        assert_eq!(scheduler.advance_to(t0 + TICK), 1);
        assert_eq!(scheduler.revealed(), "a");

        assert_eq!(scheduler.advance_to(t0 + TICK * 3), 2);
        assert_eq!(scheduler.revealed(), "abc");
        assert_eq!(scheduler.deadline(), Some(t0 + TICK * 4));

        assert_eq!(scheduler.advance_to(t0 + TICK * 100), 1);
        assert_eq!(scheduler.revealed(), "abcd");
        assert!(!scheduler.in_progress());
    }

    #[test]
    fn test_multibyte_prefixes_stay_on_char_boundaries() {
        let (mut scheduler, _) = started("héllo 👋");
        let mut seen = Vec::new();
        while scheduler.tick() {
            seen.push(scheduler.revealed().to_string());
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(seen[1], "hé");
        assert_eq!(seen[6], "héllo 👋");
    }

    #[test]
    fn test_cancel_is_terminal() {
        let (mut scheduler, now) = started("abc");
        scheduler.tick();
        scheduler.cancel();

        assert_eq!(scheduler.state(), RevealState::Cancelled);
        assert!(scheduler.deadline().is_none());
        assert!(!scheduler.tick());
        assert_eq!(scheduler.advance_to(now + TICK * 10), 0);
        assert_eq!(scheduler.revealed(), "a");

        scheduler.start("new", now);
        assert_eq!(scheduler.state(), RevealState::Cancelled);
        assert_eq!(scheduler.text(), "abc");
    }

    #[test]
    fn test_retarget_skips_same_text() {
        let (mut scheduler, now) = started("abc");
        scheduler.tick();

        assert!(!scheduler.retarget("abc", now));
        assert_eq!(scheduler.revealed(), "a");

        assert!(scheduler.retarget("xyz", now));
        assert_eq!(scheduler.revealed(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_handle_publishes_prefixes() {
        let mut handle = RevealHandle::spawn("abc", TICK);
        assert_eq!(
            handle.frame(),
            RevealFrame {
                revealed: String::new(),
                in_progress: true
            }
        );

        let mut last = handle.frame();
        while let Some(frame) = handle.changed().await {
            assert!("abc".starts_with(&frame.revealed));
            assert!(frame.revealed.len() >= last.revealed.len());
            last = frame;
        }

        assert_eq!(last.revealed, "abc");
        assert!(!last.in_progress);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_handle_cancel_stops_ticks() {
        let handle = RevealHandle::spawn("abcdef", TICK);
        let mut rx = handle.subscribe();
        handle.cancel();

        tokio::time::advance(TICK * 10).await;
        assert!(rx.changed().await.is_err());
        assert_eq!(rx.borrow().revealed, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_handle_empty_text() {
        let mut handle = RevealHandle::spawn("", TICK);
        assert!(!handle.frame().in_progress);
        assert!(handle.changed().await.is_none());
    }
}
