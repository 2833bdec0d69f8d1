//! Per-question countdown
//!
//! The timer does not own a clock. Whoever drives it calls [`QuestionTimer::tick`]
//! once per second; the API server does that from its ticker service.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running,
    Stopped,
    Expired,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Counted down, this many seconds left
    Running(u32),
    /// Reached zero on this tick
    Expired,
    /// Not running, nothing happened
    Idle,
}

type ExpireHook = Box<dyn FnMut() + Send>;

/// Countdown for one question. At most one countdown is active at a time.
pub struct QuestionTimer {
    duration: u32,
    remaining: u32,
    state: TimerState,
    on_expire: Option<ExpireHook>,
}

impl QuestionTimer {
    pub fn new() -> Self {
        Self {
            duration: 0,
            remaining: 0,
            state: TimerState::Idle,
            on_expire: None,
        }
    }

    /// Register a hook run when a countdown reaches zero
    pub fn on_expire(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_expire = Some(Box::new(hook));
        self
    }

    /// Begin a fresh countdown, discarding any running one
    pub fn start(&mut self, duration_seconds: u32) {
        self.duration = duration_seconds;
        self.remaining = duration_seconds;
        self.state = TimerState::Running;
    }

    /// Advance by one second. Fires the expiry hook exactly once per countdown.
    pub fn tick(&mut self) -> Tick {
        if self.state != TimerState::Running {
            return Tick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return Tick::Running(self.remaining);
        }

        self.state = TimerState::Expired;
        if let Some(hook) = self.on_expire.as_mut() {
            hook();
        }
        Tick::Expired
    }

    /// Cancel the countdown without firing expiry; returns the seconds left
    pub fn stop(&mut self) -> u32 {
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
        }
        self.remaining
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds counted down since the last `start`
    pub fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }
}

impl Default for QuestionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QuestionTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionTimer")
            .field("duration", &self.duration)
            .field("remaining", &self.remaining)
            .field("state", &self.state)
            .finish()
    }
}
