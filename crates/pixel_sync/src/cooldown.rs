//! Cooldown rate limiting for outgoing writes.
//!
//! The gate is either idle or waiting for an expiry instant. A write may only be
//! issued from idle, and issuing one starts a new wait. The server can also push
//! a cooldown (for example after a reconnect), which replaces whatever wait is
//! currently running.
//!
//! The countdown shown to the user is driven by [`CooldownGate::tick`], which the
//! session loop calls every [`TICK_INTERVAL`]. Ticks only feed the display; the
//! gate decides purely by comparing the clock against the expiry.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Display refresh cadence of the countdown.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Longest wait the gate will hold. Larger cooldowns are clamped to it.
pub const MAX_WAIT: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Spinner frames shown next to the remaining seconds.
pub const SPINNER_FRAMES: [char; 4] = ['/', '-', '\\', '|'];

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Idle,
    Waiting { expiry: Instant },
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// No countdown running.
    Inactive,
    /// Countdown running; whole seconds left (rounded up) and the spinner frame.
    Counting { seconds_left: u64, spinner: char },
    /// The countdown reached its expiry on this tick, the gate is idle again.
    Expired,
}

/// Observer that renders the countdown.
pub trait CountdownDisplay {
    fn show(&mut self, seconds_left: u64, spinner: char);

    fn clear(&mut self);
}

/// Display that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCountdownDisplay;

impl CountdownDisplay for NoCountdownDisplay {
    fn show(&mut self, _seconds_left: u64, _spinner: char) {}

    fn clear(&mut self) {}
}

/// Gates outgoing writes behind a per-participant cooldown.
#[derive(Debug)]
pub struct CooldownGate<C = SystemClock> {
    state: CooldownState,
    cooldown: Duration,
    clock: C,
    spinner_frame: usize,
}

impl<C: Clock> CooldownGate<C> {
    /// Create an idle gate. `cooldown` is the wait started by [`Self::try_consume`].
    pub fn new(cooldown: Duration, clock: C) -> Self {
        Self {
            state: CooldownState::Idle,
            cooldown,
            clock,
            spinner_frame: 0,
        }
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Check the expiry and report whether a write would currently be accepted.
    pub fn is_idle(&mut self) -> bool {
        self.check_expiry();
        self.state == CooldownState::Idle
    }

    /// Time left until the gate reopens, `None` when idle.
    pub fn remaining(&self) -> Option<Duration> {
        match self.state {
            CooldownState::Idle => None,
            CooldownState::Waiting { expiry } => Some(expiry.saturating_duration_since(self.clock.now())),
        }
    }

    /// Take the write slot.
    ///
    /// Returns `true` and starts the configured cooldown only when the gate is
    /// idle. An expiry that already passed counts as idle.
    pub fn try_consume(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.start(self.cooldown);
        true
    }

    /// Start a server-asserted cooldown, replacing any running one.
    pub fn force_waiting(&mut self, seconds: u64) {
        self.start(Duration::from_secs(seconds));
    }

    /// Advance the countdown display by one step.
    pub fn tick(&mut self) -> CountdownTick {
        match self.state {
            CooldownState::Idle => CountdownTick::Inactive,
            CooldownState::Waiting { .. } => {
                if self.check_expiry() {
                    return CountdownTick::Expired;
                }
                let remaining = self.remaining().unwrap_or_default();
                let spinner = SPINNER_FRAMES[self.spinner_frame];
                self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
                CountdownTick::Counting {
                    seconds_left: ceil_secs(remaining),
                    spinner,
                }
            }
        }
    }

    fn start(&mut self, duration: Duration) {
        self.state = CooldownState::Waiting {
            expiry: expiry_after(self.clock.now(), duration),
        };
        self.spinner_frame = 0;
    }

    /// Returns true if this call moved the gate from waiting to idle.
    fn check_expiry(&mut self) -> bool {
        if let CooldownState::Waiting { expiry } = self.state {
            if self.clock.now() >= expiry {
                self.state = CooldownState::Idle;
                return true;
            }
        }
        false
    }
}

/// `now + duration`, capped at [`MAX_WAIT`] and at the latest representable instant.
fn expiry_after(now: Instant, duration: Duration) -> Instant {
    let mut wait = duration.min(MAX_WAIT);
    loop {
        if let Some(expiry) = now.checked_add(wait) {
            return expiry;
        }
        wait /= 2;
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
