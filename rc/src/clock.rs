//! Injectable time source for the polling loop

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Time as seen by the racer
pub trait Clock {
    /// Time elapsed since the clock was created
    fn elapsed(&self) -> Duration;

    /// Suspend for `duration`
    fn sleep(&self, duration: Duration);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock with real sleeps
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

type Action = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ManualState {
    now: Duration,
    sleeps: Vec<Duration>,
    scheduled: Vec<(Duration, Action)>,
}

/// Virtual clock: sleeping advances time instantly
///
/// Actions registered with [`ManualClock::at`] fire, in time order, during
/// the first sleep that carries virtual time to or past their deadline.
/// This is how tests stand in for the victim process.
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `action` once virtual time reaches `when`
    pub fn at(&self, when: Duration, action: impl FnOnce() + Send + 'static) {
        self.lock().scheduled.push((when, Box::new(action)));
    }

    /// Move virtual time forward, firing any actions that fall due
    pub fn advance(&self, duration: Duration) {
        let due = {
            let mut state = self.lock();
            state.now += duration;
            let now = state.now;
            let (mut due, pending): (Vec<_>, Vec<_>) = state.scheduled.drain(..).partition(|(when, _)| *when <= now);
            state.scheduled = pending;
            due.sort_by_key(|(when, _)| *when);
            due
        };

        // Actions may touch the clock themselves
        for (_, action) in due {
            action();
        }
    }

    /// Every sleep requested so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) {
        self.lock().sleeps.push(duration);
        self.advance(duration);
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ManualClock")
            .field("now", &state.now)
            .field("sleeps", &state.sleeps.len())
            .field("scheduled", &state.scheduled.len())
            .finish()
    }
}
