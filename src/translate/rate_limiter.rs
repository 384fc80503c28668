//! Request pacing with a sliding one-minute window.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Something that can block the current thread.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Wall clock and real sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl Sleeper for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when slept on. Every sleep is recorded.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += by;
        }
    }

    /// Sleeps performed so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Total time slept.
    pub fn slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = self.elapsed.lock().map(|e| *e).unwrap_or_default();
        self.start + elapsed
    }
}

impl Sleeper for ManualClock {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.advance(duration);
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Keeps the request rate under a per-minute ceiling.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests_per_minute: u32,
    window: Duration,
    timestamps: VecDeque<Instant>,
}

impl RateLimiter {
    /// A limiter allowing `requests_per_minute` requests in any minute.
    /// Zero disables limiting.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            window: Duration::from_secs(60),
            timestamps: VecDeque::new(),
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Requests recorded within the window ending at `now`.
    pub fn in_window(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.timestamps.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// How long to wait at `now` before the next request may be sent.
    pub fn delay_needed(&mut self, now: Instant) -> Duration {
        if self.requests_per_minute == 0 {
            return Duration::ZERO;
        }
        self.prune(now);
        if self.timestamps.len() < self.requests_per_minute as usize {
            return Duration::ZERO;
        }
        match self.timestamps.front() {
            Some(&oldest) => self
                .window
                .saturating_sub(now.saturating_duration_since(oldest)),
            None => Duration::ZERO,
        }
    }

    /// Sleep until the window has room. Returns the time waited.
    pub fn wait_if_needed<C: Clock + Sleeper + ?Sized>(&mut self, clock: &C) -> Duration {
        let delay = self.delay_needed(clock.now());
        if !delay.is_zero() {
            log::info!(
                "Rate limit of {} requests/minute reached, waiting {:.1}s",
                self.requests_per_minute,
                delay.as_secs_f64()
            );
            clock.sleep(delay);
        }
        delay
    }

    /// Record a request sent at `now`. Nothing is kept when limiting is
    /// disabled.
    pub fn record_request(&mut self, now: Instant) {
        if self.requests_per_minute == 0 {
            return;
        }
        self.prune(now);
        self.timestamps.push_back(now);
    }
}
