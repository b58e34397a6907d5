//! Time keeping for the settle and drain delays.

use std::{thread, time::Duration};

/// Blocks the caller for a given amount of time.
///
/// The probe never measures time, it only waits, so this is all a clock needs
/// to do. Tests plug in a clock that advances a simulated time instead of
/// sleeping.
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps on the calling thread.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;
impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[test]
fn system_clock_waits_at_least_the_duration() {
    let start = std::time::Instant::now();
    SystemClock.sleep(Duration::from_millis(20));
    assert!(start.elapsed() >= Duration::from_millis(20));
}
