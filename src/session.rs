//! Session plumbing shared by the wizard and roster screens: liveness,
//! the single-submission loading flag, and the clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Datelike, Local};

/// Cloneable flag cleared when the owning screen is torn down.
///
/// Submissions check it after their network call returns and discard the
/// response instead of mutating state that no longer has an owner.
#[derive(Debug, Clone)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark the owning screen as gone.
    pub fn close(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Loading flag that admits one submission at a time.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag. Returns `None` while another submission holds it.
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Raise the flag for an owner that already excludes overlapping
    /// submissions, such as one holding `&mut self`.
    pub fn begin(&self) -> InFlightGuard {
        self.busy.store(true, Ordering::Release);
        InFlightGuard {
            busy: Arc::clone(&self.busy),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the [`InFlight`] flag when dropped, including when the
/// submitting future itself is dropped mid-request.
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Source of the current year for age rules.
pub trait Clock: Send + Sync {
    fn current_year(&self) -> i32;
}

/// Wall clock in the device's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        Local::now().year()
    }
}

/// Clock pinned to one year.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i32);

impl Clock for FixedClock {
    fn current_year(&self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_visible_to_clones() {
        let live = Liveness::new();
        let handle = live.clone();
        assert!(handle.is_alive());
        live.close();
        assert!(!handle.is_alive());
    }

    #[test]
    fn in_flight_admits_one_holder() {
        let flag = InFlight::new();
        let guard = flag.try_begin().expect("first claim succeeds");
        assert!(flag.is_busy());
        assert!(flag.try_begin().is_none());
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_begin().is_some());
    }

    #[test]
    fn begin_is_visible_to_clones() {
        let flag = InFlight::new();
        let observer = flag.clone();
        let guard = flag.begin();
        assert!(observer.is_busy());
        drop(guard);
        assert!(!observer.is_busy());
    }

    #[test]
    fn fixed_clock_year() {
        assert_eq!(FixedClock(2024).current_year(), 2024);
        assert!(SystemClock.current_year() >= 2024);
    }
}
