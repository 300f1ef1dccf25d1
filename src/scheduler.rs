//! Periodic broadcast trigger.
//!
//! There is exactly zero or one armed timer. Arming always disarms the
//! previous timer first, and every arm gets a fresh [`TimerToken`] so a
//! tick can be traced back to the timer that produced it. The scheduler
//! does not sleep by itself: the owner polls it with the current time and
//! sleeps until [`BroadcastScheduler::next_deadline`].

use embassy_time::{Duration, Instant};

/// Identity of one armed timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerToken(pub u32);

/// A single firing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick {
    pub token: TimerToken,
    /// Firing count of this timer, starting at 0.
    pub sequence: u32,
}

#[derive(Clone, Copy, Debug)]
struct Armed {
    token: TimerToken,
    next_due: Instant,
    fired: u32,
}

pub struct BroadcastScheduler {
    period: Duration,
    armed: Option<Armed>,
    next_token: u32,
}

impl BroadcastScheduler {
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            armed: None,
            next_token: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm a new timer whose first tick is due at `now`.
    ///
    /// Any armed timer is disarmed first.
    pub fn start(&mut self, now: Instant) -> TimerToken {
        if let Some(prev) = self.armed.take() {
            debug!("scheduler: cancelling timer {:?}", prev.token);
        }
        let token = TimerToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.armed = Some(Armed {
            token,
            next_due: now,
            fired: 0,
        });
        debug!("scheduler: armed timer {:?}", token);
        token
    }

    /// Disarm. Once this returns no tick of the old timer is produced.
    pub fn stop(&mut self) {
        if let Some(prev) = self.armed.take() {
            debug!("scheduler: stopped timer {:?}", prev.token);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn token(&self) -> Option<TimerToken> {
        self.armed.map(|a| a.token)
    }

    /// When the owner should poll next; `None` while disarmed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.map(|a| a.next_due)
    }

    /// Fire at most once if the deadline has passed.
    ///
    /// Periods missed while the owner was not polling are coalesced into
    /// this single tick; the next deadline is the first one after `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        let period = self.period;
        let armed = self.armed.as_mut()?;
        if now < armed.next_due {
            return None;
        }

        let tick = Tick {
            token: armed.token,
            sequence: armed.fired,
        };
        armed.fired = armed.fired.wrapping_add(1);

        let mut next = armed.next_due + period;
        if next <= now {
            let behind = (now - armed.next_due).as_ticks() / period.as_ticks().max(1);
            trace!("scheduler: skipping {} missed period(s)", behind);
            next = armed.next_due + period * (behind as u32 + 1);
        }
        armed.next_due = next;
        Some(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Instant {
        Instant::from_millis(v)
    }

    fn sched() -> BroadcastScheduler {
        BroadcastScheduler::new(Duration::from_secs(2))
    }

    #[test]
    fn first_tick_fires_immediately() {
        let mut s = sched();
        let token = s.start(ms(1_000));
        assert_eq!(
            s.poll(ms(1_000)),
            Some(Tick {
                token,
                sequence: 0
            })
        );
        assert_eq!(s.next_deadline(), Some(ms(3_000)));
    }

    #[test]
    fn fires_once_per_period() {
        let mut s = sched();
        s.start(ms(0));
        assert!(s.poll(ms(0)).is_some());
        assert!(s.poll(ms(1)).is_none());
        assert!(s.poll(ms(1_999)).is_none());
        assert_eq!(s.poll(ms(2_000)).map(|t| t.sequence), Some(1));
        assert!(s.poll(ms(2_000)).is_none());
    }

    #[test]
    fn restart_cancels_previous_timer() {
        let mut s = sched();
        let first = s.start(ms(0));
        let second = s.start(ms(500));
        assert_ne!(first, second);
        assert_eq!(s.token(), Some(second));

        // Only one tick for the nominal period even though start ran twice.
        let tick = s.poll(ms(500)).unwrap();
        assert_eq!(tick.token, second);
        assert!(s.poll(ms(500)).is_none());
        assert!(s.poll(ms(2_000)).is_none());
        assert!(s.poll(ms(2_500)).is_some());
    }

    #[test]
    fn stop_prevents_further_ticks() {
        let mut s = sched();
        s.start(ms(0));
        s.poll(ms(0));
        s.stop();
        assert!(!s.is_armed());
        assert_eq!(s.next_deadline(), None);
        assert!(s.poll(ms(2_000)).is_none());
        assert!(s.poll(ms(60_000)).is_none());
    }

    #[test]
    fn missed_periods_are_coalesced() {
        let mut s = sched();
        s.start(ms(0));
        s.poll(ms(0));
        // Owner stalled for ~7 s.
        assert!(s.poll(ms(7_100)).is_some());
        assert!(s.poll(ms(7_100)).is_none());
        assert_eq!(s.next_deadline(), Some(ms(8_000)));
    }
}
