//! The emulator behind one lock.
//!
//! Power value, broadcasting flag, service state and the broadcast timer
//! are one unit of state. Stimuli, host callbacks and timer ticks each
//! run as a single closure under a critical-section mutex, so the
//! encoder never sees a half-updated value and a stop cannot race an
//! in-flight tick.
//!
//! The broadcast task sleeps until [`SharedEmulator::next_deadline`] or
//! until [`SharedEmulator::schedule_changed`] fires, whichever is first.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Instant;

use crate::emulator::Emulator;
use crate::host::{PeripheralHost, StatusSink};
use crate::scheduler::Tick;

pub struct SharedEmulator<H: PeripheralHost, S: StatusSink> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Emulator<H, S>>>,
    schedule_changed: Signal<CriticalSectionRawMutex, ()>,
}

impl<H: PeripheralHost, S: StatusSink> SharedEmulator<H, S> {
    pub const fn new(emulator: Emulator<H, S>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(emulator)),
            schedule_changed: Signal::new(),
        }
    }

    /// Run `f` with exclusive access.
    ///
    /// Wakes the broadcast task if `f` armed, re-armed or disarmed the
    /// timer.
    pub fn lock<R>(&self, f: impl FnOnce(&mut Emulator<H, S>) -> R) -> R {
        let (result, rescheduled) = self.inner.lock(|cell| {
            let mut emu = cell.borrow_mut();
            let before = (emu.scheduler().token(), emu.next_deadline());
            let result = f(&mut emu);
            let after = (emu.scheduler().token(), emu.next_deadline());
            (result, before != after)
        });
        if rescheduled {
            self.schedule_changed.signal(());
        }
        result
    }

    /// Fire the broadcast if due.
    ///
    /// Does not raise [`schedule_changed`](Self::schedule_changed): the
    /// caller is the broadcast task and re-reads the deadline itself.
    pub fn poll(&self, now: Instant) -> Option<Tick> {
        self.inner.lock(|cell| cell.borrow_mut().poll(now))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.lock(|cell| cell.borrow().next_deadline())
    }

    /// Resolves once the timer was armed, re-armed or disarmed since the
    /// last wait.
    pub async fn schedule_changed(&self) {
        self.schedule_changed.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RadioState;
    use crate::test_support::{RecordingHost, RecordingSink};

    fn shared() -> SharedEmulator<RecordingHost, RecordingSink> {
        let shared = SharedEmulator::new(Emulator::new(
            RecordingHost::new(),
            RecordingSink::default(),
        ));
        shared.lock(|emu| {
            emu.initialize();
            emu.on_radio_state(RadioState::PoweredOn, Instant::from_millis(0));
        });
        shared
    }

    #[test]
    fn arming_and_disarming_wake_the_broadcast_task() {
        let shared = shared();
        assert!(!shared.schedule_changed.signaled());

        shared.lock(|emu| emu.set_broadcasting(true, Instant::from_millis(0)));
        assert!(shared.schedule_changed.signaled());
        shared.schedule_changed.reset();

        shared.lock(|emu| emu.set_broadcasting(false, Instant::from_millis(10)));
        assert!(shared.schedule_changed.signaled());
    }

    #[test]
    fn value_changes_do_not_wake_the_broadcast_task() {
        let shared = shared();
        shared.lock(|emu| emu.set_broadcasting(true, Instant::from_millis(0)));
        shared.schedule_changed.reset();

        shared.lock(|emu| emu.increment(5));
        assert!(!shared.schedule_changed.signaled());
    }

    #[test]
    fn restart_at_same_deadline_still_wakes() {
        let shared = shared();
        shared.lock(|emu| emu.set_broadcasting(true, Instant::from_millis(0)));
        shared.schedule_changed.reset();

        shared.lock(|emu| emu.set_broadcasting(true, Instant::from_millis(0)));
        assert!(shared.schedule_changed.signaled());
    }

    #[test]
    fn poll_moves_deadline_forward() {
        let shared = shared();
        shared.lock(|emu| emu.set_broadcasting(true, Instant::from_millis(0)));

        assert!(shared.poll(Instant::from_millis(0)).is_some());
        assert_eq!(shared.next_deadline(), Some(Instant::from_millis(2_000)));
    }
}
