//! Power management module - suspend/resume for battery operation.
//!
//! Implements:
//! - Inactivity tracking from button presses
//! - "About to suspend" / "resumed" events into the emulator
//! - Low-power mode unless the emulator holds a keep-awake grant
//!
//! nRF52840 power modes:
//! - System ON: Normal operation (~3.5 mA while advertising)
//! - System ON Idle: CPU sleeping between events (~1.5 mA)
//!
//! In `LowPower` the manager stops its periodic poll and only wakes on a
//! button press, and the broadcast task stops firing, so the executor can
//! stay in WFE. The emulator's keep-awake grant is what keeps the
//! broadcast going through a suspend.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::info;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};

use crate::ble::{host, Shared};
use wattsim::config::{IDLE_TIMEOUT_SECS, POWER_POLL_INTERVAL, SUSPEND_TIMEOUT_SECS};
use wattsim::power_logic::{self, Lifecycle, PowerState};

static ACTIVITY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Mirrors `power_logic::broadcast_allowed` for the broadcast task.
static BROADCAST_ALLOWED: AtomicBool = AtomicBool::new(true);
static BROADCAST_RESUMED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

pub fn broadcast_allowed() -> bool {
    BROADCAST_ALLOWED.load(Ordering::Acquire)
}

/// Wait until the broadcast may run again.
pub async fn broadcast_resumed() {
    while !broadcast_allowed() {
        BROADCAST_RESUMED.wait().await;
    }
}

/// Record activity (button press).
pub fn note_activity() {
    ACTIVITY.signal(());
}

/// Power manager tracks activity and derives the lifecycle events.
pub struct PowerManager {
    state: PowerState,
    last_activity: Instant,
    suspend_requested: bool,
}

impl PowerManager {
    pub fn new(now: Instant) -> Self {
        Self {
            state: PowerState::Active,
            last_activity: now,
            suspend_requested: false,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Activity seen at `now`. Returns `Resume` if we were suspended.
    pub fn activity(&mut self, now: Instant) -> Option<Lifecycle> {
        self.last_activity = now;
        self.update(now, host::keep_awake())
    }

    /// Periodic re-evaluation. Returns `Suspend` on the first tick past
    /// the suspend timeout.
    pub fn tick(&mut self, now: Instant) -> Option<Lifecycle> {
        self.update(now, host::keep_awake())
    }

    /// Re-derive the state after the keep-awake hold may have changed.
    pub fn refresh(&mut self, now: Instant) {
        self.update(now, host::keep_awake());
    }

    fn update(&mut self, now: Instant, keep_awake: bool) -> Option<Lifecycle> {
        let idle_secs = (now - self.last_activity).as_secs();

        let requested = power_logic::suspend_requested(idle_secs, SUSPEND_TIMEOUT_SECS);
        let edge = power_logic::lifecycle_edge(self.suspend_requested, requested);
        self.suspend_requested = requested;

        let new_state =
            power_logic::power_state(idle_secs, keep_awake, IDLE_TIMEOUT_SECS, SUSPEND_TIMEOUT_SECS);
        if new_state != self.state {
            info!("Power: {:?} -> {:?}", self.state, new_state);
            self.state = new_state;

            let allowed = power_logic::broadcast_allowed(new_state);
            BROADCAST_ALLOWED.store(allowed, Ordering::Release);
            if allowed {
                BROADCAST_RESUMED.signal(());
            }
        }
        edge
    }
}

#[embassy_executor::task]
pub async fn power_task(emu: &'static Shared) -> ! {
    let mut manager = PowerManager::new(Instant::now());

    loop {
        let woke_by_activity = if manager.state() == PowerState::LowPower {
            ACTIVITY.wait().await;
            true
        } else {
            matches!(
                select(ACTIVITY.wait(), Timer::after(POWER_POLL_INTERVAL)).await,
                Either::First(())
            )
        };

        let now = Instant::now();
        let edge = if woke_by_activity {
            manager.activity(now)
        } else {
            manager.tick(now)
        };

        match edge {
            Some(Lifecycle::Suspend) => {
                info!("Power: about to suspend");
                emu.lock(|emu| emu.on_suspend());
                // The emulator may have taken the keep-awake hold.
                manager.refresh(now);
            }
            Some(Lifecycle::Resume) => {
                info!("Power: resumed");
                emu.lock(|emu| emu.on_resume());
                manager.refresh(now);
            }
            None => {}
        }
    }
}
