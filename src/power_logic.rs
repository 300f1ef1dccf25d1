//! Pure power policy: inactivity in, power state and lifecycle edges out.
//!
//! The device has no OS lifecycle of its own. Reaching the suspend timeout
//! is treated as "about to suspend" and the first activity afterwards as
//! "resumed". A keep-awake hold (the continuation grant) keeps the device
//! out of low power while it lasts.

/// Power state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Recent button activity.
    Active,
    /// No activity for a while; everything keeps running.
    Idle,
    /// Suspended: only a button press wakes the power manager.
    LowPower,
}

/// Host lifecycle events raised into the emulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lifecycle {
    Suspend,
    Resume,
}

/// Whether the device wants to suspend after `idle_secs` of inactivity.
pub fn suspend_requested(idle_secs: u64, suspend_timeout_secs: u64) -> bool {
    idle_secs >= suspend_timeout_secs
}

/// Decide the power state from inactivity and the keep-awake hold.
pub fn power_state(
    idle_secs: u64,
    keep_awake: bool,
    idle_timeout_secs: u64,
    suspend_timeout_secs: u64,
) -> PowerState {
    if suspend_requested(idle_secs, suspend_timeout_secs) && !keep_awake {
        PowerState::LowPower
    } else if idle_secs >= idle_timeout_secs {
        PowerState::Idle
    } else {
        PowerState::Active
    }
}

/// Whether the broadcast timer may run. In low power it is starved
/// until the next resume.
pub fn broadcast_allowed(state: PowerState) -> bool {
    state != PowerState::LowPower
}

/// Lifecycle event for a change of the suspend request, if any.
pub fn lifecycle_edge(was_requested: bool, now_requested: bool) -> Option<Lifecycle> {
    match (was_requested, now_requested) {
        (false, true) => Some(Lifecycle::Suspend),
        (true, false) => Some(Lifecycle::Resume),
        _ => None,
    }
}
