//! Cycling Power peripheral emulator: the service/advertising state
//! machine and owner of every other piece of state.
//!
//! Lifecycle:
//! ```text
//! Uninitialized ─initialize─▶ RadioOff ─radio ready─▶ Registered ⇄ Advertising
//!                                                    (idle)      (broadcasting)
//! any ─shutdown─▶ Stopped
//! ```
//! The characteristic handle only exists in `Registered` / `Advertising`,
//! so "not registered yet" cannot be confused with a missing handle.
//!
//! All methods take `&mut self`; concurrent callers go through
//! [`SharedEmulator`](crate::shared::SharedEmulator).

use embassy_time::Instant;

use crate::config::{BROADCAST_PERIOD, CYCLING_POWER_SERVICE_UUID};
use crate::continuation::ContinuationManager;
use crate::cps;
use crate::host::{PeripheralHost, RadioState, StatusSink, CYCLING_POWER_SERVICE};
use crate::scheduler::{BroadcastScheduler, Tick};
use crate::subscribers::{CentralId, SubscriberRegistry};
use crate::watts::{Adjustment, PowerStore};


/// Service lifecycle, carrying the characteristic once registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState<C> {
    Uninitialized,
    /// Waiting for the radio; nothing registered yet.
    RadioOff,
    /// Service registered, not broadcasting.
    Registered(C),
    /// Broadcasting requested: advertising started and timer armed.
    Advertising(C),
    Stopped,
}

impl<C: Copy> ServiceState<C> {
    pub fn characteristic(&self) -> Option<C> {
        match self {
            ServiceState::Registered(c) | ServiceState::Advertising(c) => Some(*c),
            _ => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            ServiceState::Uninitialized => Phase::Uninitialized,
            ServiceState::RadioOff => Phase::RadioOff,
            ServiceState::Registered(_) => Phase::Registered,
            ServiceState::Advertising(_) => Phase::Advertising,
            ServiceState::Stopped => Phase::Stopped,
        }
    }
}

/// [`ServiceState`] without the payload, for logs and assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Uninitialized,
    RadioOff,
    Registered,
    Advertising,
    Stopped,
}

/// External stimulus from the UI collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stimulus {
    Increment(u16),
    Decrement(u16),
    ToggleBroadcasting,
}

pub struct Emulator<H: PeripheralHost, S: StatusSink> {
    host: H,
    sink: S,
    state: ServiceState<H::Characteristic>,
    power: PowerStore,
    broadcasting: bool,
    scheduler: BroadcastScheduler,
    subscribers: SubscriberRegistry,
    continuation: ContinuationManager<H::Grant>,
}

impl<H: PeripheralHost, S: StatusSink> Emulator<H, S> {
    pub const fn new(host: H, sink: S) -> Self {
        Self {
            host,
            sink,
            state: ServiceState::Uninitialized,
            power: PowerStore::new(),
            broadcasting: false,
            scheduler: BroadcastScheduler::new(BROADCAST_PERIOD),
            subscribers: SubscriberRegistry::new(),
            continuation: ContinuationManager::new(),
        }
    }

    /// Emulator start: wait for the radio and publish the initial status.
    pub fn initialize(&mut self) {
        if !matches!(self.state, ServiceState::Uninitialized) {
            return;
        }
        self.state = ServiceState::RadioOff;
        self.sink.power_changed(self.power.get());
        self.sink.broadcasting_changed(self.broadcasting);
        info!("emulator initialized, waiting for radio");
    }

    // Accessors

    pub fn power(&self) -> u16 {
        self.power.get()
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcasting
    }

    pub fn state(&self) -> ServiceState<H::Characteristic> {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn subscribers(&self) -> &[CentralId] {
        self.subscribers.list()
    }

    pub fn scheduler(&self) -> &BroadcastScheduler {
        &self.scheduler
    }

    pub fn holds_continuation(&self) -> bool {
        self.continuation.holds_grant()
    }

    /// When the broadcast timer wants to be polled next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // Stimuli

    pub fn apply(&mut self, stimulus: Stimulus, now: Instant) {
        match stimulus {
            Stimulus::Increment(delta) => {
                self.increment(delta);
            }
            Stimulus::Decrement(delta) => {
                self.decrement(delta);
            }
            Stimulus::ToggleBroadcasting => {
                self.toggle_broadcasting(now);
            }
        }
    }

    /// Raise the power. Pushed on the next tick, not now.
    pub fn increment(&mut self, delta: u16) -> u16 {
        if matches!(self.state, ServiceState::Stopped) {
            return self.power.get();
        }
        let adj = self.power.increment(delta);
        if adj.is_clamped() {
            warn!("power clamped at {} W", adj.value());
        }
        self.power_adjusted(adj)
    }

    pub fn decrement(&mut self, delta: u16) -> u16 {
        if matches!(self.state, ServiceState::Stopped) {
            return self.power.get();
        }
        let adj = self.power.decrement(delta);
        self.power_adjusted(adj)
    }

    fn power_adjusted(&mut self, adj: Adjustment) -> u16 {
        let watts = adj.value();
        debug!("power now {} W", watts);
        self.sink.power_changed(watts);
        watts
    }

    /// Flip the broadcasting flag; returns the new value.
    pub fn toggle_broadcasting(&mut self, now: Instant) -> bool {
        let on = !self.broadcasting;
        self.set_broadcasting(on, now);
        self.broadcasting
    }

    pub fn set_broadcasting(&mut self, on: bool, now: Instant) {
        if matches!(self.state, ServiceState::Stopped) {
            return;
        }
        if self.broadcasting != on {
            self.broadcasting = on;
            info!("broadcasting {}", if on { "on" } else { "off" });
            self.sink.broadcasting_changed(on);
        }

        if !on {
            self.end_broadcast();
        } else if self.state.characteristic().is_some() {
            self.begin_broadcast(now);
        } else {
            info!("broadcast deferred until the service is registered");
        }
    }

    // Host events

    pub fn on_radio_state(&mut self, radio: RadioState, now: Instant) {
        match (radio, self.state) {
            (_, ServiceState::Stopped) => {}
            (RadioState::PoweredOn, ServiceState::Uninitialized | ServiceState::RadioOff) => {
                info!("radio ready");
                self.register();
                if self.broadcasting && self.state.characteristic().is_some() {
                    self.begin_broadcast(now);
                }
            }
            (RadioState::PoweredOn, ServiceState::Registered(_)) => {
                info!("radio ready again");
                if self.broadcasting {
                    self.begin_broadcast(now);
                }
            }
            (RadioState::PoweredOn, ServiceState::Advertising(_)) => {}
            (_, ServiceState::Uninitialized | ServiceState::RadioOff) => {
                warn!("bluetooth not available: {:?}", radio);
                self.state = ServiceState::RadioOff;
            }
            (_, ServiceState::Registered(_) | ServiceState::Advertising(_)) => {
                warn!("radio lost: {:?}", radio);
                self.end_broadcast();
                self.subscribers.clear();
            }
        }
    }

    pub fn on_subscribe(&mut self, central: CentralId) {
        if matches!(self.state, ServiceState::Stopped) {
            return;
        }
        if let Err(e) = self.subscribers.on_subscribe(central) {
            warn!("cannot track {:?}: {:?}", central, e);
        }
    }

    pub fn on_unsubscribe(&mut self, central: CentralId) {
        self.subscribers.on_unsubscribe(central);
    }

    /// Host is about to suspend us.
    pub fn on_suspend(&mut self) {
        if matches!(self.state, ServiceState::Stopped) {
            return;
        }
        let advertising = matches!(self.state, ServiceState::Advertising(_));
        if self.broadcasting && !advertising {
            info!("suspending, broadcast not active: {:?}", self.phase());
        }
        self.continuation.on_suspend(
            &mut self.host,
            self.broadcasting,
            advertising,
            CYCLING_POWER_SERVICE_UUID,
        );
    }

    /// Host resumed foreground execution.
    pub fn on_resume(&mut self) {
        self.continuation.on_resume(&mut self.host);
    }

    /// Process teardown.
    pub fn shutdown(&mut self) {
        if matches!(self.state, ServiceState::Stopped) {
            return;
        }
        self.end_broadcast();
        self.continuation.on_resume(&mut self.host);
        self.subscribers.clear();
        self.state = ServiceState::Stopped;
        info!("emulator stopped");
    }

    // Broadcast timer

    /// Fire the broadcast if due. Returns the tick that ran, if any.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        let tick = self.scheduler.poll(now)?;
        self.broadcast(tick);
        Some(tick)
    }

    fn broadcast(&mut self, tick: Tick) {
        let Some(characteristic) = self.state.characteristic() else {
            warn!("tick {} without a registered characteristic", tick.sequence);
            return;
        };

        let watts = self.power.get();
        let payload = cps::encode(watts);

        if let Err(e) = self.host.set_value(characteristic, &payload) {
            warn!("characteristic value not updated: {:?}", e);
        }
        match self.host.notify(characteristic, &payload) {
            Ok(()) => debug!("broadcast {} W", watts),
            Err(e) => warn!("broadcast of {} W failed: {:?}", watts, e),
        }
    }

    // Internals

    fn register(&mut self) {
        if self.state.characteristic().is_some() {
            return;
        }
        match self.host.register_service(&CYCLING_POWER_SERVICE) {
            Ok(characteristic) => {
                info!("service {:#x} registered", CYCLING_POWER_SERVICE.service_uuid);
                self.state = ServiceState::Registered(characteristic);
            }
            Err(e) => {
                error!("service registration failed: {:?}", e);
                self.state = ServiceState::RadioOff;
            }
        }
    }

    fn begin_broadcast(&mut self, now: Instant) {
        let characteristic = match self.state {
            ServiceState::Advertising(_) => {
                debug!("already advertising, restarting timer");
                self.scheduler.start(now);
                return;
            }
            ServiceState::Registered(c) => c,
            _ => return,
        };

        if let Err(e) = self.host.start_advertising(CYCLING_POWER_SERVICE_UUID) {
            warn!("advertising not started: {:?}", e);
        }
        self.scheduler.start(now);
        self.state = ServiceState::Advertising(characteristic);
    }

    fn end_broadcast(&mut self) {
        self.scheduler.stop();
        if let ServiceState::Advertising(c) = self.state {
            self.host.stop_advertising();
            self.state = ServiceState::Registered(c);
        }
    }
}
