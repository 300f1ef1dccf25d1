//! Seams between the emulator core and its collaborators.
//!
//! [`PeripheralHost`] is the BLE peripheral stack (SoftDevice on the
//! device, a recording double in tests). [`StatusSink`] is whatever shows
//! the current value and the broadcasting indicator to the user.
//!
//! Host *events* flow the other way, as method calls on
//! [`Emulator`](crate::emulator::Emulator).

use crate::config::{CYCLING_POWER_MEASUREMENT_UUID, CYCLING_POWER_SERVICE_UUID};
use crate::error::Error;

/// Radio power state as reported by the host stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioState {
    PoweredOn,
    PoweredOff,
    /// Unsupported, unauthorised or resetting; treated like off.
    Unavailable,
}

/// Characteristic property bits that matter to the emulated service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Properties {
    pub read: bool,
    pub notify: bool,
}

/// Immutable description of the GATT service to register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceDescriptor {
    pub service_uuid: u16,
    pub characteristic_uuid: u16,
    pub primary: bool,
    pub properties: Properties,
    /// Attribute permission: readable without authentication.
    pub readable: bool,
}

/// The one service this emulator presents.
pub const CYCLING_POWER_SERVICE: ServiceDescriptor = ServiceDescriptor {
    service_uuid: CYCLING_POWER_SERVICE_UUID,
    characteristic_uuid: CYCLING_POWER_MEASUREMENT_UUID,
    primary: true,
    properties: Properties {
        read: true,
        notify: true,
    },
    readable: true,
};

/// Operations the emulator needs from the BLE peripheral stack.
///
/// Every method is synchronous and must not block: the emulator calls
/// them while holding its state lock.
pub trait PeripheralHost {
    /// Handle of the registered measurement characteristic.
    type Characteristic: Copy;
    /// Proof of an extended-execution grant, handed back on release.
    type Grant;

    /// Add the service and its characteristic to the GATT table.
    fn register_service(
        &mut self,
        service: &ServiceDescriptor,
    ) -> Result<Self::Characteristic, Error>;

    /// Start advertising `service_uuid`. Idempotent on the host side.
    fn start_advertising(&mut self, service_uuid: u16) -> Result<(), Error>;

    fn stop_advertising(&mut self);

    /// Whether the host is actually advertising right now.
    fn is_advertising(&self) -> bool;

    /// Update the stored value returned to read requests.
    fn set_value(&mut self, characteristic: Self::Characteristic, value: &[u8])
        -> Result<(), Error>;

    /// Push `value` to every subscribed central. Fire-and-forget.
    fn notify(&mut self, characteristic: Self::Characteristic, value: &[u8]) -> Result<(), Error>;

    /// Ask for extra run time while the host would otherwise suspend.
    fn request_continuation(&mut self) -> Result<Self::Grant, Error>;

    fn release_continuation(&mut self, grant: Self::Grant);
}

/// Receives what the user should see.
pub trait StatusSink {
    fn power_changed(&mut self, watts: u16);

    /// Reflects the *requested* state, not whether the radio succeeds.
    fn broadcasting_changed(&mut self, broadcasting: bool);
}

/// Sink that drops everything, for headless use.
impl StatusSink for () {
    fn power_changed(&mut self, _watts: u16) {}
    fn broadcasting_changed(&mut self, _broadcasting: bool) {}
}
