//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **GATT server** - the Cycling Power Service (0x1818) with its
//!    measurement characteristic (0x2A63, read + notify).
//! 2. **Host** - [`FirmwareHost`], the emulator's view of the SoftDevice.
//! 3. **Tasks** - advertiser, per-connection GATT event loop and the
//!    broadcast loop that fires the emulator's timer.
//!
//! The advertising payload builder lives in the library
//! (`wattsim::ble::adv_data`) so it can be tested on the host.

pub mod gatt;
pub mod host;
pub mod peripheral;

pub use host::FirmwareHost;

use crate::ui::status_led::StatusLed;
use wattsim::SharedEmulator;

/// The emulator as shared between all firmware tasks.
pub type Shared = SharedEmulator<FirmwareHost, StatusLed>;
