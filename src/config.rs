//! Application-wide constants and compile-time configuration.
//!
//! Protocol identifiers, timing parameters and hardware assignments live
//! here so they can be tuned in one place.

use embassy_time::Duration;

// BLE / GATT

/// Cycling Power Service (Bluetooth SIG assigned number).
pub const CYCLING_POWER_SERVICE_UUID: u16 = 0x1818;

/// Cycling Power Measurement characteristic.
pub const CYCLING_POWER_MEASUREMENT_UUID: u16 = 0x2A63;

/// GAP device name, also placed in the advertising payload.
pub const DEVICE_NAME: &str = "wattsim";

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const ADV_INTERVAL: u32 = 160;

/// Maximum number of centrals tracked as subscribers.
/// Matches the peripheral link count configured on the SoftDevice.
pub const MAX_SUBSCRIBERS: usize = 2;

// Broadcasting

/// Period between two measurement notifications.
pub const BROADCAST_PERIOD: Duration = Duration::from_secs(2);

/// Watts added/removed per button press.
pub const POWER_STEP_WATTS: u16 = 5;

// GPIO pin assignments (nRF52840-DK defaults)
//
// Logical names only; the `embassy_nrf::peripherals::*` pins are picked
// in `main.rs`.
//
//   Button 1 (+ watts)     → P0.11
//   Button 2 (- watts)     → P0.12
//   Button 3 (broadcast)   → P0.24
//   LED 1 (broadcasting)   → P0.13

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

// Power management

/// Inactivity before the device is considered idle (seconds).
pub const IDLE_TIMEOUT_SECS: u64 = 60;

/// Inactivity before the device wants to suspend into low power (seconds).
pub const SUSPEND_TIMEOUT_SECS: u64 = 120;

/// How often the power manager re-evaluates its state.
pub const POWER_POLL_INTERVAL: Duration = Duration::from_secs(1);
