//! Cycling Power Service peripheral emulator.
//!
//! The library holds everything that does not touch hardware: the power
//! value, the measurement encoder, the service/advertising state machine,
//! the broadcast timer and the suspend bookkeeping. It is `no_std` on the
//! target and plain `std` under `cargo test`, so the whole state machine
//! runs on the host against a recording double of the BLE stack.
//!
//! Usage: `cargo test` (host) or `cargo run --release --features embedded
//! --target thumbv7em-none-eabihf` (nRF52840 + S140).
//!
//! The firmware in `main.rs` provides the real
//! [`PeripheralHost`](host::PeripheralHost) on top of nrf-softdevice and
//! drives a [`SharedEmulator`] from its tasks.

#![cfg_attr(not(test), no_std)]

// Must stay first: the logging macros are textually scoped.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Core
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod continuation;
pub mod cps;
pub mod emulator;
pub mod error;
pub mod host;
pub mod scheduler;
pub mod shared;
pub mod subscribers;
pub mod watts;

#[cfg(test)]
mod test_support;

// ═══════════════════════════════════════════════════════════════════════════
// Pure helpers shared with the firmware modules
// ═══════════════════════════════════════════════════════════════════════════

#[path = "ble/adv_data.rs"]
mod ble_adv_data_impl;
#[path = "ble/links.rs"]
mod ble_links_impl;
#[path = "power_logic.rs"]
mod power_logic_impl;
#[path = "ui/input_logic.rs"]
mod ui_input_logic_impl;

pub mod ble {
    pub mod adv_data {
        pub use crate::ble_adv_data_impl::*;
    }
    pub mod links {
        pub use crate::ble_links_impl::*;
    }
}

pub mod ui {
    pub mod input_logic {
        pub use crate::ui_input_logic_impl::*;
    }

    pub use input_logic::ButtonEvent;
}

pub mod power_logic {
    pub use crate::power_logic_impl::*;
}

pub use emulator::{Emulator, Phase, ServiceState, Stimulus};
pub use error::{Error, HostError};
pub use shared::SharedEmulator;
pub use subscribers::CentralId;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - cross-module wiring
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CYCLING_POWER_SERVICE_UUID, DEVICE_NAME, POWER_STEP_WATTS};
    use crate::host::RadioState;
    use crate::test_support::{RecordingHost, RecordingSink};
    use crate::ui::ButtonEvent;
    use embassy_time::Instant;

    #[test]
    fn buttons_drive_the_emulator() {
        let mut emu = Emulator::new(RecordingHost::new(), RecordingSink::default());
        emu.initialize();
        emu.on_radio_state(RadioState::PoweredOn, Instant::from_millis(0));

        for event in [ButtonEvent::Up, ButtonEvent::Up, ButtonEvent::Down] {
            emu.apply(ui::input_logic::stimulus_for(event), Instant::from_millis(0));
        }
        assert_eq!(emu.power(), POWER_STEP_WATTS);

        emu.apply(
            ui::input_logic::stimulus_for(ButtonEvent::Select),
            Instant::from_millis(0),
        );
        assert!(emu.is_broadcasting());
        assert_eq!(emu.phase(), Phase::Advertising);
    }

    #[test]
    fn advertising_payload_matches_the_registered_service() {
        let adv = ble::adv_data::advertising_payload();
        assert!(ble::adv_data::contains_service_uuid16(
            &adv,
            CYCLING_POWER_SERVICE_UUID
        ));
        assert_eq!(ble::adv_data::extract_device_name(&adv).as_str(), DEVICE_NAME);
    }
}
