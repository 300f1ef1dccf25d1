//! User interface subsystem - physical buttons + status LED.
//!
//! ## Components
//!
//! - **Buttons**: 3 tactile switches with debouncing (UP, DOWN, SELECT)
//! - **Status LED**: lit while broadcasting is requested
//!
//! Button events go through [`BUTTONS`] to [`ui_task`], which applies
//! them to the emulator and reports the activity to the power manager.

pub mod buttons;
pub mod status_led;

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;

use crate::ble::Shared;
use crate::power;
pub use wattsim::ui::input_logic::{stimulus_for, ButtonEvent};

/// Debounced button presses, in order.
pub static BUTTONS: Channel<CriticalSectionRawMutex, ButtonEvent, 4> = Channel::new();

#[embassy_executor::task]
pub async fn ui_task(emu: &'static Shared) -> ! {
    let rx = BUTTONS.receiver();
    loop {
        let event = rx.receive().await;
        power::note_activity();

        let stimulus = stimulus_for(event);
        let watts = emu.lock(|emu| {
            emu.apply(stimulus, Instant::now());
            emu.power()
        });
        info!("UI: {} -> {} W", event, watts);
    }
}
