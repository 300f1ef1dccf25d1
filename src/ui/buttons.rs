//! GPIO button input with async debouncing.
//!
//! Three physical buttons (active-low with internal pull-up):
//!   - UP     - add watts
//!   - DOWN   - remove watts
//!   - SELECT - broadcasting on/off
//!
//! Each button is handled by an async task that waits for a GPIO edge,
//! debounces it, and sends a `ButtonEvent` to the UI channel.

use defmt::debug;
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Timer};

use super::{ButtonEvent, BUTTONS};
use wattsim::config::BUTTON_DEBOUNCE_MS;

/// One task per button.
#[embassy_executor::task(pool_size = 3)]
pub async fn button_task(pin: AnyPin, event: ButtonEvent) -> ! {
    let mut btn = Input::new(pin, Pull::Up);
    let tx = BUTTONS.sender();

    loop {
        btn.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            debug!("Button: {}", event);
            tx.send(event).await;

            // Wait for release to avoid repeat triggers.
            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }
    }
}
