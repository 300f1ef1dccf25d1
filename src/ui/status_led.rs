//! Status output: LED 1 shows the broadcasting request, the value goes
//! to the log.

use defmt::info;
use embassy_nrf::gpio::Output;
use wattsim::host::StatusSink;

/// DK LEDs are active-low.
pub struct StatusLed {
    led: Output<'static>,
}

impl StatusLed {
    pub fn new(led: Output<'static>) -> Self {
        Self { led }
    }
}

impl StatusSink for StatusLed {
    fn power_changed(&mut self, watts: u16) {
        info!("power: {} W", watts);
    }

    fn broadcasting_changed(&mut self, broadcasting: bool) {
        if broadcasting {
            self.led.set_low();
        } else {
            self.led.set_high();
        }
    }
}
