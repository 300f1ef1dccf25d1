use crate::config::POWER_STEP_WATTS;
use crate::emulator::Stimulus;

/// Physical button events (after debouncing).
///
///   - UP: more watts
///   - DOWN: fewer watts
///   - SELECT: broadcasting on/off
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    Up,
    Down,
    Select,
}

/// Map a button press onto the emulator.
pub fn stimulus_for(event: ButtonEvent) -> Stimulus {
    match event {
        ButtonEvent::Up => Stimulus::Increment(POWER_STEP_WATTS),
        ButtonEvent::Down => Stimulus::Decrement(POWER_STEP_WATTS),
        ButtonEvent::Select => Stimulus::ToggleBroadcasting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_and_down_use_the_same_step() {
        assert_eq!(stimulus_for(ButtonEvent::Up), Stimulus::Increment(5));
        assert_eq!(stimulus_for(ButtonEvent::Down), Stimulus::Decrement(5));
    }

    #[test]
    fn select_toggles() {
        assert_eq!(stimulus_for(ButtonEvent::Select), Stimulus::ToggleBroadcasting);
    }
}
