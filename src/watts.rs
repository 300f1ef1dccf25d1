//! Instantaneous power value shown to the user and encoded on each tick.
//!
//! Stored as `u16` so it is non-negative by construction and always fits
//! the measurement field. Decrements floor at 0; increments saturate at
//! 65535 and report the clamp so the caller can warn.

/// Outcome of a single adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Adjustment {
    /// The value moved by the full delta.
    Changed(u16),
    /// The value hit a bound and moved by less than the delta
    /// (possibly not at all).
    Clamped(u16),
}

impl Adjustment {
    /// Value after the adjustment.
    pub fn value(self) -> u16 {
        match self {
            Adjustment::Changed(v) | Adjustment::Clamped(v) => v,
        }
    }

    pub fn is_clamped(self) -> bool {
        matches!(self, Adjustment::Clamped(_))
    }
}

/// Current power in watts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PowerStore {
    watts: u16,
}

impl PowerStore {
    /// Starts at 0 W.
    pub const fn new() -> Self {
        Self { watts: 0 }
    }

    pub fn get(&self) -> u16 {
        self.watts
    }

    /// Add `delta` watts, saturating at `u16::MAX`.
    pub fn increment(&mut self, delta: u16) -> Adjustment {
        match self.watts.checked_add(delta) {
            Some(v) => {
                self.watts = v;
                Adjustment::Changed(v)
            }
            None => {
                self.watts = u16::MAX;
                Adjustment::Clamped(u16::MAX)
            }
        }
    }

    /// Remove `delta` watts: `max(0, current - delta)`.
    pub fn decrement(&mut self, delta: u16) -> Adjustment {
        match self.watts.checked_sub(delta) {
            Some(v) => {
                self.watts = v;
                Adjustment::Changed(v)
            }
            None => {
                self.watts = 0;
                Adjustment::Clamped(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(PowerStore::new().get(), 0);
    }

    #[test]
    fn three_coarse_increments() {
        let mut store = PowerStore::new();
        for _ in 0..3 {
            store.increment(5);
        }
        assert_eq!(store.get(), 15);
    }

    #[test]
    fn decrement_floors_at_zero() {
        let mut store = PowerStore::new();
        store.increment(3);
        assert_eq!(store.decrement(5), Adjustment::Clamped(0));
        assert_eq!(store.get(), 0);
    }

    #[test]
    fn decrement_at_zero_is_clamped_noop() {
        let mut store = PowerStore::new();
        assert!(store.decrement(1).is_clamped());
        assert_eq!(store.get(), 0);
    }

    #[test]
    fn increment_saturates_at_u16_max() {
        let mut store = PowerStore::new();
        store.increment(u16::MAX - 2);
        assert_eq!(store.increment(5), Adjustment::Clamped(u16::MAX));
        assert_eq!(store.increment(1).value(), u16::MAX);
    }

    #[test]
    fn mixed_sequence_never_goes_negative() {
        let mut store = PowerStore::new();
        let mut model: i32 = 0;
        let steps: [(bool, u16); 10] = [
            (true, 5),
            (false, 1),
            (false, 5),
            (false, 5),
            (true, 1),
            (true, 5),
            (false, 1),
            (true, 5),
            (false, 5),
            (false, 5),
        ];
        for (up, delta) in steps {
            if up {
                store.increment(delta);
                model += i32::from(delta);
            } else {
                store.decrement(delta);
                model = (model - i32::from(delta)).max(0);
            }
            assert_eq!(i32::from(store.get()), model);
        }
    }
}
