//! Cycling Power Measurement characteristic value (0x2A63).
//!
//! Layout (6 bytes, all fields little-endian):
//! ```text
//! Byte 0-1: Flags                       (always 0x0000, no optional fields)
//! Byte 2-3: Instantaneous Power (watts) (u16)
//! Byte 4-5: Accumulated Energy          (always 0x0000)
//! ```
//!
//! Only the mandatory fields are emitted. Crank/wheel revolution data,
//! pedal balance and the rest of the optional fields are never signaled.

/// Measurement payload size in bytes.
pub const MEASUREMENT_SIZE: usize = 6;

/// Flags value sent on the wire: no optional sub-fields present.
pub const MEASUREMENT_FLAGS: u16 = 0x0000;

/// A Cycling Power Measurement as notified to subscribed centrals.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerMeasurement {
    /// Flags field.
    pub flags: u16,
    /// Instantaneous power in watts.
    pub instantaneous_power: u16,
    /// Accumulated energy (kJ).
    pub accumulated_energy: u16,
}

impl PowerMeasurement {
    /// Measurement carrying `watts` with zero flags and zero energy.
    pub const fn from_watts(watts: u16) -> Self {
        Self {
            flags: MEASUREMENT_FLAGS,
            instantaneous_power: watts,
            accumulated_energy: 0,
        }
    }

    /// Parse a notification payload the way a central would.
    ///
    /// Needs at least the 4 mandatory bytes; the energy field is read when
    /// present and the rest is ignored.
    pub fn from_ble_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        Some(Self {
            flags: u16::from_le_bytes([data[0], data[1]]),
            instantaneous_power: u16::from_le_bytes([data[2], data[3]]),
            accumulated_energy: if data.len() >= MEASUREMENT_SIZE {
                u16::from_le_bytes([data[4], data[5]])
            } else {
                0
            },
        })
    }

    /// Serialise into a byte slice for a GATT notification.
    /// Returns the number of bytes written (0 if `buf` is too small).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < MEASUREMENT_SIZE {
            return 0;
        }
        buf[0..2].copy_from_slice(&self.flags.to_le_bytes());
        buf[2..4].copy_from_slice(&self.instantaneous_power.to_le_bytes());
        buf[4..6].copy_from_slice(&self.accumulated_energy.to_le_bytes());
        MEASUREMENT_SIZE
    }

    /// Fixed-size wire representation.
    pub fn to_bytes(&self) -> [u8; MEASUREMENT_SIZE] {
        let mut out = [0u8; MEASUREMENT_SIZE];
        self.serialize(&mut out);
        out
    }
}

/// Encode the current power value into the 6-byte characteristic value.
pub fn encode(watts: u16) -> [u8; MEASUREMENT_SIZE] {
    PowerMeasurement::from_watts(watts).to_bytes()
}
