//! Unified error type for wattsim.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! None of these are fatal: the emulator logs them and waits for the
//! next natural event (radio ready, next tick, next stimulus).

use core::fmt;

/// Top-level error type used across the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The host stack refused or failed an operation.
    Host(HostError),

    /// Every subscriber slot is taken.
    RegistryFull,
}

/// Subset of host stack failures we propagate (keeps the enum `Copy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostError {
    /// Raw SoftDevice error code (`NRF_ERROR_*` / `BLE_ERROR_*`).
    Raw(u32),
    /// Adding the GATT service failed.
    RegistrationFailed,
    /// Advertising could not start.
    AdvertisingFailed,
    /// The characteristic value could not be updated.
    SetValueFailed,
    /// No central received the notification.
    NotifyFailed,
    /// The host would not grant extra run time.
    ContinuationDenied,
}

// Convenience conversions

impl From<HostError> for Error {
    fn from(e: HostError) -> Self {
        Error::Host(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Host(e) => write!(f, "host stack error: {e}"),
            Error::RegistryFull => f.write_str("subscriber registry full"),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Raw(code) => write!(f, "raw error {code:#x}"),
            HostError::RegistrationFailed => f.write_str("service registration failed"),
            HostError::AdvertisingFailed => f.write_str("advertising failed"),
            HostError::SetValueFailed => f.write_str("set value failed"),
            HostError::NotifyFailed => f.write_str("notify failed"),
            HostError::ContinuationDenied => f.write_str("continuation denied"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_converts_into_error() {
        let e: Error = HostError::NotifyFailed.into();
        assert_eq!(e, Error::Host(HostError::NotifyFailed));
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(Error::RegistryFull.to_string(), "subscriber registry full");
        assert_eq!(
            Error::Host(HostError::Raw(0x3002)).to_string(),
            "host stack error: raw error 0x3002"
        );
    }
}
