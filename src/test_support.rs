//! Host doubles shared by the unit tests.

use crate::error::{Error, HostError};
use crate::host::{PeripheralHost, ServiceDescriptor, StatusSink};

/// Characteristic handle handed out by [`RecordingHost`].
pub const MEASUREMENT_HANDLE: u16 = 0x000C;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Register(u16, u16),
    StartAdvertising(u16),
    StopAdvertising,
    SetValue(Vec<u8>),
    Notify(Vec<u8>),
    RequestContinuation,
    ReleaseContinuation(u32),
}

/// Records every call; failures are switched on per field.
#[derive(Default)]
pub struct RecordingHost {
    pub calls: Vec<Call>,
    pub advertising: bool,
    pub fail_register: bool,
    pub fail_advertising: bool,
    pub fail_notify: bool,
    pub deny_continuation: bool,
    next_grant: u32,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn notifications(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Notify(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl PeripheralHost for RecordingHost {
    type Characteristic = u16;
    type Grant = u32;

    fn register_service(&mut self, service: &ServiceDescriptor) -> Result<u16, Error> {
        self.calls.push(Call::Register(
            service.service_uuid,
            service.characteristic_uuid,
        ));
        if self.fail_register {
            return Err(HostError::RegistrationFailed.into());
        }
        Ok(MEASUREMENT_HANDLE)
    }

    fn start_advertising(&mut self, service_uuid: u16) -> Result<(), Error> {
        self.calls.push(Call::StartAdvertising(service_uuid));
        if self.fail_advertising {
            return Err(HostError::AdvertisingFailed.into());
        }
        self.advertising = true;
        Ok(())
    }

    fn stop_advertising(&mut self) {
        self.calls.push(Call::StopAdvertising);
        self.advertising = false;
    }

    fn is_advertising(&self) -> bool {
        self.advertising
    }

    fn set_value(&mut self, _characteristic: u16, value: &[u8]) -> Result<(), Error> {
        self.calls.push(Call::SetValue(value.to_vec()));
        Ok(())
    }

    fn notify(&mut self, characteristic: u16, value: &[u8]) -> Result<(), Error> {
        assert_eq!(characteristic, MEASUREMENT_HANDLE);
        self.calls.push(Call::Notify(value.to_vec()));
        if self.fail_notify {
            return Err(HostError::NotifyFailed.into());
        }
        Ok(())
    }

    fn request_continuation(&mut self) -> Result<u32, Error> {
        self.calls.push(Call::RequestContinuation);
        if self.deny_continuation {
            return Err(HostError::ContinuationDenied.into());
        }
        self.next_grant += 1;
        Ok(self.next_grant)
    }

    fn release_continuation(&mut self, grant: u32) {
        self.calls.push(Call::ReleaseContinuation(grant));
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub powers: Vec<u16>,
    pub broadcasting: Vec<bool>,
}

impl StatusSink for RecordingSink {
    fn power_changed(&mut self, watts: u16) {
        self.powers.push(watts);
    }

    fn broadcasting_changed(&mut self, broadcasting: bool) {
        self.broadcasting.push(broadcasting);
    }
}
