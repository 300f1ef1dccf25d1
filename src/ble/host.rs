//! [`PeripheralHost`] on top of nrf-softdevice.
//!
//! The emulator calls in here while holding its lock, so nothing may
//! await. Advertising is only *requested* here; the advertiser task picks
//! the request up. Connected links are tracked so a notification reaches
//! every central that enabled the CCCD.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::gatt_server::{NotifyValueError, SetValueError};
use nrf_softdevice::ble::Connection;

use wattsim::config::{CYCLING_POWER_MEASUREMENT_UUID, CYCLING_POWER_SERVICE_UUID, MAX_SUBSCRIBERS};
use wattsim::ble::links::LinkTable;
use wattsim::cps::MEASUREMENT_SIZE;
use wattsim::host::{PeripheralHost, ServiceDescriptor};
use wattsim::{Error, HostError};

use super::gatt::Server;

/// Advertising requested by the emulator.
static ADV_REQUESTED: AtomicBool = AtomicBool::new(false);
/// Advertiser task is currently inside `advertise_connectable`.
static ADV_RUNNING: AtomicBool = AtomicBool::new(false);
/// Raised whenever `ADV_REQUESTED` changes.
static ADV_CONTROL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Continuation grant held: the power manager must not enter low power.
static KEEP_AWAKE: AtomicBool = AtomicBool::new(false);

static LINKS: Mutex<CriticalSectionRawMutex, RefCell<LinkTable<Connection, MAX_SUBSCRIBERS>>> =
    Mutex::new(RefCell::new(LinkTable::new()));

// ═══════════════════════════════════════════════════════════════════════════
// Advertiser / power manager side
// ═══════════════════════════════════════════════════════════════════════════

pub fn advertising_requested() -> bool {
    ADV_REQUESTED.load(Ordering::Acquire)
}

pub fn set_advertising_running(running: bool) {
    ADV_RUNNING.store(running, Ordering::Release);
}

/// Wait for the next start/stop request.
pub async fn advertising_changed() {
    ADV_CONTROL.wait().await
}

pub fn keep_awake() -> bool {
    KEEP_AWAKE.load(Ordering::Acquire)
}

// ═══════════════════════════════════════════════════════════════════════════
// Link table
// ═══════════════════════════════════════════════════════════════════════════

/// Track a new connection. Returns `false` if the table is full.
pub fn link_opened(handle: u16, conn: &Connection) -> bool {
    LINKS.lock(|links| links.borrow_mut().open(handle, conn.clone()))
}

/// `handle` is the one the link had when it opened; the connection itself
/// no longer reports it once disconnected.
pub fn link_closed(handle: u16) {
    // Dropping the clone releases the SoftDevice connection slot.
    let conn = LINKS.lock(|links| links.borrow_mut().close(handle));
    if conn.is_none() {
        debug!("link {} was not tracked", handle);
    }
}

pub fn set_subscribed(handle: u16, subscribed: bool) {
    LINKS.lock(|links| {
        if !links.borrow_mut().set_subscribed(handle, subscribed) {
            warn!("CCCD write from untracked link {}", handle);
        }
    });
}

// ═══════════════════════════════════════════════════════════════════════════
// Host implementation
// ═══════════════════════════════════════════════════════════════════════════

/// The measurement characteristic of [`Server`]; the table has only one.
#[derive(Clone, Copy)]
pub struct Measurement;

/// Proof that [`KEEP_AWAKE`] is held by us.
pub struct KeepAwake(());

pub struct FirmwareHost {
    server: &'static Server,
}

impl FirmwareHost {
    pub const fn new(server: &'static Server) -> Self {
        Self { server }
    }
}

impl PeripheralHost for FirmwareHost {
    type Characteristic = Measurement;
    type Grant = KeepAwake;

    /// The GATT table is fixed at `Server::new`; only check that the
    /// requested service is the one it holds.
    fn register_service(&mut self, service: &ServiceDescriptor) -> Result<Measurement, Error> {
        if service.service_uuid != CYCLING_POWER_SERVICE_UUID
            || service.characteristic_uuid != CYCLING_POWER_MEASUREMENT_UUID
            || !service.properties.notify
        {
            return Err(HostError::RegistrationFailed.into());
        }
        Ok(Measurement)
    }

    fn start_advertising(&mut self, service_uuid: u16) -> Result<(), Error> {
        if service_uuid != CYCLING_POWER_SERVICE_UUID {
            return Err(HostError::AdvertisingFailed.into());
        }
        ADV_REQUESTED.store(true, Ordering::Release);
        ADV_CONTROL.signal(());
        Ok(())
    }

    fn stop_advertising(&mut self) {
        ADV_REQUESTED.store(false, Ordering::Release);
        ADV_CONTROL.signal(());
    }

    fn is_advertising(&self) -> bool {
        ADV_RUNNING.load(Ordering::Acquire)
    }

    fn set_value(&mut self, _: Measurement, value: &[u8]) -> Result<(), Error> {
        let value: [u8; MEASUREMENT_SIZE] = value
            .try_into()
            .map_err(|_| HostError::SetValueFailed)?;
        self.server.cps.measurement_set(&value).map_err(|e| {
            warn!("measurement_set: {:?}", e);
            match e {
                SetValueError::Raw(raw) => HostError::Raw(raw as u32).into(),
                _ => HostError::SetValueFailed.into(),
            }
        })
    }

    fn notify(&mut self, _: Measurement, value: &[u8]) -> Result<(), Error> {
        let value: [u8; MEASUREMENT_SIZE] = value
            .try_into()
            .map_err(|_| HostError::NotifyFailed)?;

        LINKS.lock(|links| {
            let mut sent = 0usize;
            let mut last_error = None;
            for (handle, conn) in links.borrow().subscribed() {
                match self.server.cps.measurement_notify(conn, &value) {
                    Ok(()) => sent += 1,
                    Err(e) => {
                        warn!("notify {}: {:?}", handle, e);
                        last_error = Some(match e {
                            NotifyValueError::Raw(raw) => HostError::Raw(raw as u32),
                            _ => HostError::NotifyFailed,
                        });
                    }
                }
            }
            debug!("notified {} central(s)", sent);

            match last_error {
                Some(e) if sent == 0 => Err(e.into()),
                _ => Ok(()),
            }
        })
    }

    fn request_continuation(&mut self) -> Result<KeepAwake, Error> {
        if KEEP_AWAKE.swap(true, Ordering::AcqRel) {
            return Err(HostError::ContinuationDenied.into());
        }
        info!("keep-awake held");
        Ok(KeepAwake(()))
    }

    fn release_continuation(&mut self, _grant: KeepAwake) {
        KEEP_AWAKE.store(false, Ordering::Release);
        info!("keep-awake released");
    }
}
