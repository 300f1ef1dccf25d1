//! Peripheral-role tasks.
//!
//! - `advertiser_task`: advertises while the emulator asks for it and
//!   hands each new connection to a `connection_task`.
//! - `connection_task`: runs the GATT server for one central and turns
//!   CCCD writes and disconnects into subscribe / unsubscribe events.
//! - `broadcast_task`: sleeps until the emulator's next deadline and
//!   polls it. Paused while the power manager is in low power.

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Timer};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::Softdevice;

use wattsim::ble::adv_data;
use wattsim::config::{ADV_INTERVAL, MAX_SUBSCRIBERS};
use wattsim::CentralId;

use super::gatt::{CyclingPowerServiceEvent, Server, ServerEvent};
use super::{host, Shared};
use crate::power;

/// Back-off after a failed advertising attempt (e.g. no free link).
const ADV_RETRY: Duration = Duration::from_secs(1);

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
pub async fn advertiser_task(
    spawner: Spawner,
    sd: &'static Softdevice,
    server: &'static Server,
    emu: &'static Shared,
) -> ! {
    let adv = adv_data::advertising_payload();
    let config = peripheral::Config {
        interval: ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        if !host::advertising_requested() {
            host::set_advertising_running(false);
            host::advertising_changed().await;
            continue;
        }

        let advertisement = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv,
            scan_data: &[],
        };

        host::set_advertising_running(true);
        info!("advertising");

        // Dropping the advertise future stops advertising.
        match select(
            peripheral::advertise_connectable(sd, advertisement, &config),
            host::advertising_changed(),
        )
        .await
        {
            Either::First(Ok(conn)) => {
                if spawner.spawn(connection_task(server, emu, conn)).is_err() {
                    warn!("no connection slot left, dropping link");
                }
            }
            Either::First(Err(e)) => {
                host::set_advertising_running(false);
                warn!("advertising failed: {:?}", e);
                select(Timer::after(ADV_RETRY), host::advertising_changed()).await;
            }
            Either::Second(()) => {
                info!("advertising request changed");
            }
        }
    }
}

#[embassy_executor::task(pool_size = MAX_SUBSCRIBERS)]
async fn connection_task(server: &'static Server, emu: &'static Shared, conn: Connection) {
    let Some(handle) = conn.handle() else {
        return;
    };
    let central = CentralId(handle);

    if !host::link_opened(handle, &conn) {
        warn!("link table full, ignoring central {}", handle);
        return;
    }
    info!("central {} connected", handle);

    let reason = gatt_server::run(&conn, server, |e| match e {
        ServerEvent::Cps(CyclingPowerServiceEvent::MeasurementCccdWrite { notifications }) => {
            info!("central {} notifications: {}", handle, notifications);
            host::set_subscribed(handle, notifications);
            emu.lock(|emu| {
                if notifications {
                    emu.on_subscribe(central);
                } else {
                    emu.on_unsubscribe(central);
                }
            });
        }
    })
    .await;

    info!("central {} disconnected: {:?}", handle, reason);
    host::link_closed(handle);
    emu.lock(|emu| emu.on_unsubscribe(central));
}

/// Fire the broadcast timer on schedule.
#[embassy_executor::task]
pub async fn broadcast_task(emu: &'static Shared) -> ! {
    loop {
        if !power::broadcast_allowed() {
            info!("broadcast paused in low power");
            power::broadcast_resumed().await;
        }

        let Some(deadline) = emu.next_deadline() else {
            emu.schedule_changed().await;
            continue;
        };

        if let Either::First(()) = select(Timer::at(deadline), emu.schedule_changed()).await {
            if power::broadcast_allowed() {
                emu.poll(Instant::now());
            }
        }
    }
}

/// Spawn everything BLE. `sd` must already be enabled.
pub fn spawn(spawner: Spawner, sd: &'static Softdevice, server: &'static Server, emu: &'static Shared) {
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(advertiser_task(spawner, sd, server, emu)));
    unwrap!(spawner.spawn(broadcast_task(emu)));
}
