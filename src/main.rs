//! wattsim - BLE Cycling Power Service emulator for the nRF52840.
//!
//! Advertises the Cycling Power Service and notifies a power
//! measurement every 2 s while broadcasting. Buttons 1/2 change the
//! emulated power, button 3 toggles broadcasting, LED 1 shows it.
//!
//! ## Task layout
//!
//! ```text
//!  buttons ──▶ BUTTONS ──▶ ui_task ──┐
//!                                    ├──▶ SharedEmulator ──▶ FirmwareHost ──▶ SoftDevice
//!  advertiser / connection tasks ────┤          │
//!  power_task (suspend / resume) ────┘          ▼
//!                                        broadcast_task (2 s timer)
//! ```

#![no_std]
#![no_main]

mod ble;
mod power;
mod ui;

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive, Pin};
use embassy_nrf::interrupt::Priority;
use embassy_time::Instant;
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ble::gatt::Server;
use ble::{FirmwareHost, Shared};
use ui::status_led::StatusLed;
use ui::ButtonEvent;
use wattsim::config::{DEVICE_NAME, MAX_SUBSCRIBERS};
use wattsim::host::RadioState;
use wattsim::{Emulator, SharedEmulator};

static SERVER: StaticCell<Server> = StaticCell::new();
static EMULATOR: StaticCell<Shared> = StaticCell::new();

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: MAX_SUBSCRIBERS as u8,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: MAX_SUBSCRIBERS as u8,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as *const u8 as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_USER as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("wattsim starting");

    // The SoftDevice owns priorities 0, 1 and 4.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let led = Output::new(p.P0_13, Level::High, OutputDrive::Standard);

    let sd = Softdevice::enable(&softdevice_config());
    let server: &'static Server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;

    let emu: &'static Shared = EMULATOR.init(SharedEmulator::new(Emulator::new(
        FirmwareHost::new(server),
        StatusLed::new(led),
    )));

    ble::peripheral::spawn(spawner, sd, server, emu);

    // An enabled SoftDevice means the radio is up.
    emu.lock(|emu| {
        emu.initialize();
        emu.on_radio_state(RadioState::PoweredOn, Instant::now());
    });

    unwrap!(spawner.spawn(ui::buttons::button_task(p.P0_11.degrade(), ButtonEvent::Up)));
    unwrap!(spawner.spawn(ui::buttons::button_task(p.P0_12.degrade(), ButtonEvent::Down)));
    unwrap!(spawner.spawn(ui::buttons::button_task(p.P0_24.degrade(), ButtonEvent::Select)));
    unwrap!(spawner.spawn(ui::ui_task(emu)));
    unwrap!(spawner.spawn(power::power_task(emu)));

    info!("wattsim ready, press button 3 to start broadcasting");
}
