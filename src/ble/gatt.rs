//! GATT table: the Cycling Power Service with its measurement
//! characteristic, registered on the SoftDevice by `Server::new`.

use wattsim::cps::MEASUREMENT_SIZE;

#[nrf_softdevice::gatt_service(uuid = "1818")]
pub struct CyclingPowerService {
    #[characteristic(uuid = "2a63", read, notify)]
    pub measurement: [u8; MEASUREMENT_SIZE],
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub cps: CyclingPowerService,
}
