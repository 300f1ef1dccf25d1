//! Legacy advertising payload: build ours, inspect anyone's.
//!
//! Each AD structure is `[len, type, data...]` where `len` counts the type
//! byte plus the data.

use heapless::{String, Vec};

use crate::config::{CYCLING_POWER_SERVICE_UUID, DEVICE_NAME};

/// Legacy advertising PDUs carry at most 31 bytes of AD structures.
pub const MAX_ADV_LEN: usize = 31;

const AD_FLAGS: u8 = 0x01;
const AD_UUID16_INCOMPLETE: u8 = 0x02;
const AD_UUID16_COMPLETE: u8 = 0x03;
const AD_NAME_SHORT: u8 = 0x08;
const AD_NAME_COMPLETE: u8 = 0x09;

/// LE General Discoverable, BR/EDR not supported.
const FLAGS_GENERAL_DISCOVERABLE: u8 = 0x06;

pub type AdvPayload = Vec<u8, MAX_ADV_LEN>;

/// Flags, the Cycling Power service UUID and the device name.
pub fn advertising_payload() -> AdvPayload {
    build_payload(CYCLING_POWER_SERVICE_UUID, DEVICE_NAME)
}

/// Build a payload advertising `service_uuid` under `name`.
///
/// A name that does not fit is cut and sent as a shortened local name.
pub fn build_payload(service_uuid: u16, name: &str) -> AdvPayload {
    let mut adv = Vec::new();
    let uuid = service_uuid.to_le_bytes();

    // Fixed part: 3 + 4 bytes, always fits.
    let _ = adv.extend_from_slice(&[0x02, AD_FLAGS, FLAGS_GENERAL_DISCOVERABLE]);
    let _ = adv.extend_from_slice(&[0x03, AD_UUID16_COMPLETE, uuid[0], uuid[1]]);

    let room = MAX_ADV_LEN - adv.len() - 2;
    if room == 0 || name.is_empty() {
        return adv;
    }
    let (bytes, ad_type) = if name.len() <= room {
        (name.as_bytes(), AD_NAME_COMPLETE)
    } else {
        (&name.as_bytes()[..room], AD_NAME_SHORT)
    };
    let _ = adv.push(bytes.len() as u8 + 1);
    let _ = adv.push(ad_type);
    let _ = adv.extend_from_slice(bytes);
    adv
}

/// Iterate over `(type, data)` of well-formed AD structures.
fn structures(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 0;
    core::iter::from_fn(move || {
        let len = *data.get(i)? as usize;
        if len == 0 || i + len >= data.len() {
            return None;
        }
        let item = (data[i + 1], &data[i + 2..i + 1 + len]);
        i += len + 1;
        Some(item)
    })
}

/// Check if raw advertisement data lists `uuid` as a 16-bit service UUID.
pub fn contains_service_uuid16(data: &[u8], uuid: u16) -> bool {
    let wanted = uuid.to_le_bytes();
    structures(data)
        .filter(|(ad_type, _)| matches!(*ad_type, AD_UUID16_INCOMPLETE | AD_UUID16_COMPLETE))
        .any(|(_, uuids)| uuids.chunks_exact(2).any(|chunk| chunk == wanted))
}

/// Extract complete/shortened local name from advertisement data.
pub fn extract_device_name(data: &[u8]) -> String<32> {
    let mut name = String::new();
    match structures(data).find(|(ad_type, _)| matches!(*ad_type, AD_NAME_SHORT | AD_NAME_COMPLETE)) {
        Some((_, bytes)) => {
            for &b in bytes {
                if name.push(b as char).is_err() {
                    break;
                }
            }
        }
        None => {
            let _ = name.push_str("Unknown");
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_payload_layout() {
        let adv = advertising_payload();
        assert_eq!(&adv[..7], &[0x02, 0x01, 0x06, 0x03, 0x03, 0x18, 0x18]);
        assert_eq!(adv[7] as usize, DEVICE_NAME.len() + 1);
        assert_eq!(adv[8], AD_NAME_COMPLETE);
        assert_eq!(&adv[9..], DEVICE_NAME.as_bytes());
    }

    #[test]
    fn finds_cycling_power_uuid() {
        let adv = advertising_payload();
        assert!(contains_service_uuid16(&adv, 0x1818));
        assert!(!contains_service_uuid16(&adv, 0x1812));
    }

    #[test]
    fn long_name_is_shortened() {
        let name = "a-very-long-trainer-name-that-overflows";
        let adv = build_payload(0x1818, name);
        assert_eq!(adv.len(), MAX_ADV_LEN);
        assert_eq!(adv[8], AD_NAME_SHORT);
        assert_eq!(extract_device_name(&adv).as_str(), &name[..22]);
    }

    #[test]
    fn empty_name_is_omitted() {
        let adv = build_payload(0x1818, "");
        assert_eq!(adv.len(), 7);
        assert_eq!(extract_device_name(&adv).as_str(), "Unknown");
    }

    #[test]
    fn truncated_structure_is_ignored() {
        // UUID list claims 5 bytes but only 2 follow.
        let data = [0x05, 0x03, 0x18, 0x18];
        assert!(!contains_service_uuid16(&data, 0x1818));
    }

    #[test]
    fn zero_length_terminates() {
        let data = [0x00, 0x03, 0x03, 0x18, 0x18];
        assert!(!contains_service_uuid16(&data, 0x1818));
    }

    #[test]
    fn incomplete_uuid_list_counts() {
        let data = [0x05, 0x02, 0x0D, 0x18, 0x18, 0x18];
        assert!(contains_service_uuid16(&data, 0x1818));
    }
}
