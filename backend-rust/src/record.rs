//! The normalized record handed from the connection FSM (C4) to a sink (C6).

use chrono::Utc;
use chrono_tz::Tz;
use codec8_wire::AvlRecord;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord {
    pub imei: String,
    pub timestamp_ms: u64,
    pub priority: u8,
    pub longitude: i32,
    pub latitude: i32,
    pub altitude: i32,
    pub angle: i32,
    pub satellite_count: i8,
    pub speed: u16,
    pub event_id: u8,
    pub server_timestamp_iso: String,
}

impl DeviceRecord {
    /// Builds a `DeviceRecord` from a decoded `AvlRecord`, stamping the
    /// delivery-time wallclock in `zone` (falls back to the default
    /// Asia/Jakarta zone if `zone` doesn't name a real IANA timezone).
    pub fn from_avl(imei: &str, record: &AvlRecord, zone: &str) -> Self {
        let tz: Tz = zone.parse().unwrap_or(chrono_tz::Asia::Jakarta);
        let server_timestamp_iso = Utc::now()
            .with_timezone(&tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        Self {
            imei: imei.to_string(),
            timestamp_ms: record.timestamp_ms,
            priority: record.priority.as_u8(),
            longitude: record.longitude,
            latitude: record.latitude,
            altitude: record.altitude,
            angle: record.angle,
            satellite_count: record.satellite_count,
            speed: record.speed,
            event_id: record.event_id,
            server_timestamp_iso,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec8_wire::Priority;

    #[test]
    fn unknown_timezone_falls_back_to_jakarta() {
        let avl = AvlRecord {
            timestamp_ms: 1,
            priority: Priority::Low,
            longitude: 0,
            latitude: 0,
            altitude: 0,
            angle: 0,
            satellite_count: 0,
            speed: 0,
            event_id: 0,
            io_elements: vec![],
        };
        let record = DeviceRecord::from_avl("356307042441013", &avl, "Not/A_Zone");
        assert_eq!(record.imei, "356307042441013");
        assert!(!record.server_timestamp_iso.is_empty());
    }
}
