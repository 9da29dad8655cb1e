use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Profile;

/// Bluetooth base UUID with the 16-bit slot zeroed
const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// Expand a 16-bit Bluetooth SIG assigned number into a full 128-bit UUID
#[must_use]
pub const fn bluetooth_uuid(assigned: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((assigned as u128) << 96))
}

/// Cycling Power Measurement flag: wheel revolution data present
const CP_FLAG_WHEEL_REV_DATA: u16 = 1 << 4;

/// Cycling Power Measurement flag: crank revolution data present
const CP_FLAG_CRANK_REV_DATA: u16 = 1 << 5;

// Indoor Bike Data flag word (FTMS v1.0, Table 4.9). Bit 0 is "More Data":
// the instantaneous speed field is present when it is CLEAR.
const BIKE_FLAG_INST_CADENCE: u16 = 1 << 2;
const BIKE_FLAG_INST_POWER: u16 = 1 << 6;
const BIKE_FLAG_HEART_RATE: u16 = 1 << 9;

/// One telemetry notification, one variant per profile
///
/// Records are immutable value objects built fresh on every scheduler tick;
/// each carries exactly the fields its profile's measurement characteristic
/// defines. [`Record::to_bytes`] produces the little-endian wire payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// Cycling Power Measurement, power only
    CyclingPower {
        /// Instantaneous power in Watts
        watts: i32,
    },
    /// Cycling Power Measurement with crank revolution data
    CyclingPowerCadence {
        /// Instantaneous power in Watts
        watts: i32,
        /// Cumulative crank revolutions
        crank_revs: u32,
        /// Last crank event time, 1/1024 s, wraps at 65536
        crank_event_time: u16,
    },
    /// Cycling Power Measurement with crank and wheel revolution data
    CyclingPowerCombined {
        /// Instantaneous power in Watts
        watts: i32,
        /// Cumulative crank revolutions
        crank_revs: u32,
        /// Cumulative wheel revolutions
        wheel_revs: u32,
        /// Wheel event interval, 1/2048 s per revolution
        wheel_event_interval: u16,
        /// Crank event interval, 1/1024 s per revolution
        crank_event_interval: u16,
        /// Last crank event time, 1/1024 s, wraps at 65536
        crank_event_time: u16,
        /// Live crank cadence in RPM
        cadence_rpm: i32,
        /// Live wheel speed in km/h
        speed_kmh: f64,
    },
    /// FTMS Indoor Bike Data
    IndoorBike {
        /// Instantaneous power in Watts, 0 while the rider is coasting
        watts: i32,
        /// Instantaneous cadence in RPM, 0 while the rider is coasting
        cadence_rpm: i32,
        /// Heart rate in bpm; `None` when the belt is not reporting
        heart_rate: Option<i32>,
    },
    /// RSC Measurement
    RunningSpeedCadence {
        /// Instantaneous speed in m/s
        speed_ms: f64,
        /// Instantaneous cadence in steps per minute
        cadence_spm: i32,
    },
    /// Heart Rate Measurement
    HeartRate {
        /// Heart rate in bpm, 0 while the belt is not reporting
        bpm: i32,
    },
}

impl Record {
    /// Profile this record belongs to
    #[must_use]
    pub const fn profile(&self) -> Profile {
        match self {
            Self::CyclingPower { .. } => Profile::CyclingPower,
            Self::CyclingPowerCadence { .. } => Profile::CyclingPowerCadence,
            Self::CyclingPowerCombined { .. } => Profile::CyclingPowerCombined,
            Self::IndoorBike { .. } => Profile::IndoorBike,
            Self::RunningSpeedCadence { .. } => Profile::RunningSpeedCadence,
            Self::HeartRate { .. } => Profile::HeartRate,
        }
    }

    /// Encode the measurement characteristic payload, little-endian
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(16);

        match *self {
            Self::CyclingPower { watts } => {
                buf.put_u16_le(0);
                buf.put_i16_le(clamp_i16(watts));
            }
            Self::CyclingPowerCadence {
                watts,
                crank_revs,
                crank_event_time,
            } => {
                buf.put_u16_le(CP_FLAG_CRANK_REV_DATA);
                buf.put_i16_le(clamp_i16(watts));
                buf.put_u16_le(truncate_u16(crank_revs));
                buf.put_u16_le(crank_event_time);
            }
            Self::CyclingPowerCombined {
                watts,
                crank_revs,
                wheel_revs,
                wheel_event_interval,
                crank_event_time,
                ..
            } => {
                buf.put_u16_le(CP_FLAG_WHEEL_REV_DATA | CP_FLAG_CRANK_REV_DATA);
                buf.put_i16_le(clamp_i16(watts));
                buf.put_u32_le(wheel_revs);
                buf.put_u16_le(wheel_event_time(wheel_revs, wheel_event_interval));
                buf.put_u16_le(truncate_u16(crank_revs));
                buf.put_u16_le(crank_event_time);
            }
            Self::IndoorBike {
                watts,
                cadence_rpm,
                heart_rate,
            } => {
                let mut flags = BIKE_FLAG_INST_CADENCE | BIKE_FLAG_INST_POWER;
                if heart_rate.is_some() {
                    flags |= BIKE_FLAG_HEART_RATE;
                }
                buf.put_u16_le(flags);
                // Instantaneous speed is mandatory while More Data is clear;
                // this profile does not simulate bike speed.
                buf.put_u16_le(0);
                // 0.5 RPM resolution
                buf.put_u16_le(truncate_u16(u32::try_from(cadence_rpm.max(0) * 2).unwrap_or(0)));
                buf.put_i16_le(clamp_i16(watts));
                if let Some(bpm) = heart_rate {
                    buf.put_u8(clamp_u8(bpm));
                }
            }
            Self::RunningSpeedCadence {
                speed_ms,
                cadence_spm,
            } => {
                buf.put_u8(0);
                // 1/256 m/s resolution
                buf.put_u16_le(speed_to_wire(speed_ms));
                buf.put_u8(clamp_u8(cadence_spm));
            }
            Self::HeartRate { bpm } => {
                buf.put_u8(0);
                buf.put_u8(clamp_u8(bpm));
            }
        }

        buf.freeze()
    }
}

/// Last wheel event time implied by the cumulative count and interval
fn wheel_event_time(wheel_revs: u32, interval: u16) -> u16 {
    truncate_u16(((u64::from(wheel_revs) * u64::from(interval)) % 65_536) as u32)
}

#[allow(clippy::cast_possible_truncation)]
fn speed_to_wire(speed_ms: f64) -> u16 {
    let ticks = (speed_ms.max(0.0) * 256.0).round();
    if ticks >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        ticks as u16
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn clamp_i16(value: i32) -> i16 {
    if value > i16::MAX as i32 {
        i16::MAX
    } else if value < i16::MIN as i32 {
        i16::MIN
    } else {
        value as i16
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn clamp_u8(value: i32) -> u8 {
    if value > u8::MAX as i32 {
        u8::MAX
    } else if value < 0 {
        0
    } else {
        value as u8
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn truncate_u16(value: u32) -> u16 {
    (value & 0xFFFF) as u16
}
