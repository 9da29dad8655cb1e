use std::time::Duration;

use crate::{
    config::{Profile, SimulatorConfig},
    jitter::Jitter,
    params::ParameterSet,
    protocol::Record,
};

/// 16-bit wraparound space of BLE event timestamps
const EVENT_TIME_MODULUS: u64 = 65_536;

/// Crank event timestamps tick at 1/1024 s
const CRANK_TICKS_PER_MINUTE: f64 = 60.0 * 1024.0;

/// Kilometers per statute mile
const KM_PER_MILE: f64 = 1.60934;

/// Convert a running speed in mi/h to the RSC wire unit of m/s
#[must_use]
pub fn miles_per_hour_to_meters_per_second(mph: f64) -> f64 {
    mph * KM_PER_MILE / 3.6
}

/// Cumulative revolution counters and the last emitted event timestamp
///
/// Created once per counter-bearing profile and mutated only by that
/// profile's encoder; counters are monotone for the process lifetime and are
/// never reset. `prev_event_time` is the last emitted 16-bit timestamp and
/// `prev_event_interval` the per-revolution interval it was computed with,
/// which together let the encoder keep the timeline consistent when the
/// interval changes between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterState {
    /// Cumulative crank revolutions
    pub stroke_count: u32,
    /// Cumulative wheel revolutions
    pub wheel_count: u32,
    /// Last emitted crank event time, 1/1024 s, wraps at 65536
    pub prev_event_time: u16,
    /// Crank event interval `prev_event_time` was computed with
    pub prev_event_interval: u16,
}

/// One scheduler tick: the record to deliver and when to run again
#[derive(Debug, Clone)]
pub struct Tick {
    /// Telemetry record for the sink
    pub record: Record,
    /// Delay before this profile's next tick
    pub next_delay: Duration,
}

/// Converts parameter snapshots into wraparound-correct telemetry records
///
/// An encoder is a pure function of the parameter snapshot, its own
/// [`CounterState`] and the injected jitter: it never fails, and degenerate
/// inputs (zero cadence, zero speed) become gated hold states instead of
/// errors.
#[derive(Debug)]
pub struct Encoder {
    profile: Profile,
    counters: CounterState,
}

impl Encoder {
    /// Create an encoder for one profile with fresh counters
    #[must_use]
    pub const fn new(profile: Profile) -> Self {
        Self {
            profile,
            counters: CounterState {
                stroke_count: 0,
                wheel_count: 0,
                prev_event_time: 0,
                prev_event_interval: 0,
            },
        }
    }

    /// Profile this encoder serves
    #[must_use]
    pub const fn profile(&self) -> Profile {
        self.profile
    }

    /// Current counter state
    #[must_use]
    pub const fn counters(&self) -> &CounterState {
        &self.counters
    }

    /// Produce the record for one tick and the delay until the next one
    ///
    /// `hr_noise` is the latest low-frequency heart-rate noise offset; the
    /// tick reads it without recomputing it.
    pub fn tick(
        &mut self,
        params: &ParameterSet,
        jitter: &mut Jitter,
        hr_noise: i32,
        config: &SimulatorConfig,
    ) -> Tick {
        match self.profile {
            Profile::CyclingPower => self.power_only(params, jitter, config),
            Profile::CyclingPowerCadence => self.power_cadence(params, jitter, config),
            Profile::CyclingPowerCombined => self.combined(params, jitter, config),
            Profile::IndoorBike => self.indoor_bike(params, jitter, hr_noise, config),
            Profile::RunningSpeedCadence => self.running(params, jitter, config),
            Profile::HeartRate => self.heart_rate(params, hr_noise, config),
        }
    }

    fn power_only(
        &mut self,
        params: &ParameterSet,
        jitter: &mut Jitter,
        config: &SimulatorConfig,
    ) -> Tick {
        let watts = jitter.value(params.power, params.power_randomness);
        Tick {
            record: Record::CyclingPower { watts },
            next_delay: config.notification_interval,
        }
    }

    /// Power plus crank revolution data, notified at the crank's own rate
    ///
    /// One crank revolution per notification, so the inter-notification
    /// delay is the (jittered) crank period itself. A parked crank holds
    /// the counter and event time; the unchanged cumulative value is the
    /// wire-level stopped marker, and the hold path falls back to the fixed
    /// notification interval.
    fn power_cadence(
        &mut self,
        params: &ParameterSet,
        jitter: &mut Jitter,
        config: &SimulatorConfig,
    ) -> Tick {
        let watts = jitter.value(params.power, params.power_randomness);

        if params.cadence <= 0 {
            return Tick {
                record: Record::CyclingPowerCadence {
                    watts,
                    crank_revs: self.counters.stroke_count,
                    crank_event_time: self.counters.prev_event_time,
                },
                next_delay: config.notification_interval,
            };
        }

        let rpm = jitter.value(params.cadence, params.cadence_randomness);
        let interval = crank_event_interval(rpm);
        self.counters.stroke_count += 1;
        self.counters.prev_event_time = self.counters.prev_event_time.wrapping_add(interval);
        self.counters.prev_event_interval = interval;

        Tick {
            record: Record::CyclingPowerCadence {
                watts,
                crank_revs: self.counters.stroke_count,
                crank_event_time: self.counters.prev_event_time,
            },
            next_delay: Duration::from_millis(60_000 / u64::from(rpm.unsigned_abs())),
        }
    }

    /// Power with crank and wheel revolution data at a fixed rate
    ///
    /// The crank timeline follows the counter-correction rule: while the
    /// per-revolution interval is stable the stroke count advances by one
    /// revolution per tick; when a cadence edit changes the interval, the
    /// event time implied by the stroke count is measured against the
    /// previous timestamp modulo 65536, and an implied elapse of more than
    /// one full period folds the excess into whole revolutions so a client
    /// never sees the timestamp skip or run backward.
    fn combined(
        &mut self,
        params: &ParameterSet,
        jitter: &mut Jitter,
        config: &SimulatorConfig,
    ) -> Tick {
        let watts = jitter.value(params.power, params.power_randomness);
        let speed = params.power_meter_speed;

        let wheel_event_interval = if speed > 0.0 {
            self.counters.wheel_count += 1;
            wheel_interval(config.wheel_circumference_mm, config.wheel_timestamp_unit, speed)
        } else {
            0
        };

        let crank_event_interval = if params.cadence > 0 {
            let interval = crank_event_interval(params.cadence);
            self.advance_crank(interval);
            interval
        } else {
            self.counters.prev_event_interval
        };

        Tick {
            record: Record::CyclingPowerCombined {
                watts,
                crank_revs: self.counters.stroke_count,
                wheel_revs: self.counters.wheel_count,
                wheel_event_interval,
                crank_event_interval,
                crank_event_time: self.counters.prev_event_time,
                cadence_rpm: params.cadence.max(0),
                speed_kmh: speed.max(0.0),
            },
            next_delay: config.notification_interval,
        }
    }

    /// Counter-correction for the combined profile's crank timeline
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn advance_crank(&mut self, interval: u16) {
        let counters = &mut self.counters;
        if interval == counters.prev_event_interval {
            counters.stroke_count += 1;
            counters.prev_event_time = counters.prev_event_time.wrapping_add(interval);
            return;
        }

        let candidate =
            ((u64::from(counters.stroke_count) * u64::from(interval)) % EVENT_TIME_MODULUS) as u16;
        let elapsed = candidate.wrapping_sub(counters.prev_event_time);
        let ratio = f64::from(elapsed) / f64::from(interval);
        if ratio > 1.0 {
            // The recomputed timestamp ran ahead of the new interval; fold
            // the excess into whole revolutions and let exactly one period
            // elapse on the wire.
            counters.stroke_count += ratio.round() as u32;
            counters.prev_event_time = counters.prev_event_time.wrapping_add(interval);
        } else {
            counters.prev_event_time = candidate;
        }
        counters.prev_event_interval = interval;
    }

    fn indoor_bike(
        &mut self,
        params: &ParameterSet,
        jitter: &mut Jitter,
        hr_noise: i32,
        config: &SimulatorConfig,
    ) -> Tick {
        let live = params.cadence > 0 && params.power > 0;
        let watts = if live {
            jitter.value(params.power, params.power_randomness)
        } else {
            0
        };
        let cadence_rpm = if live {
            jitter.value(params.cadence, params.cadence_randomness)
        } else {
            0
        };
        let heart_rate = params.reporting_heart_rate().map(|bpm| bpm + hr_noise);

        Tick {
            record: Record::IndoorBike {
                watts,
                cadence_rpm,
                heart_rate,
            },
            next_delay: config.notification_interval,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn running(
        &mut self,
        params: &ParameterSet,
        jitter: &mut Jitter,
        config: &SimulatorConfig,
    ) -> Tick {
        let speed_ms =
            miles_per_hour_to_meters_per_second(jitter.value_f64(params.running_speed, 1.0));
        let cadence_spm = jitter.value_f64(params.running_cadence, 2.0).floor() as i32;

        Tick {
            record: Record::RunningSpeedCadence {
                speed_ms,
                cadence_spm,
            },
            next_delay: config.notification_interval,
        }
    }

    fn heart_rate(&mut self, params: &ParameterSet, hr_noise: i32, config: &SimulatorConfig) -> Tick {
        let bpm = params
            .reporting_heart_rate()
            .map_or(0, |bpm| (bpm + hr_noise).max(0));

        Tick {
            record: Record::HeartRate { bpm },
            next_delay: config.notification_interval,
        }
    }
}

/// Crank event interval in 1/1024 s for a cadence in RPM
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn crank_event_interval(rpm: i32) -> u16 {
    let ticks = (CRANK_TICKS_PER_MINUTE / f64::from(rpm.max(1))).round();
    if ticks >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        ticks as u16
    }
}

/// Wheel event interval in wheel-timestamp ticks per revolution
///
/// `circumference_mm * unit * 3600 / (1_000_000 * speed_kmh)`, rounded.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn wheel_interval(circumference_mm: u32, unit: u32, speed_kmh: f64) -> u16 {
    let ticks =
        (f64::from(circumference_mm) * f64::from(unit) * 3600.0 / (1_000_000.0 * speed_kmh)).round();
    if ticks >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        ticks as u16
    }
}
