use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SimulatorError};

/// Upper clamp for cycling cadence edits (RPM)
pub const CADENCE_MAX: i32 = 200;

/// Upper clamp for cycling power edits (Watts)
pub const POWER_MAX: i32 = 2500;

/// Upper clamp for heart rate edits (bpm)
pub const HEART_RATE_MAX: i32 = 190;

/// Heart rates below this floor mean the emulated belt is not reporting
///
/// Decrementing the heart rate through this floor is how an operator parks
/// the belt: the FTMS encoder omits its heart-rate field and the heart-rate
/// profile emits 0 bpm until the value is raised back above the floor.
pub const HEART_RATE_FLOOR: i32 = 80;

/// Live-adjustable physical quantities that drive every profile encoder
///
/// Created once at startup with the defaults below, mutated only by
/// [`ParamEdit`]s for the lifetime of the process. Every bounded field stays
/// inside its declared range after every edit; edits clamp rather than
/// reject, so applying one can never fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Crank cadence in RPM, clamped to [0, 200]
    pub cadence: i32,
    /// Rider power in Watts, clamped to [0, 2500]
    pub power: i32,
    /// Wheel speed reported by the power meter in km/h, floored at 0
    pub power_meter_speed: f64,
    /// Running speed in mi/h, floored at 0
    pub running_speed: f64,
    /// Running cadence in steps per minute, floored at 0
    pub running_cadence: f64,
    /// Heart rate in bpm; ceiling 190, not reporting below [`HEART_RATE_FLOOR`]
    pub heart_rate: i32,
    /// Jitter spread applied to power (and power-meter speed), floored at 0
    pub power_randomness: i32,
    /// Jitter spread applied to cycling cadence, floored at 0
    pub cadence_randomness: i32,
    /// Spread of the low-frequency heart-rate noise offset, floored at 0
    pub heart_rate_randomness: i32,
    /// Step applied by discrete edits, floored at 1
    pub increment: i32,
    /// Step applied by running-field and speed edits
    pub running_increment: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            cadence: 90,
            power: 100,
            power_meter_speed: 18.0,
            running_speed: 10.0,
            running_cadence: 180.0,
            heart_rate: 140,
            power_randomness: 50,
            cadence_randomness: 5,
            heart_rate_randomness: 10,
            increment: 10,
            running_increment: 0.5,
        }
    }
}

/// Field addressed by an edit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamField {
    /// Cycling cadence
    Cadence,
    /// Cycling power
    Power,
    /// Running speed and power-meter speed together
    Speed,
    /// Running cadence
    RunningCadence,
    /// Heart rate
    HeartRate,
    /// Power/speed jitter spread
    PowerRandomness,
    /// Cadence jitter spread
    CadenceRandomness,
    /// Heart-rate noise spread
    HeartRateRandomness,
    /// Edit step size
    Increment,
}

/// Direction of an edit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Increase the field by its step
    Up,
    /// Decrease the field by its step
    Down,
}

/// One discrete edit from the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEdit {
    /// Field to adjust
    pub field: ParamField,
    /// Direction to move it
    pub direction: Direction,
}

impl ParamEdit {
    /// Create an edit event
    #[must_use]
    pub const fn new(field: ParamField, direction: Direction) -> Self {
        Self { field, direction }
    }

    /// Map one of the reference tool's keyboard bindings to a typed edit
    ///
    /// Lowercase decreases, uppercase increases: `c` cadence, `p` power,
    /// `s` speed, `d` running cadence, `h` heart rate, `r` power/speed
    /// randomness, `t` cadence randomness, `n` heart-rate randomness,
    /// `i` increment.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::InvalidEdit`] for any unbound key.
    pub fn from_key(key: char) -> Result<Self> {
        let direction = if key.is_ascii_uppercase() {
            Direction::Up
        } else {
            Direction::Down
        };
        let field = match key.to_ascii_lowercase() {
            'c' => ParamField::Cadence,
            'p' => ParamField::Power,
            's' => ParamField::Speed,
            'd' => ParamField::RunningCadence,
            'h' => ParamField::HeartRate,
            'r' => ParamField::PowerRandomness,
            't' => ParamField::CadenceRandomness,
            'n' => ParamField::HeartRateRandomness,
            'i' => ParamField::Increment,
            _ => {
                return Err(SimulatorError::InvalidEdit {
                    command: key.to_string(),
                })
            }
        };
        Ok(Self::new(field, direction))
    }
}

impl ParameterSet {
    /// Apply one edit, clamping the target field into its declared range
    ///
    /// Edits are synchronous and total; the updated value is immediately
    /// visible to the next encoder read.
    pub fn apply(&mut self, edit: ParamEdit) {
        let step = match edit.direction {
            Direction::Up => self.increment,
            Direction::Down => -self.increment,
        };
        let run_step = match edit.direction {
            Direction::Up => self.running_increment,
            Direction::Down => -self.running_increment,
        };

        match edit.field {
            ParamField::Cadence => {
                self.cadence = (self.cadence + step).clamp(0, CADENCE_MAX);
            }
            ParamField::Power => {
                self.power = (self.power + step).clamp(0, POWER_MAX);
            }
            ParamField::Speed => {
                // One control moves both speed-bearing fields, like the
                // reference tool's s/S key.
                self.running_speed = (self.running_speed + run_step).max(0.0);
                self.power_meter_speed = (self.power_meter_speed + run_step).max(0.0);
            }
            ParamField::RunningCadence => {
                self.running_cadence = (self.running_cadence + run_step).max(0.0);
            }
            ParamField::HeartRate => {
                self.heart_rate = (self.heart_rate + step).clamp(0, HEART_RATE_MAX);
            }
            ParamField::PowerRandomness => {
                self.power_randomness = (self.power_randomness + step).max(0);
            }
            ParamField::CadenceRandomness => {
                self.cadence_randomness = (self.cadence_randomness + step).max(0);
            }
            ParamField::HeartRateRandomness => {
                self.heart_rate_randomness = (self.heart_rate_randomness + step).max(0);
            }
            ParamField::Increment => {
                self.increment = (self.increment + step.signum()).max(1);
            }
        }
    }

    /// Heart rate the emulated belt currently reports, if any
    #[must_use]
    pub const fn reporting_heart_rate(&self) -> Option<i32> {
        if self.heart_rate >= HEART_RATE_FLOOR {
            Some(self.heart_rate)
        } else {
            None
        }
    }

    /// Running pace in `mm:ss` minutes per mile
    #[must_use]
    pub fn pace_minutes_per_mile(&self) -> String {
        if self.running_speed <= 0.0 {
            return "00:00".to_string();
        }
        let pace = 60.0 / self.running_speed;
        let minutes = pace.floor();
        let seconds = ((pace - minutes) * 60.0).floor();
        format!("{minutes:02.0}:{seconds:02.0}")
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sensor parameters:")?;
        writeln!(f)?;
        writeln!(f, "Cycling:")?;
        writeln!(f, "    Cadence: {} RPM", self.cadence)?;
        writeln!(f, "      Power: {} W", self.power)?;
        writeln!(f, "      Speed: {} km/h", self.power_meter_speed)?;
        writeln!(f)?;
        writeln!(f, "Running:")?;
        writeln!(
            f,
            "    Speed: {} mi/h, Pace: {} min/mi",
            self.running_speed,
            self.pace_minutes_per_mile()
        )?;
        writeln!(f, "    Cadence: {} steps/min", self.running_cadence.floor())?;
        writeln!(f)?;
        match self.reporting_heart_rate() {
            Some(bpm) => writeln!(f, "Heart rate: {bpm} bpm")?,
            None => writeln!(f, "Heart rate: not reporting")?,
        }
        writeln!(f, "Power/Speed randomness: {}", self.power_randomness)?;
        writeln!(f, "Cadence randomness: {}", self.cadence_randomness)?;
        writeln!(f, "Heart rate randomness: {}", self.heart_rate_randomness)?;
        writeln!(f, "Increment: {}", self.increment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_cadence_clamps_at_bounds() {
        let mut params = ParameterSet {
            cadence: 195,
            ..Default::default()
        };
        params.apply(ParamEdit::new(ParamField::Cadence, Direction::Up));
        assert_eq!(params.cadence, CADENCE_MAX);

        params.cadence = 5;
        params.apply(ParamEdit::new(ParamField::Cadence, Direction::Down));
        assert_eq!(params.cadence, 0);
    }

    #[test]
    fn test_power_clamps_at_bounds() {
        let mut params = ParameterSet {
            power: 2495,
            ..Default::default()
        };
        params.apply(ParamEdit::new(ParamField::Power, Direction::Up));
        assert_eq!(params.power, POWER_MAX);

        params.power = 5;
        params.apply(ParamEdit::new(ParamField::Power, Direction::Down));
        assert_eq!(params.power, 0);
    }

    #[test]
    fn test_speed_edit_moves_both_speed_fields() {
        let mut params = ParameterSet::default();
        params.apply(ParamEdit::new(ParamField::Speed, Direction::Up));
        assert!((params.running_speed - 10.5).abs() < f64::EPSILON);
        assert!((params.power_meter_speed - 18.5).abs() < f64::EPSILON);

        params.running_speed = 0.2;
        params.power_meter_speed = 0.2;
        params.apply(ParamEdit::new(ParamField::Speed, Direction::Down));
        assert_eq!(params.running_speed, 0.0);
        assert_eq!(params.power_meter_speed, 0.0);
    }

    #[test]
    fn test_increment_moves_by_one_and_floors() {
        let mut params = ParameterSet {
            increment: 1,
            ..Default::default()
        };
        params.apply(ParamEdit::new(ParamField::Increment, Direction::Down));
        assert_eq!(params.increment, 1);

        params.apply(ParamEdit::new(ParamField::Increment, Direction::Up));
        assert_eq!(params.increment, 2);
    }

    #[test]
    fn test_randomness_floors_at_zero() {
        let mut params = ParameterSet {
            power_randomness: 5,
            cadence_randomness: 0,
            heart_rate_randomness: 3,
            ..Default::default()
        };
        params.apply(ParamEdit::new(ParamField::PowerRandomness, Direction::Down));
        params.apply(ParamEdit::new(ParamField::CadenceRandomness, Direction::Down));
        params.apply(ParamEdit::new(ParamField::HeartRateRandomness, Direction::Down));
        assert_eq!(params.power_randomness, 0);
        assert_eq!(params.cadence_randomness, 0);
        assert_eq!(params.heart_rate_randomness, 0);
    }

    #[test]
    fn test_heart_rate_reporting_floor() {
        let mut params = ParameterSet {
            heart_rate: 85,
            increment: 10,
            ..Default::default()
        };
        assert_eq!(params.reporting_heart_rate(), Some(85));

        params.apply(ParamEdit::new(ParamField::HeartRate, Direction::Down));
        assert_eq!(params.heart_rate, 75);
        assert_eq!(params.reporting_heart_rate(), None);

        params.heart_rate = 185;
        params.apply(ParamEdit::new(ParamField::HeartRate, Direction::Up));
        assert_eq!(params.heart_rate, HEART_RATE_MAX);
    }

    #[test]
    fn test_bounds_hold_under_random_edit_sequences() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let fields = [
            ParamField::Cadence,
            ParamField::Power,
            ParamField::Speed,
            ParamField::RunningCadence,
            ParamField::HeartRate,
            ParamField::PowerRandomness,
            ParamField::CadenceRandomness,
            ParamField::HeartRateRandomness,
            ParamField::Increment,
        ];

        let mut params = ParameterSet::default();
        for _ in 0..10_000 {
            let field = fields[rng.random_range(0..fields.len())];
            let direction = if rng.random::<bool>() {
                Direction::Up
            } else {
                Direction::Down
            };
            params.apply(ParamEdit::new(field, direction));

            assert!((0..=CADENCE_MAX).contains(&params.cadence));
            assert!((0..=POWER_MAX).contains(&params.power));
            assert!((0..=HEART_RATE_MAX).contains(&params.heart_rate));
            assert!(params.power_meter_speed >= 0.0);
            assert!(params.running_speed >= 0.0);
            assert!(params.running_cadence >= 0.0);
            assert!(params.power_randomness >= 0);
            assert!(params.cadence_randomness >= 0);
            assert!(params.heart_rate_randomness >= 0);
            assert!(params.increment >= 1);
        }
    }

    #[test]
    fn test_key_bindings() {
        let edit = ParamEdit::from_key('C').unwrap();
        assert_eq!(edit.field, ParamField::Cadence);
        assert_eq!(edit.direction, Direction::Up);

        let edit = ParamEdit::from_key('p').unwrap();
        assert_eq!(edit.field, ParamField::Power);
        assert_eq!(edit.direction, Direction::Down);

        assert!(ParamEdit::from_key('z').is_err());
        assert!(ParamEdit::from_key('7').is_err());
    }

    #[test]
    fn test_dump_reflects_latest_state() {
        let mut params = ParameterSet::default();
        params.apply(ParamEdit::new(ParamField::Power, Direction::Up));

        let dump = params.to_string();
        assert!(dump.contains("Power: 110 W"));
        assert!(dump.contains("Pace: 06:00 min/mi"));
        assert!(dump.contains("Increment: 10"));

        params.heart_rate = 60;
        assert!(params.to_string().contains("not reporting"));
    }

    #[test]
    fn test_pace_formatting() {
        let mut params = ParameterSet {
            running_speed: 8.0,
            ..Default::default()
        };
        assert_eq!(params.pace_minutes_per_mile(), "07:30");

        params.running_speed = 0.0;
        assert_eq!(params.pace_minutes_per_mile(), "00:00");
    }
}
