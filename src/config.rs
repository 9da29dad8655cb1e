use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

use crate::error::SimulatorError;

/// A fitness profile the emulator can broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    /// Cycling Power Service, instantaneous power only
    CyclingPower,
    /// Cycling Power Service with crank revolution data
    CyclingPowerCadence,
    /// Cycling Power Service with crank and wheel revolution data
    CyclingPowerCombined,
    /// Fitness Machine Service indoor bike
    IndoorBike,
    /// Running Speed and Cadence
    RunningSpeedCadence,
    /// Heart Rate Service
    HeartRate,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CyclingPower => write!(f, "cycling power"),
            Self::CyclingPowerCadence => write!(f, "cycling power + cadence"),
            Self::CyclingPowerCombined => write!(f, "cycling power + cadence + speed"),
            Self::IndoorBike => write!(f, "indoor bike"),
            Self::RunningSpeedCadence => write!(f, "running speed and cadence"),
            Self::HeartRate => write!(f, "heart rate"),
        }
    }
}

/// Profile families requested at startup
///
/// Parsed once from the token list the reference tool takes on its command
/// line (`ftms`, `rsc`, `hrm`, and `csp` with its `power`/`cadence`/`speed`
/// combinators) and never changed afterwards. [`Capabilities::profiles`]
/// resolves the combination to the concrete encoder set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Fitness Machine Service indoor bike
    pub ftms: bool,
    /// Running Speed and Cadence service
    pub rsc: bool,
    /// Heart Rate service
    pub hrm: bool,
    /// Cycling Power Service family
    pub csp: bool,
    /// CSP combinator: broadcast power
    pub power: bool,
    /// CSP combinator: broadcast crank cadence
    pub cadence: bool,
    /// CSP combinator: broadcast wheel speed
    pub speed: bool,
}

impl Capabilities {
    /// Resolve the requested families to the concrete profiles to run
    ///
    /// The cycling-power combinators select exactly one encoder variant:
    /// `csp+power` is power only, `csp+power+cadence` adds crank revolution
    /// data, `csp+power+cadence+speed` adds wheel revolution data.
    #[must_use]
    pub fn profiles(&self) -> Vec<Profile> {
        let mut profiles = Vec::new();
        if self.csp && self.power {
            if self.cadence && self.speed {
                profiles.push(Profile::CyclingPowerCombined);
            } else if self.cadence {
                profiles.push(Profile::CyclingPowerCadence);
            } else if !self.speed {
                profiles.push(Profile::CyclingPower);
            }
        }
        if self.ftms {
            profiles.push(Profile::IndoorBike);
        }
        if self.rsc {
            profiles.push(Profile::RunningSpeedCadence);
        }
        if self.hrm {
            profiles.push(Profile::HeartRate);
        }
        profiles
    }
}

impl FromStr for Capabilities {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut capabilities = Self::default();
        for token in s.split([',', '+', ' ']).filter(|t| !t.is_empty()) {
            match token.to_ascii_lowercase().as_str() {
                "ftms" => capabilities.ftms = true,
                "rsc" => capabilities.rsc = true,
                "hrm" => capabilities.hrm = true,
                "csp" => capabilities.csp = true,
                "power" => capabilities.power = true,
                "cadence" => capabilities.cadence = true,
                "speed" => capabilities.speed = true,
                other => {
                    return Err(SimulatorError::InvalidCapabilities(format!(
                        "unknown token `{other}`"
                    )))
                }
            }
        }
        if capabilities.profiles().is_empty() {
            return Err(SimulatorError::InvalidCapabilities(
                "selection enables no profile".to_string(),
            ));
        }
        Ok(capabilities)
    }
}

/// Advertised identity of the emulated sensor
///
/// Forwarded to the sink owner for device-information characteristics; has
/// no effect on encoder math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Local device name
    pub name: String,
    /// Model number string
    pub model_number: String,
    /// Serial number string
    pub serial_number: String,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            name: "Favero Assioma UNO".to_string(),
            model_number: "ZW-101".to_string(),
            serial_number: "1".to_string(),
        }
    }
}

/// Startup configuration for the simulator core
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Advertised identity
    pub identity: DeviceIdentity,
    /// Profile families to run
    pub capabilities: Capabilities,
    /// Delay between notifications for fixed-rate profiles
    pub notification_interval: Duration,
    /// Wheel circumference in millimeters for the combined cycling profile
    pub wheel_circumference_mm: u32,
    /// Wheel event timestamp resolution in ticks per second (1/2048 s)
    pub wheel_timestamp_unit: u32,
    /// Refresh period of the low-frequency heart-rate noise offset
    pub heart_rate_noise_interval: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            identity: DeviceIdentity::default(),
            capabilities: Capabilities::default(),
            notification_interval: Duration::from_millis(1000),
            wheel_circumference_mm: 2096,
            wheel_timestamp_unit: 2048,
            heart_rate_noise_interval: Duration::from_millis(5000),
        }
    }
}

impl SimulatorConfig {
    /// Default configuration for a capability selection
    #[must_use]
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Default::default()
        }
    }
}
