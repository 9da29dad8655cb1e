#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

//! # Fauxfit 🚴
//!
//! A Rust library for emulating Bluetooth Low Energy fitness sensors.
//!
//! Fauxfit fakes the telemetry of cycling power meters, speed/cadence
//! sensors, FTMS indoor trainers, running footpods and heart-rate belts so
//! that client applications (training apps, head units, watches) can be
//! tested without physical hardware. The crate is the sensor's *brain*: it
//! derives physically consistent, wraparound-correct characteristic fields
//! (event counters, cumulative revolution counts, 1/1024 s and 1/2048 s
//! timestamps) from a small set of live-adjustable parameters under injected
//! randomness, and drives them at each profile's notification cadence.
//!
//! The BLE peripheral itself is *not* part of this crate: records are pushed
//! through the [`Sink`] trait, and whoever owns the GATT server mounts the
//! payloads on the measurement characteristics named by the UUID constants
//! below. Parameter edits arrive as typed [`ParamEdit`] events from any
//! control channel (the reference tool reads keystrokes).
//!
//! ## What gets emulated
//!
//! - **Cycling Power** (power only, power + cadence, or power + cadence +
//!   speed with wheel/crank revolution data)
//! - **FTMS Indoor Bike** (power, cadence and optional heart rate)
//! - **Running Speed and Cadence**
//! - **Heart Rate**
//!
//! Counters never run backward, event timestamps stay consistent with the
//! elapsed interval even while cadence is edited live, and degenerate inputs
//! (a parked crank, a stopped wheel) become gated hold states rather than
//! errors.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fauxfit::{Capabilities, ParamEdit, Simulator, SimulatorConfig, TracingSink};
//!
//! #[tokio::main]
//! async fn main() -> fauxfit::Result<()> {
//!     // Broadcast an FTMS trainer and a power meter with cadence
//!     let capabilities: Capabilities = "ftms,csp+power+cadence".parse()?;
//!
//!     let config = SimulatorConfig::with_capabilities(capabilities);
//!     let mut simulator = Simulator::new(config, Arc::new(TracingSink));
//!     simulator.start();
//!
//!     // Ride harder
//!     simulator.apply(ParamEdit::from_key('P')?).await;
//!
//!     tokio::time::sleep(Duration::from_secs(10)).await;
//!     simulator.stop().await;
//!     Ok(())
//! }
//! ```

/// Capability selection, device identity and simulator configuration
pub mod config;
/// Profile encoders and the revolution/event-time counter state
pub mod encoder;
/// Error types and handling
pub mod error;
/// Bounded uniform jitter injected into every encoder
pub mod jitter;
/// The live-adjustable parameter store and its edit events
pub mod params;
/// Telemetry records and their characteristic wire payloads
pub mod protocol;
/// The per-profile notification scheduler
pub mod scheduler;
/// The abstract notification sink
pub mod sink;

// Re-export the main types for convenient usage
pub use config::{Capabilities, DeviceIdentity, Profile, SimulatorConfig};
pub use encoder::{CounterState, Encoder, Tick};
pub use error::{Result, SimulatorError};
pub use jitter::Jitter;
pub use params::{Direction, ParamEdit, ParamField, ParameterSet};
pub use protocol::Record;
pub use scheduler::{Simulator, TaskState};
pub use sink::{ChannelSink, Sink, TracingSink};

use protocol::bluetooth_uuid;
use uuid::Uuid;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cycling Power service (0x1818)
pub const CYCLING_POWER_SERVICE_UUID: Uuid = bluetooth_uuid(0x1818);

/// Cycling Power Measurement characteristic (0x2A63)
///
/// Carries the payloads of the power-only, power + cadence and combined
/// cycling profiles; wheel and crank revolution data are flagged in the
/// first two payload bytes.
pub const CYCLING_POWER_MEASUREMENT_UUID: Uuid = bluetooth_uuid(0x2A63);

/// Fitness Machine service (0x1826)
pub const FITNESS_MACHINE_SERVICE_UUID: Uuid = bluetooth_uuid(0x1826);

/// FTMS Indoor Bike Data characteristic (0x2AD2)
pub const INDOOR_BIKE_DATA_UUID: Uuid = bluetooth_uuid(0x2AD2);

/// Running Speed and Cadence service (0x1814)
pub const RUNNING_SPEED_AND_CADENCE_SERVICE_UUID: Uuid = bluetooth_uuid(0x1814);

/// RSC Measurement characteristic (0x2A53)
pub const RSC_MEASUREMENT_UUID: Uuid = bluetooth_uuid(0x2A53);

/// Heart Rate service (0x180D)
pub const HEART_RATE_SERVICE_UUID: Uuid = bluetooth_uuid(0x180D);

/// Heart Rate Measurement characteristic (0x2A37)
pub const HEART_RATE_MEASUREMENT_UUID: Uuid = bluetooth_uuid(0x2A37);
