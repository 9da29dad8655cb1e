use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    config::Profile,
    error::{Result, SimulatorError},
    protocol::Record,
};

/// Abstract notification channel the scheduler delivers records into
///
/// In a deployed emulator this is the BLE peripheral notifying the profile's
/// measurement characteristic; in tests it is a channel or a logger. The
/// scheduler calls [`Sink::notify`] once per tick per active profile and
/// tolerates failure: a rejected record is logged and superseded by the next
/// tick, never retried.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver one record for `profile`
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::Delivery`] when the record cannot be
    /// delivered. The caller treats this as non-fatal.
    async fn notify(&self, profile: Profile, record: &Record) -> Result<()>;
}

/// Sink that logs every record through `tracing`
///
/// Doubles as the human-readable telemetry dump when no real peripheral is
/// attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl Sink for TracingSink {
    async fn notify(&self, profile: Profile, record: &Record) -> Result<()> {
        info!(%profile, payload = ?record.to_bytes(), "{record:?}");
        Ok(())
    }
}

/// Sink that forwards records over an unbounded channel
///
/// The receiving half is handed to whoever owns the real notification
/// transport; tests drain it directly.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<(Profile, Record)>,
}

impl ChannelSink {
    /// Create a channel sink and the receiver to drain it
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Profile, Record)>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Sink for ChannelSink {
    async fn notify(&self, profile: Profile, record: &Record) -> Result<()> {
        self.sender
            .send((profile, record.clone()))
            .map_err(|e| SimulatorError::Delivery {
                profile,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_channel_sink_forwards_records() {
        let (sink, mut receiver) = ChannelSink::new();
        let record = Record::HeartRate { bpm: 142 };

        sink.notify(Profile::HeartRate, &record).await.unwrap();

        let (profile, received) = receiver.recv().await.unwrap();
        assert_eq!(profile, Profile::HeartRate);
        assert_eq!(received, record);
    }

    #[tokio::test]
    async fn test_channel_sink_reports_closed_receiver() {
        let (sink, receiver) = ChannelSink::new();
        drop(receiver);

        let record = Record::CyclingPower { watts: 180 };
        let error = sink
            .notify(Profile::CyclingPower, &record)
            .await
            .unwrap_err();
        assert!(error.is_delivery());
    }

    #[tokio::test]
    async fn test_tracing_sink_never_fails() {
        let sink = TracingSink;
        let record = Record::IndoorBike {
            watts: 200,
            cadence_rpm: 90,
            heart_rate: None,
        };
        assert_ok!(sink.notify(Profile::IndoorBike, &record).await);
    }
}
