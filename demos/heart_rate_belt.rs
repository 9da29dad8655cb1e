use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use fauxfit::{Capabilities, ChannelSink, ParamEdit, Record, Simulator, SimulatorConfig};

#[tokio::main]
async fn main() -> fauxfit::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("❤️ Fauxfit Heart Rate Belt");

    let capabilities: Capabilities = "hrm".parse()?;
    let (sink, mut receiver) = ChannelSink::new();
    let mut simulator = Simulator::new(
        SimulatorConfig::with_capabilities(capabilities),
        Arc::new(sink),
    );
    simulator.start();

    // Drain notifications the way a GATT server would, printing the wire
    // payload next to the decoded value.
    let reader = tokio::spawn(async move {
        while let Some((_, record)) = receiver.recv().await {
            if let Record::HeartRate { bpm } = &record {
                info!("{} bpm, payload {:02X?}", bpm, &record.to_bytes()[..]);
            }
        }
    });

    sleep(Duration::from_secs(5)).await;

    // Park the belt by dropping the heart rate below the reporting floor
    info!("Unclipping the belt...");
    for _ in 0..7 {
        simulator.apply(ParamEdit::from_key('h')?).await;
    }
    sleep(Duration::from_secs(5)).await;

    simulator.stop().await;
    reader.abort();
    info!("Done");
    Ok(())
}
