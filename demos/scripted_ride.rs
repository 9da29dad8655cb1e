use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use fauxfit::{Capabilities, ParamEdit, Simulator, SimulatorConfig, TracingSink};

#[tokio::main]
async fn main() -> fauxfit::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("🚴 Fauxfit Scripted Ride");

    // An FTMS trainer plus a power meter broadcasting power, cadence and
    // wheel speed, all from the same parameter set.
    let capabilities: Capabilities = "ftms,csp+power+cadence+speed".parse()?;
    let config = SimulatorConfig::with_capabilities(capabilities);

    info!("Emulating '{}'", config.identity.name);

    let mut simulator = Simulator::new(config, Arc::new(TracingSink));
    simulator.start();

    // Warm up at the defaults for a few notifications
    sleep(Duration::from_secs(5)).await;

    // Attack: +30 W, +10 RPM
    info!("📈 Attacking...");
    for _ in 0..3 {
        simulator.apply(ParamEdit::from_key('P')?).await;
    }
    simulator.apply(ParamEdit::from_key('C')?).await;
    sleep(Duration::from_secs(10)).await;

    // Sit up and coast: cadence all the way to zero
    info!("📉 Sitting up...");
    for _ in 0..10 {
        simulator.apply(ParamEdit::from_key('c')?).await;
    }
    sleep(Duration::from_secs(5)).await;

    let params = simulator.params().await;
    info!("Final parameters:\n{params}");

    simulator.stop().await;
    info!("🎉 Ride complete");
    Ok(())
}
