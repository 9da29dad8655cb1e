use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
};

use tokio::{sync::RwLock, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    config::{Profile, SimulatorConfig},
    encoder::Encoder,
    jitter::Jitter,
    params::{ParamEdit, ParameterSet},
    sink::Sink,
};

/// Lifecycle of one profile's notification task
///
/// `Stopped` is terminal: there is no pause/resume mid-run, parameter edits
/// mutate encoder inputs without ever interrupting the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created but not yet started
    Idle,
    /// Firing and self-rescheduling
    Scheduled,
    /// Shut down, never to fire again
    Stopped,
}

/// Drives every enabled profile encoder at its notification cadence
///
/// One timer-chained task per active profile: each fires immediately on
/// start, delivers its record to the sink, then re-arms itself with either
/// the fixed notification interval or the cadence-derived delay its encoder
/// returned. Tasks interleave on the runtime and each tick reads a
/// consistent snapshot of the shared [`ParameterSet`], so an edit is never
/// observed half-applied.
pub struct Simulator {
    config: SimulatorConfig,
    params: Arc<RwLock<ParameterSet>>,
    hr_noise: Arc<AtomicI32>,
    sink: Arc<dyn Sink>,
    states: Arc<RwLock<HashMap<Profile, TaskState>>>,
    handles: Vec<JoinHandle<()>>,
}

impl Simulator {
    /// Create a simulator for the configured capability selection
    ///
    /// Profiles are resolved once here and never change afterwards.
    #[must_use]
    pub fn new(config: SimulatorConfig, sink: Arc<dyn Sink>) -> Self {
        let states = config
            .capabilities
            .profiles()
            .into_iter()
            .map(|profile| (profile, TaskState::Idle))
            .collect();

        info!(
            name = %config.identity.name,
            profiles = ?config.capabilities.profiles(),
            "simulator created"
        );

        Self {
            config,
            params: Arc::new(RwLock::new(ParameterSet::default())),
            hr_noise: Arc::new(AtomicI32::new(0)),
            sink,
            states: Arc::new(RwLock::new(states)),
            handles: Vec::new(),
        }
    }

    /// Spawn the per-profile notification tasks
    ///
    /// Each task fires immediately, then self-reschedules. Calling `start`
    /// twice is a no-op.
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            return;
        }

        let profiles = self.config.capabilities.profiles();
        for profile in &profiles {
            self.handles.push(tokio::spawn(run_profile(
                *profile,
                self.config.clone(),
                Arc::clone(&self.params),
                Arc::clone(&self.hr_noise),
                Arc::clone(&self.sink),
                Arc::clone(&self.states),
            )));
        }

        // The noise offset only matters to HR-bearing profiles; refresh it
        // on its own low-frequency interval when one is running.
        if profiles
            .iter()
            .any(|p| matches!(p, Profile::IndoorBike | Profile::HeartRate))
        {
            self.handles.push(tokio::spawn(run_heart_rate_noise(
                self.config.heart_rate_noise_interval,
                Arc::clone(&self.params),
                Arc::clone(&self.hr_noise),
            )));
        }
    }

    /// Apply one edit to the shared parameter set
    ///
    /// The edit is visible to every encoder's next tick; the updated
    /// parameter dump is emitted through `tracing` as the display contract
    /// requires.
    pub async fn apply(&self, edit: ParamEdit) {
        let mut params = self.params.write().await;
        params.apply(edit);
        info!("parameters updated\n{params}");
    }

    /// Apply a raw control key, logging and ignoring unbound keys
    pub async fn apply_key(&self, key: char) {
        match ParamEdit::from_key(key) {
            Ok(edit) => self.apply(edit).await,
            Err(e) => warn!(error = %e, "ignoring edit"),
        }
    }

    /// Consistent snapshot of the current parameters
    pub async fn params(&self) -> ParameterSet {
        self.params.read().await.clone()
    }

    /// State of one profile's task, if the profile is enabled
    pub async fn state(&self, profile: Profile) -> Option<TaskState> {
        self.states.read().await.get(&profile).copied()
    }

    /// Stop every task; terminal
    pub async fn stop(&mut self) {
        let handles: Vec<_> = self.handles.drain(..).collect();
        for handle in &handles {
            handle.abort();
        }
        // Wait for the loops to wind down before flipping the states.
        let _ = futures::future::join_all(handles).await;

        let mut states = self.states.write().await;
        for state in states.values_mut() {
            *state = TaskState::Stopped;
        }
        info!("simulator stopped");
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Timer-chained notification loop for one profile
async fn run_profile(
    profile: Profile,
    config: SimulatorConfig,
    params: Arc<RwLock<ParameterSet>>,
    hr_noise: Arc<AtomicI32>,
    sink: Arc<dyn Sink>,
    states: Arc<RwLock<HashMap<Profile, TaskState>>>,
) {
    let mut encoder = Encoder::new(profile);
    let mut jitter = Jitter::new();

    states.write().await.insert(profile, TaskState::Scheduled);
    debug!(%profile, "notification task scheduled");

    loop {
        let snapshot = params.read().await.clone();
        let tick = encoder.tick(
            &snapshot,
            &mut jitter,
            hr_noise.load(Ordering::Relaxed),
            &config,
        );

        if let Err(e) = sink.notify(profile, &tick.record).await {
            warn!(%profile, error = %e, "notification dropped; next tick proceeds");
        }

        sleep(tick.next_delay).await;
    }
}

/// Low-frequency refresh of the shared heart-rate noise offset
async fn run_heart_rate_noise(
    interval: std::time::Duration,
    params: Arc<RwLock<ParameterSet>>,
    hr_noise: Arc<AtomicI32>,
) {
    let mut jitter = Jitter::new();
    loop {
        sleep(interval).await;
        let spread = params.read().await.heart_rate_randomness;
        hr_noise.store(jitter.value(0, spread), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Capabilities,
        error::{Result, SimulatorError},
        params::{Direction, ParamField},
        protocol::Record,
        sink::ChannelSink,
    };
    use async_trait::async_trait;
    use std::{sync::atomic::AtomicUsize, time::Duration};

    fn config_for(tokens: &str) -> SimulatorConfig {
        let capabilities: Capabilities = tokens.parse().unwrap();
        SimulatorConfig::with_capabilities(capabilities)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_interval_profile_ticks_once_per_second() {
        let (sink, mut receiver) = ChannelSink::new();
        let mut simulator = Simulator::new(config_for("ftms"), Arc::new(sink));
        simulator.start();

        // First tick fires immediately, then 1 Hz: t = 0, 1000, 2000, 3000.
        sleep(Duration::from_millis(3500)).await;
        simulator.stop().await;

        let mut count = 0;
        while let Ok((profile, record)) = receiver.try_recv() {
            assert_eq!(profile, Profile::IndoorBike);
            assert!(matches!(record, Record::IndoorBike { .. }));
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cadence_derived_delay_reschedules_faster() {
        let (sink, mut receiver) = ChannelSink::new();
        let mut simulator = Simulator::new(config_for("csp+power+cadence"), Arc::new(sink));

        // 120 RPM with no jitter gives a 500 ms crank period.
        {
            let mut params = simulator.params.write().await;
            params.cadence = 120;
            params.cadence_randomness = 0;
        }
        simulator.start();

        sleep(Duration::from_millis(2250)).await;
        simulator.stop().await;

        // t = 0, 500, ..., 2000
        let mut count = 0;
        while receiver.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 5);
    }

    struct FailingSink {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Sink for FailingSink {
        async fn notify(&self, profile: Profile, _record: &Record) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SimulatorError::Delivery {
                profile,
                reason: "subscriber went away".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_sink_does_not_stop_the_schedule() {
        let failing = Arc::new(FailingSink {
            attempts: AtomicUsize::new(0),
        });
        let sink: Arc<dyn Sink> = failing.clone();
        let mut simulator = Simulator::new(config_for("ftms"), sink);
        simulator.start();

        sleep(Duration::from_millis(2500)).await;
        simulator.stop().await;

        assert_eq!(failing.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_states_progress_to_stopped() {
        let (sink, _receiver) = ChannelSink::new();
        let mut simulator = Simulator::new(config_for("rsc"), Arc::new(sink));

        assert_eq!(
            simulator.state(Profile::RunningSpeedCadence).await,
            Some(TaskState::Idle)
        );
        assert_eq!(simulator.state(Profile::IndoorBike).await, None);

        simulator.start();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            simulator.state(Profile::RunningSpeedCadence).await,
            Some(TaskState::Scheduled)
        );

        simulator.stop().await;
        assert_eq!(
            simulator.state(Profile::RunningSpeedCadence).await,
            Some(TaskState::Stopped)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_reach_the_next_tick() {
        let (sink, mut receiver) = ChannelSink::new();
        let mut simulator = Simulator::new(config_for("ftms"), Arc::new(sink));

        {
            let mut params = simulator.params.write().await;
            params.power_randomness = 0;
            params.cadence_randomness = 0;
        }
        simulator.start();

        sleep(Duration::from_millis(500)).await;
        for _ in 0..5 {
            simulator
                .apply(ParamEdit::new(ParamField::Power, Direction::Up))
                .await;
        }
        sleep(Duration::from_millis(1000)).await;
        simulator.stop().await;

        let (_, first) = receiver.try_recv().unwrap();
        let (_, second) = receiver.try_recv().unwrap();
        let Record::IndoorBike { watts, .. } = first else {
            panic!("wrong record variant");
        };
        assert_eq!(watts, 100);
        let Record::IndoorBike { watts, .. } = second else {
            panic!("wrong record variant");
        };
        assert_eq!(watts, 150);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_key_changes_nothing() {
        let (sink, _receiver) = ChannelSink::new();
        let simulator = Simulator::new(config_for("ftms"), Arc::new(sink));

        let before = simulator.params().await;
        simulator.apply_key('z').await;
        assert_eq!(simulator.params().await, before);
    }
}
