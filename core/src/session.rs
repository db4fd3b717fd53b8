// core/src/session.rs
use std::fmt;

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::aggregate::{MetricAggregator, SampleOutcome};
use crate::clock::ElapsedTimeClock;
use crate::config::WorkoutConfig;
use crate::error::{Result, WorkoutError};
use crate::history::WorkoutHistoryStore;
use crate::sensor::{AuthorizationRequest, HealthAuthorizer, SensorSession, SensorState};
use crate::storage::KeyValueStore;
use crate::types::{MetricChannel, WorkoutHistory, WorkoutRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkoutState {
    #[default]
    Idle,
    Running,
    Paused,
    Ended,
}

impl fmt::Display for WorkoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkoutState::Idle => "idle",
            WorkoutState::Running => "running",
            WorkoutState::Paused => "paused",
            WorkoutState::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Handlinger brukeren kan velge i gjeldende tilstand (menyen på klokken).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutAction {
    Start,
    Pause,
    Resume,
    End,
}

/// Speiling av siste verdier for visning. Oppdateres kun via den serialiserte mutasjonsveien.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LiveStats {
    pub state: WorkoutState,
    pub elapsed_seconds: u64,
    pub heart_rate: f64,
    pub active_calories: f64,
    pub distance: f64,
    pub step_count: f64,
    pub calorie_goal_reached: bool,
}

/// Orkestrerer én økt: Idle → Running ⇄ Paused → Ended.
///
/// Eier klokke, aggregater og aktiv `WorkoutRecord`. En ny økt krever en ny kontroller.
pub struct WorkoutSessionController<S: SensorSession, K: KeyValueStore> {
    sensor: S,
    history: WorkoutHistoryStore<K>,
    config: WorkoutConfig,
    state: WorkoutState,
    clock: ElapsedTimeClock,
    aggregator: MetricAggregator,
    record: WorkoutRecord,
    display_reset: bool,
}

impl<S: SensorSession, K: KeyValueStore> WorkoutSessionController<S, K> {
    pub fn new(sensor: S, store: K, config: WorkoutConfig) -> Self {
        let history = WorkoutHistoryStore::with_key(store, config.history_key.clone());
        let aggregator = MetricAggregator::new(config.calorie_goal);
        Self {
            sensor,
            history,
            config,
            state: WorkoutState::Idle,
            clock: ElapsedTimeClock::new(),
            aggregator,
            record: WorkoutRecord::default(),
            display_reset: false,
        }
    }

    pub fn state(&self) -> WorkoutState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == WorkoutState::Running
    }

    pub fn config(&self) -> &WorkoutConfig {
        &self.config
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed()
    }

    pub fn aggregator(&self) -> &MetricAggregator {
        &self.aggregator
    }

    pub fn record(&self) -> &WorkoutRecord {
        &self.record
    }

    pub fn history(&self) -> &WorkoutHistory {
        self.history.history()
    }

    pub fn history_store(&self) -> &WorkoutHistoryStore<K> {
        &self.history
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn available_actions(&self) -> Vec<WorkoutAction> {
        match self.state {
            WorkoutState::Idle => vec![WorkoutAction::Start],
            WorkoutState::Running => vec![WorkoutAction::Pause, WorkoutAction::End],
            WorkoutState::Paused => vec![WorkoutAction::Resume, WorkoutAction::End],
            WorkoutState::Ended => Vec::new(),
        }
    }

    fn precondition(&self, op: &'static str) -> WorkoutError {
        debug!("ignorerer '{}' i tilstand {}", op, self.state);
        WorkoutError::Precondition { op, state: self.state.to_string() }
    }

    /// Idle → Running. Feiler sensoroppstart, går kontrolleren tilbake til Idle.
    pub fn start(&mut self) -> Result<()> {
        if self.state != WorkoutState::Idle {
            return Err(self.precondition("start"));
        }
        info!("startWorkout");
        self.history.load();

        self.record = WorkoutRecord::started_at(Utc::now());
        self.aggregator = MetricAggregator::new(self.config.calorie_goal);
        self.display_reset = false;
        self.clock.reset();
        self.clock.start();
        self.state = WorkoutState::Running;

        if let Err(reason) = self.sensor.begin_session(&self.config.session_configuration()) {
            warn!("⚠️ Sensorøkt kunne ikke startes: {}", reason);
            self.clock.reset();
            self.record = WorkoutRecord::default();
            self.state = WorkoutState::Idle;
            return Err(WorkoutError::SessionCreation(reason));
        }
        Ok(())
    }

    /// Running → Paused.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != WorkoutState::Running {
            return Err(self.precondition("pause"));
        }
        let elapsed = self.clock.pause()?;
        self.sensor.pause();
        self.state = WorkoutState::Paused;
        info!("pauseWorkout at {}s", elapsed);
        Ok(())
    }

    /// Paused → Running.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != WorkoutState::Paused {
            return Err(self.precondition("resume"));
        }
        self.clock.resume();
        self.sensor.resume();
        self.state = WorkoutState::Running;
        info!("resumeWorkout");
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> Result<()> {
        if self.state == WorkoutState::Running {
            self.pause()
        } else {
            self.resume()
        }
    }

    /// Running|Paused → Ended. Ber sensoren stoppe og avslutte innsamlingen,
    /// og returnerer den ferdige økten.
    pub fn end(&mut self) -> Result<WorkoutRecord> {
        match self.state {
            WorkoutState::Running | WorkoutState::Paused => Ok(self.finalize(true)),
            _ => Err(self.precondition("end")),
        }
    }

    fn finalize(&mut self, signal_sensor: bool) -> WorkoutRecord {
        if self.clock.is_running() {
            // klokken går bare i Running, så pause kan ikke feile her
            let _ = self.clock.pause();
        }
        let elapsed = self.clock.elapsed();
        self.record.end_time = Some(Utc::now());
        for channel in MetricChannel::ALL {
            self.record
                .stat_data
                .insert(channel, self.aggregator.summary(channel, elapsed));
        }
        self.state = WorkoutState::Ended;
        info!(
            "endWorkout at {}s ({} samples)",
            elapsed,
            self.record.total_samples()
        );

        let finished = self.record.clone();
        if let Err(e) = self.history.append(finished.clone()) {
            // økten er tapt på disk, men kontrolleren avslutter likevel
            error!("❌ Økten ble ikke lagret: {}", e);
        }
        if signal_sensor {
            self.sensor.end();
        }
        self.finish_collection();
        finished
    }

    /// Ett sample fra sensorrammeverket. Ignoreres i Idle/Ended.
    pub fn handle_sample(&mut self, channel: MetricChannel, value: f64) -> Option<SampleOutcome> {
        if matches!(self.state, WorkoutState::Idle | WorkoutState::Ended) {
            debug!("ignorerer {} sample i tilstand {}", channel, self.state);
            return None;
        }
        let elapsed = self.clock.elapsed();
        let outcome = self.aggregator.record_sample(channel, elapsed, value)?;
        self.record.push_raw(channel, outcome.sample);
        Some(outcome)
    }

    /// Tilstandsendring meldt av sensorrammeverket.
    ///
    /// Synkroniserer lokal klokke uten å sende pause/resume tilbake, og
    /// dedupliserer mot lokal tilstand (en lokal `pause()` blir også meldt her).
    pub fn handle_state_change(&mut self, from: SensorState, to: SensorState) -> Result<()> {
        debug!("sensor state {:?} -> {:?} (local {})", from, to, self.state);
        match (to, self.state) {
            (SensorState::Paused, WorkoutState::Running) => {
                let elapsed = self.clock.pause()?;
                self.state = WorkoutState::Paused;
                info!("pause fra enheten at {}s", elapsed);
            }
            (SensorState::Running, WorkoutState::Paused) => {
                self.clock.resume();
                self.state = WorkoutState::Running;
                info!("resume fra enheten");
            }
            (SensorState::Ended, WorkoutState::Running | WorkoutState::Paused) => {
                self.finalize(false);
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_collection(&mut self) {
        if self.display_reset {
            return;
        }
        info!("The workout has now ended.");
        if let Err(e) = self.sensor.finish_collection() {
            error!("finish collection failed: {}", e);
        }
        self.display_reset = true;
    }

    pub fn stats(&self) -> LiveStats {
        let latest = |c: MetricChannel| self.aggregator.latest(c).unwrap_or(0.0);
        LiveStats {
            state: self.state,
            elapsed_seconds: if self.display_reset { 0 } else { self.clock.elapsed() },
            heart_rate: latest(MetricChannel::HeartRate),
            active_calories: latest(MetricChannel::ActiveCalories),
            distance: latest(MetricChannel::Distance),
            step_count: latest(MetricChannel::Steps),
            calorie_goal_reached: self.aggregator.goal_reached(),
        }
    }
}

/// Ber om tilgang én gang. Avslag logges; kalleren fortsetter uansett.
pub fn request_authorization<A: HealthAuthorizer + ?Sized>(authorizer: &A) -> bool {
    match authorizer.request_authorization(&AuthorizationRequest::for_workouts()) {
        Ok(()) => true,
        Err(e) => {
            warn!("requestAuthorization error {}", e);
            false
        }
    }
}
