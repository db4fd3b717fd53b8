// core/src/live.rs
//! Asynkron drift av en økt: én tokio-task eier kontrolleren og serialiserer
//! alle mutasjoner. Samples, tilstandsmeldinger og kommandoer kommer inn på en
//! mpsc-kanal; `LiveStats` publiseres på en watch-kanal etter hver mutasjon og
//! hvert tick.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::config::WorkoutConfig;
use crate::error::{Result, WorkoutError};
use crate::sensor::{SensorSession, SensorState};
use crate::session::{LiveStats, WorkoutSessionController, WorkoutState};
use crate::storage::KeyValueStore;
use crate::types::{MetricChannel, WorkoutRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    TogglePause,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Sample {
        channel: MetricChannel,
        value: f64,
        delivered_at: DateTime<Utc>,
    },
    StateChanged {
        from: SensorState,
        to: SensorState,
    },
    Command(Command),
}

/// Sender-side for sensorrammeverket og UI. Klones fritt.
#[derive(Debug, Clone)]
pub struct LiveHandle {
    events: mpsc::Sender<SessionEvent>,
    stats: watch::Receiver<LiveStats>,
}

impl LiveHandle {
    async fn send(&self, event: SessionEvent) -> Result<()> {
        self.events.send(event).await.map_err(|_| WorkoutError::Precondition {
            op: "send event",
            state: WorkoutState::Ended.to_string(),
        })
    }

    pub async fn deliver_sample(&self, channel: MetricChannel, value: f64) -> Result<()> {
        self.send(SessionEvent::Sample { channel, value, delivered_at: Utc::now() }).await
    }

    pub async fn state_changed(&self, from: SensorState, to: SensorState) -> Result<()> {
        self.send(SessionEvent::StateChanged { from, to }).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(SessionEvent::Command(Command::Pause)).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(SessionEvent::Command(Command::Resume)).await
    }

    pub async fn toggle_pause(&self) -> Result<()> {
        self.send(SessionEvent::Command(Command::TogglePause)).await
    }

    pub async fn end(&self) -> Result<()> {
        self.send(SessionEvent::Command(Command::End)).await
    }

    /// Rå sender, for leverandører som vil sende `SessionEvent` selv.
    pub fn sample_sink(&self) -> mpsc::Sender<SessionEvent> {
        self.events.clone()
    }

    pub fn stats(&self) -> LiveStats {
        *self.stats.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveStats> {
        self.stats.clone()
    }
}

pub struct LiveWorkout<S: SensorSession, K: KeyValueStore> {
    controller: WorkoutSessionController<S, K>,
    events: mpsc::Receiver<SessionEvent>,
    stats: watch::Sender<LiveStats>,
    tick: Duration,
}

impl<S, K> LiveWorkout<S, K>
where
    S: SensorSession + Send + 'static,
    K: KeyValueStore + Send + 'static,
{
    /// Starter økten synkront (så `SessionCreation` når kalleren) og spawner
    /// event-løkken. Task-en returnerer den ferdige økten.
    pub fn start(
        mut controller: WorkoutSessionController<S, K>,
    ) -> Result<(LiveHandle, JoinHandle<Result<WorkoutRecord>>)> {
        controller.start()?;
        let config: &WorkoutConfig = controller.config();
        let tick = config.tick_interval();
        let (tx, rx) = mpsc::channel(config.event_buffer.max(1));
        let (stats_tx, stats_rx) = watch::channel(controller.stats());

        let live = LiveWorkout { controller, events: rx, stats: stats_tx, tick };
        let task = tokio::spawn(live.run());
        Ok((LiveHandle { events: tx, stats: stats_rx }, task))
    }

    async fn run(mut self) -> Result<WorkoutRecord> {
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let running = self.controller.is_running();
            tokio::select! {
                maybe = self.events.recv() => match maybe {
                    Some(event) => {
                        let was_running = self.controller.is_running();
                        self.apply(event);
                        if !was_running && self.controller.is_running() {
                            ticker.reset();
                        }
                        self.publish();
                    }
                    None => {
                        debug!("alle sendere borte, avslutter økten");
                        if matches!(self.controller.state(), WorkoutState::Running | WorkoutState::Paused) {
                            self.controller.end()?;
                            self.publish();
                        }
                    }
                },
                _ = ticker.tick(), if running => {
                    self.publish();
                }
            }
            if self.controller.state() == WorkoutState::Ended {
                break;
            }
        }
        info!("live workout loop finished");
        Ok(self.controller.record().clone())
    }

    fn apply(&mut self, event: SessionEvent) {
        let res = match event {
            SessionEvent::Sample { channel, value, delivered_at } => {
                if let Some(out) = self.controller.handle_sample(channel, value) {
                    debug!(
                        "{} {} @ {}s (levert {})",
                        channel, out.sample.value, out.sample.elapsed_seconds, delivered_at
                    );
                }
                Ok(())
            }
            SessionEvent::StateChanged { from, to } => self.controller.handle_state_change(from, to),
            SessionEvent::Command(Command::Pause) => self.controller.pause(),
            SessionEvent::Command(Command::Resume) => self.controller.resume(),
            SessionEvent::Command(Command::TogglePause) => self.controller.toggle_pause(),
            SessionEvent::Command(Command::End) => self.controller.end().map(|_| ()),
        };
        match res {
            Ok(()) => {}
            Err(e @ WorkoutError::Precondition { .. }) => debug!("{}", e),
            Err(e) => warn!("⚠️ {}", e),
        }
    }

    fn publish(&self) {
        // send_replace oppdaterer også når UI ikke lytter
        self.stats.send_replace(self.controller.stats());
    }
}
