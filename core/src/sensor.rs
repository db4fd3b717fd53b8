// core/src/sensor.rs
use std::sync::{Arc, Mutex};

use crate::config::{ActivityType, LocationType};
use crate::types::MetricChannel;

/// Konfigurasjon som sendes til sensorrammeverket ved oppstart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfiguration {
    pub activity_type: ActivityType,
    pub location_type: LocationType,
}

/// Tilstanden slik sensorrammeverket selv rapporterer den.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    NotStarted,
    Prepared,
    Running,
    Paused,
    Stopped,
    Ended,
}

/// Sensor-/øktrammeverket som leverer samples. Eies utenfor denne kjernen.
pub trait SensorSession {
    fn begin_session(&mut self, config: &SessionConfiguration) -> Result<(), String>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn end(&mut self);

    /// Avslutter innsamling etter at rammeverket har meldt `Ended`.
    fn finish_collection(&mut self) -> Result<(), String> {
        Ok(())
    }
}

impl<T: SensorSession + ?Sized> SensorSession for Box<T> {
    fn begin_session(&mut self, config: &SessionConfiguration) -> Result<(), String> {
        (**self).begin_session(config)
    }
    fn pause(&mut self) {
        (**self).pause()
    }
    fn resume(&mut self) {
        (**self).resume()
    }
    fn end(&mut self) {
        (**self).end()
    }
    fn finish_collection(&mut self) -> Result<(), String> {
        (**self).finish_collection()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub share_workouts: bool,
    pub read: Vec<MetricChannel>,
}

impl AuthorizationRequest {
    /// Skrive økter + lese alle fire kanaler.
    pub fn for_workouts() -> Self {
        Self {
            share_workouts: true,
            read: MetricChannel::ALL.to_vec(),
        }
    }
}

pub trait HealthAuthorizer {
    fn request_authorization(&self, request: &AuthorizationRequest) -> Result<(), String>;
}

/// Én registrert kommando mot `SimulatedSensor`.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorCall {
    Begin(SessionConfiguration),
    Pause,
    Resume,
    End,
    FinishCollection,
}

/// Sensor uten maskinvare: logger kallene, kan settes til å nekte oppstart.
/// Klones billig; alle kloner deler samme logg.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSensor {
    calls: Arc<Mutex<Vec<SensorCall>>>,
    refuse_with: Option<String>,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refuse_with: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SensorCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn log(&self, call: SensorCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl SensorSession for SimulatedSensor {
    fn begin_session(&mut self, config: &SessionConfiguration) -> Result<(), String> {
        if let Some(reason) = &self.refuse_with {
            return Err(reason.clone());
        }
        self.log(SensorCall::Begin(*config));
        Ok(())
    }

    fn pause(&mut self) {
        self.log(SensorCall::Pause);
    }

    fn resume(&mut self) {
        self.log(SensorCall::Resume);
    }

    fn end(&mut self) {
        self.log(SensorCall::End);
    }

    fn finish_collection(&mut self) -> Result<(), String> {
        self.log(SensorCall::FinishCollection);
        Ok(())
    }
}

/// Godtar alltid, eller nekter alltid.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAuthorizer {
    pub granted: bool,
}

impl HealthAuthorizer for StaticAuthorizer {
    fn request_authorization(&self, _request: &AuthorizationRequest) -> Result<(), String> {
        if self.granted { Ok(()) } else { Err("authorization denied".into()) }
    }
}
