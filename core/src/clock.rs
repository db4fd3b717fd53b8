// core/src/clock.rs
use tokio::time::Instant;

use crate::error::{Result, WorkoutError};

/// Akkumulert løpetid på tvers av pause/resume.
///
/// Totalt = `accumulated_secs` + (kjører ? nå - anker : 0), alltid i hele sekunder.
/// Måler med `tokio::time::Instant`, slik at tester kan kjøre på pauset tokio-klokke.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElapsedTimeClock {
    run_started_at: Option<Instant>,
    accumulated_secs: u64,
}

impl ElapsedTimeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setter nytt anker. Kalt mens klokken går flyttes ankeret
    /// (tiden siden forrige anker går tapt), så par alltid med `pause`.
    pub fn start(&mut self) {
        self.run_started_at = Some(Instant::now());
    }

    pub fn resume(&mut self) {
        self.start();
    }

    /// Legger løpende intervall (gulvet til hele sekunder) til akkumulert tid.
    pub fn pause(&mut self) -> Result<u64> {
        let started = self.run_started_at.take().ok_or(WorkoutError::Precondition {
            op: "pause clock",
            state: "not running".into(),
        })?;
        self.accumulated_secs += started.elapsed().as_secs();
        Ok(self.accumulated_secs)
    }

    pub fn elapsed(&self) -> u64 {
        let running = self
            .run_started_at
            .map(|s| s.elapsed().as_secs())
            .unwrap_or(0);
        self.accumulated_secs + running
    }

    pub fn is_running(&self) -> bool {
        self.run_started_at.is_some()
    }

    pub fn reset(&mut self) {
        self.run_started_at = None;
        self.accumulated_secs = 0;
    }
}
