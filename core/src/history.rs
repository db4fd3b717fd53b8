// core/src/history.rs
use log::{error, info, warn};
use serde_json as json;
use serde_path_to_error as spte;

use crate::error::{HistoryLoadError, Result, WorkoutError};
use crate::metrics;
use crate::storage::KeyValueStore;
use crate::types::{WorkoutHistory, WorkoutRecord};

pub const HISTORY_KEY: &str = "workouts";

/// Append-only historikk over fullførte økter, lagret som én JSON-tekst under én nøkkel.
///
/// Hver `save` skriver hele historikken på nytt (ikke bare siste økt). Det er
/// ingen transaksjon: krasjer appen mellom `load` og `save`, kan hele
/// historikken gå tapt.
pub struct WorkoutHistoryStore<K: KeyValueStore> {
    store: K,
    key: String,
    history: WorkoutHistory,
}

impl<K: KeyValueStore> WorkoutHistoryStore<K> {
    pub fn new(store: K) -> Self {
        Self::with_key(store, HISTORY_KEY)
    }

    pub fn with_key(store: K, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            history: WorkoutHistory::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn history(&self) -> &WorkoutHistory {
        &self.history
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn into_store(self) -> K {
        self.store
    }

    /// Leser og dekoder lagret historikk uten å røre minnet.
    pub fn try_load(&self) -> Result<WorkoutHistory> {
        let bytes = self
            .store
            .get(&self.key)?
            .ok_or_else(|| HistoryLoadError::Absent(self.key.clone()))?;
        let text = String::from_utf8(bytes).map_err(HistoryLoadError::from)?;
        Ok(decode_history(&text)?)
    }

    /// Myk lasting: lagrede økter først, deretter økter som bare finnes i minnet.
    /// Feil logges og gir tom lagret historikk, så en ny økt kan starte likevel.
    pub fn load(&mut self) -> &WorkoutHistory {
        let persisted = match self.try_load() {
            Ok(h) => {
                info!("📂 Historikk lastet fra '{}' ({} økter)", self.key, h.len());
                h
            }
            Err(WorkoutError::PersistenceDecode(e)) => {
                warn!("⚠️ Kunne ikke laste historikk: {}; starter tomt", e);
                metrics::history_load_failures_total(e.reason()).inc();
                WorkoutHistory::default()
            }
            Err(e) => {
                warn!("⚠️ Kunne ikke lese historikk: {}; starter tomt", e);
                metrics::history_load_failures_total("io").inc();
                WorkoutHistory::default()
            }
        };

        let mut merged = persisted;
        for rec in std::mem::take(&mut self.history.workouts) {
            if !merged.workouts.contains(&rec) {
                merged.workouts.push(rec);
            }
        }
        self.history = merged;
        &self.history
    }

    /// Legger økten sist og lagrer hele historikken.
    pub fn append(&mut self, record: WorkoutRecord) -> Result<()> {
        self.history.workouts.push(record);
        self.save()
    }

    pub fn save(&mut self) -> Result<()> {
        let text = encode_history(&self.history)?;
        if let Err(e) = self.store.set(&self.key, &text) {
            error!("❌ Lagring av historikk feilet: {}", e);
            return Err(e.into());
        }
        metrics::workouts_saved_total().inc();
        info!("✅ Historikk lagret ({} økter)", self.history.len());
        Ok(())
    }
}

pub fn encode_history(history: &WorkoutHistory) -> Result<String> {
    json::to_string(history).map_err(WorkoutError::PersistenceEncode)
}

pub fn decode_history(text: &str) -> std::result::Result<WorkoutHistory, HistoryLoadError> {
    let mut de = json::Deserializer::from_str(text);
    let history: WorkoutHistory = spte::deserialize(&mut de).map_err(|e| HistoryLoadError::Decode {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })?;
    de.end().map_err(|e| HistoryLoadError::Decode {
        path: ".".into(),
        message: e.to_string(),
    })?;
    Ok(history)
}
