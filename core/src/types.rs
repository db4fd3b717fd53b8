use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Én målt kanal. Lukket sett; nye kanaler må legges til i `ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricChannel {
    #[serde(rename = "heartRate")]
    HeartRate,
    #[serde(rename = "calories")]
    ActiveCalories,
    #[serde(rename = "distance")]
    Distance,
    #[serde(rename = "steps")]
    Steps,
}

impl MetricChannel {
    pub const ALL: [MetricChannel; 4] = [
        MetricChannel::HeartRate,
        MetricChannel::ActiveCalories,
        MetricChannel::Distance,
        MetricChannel::Steps,
    ];

    /// Navnet som brukes i lagret JSON og som metrics-label.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricChannel::HeartRate => "heartRate",
            MetricChannel::ActiveCalories => "calories",
            MetricChannel::Distance => "distance",
            MetricChannel::Steps => "steps",
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            MetricChannel::HeartRate => "BPM",
            MetricChannel::ActiveCalories => "cal",
            MetricChannel::Distance => "ft",
            MetricChannel::Steps => "steps",
        }
    }
}

impl fmt::Display for MetricChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (tid, verdi)-observasjon for én kanal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    #[serde(rename = "secTime")]
    pub elapsed_seconds: u64, // sek fra start, pauser ekskludert
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    Sum,
    Avg,
    Max,
    MaxAvg,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSample {
    #[serde(rename = "secTime")]
    pub elapsed_seconds: u64,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: StatKind,
}

fn empty_channels<T>() -> BTreeMap<MetricChannel, Vec<T>> {
    MetricChannel::ALL.iter().map(|c| (*c, Vec::new())).collect()
}

/// Én komplett økt: grenser + full tidsserie per kanal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "empty_channels")]
    pub raw_data: BTreeMap<MetricChannel, Vec<RawSample>>,
    #[serde(default = "empty_channels")]
    pub stat_data: BTreeMap<MetricChannel, Vec<StatSample>>,
}

impl Default for WorkoutRecord {
    fn default() -> Self {
        Self {
            start_time: None,
            end_time: None,
            raw_data: empty_channels(),
            stat_data: empty_channels(),
        }
    }
}

impl WorkoutRecord {
    pub fn started_at(start: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start),
            ..Self::default()
        }
    }

    pub fn push_raw(&mut self, channel: MetricChannel, sample: RawSample) {
        self.raw_data.entry(channel).or_default().push(sample);
    }

    pub fn samples(&self, channel: MetricChannel) -> &[RawSample] {
        self.raw_data.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stats(&self, channel: MetricChannel) -> &[StatSample] {
        self.stat_data.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Veggklokke-varighet (inkl. pauser) i hele sekunder, hvis økten er avsluttet.
    pub fn wall_duration_secs(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(s), Some(e)) => Some((e - s).num_seconds()),
            _ => None,
        }
    }

    pub fn total_samples(&self) -> usize {
        self.raw_data.values().map(Vec::len).sum()
    }
}

/// Append-only liste over fullførte økter, kronologisk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutHistory {
    #[serde(default)]
    pub workouts: Vec<WorkoutRecord>,
}

impl WorkoutHistory {
    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn last(&self) -> Option<&WorkoutRecord> {
        self.workouts.last()
    }
}

// --- RoundTo trait ---
pub trait RoundTo {
    fn round_to(self, dp: u32) -> f64;
}

impl RoundTo for f64 {
    #[inline]
    fn round_to(self, dp: u32) -> f64 {
        if dp == 0 { return self.round(); }
        let factor = 10_f64.powi(dp as i32);
        (self * factor).round() / factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_has_every_channel_empty() {
        let rec = WorkoutRecord::default();
        for c in MetricChannel::ALL {
            assert!(rec.samples(c).is_empty());
            assert!(rec.stats(c).is_empty());
        }
        assert!(!rec.is_finished());
    }

    #[test]
    fn channel_keys_use_persisted_names() {
        let mut rec = WorkoutRecord::default();
        rec.push_raw(MetricChannel::ActiveCalories, RawSample { elapsed_seconds: 3, value: 5.0 });
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["rawData"]["calories"][0]["secTime"], 3);
        assert_eq!(v["rawData"]["calories"][0]["value"], 5.0);
        assert!(v["rawData"]["heartRate"].as_array().unwrap().is_empty());
        assert!(v["startTime"].is_null());
    }

    #[test]
    fn round_to_matches_half_away_from_zero() {
        assert_eq!(5.4_f64.round_to(0), 5.0);
        assert_eq!(2.5_f64.round_to(0), 3.0);
        assert_eq!(1.25_f64.round_to(1), 1.3);
    }
}
