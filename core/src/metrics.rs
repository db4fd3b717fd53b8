// core/src/metrics.rs
use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

use crate::types::MetricChannel;

static SAMPLES_RECORDED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "workout_samples_recorded_total",
        "Samples folded into a running aggregate",
        &["channel"]
    )
    .expect("metric descriptor is valid")
});

static SAMPLES_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "workout_samples_rejected_total",
        "Samples dropped because the value was not finite",
        &["channel"]
    )
    .expect("metric descriptor is valid")
});

static HISTORY_LOAD_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "workout_history_load_failures_total",
        "History loads that fell back to an empty history",
        &["reason"]
    )
    .expect("metric descriptor is valid")
});

static WORKOUTS_SAVED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("workouts_saved_total", "Completed workouts persisted")
        .expect("metric descriptor is valid")
});

static CALORIE_GOAL_REACHED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "workout_calorie_goal_reached_total",
        "Workouts where the active calorie goal was reached"
    )
    .expect("metric descriptor is valid")
});

pub fn samples_recorded_total(channel: MetricChannel) -> IntCounter {
    SAMPLES_RECORDED.with_label_values(&[channel.as_str()])
}

pub fn samples_rejected_total(channel: MetricChannel) -> IntCounter {
    SAMPLES_REJECTED.with_label_values(&[channel.as_str()])
}

pub fn history_load_failures_total(reason: &str) -> IntCounter {
    HISTORY_LOAD_FAILURES.with_label_values(&[reason])
}

pub fn workouts_saved_total() -> &'static IntCounter {
    &WORKOUTS_SAVED
}

pub fn calorie_goal_reached_total() -> &'static IntCounter {
    &CALORIE_GOAL_REACHED
}

/// Default-registeret i tekstformat.
pub fn gather_text() -> String {
    // Sørg for at alle serier finnes før første sample
    Lazy::force(&SAMPLES_RECORDED);
    Lazy::force(&SAMPLES_REJECTED);
    Lazy::force(&HISTORY_LOAD_FAILURES);
    Lazy::force(&WORKOUTS_SAVED);
    Lazy::force(&CALORIE_GOAL_REACHED);

    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buf) {
        log::error!("metrics encode failed: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        samples_recorded_total(MetricChannel::Steps).inc();
        workouts_saved_total().inc();
        let txt = gather_text();
        assert!(txt.contains("workout_samples_recorded_total"));
        assert!(txt.contains("workouts_saved_total"));
    }
}
