use crate::display::{format_elapsed, format_metric};
use crate::types::{MetricChannel, StatKind, WorkoutHistory, WorkoutRecord};

/// Tekstrapport for én økt.
pub fn workout_report(record: &WorkoutRecord) -> String {
    let mut out = String::new();
    let start = record
        .start_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".into());
    let end = record
        .end_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".into());
    out.push_str(&format!("Start: {start}\nSlutt: {end}\n"));
    if let Some(secs) = record.wall_duration_secs() {
        out.push_str(&format!("Varighet (inkl. pauser): {}\n", format_elapsed(secs.max(0) as u64)));
    }

    for channel in MetricChannel::ALL {
        let samples = record.samples(channel);
        out.push_str(&format!("{:<10} {:>4} samples", channel.as_str(), samples.len()));
        for stat in record.stats(channel) {
            let label = match stat.kind {
                StatKind::Sum => "sum",
                StatKind::Avg => "avg",
                StatKind::Max => "max",
                StatKind::MaxAvg => "maxAvg",
            };
            out.push_str(&format!("  {}={}", label, format_metric(stat.value, channel)));
        }
        out.push('\n');
    }
    out
}

pub fn print_workout_report(record: &WorkoutRecord) {
    println!("--- Workout Report ---");
    print!("{}", workout_report(record));
}

pub fn print_history(history: &WorkoutHistory) {
    println!("--- {} lagrede økter ---", history.len());
    for (i, rec) in history.workouts.iter().enumerate() {
        println!("#{}", i + 1);
        print!("{}", workout_report(rec));
    }
}
