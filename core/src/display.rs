use crate::types::{MetricChannel, RoundTo};

/// Sekunder → (timer, minutter, sekunder).
pub fn split_hms(seconds: u64) -> (u64, u64, u64) {
    (seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

/// `h:mm:ss`, f.eks. 3725 → "1:02:05".
pub fn format_elapsed(seconds: u64) -> String {
    let (h, m, s) = split_hms(seconds);
    format!("{}:{:02}:{:02}", h, m, s)
}

/// Én desimal + enhet, f.eks. "72.0 BPM".
pub fn format_metric(value: f64, channel: MetricChannel) -> String {
    format!("{:.1} {}", value.round_to(1), channel.unit_label())
}
