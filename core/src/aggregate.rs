// core/src/aggregate.rs
use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::metrics;
use crate::types::{MetricChannel, RawSample, RoundTo, StatKind, StatSample};

/// ft/s → mph
pub const FTPS_TO_MPH: f64 = 0.681818;

pub const DEFAULT_CALORIE_GOAL: f64 = 5.0;

/// Løpende sum/antall for én kanal, gyldig for én økt.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningAggregate {
    pub sum: f64,
    pub count: f64,
    /// Distance: høyeste snittfart hittil. Øvrige: høyeste løpende snitt av kanalen.
    pub derived_max_average: f64,
    pub max: Option<f64>,
}

impl RunningAggregate {
    pub fn average(&self) -> Option<f64> {
        if self.count == 0.0 { None } else { Some(self.sum / self.count) }
    }

    /// Strengt `>`: like verdier oppdaterer ikke.
    fn offer_max_average(&mut self, avg: f64) -> bool {
        if avg > self.derived_max_average {
            self.derived_max_average = avg;
            true
        } else {
            false
        }
    }
}

/// Fart avledet fra distanse: snitt av momentane farter (mph).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedAggregate {
    pub sum: f64,
    pub count: f64,
}

impl SpeedAggregate {
    pub fn average(&self) -> Option<f64> {
        if self.count == 0.0 { None } else { Some(self.sum / self.count) }
    }
}

/// Resultat av ett registrert sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOutcome {
    pub channel: MetricChannel,
    /// Avrundet og tidsstemplet sample slik det ble lagret.
    pub sample: RawSample,
    /// Momentan fart (mph) når kanalen er distanse og Δt > 0.
    pub speed_mph: Option<f64>,
    pub new_max_average: bool,
    /// Sant kun for samplet som først nådde kalorimålet.
    pub goal_just_reached: bool,
}

#[derive(Debug, Clone)]
pub struct MetricAggregator {
    aggregates: BTreeMap<MetricChannel, RunningAggregate>,
    series: BTreeMap<MetricChannel, Vec<RawSample>>,
    speed: SpeedAggregate,
    calorie_goal: f64,
    goal_reached: bool,
}

impl Default for MetricAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CALORIE_GOAL)
    }
}

impl MetricAggregator {
    pub fn new(calorie_goal: f64) -> Self {
        Self {
            aggregates: MetricChannel::ALL.iter().map(|c| (*c, RunningAggregate::default())).collect(),
            series: MetricChannel::ALL.iter().map(|c| (*c, Vec::new())).collect(),
            speed: SpeedAggregate::default(),
            calorie_goal,
            goal_reached: false,
        }
    }

    /// Avrunder, tidsstempler og folder inn ett sample.
    ///
    /// Returnerer `None` når verdien ikke er endelig (NaN/inf); samplet lagres da ikke.
    /// Tidsstempel lavere enn kanalens forrige løftes til forrige, så serien
    /// alltid er ikke-avtagende.
    pub fn record_sample(
        &mut self,
        channel: MetricChannel,
        elapsed_seconds: u64,
        value: f64,
    ) -> Option<SampleOutcome> {
        if !value.is_finite() {
            warn!("⚠️ Forkaster ikke-endelig {} sample ({})", channel, value);
            metrics::samples_rejected_total(channel).inc();
            return None;
        }
        let rounded = value.round_to(0);

        let series = self.series.entry(channel).or_default();
        let previous = series.last().copied();
        let stamp = match previous {
            Some(prev) if elapsed_seconds < prev.elapsed_seconds => {
                warn!(
                    "⚠️ {} sample t={} før forrige t={}, løftes",
                    channel, elapsed_seconds, prev.elapsed_seconds
                );
                prev.elapsed_seconds
            }
            _ => elapsed_seconds,
        };
        let sample = RawSample { elapsed_seconds: stamp, value: rounded };
        series.push(sample);

        let agg = self.aggregates.entry(channel).or_default();
        agg.sum += rounded;
        agg.count += 1.0;
        agg.max = Some(agg.max.map_or(rounded, |m| m.max(rounded)));

        let mut speed_mph = None;
        let new_max_average = match channel {
            MetricChannel::Distance => match previous {
                Some(prev) if stamp > prev.elapsed_seconds => {
                    let dt = (stamp - prev.elapsed_seconds) as f64;
                    let mph = (rounded - prev.value) / dt * FTPS_TO_MPH;
                    speed_mph = Some(mph);
                    self.speed.sum += mph;
                    self.speed.count += 1.0;
                    match self.speed.average() {
                        Some(avg) => agg.offer_max_average(avg),
                        None => false,
                    }
                }
                // første sample eller Δt = 0: lagres, men gir ingen fart
                _ => false,
            },
            _ => match agg.average() {
                Some(avg) => agg.offer_max_average(avg),
                None => false,
            },
        };
        if new_max_average && channel == MetricChannel::Distance {
            debug!("max speed avg beaten: {:.2} mph", agg.derived_max_average);
        }

        let goal_just_reached = channel == MetricChannel::ActiveCalories
            && !self.goal_reached
            && rounded >= self.calorie_goal;
        if goal_just_reached {
            self.goal_reached = true;
            metrics::calorie_goal_reached_total().inc();
            info!("🎯 Kalorimål {} nådd ved t={}", self.calorie_goal, stamp);
        }

        metrics::samples_recorded_total(channel).inc();
        Some(SampleOutcome {
            channel,
            sample,
            speed_mph,
            new_max_average,
            goal_just_reached,
        })
    }

    pub fn aggregate(&self, channel: MetricChannel) -> RunningAggregate {
        self.aggregates.get(&channel).copied().unwrap_or_default()
    }

    pub fn average(&self, channel: MetricChannel) -> Option<f64> {
        self.aggregate(channel).average()
    }

    pub fn samples(&self, channel: MetricChannel) -> &[RawSample] {
        self.series.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, channel: MetricChannel) -> Option<f64> {
        self.samples(channel).last().map(|s| s.value)
    }

    pub fn speed(&self) -> SpeedAggregate {
        self.speed
    }

    pub fn speed_max_average(&self) -> f64 {
        self.aggregate(MetricChannel::Distance).derived_max_average
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    pub fn calorie_goal(&self) -> f64 {
        self.calorie_goal
    }

    /// Sluttsammendrag for én kanal, stemplet med `elapsed_seconds`.
    pub fn summary(&self, channel: MetricChannel, elapsed_seconds: u64) -> Vec<StatSample> {
        let agg = self.aggregate(channel);
        if agg.count == 0.0 {
            return Vec::new();
        }
        let stat = |kind, value| StatSample { elapsed_seconds, value, kind };
        let mut out = vec![stat(StatKind::Sum, agg.sum)];
        if let Some(avg) = agg.average() {
            out.push(stat(StatKind::Avg, avg));
        }
        if let Some(max) = agg.max {
            out.push(stat(StatKind::Max, max));
        }
        out.push(stat(StatKind::MaxAvg, agg.derived_max_average));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calorie_goal_fires_once_at_threshold() {
        let mut agg = MetricAggregator::new(5.0);
        let fired: Vec<bool> = [3.0, 4.0, 5.0, 6.0]
            .iter()
            .enumerate()
            .map(|(i, v)| {
                agg.record_sample(MetricChannel::ActiveCalories, i as u64, *v)
                    .unwrap()
                    .goal_just_reached
            })
            .collect();
        assert_eq!(fired, vec![false, false, true, false]);
        assert!(agg.goal_reached());
    }

    #[test]
    fn goal_uses_rounded_value() {
        let mut agg = MetricAggregator::new(5.0);
        assert!(!agg.record_sample(MetricChannel::ActiveCalories, 0, 4.4).unwrap().goal_just_reached);
        assert!(agg.record_sample(MetricChannel::ActiveCalories, 1, 4.5).unwrap().goal_just_reached);
    }

    #[test]
    fn speed_max_average_tracks_strict_increase() {
        let mut agg = MetricAggregator::default();
        let first = agg.record_sample(MetricChannel::Distance, 0, 0.0).unwrap();
        assert_eq!(first.speed_mph, None);
        assert_eq!(agg.speed_max_average(), 0.0);

        let second = agg.record_sample(MetricChannel::Distance, 10, 100.0).unwrap();
        let up = 10.0 * FTPS_TO_MPH;
        assert!((second.speed_mph.unwrap() - up).abs() < 1e-9);
        assert!(second.new_max_average);
        assert!((agg.speed_max_average() - up).abs() < 1e-9);

        // nedgang: negativ delta, snittet synker, max står
        let third = agg.record_sample(MetricChannel::Distance, 20, 50.0).unwrap();
        assert!(third.speed_mph.unwrap() < 0.0);
        assert!(!third.new_max_average);
        let avg = agg.speed().average().unwrap();
        assert!((avg - (up - 5.0 * FTPS_TO_MPH) / 2.0).abs() < 1e-9);
        assert!((agg.speed_max_average() - up).abs() < 1e-9);
    }

    #[test]
    fn zero_time_delta_records_without_speed() {
        let mut agg = MetricAggregator::default();
        agg.record_sample(MetricChannel::Distance, 4, 10.0);
        let dup = agg.record_sample(MetricChannel::Distance, 4, 20.0).unwrap();
        assert_eq!(dup.speed_mph, None);
        assert_eq!(agg.samples(MetricChannel::Distance).len(), 2);
        assert_eq!(agg.speed().count, 0.0);
        assert_eq!(agg.aggregate(MetricChannel::Distance).count, 2.0);
    }

    #[test]
    fn rounds_before_storing_and_summing() {
        let mut agg = MetricAggregator::default();
        agg.record_sample(MetricChannel::HeartRate, 1, 71.6);
        agg.record_sample(MetricChannel::HeartRate, 2, 70.2);
        assert_eq!(agg.samples(MetricChannel::HeartRate)[0].value, 72.0);
        assert_eq!(agg.aggregate(MetricChannel::HeartRate).sum, 142.0);
        assert_eq!(agg.average(MetricChannel::HeartRate), Some(71.0));
        assert_eq!(agg.average(MetricChannel::Steps), None);
    }

    #[test]
    fn earlier_stamp_is_clamped_to_previous() {
        let mut agg = MetricAggregator::default();
        agg.record_sample(MetricChannel::Steps, 9, 100.0);
        let out = agg.record_sample(MetricChannel::Steps, 7, 120.0).unwrap();
        assert_eq!(out.sample.elapsed_seconds, 9);
        let stamps: Vec<u64> = agg.samples(MetricChannel::Steps).iter().map(|s| s.elapsed_seconds).collect();
        assert_eq!(stamps, vec![9, 9]);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut agg = MetricAggregator::default();
        assert!(agg.record_sample(MetricChannel::HeartRate, 0, f64::NAN).is_none());
        assert!(agg.samples(MetricChannel::HeartRate).is_empty());
        assert_eq!(agg.aggregate(MetricChannel::HeartRate).count, 0.0);
    }

    #[test]
    fn summary_reports_sum_avg_max_and_max_avg() {
        let mut agg = MetricAggregator::default();
        for (t, v) in [(1, 80.0), (2, 100.0), (3, 90.0)] {
            agg.record_sample(MetricChannel::HeartRate, t, v);
        }
        let s = agg.summary(MetricChannel::HeartRate, 3);
        let kinds: Vec<StatKind> = s.iter().map(|x| x.kind).collect();
        assert_eq!(kinds, vec![StatKind::Sum, StatKind::Avg, StatKind::Max, StatKind::MaxAvg]);
        assert_eq!(s[0].value, 270.0);
        assert_eq!(s[1].value, 90.0);
        assert_eq!(s[2].value, 100.0);
        assert_eq!(s[3].value, 90.0);
        assert!(agg.summary(MetricChannel::Steps, 3).is_empty());
    }
}
