//! Per-exercise range-of-motion calibration.
//!
//! Once enough repetitions and samples have been seen, the 95th/5th
//! percentiles of the session history are blended into the stored
//! envelope every frame, and the thresholds are re-derived from it.

use crate::config::CalibrationConfig;
use crate::exercise::ExerciseType;
use crate::tracker::threshold::{self, ThresholdPair};

const SLOTS: usize = ExerciseType::ALL.len();

/// これ未満の移動は変化とみなさない (deg)
const DRIFT_EPSILON: f32 = 1e-3;

/// 学習した可動域 (deg)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub max: f32,
    pub min: f32,
}

impl Envelope {
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// Linear-interpolated percentile (`p` in 0..=100). `None` on empty input.
pub fn percentile(values: &[i32], p: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<i32> = values.to_vec();
    sorted.sort_unstable();

    let rank = p.clamp(0.0, 100.0) as f64 * (sorted.len() - 1) as f64 / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some((sorted[lo] as f64 + (sorted[hi] - sorted[lo]) as f64 * frac) as f32)
}

fn blend(prior: f32, estimate: f32, prior_weight: f32) -> f32 {
    prior_weight * prior + (1.0 - prior_weight) * estimate
}

pub struct CalibrationStore {
    config: CalibrationConfig,
    envelopes: [Option<Envelope>; SLOTS],
    thresholds: [ThresholdPair; SLOTS],
    calibrated: [bool; SLOTS],
}

impl CalibrationStore {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            config: config.clone(),
            envelopes: [None; SLOTS],
            thresholds: ExerciseType::ALL.map(|ex| ex.profile().default_thresholds),
            calibrated: [false; SLOTS],
        }
    }

    pub fn envelope(&self, exercise: ExerciseType) -> Option<&Envelope> {
        self.envelopes[exercise.slot()].as_ref()
    }

    pub fn thresholds(&self, exercise: ExerciseType) -> ThresholdPair {
        self.thresholds[exercise.slot()]
    }

    pub fn is_calibrated(&self, exercise: ExerciseType) -> bool {
        self.calibrated[exercise.slot()]
    }

    /// 履歴から可動域を更新する。可動域が変化したら true
    ///
    /// `reps` と `history` がゲート条件を満たすまでは何もしない
    pub fn update(&mut self, exercise: ExerciseType, reps: u32, history: &[i32]) -> bool {
        if reps < self.config.min_reps || history.len() < self.config.min_samples {
            return false;
        }
        let (max_est, min_est) = match (
            percentile(history, self.config.upper_percentile),
            percentile(history, self.config.lower_percentile),
        ) {
            (Some(hi), Some(lo)) => (hi, lo),
            _ => return false,
        };

        let slot = exercise.slot();
        let prior_weight = self.config.prior_weight;
        let next = match self.envelopes[slot] {
            Some(prev) => Envelope {
                max: blend(prev.max, max_est, prior_weight),
                min: blend(prev.min, min_est, prior_weight),
            },
            None => Envelope { max: max_est, min: min_est },
        };

        let changed = match self.envelopes[slot] {
            Some(prev) => {
                (prev.max - next.max).abs() > DRIFT_EPSILON || (prev.min - next.min).abs() > DRIFT_EPSILON
            }
            None => true,
        };
        self.envelopes[slot] = Some(next);
        self.thresholds[slot] =
            threshold::resolve(exercise.profile(), Some(&next), self.config.margin_ratio);

        if !self.calibrated[slot] {
            self.calibrated[slot] = true;
            log::info!(
                "{} calibrated: range {:.1}..{:.1}, thresholds down={:.1} up={:.1}",
                exercise,
                next.min,
                next.max,
                self.thresholds[slot].down,
                self.thresholds[slot].up
            );
        } else if changed {
            log::trace!("{} envelope drift: {:.2}..{:.2}", exercise, next.min, next.max);
        }
        changed
    }

    pub fn reset(&mut self) {
        *self = Self::new(&self.config);
    }
}
