use crate::exercise::{ExerciseProfile, Polarity};
use crate::tracker::calibration::Envelope;

/// DOWN / UP の判定角度 (deg)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPair {
    pub down: f32,
    pub up: f32,
}

/// キャリブレーション済みの可動域から閾値を決める
///
/// 可動域が無い、または幅が 0 以下ならその種目の固定値を返す
pub fn resolve(profile: &ExerciseProfile, envelope: Option<&Envelope>, margin_ratio: f32) -> ThresholdPair {
    let env = match envelope {
        Some(env) if env.span() > 0.0 => env,
        _ => return profile.default_thresholds,
    };

    let margin = margin_ratio * env.span();
    match profile.polarity {
        Polarity::HighAngleDown => ThresholdPair {
            down: env.max - margin,
            up: env.min + margin,
        },
        Polarity::LowAngleDown => ThresholdPair {
            down: env.min + margin,
            up: env.max - margin,
        },
    }
}
