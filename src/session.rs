//! Session history and end-of-session analysis (ROM score, fatigue trend).

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::exercise::ExerciseFamily;
use crate::tracker::calibration::Envelope;

/// 疲労度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fatigue {
    Low,
    Moderate,
    High,
}

/// レップ数による総合評価
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Assessment {
    Excellent,
    Good,
    #[serde(rename = "Keep Trying")]
    KeepTrying,
}

impl Assessment {
    pub fn from_reps(reps: u32) -> Self {
        if reps >= 10 {
            Self::Excellent
        } else if reps >= 5 {
            Self::Good
        } else {
            Self::KeepTrying
        }
    }
}

/// セッション終了時の解析結果。データ不足の項目は `None`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionAssessment {
    pub rom_score: Option<f32>,
    pub fatigue: Option<Fatigue>,
}

/// 記録・レポート用のセッション集計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub exercise: String,
    pub reps: u32,
    pub min_angle: Option<i32>,
    pub max_angle: Option<i32>,
    pub rom_score: Option<f32>,
    pub fatigue: Option<Fatigue>,
    pub assessment: Assessment,
}

/// 追跡できたフレームの角度履歴と最小・最大
#[derive(Debug, Default)]
pub struct SessionStats {
    history: Vec<i32>,
    min_angle: Option<i32>,
    max_angle: Option<i32>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, angle: i32) {
        self.history.push(angle);
        self.min_angle = Some(self.min_angle.map_or(angle, |m| m.min(angle)));
        self.max_angle = Some(self.max_angle.map_or(angle, |m| m.max(angle)));
    }

    pub fn history(&self) -> &[i32] {
        &self.history
    }

    pub fn min_angle(&self) -> Option<i32> {
        self.min_angle
    }

    pub fn max_angle(&self) -> Option<i32> {
        self.max_angle
    }

    /// キャリブレーション可動域に対する今回の可動域 (%)
    pub fn rom_score(&self, envelope: Option<&Envelope>, cap: f32) -> Option<f32> {
        let env = envelope.filter(|env| env.span() > 0.0)?;
        let (min, max) = (self.min_angle?, self.max_angle?);
        let score = 100.0 * (max - min) as f32 / env.span();
        Some(score.clamp(0.0, cap))
    }

    /// 前1/3と後1/3の最小角の差から疲労を推定する
    pub fn fatigue(&self, family: ExerciseFamily, min_samples: usize) -> Option<Fatigue> {
        let n = self.history.len();
        if n < min_samples.max(3) {
            return None;
        }
        let third = n / 3;
        let first = self.history[..third].iter().min()?;
        let last = self.history[n - third..].iter().min()?;
        let diff = (last - first) as f32;

        let (high, moderate) = match family {
            ExerciseFamily::KneeBearing => (15.0, 7.0),
            ExerciseFamily::ArmFlexion => (10.0, 5.0),
        };
        Some(if diff > high {
            Fatigue::High
        } else if diff > moderate {
            Fatigue::Moderate
        } else {
            Fatigue::Low
        })
    }

    pub fn assess(&self, family: ExerciseFamily, envelope: Option<&Envelope>, config: &AnalysisConfig) -> SessionAssessment {
        SessionAssessment {
            rom_score: self.rom_score(envelope, config.rom_cap),
            fatigue: self.fatigue(family, config.fatigue_min_samples),
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.min_angle = None;
        self.max_angle = None;
    }
}
