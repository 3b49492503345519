//! Exercise catalogue: one configuration record per supported exercise.

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

use crate::pose::LandmarkIndex;
use crate::tracker::form::{self, FormCheck};
use crate::tracker::threshold::ThresholdPair;

/// 対応する種目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseType {
    BicepCurl,
    Squat,
    Lunges,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 3] = [Self::BicepCurl, Self::Squat, Self::Lunges];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BicepCurl => "Bicep Curl",
            Self::Squat => "Squat",
            Self::Lunges => "Lunges",
        }
    }

    pub fn profile(&self) -> &'static ExerciseProfile {
        match self {
            Self::BicepCurl => &BICEP_CURL,
            Self::Squat => &SQUAT,
            Self::Lunges => &LUNGES,
        }
    }

    pub(crate) fn slot(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExerciseType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "bicepcurl" | "curl" => Ok(Self::BicepCurl),
            "squat" => Ok(Self::Squat),
            "lunge" | "lunges" => Ok(Self::Lunges),
            _ => bail!("unknown exercise type: {:?}", s),
        }
    }
}

/// 関節の動き方の分類（疲労判定の閾値が異なる）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseFamily {
    ArmFlexion,
    KneeBearing,
}

/// どちらの角度側が DOWN フェーズか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// 伸展（大きい角度）が DOWN、屈曲で UP
    HighAngleDown,
    /// 屈曲（小さい角度）が DOWN、伸展で UP
    LowAngleDown,
}

impl Polarity {
    pub fn is_down(&self, angle: f32, thresholds: &ThresholdPair) -> bool {
        match self {
            Self::HighAngleDown => angle > thresholds.down,
            Self::LowAngleDown => angle < thresholds.down,
        }
    }

    pub fn is_up(&self, angle: f32, thresholds: &ThresholdPair) -> bool {
        match self {
            Self::HighAngleDown => angle < thresholds.up,
            Self::LowAngleDown => angle > thresholds.up,
        }
    }

    /// DOWN 閾値に向かって `band` 度以内まで近づいているか
    pub fn is_approaching_down(&self, angle: f32, thresholds: &ThresholdPair, band: f32) -> bool {
        match self {
            Self::HighAngleDown => angle > thresholds.down - band,
            Self::LowAngleDown => angle < thresholds.down + band,
        }
    }
}

/// 角度を測る3点 (a, b, c)。b が頂点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointTriple {
    pub a: LandmarkIndex,
    pub b: LandmarkIndex,
    pub c: LandmarkIndex,
}

/// 種目ごとの設定
pub struct ExerciseProfile {
    pub joints: JointTriple,
    pub family: ExerciseFamily,
    pub polarity: Polarity,
    pub default_thresholds: ThresholdPair,
    /// DOWN 中のみ評価するフォームチェック（先頭優先）
    pub form_checks: &'static [FormCheck],
    /// DOWN に入ったときの指示
    pub down_prompt: &'static str,
    /// レップ成功時のメッセージ
    pub success_text: &'static str,
    /// DOWN 閾値手前の警告 (帯域幅 deg, メッセージ)
    pub approach_hint: Option<(f32, &'static str)>,
}

const ARM_JOINTS: JointTriple = JointTriple {
    a: LandmarkIndex::LeftShoulder,
    b: LandmarkIndex::LeftElbow,
    c: LandmarkIndex::LeftWrist,
};

const LEG_JOINTS: JointTriple = JointTriple {
    a: LandmarkIndex::LeftHip,
    b: LandmarkIndex::LeftKnee,
    c: LandmarkIndex::LeftAnkle,
};

static BICEP_CURL: ExerciseProfile = ExerciseProfile {
    joints: ARM_JOINTS,
    family: ExerciseFamily::ArmFlexion,
    polarity: Polarity::HighAngleDown,
    default_thresholds: ThresholdPair { down: 150.0, up: 40.0 },
    form_checks: &[],
    down_prompt: "Curl Up",
    success_text: "Good Rep!",
    approach_hint: None,
};

static SQUAT: ExerciseProfile = ExerciseProfile {
    joints: LEG_JOINTS,
    family: ExerciseFamily::KneeBearing,
    polarity: Polarity::LowAngleDown,
    default_thresholds: ThresholdPair { down: 85.0, up: 165.0 },
    form_checks: &[form::knee_over_toes, form::trunk_upright],
    down_prompt: "Stand Up",
    success_text: "Perfect!",
    approach_hint: Some((25.0, "Lower! (<90)")),
};

static LUNGES: ExerciseProfile = ExerciseProfile {
    joints: LEG_JOINTS,
    family: ExerciseFamily::KneeBearing,
    polarity: Polarity::LowAngleDown,
    default_thresholds: ThresholdPair { down: 95.0, up: 165.0 },
    form_checks: &[form::knee_over_toes],
    down_prompt: "Push Up",
    success_text: "Good Lunge!",
    approach_hint: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_names() {
        for ex in ExerciseType::ALL {
            assert_eq!(ex.name().parse::<ExerciseType>().unwrap(), ex);
        }
    }

    #[test]
    fn test_parse_loose_names() {
        assert_eq!("bicep_curl".parse::<ExerciseType>().unwrap(), ExerciseType::BicepCurl);
        assert_eq!(" SQUAT ".parse::<ExerciseType>().unwrap(), ExerciseType::Squat);
        assert_eq!("lunge".parse::<ExerciseType>().unwrap(), ExerciseType::Lunges);
    }

    #[test]
    fn test_parse_unknown_is_error() {
        assert!("deadlift".parse::<ExerciseType>().is_err());
        assert!("".parse::<ExerciseType>().is_err());
    }

    #[test]
    fn test_joint_selection() {
        assert_eq!(ExerciseType::BicepCurl.profile().joints.b, LandmarkIndex::LeftElbow);
        assert_eq!(ExerciseType::Squat.profile().joints.b, LandmarkIndex::LeftKnee);
        assert_eq!(ExerciseType::Lunges.profile().joints, ExerciseType::Squat.profile().joints);
    }

    #[test]
    fn test_polarity() {
        let arm = ThresholdPair { down: 150.0, up: 40.0 };
        assert!(Polarity::HighAngleDown.is_down(170.0, &arm));
        assert!(Polarity::HighAngleDown.is_up(20.0, &arm));
        assert!(!Polarity::HighAngleDown.is_down(100.0, &arm));

        let leg = ThresholdPair { down: 85.0, up: 165.0 };
        assert!(Polarity::LowAngleDown.is_down(70.0, &leg));
        assert!(Polarity::LowAngleDown.is_up(170.0, &leg));
        assert!(!Polarity::LowAngleDown.is_up(120.0, &leg));
    }

    #[test]
    fn test_approach_band() {
        let leg = ThresholdPair { down: 85.0, up: 165.0 };
        assert!(Polarity::LowAngleDown.is_approaching_down(100.0, &leg, 25.0));
        assert!(!Polarity::LowAngleDown.is_approaching_down(115.0, &leg, 25.0));
    }
}
