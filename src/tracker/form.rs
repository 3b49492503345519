use crate::pose::{LandmarkIndex, Landmarks};
use crate::tracker::angle::compute_angle;

/// フォームチェックの判定基準
#[derive(Debug, Clone, Copy)]
pub struct FormLimits {
    pub visibility_threshold: f32,
    /// 膝と足首の水平距離の上限（正規化座標）
    pub knee_drift_limit: f32,
    /// 肩-腰-膝の角度の下限 (deg)
    pub trunk_min_angle: f32,
}

/// 違反していればフィードバック文を返す。
/// 必要なランドマークが見えない場合は判定しない
pub type FormCheck = fn(&Landmarks, &FormLimits) -> Option<&'static str>;

/// 膝がつま先より前に出ていないか
pub fn knee_over_toes(landmarks: &Landmarks, limits: &FormLimits) -> Option<&'static str> {
    let knee = landmarks.visible(LandmarkIndex::LeftKnee, limits.visibility_threshold)?;
    let ankle = landmarks.visible(LandmarkIndex::LeftAnkle, limits.visibility_threshold)?;
    if (knee.x - ankle.x).abs() > limits.knee_drift_limit {
        Some("Knee Past Toes!")
    } else {
        None
    }
}

/// 上体が起きているか
pub fn trunk_upright(landmarks: &Landmarks, limits: &FormLimits) -> Option<&'static str> {
    let th = limits.visibility_threshold;
    let shoulder = landmarks.visible(LandmarkIndex::LeftShoulder, th)?;
    let hip = landmarks.visible(LandmarkIndex::LeftHip, th)?;
    let knee = landmarks.visible(LandmarkIndex::LeftKnee, th)?;
    let trunk = compute_angle(shoulder.point(), hip.point(), knee.point());
    if trunk < limits.trunk_min_angle {
        Some("Keep Back Straight!")
    } else {
        None
    }
}

/// 先頭から評価し、最初に違反したチェックの文を返す
pub fn first_violation(checks: &[FormCheck], landmarks: &Landmarks, limits: &FormLimits) -> Option<&'static str> {
    checks.iter().find_map(|check| check(landmarks, limits))
}
