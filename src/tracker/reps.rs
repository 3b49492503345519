//! Debounced DOWN/UP phase tracking and repetition counting.
//!
//! A phase commits only after `debounce_frames` consecutive frames past its
//! threshold. A repetition is counted on the DOWN → UP commit, never on
//! DOWN alone. Speed and form warnings replace the feedback text for the
//! current frame but never block a transition.

use crate::config::RepConfig;
use crate::exercise::ExerciseProfile;
use crate::pose::Landmarks;
use crate::tracker::form::{self, FormLimits};
use crate::tracker::threshold::ThresholdPair;

const INITIAL_TEXT: &str = "Stand inside frame";
const TOO_FAST_TEXT: &str = "Too Fast! Slow Down";
const TRACKING_LOST_TEXT: &str = "Adjust Camera / Body";

/// 運動フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// セッション開始直後、まだ DOWN に入っていない
    Idle,
    Down,
    Up,
}

/// フィードバックの分類。表示側は文字列ではなくこれで色を決める
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTone {
    Neutral,
    Success,
    Warning,
    Error,
}

impl FeedbackTone {
    /// RGB
    pub fn color_hint(&self) -> [u8; 3] {
        match self {
            Self::Neutral => [255, 255, 255],
            Self::Success => [0, 255, 0],
            Self::Warning => [255, 165, 0],
            Self::Error => [255, 0, 0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub text: &'static str,
    pub tone: FeedbackTone,
}

impl Feedback {
    fn new(text: &'static str, tone: FeedbackTone) -> Self {
        Self { text, tone }
    }
}

pub struct RepCounter {
    debounce_frames: u32,
    speed_limit: f32,
    limits: FormLimits,
    phase: Phase,
    down_candidate: u32,
    up_candidate: u32,
    reps: u32,
    /// フェーズ遷移でのみ変わるフィードバック
    base: Feedback,
    /// 今フレームの表示用（上書き込み）
    current: Feedback,
}

impl RepCounter {
    pub fn new(config: &RepConfig, visibility_threshold: f32) -> Self {
        let initial = Feedback::new(INITIAL_TEXT, FeedbackTone::Neutral);
        Self {
            debounce_frames: config.debounce_frames.max(1),
            speed_limit: config.speed_limit,
            limits: FormLimits {
                visibility_threshold,
                knee_drift_limit: config.knee_drift_limit,
                trunk_min_angle: config.trunk_min_angle,
            },
            phase: Phase::Idle,
            down_candidate: 0,
            up_candidate: 0,
            reps: 0,
            base: initial,
            current: initial,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn feedback(&self) -> Feedback {
        self.current
    }

    /// 1フレーム分の判定。レップが完了したら true
    pub fn step(
        &mut self,
        profile: &ExerciseProfile,
        thresholds: &ThresholdPair,
        angle: i32,
        speed: f32,
        landmarks: &Landmarks,
    ) -> bool {
        let angle = angle as f32;
        let polarity = profile.polarity;
        let past_down = polarity.is_down(angle, thresholds);

        if past_down {
            self.down_candidate += 1;
            self.up_candidate = 0;
        } else if polarity.is_up(angle, thresholds) {
            self.up_candidate += 1;
            self.down_candidate = 0;
        } else {
            self.down_candidate = 0;
            self.up_candidate = 0;
        }

        let mut completed = false;
        if self.down_candidate >= self.debounce_frames && self.phase != Phase::Down {
            log::debug!("{:?} -> Down at {} deg", self.phase, angle);
            self.phase = Phase::Down;
            self.base = Feedback::new(profile.down_prompt, FeedbackTone::Neutral);
        } else if self.up_candidate >= self.debounce_frames && self.phase == Phase::Down {
            self.phase = Phase::Up;
            self.reps += 1;
            self.base = Feedback::new(profile.success_text, FeedbackTone::Success);
            completed = true;
            log::info!("rep {} completed at {} deg", self.reps, angle);
        }

        let mut feedback = self.base;
        match self.phase {
            Phase::Down => {
                if let Some(text) = form::first_violation(profile.form_checks, landmarks, &self.limits) {
                    feedback = Feedback::new(text, FeedbackTone::Warning);
                }
            }
            Phase::Idle | Phase::Up => {
                if let Some((band, text)) = profile.approach_hint {
                    if !past_down && polarity.is_approaching_down(angle, thresholds, band) {
                        feedback = Feedback::new(text, FeedbackTone::Warning);
                    }
                }
            }
        }
        if speed > self.speed_limit {
            feedback = Feedback::new(TOO_FAST_TEXT, FeedbackTone::Warning);
        }
        self.current = feedback;

        completed
    }

    /// 関節が見えないフレーム。カウンタやフェーズは変えない
    pub fn mark_lost(&mut self) {
        self.current = Feedback::new(TRACKING_LOST_TEXT, FeedbackTone::Error);
    }

    pub fn reset(&mut self) {
        let initial = Feedback::new(INITIAL_TEXT, FeedbackTone::Neutral);
        self.phase = Phase::Idle;
        self.down_candidate = 0;
        self.up_candidate = 0;
        self.reps = 0;
        self.base = initial;
        self.current = initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::ExerciseType;
    use crate::pose::{Landmark, LandmarkIndex};

    fn counter() -> RepCounter {
        RepCounter::new(&RepConfig::default(), 0.3)
    }

    /// 角度列を流し、完了したレップ数を返す
    fn feed(c: &mut RepCounter, ex: ExerciseType, angles: &[i32]) -> u32 {
        let profile = ex.profile();
        let landmarks = Landmarks::default();
        angles
            .iter()
            .filter(|&&a| c.step(profile, &profile.default_thresholds, a, 0.0, &landmarks))
            .count() as u32
    }

    #[test]
    fn test_curl_cycle_counts_once() {
        let mut c = counter();
        let ex = ExerciseType::BicepCurl;
        assert_eq!(feed(&mut c, ex, &[170, 170, 170]), 0);
        assert_eq!(c.phase(), Phase::Down);
        assert_eq!(c.feedback().text, "Curl Up");

        assert_eq!(feed(&mut c, ex, &[20, 20, 20]), 1);
        assert_eq!(c.phase(), Phase::Up);
        assert_eq!(c.feedback(), Feedback::new("Good Rep!", FeedbackTone::Success));

        feed(&mut c, ex, &[170, 170, 170]);
        assert_eq!(c.reps(), 1);
        assert_eq!(c.phase(), Phase::Down);
    }

    #[test]
    fn test_down_alone_never_counts() {
        let mut c = counter();
        feed(&mut c, ExerciseType::Squat, &[60; 30]);
        assert_eq!(c.phase(), Phase::Down);
        assert_eq!(c.reps(), 0);
    }

    #[test]
    fn test_up_without_down_is_noop() {
        let mut c = counter();
        assert_eq!(feed(&mut c, ExerciseType::BicepCurl, &[20; 10]), 0);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.feedback().text, "Stand inside frame");
    }

    #[test]
    fn test_debounce_rejects_short_excursions() {
        let mut c = counter();
        let ex = ExerciseType::BicepCurl;
        feed(&mut c, ex, &[170, 170, 170]);
        // 2フレームずつしか UP 側に入らない
        let jitter = [20, 20, 100, 20, 20, 100, 20, 20, 170, 20, 20];
        assert_eq!(feed(&mut c, ex, &jitter), 0);
        assert_eq!(c.reps(), 0);
        assert_eq!(c.phase(), Phase::Down);
    }

    #[test]
    fn test_sustained_hold_counts_once() {
        let mut c = counter();
        let ex = ExerciseType::Lunges;
        feed(&mut c, ex, &[80; 5]);
        assert_eq!(feed(&mut c, ex, &[170; 20]), 1);
    }

    #[test]
    fn test_many_cycles() {
        let mut c = counter();
        let ex = ExerciseType::Squat;
        let mut total = 0;
        for _ in 0..5 {
            total += feed(&mut c, ex, &[170, 170, 170, 120, 70, 70, 70, 120]);
        }
        // 最初の起立は DOWN 前なので数えない
        assert_eq!(total, 4);
        assert_eq!(feed(&mut c, ex, &[170, 170, 170]), 1);
        assert_eq!(c.reps(), 5);
    }

    #[test]
    fn test_speed_caution_is_advisory() {
        let mut c = counter();
        let ex = ExerciseType::BicepCurl;
        let profile = ex.profile();
        let th = profile.default_thresholds;
        let lm = Landmarks::default();
        for _ in 0..3 {
            c.step(profile, &th, 170, 0.0, &lm);
        }
        c.step(profile, &th, 20, 1500.0, &lm);
        assert_eq!(c.feedback(), Feedback::new("Too Fast! Slow Down", FeedbackTone::Warning));
        c.step(profile, &th, 20, 1500.0, &lm);
        // 速すぎてもカウントは進む
        assert!(c.step(profile, &th, 20, 1500.0, &lm));
        assert_eq!(c.reps(), 1);
        assert_eq!(c.feedback().text, "Too Fast! Slow Down");
        c.step(profile, &th, 20, 0.0, &lm);
        assert_eq!(c.feedback().text, "Good Rep!");
    }

    #[test]
    fn test_speed_at_limit_is_fine() {
        let mut c = counter();
        let profile = ExerciseType::BicepCurl.profile();
        c.step(profile, &profile.default_thresholds, 100, 1200.0, &Landmarks::default());
        assert_eq!(c.feedback().tone, FeedbackTone::Neutral);
    }

    #[test]
    fn test_form_check_only_in_down() {
        let mut c = counter();
        let profile = ExerciseType::Squat.profile();
        let th = profile.default_thresholds;
        let mut lm = Landmarks::default();
        lm.set(LandmarkIndex::LeftKnee, Landmark::new(0.7, 0.7, 0.9));
        lm.set(LandmarkIndex::LeftAnkle, Landmark::new(0.5, 0.9, 0.9));

        c.step(profile, &th, 170, 0.0, &lm);
        assert_eq!(c.feedback().text, "Stand inside frame");

        for _ in 0..3 {
            c.step(profile, &th, 70, 0.0, &lm);
        }
        assert_eq!(c.phase(), Phase::Down);
        assert_eq!(c.feedback(), Feedback::new("Knee Past Toes!", FeedbackTone::Warning));

        // フォーム警告中でもレップは数える
        for _ in 0..3 {
            c.step(profile, &th, 170, 0.0, &lm);
        }
        assert_eq!(c.reps(), 1);
        assert_eq!(c.feedback().text, "Perfect!");
    }

    #[test]
    fn test_squat_approach_hint() {
        let mut c = counter();
        let profile = ExerciseType::Squat.profile();
        let lm = Landmarks::default();
        c.step(profile, &profile.default_thresholds, 100, 0.0, &lm);
        assert_eq!(c.feedback(), Feedback::new("Lower! (<90)", FeedbackTone::Warning));
        c.step(profile, &profile.default_thresholds, 130, 0.0, &lm);
        assert_eq!(c.feedback().text, "Stand inside frame");
    }

    #[test]
    fn test_mark_lost_keeps_state() {
        let mut c = counter();
        let ex = ExerciseType::BicepCurl;
        feed(&mut c, ex, &[170, 170]);
        c.mark_lost();
        assert_eq!(c.feedback(), Feedback::new("Adjust Camera / Body", FeedbackTone::Error));
        // ロスト前の2フレームと合わせて3フレームで DOWN
        feed(&mut c, ex, &[170]);
        assert_eq!(c.phase(), Phase::Down);
        assert_eq!(c.feedback().text, "Curl Up");
    }

    #[test]
    fn test_reset() {
        let mut c = counter();
        feed(&mut c, ExerciseType::BicepCurl, &[170, 170, 170, 20, 20, 20]);
        assert_eq!(c.reps(), 1);
        c.reset();
        assert_eq!(c.reps(), 0);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.feedback().text, "Stand inside frame");
    }

    #[test]
    fn test_color_hint() {
        assert_eq!(FeedbackTone::Success.color_hint(), [0, 255, 0]);
        assert_eq!(FeedbackTone::Error.color_hint(), [255, 0, 0]);
    }
}
