//! Per-frame pipeline: landmarks → angle → filter → calibration →
//! thresholds → repetition state machine → session statistics.

use crate::config::Config;
use crate::exercise::ExerciseType;
use crate::pose::{Landmark, Landmarks};
use crate::session::{Assessment, SessionAssessment, SessionStats, SessionSummary};
use crate::tracker::angle::compute_angle;
use crate::tracker::angle_filter::AngleFilter;
use crate::tracker::calibration::{CalibrationStore, Envelope};
use crate::tracker::reps::{FeedbackTone, Phase, RepCounter};
use crate::tracker::threshold::ThresholdPair;

/// レップ完了時の通知先（効果音など）
pub trait CueSink {
    fn success(&mut self);
}

/// 何もしない通知先
pub struct SilentCue;

impl CueSink for SilentCue {
    fn success(&mut self) {}
}

/// 表示側が毎フレーム読む状態
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub reps: u32,
    pub phase: Phase,
    pub feedback: &'static str,
    pub tone: FeedbackTone,
    pub color_hint: [u8; 3],
    pub min_angle: Option<i32>,
    pub max_angle: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// 追跡できなかったフレームでは `None`
    pub filtered_angle: Option<i32>,
    /// 角速度 (deg/s)
    pub speed: f32,
    pub thresholds: ThresholdPair,
    pub rep_completed: bool,
    /// 連続ロストが閾値に達したら LOST TRACKING 表示
    pub tracking_lost: bool,
    pub snapshot: SessionSnapshot,
}

pub struct RepEngine {
    config: Config,
    filter: AngleFilter,
    calibration: CalibrationStore,
    counter: RepCounter,
    stats: SessionStats,
    lost_frames: u32,
    last_speed: f32,
    cue: Box<dyn CueSink>,
}

impl RepEngine {
    pub fn new(config: Config) -> Self {
        Self::with_cue(config, Box::new(SilentCue))
    }

    pub fn with_cue(config: Config, cue: Box<dyn CueSink>) -> Self {
        Self {
            filter: AngleFilter::from_config(&config.filter),
            calibration: CalibrationStore::new(&config.calibration),
            counter: RepCounter::new(&config.reps, config.tracking.visibility_threshold),
            stats: SessionStats::new(),
            lost_frames: 0,
            last_speed: 0.0,
            cue,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// セッション状態をすべて初期化する。フレーム間でのみ呼ぶこと
    pub fn reset_session(&mut self) {
        self.filter.reset();
        self.calibration.reset();
        self.counter.reset();
        self.stats.clear();
        self.lost_frames = 0;
        self.last_speed = 0.0;
    }

    fn joint_points(&self, exercise: ExerciseType, landmarks: &Landmarks) -> Option<[(f32, f32); 3]> {
        let joints = exercise.profile().joints;
        let th = self.config.tracking.visibility_threshold;
        let point = |lm: &Landmark| lm.point();
        Some([
            landmarks.visible(joints.a, th).map(point)?,
            landmarks.visible(joints.b, th).map(point)?,
            landmarks.visible(joints.c, th).map(point)?,
        ])
    }

    pub fn process_frame(&mut self, exercise: ExerciseType, landmarks: &Landmarks) -> FrameOutput {
        let [a, b, c] = match self.joint_points(exercise, landmarks) {
            Some(points) => points,
            None => return self.lost_frame(exercise),
        };
        let raw = compute_angle(a, b, c);
        if !raw.is_finite() {
            return self.lost_frame(exercise);
        }

        if self.lost_frames >= self.config.tracking.lost_marker_frames {
            log::debug!("tracking recovered after {} frames", self.lost_frames);
        }
        self.lost_frames = 0;

        let filtered = self.filter.apply(raw);
        self.last_speed = filtered.speed;
        self.stats.record(filtered.angle);

        self.calibration
            .update(exercise, self.counter.reps(), self.stats.history());
        let thresholds = self.calibration.thresholds(exercise);

        let rep_completed = self.counter.step(
            exercise.profile(),
            &thresholds,
            filtered.angle,
            filtered.speed,
            landmarks,
        );
        if rep_completed {
            self.cue.success();
        }

        FrameOutput {
            filtered_angle: Some(filtered.angle),
            speed: filtered.speed,
            thresholds,
            rep_completed,
            tracking_lost: false,
            snapshot: self.snapshot(),
        }
    }

    fn lost_frame(&mut self, exercise: ExerciseType) -> FrameOutput {
        self.lost_frames = self.lost_frames.saturating_add(1);
        self.counter.mark_lost();
        let tracking_lost = self.lost_frames >= self.config.tracking.lost_marker_frames;
        if self.lost_frames == self.config.tracking.lost_marker_frames {
            log::debug!("tracking lost for {} frames", self.lost_frames);
        }

        FrameOutput {
            filtered_angle: None,
            speed: 0.0,
            thresholds: self.calibration.thresholds(exercise),
            rep_completed: false,
            tracking_lost,
            snapshot: self.snapshot(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let feedback = self.counter.feedback();
        SessionSnapshot {
            reps: self.counter.reps(),
            phase: self.counter.phase(),
            feedback: feedback.text,
            tone: feedback.tone,
            color_hint: feedback.tone.color_hint(),
            min_angle: self.stats.min_angle(),
            max_angle: self.stats.max_angle(),
        }
    }

    pub fn last_speed(&self) -> f32 {
        self.last_speed
    }

    pub fn history(&self) -> &[i32] {
        self.stats.history()
    }

    pub fn envelope(&self, exercise: ExerciseType) -> Option<&Envelope> {
        self.calibration.envelope(exercise)
    }

    pub fn is_calibrated(&self, exercise: ExerciseType) -> bool {
        self.calibration.is_calibrated(exercise)
    }

    /// セッション終了時の ROM・疲労解析。次の `reset_session` より前に呼ぶ
    pub fn finalize(&self, exercise: ExerciseType) -> SessionAssessment {
        self.stats.assess(
            exercise.profile().family,
            self.calibration.envelope(exercise),
            &self.config.analysis,
        )
    }

    pub fn summary(&self, exercise: ExerciseType) -> SessionSummary {
        let assessment = self.finalize(exercise);
        let reps = self.counter.reps();
        SessionSummary {
            exercise: exercise.name().to_string(),
            reps,
            min_angle: self.stats.min_angle(),
            max_angle: self.stats.max_angle(),
            rom_score: assessment.rom_score,
            fatigue: assessment.fatigue,
            assessment: Assessment::from_reps(reps),
        }
    }
}

impl Default for RepEngine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
