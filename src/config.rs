use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub reps: RepConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    /// 想定フレームレート (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f32,
    /// 静止時のカットオフ周波数 (Hz)
    #[serde(default = "default_min_cutoff")]
    pub min_cutoff: f32,
    /// 速度係数
    #[serde(default = "default_beta")]
    pub beta: f32,
    /// 微分のカットオフ周波数 (Hz)
    #[serde(default = "default_d_cutoff")]
    pub d_cutoff: f32,
    /// 移動平均の窓サイズ
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_sample_rate() -> f32 { 30.0 }
fn default_min_cutoff() -> f32 { 1.0 }
fn default_beta() -> f32 { 0.005 }
fn default_d_cutoff() -> f32 { 1.0 }
fn default_window() -> usize { 5 }

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            min_cutoff: default_min_cutoff(),
            beta: default_beta(),
            d_cutoff: default_d_cutoff(),
            window: default_window(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationConfig {
    /// キャリブレーション開始に必要なレップ数
    #[serde(default = "default_min_reps")]
    pub min_reps: u32,
    /// キャリブレーション開始に必要な履歴サンプル数
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// 最大角推定に使うパーセンタイル
    #[serde(default = "default_upper_percentile")]
    pub upper_percentile: f32,
    /// 最小角推定に使うパーセンタイル
    #[serde(default = "default_lower_percentile")]
    pub lower_percentile: f32,
    /// 指数平滑化における既存値の重み
    #[serde(default = "default_prior_weight")]
    pub prior_weight: f32,
    /// 可動域に対する閾値マージンの割合
    #[serde(default = "default_margin_ratio")]
    pub margin_ratio: f32,
}

fn default_min_reps() -> u32 { 3 }
fn default_min_samples() -> usize { 60 }
fn default_upper_percentile() -> f32 { 95.0 }
fn default_lower_percentile() -> f32 { 5.0 }
fn default_prior_weight() -> f32 { 0.7 }
fn default_margin_ratio() -> f32 { 0.15 }

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_reps: default_min_reps(),
            min_samples: default_min_samples(),
            upper_percentile: default_upper_percentile(),
            lower_percentile: default_lower_percentile(),
            prior_weight: default_prior_weight(),
            margin_ratio: default_margin_ratio(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepConfig {
    /// フェーズ確定に必要な連続フレーム数
    #[serde(default = "default_debounce_frames")]
    pub debounce_frames: u32,
    /// これを超える角速度 (deg/s) は速すぎると判定
    #[serde(default = "default_speed_limit")]
    pub speed_limit: f32,
    /// 膝と足首の水平距離の上限（正規化座標）
    #[serde(default = "default_knee_drift_limit")]
    pub knee_drift_limit: f32,
    /// 肩-腰-膝の角度の下限 (deg)
    #[serde(default = "default_trunk_min_angle")]
    pub trunk_min_angle: f32,
}

fn default_debounce_frames() -> u32 { 3 }
fn default_speed_limit() -> f32 { 1200.0 }
fn default_knee_drift_limit() -> f32 { 0.12 }
fn default_trunk_min_angle() -> f32 { 150.0 }

impl Default for RepConfig {
    fn default() -> Self {
        Self {
            debounce_frames: default_debounce_frames(),
            speed_limit: default_speed_limit(),
            knee_drift_limit: default_knee_drift_limit(),
            trunk_min_angle: default_trunk_min_angle(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// ランドマークの可視度閾値
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,
    /// LOST TRACKING 表示までの連続ロストフレーム数
    #[serde(default = "default_lost_marker_frames")]
    pub lost_marker_frames: u32,
}

fn default_visibility_threshold() -> f32 { 0.3 }
fn default_lost_marker_frames() -> u32 { 5 }

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: default_visibility_threshold(),
            lost_marker_frames: default_lost_marker_frames(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// ROMスコアの上限 (%)
    #[serde(default = "default_rom_cap")]
    pub rom_cap: f32,
    /// 疲労判定に必要な履歴サンプル数
    #[serde(default = "default_fatigue_min_samples")]
    pub fatigue_min_samples: usize,
}

fn default_rom_cap() -> f32 { 120.0 }
fn default_fatigue_min_samples() -> usize { 90 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rom_cap: default_rom_cap(),
            fatigue_min_samples: default_fatigue_min_samples(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 読み込みに失敗した場合はデフォルト設定を返す
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("config {} not loaded ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.filter.window, 5);
        assert_eq!(config.calibration.min_samples, 60);
        assert_eq!(config.reps.debounce_frames, 3);
        assert!((config.tracking.visibility_threshold - 0.3).abs() < 1e-6);
        assert_eq!(config.analysis.fatigue_min_samples, 90);
    }

    #[test]
    fn test_partial_section_override() {
        let config: Config = toml::from_str(
            r#"
            [reps]
            speed_limit = 900.0

            [tracking]
            visibility_threshold = 0.65
            "#,
        )
        .unwrap();
        assert_eq!(config.reps.speed_limit, 900.0);
        // 未指定の項目はデフォルト
        assert_eq!(config.reps.debounce_frames, 3);
        assert!((config.tracking.visibility_threshold - 0.65).abs() < 1e-6);
        assert_eq!(config.tracking.lost_marker_frames, 5);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.filter.sample_rate, 30.0);
        assert_eq!(config.analysis.rom_cap, 120.0);
    }
}
