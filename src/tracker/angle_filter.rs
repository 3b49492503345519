use std::collections::VecDeque;

use crate::config::FilterConfig;

/// alpha = 1 / (1 + tau/Te), tau = 1/(2*pi*fc)
fn smoothing_factor(te: f32, cutoff: f32) -> f32 {
    let r = 2.0 * std::f32::consts::PI * cutoff * te;
    r / (r + 1.0)
}

/// One Euro stage over a fixed frame period.
///
/// The derivative is taken against the previous *filtered* value, so a
/// constant input settles to zero derivative.
struct OneEuroStage {
    min_cutoff: f32,
    beta: f32,
    d_cutoff: f32,
    te: f32,
    x_prev: Option<f32>,
    dx_prev: f32,
}

impl OneEuroStage {
    fn new(min_cutoff: f32, beta: f32, d_cutoff: f32, sample_rate: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
            te: 1.0 / sample_rate,
            x_prev: None,
            dx_prev: 0.0,
        }
    }

    fn filter(&mut self, x: f32) -> f32 {
        let x_prev = match self.x_prev {
            Some(prev) => prev,
            None => {
                self.x_prev = Some(x);
                return x;
            }
        };

        let dx = (x - x_prev) / self.te;
        let a_d = smoothing_factor(self.te, self.d_cutoff);
        let dx_hat = a_d * dx + (1.0 - a_d) * self.dx_prev;

        let cutoff = self.min_cutoff + self.beta * dx_hat.abs();
        let a = smoothing_factor(self.te, cutoff);
        let x_hat = a * x + (1.0 - a) * x_prev;

        self.x_prev = Some(x_hat);
        self.dx_prev = dx_hat;
        x_hat
    }

    fn reset(&mut self) {
        self.x_prev = None;
        self.dx_prev = 0.0;
    }
}

/// フィルタ出力
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredAngle {
    /// 平滑化後の角度 (deg, 切り捨て)
    pub angle: i32,
    /// 角速度 (deg/s, 常に非負)
    pub speed: f32,
}

/// 関節角用の二段フィルタ: One Euro → 移動平均
pub struct AngleFilter {
    stage1: OneEuroStage,
    window: VecDeque<f32>,
    capacity: usize,
    sample_rate: f32,
    prev_output: Option<i32>,
}

impl AngleFilter {
    pub fn new(min_cutoff: f32, beta: f32, d_cutoff: f32, sample_rate: f32, window: usize) -> Self {
        let capacity = window.max(1);
        Self {
            stage1: OneEuroStage::new(min_cutoff, beta, d_cutoff, sample_rate),
            window: VecDeque::with_capacity(capacity),
            capacity,
            sample_rate,
            prev_output: None,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(
            config.min_cutoff,
            config.beta,
            config.d_cutoff,
            config.sample_rate,
            config.window,
        )
    }

    pub fn apply(&mut self, raw_angle: f32) -> FilteredAngle {
        let smoothed = self.stage1.filter(raw_angle);

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(smoothed);
        let mean = self.window.iter().sum::<f32>() / self.window.len() as f32;
        let angle = mean as i32;

        let speed = match self.prev_output {
            Some(prev) => (angle - prev).abs() as f32 * self.sample_rate,
            None => 0.0,
        };
        self.prev_output = Some(angle);

        FilteredAngle { angle, speed }
    }

    pub fn reset(&mut self) {
        self.stage1.reset();
        self.window.clear();
        self.prev_output = None;
    }
}

impl Default for AngleFilter {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_factor_bounds() {
        for &cutoff in &[0.1, 1.0, 10.0, 100.0] {
            let alpha = smoothing_factor(1.0 / 30.0, cutoff);
            assert!(alpha > 0.0 && alpha < 1.0, "alpha={} for cutoff={}", alpha, cutoff);
        }
    }

    #[test]
    fn test_first_sample_passthrough() {
        let mut f = AngleFilter::default();
        let out = f.apply(123.7);
        assert_eq!(out.angle, 123);
        assert_eq!(out.speed, 0.0);
    }

    #[test]
    fn test_stage1_smooths_step() {
        let mut s = OneEuroStage::new(1.0, 0.005, 1.0, 30.0);
        s.filter(0.0);
        let result = s.filter(100.0);
        assert!(result > 0.0 && result < 100.0, "Expected smoothing, got {}", result);
    }

    #[test]
    fn test_high_beta_more_responsive() {
        let mut low = OneEuroStage::new(1.0, 0.0, 1.0, 30.0);
        let mut high = OneEuroStage::new(1.0, 1.0, 1.0, 30.0);
        low.filter(0.0);
        high.filter(0.0);
        let r_low = low.filter(100.0);
        let r_high = high.filter(100.0);
        assert!(r_high > r_low, "high beta ({}) should lead low beta ({})", r_high, r_low);
    }

    #[test]
    fn test_constant_input_zero_speed() {
        let mut f = AngleFilter::default();
        for _ in 0..200 {
            let out = f.apply(90.4);
            assert_eq!(out.angle, 90);
            assert_eq!(out.speed, 0.0);
        }
    }

    #[test]
    fn test_moving_average_window() {
        // beta=0, 巨大な min_cutoff で stage1 をほぼ素通しにする
        let mut f = AngleFilter::new(1.0e6, 0.0, 1.0, 30.0, 5);
        for _ in 0..5 {
            f.apply(0.0);
        }
        let out = f.apply(100.0);
        // (0*4 + ~100) / 5
        assert_eq!(out.angle, 19);
        assert!((out.speed - 19.0 * 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_converges_to_step() {
        let mut f = AngleFilter::default();
        f.apply(170.0);
        let mut last = 170;
        for _ in 0..60 {
            last = f.apply(20.0).angle;
        }
        assert!((last - 20).abs() <= 1, "did not converge: {}", last);
    }

    #[test]
    fn test_speed_non_negative() {
        let mut f = AngleFilter::default();
        for i in 0..50 {
            let raw = if i % 2 == 0 { 30.0 } else { 160.0 };
            assert!(f.apply(raw).speed >= 0.0);
        }
    }

    #[test]
    fn test_reset() {
        let mut f = AngleFilter::default();
        f.apply(10.0);
        f.apply(50.0);
        f.reset();
        let out = f.apply(150.0);
        assert_eq!(out.angle, 150);
        assert_eq!(out.speed, 0.0);
    }
}
