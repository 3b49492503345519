/// BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 可視度 (0.0〜1.0)
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    /// 可視度が閾値以上かつ座標が画面内か
    ///
    /// NaN はどの比較も偽になるため不合格になる
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
            && (0.0..=1.0).contains(&self.x)
            && (0.0..=1.0).contains(&self.y)
    }

    pub fn point(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// 1フレーム分のランドマーク
///
/// 検出されなかったランドマークは `None`
#[derive(Debug, Clone)]
pub struct Landmarks {
    points: [Option<Landmark>; LandmarkIndex::COUNT],
}

impl Landmarks {
    pub fn new(points: [Option<Landmark>; LandmarkIndex::COUNT]) -> Self {
        Self { points }
    }

    /// 長さが足りない入力は欠損扱い、余分は無視
    pub fn from_slice(points: &[Option<Landmark>]) -> Self {
        let mut landmarks = Self::default();
        for (slot, lm) in landmarks.points.iter_mut().zip(points) {
            *slot = *lm;
        }
        landmarks
    }

    pub fn set(&mut self, index: LandmarkIndex, landmark: Landmark) {
        self.points[index as usize] = Some(landmark);
    }

    pub fn get(&self, index: LandmarkIndex) -> Option<&Landmark> {
        self.points[index as usize].as_ref()
    }

    /// 可視度ゲートを通過したランドマークのみ返す
    pub fn visible(&self, index: LandmarkIndex, threshold: f32) -> Option<&Landmark> {
        self.get(index).filter(|lm| lm.is_visible(threshold))
    }
}

impl Default for Landmarks {
    fn default() -> Self {
        Self {
            points: [None; LandmarkIndex::COUNT],
        }
    }
}
