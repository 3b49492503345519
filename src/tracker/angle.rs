//! Planar joint angle from three landmark positions.

/// Angle at vertex `b` between rays b→a and b→c, in degrees within [0, 180].
///
/// Computed as the difference of two `atan2` bearings; reflex angles are
/// folded back (`360 - angle`). Coincident points produce 0.
pub fn compute_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let radians = f32::atan2(c.1 - b.1, c.0 - b.0) - f32::atan2(a.1 - b.1, a.0 - b.0);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
