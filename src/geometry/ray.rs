use vek::Vec2;

use super::{cross, PARALLEL_EPSILON};

/// 射線：起點 + 單位方向
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec2<f32>,
    pub direction: Vec2<f32>,
}

impl Ray {
    /// 零向量方向保持為零，不做正規化
    pub fn new(origin: Vec2<f32>, direction: Vec2<f32>) -> Self {
        let direction = if direction == Vec2::zero() {
            direction
        } else {
            direction.normalized()
        };
        Self { origin, direction }
    }
}

/// 由同一原點出發的兩條射線所夾的楔形
///
/// scan_dir = start.direction × end.direction，正負代表掃描的繞行方向，
/// 接近零代表兩條射線共線（退化楔形）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayRange {
    pub origin: Vec2<f32>,
    pub start: Ray,
    pub end: Ray,
    pub scan_dir: f32,
}

impl RayRange {
    pub fn new(origin: Vec2<f32>, start: Vec2<f32>, end: Vec2<f32>) -> Self {
        let start = Ray::new(origin, start);
        let end = Ray::new(origin, end);
        Self {
            origin,
            start,
            end,
            scan_dir: cross(start.direction, end.direction),
        }
    }

    /// 只移動原點，方向與 scan_dir 不變
    pub fn set_origin(&mut self, origin: Vec2<f32>) {
        self.origin = origin;
        self.start.origin = origin;
        self.end.origin = origin;
    }

    pub fn is_degenerate(&self) -> bool {
        self.scan_dir.abs() < PARALLEL_EPSILON
    }

    /// 點是否位於楔形內（含邊界）
    pub fn contains_point(&self, point: Vec2<f32>) -> bool {
        let to_point = point - self.origin;
        cross(to_point, self.start.direction) * self.scan_dir <= 0.0
            && cross(to_point, self.end.direction) * self.scan_dir >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec2::new(1.0, 1.0), Vec2::new(0.0, 5.0));
        assert!((ray.direction.magnitude() - 1.0).abs() < 1e-6);
        assert_eq!(ray.direction, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_zero_direction_stays_zero() {
        let ray = Ray::new(Vec2::new(1.0, 1.0), Vec2::zero());
        assert_eq!(ray.direction, Vec2::zero());
    }

    #[test]
    fn test_range_contains_point() {
        let range = RayRange::new(Vec2::zero(), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        assert!(range.scan_dir > 0.0);
        assert!(range.contains_point(Vec2::new(3.0, 4.0)));
        assert!(range.contains_point(Vec2::new(3.0, 0.0)));
        assert!(!range.contains_point(Vec2::new(-3.0, 4.0)));
        assert!(!range.contains_point(Vec2::new(3.0, -4.0)));
    }

    #[test]
    fn test_set_origin_keeps_directions() {
        let mut range = RayRange::new(Vec2::zero(), Vec2::new(-1.0, 0.0), Vec2::new(0.0, -1.0));
        let dir = range.scan_dir;
        range.set_origin(Vec2::new(10.0, 10.0));
        assert_eq!(range.start.origin, Vec2::new(10.0, 10.0));
        assert_eq!(range.end.origin, Vec2::new(10.0, 10.0));
        assert_eq!(range.scan_dir, dir);
        assert!(range.contains_point(Vec2::new(5.0, 5.0)));
    }
}
