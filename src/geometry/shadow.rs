use vek::Vec2;

use super::ray::Ray;
use super::segment::Segment;
use super::{cross, PARALLEL_EPSILON};
use crate::vision::quadrant::Quadrant;

/// 單一遮擋線段從視點投射出的陰影楔形
///
/// ray1、ray2 從遮擋線段兩端點出發，方向為「端點 - 光源」。
/// scan_dir 接近零表示遮擋線段正對視點（側面朝向），此時不產生遮擋。
#[derive(Debug, Clone, Copy)]
pub struct Shadow {
    pub light_source: Vec2<f32>,
    pub occluder: Segment,
    pub ray1: Ray,
    pub ray2: Ray,
    pub scan_dir: f32,
    pub quadrant: Quadrant,
}

impl Shadow {
    pub fn new(light_source: Vec2<f32>, vertex1: Vec2<f32>, vertex2: Vec2<f32>) -> Self {
        let ray1 = Ray::new(vertex1, vertex1 - light_source);
        let ray2 = Ray::new(vertex2, vertex2 - light_source);
        Self {
            light_source,
            occluder: Segment::new(vertex1, vertex2),
            ray1,
            ray2,
            scan_dir: cross(ray1.direction, ray2.direction),
            quadrant: Quadrant::empty(),
        }
    }

    /// 以新端點重算遮擋線段、兩條邊界射線與 scan_dir，象限保留原值
    pub fn recalculate(&mut self, vertex1: Vec2<f32>, vertex2: Vec2<f32>) {
        let quadrant = self.quadrant;
        *self = Self::new(self.light_source, vertex1, vertex2);
        self.quadrant = quadrant;
    }

    pub fn is_pass_through(&self) -> bool {
        self.scan_dir.abs() < PARALLEL_EPSILON
    }

    /// 點是否位於陰影楔形內（遮擋線段之後、兩條邊界射線之間）
    pub fn contains_point(&self, point: Vec2<f32>) -> bool {
        if self.is_pass_through() {
            return false;
        }
        let dir = self.scan_dir;
        let from_start = point - self.occluder.start;
        let in_front = cross(from_start, self.occluder.start_to_end) * dir < 0.0;
        let outside_ray1 = cross(from_start, self.ray1.direction) * dir > 0.0;
        let outside_ray2 = cross(point - self.occluder.end, self.ray2.direction) * dir < 0.0;
        !(in_front || outside_ray1 || outside_ray2)
    }

    /// 視點到遮擋線段中心的距離平方（排序鍵）
    pub fn distance_squared(&self) -> f32 {
        self.occluder.center.distance_squared(self.light_source)
    }
}

impl PartialEq for Shadow {
    fn eq(&self, other: &Self) -> bool {
        self.light_source == other.light_source && self.occluder == other.occluder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_shadow() -> Shadow {
        // 視點在牆下方，端點順序讓 scan_dir 為正
        Shadow::new(Vec2::new(5.0, -10.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 0.0))
    }

    #[test]
    fn test_scan_dir_sign_follows_winding() {
        let shadow = wall_shadow();
        assert!(shadow.scan_dir > 0.0);

        let flipped = Shadow::new(Vec2::new(5.0, -10.0), Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert!(flipped.scan_dir < 0.0);
        assert_eq!(shadow, flipped);
    }

    #[test]
    fn test_edge_on_occluder_is_pass_through() {
        let shadow = Shadow::new(Vec2::new(0.0, -10.0), Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0));
        assert!(shadow.is_pass_through());
        assert!(!shadow.contains_point(Vec2::new(0.0, 20.0)));
    }

    #[test]
    fn test_contains_point() {
        for shadow in [wall_shadow(), Shadow::new(Vec2::new(5.0, -10.0), Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0))] {
            assert!(shadow.contains_point(Vec2::new(5.0, 50.0)), "behind the wall");
            assert!(!shadow.contains_point(Vec2::new(5.0, -5.0)), "in front of the wall");
            assert!(!shadow.contains_point(Vec2::new(100.0, 50.0)), "right of the wedge");
            assert!(!shadow.contains_point(Vec2::new(-100.0, 50.0)), "left of the wedge");
        }
    }

    #[test]
    fn test_recalculate_keeps_quadrant() {
        let mut shadow = wall_shadow();
        shadow.quadrant = Quadrant::TOP;
        shadow.recalculate(Vec2::new(8.0, 0.0), Vec2::new(0.0, 0.0));
        assert_eq!(shadow.quadrant, Quadrant::TOP);
        assert_eq!(shadow.occluder.start, Vec2::new(8.0, 0.0));
        assert!(shadow.scan_dir > 0.0);
    }
}
