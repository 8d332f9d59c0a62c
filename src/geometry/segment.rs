use smallvec::SmallVec;
use vek::Vec2;

use super::ray::{Ray, RayRange};
use super::shadow::Shadow;
use super::{cross, MIN_FRAGMENT_LENGTH, PARALLEL_EPSILON};

/// 線段裁切結果（對陰影最多三段）
pub type ShadowClips = SmallVec<[Segment; 3]>;
/// 線段裁切結果（對象限楔形最多兩段）
pub type RangeClips = SmallVec<[Segment; 2]>;

/// 有向線段
///
/// 衍生量在建構時一次算好，裁切熱路徑中不重算。
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Vec2<f32>,
    pub end: Vec2<f32>,
    pub start_to_end: Vec2<f32>,
    pub center: Vec2<f32>,
    pub length_squared: f32,
    pub length: f32,
}

impl Segment {
    pub fn new(start: Vec2<f32>, end: Vec2<f32>) -> Self {
        let start_to_end = end - start;
        let length_squared = start_to_end.magnitude_squared();
        Self {
            start,
            end,
            start_to_end,
            center: (start + end) * 0.5,
            length_squared,
            length: length_squared.sqrt(),
        }
    }

    /// 零長度線段視為無效
    pub fn is_degenerate(&self) -> bool {
        self.start_to_end == Vec2::zero()
    }

    /// 反轉方向
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    /// 線段與射線求交
    ///
    /// 交點 = start + start_to_end * t = ray.origin + ray.direction * s，
    /// 對兩邊分別做叉積解出 t 與 s；t ∈ [0,1] 且 s ≥ 0 才算相交。
    pub fn try_intersect_ray(&self, ray: &Ray) -> Option<Vec2<f32>> {
        let denominator = cross(self.start_to_end, ray.direction);
        if denominator.abs() < PARALLEL_EPSILON {
            return None;
        }

        let start_to_origin = ray.origin - self.start;
        let s = cross(start_to_origin, self.start_to_end) / denominator;
        if s < 0.0 {
            return None;
        }
        let t = cross(start_to_origin, ray.direction) / denominator;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(self.start + self.start_to_end * t)
    }

    /// 兩線段求交，兩邊參數皆限制在 [0,1]
    pub fn try_intersect_segment(&self, other: &Segment) -> Option<Vec2<f32>> {
        let denominator = cross(self.start_to_end, other.start_to_end);
        if denominator.abs() < PARALLEL_EPSILON {
            return None;
        }

        let start_to_start = other.start - self.start;
        let s = cross(start_to_start, self.start_to_end) / denominator;
        if !(0.0..=1.0).contains(&s) {
            return None;
        }
        let t = cross(start_to_start, other.start_to_end) / denominator;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(self.start + self.start_to_end * t)
    }

    /// 取出線段落在陰影楔形之外的部分
    ///
    /// 最多三個切點（遮擋線段、ray1、ray2）。每個切點保留位於楔形外側的那一段，
    /// 外側由線段方向與切線方向的叉積相對 scan_dir 的正負決定。
    /// 沒有任何切點時，線段整段在內或整段在外，以中點做一次包含測試：
    /// 先前裁切留下的片段端點剛好落在另一個陰影的邊界上，不能拿來判斷。
    pub fn clip_by_shadow(&self, shadow: &Shadow) -> ShadowClips {
        let mut clips = ShadowClips::new();
        let dir = shadow.scan_dir;
        if shadow.is_pass_through() {
            clips.push(*self);
            return clips;
        }

        let occluder = &shadow.occluder;

        if let Some(hit) = self.try_intersect_segment(occluder) {
            let c = cross(self.start_to_end, occluder.start_to_end);
            if c.abs() >= PARALLEL_EPSILON {
                self.push_piece(&mut clips, hit, if c * dir > 0.0 { self.start } else { self.end });
            }
        }

        if let Some(hit) = self.try_intersect_ray(&shadow.ray1) {
            let c = cross(self.start_to_end, shadow.ray1.direction);
            if c.abs() >= PARALLEL_EPSILON {
                self.push_piece(&mut clips, hit, if c * dir < 0.0 { self.start } else { self.end });
            }
        }

        if let Some(hit) = self.try_intersect_ray(&shadow.ray2) {
            let c = cross(self.start_to_end, shadow.ray2.direction);
            if c.abs() >= PARALLEL_EPSILON {
                self.push_piece(&mut clips, hit, if c * dir > 0.0 { self.start } else { self.end });
            }
        }

        if clips.is_empty() && !shadow.contains_point(self.center) {
            clips.push(*self);
        }

        clips
    }

    /// 取出線段落在象限楔形之外的部分
    pub fn clip_by_range(&self, range: &RayRange) -> RangeClips {
        let mut clips = RangeClips::new();
        let dir = range.scan_dir;
        if dir.abs() < PARALLEL_EPSILON {
            clips.push(*self);
            return clips;
        }

        if let Some(hit) = self.try_intersect_ray(&range.start) {
            let c = cross(self.start_to_end, range.start.direction);
            if c.abs() >= PARALLEL_EPSILON {
                self.push_piece(&mut clips, hit, if c * dir < 0.0 { self.start } else { self.end });
            }
        }

        if let Some(hit) = self.try_intersect_ray(&range.end) {
            let c = cross(self.start_to_end, range.end.direction);
            if c.abs() >= PARALLEL_EPSILON {
                self.push_piece(&mut clips, hit, if c * dir > 0.0 { self.start } else { self.end });
            }
        }

        if clips.is_empty() && !range.contains_point(self.center) {
            clips.push(*self);
        }

        clips
    }

    /// 線段是否碰觸象限楔形（含邊界）
    pub fn intersects_range(&self, range: &RayRange) -> bool {
        if range.scan_dir.abs() < PARALLEL_EPSILON {
            return self.try_intersect_ray(&range.start).is_some();
        }

        if self.try_intersect_ray(&range.start).is_some() || self.try_intersect_ray(&range.end).is_some() {
            return true;
        }

        range.contains_point(self.start)
    }

    fn push_piece<A: smallvec::Array<Item = Segment>>(
        &self,
        clips: &mut SmallVec<A>,
        cut: Vec2<f32>,
        keep: Vec2<f32>,
    ) {
        // 共用邊界射線的兩個陰影會在交界留下極短的碎片
        let piece = Segment::new(cut, keep);
        if piece.length >= MIN_FRAGMENT_LENGTH {
            clips.push(piece);
        }
    }
}

/// 方向無關的相等：起終點互換視為同一線段
impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_derived_values() {
        let seg = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0));
        assert_eq!(seg.length, 5.0);
        assert_eq!(seg.length_squared, 25.0);
        assert_eq!(seg.center, Vec2::new(1.5, 2.0));
        assert_eq!(seg.start_to_end, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_equality_ignores_direction() {
        let a = Segment::new(Vec2::new(1.0, 2.0), Vec2::new(5.0, 7.0));
        assert_eq!(a, a.reversed());
        assert_ne!(a, Segment::new(Vec2::new(1.0, 2.0), Vec2::new(5.0, 8.0)));
    }

    #[test]
    fn test_ray_intersection() {
        let seg = Segment::new(Vec2::new(-5.0, 10.0), Vec2::new(5.0, 10.0));

        let up = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 3.0));
        let hit = seg.try_intersect_ray(&up).expect("ray points at the segment");
        assert!((hit - Vec2::new(0.0, 10.0)).magnitude() < 1e-4);

        // 射線背向線段
        let down = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, -1.0));
        assert!(seg.try_intersect_ray(&down).is_none());

        // 平行
        let side = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(seg.try_intersect_ray(&side).is_none());

        // 交點落在線段外
        let miss = Ray::new(Vec2::new(20.0, 0.0), Vec2::new(0.0, 1.0));
        assert!(seg.try_intersect_ray(&miss).is_none());
    }

    #[test]
    fn test_segment_intersection() {
        let a = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Segment::new(Vec2::new(0.0, 10.0), Vec2::new(10.0, 0.0));
        let hit = a.try_intersect_segment(&b).expect("diagonals cross");
        assert!((hit - Vec2::new(5.0, 5.0)).magnitude() < 1e-4);

        let c = Segment::new(Vec2::new(20.0, 0.0), Vec2::new(30.0, 10.0));
        assert!(a.try_intersect_segment(&c).is_none());
    }

    #[test]
    fn test_pass_through_shadow_keeps_segment() {
        // 牆正對視點，楔形退化
        let shadow = Shadow::new(Vec2::new(0.0, -10.0), Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0));
        assert!(shadow.is_pass_through());

        let across = Segment::new(Vec2::new(-5.0, 20.0), Vec2::new(5.0, 20.0));
        assert_eq!(across.clip_by_shadow(&shadow).as_slice(), &[across]);

        // 沿著牆的延長線
        let along = Segment::new(Vec2::new(0.0, 30.0), Vec2::new(0.0, 2.0));
        let clips = along.clip_by_shadow(&shadow);
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0], along.reversed());
    }

    #[test]
    fn test_degenerate_range() {
        // 兩條射線同向
        let range = RayRange::new(Vec2::zero(), Vec2::new(1.0, 0.0), Vec2::new(3.0, 0.0));
        assert!(range.is_degenerate());

        let crossing = Segment::new(Vec2::new(5.0, -1.0), Vec2::new(5.0, 1.0));
        assert_eq!(crossing.clip_by_range(&range).as_slice(), &[crossing]);

        // 只剩起始射線的相交測試
        assert!(crossing.intersects_range(&range));
        let behind = Segment::new(Vec2::new(-5.0, -1.0), Vec2::new(-5.0, 1.0));
        assert!(!behind.intersects_range(&range));
        let above = Segment::new(Vec2::new(2.0, 1.0), Vec2::new(8.0, 3.0));
        assert!(!above.intersects_range(&range));
    }

    #[test]
    fn test_segment_on_occluder_line() {
        let shadow = Shadow::new(Vec2::zero(), Vec2::new(10.0, 10.0), Vec2::new(-10.0, 10.0));
        assert!(shadow.scan_dir > 0.0);

        // 與牆重合的部分算在陰影內
        let on_wall = Segment::new(Vec2::new(-5.0, 10.0), Vec2::new(5.0, 10.0));
        assert!(on_wall.clip_by_shadow(&shadow).is_empty());

        // 比牆長的話只剩兩端
        let longer = Segment::new(Vec2::new(-30.0, 10.0), Vec2::new(30.0, 10.0));
        let clips = longer.clip_by_shadow(&shadow);
        assert_eq!(clips.len(), 2);
        let total: f32 = clips.iter().map(|c| c.length).sum();
        assert!((total - 40.0).abs() < 1e-3, "remaining {}", total);
        for piece in clips.iter() {
            assert!(piece.center.x.abs() > 10.0);
        }
    }

    #[test]
    fn test_degenerate_segment() {
        let p = Vec2::new(4.0, 4.0);
        assert!(Segment::new(p, p).is_degenerate());
        assert!(!Segment::new(p, p + Vec2::new(0.0, 1.0)).is_degenerate());
    }
}
