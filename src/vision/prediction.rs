/// 預測式容差修正
///
/// 剔除結果會延遲一個週期才生效。視點快速移動時，陰影邊界下一刻就會往內退，
/// 先把會後退的端點沿遮擋線段往內收，避免物件晚一步才出現。
use log::trace;
use vek::Vec2;

use crate::geometry::{cross, Ray, Shadow, PARALLEL_EPSILON};
use crate::vision::quadrant::QuadrantIndex;

/// 端點的後退旗標
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EndpointFlags {
    start: bool,
    end: bool,
}

/// 預測修正器
#[derive(Debug, Clone)]
pub struct PredictionAdjuster {
    /// 每 tick 位移超過此值才啟動
    pub threshold: f32,
    pub lookahead: f32,
    /// 牆角鄰近端點判定半徑
    pub joint_radius: f32,
    /// 收縮後至少保留的遮擋長度
    pub end_margin: f32,
    flags: Vec<EndpointFlags>,
}

impl PredictionAdjuster {
    pub fn new(threshold: f32, lookahead: f32, joint_radius: f32, end_margin: f32) -> Self {
        Self {
            threshold,
            lookahead,
            joint_radius,
            end_margin,
            flags: Vec::new(),
        }
    }

    /// 由目前與上一次的視點推算預測視點；位移不足時回傳 None
    pub fn predict(&self, current: Vec2<f32>, previous: Vec2<f32>) -> Option<Vec2<f32>> {
        let displacement = current - previous;
        if displacement.magnitude() <= self.threshold {
            return None;
        }
        Some(current + displacement * self.lookahead)
    }

    /// 修正陰影端點，回傳被收縮的陰影數
    ///
    /// 陰影的 scan_dir 必須已正規化為正值。
    pub fn adjust(
        &mut self,
        shadows: &mut [Shadow],
        current: Vec2<f32>,
        previous: Vec2<f32>,
        index: &QuadrantIndex,
    ) -> usize {
        let predicted = match self.predict(current, previous) {
            Some(p) => p,
            None => return 0,
        };

        self.flags.clear();
        self.flags.extend(shadows.iter().map(|s| Self::retreating(s, predicted)));

        let joint_radius_squared = self.joint_radius * self.joint_radius;
        let mut shrunk = 0;
        for i in 0..shadows.len() {
            let flags = self.flags[i];
            if !flags.start && !flags.end {
                continue;
            }

            let shadow = &shadows[i];
            let shrink_start = flags.start
                && !self.has_steady_neighbor(shadows, i, shadow.occluder.start, joint_radius_squared);
            let shrink_end = flags.end
                && !self.has_steady_neighbor(shadows, i, shadow.occluder.end, joint_radius_squared);
            if !shrink_start && !shrink_end {
                continue;
            }

            if let Some((v1, v2)) = self.shrink(shadow, predicted, shrink_start, shrink_end) {
                let shadow = &mut shadows[i];
                trace!(
                    "shadow {:?}-{:?} shrinks to {:?}-{:?}",
                    shadow.occluder.start,
                    shadow.occluder.end,
                    v1,
                    v2
                );
                shadow.recalculate(v1, v2);
                shadow.quadrant = index.classify_segment(&shadow.occluder);
                shrunk += 1;
            }
        }
        shrunk
    }

    /// 邊界射線朝楔形內部旋轉的端點即為後退端點
    fn retreating(shadow: &Shadow, predicted: Vec2<f32>) -> EndpointFlags {
        let light = shadow.light_source;
        let dir = shadow.scan_dir;
        let v1 = shadow.occluder.start;
        let v2 = shadow.occluder.end;
        EndpointFlags {
            start: cross(v1 - light, v1 - predicted) * dir > 0.0,
            end: cross(v2 - light, v2 - predicted) * dir < 0.0,
        }
    }

    /// 鄰近是否有其他遮擋物的端點不會後退（牆角接縫由鄰牆繼續遮住）
    fn has_steady_neighbor(&self, shadows: &[Shadow], own: usize, point: Vec2<f32>, radius_squared: f32) -> bool {
        shadows.iter().zip(self.flags.iter()).enumerate().any(|(j, (other, flags))| {
            if j == own {
                return false;
            }
            (other.occluder.start.distance_squared(point) <= radius_squared && !flags.start)
                || (other.occluder.end.distance_squared(point) <= radius_squared && !flags.end)
        })
    }

    /// 以預測的角度變化把邊界射線往內轉，求出與遮擋線段的新交點
    fn shrink(
        &self,
        shadow: &Shadow,
        predicted: Vec2<f32>,
        shrink_start: bool,
        shrink_end: bool,
    ) -> Option<(Vec2<f32>, Vec2<f32>)> {
        let occluder = &shadow.occluder;
        let max_shrink = occluder.length - self.end_margin;
        if max_shrink <= 0.0 {
            return None;
        }
        let along = occluder.start_to_end / occluder.length;

        let mut v1 = occluder.start;
        let mut v2 = occluder.end;
        let mut budget = max_shrink;

        if shrink_start {
            let amount = self.shrink_distance(shadow, occluder.start, predicted, budget);
            v1 = occluder.start + along * amount;
            budget -= amount;
        }
        if shrink_end && budget > 0.0 {
            let amount = self.shrink_distance(shadow, occluder.end, predicted, budget);
            v2 = occluder.end - along * amount;
        }

        if v1 == occluder.start && v2 == occluder.end {
            return None;
        }
        Some((v1, v2))
    }

    /// 端點沿遮擋線段往內移動的距離，上限為 budget
    fn shrink_distance(&self, shadow: &Shadow, vertex: Vec2<f32>, predicted: Vec2<f32>, budget: f32) -> f32 {
        let light = shadow.light_source;
        let current = vertex - light;
        let future = vertex - predicted;
        let theta = cross(current, future).atan2(current.dot(future));
        if theta.abs() < PARALLEL_EPSILON {
            return 0.0;
        }

        let (sin, cos) = theta.sin_cos();
        let rotated = Vec2::new(current.x * cos - current.y * sin, current.x * sin + current.y * cos);
        match shadow.occluder.try_intersect_ray(&Ray::new(light, rotated)) {
            Some(hit) => hit.distance(vertex).min(budget),
            // 轉過頭已越過整條遮擋線段
            None => budget,
        }
    }
}

impl Default for PredictionAdjuster {
    fn default() -> Self {
        Self::new(0.5, 1.0, 3.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::shadow_builder::ShadowBuilder;

    fn cast(light: Vec2<f32>, a: (f32, f32), b: (f32, f32)) -> Shadow {
        let index = QuadrantIndex::new(light);
        ShadowBuilder::new(0.0)
            .cast(light, Vec2::new(a.0, a.1), Vec2::new(b.0, b.1), &index)
            .unwrap()
    }

    #[test]
    fn test_small_motion_is_ignored() {
        let adjuster = PredictionAdjuster::default();
        assert!(adjuster.predict(Vec2::new(0.2, 0.0), Vec2::zero()).is_none());
        let p = adjuster.predict(Vec2::new(2.0, 0.0), Vec2::zero()).unwrap();
        assert_eq!(p, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_retreating_endpoint_shrinks() {
        // 牆在上方，視點往右移：右端點的邊界射線往左轉，陰影右側後退
        let previous = Vec2::new(-2.0, 0.0);
        let current = Vec2::new(0.0, 0.0);
        let index = QuadrantIndex::new(current);
        let mut shadows = vec![cast(current, (-10.0, 10.0), (10.0, 10.0))];
        let before = shadows[0];
        assert!(before.scan_dir > 0.0);

        let mut adjuster = PredictionAdjuster::default();
        assert_eq!(adjuster.adjust(&mut shadows, current, previous, &index), 1);

        let after = shadows[0];
        assert!(after.scan_dir > 0.0);
        assert!(after.occluder.length < before.occluder.length);
        // 右端 (start) 往內收，左端不動
        assert!(after.occluder.start.x < before.occluder.start.x);
        assert_eq!(after.occluder.end, before.occluder.end);
        // 剛好落在原本陰影邊緣內側的點不再被遮住
        let edge_point = Vec2::new(19.0, 20.0);
        assert!(before.contains_point(edge_point));
        assert!(!after.contains_point(edge_point));
    }

    #[test]
    fn test_steady_neighbor_blocks_shrink() {
        let previous = Vec2::new(-2.0, 0.0);
        let current = Vec2::new(0.0, 0.0);
        let index = QuadrantIndex::new(current);
        let wall = cast(current, (-10.0, 10.0), (10.0, 10.0));
        // 接在右端、往右下延伸的牆；在牆角那一端它的陰影是擴張的
        let corner = cast(current, (10.0, 10.0), (30.0, 5.0));
        let mut shadows = vec![wall, corner];

        let mut adjuster = PredictionAdjuster::default();
        adjuster.adjust(&mut shadows, current, previous, &index);
        assert_eq!(shadows[0].occluder.start, wall.occluder.start);
    }

    #[test]
    fn test_shrink_is_capped() {
        let previous = Vec2::new(-50.0, 0.0);
        let current = Vec2::new(0.0, 0.0);
        let index = QuadrantIndex::new(current);
        let mut shadows = vec![cast(current, (8.0, 10.0), (10.0, 10.0))];
        let mut adjuster = PredictionAdjuster::default();
        adjuster.adjust(&mut shadows, current, previous, &index);
        assert!(shadows[0].occluder.length >= 1.0 - 1e-4);
        assert!(!shadows[0].is_pass_through());
    }
}
