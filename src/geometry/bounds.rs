use serde::{Deserialize, Serialize};
use vek::Vec2;

use super::segment::Segment;

/// 軸對齊邊界矩形（世界座標，y 軸向上）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2<f32>,
    pub max: Vec2<f32>,
}

/// 矩形的四條邊
#[derive(Debug, Clone, Copy)]
pub struct BoundsEdges {
    pub left: Segment,
    pub right: Segment,
    pub bottom: Segment,
    pub top: Segment,
}

impl Bounds {
    pub fn new(min: Vec2<f32>, max: Vec2<f32>) -> Self {
        Self {
            min: Vec2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Vec2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    pub fn from_center_size(center: Vec2<f32>, size: Vec2<f32>) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    /// 由繪製位置與區域座標下的 min/max 範圍建立邊界
    ///
    /// 寬高取 `max - min`。宿主引擎在某類物件上把 `max` 直接當成尺寸，
    /// 這裡不沿用那個寫法，也不做寬高加倍的補償。
    pub fn from_extents(origin: Vec2<f32>, local_min: Vec2<f32>, local_max: Vec2<f32>) -> Self {
        let size = local_max - local_min;
        Self::new(origin + local_min, origin + local_min + size)
    }

    /// 由任意一組點建立最小包圍矩形
    pub fn from_points<I: IntoIterator<Item = Vec2<f32>>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            (Vec2::new(min.x.min(p.x), min.y.min(p.y)), Vec2::new(max.x.max(p.x), max.y.max(p.y)))
        });
        Some(Self { min, max })
    }

    /// 嚴格包含：other 完全落在內部，不碰邊
    pub fn strictly_contains(&self, other: &Bounds) -> bool {
        other.min.x > self.min.x && other.max.x < self.max.x &&
        other.min.y > self.min.y && other.max.y < self.max.y
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2<f32> {
        (self.min + self.max) * 0.5
    }

    /// 寬或高為零的矩形無法做邊測試
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn edges(&self) -> BoundsEdges {
        let left_bottom = self.min;
        let right_top = self.max;
        let left_top = Vec2::new(self.min.x, self.max.y);
        let right_bottom = Vec2::new(self.max.x, self.min.y);
        BoundsEdges {
            left: Segment::new(left_bottom, left_top),
            right: Segment::new(right_bottom, right_top),
            bottom: Segment::new(left_bottom, right_bottom),
            top: Segment::new(left_top, right_top),
        }
    }
}

impl BoundsEdges {
    pub fn as_array(&self) -> [Segment; 4] {
        [self.left, self.right, self.bottom, self.top]
    }
}
