use bitflags::bitflags;
use vek::Vec2;

use crate::geometry::{RayRange, Segment};

bitflags! {
    /// 以視點為中心的四個象限楔形
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Quadrant: u8 {
        const RIGHT_TOP    = 0b0001;
        const LEFT_TOP     = 0b0010;
        const LEFT_BOTTOM  = 0b0100;
        const RIGHT_BOTTOM = 0b1000;

        const TOP    = Self::RIGHT_TOP.bits() | Self::LEFT_TOP.bits();
        const LEFT   = Self::LEFT_TOP.bits() | Self::LEFT_BOTTOM.bits();
        const BOTTOM = Self::LEFT_BOTTOM.bits() | Self::RIGHT_BOTTOM.bits();
        const RIGHT  = Self::RIGHT_TOP.bits() | Self::RIGHT_BOTTOM.bits();
        const ALL    = Self::TOP.bits() | Self::BOTTOM.bits();
    }
}

impl Quadrant {
    /// 四個單一象限，順序與 QuadrantIndex 內的楔形一致
    pub const SINGLES: [Quadrant; 4] = [
        Quadrant::RIGHT_TOP,
        Quadrant::LEFT_TOP,
        Quadrant::LEFT_BOTTOM,
        Quadrant::RIGHT_BOTTOM,
    ];

    /// 兩者角度範圍是否可能重疊
    #[inline]
    pub fn overlaps(self, other: Quadrant) -> bool {
        self.intersects(other)
    }

    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }
}

/// 象限索引
///
/// 四個原點固定在視點的 RayRange，邊界沿正負座標軸，scan_dir 皆為 +1。
/// 每個 tick 視點移動時重算一次。
#[derive(Debug, Clone)]
pub struct QuadrantIndex {
    origin: Vec2<f32>,
    ranges: [RayRange; 4],
}

impl QuadrantIndex {
    pub fn new(origin: Vec2<f32>) -> Self {
        let right = Vec2::new(1.0, 0.0);
        let up = Vec2::new(0.0, 1.0);
        let left = Vec2::new(-1.0, 0.0);
        let down = Vec2::new(0.0, -1.0);
        Self {
            origin,
            ranges: [
                RayRange::new(origin, right, up),
                RayRange::new(origin, up, left),
                RayRange::new(origin, left, down),
                RayRange::new(origin, down, right),
            ],
        }
    }

    pub fn origin(&self) -> Vec2<f32> {
        self.origin
    }

    /// 視點移動時更新原點；未移動則不動
    pub fn update(&mut self, origin: Vec2<f32>) -> bool {
        if origin == self.origin {
            return false;
        }
        self.origin = origin;
        for range in self.ranges.iter_mut() {
            range.set_origin(origin);
        }
        true
    }

    pub fn ranges(&self) -> impl Iterator<Item = (Quadrant, &RayRange)> {
        Quadrant::SINGLES.iter().copied().zip(self.ranges.iter())
    }

    /// 線段碰觸到的所有象限
    pub fn classify_segment(&self, segment: &Segment) -> Quadrant {
        let mut quadrant = Quadrant::empty();
        for (q, range) in self.ranges() {
            if segment.intersects_range(range) {
                quadrant |= q;
            }
        }
        quadrant
    }
}

impl Default for QuadrantIndex {
    fn default() -> Self {
        Self::new(Vec2::zero())
    }
}
