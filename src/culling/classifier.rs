/// 實體遮擋分類
///
/// 只測試面向視點的那幾條邊：任何穿過邊界框的視線都從這些邊進入，
/// 這些邊全部落在陰影裡，整個框就看不到。
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::culling::target::{EntityId, Occludable};
use crate::geometry::{Bounds, FragmentBuffer, Segment, Shadow};
use crate::vision::quadrant::{Quadrant, QuadrantIndex};

/// 分類結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Visible,
    Culled,
}

impl Visibility {
    pub fn is_culled(self) -> bool {
        self == Visibility::Culled
    }
}

/// 本 tick 已被剔除的房間（id → 邊界）
pub type CulledRooms = HashMap<EntityId, Bounds>;

/// 剔除分類器，借用本 tick 的象限索引與有效陰影清單
#[derive(Debug, Clone, Copy)]
pub struct OcclusionClassifier<'a> {
    index: &'a QuadrantIndex,
    shadows: &'a [Shadow],
    view_rect: Option<&'a Bounds>,
}

impl<'a> OcclusionClassifier<'a> {
    pub fn new(index: &'a QuadrantIndex, shadows: &'a [Shadow], view_rect: Option<&'a Bounds>) -> Self {
        Self { index, shadows, view_rect }
    }

    /// 分類單一目標
    pub fn classify<T: Occludable + ?Sized>(
        &self,
        target: &T,
        culled_rooms: Option<&CulledRooms>,
        fragments: &mut FragmentBuffer,
    ) -> Visibility {
        if target.never_cull() {
            return Visibility::Visible;
        }
        let bounds = match target.occlusion_bounds() {
            Some(b) => b,
            None => return Visibility::Visible,
        };

        if let (Some(room), Some(rooms)) = (target.parent_room(), culled_rooms) {
            if let Some(room_bounds) = rooms.get(&room) {
                if room_bounds.strictly_contains(&bounds) {
                    return Visibility::Culled;
                }
            }
        }

        self.classify_bounds(&bounds, fragments)
    }

    /// 以邊界框做邊測試
    pub fn classify_bounds(&self, bounds: &Bounds, fragments: &mut FragmentBuffer) -> Visibility {
        if bounds.is_degenerate() || self.shadows.is_empty() {
            return Visibility::Visible;
        }
        if let Some(rect) = self.view_rect {
            if !rect.intersects(bounds) {
                return Visibility::Visible;
            }
        }

        let edges = bounds.edges();
        let quadrant = edges
            .as_array()
            .iter()
            .fold(Quadrant::empty(), |q, edge| q | self.index.classify_segment(edge));

        let silhouette = match silhouette_edges(quadrant, bounds) {
            Some(s) => s,
            None => return Visibility::Visible,
        };

        for edge in silhouette.iter() {
            fragments.reset(*edge);
            for shadow in self.shadows.iter().filter(|s| s.quadrant.overlaps(quadrant)) {
                if fragments.clip_by_shadow(shadow) == 0 {
                    break;
                }
            }
            if !fragments.is_empty() {
                return Visibility::Visible;
            }
        }
        Visibility::Culled
    }
}

/// 依象限選出面向視點的邊；橫跨太多象限時回傳 None
pub fn silhouette_edges(quadrant: Quadrant, bounds: &Bounds) -> Option<SmallVec<[Segment; 2]>> {
    let e = bounds.edges();
    let edges: SmallVec<[Segment; 2]> = match quadrant {
        q if q == Quadrant::RIGHT_TOP => smallvec::smallvec![e.left, e.bottom],
        q if q == Quadrant::LEFT_TOP => smallvec::smallvec![e.right, e.bottom],
        q if q == Quadrant::LEFT_BOTTOM => smallvec::smallvec![e.right, e.top],
        q if q == Quadrant::RIGHT_BOTTOM => smallvec::smallvec![e.left, e.top],
        q if q == Quadrant::TOP => smallvec::smallvec![e.bottom],
        q if q == Quadrant::BOTTOM => smallvec::smallvec![e.top],
        q if q == Quadrant::LEFT => smallvec::smallvec![e.right],
        q if q == Quadrant::RIGHT => smallvec::smallvec![e.left],
        // 三個以上象限、對角象限或空集合：視點在框內或緊貼框邊
        _ => return None,
    };
    Some(edges)
}
