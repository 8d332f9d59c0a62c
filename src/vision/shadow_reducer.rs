/// 陰影集合精簡
///
/// 遮擋線段本身已完全落在其他陰影內的陰影是多餘的，分類結果不會因移除它而改變。
use log::trace;
use ordered_float::OrderedFloat;

use crate::geometry::{FragmentBuffer, Shadow};

/// 陰影精簡器，內部緩衝跨 tick 重用
#[derive(Debug, Default)]
pub struct ShadowReducer {
    alive: Vec<bool>,
    fragments: FragmentBuffer,
}

impl ShadowReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依距離由近到遠排序
    pub fn sort_by_distance(shadows: &mut [Shadow]) {
        shadows.sort_by_key(|s| OrderedFloat(s.distance_squared()));
    }

    /// 排序並移除多餘陰影，回傳移除的數量
    ///
    /// 由遠到近處理：目前的遮擋線段依序以其他仍存活且象限重疊的陰影裁切，
    /// 裁切後不剩任何片段就永久移除。已移除的陰影不再參與後續裁切。
    pub fn reduce(&mut self, shadows: &mut Vec<Shadow>) -> usize {
        Self::sort_by_distance(shadows);

        let count = shadows.len();
        self.alive.clear();
        self.alive.resize(count, true);

        for i in (0..count).rev() {
            let current = &shadows[i];
            self.fragments.reset(current.occluder);

            for (j, other) in shadows.iter().enumerate() {
                if j == i || !self.alive[j] || !other.quadrant.overlaps(current.quadrant) {
                    continue;
                }
                if self.fragments.clip_by_shadow(other) == 0 {
                    break;
                }
            }

            if self.fragments.is_empty() {
                trace!("shadow {} at {:?} is hidden by nearer shadows", i, current.occluder.center);
                self.alive[i] = false;
            }
        }

        let mut index = 0;
        let alive = &self.alive;
        shadows.retain(|_| {
            let keep = alive[index];
            index += 1;
            keep
        });
        count - shadows.len()
    }
}
