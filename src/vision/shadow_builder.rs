/// 陰影建構
///
/// 每 tick 把宿主提供的遮擋邊轉成世界座標下的陰影楔形。
use log::{debug, trace};
use vek::Vec2;

use crate::culling::target::OccluderEdge;
use crate::geometry::{Bounds, Shadow};
use crate::vision::quadrant::QuadrantIndex;

/// 陰影建構器
///
/// 輸出緩衝由呼叫端持有並跨 tick 重用，遮擋邊數量超過容量時原地擴充。
#[derive(Debug, Clone)]
pub struct ShadowBuilder {
    /// 端點向外延伸的長度
    margin: f32,
}

impl ShadowBuilder {
    pub fn new(margin: f32) -> Self {
        Self { margin: margin.max(0.0) }
    }

    /// 建構本 tick 的陰影，回傳實際產生的數量
    pub fn build(
        &self,
        occluders: &[OccluderEdge],
        light_source: Vec2<f32>,
        view_rect: Option<&Bounds>,
        index: &QuadrantIndex,
        shadows: &mut Vec<Shadow>,
    ) -> usize {
        shadows.clear();
        if occluders.len() > shadows.capacity() {
            debug!("shadow buffer grows from {} to {}", shadows.capacity(), occluders.len());
            shadows.reserve(occluders.len());
        }

        for edge in occluders {
            if !edge.casts_shadow() {
                continue;
            }
            let segment = edge.world_segment();

            // 視野外的牆擋不住視野內的東西
            if let Some(rect) = view_rect {
                let hit = Bounds::from_points([segment.start, segment.end])
                    .map(|b| b.intersects(rect))
                    .unwrap_or(false);
                if !hit {
                    continue;
                }
            }

            if let Some(shadow) = self.cast(light_source, segment.start, segment.end, index) {
                shadows.push(shadow);
            }
        }

        trace!("built {} shadows from {} occluders", shadows.len(), occluders.len());
        shadows.len()
    }

    /// 由單一遮擋線段產生陰影；側面朝向視點時回傳 None
    pub fn cast(
        &self,
        light_source: Vec2<f32>,
        start: Vec2<f32>,
        end: Vec2<f32>,
        index: &QuadrantIndex,
    ) -> Option<Shadow> {
        let along = end - start;
        if along == Vec2::zero() {
            return None;
        }
        let along = along.normalized() * self.margin;
        let (mut v1, mut v2) = (start - along, end + along);

        let mut shadow = Shadow::new(light_source, v1, v2);
        if shadow.is_pass_through() {
            trace!("occluder {:?}-{:?} is edge-on, skipped", start, end);
            return None;
        }
        if shadow.scan_dir < 0.0 {
            std::mem::swap(&mut v1, &mut v2);
            shadow = Shadow::new(light_source, v1, v2);
        }
        shadow.quadrant = index.classify_segment(&shadow.occluder);
        Some(shadow)
    }
}

impl Default for ShadowBuilder {
    fn default() -> Self {
        Self::new(1.0)
    }
}
