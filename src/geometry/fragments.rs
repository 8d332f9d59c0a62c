use super::ray::RayRange;
use super::segment::Segment;
use super::shadow::Shadow;

/// 連續裁切用的線段片段緩衝
///
/// 以兩個 Vec 交替作為讀寫區：每次裁切把 `live` 的每個片段裁切後寫入 `spare`，
/// 再交換兩者。容量在暖機後固定，熱路徑中不再配置記憶體。
#[derive(Debug, Default)]
pub struct FragmentBuffer {
    live: Vec<Segment>,
    spare: Vec<Segment>,
}

impl FragmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            live: Vec::with_capacity(capacity),
            spare: Vec::with_capacity(capacity),
        }
    }

    /// 重設為單一線段
    pub fn reset(&mut self, segment: Segment) {
        self.live.clear();
        self.spare.clear();
        if !segment.is_degenerate() {
            self.live.push(segment);
        }
    }

    pub fn clear(&mut self) {
        self.live.clear();
        self.spare.clear();
    }

    /// 以陰影裁切所有片段，回傳剩餘片段數
    pub fn clip_by_shadow(&mut self, shadow: &Shadow) -> usize {
        self.spare.clear();
        for fragment in &self.live {
            self.spare.extend(fragment.clip_by_shadow(shadow));
        }
        std::mem::swap(&mut self.live, &mut self.spare);
        self.live.len()
    }

    /// 以象限楔形裁切所有片段，回傳剩餘片段數
    pub fn clip_by_range(&mut self, range: &RayRange) -> usize {
        self.spare.clear();
        for fragment in &self.live {
            self.spare.extend(fragment.clip_by_range(range));
        }
        std::mem::swap(&mut self.live, &mut self.spare);
        self.live.len()
    }

    /// 依序以多個陰影裁切；片段耗盡即提前結束
    pub fn clip_by_shadows<'a, I>(&mut self, shadows: I) -> usize
    where
        I: IntoIterator<Item = &'a Shadow>,
    {
        for shadow in shadows {
            if self.clip_by_shadow(shadow) == 0 {
                break;
            }
        }
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn fragments(&self) -> &[Segment] {
        &self.live
    }

    /// 剩餘片段的總長度
    pub fn total_length(&self) -> f32 {
        self.live.iter().map(|s| s.length).sum()
    }
}
