use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::culling::target::EntityId;

/// 每 tick 重建的剔除結果
///
/// 工作批次各自持有互不重疊的 key，每批只拿一次寫鎖發佈結果。
#[derive(Debug, Default)]
pub struct CulledSet {
    entries: RwLock<HashMap<EntityId, bool>>,
    culled: AtomicUsize,
    total: AtomicUsize,
}

impl CulledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
            culled: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    /// 發佈一個批次的結果
    ///
    /// 房間與實體共用同一個 key 空間，同一 tick 內 id 重複會覆蓋先前的結果。
    pub fn publish(&self, results: &[(EntityId, bool)]) {
        if results.is_empty() {
            return;
        }
        let culled = results.iter().filter(|(_, c)| *c).count();
        {
            let mut entries = self.entries.write();
            for &(id, culled) in results {
                let previous = entries.insert(id, culled);
                debug_assert!(previous.is_none(), "entity id {} published twice in one pass", id);
            }
        }
        self.culled.fetch_add(culled, Ordering::Relaxed);
        self.total.fetch_add(results.len(), Ordering::Relaxed);
    }

    /// 未分類的實體一律視為可見
    pub fn is_culled(&self, id: EntityId) -> bool {
        self.entries.read().get(&id).copied().unwrap_or(false)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.read().contains_key(&id)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.culled.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
    }

    pub fn culled_count(&self) -> usize {
        self.culled.load(Ordering::Relaxed)
    }

    pub fn total_count(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 目前所有被剔除的實體
    pub fn culled_ids(&self) -> Vec<EntityId> {
        self.entries
            .read()
            .iter()
            .filter_map(|(id, culled)| if *culled { Some(*id) } else { None })
            .collect()
    }
}
