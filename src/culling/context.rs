/// 剔除上下文
///
/// 持有跨 tick 重用的所有狀態：象限索引、陰影緩衝、精簡與預測修正的暫存、
/// 剔除結果、物件池與工作執行緒池。
use failure::Error;
use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use vek::Vec2;

use crate::config::CullingConfig;
use crate::culling::classifier::{CulledRooms, OcclusionClassifier, Visibility};
use crate::culling::culled_set::CulledSet;
use crate::culling::pool::{ClipScratch, ObjectPool, PoolStats};
use crate::culling::stats::PassSummary;
use crate::culling::target::{CullingFrame, EntityId, Occludable};
use crate::geometry::Shadow;
use crate::vision::{PredictionAdjuster, QuadrantIndex, ShadowBuilder, ShadowReducer};

pub struct CullingContext {
    index: QuadrantIndex,
    builder: ShadowBuilder,
    reducer: ShadowReducer,
    adjuster: PredictionAdjuster,
    shadows: Vec<Shadow>,
    culled_rooms: CulledRooms,
    culled: CulledSet,
    pool: ObjectPool<ClipScratch>,
    thread_pool: Arc<ThreadPool>,
    batch_size: usize,
    last_viewpoint: Option<Vec2<f32>>,
}

impl CullingContext {
    pub fn new(config: &CullingConfig) -> Result<Self, Error> {
        let threads = config.thread_count();
        let thread_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(move |i| format!("cull-{}", i))
                .build()?,
        );
        info!("culling context: {} worker threads, batch size {}", threads, config.batch_size);

        let pool = ObjectPool::new(config.pool_capacity, ClipScratch::new);
        pool.prewarm(threads);

        Ok(Self {
            index: QuadrantIndex::default(),
            builder: ShadowBuilder::new(config.occluder_margin),
            reducer: ShadowReducer::new(),
            adjuster: PredictionAdjuster::new(
                config.prediction_threshold,
                config.prediction_lookahead,
                config.joint_radius,
                config.end_margin,
            ),
            shadows: Vec::new(),
            culled_rooms: CulledRooms::new(),
            culled: CulledSet::new(),
            pool,
            thread_pool,
            batch_size: config.batch_size.max(1),
            last_viewpoint: None,
        })
    }

    /// 執行一次完整的剔除：建構、精簡、預測修正、分類
    pub fn cull<T: Occludable + Sync>(&mut self, viewpoint: Vec2<f32>, frame: &CullingFrame<'_, T>) -> PassSummary {
        self.index.update(viewpoint);

        let view_rect = frame.view_rect.as_ref();
        let built = self
            .builder
            .build(frame.occluders, viewpoint, view_rect, &self.index, &mut self.shadows);
        let dropped = self.reducer.reduce(&mut self.shadows);
        let shrunk = match self.last_viewpoint {
            Some(previous) => self.adjuster.adjust(&mut self.shadows, viewpoint, previous, &self.index),
            None => 0,
        };
        self.last_viewpoint = Some(viewpoint);
        debug!("shadows built {} dropped {} shrunk {}", built, dropped, shrunk);

        self.culled.clear();
        self.culled_rooms.clear();

        let classifier = OcclusionClassifier::new(&self.index, &self.shadows, view_rect);

        // 房間先分類，房內物件才能走捷徑
        Self::classify_batches(&self.thread_pool, &self.pool, &self.culled, self.batch_size, &classifier, frame.rooms, None);
        for room in frame.rooms {
            if self.culled.is_culled(room.id()) {
                if let Some(bounds) = room.occlusion_bounds() {
                    self.culled_rooms.insert(room.id(), bounds);
                }
            }
        }

        let rooms = if self.culled_rooms.is_empty() { None } else { Some(&self.culled_rooms) };
        Self::classify_batches(&self.thread_pool, &self.pool, &self.culled, self.batch_size, &classifier, frame.entities, rooms);

        PassSummary {
            built_shadows: built,
            active_shadows: self.shadows.len(),
            shrunk_shadows: shrunk,
            culled: self.culled.culled_count(),
            total: self.culled.total_count(),
        }
    }

    fn classify_batches<T: Occludable + Sync>(
        thread_pool: &ThreadPool,
        pool: &ObjectPool<ClipScratch>,
        culled: &CulledSet,
        batch_size: usize,
        classifier: &OcclusionClassifier<'_>,
        targets: &[T],
        rooms: Option<&CulledRooms>,
    ) {
        if targets.is_empty() {
            return;
        }
        thread_pool.install(|| {
            targets.par_chunks(batch_size).for_each(|batch| {
                let mut scratch = pool.get();
                let ClipScratch { fragments, results } = &mut *scratch;
                for target in batch {
                    let visibility = classifier.classify(target, rooms, fragments);
                    results.push((target.id(), visibility == Visibility::Culled));
                }
                culled.publish(results.as_slice());
            });
        });
    }

    /// 清除剔除結果與預測用的視點紀錄
    pub fn clear(&mut self) {
        self.culled.clear();
        self.culled_rooms.clear();
        self.last_viewpoint = None;
    }

    /// 清除所有狀態，包含陰影緩衝與閒置的暫存物件
    pub fn reset(&mut self) {
        self.clear();
        self.shadows.clear();
        self.shadows.shrink_to_fit();
        let drained = self.pool.drain();
        info!("culling context reset, {} pooled buffers released", drained);
    }

    pub fn is_culled(&self, id: EntityId) -> bool {
        self.culled.is_culled(id)
    }

    pub fn culled_set(&self) -> &CulledSet {
        &self.culled
    }

    pub fn active_shadows(&self) -> &[Shadow] {
        &self.shadows
    }

    pub fn last_viewpoint(&self) -> Option<Vec2<f32>> {
        self.last_viewpoint
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn thread_count(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::target::{OccluderEdge, OcclusionTarget, TargetKind};
    use crate::geometry::Bounds;

    fn config() -> CullingConfig {
        CullingConfig {
            worker_threads: 2,
            batch_size: 4,
            ..CullingConfig::default()
        }
    }

    fn boxed(id: EntityId, cx: f32, cy: f32) -> OcclusionTarget {
        OcclusionTarget::new(id, TargetKind::Item, Bounds::from_center_size(Vec2::new(cx, cy), Vec2::new(2.0, 2.0)))
    }

    #[test]
    fn test_cull_wall_scene() {
        let mut context = CullingContext::new(&config()).unwrap();
        assert_eq!(context.thread_count(), 2);

        let walls = [OccluderEdge::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0))];
        let entities: Vec<_> = (0..20)
            .map(|i| boxed(i, 5.0, 50.0 + i as f32 * 3.0))
            .chain([boxed(100, 5.0, -50.0), boxed(101, 100.0, 50.0)])
            .collect();
        let frame = CullingFrame::new(None, &walls, &entities);

        let summary = context.cull(Vec2::new(5.0, -10.0), &frame);
        assert_eq!(summary.built_shadows, 1);
        assert_eq!(summary.active_shadows, 1);
        assert_eq!(summary.total, 22);
        assert_eq!(summary.culled, 20);
        assert!(context.is_culled(0));
        assert!(context.is_culled(19));
        assert!(!context.is_culled(100));
        assert!(!context.is_culled(101));
        assert!(context.pool_stats().reused > 0);
    }

    #[test]
    fn test_rooms_are_classified_first() {
        let mut context = CullingContext::new(&config()).unwrap();
        let walls = [OccluderEdge::new(Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0))];
        let room = OcclusionTarget::room(1, Bounds::new(Vec2::new(-10.0, 20.0), Vec2::new(10.0, 40.0)));
        let rooms = [room];
        let entities = [boxed(2, 0.0, 30.0).in_room(1), boxed(3, 0.0, -30.0)];
        let frame = CullingFrame::new(None, &walls, &entities).with_rooms(&rooms);

        let summary = context.cull(Vec2::new(0.0, -10.0), &frame);
        assert!(context.is_culled(1));
        assert!(context.is_culled(2));
        assert!(!context.is_culled(3));
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_clear_forgets_results() {
        let mut context = CullingContext::new(&config()).unwrap();
        let walls = [OccluderEdge::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0))];
        let entities = [boxed(1, 5.0, 50.0)];
        context.cull(Vec2::new(5.0, -10.0), &CullingFrame::new(None, &walls, &entities));
        assert!(context.is_culled(1));
        assert!(context.last_viewpoint().is_some());

        context.clear();
        assert!(!context.is_culled(1));
        assert!(context.last_viewpoint().is_none());

        context.reset();
        assert!(context.active_shadows().is_empty());
        assert_eq!(context.pool_stats().idle, 0);
    }
}
