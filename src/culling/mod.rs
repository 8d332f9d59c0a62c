/// 遮擋剔除模組
///
/// 分類器、剔除結果、物件池與排程，以及與宿主之間的介面型別。
pub mod target;
pub mod classifier;
pub mod culled_set;
pub mod pool;
pub mod stats;
pub mod context;
pub mod scheduler;

pub use self::{
    target::{CullingFrame, EntityId, Occludable, OccluderEdge, OcclusionTarget, TargetKind, Viewpoint},
    classifier::{silhouette_edges, CulledRooms, OcclusionClassifier, Visibility},
    culled_set::CulledSet,
    pool::{ClipScratch, ObjectPool, PoolStats, Poolable, Pooled},
    stats::{CullingStats, PassSummary, TimingWindow},
    context::CullingContext,
    scheduler::{CullingScheduler, TickOutcome},
};
