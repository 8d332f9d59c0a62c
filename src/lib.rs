/// Shadowcull Library
///
/// 2D 陰影投射式遮擋剔除：由視點與遮擋線段投射陰影楔形，
/// 找出完全被遮住、本幀不需要繪製的實體。

pub mod config;
pub mod geometry;
pub mod vision;
pub mod culling;

// Re-export commonly used types
pub use crate::config::CullingConfig;
pub use crate::culling::{
    CullingFrame, CullingScheduler, CullingStats, EntityId, Occludable, OccluderEdge, OcclusionTarget,
    TargetKind, TickOutcome, Viewpoint, Visibility,
};
pub use crate::geometry::{Bounds, Segment, Shadow};
