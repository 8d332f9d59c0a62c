/// 幾何核心
///
/// 向量、線段、射線與陰影楔形，以及遮擋測試使用的裁切原語。
pub mod segment;
pub mod ray;
pub mod shadow;
pub mod fragments;
pub mod bounds;

use vek::Vec2;

pub use self::{
    segment::{Segment, ShadowClips, RangeClips},
    ray::{Ray, RayRange},
    shadow::Shadow,
    fragments::FragmentBuffer,
    bounds::{Bounds, BoundsEdges},
};

/// 平行與退化判定的容差
pub const PARALLEL_EPSILON: f32 = 1e-4;

/// 裁切後短於此長度的片段視為浮點誤差，直接丟棄
pub const MIN_FRAGMENT_LENGTH: f32 = 1e-4;

/// 二維叉積 a × b
#[inline]
pub fn cross(a: Vec2<f32>, b: Vec2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}
