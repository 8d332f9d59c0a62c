/// 視野遮擋模組
///
/// 每 tick 依序執行：陰影建構、陰影精簡、預測修正，過程中共用象限索引。
pub mod quadrant;
pub mod shadow_builder;
pub mod shadow_reducer;
pub mod prediction;

pub use self::{
    quadrant::{Quadrant, QuadrantIndex},
    shadow_builder::ShadowBuilder,
    shadow_reducer::ShadowReducer,
    prediction::PredictionAdjuster,
};
