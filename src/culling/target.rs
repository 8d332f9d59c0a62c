/// 與宿主之間的介面
///
/// 遮擋物來源、視點與可被剔除的目標都由宿主提供，剔除核心只認這裡的型別。
use serde::{Deserialize, Serialize};
use vek::Vec2;

use crate::geometry::{Bounds, Segment};

/// 實體識別碼
pub type EntityId = u64;

/// 宿主提供的一條遮擋邊（區域座標 + 所屬載具的偏移）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccluderEdge {
    pub start: Vec2<f32>,
    pub end: Vec2<f32>,
    /// 父載具的繪製位置，加上後得到世界座標
    pub offset: Vec2<f32>,
    pub enabled: bool,
    /// 正在開關中的門之類，暫不投射陰影
    pub transitioning: bool,
}

impl OccluderEdge {
    pub fn new(start: Vec2<f32>, end: Vec2<f32>) -> Self {
        Self {
            start,
            end,
            offset: Vec2::zero(),
            enabled: true,
            transitioning: false,
        }
    }

    pub fn with_offset(mut self, offset: Vec2<f32>) -> Self {
        self.offset = offset;
        self
    }

    pub fn world_segment(&self) -> Segment {
        Segment::new(self.start + self.offset, self.end + self.offset)
    }

    /// 是否該參與本 tick 的陰影建構
    pub fn casts_shadow(&self) -> bool {
        self.enabled && !self.transitioning && self.start != self.end
    }
}

/// 視點（眼睛位置 + 所屬載具的偏移）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub position: Vec2<f32>,
    pub offset: Vec2<f32>,
}

impl Viewpoint {
    pub fn new(position: Vec2<f32>) -> Self {
        Self { position, offset: Vec2::zero() }
    }

    pub fn world_position(&self) -> Vec2<f32> {
        self.position + self.offset
    }
}

/// 目標種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Item,
    Structure,
    Character,
    Room,
}

/// 可被遮擋剔除的目標
///
/// 各種實體的邊界計算由宿主在每 tick 解析一次，剔除核心只看結果。
pub trait Occludable {
    /// 同一個 frame 內房間與實體的 id 必須互不重複
    fn id(&self) -> EntityId;

    /// 世界座標下的軸對齊邊界；無法取得時視為可見
    fn occlusion_bounds(&self) -> Option<Bounds>;

    /// 所在房間，用於階層式捷徑
    fn parent_room(&self) -> Option<EntityId> {
        None
    }

    /// 永遠不剔除（例如繪製中的電線）
    fn never_cull(&self) -> bool {
        false
    }
}

/// 通用的剔除目標
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcclusionTarget {
    pub id: EntityId,
    pub kind: TargetKind,
    pub bounds: Option<Bounds>,
    pub parent_room: Option<EntityId>,
    pub never_cull: bool,
}

impl OcclusionTarget {
    pub fn new(id: EntityId, kind: TargetKind, bounds: Bounds) -> Self {
        Self {
            id,
            kind,
            bounds: Some(bounds),
            parent_room: None,
            never_cull: false,
        }
    }

    pub fn room(id: EntityId, bounds: Bounds) -> Self {
        Self::new(id, TargetKind::Room, bounds)
    }

    pub fn in_room(mut self, room: EntityId) -> Self {
        self.parent_room = Some(room);
        self
    }

    pub fn always_visible(mut self) -> Self {
        self.never_cull = true;
        self
    }
}

impl Occludable for OcclusionTarget {
    fn id(&self) -> EntityId {
        self.id
    }

    fn occlusion_bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn parent_room(&self) -> Option<EntityId> {
        self.parent_room
    }

    fn never_cull(&self) -> bool {
        self.never_cull
    }
}

/// 一個 tick 的輸入
#[derive(Debug, Clone, Copy)]
pub struct CullingFrame<'a, T> {
    /// 沒有視點時清除剔除狀態
    pub viewpoint: Option<Viewpoint>,
    /// 攝影機視野矩形，用於預先過濾
    pub view_rect: Option<Bounds>,
    pub occluders: &'a [OccluderEdge],
    pub rooms: &'a [T],
    pub entities: &'a [T],
    /// 宿主目前是否允許剔除（遊戲進行中、非編輯器等）
    pub culling_permitted: bool,
}

impl<'a, T> CullingFrame<'a, T> {
    pub fn new(viewpoint: Option<Viewpoint>, occluders: &'a [OccluderEdge], entities: &'a [T]) -> Self {
        Self {
            viewpoint,
            view_rect: None,
            occluders,
            rooms: &[],
            entities,
            culling_permitted: true,
        }
    }

    pub fn with_rooms(mut self, rooms: &'a [T]) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_view_rect(mut self, view_rect: Bounds) -> Self {
        self.view_rect = Some(view_rect);
        self
    }

    pub fn permitted(mut self, permitted: bool) -> Self {
        self.culling_permitted = permitted;
        self
    }
}
