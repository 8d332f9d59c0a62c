/// 物件池
///
/// 以有界 channel 當作閒置清單。取出時沒有閒置物件就新建，歸還時池已滿就直接丟棄。
use crossbeam_channel::{bounded, Receiver, Sender};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::culling::target::EntityId;
use crate::geometry::FragmentBuffer;

/// 可回收的物件，歸還前會被重設
pub trait Poolable: Send {
    fn reset(&mut self);
}

/// 物件池統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub idle: usize,
    pub created: usize,
    pub reused: usize,
    pub discarded: usize,
}

pub struct ObjectPool<T: Poolable> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    factory: fn() -> T,
    capacity: usize,
    created: AtomicUsize,
    reused: AtomicUsize,
    discarded: AtomicUsize,
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new(capacity: usize, factory: fn() -> T) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            factory,
            capacity,
            created: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        }
    }

    /// 預先建立 count 個物件
    pub fn prewarm(&self, count: usize) {
        for _ in 0..count.min(self.capacity) {
            if self.sender.try_send((self.factory)()).is_err() {
                break;
            }
            self.created.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 借出一個物件，guard 被 drop 時自動歸還
    pub fn get(&self) -> Pooled<'_, T> {
        let item = match self.receiver.try_recv() {
            Ok(item) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                item
            }
            Err(_) => {
                self.created.fetch_add(1, Ordering::Relaxed);
                (self.factory)()
            }
        };
        Pooled { pool: self, item: Some(item) }
    }

    fn put(&self, mut item: T) {
        item.reset();
        if self.sender.try_send(item).is_err() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 丟棄所有閒置物件
    pub fn drain(&self) -> usize {
        self.receiver.try_iter().count()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            idle: self.receiver.len(),
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

impl<T: Poolable> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool").field("stats", &self.stats()).finish()
    }
}

/// 借出中的物件
pub struct Pooled<'a, T: Poolable> {
    pool: &'a ObjectPool<T>,
    item: Option<T>,
}

impl<'a, T: Poolable> Deref for Pooled<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // item 只在 drop 時取走
        self.item.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<'a, T: Poolable> DerefMut for Pooled<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<'a, T: Poolable> Drop for Pooled<'a, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.put(item);
        }
    }
}

/// 每個工作批次借用的暫存區
#[derive(Debug, Default)]
pub struct ClipScratch {
    pub fragments: FragmentBuffer,
    pub results: Vec<(EntityId, bool)>,
}

impl ClipScratch {
    pub fn new() -> Self {
        Self {
            fragments: FragmentBuffer::with_capacity(16),
            results: Vec::with_capacity(128),
        }
    }
}

impl Poolable for ClipScratch {
    fn reset(&mut self) {
        self.fragments.clear();
        self.results.clear();
    }
}
