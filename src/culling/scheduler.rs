/// 剔除排程
///
/// 包住 CullingContext：節流、失去視點時的一次性清除、開關與效能日誌。
use failure::Error;
use log::{debug, info};
use std::time::Instant;

use crate::config::CullingConfig;
use crate::culling::context::CullingContext;
use crate::culling::culled_set::CulledSet;
use crate::culling::pool::PoolStats;
use crate::culling::stats::{CullingStats, PassSummary, TimingWindow};
use crate::culling::target::{CullingFrame, EntityId, Occludable};
use crate::geometry::Shadow;

/// 一次 tick 的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    /// 完成一次剔除
    Culled,
    /// 距離上次剔除未滿間隔
    Throttled,
    /// 失去視點或不允許剔除，已清除結果
    Reset,
    /// 沒有視點且結果早已清除，不做事
    Idle,
    /// 剔除已關閉
    Disabled,
}

pub struct CullingScheduler {
    config: CullingConfig,
    context: CullingContext,
    enabled: bool,
    /// 剔除結果非空，需要在失去視點時清除
    dirty: bool,
    last_run: Option<f64>,
    last_log: Option<f64>,
    timing: TimingWindow,
    last_pass: PassSummary,
    ticks: u64,
}

impl CullingScheduler {
    pub fn new(config: CullingConfig) -> Result<Self, Error> {
        let config = config.validated();
        let context = CullingContext::new(&config)?;
        Ok(Self {
            enabled: config.enabled,
            timing: TimingWindow::new(config.timing_samples),
            config,
            context,
            dirty: false,
            last_run: None,
            last_log: None,
            last_pass: PassSummary::default(),
            ticks: 0,
        })
    }

    /// 每幀呼叫一次，`now` 為宿主的時間（秒）
    pub fn tick<T: Occludable + Sync>(&mut self, now: f64, frame: &CullingFrame<'_, T>) -> TickOutcome {
        if !self.enabled {
            return TickOutcome::Disabled;
        }

        let viewpoint = match frame.viewpoint {
            Some(vp) if frame.culling_permitted => vp.world_position(),
            _ => {
                if self.dirty {
                    self.clear_results();
                    info!("no viewpoint, culling results cleared");
                    return TickOutcome::Reset;
                }
                return TickOutcome::Idle;
            }
        };

        if let Some(last) = self.last_run {
            if now - last < self.config.cull_interval {
                return TickOutcome::Throttled;
            }
        }

        let started = Instant::now();
        self.last_pass = self.context.cull(viewpoint, frame);
        self.timing.record(started.elapsed());
        self.last_run = Some(now);
        self.dirty = true;
        self.ticks += 1;
        debug!(
            "tick {}: culled {}/{} with {} shadows",
            self.ticks, self.last_pass.culled, self.last_pass.total, self.last_pass.active_shadows
        );

        if self.config.debug_log {
            let due = self.last_log.map_or(true, |t| now - t >= self.config.log_interval);
            if due {
                info!("{}", self.stats());
                self.last_log = Some(now);
            }
        }
        TickOutcome::Culled
    }

    /// 開關剔除；關閉時立即清除現有結果
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.clear_results();
        }
        info!("culling {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 宿主移除所有實體時呼叫，清空全部狀態
    pub fn reset(&mut self) {
        self.context.reset();
        self.dirty = false;
        self.last_run = None;
        self.last_log = None;
        self.timing.clear();
        self.last_pass = PassSummary::default();
        self.ticks = 0;
    }

    fn clear_results(&mut self) {
        self.context.clear();
        self.dirty = false;
        self.last_run = None;
        self.last_pass = PassSummary::default();
    }

    pub fn is_culled(&self, id: EntityId) -> bool {
        self.context.is_culled(id)
    }

    pub fn culled_set(&self) -> &CulledSet {
        self.context.culled_set()
    }

    pub fn active_shadows(&self) -> &[Shadow] {
        self.context.active_shadows()
    }

    pub fn stats(&self) -> CullingStats {
        CullingStats::from_pass(&self.last_pass, &self.timing, self.ticks)
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.context.pool_stats()
    }

    pub fn config(&self) -> &CullingConfig {
        &self.config
    }
}
