use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// 最近 N 次剔除耗時的滑動視窗
#[derive(Debug, Clone)]
pub struct TimingWindow {
    samples: VecDeque<Duration>,
    limit: usize,
    sum: Duration,
}

impl TimingWindow {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            samples: VecDeque::with_capacity(limit),
            limit,
            sum: Duration::ZERO,
        }
    }

    pub fn record(&mut self, sample: Duration) {
        if self.samples.len() == self.limit {
            if let Some(old) = self.samples.pop_front() {
                self.sum -= old;
            }
        }
        self.samples.push_back(sample);
        self.sum += sample;
    }

    /// 平均耗時（毫秒）
    pub fn mean_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.sum.as_secs_f64() * 1000.0 / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = Duration::ZERO;
    }
}

/// 一次剔除的結果摘要
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// 建構出的陰影數
    pub built_shadows: usize,
    /// 精簡後實際使用的陰影數
    pub active_shadows: usize,
    /// 被預測修正收縮的陰影數
    pub shrunk_shadows: usize,
    pub culled: usize,
    pub total: usize,
}

/// 對外的剔除統計
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CullingStats {
    pub mean_ms: f64,
    pub culled: usize,
    pub total: usize,
    pub built_shadows: usize,
    pub active_shadows: usize,
    pub shrunk_shadows: usize,
    pub ticks: u64,
}

impl CullingStats {
    pub fn from_pass(summary: &PassSummary, timing: &TimingWindow, ticks: u64) -> Self {
        Self {
            mean_ms: timing.mean_ms(),
            culled: summary.culled,
            total: summary.total,
            built_shadows: summary.built_shadows,
            active_shadows: summary.active_shadows,
            shrunk_shadows: summary.shrunk_shadows,
            ticks,
        }
    }
}

impl fmt::Display for CullingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}ms | cull: {}/{} | shadows: {}/{}",
            self.mean_ms, self.culled, self.total, self.active_shadows, self.built_shadows
        )
    }
}
