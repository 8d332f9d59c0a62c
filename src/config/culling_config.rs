use failure::{format_err, Error, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 預設設定檔名稱
pub const DEFAULT_CONFIG_FILE: &str = "culling.toml";

/// 遮擋剔除設定
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CullingConfig {
    /// 是否啟用剔除
    pub enabled: bool,
    /// 兩次剔除之間的最短間隔（秒）
    pub cull_interval: f64,
    /// 每個工作批次處理的目標數
    pub batch_size: usize,
    /// 工作執行緒數，0 代表使用 CPU 核心數
    pub worker_threads: usize,
    /// 遮擋線段兩端向外延伸的長度，用來封住相鄰牆面的接縫
    pub occluder_margin: f32,
    /// 預測修正：視點每 tick 位移超過此值才啟動
    pub prediction_threshold: f32,
    /// 預測修正：預測位移 = 本 tick 位移 * lookahead
    pub prediction_lookahead: f32,
    /// 預測修正：牆角鄰近端點的判定半徑
    pub joint_radius: f32,
    /// 預測修正：收縮後遮擋線段至少保留的長度
    pub end_margin: f32,
    /// 物件池容量
    pub pool_capacity: usize,
    /// 平均耗時統計的取樣數
    pub timing_samples: usize,
    /// 輸出效能日誌
    pub debug_log: bool,
    /// 效能日誌間隔（秒）
    pub log_interval: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Setting {
    culling: CullingConfig,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cull_interval: 0.05,
            batch_size: 75,
            worker_threads: 0,
            occluder_margin: 1.0,
            prediction_threshold: 0.5,
            prediction_lookahead: 1.0,
            joint_radius: 3.0,
            end_margin: 1.0,
            pool_capacity: 1024,
            timing_samples: 60,
            debug_log: false,
            log_interval: 2.0,
        }
    }
}

impl CullingConfig {
    /// 從 TOML 檔讀取 `[culling]` 區段
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|e| format!("no such file {} exception:{}", path.display(), e))?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)
            .with_context(|e| format!("Error Reading CullingConfig: {}", e))?;
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let setting: Setting = toml::from_str(s).map_err(|e| format_err!("invalid culling config: {}", e))?;
        Ok(setting.culling.validated())
    }

    /// 讀取設定檔；檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("{} not found, using default culling config", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// 修正不合理的數值
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.batch_size == 0 {
            log::warn!("batch_size must be positive, using {}", defaults.batch_size);
            self.batch_size = defaults.batch_size;
        }
        if !(self.cull_interval >= 0.0) {
            log::warn!("cull_interval {} is invalid, using {}", self.cull_interval, defaults.cull_interval);
            self.cull_interval = defaults.cull_interval;
        }
        if !(self.occluder_margin >= 0.0) {
            self.occluder_margin = defaults.occluder_margin;
        }
        if !(self.end_margin > 0.0) {
            self.end_margin = defaults.end_margin;
        }
        if !(self.prediction_lookahead >= 0.0) {
            self.prediction_lookahead = defaults.prediction_lookahead;
        }
        if self.timing_samples == 0 {
            self.timing_samples = 1;
        }
        self
    }

    /// 實際使用的工作執行緒數
    pub fn thread_count(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }
}
