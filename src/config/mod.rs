pub mod culling_config;

pub use self::culling_config::{CullingConfig, DEFAULT_CONFIG_FILE};
