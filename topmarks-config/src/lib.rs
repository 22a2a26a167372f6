use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "TOPMARKS_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub parser: ParserConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `TOPMARKS_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "StorageConfig::default_key")]
    pub key: String,
}

impl StorageConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from(".topmarks")
    }

    fn default_key() -> String {
        "topmarks-folders".to_string()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            key: Self::default_key(),
        }
    }
}

/// 地图呈现参数：无可见标记时的中心点、缩放级别与标记样式。
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "MapConfig::default_center")]
    pub center: [f64; 2],
    #[serde(default = "MapConfig::default_zoom")]
    pub zoom: u8,
    #[serde(default = "MapConfig::default_palette")]
    pub palette: Vec<String>,
    #[serde(default = "MapConfig::default_marker_radius")]
    pub marker_radius_m: f64,
}

impl MapConfig {
    fn default_center() -> [f64; 2] {
        [-38.1, 144.8]
    }

    fn default_zoom() -> u8 {
        10
    }

    fn default_palette() -> Vec<String> {
        vec!["#1976d2".to_string()]
    }

    fn default_marker_radius() -> f64 {
        120.0
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: Self::default_center(),
            zoom: Self::default_zoom(),
            palette: Self::default_palette(),
            marker_radius_m: Self::default_marker_radius(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParserConfig {
    /// 开启后丢弃纬度超出 ±90 或经度超出 ±180 的行。
    #[serde(default)]
    pub validate_ranges: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
