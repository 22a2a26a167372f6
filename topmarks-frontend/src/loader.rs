use std::fs;
use std::io::Read;
use std::path::PathBuf;

use topmarks_config::{AppConfig, MapConfig, ParserConfig};
use topmarks_engine::render::RenderStyle;
use topmarks_engine::store::MarkStore;
use topmarks_io::{CoordinateParser, FileStore, FolderRepository, KeyValueStore, ParserOptions};
use tracing::info;

use crate::errors::FrontendError;

/// 粘贴文本的来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` 表示标准输入。
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            InputSource::Stdin
        } else {
            InputSource::File(PathBuf::from(arg))
        }
    }

    pub fn read_to_string(&self) -> Result<String, FrontendError> {
        match self {
            InputSource::Stdin => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .map_err(FrontendError::Stdin)?;
                Ok(buffer)
            }
            InputSource::File(path) => {
                fs::read_to_string(path).map_err(|source| FrontendError::ReadInput {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// 按配置的数据目录与键打开文件夹存储。
pub fn open_store(config: &AppConfig) -> MarkStore {
    let store: Box<dyn KeyValueStore> = Box::new(FileStore::new(&config.storage.data_dir));
    let repository = FolderRepository::with_key(store, config.storage.key.clone());
    let store = MarkStore::open(repository);
    info!(
        data_dir = %config.storage.data_dir.display(),
        corrupted = store.was_corrupted(),
        "已打开文件夹存储"
    );
    store
}

pub fn render_style(config: &MapConfig) -> RenderStyle {
    RenderStyle {
        default_center: (config.center[0], config.center[1]),
        zoom: config.zoom,
        palette: config.palette.clone(),
        marker_radius_m: config.marker_radius_m,
    }
}

pub fn coordinate_parser(config: &ParserConfig) -> CoordinateParser {
    CoordinateParser::with_options(ParserOptions {
        validate_ranges: config.validate_ranges,
    })
}
