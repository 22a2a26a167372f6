use std::path::PathBuf;

use thiserror::Error;
use topmarks_engine::errors::EngineError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("读取输入文件 {path:?} 失败: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("读取标准输入失败: {0}")]
    Stdin(#[source] std::io::Error),
    #[error("写出结果失败: {0}")]
    Output(#[from] std::io::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("命令执行失败: {0}")]
    Command(String),
    #[error("文件夹 {folder_id} 中不存在图层 {layer_id}")]
    LayerNotFound { folder_id: String, layer_id: String },
    #[error("没有可用的文件夹")]
    NoFolder,
}
