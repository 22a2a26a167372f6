pub mod cli;
pub mod errors;
pub mod loader;

use topmarks_config::AppConfig;
use tracing::info;

pub use cli::{CliSession, ImportSummary};
pub use errors::FrontendError;
pub use loader::InputSource;

/// 按配置打开 CLI 会话。
pub fn open_cli_session(config: &AppConfig) -> CliSession {
    info!(data_dir = %config.storage.data_dir.display(), "启动 CLI 前端");
    CliSession::from_config(config)
}
