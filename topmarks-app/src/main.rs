use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use topmarks_config::{AppConfig, ConfigError};
use topmarks_engine::command::CommandRequest;
use topmarks_frontend::{CliSession, InputSource};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 将粘贴的坐标文本整理为文件夹 / 图层。
#[derive(Debug, Parser)]
#[command(name = "topmarks", version)]
struct Cli {
    /// 配置文件路径，缺省时自动发现。
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// 覆盖配置中的数据目录。
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 只解析文本，不提交（`-` 表示标准输入）。
    Parse { input: String },
    /// 解析文本并提交为新图层。
    Import {
        input: String,
        #[arg(long)]
        layer: String,
        #[arg(long)]
        folder: Option<String>,
    },
    /// 列出文件夹与图层。
    Folders,
    AddFolder { name: String },
    RenameFolder { id: String, name: String },
    RemoveFolder { id: String },
    RemoveLayer { folder_id: String, layer_id: String },
    /// 打印渲染视图，可临时隐藏文件夹或图层。
    Render {
        #[arg(long = "hide-folder")]
        hide_folders: Vec<String>,
        #[arg(long = "hide-layer")]
        hide_layers: Vec<String>,
    },
    /// 将图层导出为可再次导入的文本。
    Export { folder_id: String, layer_id: String },
}

fn main() {
    let cli = Cli::parse();
    let mut config = load_configuration(cli.config.clone());
    if let Some(dir) = cli.data_dir.clone() {
        config.storage.data_dir = dir;
    }
    init_logging(&config);
    info!("启动 Topmarks");

    if let Err(err) = run(cli.command, &config) {
        error!(error = %err, "命令执行失败");
        eprintln!("错误: {err:#}");
        std::process::exit(1);
    }
}

fn run(command: Command, config: &AppConfig) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Command::Parse { input } = &command {
        let text = InputSource::from_arg(input).read_to_string()?;
        let session = topmarks_frontend::open_cli_session(config);
        session.preview(&text, &mut out)?;
        out.flush()?;
        return Ok(());
    }

    let mut session = topmarks_frontend::open_cli_session(config);
    dispatch(&mut session, command, &mut out)?;
    session.close().context("关闭存储失败")?;
    out.flush()?;
    Ok(())
}

fn dispatch(
    session: &mut CliSession,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::Parse { .. } => {}
        Command::Import {
            input,
            layer,
            folder,
        } => {
            let text = InputSource::from_arg(&input).read_to_string()?;
            session
                .import(&text, &layer, folder.as_deref(), out)
                .with_context(|| format!("导入图层 {layer} 失败"))?;
        }
        Command::Folders => session.list_folders(out)?,
        Command::AddFolder { name } => {
            session.run_command(&CommandRequest::new("add_folder", [name]), out)?
        }
        Command::RenameFolder { id, name } => {
            session.run_command(&CommandRequest::new("rename_folder", [id, name]), out)?
        }
        Command::RemoveFolder { id } => {
            session.run_command(&CommandRequest::new("remove_folder", [id]), out)?
        }
        Command::RemoveLayer {
            folder_id,
            layer_id,
        } => session.run_command(
            &CommandRequest::new("remove_layer", [folder_id, layer_id]),
            out,
        )?,
        Command::Render {
            hide_folders,
            hide_layers,
        } => {
            session.render(&hide_folders, &hide_layers, out)?;
        }
        Command::Export {
            folder_id,
            layer_id,
        } => session.export_layer(&folder_id, &layer_id, out)?,
    }
    Ok(())
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
