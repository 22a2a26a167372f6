use std::io::Write;

use topmarks_config::AppConfig;
use topmarks_engine::command::{CommandBus, CommandContext, CommandRequest};
use topmarks_engine::render::{RenderStyle, RenderView};
use topmarks_engine::store::{LayerDraft, MarkStore};
use topmarks_io::{CoordinateParser, ParseReport, format_line};
use tracing::{debug, info};

use crate::errors::FrontendError;
use crate::loader::{coordinate_parser, open_store, render_style};

/// 一次导入的统计结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub folder_id: String,
    pub layer_id: String,
    pub parsed: usize,
    pub candidate_lines: usize,
}

/// CLI 会话：持有存储、解析器与命令总线。
pub struct CliSession {
    store: MarkStore,
    parser: CoordinateParser,
    style: RenderStyle,
    bus: CommandBus,
}

impl CliSession {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_store(open_store(config), config)
    }

    pub fn with_store(store: MarkStore, config: &AppConfig) -> Self {
        Self {
            store,
            parser: coordinate_parser(&config.parser),
            style: render_style(&config.map),
            bus: CommandBus::new(),
        }
    }

    #[inline]
    pub fn store(&self) -> &MarkStore {
        &self.store
    }

    /// 只解析不提交，打印解析出的坐标与被丢弃的行号。
    pub fn preview(&self, text: &str, out: &mut impl Write) -> Result<ParseReport, FrontendError> {
        let report = self.parser.parse_report(text);
        for point in &report.points {
            writeln!(out, "{}\t{:.6}\t{:.6}", point.name, point.lat, point.lng)?;
        }
        for rejected in &report.rejected {
            writeln!(out, "已跳过第 {} 行: {}", rejected.line_number, rejected.text)?;
        }
        writeln!(
            out,
            "解析 {} / {} 行",
            report.parsed_count(),
            report.candidate_lines
        )?;
        Ok(report)
    }

    /// 解析文本并作为新图层提交到指定文件夹（缺省为第一个文件夹）。
    pub fn import(
        &mut self,
        text: &str,
        layer_name: &str,
        folder_id: Option<&str>,
        out: &mut impl Write,
    ) -> Result<ImportSummary, FrontendError> {
        let folder_id = match folder_id {
            Some(id) => id.to_string(),
            None => self
                .store
                .tree()
                .folder_ids()
                .next()
                .map(str::to_string)
                .ok_or(FrontendError::NoFolder)?,
        };
        let report = self.parser.parse_report(text);
        debug!(
            parsed = report.parsed_count(),
            rejected = report.rejected.len(),
            "已解析导入文本"
        );
        let parsed = report.parsed_count();
        let candidate_lines = report.candidate_lines;
        let layer_id = self
            .store
            .commit_layer(&folder_id, LayerDraft::new(layer_name, report.points))?;
        info!(folder_id = %folder_id, layer_id = %layer_id, parsed, "已导入图层");
        writeln!(
            out,
            "已创建图层 {layer_id}（{parsed} / {candidate_lines} 行）于文件夹 {folder_id}"
        )?;
        Ok(ImportSummary {
            folder_id,
            layer_id,
            parsed,
            candidate_lines,
        })
    }

    pub fn list_folders(&self, out: &mut impl Write) -> Result<(), FrontendError> {
        for folder in self.store.tree().folders() {
            writeln!(
                out,
                "{}\t{}\t{} 个图层",
                folder.id,
                folder.name,
                folder.layers.len()
            )?;
            for layer in &folder.layers {
                writeln!(out, "  {}\t{}\t{} 个标记", layer.id, layer.name, layer.marks.len())?;
            }
        }
        Ok(())
    }

    /// 通过命令总线执行命令；失败的响应转换为错误。
    pub fn run_command(
        &mut self,
        request: &CommandRequest,
        out: &mut impl Write,
    ) -> Result<(), FrontendError> {
        let mut context = CommandContext {
            store: &mut self.store,
        };
        let response = self.bus.dispatch(request, &mut context);
        let message = response.message.unwrap_or_default();
        if !response.success {
            return Err(FrontendError::Command(message));
        }
        writeln!(out, "{message}")?;
        Ok(())
    }

    /// 先按给定 ID 隐藏文件夹 / 图层，再打印渲染视图。
    pub fn render(
        &mut self,
        hidden_folders: &[String],
        hidden_layers: &[String],
        out: &mut impl Write,
    ) -> Result<RenderView, FrontendError> {
        for id in hidden_folders {
            self.run_command(&CommandRequest::new("hide_folder", [id.as_str()]), &mut std::io::sink())?;
        }
        for id in hidden_layers {
            self.run_command(&CommandRequest::new("hide_layer", [id.as_str()]), &mut std::io::sink())?;
        }

        let view = RenderView::build(self.store.tree(), self.store.visibility(), &self.style);
        writeln!(
            out,
            "中心 {:.6}, {:.6} 缩放 {}",
            view.center.0, view.center.1, view.zoom
        )?;
        for mark in &view.marks {
            writeln!(
                out,
                "{}\t{}\t{:.6}\t{:.6}\t{}",
                mark.color, mark.label, mark.lat, mark.lng, mark.layer_id
            )?;
        }
        Ok(view)
    }

    /// 将图层导出为可再次导入的文本。
    pub fn export_layer(
        &self,
        folder_id: &str,
        layer_id: &str,
        out: &mut impl Write,
    ) -> Result<(), FrontendError> {
        let layer = self.store.tree().layer(folder_id, layer_id).ok_or_else(|| {
            FrontendError::LayerNotFound {
                folder_id: folder_id.to_string(),
                layer_id: layer_id.to_string(),
            }
        })?;
        for mark in &layer.marks {
            writeln!(out, "{}", format_line(mark))?;
        }
        Ok(())
    }

    pub fn close(self) -> Result<(), FrontendError> {
        self.store.dispose()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use topmarks_io::MemoryStore;

    use super::*;

    const PASTE: &str = "Reef Marker - S38.06.123 | E144.48.456\nnoise\nBuoy - S38.07.000 | E144.49.000\n";

    fn session() -> CliSession {
        CliSession::with_store(
            MarkStore::open_store(MemoryStore::new()),
            &AppConfig::default(),
        )
    }

    #[test]
    fn import_then_export_round_trips_text() {
        let mut session = session();
        let mut out = Vec::new();
        let summary = session
            .import(PASTE, "Bay", None, &mut out)
            .expect("import");
        assert_eq!(summary.folder_id, "default");
        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.candidate_lines, 3);

        let mut exported = Vec::new();
        session
            .export_layer("default", &summary.layer_id, &mut exported)
            .expect("export");
        let exported = String::from_utf8(exported).unwrap();
        assert_eq!(
            exported,
            "Reef Marker - S38.06.123 | E144.48.456\nBuoy - S38.07.000 | E144.49.000\n"
        );
    }

    #[test]
    fn preview_lists_rejected_lines() {
        let session = session();
        let mut out = Vec::new();
        let report = session.preview(PASTE, &mut out).expect("preview");
        assert_eq!(report.parsed_count(), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("第 2 行: noise"));
        assert!(text.contains("解析 2 / 3 行"));
    }

    #[test]
    fn import_without_points_fails() {
        let mut session = session();
        let err = session
            .import("nothing here", "Bay", None, &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, FrontendError::Engine(_)));
        assert_eq!(session.store().tree().layer_count(), 0);
    }

    #[test]
    fn render_respects_hidden_layers() {
        let mut session = session();
        let summary = session
            .import(PASTE, "Bay", None, &mut Vec::new())
            .expect("import");
        let second = session
            .import("Far - S37.00.000 | E146.00.000", "Far", None, &mut Vec::new())
            .expect("import");

        let view = session
            .render(&[], &[summary.layer_id.clone()], &mut Vec::new())
            .expect("render");
        assert_eq!(view.marks.len(), 1);
        assert_eq!(view.marks[0].layer_id, second.layer_id);
        assert_eq!(view.center, (-37.0, 146.0));
    }

    #[test]
    fn repeated_hide_flags_keep_layer_hidden() {
        let mut session = session();
        let summary = session
            .import("Pin - S38.06.123 | E144.48.456", "Pin", None, &mut Vec::new())
            .expect("import");
        let hidden = [summary.layer_id.clone(), summary.layer_id.clone()];

        let view = session
            .render(&[], &hidden, &mut Vec::new())
            .expect("render");
        assert!(view.marks.is_empty());

        let again = session
            .render(&["default".to_string()], &hidden, &mut Vec::new())
            .expect("render again");
        assert!(again.marks.is_empty());
        assert!(!session.store().visibility().is_layer_visible(&summary.layer_id));
    }

    #[test]
    fn unknown_layer_export_is_an_error() {
        let session = session();
        let err = session
            .export_layer("default", "ghost", &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, FrontendError::LayerNotFound { .. }));
    }
}
