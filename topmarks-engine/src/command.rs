use std::collections::HashMap;

use crate::store::MarkStore;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn arg(&self, index: usize, label: &str) -> Result<&str, CommandResponse> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CommandResponse::err(format!("{} 缺少参数 <{label}>", self.name)))
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub store: &'a mut MarkStore,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(AddFolderCommand);
        bus.register(RenameFolderCommand);
        bus.register(RemoveFolderCommand);
        bus.register(RemoveLayerCommand);
        bus.register(ToggleLayerCommand);
        bus.register(ToggleFolderCommand);
        bus.register(HideLayerCommand);
        bus.register(HideFolderCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

struct AddFolderCommand;

impl CommandHandler for AddFolderCommand {
    fn name(&self) -> &'static str {
        "add_folder"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let name = match request.arg(0, "name") {
            Ok(name) => name.trim(),
            Err(response) => return response,
        };
        if name.is_empty() {
            return CommandResponse::err("文件夹名称不能为空");
        }
        let id = context.store.create_folder(name);
        CommandResponse::ok(id)
    }
}

struct RenameFolderCommand;

impl CommandHandler for RenameFolderCommand {
    fn name(&self) -> &'static str {
        "rename_folder"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let (id, name) = match (request.arg(0, "folder_id"), request.arg(1, "name")) {
            (Ok(id), Ok(name)) => (id, name),
            (Err(response), _) | (_, Err(response)) => return response,
        };
        if !context.store.tree().contains_folder(id) {
            return CommandResponse::ok(format!("文件夹 {id} 不存在，未做修改"));
        }
        context.store.rename_folder(id, name);
        CommandResponse::ok(format!("文件夹 {id} 已重命名为 {name}"))
    }
}

struct RemoveFolderCommand;

impl CommandHandler for RemoveFolderCommand {
    fn name(&self) -> &'static str {
        "remove_folder"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let id = match request.arg(0, "folder_id") {
            Ok(id) => id,
            Err(response) => return response,
        };
        if !context.store.tree().contains_folder(id) {
            return CommandResponse::ok(format!("文件夹 {id} 不存在，未做修改"));
        }
        context.store.remove_folder(id);
        CommandResponse::ok(format!("文件夹 {id} 已移除"))
    }
}

struct RemoveLayerCommand;

impl CommandHandler for RemoveLayerCommand {
    fn name(&self) -> &'static str {
        "remove_layer"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let (folder_id, layer_id) =
            match (request.arg(0, "folder_id"), request.arg(1, "layer_id")) {
                (Ok(folder_id), Ok(layer_id)) => (folder_id, layer_id),
                (Err(response), _) | (_, Err(response)) => return response,
            };
        if context.store.tree().layer(folder_id, layer_id).is_none() {
            return CommandResponse::ok(format!("图层 {layer_id} 不存在，未做修改"));
        }
        context.store.remove_layer(folder_id, layer_id);
        CommandResponse::ok(format!("图层 {layer_id} 已移除"))
    }
}

struct ToggleLayerCommand;

impl CommandHandler for ToggleLayerCommand {
    fn name(&self) -> &'static str {
        "toggle_layer"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let id = match request.arg(0, "layer_id") {
            Ok(id) => id,
            Err(response) => return response,
        };
        match context.store.toggle_layer(id) {
            Some(visible) => CommandResponse::ok(visibility_message("图层", id, visible)),
            None => CommandResponse::ok(format!("图层 {id} 不存在，未做修改")),
        }
    }
}

struct ToggleFolderCommand;

impl CommandHandler for ToggleFolderCommand {
    fn name(&self) -> &'static str {
        "toggle_folder"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let id = match request.arg(0, "folder_id") {
            Ok(id) => id,
            Err(response) => return response,
        };
        match context.store.toggle_folder(id) {
            Some(visible) => CommandResponse::ok(visibility_message("文件夹", id, visible)),
            None => CommandResponse::ok(format!("文件夹 {id} 不存在，未做修改")),
        }
    }
}

struct HideLayerCommand;

impl CommandHandler for HideLayerCommand {
    fn name(&self) -> &'static str {
        "hide_layer"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let id = match request.arg(0, "layer_id") {
            Ok(id) => id,
            Err(response) => return response,
        };
        if context.store.hide_layer(id) {
            CommandResponse::ok(visibility_message("图层", id, false))
        } else {
            CommandResponse::ok(format!("图层 {id} 不存在，未做修改"))
        }
    }
}

struct HideFolderCommand;

impl CommandHandler for HideFolderCommand {
    fn name(&self) -> &'static str {
        "hide_folder"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let id = match request.arg(0, "folder_id") {
            Ok(id) => id,
            Err(response) => return response,
        };
        if context.store.hide_folder(id) {
            CommandResponse::ok(visibility_message("文件夹", id, false))
        } else {
            CommandResponse::ok(format!("文件夹 {id} 不存在，未做修改"))
        }
    }
}

fn visibility_message(kind: &str, id: &str, visible: bool) -> String {
    if visible {
        format!("{kind} {id} 已显示")
    } else {
        format!("{kind} {id} 已隐藏")
    }
}

#[cfg(test)]
mod tests {
    use topmarks_core::geometry::GeoPoint;
    use topmarks_core::model::Layer;
    use topmarks_io::MemoryStore;

    use super::*;

    #[test]
    fn folder_commands_work() {
        let mut store = MarkStore::open_store(MemoryStore::new());
        let bus = CommandBus::new();
        let mut context = CommandContext { store: &mut store };

        let response = bus.dispatch(
            &CommandRequest::new("add_folder", ["Wrecks"]),
            &mut context,
        );
        assert!(response.success);
        let id = response.message.expect("folder id");

        let response = bus.dispatch(
            &CommandRequest::new("rename_folder", [id.as_str(), "Shipwrecks"]),
            &mut context,
        );
        assert!(response.success);
        assert_eq!(context.store.tree().folder(&id).unwrap().name, "Shipwrecks");

        let response = bus.dispatch(
            &CommandRequest::new("toggle_folder", [id.as_str()]),
            &mut context,
        );
        assert!(response.success);
        assert!(!context.store.visibility().is_folder_visible(&id));

        let response = bus.dispatch(
            &CommandRequest::new("remove_folder", [id.as_str()]),
            &mut context,
        );
        assert!(response.success);
        assert!(!context.store.tree().contains_folder(&id));
        assert!(!context.store.snapshot().folder_visible.contains_key(&id));
    }

    #[test]
    fn layer_commands_work() {
        let mut store = MarkStore::open_store(MemoryStore::new());
        store.add_layer(
            "default",
            Layer::with_id("l1", "Bay", vec![GeoPoint::new("Pin", -38.0, 144.0)]),
        );
        let bus = CommandBus::new();
        let mut context = CommandContext { store: &mut store };

        let response = bus.dispatch(&CommandRequest::new("toggle_layer", ["l1"]), &mut context);
        assert!(response.success);
        assert!(!context.store.visibility().is_layer_visible("l1"));

        for _ in 0..2 {
            let response = bus.dispatch(&CommandRequest::new("hide_layer", ["l1"]), &mut context);
            assert!(response.success);
            assert!(!context.store.visibility().is_layer_visible("l1"));
        }
        let response = bus.dispatch(&CommandRequest::new("hide_folder", ["default"]), &mut context);
        assert!(response.success);
        assert!(!context.store.visibility().is_folder_visible("default"));

        let response = bus.dispatch(
            &CommandRequest::new("remove_layer", ["default", "l1"]),
            &mut context,
        );
        assert!(response.success);
        assert_eq!(context.store.tree().layer_count(), 0);
        assert!(context.store.snapshot().layer_visible.is_empty());
    }

    #[test]
    fn bad_requests_return_errors() {
        let mut store = MarkStore::open_store(MemoryStore::new());
        let bus = CommandBus::new();
        let mut context = CommandContext { store: &mut store };

        let unknown = bus.dispatch(&CommandRequest::new("explode", Vec::<String>::new()), &mut context);
        assert!(!unknown.success);

        let missing = bus.dispatch(&CommandRequest::new("remove_layer", ["default"]), &mut context);
        assert!(!missing.success);
        assert!(missing.message.unwrap().contains("layer_id"));

        let blank = bus.dispatch(&CommandRequest::new("add_folder", ["  "]), &mut context);
        assert!(!blank.success);

        let miss = bus.dispatch(&CommandRequest::new("remove_folder", ["ghost"]), &mut context);
        assert!(miss.success);
        assert_eq!(context.store.tree().len(), 1);

        let mut names: Vec<_> = bus.available_commands().copied().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "add_folder",
                "hide_folder",
                "hide_layer",
                "remove_folder",
                "remove_layer",
                "rename_folder",
                "toggle_folder",
                "toggle_layer"
            ]
        );
    }
}
