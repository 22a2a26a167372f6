use std::collections::BTreeMap;
use std::mem;

use topmarks_core::geometry::GeoPoint;
use topmarks_core::model::{Folder, FolderTree, Layer};
use topmarks_io::{FolderRepository, IoError, KeyValueStore};
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::visibility::VisibilityState;

pub type BoxedRepository = FolderRepository<Box<dyn KeyValueStore>>;

/// 待提交的图层：一次粘贴解析出的名称与坐标。
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDraft {
    pub name: String,
    pub marks: Vec<GeoPoint>,
}

impl LayerDraft {
    pub fn new(name: impl Into<String>, marks: Vec<GeoPoint>) -> Self {
        Self {
            name: name.into(),
            marks,
        }
    }
}

/// 提供给渲染端的只读快照。
#[derive(Debug, Clone, Copy)]
pub struct StoreSnapshot<'a> {
    pub folders: &'a FolderTree,
    pub layer_visible: &'a BTreeMap<String, bool>,
    pub folder_visible: &'a BTreeMap<String, bool>,
}

/// 文件夹树及其显示状态的持有者。每次变更后同步显示状态并写回存储。
pub struct MarkStore {
    tree: FolderTree,
    visibility: VisibilityState,
    repository: BoxedRepository,
    was_corrupted: bool,
}

impl MarkStore {
    /// 从存储加载文件夹树；存储损坏时以默认树启动并记录警告。
    pub fn open(repository: BoxedRepository) -> Self {
        let outcome = repository.load();
        if outcome.was_corrupted {
            warn!(key = repository.key(), "存储的文件夹树已损坏，已回退到默认文件夹");
        }
        let mut visibility = VisibilityState::new();
        visibility.reconcile(&outcome.folders);
        info!(
            folders = outcome.folders.len(),
            layers = outcome.folders.layer_count(),
            marks = outcome.folders.mark_count(),
            "已加载文件夹树"
        );
        Self {
            tree: outcome.folders,
            visibility,
            repository,
            was_corrupted: outcome.was_corrupted,
        }
    }

    /// 便捷构造：使用默认键包装任意存储后端。
    pub fn open_store(store: impl KeyValueStore + 'static) -> Self {
        let boxed: Box<dyn KeyValueStore> = Box::new(store);
        Self::open(FolderRepository::new(boxed))
    }

    #[inline]
    pub fn was_corrupted(&self) -> bool {
        self.was_corrupted
    }

    #[inline]
    pub fn tree(&self) -> &FolderTree {
        &self.tree
    }

    #[inline]
    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot {
            folders: &self.tree,
            layer_visible: self.visibility.layer_flags(),
            folder_visible: self.visibility.folder_flags(),
        }
    }

    pub fn visible_layers(&self) -> Vec<(&Folder, Vec<&Layer>)> {
        self.visibility.visible_layers(&self.tree)
    }

    pub fn add_folder(&mut self, folder: Folder) {
        debug!(id = %folder.id, name = %folder.name, "添加文件夹");
        self.apply(|tree| tree.add_folder(folder));
    }

    /// 以新生成的 ID 创建文件夹，返回该 ID。
    pub fn create_folder(&mut self, name: impl Into<String>) -> String {
        let folder = Folder::new(name);
        let id = folder.id.clone();
        self.add_folder(folder);
        id
    }

    pub fn remove_folder(&mut self, id: &str) {
        debug!(id, "移除文件夹");
        self.visibility.forget_folder(id);
        self.apply(|tree| tree.remove_folder(id));
    }

    pub fn rename_folder(&mut self, id: &str, name: impl Into<String>) {
        let name = name.into();
        debug!(id, name = %name, "重命名文件夹");
        self.apply(|tree| tree.update_folder_name(id, name));
    }

    pub fn add_layer(&mut self, folder_id: &str, layer: Layer) {
        debug!(folder_id, layer_id = %layer.id, marks = layer.marks.len(), "添加图层");
        self.apply(|tree| tree.add_layer(folder_id, layer));
    }

    /// 将草稿提交为新图层。名称为空、没有坐标或文件夹不存在时拒绝提交。
    pub fn commit_layer(&mut self, folder_id: &str, draft: LayerDraft) -> Result<String, EngineError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(EngineError::BlankLayerName);
        }
        if draft.marks.is_empty() {
            return Err(EngineError::EmptyLayer(name.to_string()));
        }
        if !self.tree.contains_folder(folder_id) {
            return Err(EngineError::FolderNotFound(folder_id.to_string()));
        }
        let layer = Layer::new(name, draft.marks);
        let id = layer.id.clone();
        self.add_layer(folder_id, layer);
        Ok(id)
    }

    pub fn remove_layer(&mut self, folder_id: &str, layer_id: &str) {
        debug!(folder_id, layer_id, "移除图层");
        if self.tree.layer(folder_id, layer_id).is_some() {
            self.visibility.forget_layer(layer_id);
        }
        self.apply(|tree| tree.remove_layer(folder_id, layer_id));
    }

    pub fn toggle_layer(&mut self, id: &str) -> Option<bool> {
        self.visibility.toggle_layer(id)
    }

    pub fn toggle_folder(&mut self, id: &str) -> Option<bool> {
        self.visibility.toggle_folder(id)
    }

    pub fn hide_layer(&mut self, id: &str) -> bool {
        self.visibility.hide_layer(id)
    }

    pub fn hide_folder(&mut self, id: &str) -> bool {
        self.visibility.hide_folder(id)
    }

    /// 立即写回当前树。
    pub fn flush(&mut self) -> Result<(), EngineError> {
        self.repository.save(&self.tree)?;
        Ok(())
    }

    /// 写回并释放存储。
    pub fn dispose(mut self) -> Result<BoxedRepository, EngineError> {
        self.flush()?;
        info!("文件夹存储已关闭");
        Ok(self.repository)
    }

    fn apply(&mut self, transition: impl FnOnce(FolderTree) -> FolderTree) {
        let tree = mem::take(&mut self.tree);
        self.tree = transition(tree);
        self.visibility.reconcile(&self.tree);
        if let Err(err) = self.persist() {
            warn!(error = %err, "保存文件夹树失败");
        }
    }

    fn persist(&mut self) -> Result<(), IoError> {
        self.repository.save(&self.tree)
    }
}
