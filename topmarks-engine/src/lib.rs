pub mod command;
pub mod render;
pub mod store;

pub mod errors {
    use thiserror::Error;
    use topmarks_io::IoError;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("layer name must not be blank")]
        BlankLayerName,
        #[error("layer {0:?} has no marks")]
        EmptyLayer(String),
        #[error("folder with id {0} not found")]
        FolderNotFound(String),
        #[error("storage error: {0}")]
        Storage(#[from] IoError),
    }
}

pub mod visibility {
    use std::collections::{BTreeMap, HashSet};

    use topmarks_core::model::{Folder, FolderTree, Layer};
    use tracing::trace;

    /// 图层与文件夹的显示开关，不参与持久化。
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct VisibilityState {
        layers: BTreeMap<String, bool>,
        folders: BTreeMap<String, bool>,
    }

    impl VisibilityState {
        pub fn new() -> Self {
            Self::default()
        }

        /// 根据当前树同步开关：新 ID 默认可见，已消失的 ID 被移除。
        pub fn reconcile(&mut self, tree: &FolderTree) {
            let folder_ids: HashSet<&str> = tree.folder_ids().collect();
            let layer_ids: HashSet<&str> = tree.layer_ids().collect();
            sync_flags(&mut self.folders, &folder_ids);
            sync_flags(&mut self.layers, &layer_ids);
            trace!(
                folders = self.folders.len(),
                layers = self.layers.len(),
                "显示状态已同步"
            );
        }

        /// 翻转图层开关，返回新值；ID 不存在时不做任何事。
        pub fn toggle_layer(&mut self, id: &str) -> Option<bool> {
            toggle(&mut self.layers, id)
        }

        pub fn toggle_folder(&mut self, id: &str) -> Option<bool> {
            toggle(&mut self.folders, id)
        }

        /// 将图层设为隐藏，重复调用结果不变；返回 ID 是否存在。
        pub fn hide_layer(&mut self, id: &str) -> bool {
            hide(&mut self.layers, id)
        }

        pub fn hide_folder(&mut self, id: &str) -> bool {
            hide(&mut self.folders, id)
        }

        /// 未记录的 ID 视为不可见。
        #[inline]
        pub fn is_layer_visible(&self, id: &str) -> bool {
            self.layers.get(id).copied().unwrap_or(false)
        }

        #[inline]
        pub fn is_folder_visible(&self, id: &str) -> bool {
            self.folders.get(id).copied().unwrap_or(false)
        }

        pub fn forget_layer(&mut self, id: &str) -> bool {
            self.layers.remove(id).is_some()
        }

        pub fn forget_folder(&mut self, id: &str) -> bool {
            self.folders.remove(id).is_some()
        }

        #[inline]
        pub fn layer_flags(&self) -> &BTreeMap<String, bool> {
            &self.layers
        }

        #[inline]
        pub fn folder_flags(&self) -> &BTreeMap<String, bool> {
            &self.folders
        }

        /// 过滤出可见文件夹及其中的可见图层，保持树中的顺序。
        /// 文件夹开关只影响过滤结果，不会改动图层自身的开关。
        pub fn visible_layers<'t>(&self, tree: &'t FolderTree) -> Vec<(&'t Folder, Vec<&'t Layer>)> {
            tree.folders()
                .iter()
                .filter(|folder| self.is_folder_visible(&folder.id))
                .map(|folder| {
                    let layers = folder
                        .layers
                        .iter()
                        .filter(|layer| self.is_layer_visible(&layer.id))
                        .collect();
                    (folder, layers)
                })
                .collect()
        }
    }

    fn sync_flags(flags: &mut BTreeMap<String, bool>, live: &HashSet<&str>) {
        flags.retain(|id, _| live.contains(id.as_str()));
        for id in live {
            if !flags.contains_key(*id) {
                flags.insert((*id).to_string(), true);
            }
        }
    }

    fn toggle(flags: &mut BTreeMap<String, bool>, id: &str) -> Option<bool> {
        let flag = flags.get_mut(id)?;
        *flag = !*flag;
        Some(*flag)
    }

    fn hide(flags: &mut BTreeMap<String, bool>, id: &str) -> bool {
        match flags.get_mut(id) {
            Some(flag) => {
                *flag = false;
                true
            }
            None => false,
        }
    }

}
