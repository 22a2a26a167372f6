//! 文件夹树的持久化：单个键下保存完整 JSON 快照。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use topmarks_core::model::FolderTree;
use tracing::{debug, warn};

use crate::IoError;

/// 保存文件夹树所用的固定键。
pub const STORAGE_KEY: &str = "topmarks-folders";

/// 简单的字符串键值存储。
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, IoError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), IoError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, IoError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), IoError> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.into(), value.into());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, IoError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), IoError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 目录存储：每个键对应 `<root>/<key>.json`，写入时先写临时文件再重命名。
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, IoError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(IoError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, IoError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| IoError::ReadError { path, source })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), IoError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|source| IoError::WriteError {
            path: self.root.clone(),
            source,
        })?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(|source| IoError::WriteError {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| IoError::WriteError {
            path: path.clone(),
            source,
        })
    }
}

/// 加载结果；`was_corrupted` 表示存储内容无法解析并已替换为默认树。
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub folders: FolderTree,
    pub was_corrupted: bool,
}

impl LoadOutcome {
    fn fallback(was_corrupted: bool) -> Self {
        Self {
            folders: FolderTree::with_default(),
            was_corrupted,
        }
    }
}

pub struct FolderRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> FolderRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// 读取文件夹树。缺失、读取失败或内容损坏时均回退到默认树，从不返回错误。
    pub fn load(&self) -> LoadOutcome {
        let blob = match self.store.get(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!(key = %self.key, "存储中没有文件夹树，使用默认树");
                return LoadOutcome::fallback(false);
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "读取文件夹树失败，使用默认树");
                return LoadOutcome::fallback(false);
            }
        };

        match serde_json::from_str::<FolderTree>(&blob) {
            Ok(tree) => LoadOutcome {
                folders: tree.ensure_default(),
                was_corrupted: false,
            },
            Err(err) => {
                warn!(key = %self.key, error = %err, "文件夹树数据已损坏，使用默认树");
                LoadOutcome::fallback(true)
            }
        }
    }

    /// 序列化整棵树并覆盖旧值。
    pub fn save(&mut self, tree: &FolderTree) -> Result<(), IoError> {
        let blob = serde_json::to_string(tree).map_err(IoError::Serialize)?;
        self.store.set(&self.key, &blob)?;
        debug!(key = %self.key, folders = tree.len(), bytes = blob.len(), "已保存文件夹树");
        Ok(())
    }
}
