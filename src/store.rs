use crate::error::{Result, SettingsError};
use crate::value::SettingValue;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// 持久化键值存储，由实现方负责内部同步
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<SettingValue>;

    fn set(&self, key: &str, value: SettingValue);

    fn remove(&self, key: &str) -> Option<SettingValue>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 所有键，按字典序排列
    fn keys(&self) -> Vec<String>;

    /// 将延迟的写入同步到存储介质
    fn sync(&self) -> Result<()>;
}

/// 内存存储，不做持久化
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, SettingValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: SettingValue) {
        self.entries.lock().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<SettingValue> {
        self.entries.lock().remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FileState {
    entries: BTreeMap<String, SettingValue>,
    // 自上次同步以来写入或删除过的键
    changed: BTreeSet<String>,
}

/// JSON 文件存储：写入先保存在内存，sync 或 drop 时写回文件。
///
/// 同步时重新读取文件，只覆盖本实例改动过的键，
/// 同一文件上的其他实例已保存的设置不会被旧数据冲掉。
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl JsonFileStore {
    /// 打开设置文件，文件不存在或损坏时从空设置开始
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("{}，使用空设置", e);
                BTreeMap::new()
            }
        };
        tracing::debug!(path = %path.display(), count = entries.len(), "已加载设置");

        Self {
            path,
            state: Mutex::new(FileState {
                entries,
                changed: BTreeSet::new(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, SettingValue>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut entries = BTreeMap::new();
    for (key, value) in raw {
        match SettingValue::from_json(&value) {
            Some(v) => {
                entries.insert(key, v);
            }
            None => tracing::warn!(key = %key, "忽略不支持的设置值: {}", value),
        }
    }
    Ok(entries)
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.state.lock().entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: SettingValue) {
        let mut state = self.state.lock();
        state.entries.insert(key.to_string(), value);
        state.changed.insert(key.to_string());
    }

    fn remove(&self, key: &str) -> Option<SettingValue> {
        let mut state = self.state.lock();
        let removed = state.entries.remove(key);
        if removed.is_some() {
            state.changed.insert(key.to_string());
        }
        removed
    }

    fn keys(&self) -> Vec<String> {
        self.state.lock().entries.keys().cloned().collect()
    }

    fn sync(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.changed.is_empty() {
            return Ok(());
        }

        let mut merged = match load_entries(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("{}，将以内存中的设置覆盖", e);
                BTreeMap::new()
            }
        };
        for key in &state.changed {
            match state.entries.get(key) {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        let json: serde_json::Map<String, serde_json::Value> = merged
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        let content = serde_json::to_string_pretty(&json)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, content).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;

        state.entries = merged;
        state.changed.clear();
        tracing::debug!(path = %self.path.display(), "设置已保存");
        Ok(())
    }
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        if let Err(e) = self.sync() {
            tracing::warn!("关闭时保存设置失败: {}", e);
        }
    }
}
