use crate::store::{JsonFileStore, SettingsStore};
use crate::value::SettingValue;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 已知设置项的键
pub mod keys {
    pub const USE_VOLUME_KEYS: &str = "usevolumekeys";
    pub const USE_SWIPE: &str = "useswipe";
    pub const ZOOM: &str = "zoom";
}

/// 观察者句柄，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ValueChangedCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// 设置存储的浅封装。
///
/// 读写全部转发给底层存储，写入后同步通知所有观察者，
/// 并为界面层提供几个带类型的设置项。
pub struct Settings {
    store: Box<dyn SettingsStore>,
    observers: RwLock<Vec<(ObserverId, ValueChangedCallback)>>,
    next_observer_id: AtomicU64,
}

impl Settings {
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        Self {
            store,
            observers: RwLock::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
        }
    }

    /// 以 JSON 文件作为底层存储
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(JsonFileStore::open(path)))
    }

    /// 读取设置值，不存在时返回 default
    pub fn value(&self, key: &str, default: impl Into<SettingValue>) -> SettingValue {
        self.store.get(key).unwrap_or_else(|| default.into())
    }

    pub fn get(&self, key: &str) -> Option<SettingValue> {
        self.store.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    /// 写入设置值并通知观察者
    pub fn set_value(&self, key: &str, value: impl Into<SettingValue>) {
        let value = value.into();
        tracing::debug!(key, value = %value, "写入设置");
        self.store.set(key, value);
        self.emit_value_changed(key);
    }

    /// 删除设置项，确实删除了才通知
    pub fn remove(&self, key: &str) -> Option<SettingValue> {
        let removed = self.store.remove(key);
        if removed.is_some() {
            tracing::debug!(key, "删除设置");
            self.emit_value_changed(key);
        }
        removed
    }

    /// 立即同步到存储介质，失败只记录日志
    pub fn apply(&self) {
        if let Err(e) = self.store.sync() {
            tracing::warn!("同步设置失败: {}", e);
        }
    }

    pub fn use_volume_keys(&self) -> bool {
        self.get(keys::USE_VOLUME_KEYS)
            .map(|v| v.to_bool())
            .unwrap_or(false)
    }

    pub fn set_use_volume_keys(&self, v: bool) {
        self.set_value(keys::USE_VOLUME_KEYS, v);
    }

    pub fn use_swipe(&self) -> bool {
        self.get(keys::USE_SWIPE).map(|v| v.to_bool()).unwrap_or(false)
    }

    pub fn set_use_swipe(&self, v: bool) {
        self.set_value(keys::USE_SWIPE, v);
    }

    /// 缩放级别，超出 i32 范围视为 0
    pub fn zoom(&self) -> i32 {
        self.get(keys::ZOOM)
            .map(|v| i32::try_from(v.to_int()).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn set_zoom(&self, v: i32) {
        self.set_value(keys::ZOOM, v);
    }

    /// 订阅设置变更，回调参数为变更的键
    pub fn connect_value_changed<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, Arc::new(callback)));
        id
    }

    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    fn emit_value_changed(&self, key: &str) {
        // 先复制列表再回调，回调里可以继续读写设置或增删观察者
        let snapshot: Vec<ValueChangedCallback> = self
            .observers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in snapshot {
            callback(key);
        }
    }

    /// 转换为JSON值（用于界面层）
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "useVolumeKeys": self.use_volume_keys(),
            "useSwipe": self.use_swipe(),
            "zoom": self.zoom(),
        })
    }

    /// 从JSON值更新设置（来自界面层），类型不符的字段忽略
    pub fn update_from_json(&self, json: &serde_json::Value) {
        if let Some(v) = json.get("useVolumeKeys").and_then(|v| v.as_bool()) {
            self.set_use_volume_keys(v);
        }
        if let Some(v) = json.get("useSwipe").and_then(|v| v.as_bool()) {
            self.set_use_swipe(v);
        }
        if let Some(v) = json
            .get("zoom")
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok())
        {
            self.set_zoom(v);
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("keys", &self.store.keys())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    fn memory_settings() -> Settings {
        Settings::new(Box::new(MemoryStore::new()))
    }

    fn record_changes(settings: &Settings) -> Arc<Mutex<Vec<String>>> {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        settings.connect_value_changed(move |key| sink.lock().push(key.to_string()));
        changes
    }

    #[test]
    fn unset_key_returns_default() {
        let settings = memory_settings();
        assert_eq!(settings.value("missing", 7), SettingValue::Int(7));
        assert_eq!(settings.value("missing", "x"), SettingValue::from("x"));
        assert!(!settings.contains("missing"));
    }

    #[test]
    fn set_value_is_readable_back() {
        let settings = memory_settings();
        settings.set_value("font", "serif");
        assert_eq!(settings.value("font", "sans"), SettingValue::from("serif"));
    }

    #[test]
    fn set_value_emits_exactly_one_notification() {
        let settings = memory_settings();
        let changes = record_changes(&settings);

        settings.set_value("zoom", 2);
        assert_eq!(*changes.lock(), vec!["zoom".to_string()]);

        settings.set_value("zoom", 2);
        assert_eq!(changes.lock().len(), 2);
    }

    #[test]
    fn notification_follows_the_write() {
        let settings = Arc::new(memory_settings());
        let seen = Arc::new(Mutex::new(None));

        let reader = Arc::clone(&settings);
        let sink = Arc::clone(&seen);
        settings.connect_value_changed(move |key| {
            *sink.lock() = reader.get(key);
        });

        settings.set_zoom(5);
        assert_eq!(*seen.lock(), Some(SettingValue::Int(5)));
    }

    #[test]
    fn typed_accessors_round_trip() {
        let settings = memory_settings();
        assert!(!settings.use_volume_keys());
        assert!(!settings.use_swipe());
        assert_eq!(settings.zoom(), 0);

        settings.set_use_volume_keys(true);
        settings.set_use_swipe(true);
        settings.set_zoom(3);

        assert!(settings.use_volume_keys());
        assert!(settings.use_swipe());
        assert_eq!(settings.zoom(), 3);
    }

    #[test]
    fn malformed_values_fall_back_to_type_defaults() {
        let settings = memory_settings();
        settings.set_value(keys::ZOOM, "big");
        settings.set_value(keys::USE_SWIPE, "");
        assert_eq!(settings.zoom(), 0);
        assert!(!settings.use_swipe());

        settings.set_value(keys::ZOOM, i64::from(i32::MAX) + 1);
        assert_eq!(settings.zoom(), 0);
    }

    #[test]
    fn zoom_is_not_range_checked() {
        let settings = memory_settings();
        settings.set_zoom(-40);
        assert_eq!(settings.zoom(), -40);
    }

    #[test]
    fn disconnected_observer_is_silent() {
        let settings = memory_settings();
        let changes = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&changes);
        let id = settings.connect_value_changed(move |_| *sink.lock() += 1);

        settings.set_use_swipe(true);
        assert!(settings.disconnect(id));
        assert!(!settings.disconnect(id));
        settings.set_use_swipe(false);

        assert_eq!(*changes.lock(), 1);
    }

    #[test]
    fn observer_may_connect_during_dispatch() {
        let settings = Arc::new(memory_settings());
        let inner = Arc::clone(&settings);
        settings.connect_value_changed(move |_| {
            inner.connect_value_changed(|_| {});
        });

        settings.set_zoom(1);
        settings.set_zoom(2);
        assert_eq!(settings.observers.read().len(), 3);
    }

    #[test]
    fn remove_notifies_only_existing_keys() {
        let settings = memory_settings();
        let changes = record_changes(&settings);

        assert_eq!(settings.remove("zoom"), None);
        settings.set_zoom(2);
        assert_eq!(settings.remove("zoom"), Some(SettingValue::Int(2)));

        assert_eq!(*changes.lock(), vec!["zoom".to_string(), "zoom".to_string()]);
    }

    #[test]
    fn json_view_reflects_typed_properties() {
        let settings = memory_settings();
        settings.set_use_swipe(true);
        settings.set_zoom(4);

        assert_eq!(
            settings.to_json(),
            serde_json::json!({ "useVolumeKeys": false, "useSwipe": true, "zoom": 4 })
        );
    }

    #[test]
    fn update_from_json_sets_known_fields_only() {
        let settings = memory_settings();
        let changes = record_changes(&settings);

        settings.update_from_json(&serde_json::json!({
            "useVolumeKeys": true,
            "useSwipe": "yes",
            "zoom": 6,
            "theme": "dark",
        }));

        assert!(settings.use_volume_keys());
        assert!(!settings.contains(keys::USE_SWIPE));
        assert_eq!(settings.zoom(), 6);
        assert!(!settings.contains("theme"));
        assert_eq!(
            *changes.lock(),
            vec![keys::USE_VOLUME_KEYS.to_string(), keys::ZOOM.to_string()]
        );
    }
}
