// 全局设置实例
use crate::settings::Settings;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;

const APP_DIR_NAME: &str = "reader-settings";
const SETTINGS_FILE_NAME: &str = "settings.json";

static INSTANCE: Lazy<Mutex<Option<Arc<Settings>>>> = Lazy::new(|| Mutex::new(None));

static LOCATION: Lazy<RwLock<Option<PathBuf>>> = Lazy::new(|| RwLock::new(None));

/// 默认设置文件路径，无法获取本地数据目录时退回临时目录
pub fn default_location() -> PathBuf {
    let mut dir = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
    dir.push(APP_DIR_NAME);
    dir.push(SETTINGS_FILE_NAME);
    dir
}

/// 下一个实例将使用的设置文件
pub fn location() -> PathBuf {
    LOCATION.read().clone().unwrap_or_else(default_location)
}

/// 设置文件位置，只影响之后创建的实例
pub fn set_location(path: impl Into<PathBuf>) {
    *LOCATION.write() = Some(path.into());
}

/// 获取全局设置实例，首次调用时创建
pub fn instance() -> Arc<Settings> {
    let mut slot = INSTANCE.lock();
    if let Some(settings) = slot.as_ref() {
        return Arc::clone(settings);
    }

    let path = location();
    tracing::info!(path = %path.display(), "创建全局设置实例");
    let settings = Arc::new(Settings::open(path));
    *slot = Some(Arc::clone(&settings));
    settings
}

/// 释放全局设置实例，下次 instance() 重新创建。
///
/// 释放前先写回文件，仍持有旧句柄的调用方可以继续使用，
/// 之后的保存只覆盖旧句柄自己改动过的键。
pub fn close() {
    let released = INSTANCE.lock().take();
    if let Some(settings) = released {
        settings.apply();
        tracing::info!("已释放全局设置实例");
    }
}
