// =================== 模块引入 ===================
mod error;
mod global;
mod settings;
mod store;
mod value;

pub use error::{Result, SettingsError};
pub use global::{close, default_location, instance, location, set_location};
pub use settings::{keys, ObserverId, Settings};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};
pub use value::SettingValue;
