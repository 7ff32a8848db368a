use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SettingsError>;

/// 设置存储层错误
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("读写设置文件失败 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析设置文件失败 {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("序列化设置失败: {0}")]
    Serialize(#[from] serde_json::Error),
}
