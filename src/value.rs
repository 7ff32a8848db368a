use std::fmt;

/// 设置值：布尔、整数或文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    /// 转换为布尔值，无法识别的文本视为 true，空文本、"0"、"false" 视为 false
    pub fn to_bool(&self) -> bool {
        match self {
            SettingValue::Bool(v) => *v,
            SettingValue::Int(v) => *v != 0,
            SettingValue::Text(v) => {
                let v = v.trim();
                !(v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false"))
            }
        }
    }

    /// 转换为整数，解析失败返回 0
    pub fn to_int(&self) -> i64 {
        match self {
            SettingValue::Bool(v) => i64::from(*v),
            SettingValue::Int(v) => *v,
            SettingValue::Text(v) => v.trim().parse().unwrap_or(0),
        }
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SettingValue::Bool(v) => serde_json::Value::Bool(*v),
            SettingValue::Int(v) => serde_json::Value::from(*v),
            SettingValue::Text(v) => serde_json::Value::String(v.clone()),
        }
    }

    /// 从 JSON 值转换，不支持的类型（null、浮点、数组、对象）返回 None
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(v) => Some(SettingValue::Bool(*v)),
            serde_json::Value::Number(n) => n.as_i64().map(SettingValue::Int),
            serde_json::Value::String(s) => Some(SettingValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{}", v),
            SettingValue::Int(v) => write!(f, "{}", v),
            SettingValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i32> for SettingValue {
    fn from(v: i32) -> Self {
        SettingValue::Int(i64::from(v))
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Text(v)
    }
}
