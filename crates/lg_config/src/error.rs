// crates/lg_config/src/error.rs

//! 配置层错误类型

use lg_foundation::LgError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    /// 创建无效值错误
    pub fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for LgError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => LgError::io_with_source("读取配置失败", e),
            other => LgError::config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("cloud.e", -1.0, "必须在 [0, 1] 范围内");
        assert!(err.to_string().contains("cloud.e"));
    }

    #[test]
    fn test_into_foundation() {
        let err: LgError = ConfigError::Parse("bad json".into()).into();
        assert!(matches!(err, LgError::Config { .. }));
    }
}
