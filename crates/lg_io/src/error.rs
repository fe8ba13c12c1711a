// crates/lg_io/src/error.rs
//! 对象流错误类型
//!
//! 读流时的格式错误（标签、数量、意外记号）统一映射为
//! `LgError::Format`，底层 IO 错误映射为 `LgError::Io`。

use lg_foundation::LgError;
use thiserror::Error;

/// 对象流结果类型
pub type StreamResult<T> = Result<T, StreamError>;

/// 对象流错误
#[derive(Error, Debug)]
pub enum StreamError {
    /// 底层 IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 流提前结束
    #[error("流提前结束: 期望 {expected}")]
    UnexpectedEof { expected: String },

    /// 意外记号
    #[error("第 {line} 行: 期望 {expected}, 实际 '{found}'")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// 字段标签不匹配
    #[error("字段标签不匹配: 期望 '{expected}', 实际 '{found}'")]
    LabelMismatch { expected: String, found: String },

    /// 记录数不匹配
    #[error("字段 {field} 记录数不匹配: 期望 {expected}, 实际 {actual}")]
    CountMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
}

impl StreamError {
    /// 创建意外记号错误
    pub fn unexpected(line: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            line,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// 是否为格式错误（非 IO）
    pub fn is_format(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl From<StreamError> for LgError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(e) => LgError::io_with_source("对象流读写失败", e),
            StreamError::LabelMismatch { ref expected, .. } => {
                LgError::format(expected.clone(), err.to_string())
            }
            StreamError::CountMismatch { ref field, .. } => {
                LgError::format(field.clone(), err.to_string())
            }
            other => LgError::format("stream", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mapping() {
        let err: LgError = StreamError::CountMismatch {
            field: "d".into(),
            expected: 3,
            actual: 2,
        }
        .into();
        assert!(matches!(err, LgError::Format { .. }));

        let io = StreamError::from(std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert!(!io.is_format());
        assert!(matches!(LgError::from(io), LgError::Io { .. }));
    }
}
