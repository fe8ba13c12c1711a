// crates/lg_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `LgError` 枚举和 `LgResult` 类型别名。各上层 crate 定义自己的错误枚举，
//! 并实现到 `LgError` 的转换以便跨层传递。
//!
//! # 错误分级
//!
//! - **格式错误**: 读入的数据流与期望的字段标签或数量不符，本次读取失败
//! - **拓扑错误**: 几何追踪出现不一致或退化的穿面，颗粒被丢弃，云继续运行
//! - **迁移错误**: 进程间移交失败，整个并行运行终止
//!
//! 颗粒经开边界离开计算域是正常结果，不是错误。
//!
//! # 示例
//!
//! ```
//! use lg_foundation::error::{LgError, LgResult};
//!
//! fn read_header() -> LgResult<()> {
//!     Err(LgError::format("d", "数量不匹配"))
//! }
//! ```

use thiserror::Error;

/// 统一结果类型
pub type LgResult<T> = Result<T, LgError>;

/// Lagrange 错误类型
#[derive(Error, Debug)]
pub enum LgError {
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 数据流格式错误
    #[error("格式错误: 字段 {field}: {message}")]
    Format {
        /// 出错的字段标签
        field: String,
        /// 错误信息
        message: String,
    },

    /// 几何拓扑错误
    #[error("拓扑错误: {operation}: {message}")]
    Topology {
        /// 出错的操作
        operation: &'static str,
        /// 错误信息
        message: String,
    },

    /// 进程间迁移失败
    #[error("迁移失败: 进程 {from} -> {to}: {message}")]
    Migration {
        /// 源进程
        from: usize,
        /// 目标进程
        to: usize,
        /// 错误信息
        message: String,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 无效网格
    #[error("无效的网格: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl LgError {
    /// IO 错误（带源）
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 格式错误
    pub fn format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 拓扑错误
    pub fn topology(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Topology {
            operation,
            message: message.into(),
        }
    }

    /// 迁移错误
    pub fn migration(from: usize, to: usize, message: impl Into<String>) -> Self {
        Self::Migration {
            from,
            to,
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 是否为致命错误（需要终止整个运行）
    ///
    /// 拓扑错误只影响单个颗粒，其余错误均向上传播。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Topology { .. })
    }
}

impl From<std::io::Error> for LgError {
    fn from(err: std::io::Error) -> Self {
        Self::io_with_source(err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LgError::format("origId", "期望 3 条记录, 实际 2");
        let msg = err.to_string();
        assert!(msg.contains("origId"));
        assert!(msg.contains("期望 3"));
    }

    #[test]
    fn test_topology_not_fatal() {
        assert!(!LgError::topology("track", "卡在面上").is_fatal());
        assert!(LgError::migration(0, 3, "目标不存在").is_fatal());
        assert!(LgError::format("d", "x").is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: LgError = io.into();
        assert!(matches!(err, LgError::Io { source: Some(_), .. }));
    }
}
