// crates/lg_particles/src/error.rs
//! 颗粒云错误类型
//!
//! 错误分级：
//! - `Topology`: 单个颗粒追踪失败，记录后丢弃该颗粒，云继续运行
//! - `Format` / `Stream`: 读入的数据与云不一致，本次读取失败
//! - `Migration`: 进程间移交失败，整个并行运行终止
//!
//! 颗粒经出流边界离开计算域不是错误。

use lg_config::ConfigError;
use lg_fields::FieldError;
use lg_foundation::LgError;
use lg_io::StreamError;
use lg_mesh::MeshError;
use thiserror::Error;

/// 颗粒云结果类型
pub type CloudResult<T> = Result<T, CloudError>;

/// 颗粒云错误
#[derive(Error, Debug)]
pub enum CloudError {
    /// 数据与云不一致（字段数、颗粒数）
    #[error("格式错误: {field}: {message}")]
    Format { field: String, message: String },

    /// 追踪拓扑错误
    #[error("颗粒 {id} 在单元 {cell} 追踪失败: {message}")]
    Topology { id: u64, cell: usize, message: String },

    /// 进程间移交失败
    #[error("迁移失败: 进程 {from} -> {to}: {message}")]
    Migration {
        from: usize,
        to: usize,
        message: String,
    },

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 对象流错误
    #[error("对象流: {0}")]
    Stream(#[from] StreamError),

    /// 网格错误
    #[error("网格: {0}")]
    Mesh(#[from] MeshError),

    /// 流场错误
    #[error("流场: {0}")]
    Field(#[from] FieldError),
}

impl CloudError {
    pub fn format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn topology(id: u64, cell: usize, message: impl Into<String>) -> Self {
        Self::Topology {
            id,
            cell,
            message: message.into(),
        }
    }

    pub fn migration(from: usize, to: usize, message: impl Into<String>) -> Self {
        Self::Migration {
            from,
            to,
            message: message.into(),
        }
    }

    /// 是否终止整个运行（拓扑错误只影响单个颗粒）
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Topology { .. })
    }
}

impl From<CloudError> for LgError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Format { field, message } => LgError::format(field, message),
            CloudError::Topology { id, cell, message } => {
                LgError::topology("track", format!("颗粒 {} 单元 {}: {}", id, cell, message))
            }
            CloudError::Migration { from, to, message } => LgError::migration(from, to, message),
            CloudError::Config(e) => e.into(),
            CloudError::Stream(e) => e.into(),
            CloudError::Mesh(e) => e.into(),
            CloudError::Field(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        assert!(!CloudError::topology(1, 0, "超过最大子段数").is_fatal());
        assert!(CloudError::migration(0, 3, "未知进程").is_fatal());
        assert!(CloudError::format("d", "数量不匹配").is_fatal());
    }

    #[test]
    fn test_into_foundation() {
        let err: LgError = CloudError::migration(0, 1, "x").into();
        assert!(matches!(err, LgError::Migration { from: 0, to: 1, .. }));
        let err: LgError = CloudError::topology(5, 2, "x").into();
        assert!(!err.is_fatal());
        let err: LgError = CloudError::from(StreamError::LabelMismatch {
            expected: "d".into(),
            found: "U".into(),
        })
        .into();
        assert!(matches!(err, LgError::Format { .. }));
    }
}
