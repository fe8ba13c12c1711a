// crates/lg_mesh/src/error.rs
//! 网格处理错误类型
//!
//! 包含网格拓扑、块网格定义、区域分解和几何追踪错误。
//! 所有错误可转换为 `lg_foundation::LgError` 向上传播。

use lg_foundation::LgError;
use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格错误枚举
#[derive(Error, Debug)]
pub enum MeshError {
    /// 拓扑错误
    #[error("拓扑错误: {operation} 失败, {details}")]
    InvalidTopology {
        operation: &'static str,
        details: String,
    },

    /// 块网格定义无效
    #[error("块网格定义无效: {0}")]
    InvalidBlock(String),

    /// 区域分解失败
    #[error("区域分解失败: {0}")]
    Decomposition(String),

    /// 追踪退化（NaN 位移、无面单元等）
    #[error("追踪退化: 单元 {cell}, {details}")]
    DegenerateTrack { cell: usize, details: String },
}

impl From<MeshError> for LgError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::InvalidTopology { operation, details } => {
                LgError::invalid_mesh(format!("[{}] {}", operation, details))
            }
            MeshError::InvalidBlock(msg) => LgError::invalid_mesh(msg),
            MeshError::Decomposition(msg) => LgError::invalid_mesh(format!("分解: {}", msg)),
            MeshError::DegenerateTrack { cell, details } => {
                LgError::topology("track_to_face", format!("单元 {}: {}", cell, details))
            }
        }
    }
}

impl MeshError {
    pub fn invalid_topology(operation: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidTopology {
            operation,
            details: details.into(),
        }
    }

    pub fn degenerate_track(cell: usize, details: impl Into<String>) -> Self {
        Self::DegenerateTrack {
            cell,
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_error_maps_to_topology() {
        let err: LgError = MeshError::degenerate_track(4, "位移为 NaN").into();
        assert!(matches!(err, LgError::Topology { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_block_error_is_fatal() {
        let err: LgError = MeshError::InvalidBlock("nx = 0".into()).into();
        assert!(err.is_fatal());
    }
}
