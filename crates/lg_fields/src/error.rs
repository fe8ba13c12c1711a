// crates/lg_fields/src/error.rs
//! 流场错误类型

use lg_foundation::LgError;
use lg_io::StreamError;
use thiserror::Error;

/// 流场模块结果类型
pub type FieldResult<T> = Result<T, FieldError>;

/// 流场错误
#[derive(Error, Debug)]
pub enum FieldError {
    /// 场长度与网格单元数不一致
    #[error("场 {name} 长度不匹配: 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// 场值非有限
    #[error("场 {name} 在单元 {cell} 的值非有限")]
    NonFinite { name: String, cell: usize },

    /// 读入场时的对象流错误
    #[error("读入场失败: {0}")]
    Stream(#[from] StreamError),
}

impl From<FieldError> for LgError {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::Stream(e) => e.into(),
            other => LgError::invalid_input(other.to_string()),
        }
    }
}
