// crates/lg_fields/src/lib.rs

//! Lagrange 流场层
//!
//! 连续相场的存储和到颗粒位置的插值。
//!
//! - [`field`]: 单元中心场与连续相快照
//! - [`interpolation`]: 插值接口与实现

#![warn(clippy::all)]

pub mod error;
pub mod field;
pub mod interpolation;

pub use error::{FieldError, FieldResult};
pub use field::{CarrierFields, FieldValue, VolField, LABEL_NU, LABEL_RHO, LABEL_U};
pub use interpolation::{
    make_interpolator, CellInterpolation, IdwConfig, Interpolation, InverseDistanceInterpolation,
};
