// crates/lg_config/src/lib.rs

//! Lagrange Config Layer
//!
//! 配置层，提供颗粒云物性配置和算例配置。全部数值使用 f64，
//! 通过 serde JSON 读写，并在加载时显式校验。
//!
//! # 模块概览
//!
//! - [`cloud`]: `CloudConfig` 颗粒云物性（密度、恢复系数、曳力模型等）
//! - [`case`]: `CaseConfig` 算例配置（网格、流场、时间步、初始颗粒）
//! - [`error`]: 配置错误类型

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod case;
pub mod cloud;
pub mod error;

// 重导出核心类型
pub use case::{
    BoundaryType, CaseConfig, FluidConfig, InterpolationScheme, MeshConfig, ParticleSeed,
    RunConfig, SideBoundaries,
};
pub use cloud::{CloudConfig, DragLaw, WriteOption};
pub use error::ConfigError;
