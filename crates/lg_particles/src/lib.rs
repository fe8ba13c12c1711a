// crates/lg_particles/src/lib.rs

//! Lagrange 颗粒层
//!
//! 单向耦合的球形颗粒在非结构多面体网格中的追踪。
//!
//! # 数据流
//!
//! ```text
//! 时间循环 → 颗粒云逐个颗粒 → 运动积分（经追踪上下文插值连续相）
//!          → 单元内几何追踪 → 撞面 → 边界交互 → 继续 / 删除 / 移交
//! ```
//!
//! # 模块
//!
//! - [`particle`]: 颗粒记录与序列化
//! - [`track`]: 追踪状态、物理/几何追踪模式
//! - [`drag`]: 曳力闭合
//! - [`motion`]: 子段循环
//! - [`interaction`]: 按边界片类型分派的边界交互
//! - [`cloud`]: 颗粒云与身份编号
//! - [`io`]: 颗粒云读写
//! - [`transport`]: 进程间移交
//! - [`parallel`]: 分区并行推进
//!
//! # 示例
//!
//! ```
//! use glam::DVec3;
//! use lg_config::CloudConfig;
//! use lg_mesh::{BlockMesh, PatchKind};
//! use lg_particles::ParticleCloud;
//!
//! let mesh = BlockMesh::new(DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0), [2, 1, 1])
//!     .with_side("xMax", PatchKind::Outflow)
//!     .build()
//!     .unwrap();
//! let mut cloud = ParticleCloud::new("kinematicCloud", CloudConfig::default());
//! cloud.add_particle_at(&mesh, DVec3::new(0.5, 0.5, 0.5), 1e-4, DVec3::X).unwrap();
//!
//! let report = cloud.move_geometric(&mesh, 1.0).unwrap();
//! assert_eq!(report.removed, 0);
//! assert!((cloud.particles()[0].position.x - 1.5).abs() < 1e-12);
//! ```

#![warn(clippy::all)]

pub mod cloud;
pub mod drag;
pub mod error;
pub mod interaction;
pub mod io;
pub mod motion;
pub mod parallel;
pub mod particle;
pub mod track;
pub mod transport;

pub use cloud::{EvolveReport, IdGenerator, ParticleCloud};
pub use drag::drag_coefficient;
pub use error::{CloudError, CloudResult};
pub use interaction::PatchInteraction;
pub use motion::MotionIntegrator;
pub use parallel::{DecomposedCase, RankDomain, StepReport};
pub use particle::Particle;
pub use track::{GeometricTrack, TrackContext, TrackMode, TrackState};
pub use transport::{InProcessTransport, ParticleTransfer, ParticleTransport};
