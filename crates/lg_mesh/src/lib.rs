// crates/lg_mesh/src/lib.rs

//! Lagrange 网格层
//!
//! 提供颗粒追踪所需的多面体网格抽象和几何操作。
//!
//! # 模块
//!
//! - [`traits`]: 网格只读访问接口 [`PolyMeshAccess`]
//! - [`poly`]: SoA 多面体网格
//! - [`patch`]: 边界片类型与进程边界变换
//! - [`block`]: 轴对齐块网格生成
//! - [`decompose`]: 沿 x 方向的区域分解
//! - [`tracking`]: 单元内穿面追踪与点定位
//!
//! # 示例
//!
//! ```
//! use glam::DVec3;
//! use lg_foundation::TrackTolerance;
//! use lg_mesh::{find_cell, BlockMesh, PolyMeshAccess};
//!
//! let mesh = BlockMesh::new(DVec3::ZERO, DVec3::ONE, [2, 2, 2]).build().unwrap();
//! assert_eq!(mesh.n_cells(), 8);
//! let cell = find_cell(&mesh, DVec3::splat(0.25), &TrackTolerance::default());
//! assert_eq!(cell.map(|c| c.get()), Some(0));
//! ```

#![warn(clippy::all)]

pub mod block;
pub mod decompose;
pub mod error;
pub mod patch;
pub mod poly;
pub mod tracking;
pub mod traits;

pub use block::{BlockMesh, SIDE_NAMES};
pub use decompose::{decompose_x, processor_patch_name, DecomposedMesh};
pub use error::{MeshError, MeshResult};
pub use patch::{PatchInfo, PatchKind, PatchTransform};
pub use poly::{FaceDef, PatchDef, PolyMesh};
pub use tracking::{find_cell, point_in_cell, track_to_face, TrackHit};
pub use traits::PolyMeshAccess;
