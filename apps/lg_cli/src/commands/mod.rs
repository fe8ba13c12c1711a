// apps/lg_cli/src/commands/mod.rs

//! 子命令

pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use glam::DVec3;
use lg_config::{BoundaryType, CaseConfig};
use lg_fields::CarrierFields;
use lg_mesh::{BlockMesh, PatchKind, PolyMesh, PolyMeshAccess, SIDE_NAMES};
use tracing::info;

/// 侧面边界类型对应的边界片类型
fn patch_kind(boundary: BoundaryType) -> PatchKind {
    match boundary {
        BoundaryType::Wall => PatchKind::Wall,
        BoundaryType::Patch => PatchKind::Patch,
        BoundaryType::Outflow => PatchKind::Outflow,
    }
}

/// 由算例配置生成块网格
pub(crate) fn block_mesh(case: &CaseConfig) -> BlockMesh {
    let mesh = &case.mesh;
    SIDE_NAMES
        .iter()
        .zip(mesh.boundaries.as_array())
        .fold(
            BlockMesh::new(
                DVec3::from_array(mesh.min),
                DVec3::from_array(mesh.max),
                mesh.divisions,
            ),
            |block, (side, boundary)| block.with_side(side, patch_kind(boundary)),
        )
}

/// 由算例配置生成多面体网格
pub(crate) fn build_mesh(case: &CaseConfig) -> Result<PolyMesh> {
    block_mesh(case).build().context("生成块网格失败")
}

/// 连续相快照：给出场文件时从文件读入，否则为均匀场
pub(crate) fn carrier_fields(case: &CaseConfig, mesh: &PolyMesh) -> Result<CarrierFields> {
    match &case.fluid.fields {
        Some(path) => CarrierFields::read_file(path, mesh)
            .with_context(|| format!("读取连续相场失败: {}", path.display())),
        None => {
            info!(
                "均匀连续相: U={:?} m/s, rho={} kg/m³, nu={} m²/s",
                case.fluid.velocity, case.fluid.density, case.fluid.viscosity
            );
            Ok(CarrierFields::uniform(
                mesh.n_cells(),
                DVec3::from_array(case.fluid.velocity),
                case.fluid.density,
                case.fluid.viscosity,
            ))
        }
    }
}
