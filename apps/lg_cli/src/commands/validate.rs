// apps/lg_cli/src/commands/validate.rs

//! 算例验证命令
//!
//! 解析算例并检查网格、区域分解、连续相场和初始颗粒。

use anyhow::{bail, Result};
use clap::Args;
use glam::DVec3;
use lg_config::{BoundaryType, CaseConfig};
use lg_foundation::TrackTolerance;
use lg_mesh::{decompose_x, find_cell, PolyMeshAccess};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 算例文件路径 (JSON)
    #[arg(short, long)]
    pub case: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_ok_strict(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== Lagrange 算例验证 ===");

    let mut result = ValidationResult::default();
    validate_case(&args.case, &mut result);
    print_validation_result(&result, args.strict)
}

fn validate_case(path: &Path, result: &mut ValidationResult) {
    println!("\n检查算例文件: {}", path.display());

    if !path.exists() {
        result.add_error(format!("算例文件不存在: {}", path.display()));
        return;
    }

    let case = match CaseConfig::from_file(path) {
        Ok(case) => case,
        Err(e) => {
            result.add_error(format!("算例无效: {}", e));
            return;
        }
    };
    println!("  ✓ 算例格式有效");

    validate_run(&case, result);
    validate_mesh_and_seeds(&case, result);
}

fn validate_run(case: &CaseConfig, result: &mut ValidationResult) {
    let run = &case.run;
    if run.end_time < run.dt {
        result.add_warning(format!(
            "结束时间 {} s 小于时间步长 {} s，不会推进",
            run.end_time, run.dt
        ));
    }
    if run.write_interval < run.dt {
        result.add_warning(format!(
            "输出间隔 {} s 小于时间步长 {} s，每步都会写出",
            run.write_interval, run.dt
        ));
    }

    if case.particles.is_empty() {
        result.add_warning("没有初始颗粒");
    }
}

fn validate_mesh_and_seeds(case: &CaseConfig, result: &mut ValidationResult) {
    let mesh = match super::build_mesh(case) {
        Ok(mesh) => mesh,
        Err(e) => {
            result.add_error(format!("{:#}", e));
            return;
        }
    };
    println!("  ✓ 网格: {} 单元, {} 面", mesh.n_cells(), mesh.n_faces());

    match decompose_x(&mesh, case.run.n_ranks) {
        Ok(parts) => println!("  ✓ 区域分解: {} 个分区", parts.len()),
        Err(e) => result.add_error(format!("区域分解失败: {}", e)),
    }

    match super::carrier_fields(case, &mesh) {
        Ok(fields) => {
            println!("  ✓ 连续相场: {} 个单元", fields.velocity.len());
            // 连续相一步内跨过的单元数
            let spacing = (DVec3::from_array(case.mesh.max) - DVec3::from_array(case.mesh.min))
                / DVec3::new(
                    case.mesh.divisions[0] as f64,
                    case.mesh.divisions[1] as f64,
                    case.mesh.divisions[2] as f64,
                );
            let courant = fields
                .velocity
                .values()
                .iter()
                .map(|u| (u.abs() * case.run.dt / spacing).max_element())
                .fold(0.0, f64::max);
            if courant > 1.0 {
                result.add_warning(format!(
                    "连续相 Courant 数 {:.2} 大于 1，颗粒每步跨越多个单元",
                    courant
                ));
            }
        }
        Err(e) => result.add_error(format!("{:#}", e)),
    }

    let tol = TrackTolerance::default();
    let (lo, hi) = (DVec3::from_array(case.mesh.min), DVec3::from_array(case.mesh.max));
    let walls = case.mesh.boundaries.as_array();
    for (i, seed) in case.particles.iter().enumerate() {
        let position = DVec3::from_array(seed.position);
        if find_cell(&mesh, position, &tol).is_none() {
            result.add_error(format!("particles[{}] 位置 {:?} 不在计算域内", i, seed.position));
            continue;
        }
        // 各侧面距离，顺序与侧面名称一致
        let gaps = [
            position.x - lo.x,
            hi.x - position.x,
            position.y - lo.y,
            hi.y - position.y,
            position.z - lo.z,
            hi.z - position.z,
        ];
        let radius = 0.5 * seed.diameter;
        if gaps
            .iter()
            .zip(walls)
            .any(|(&gap, side)| side == BoundaryType::Wall && gap < radius)
        {
            result.add_warning(format!("particles[{}] 与固壁重叠（半径 {} m）", i, radius));
        }
    }
    if !case.particles.is_empty() {
        println!("  ✓ 初始颗粒: {} 个", case.particles.len());
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {}", warning);
        }
    }

    let success = if strict {
        result.is_ok_strict()
    } else {
        result.is_ok()
    };

    if success {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_config::ParticleSeed;

    fn seeded(position: [f64; 3], diameter: f64) -> CaseConfig {
        let mut case = CaseConfig::default();
        case.particles.push(ParticleSeed {
            position,
            diameter,
            velocity: [0.0; 3],
        });
        case
    }

    #[test]
    fn test_valid_case() {
        let case = seeded([0.55, 0.55, 0.55], 1e-4);
        let mut result = ValidationResult::default();
        validate_run(&case, &mut result);
        validate_mesh_and_seeds(&case, &mut result);
        assert!(result.is_ok_strict(), "{:?} {:?}", result.errors, result.warnings);
    }

    #[test]
    fn test_seed_outside_domain() {
        let case = seeded([1.5, 0.5, 0.5], 1e-4);
        let mut result = ValidationResult::default();
        validate_mesh_and_seeds(&case, &mut result);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_seed_overlapping_wall() {
        let case = seeded([0.55, 0.55, 0.01], 0.04);
        let mut result = ValidationResult::default();
        validate_mesh_and_seeds(&case, &mut result);
        assert!(result.is_ok());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_high_courant_warns() {
        let mut case = seeded([0.55, 0.55, 0.55], 1e-4);
        case.fluid.velocity = [20.0, 0.0, 0.0];
        case.run.dt = 0.01;
        let mut result = ValidationResult::default();
        validate_mesh_and_seeds(&case, &mut result);
        assert!(result.is_ok());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_unreadable_fields_file() {
        let mut case = seeded([0.55, 0.55, 0.55], 1e-4);
        case.fluid.fields = Some("/nonexistent/carrier".into());
        let mut result = ValidationResult::default();
        validate_mesh_and_seeds(&case, &mut result);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let mut result = ValidationResult::default();
        validate_case(Path::new("/nonexistent/case.json"), &mut result);
        assert!(!result.is_ok());
    }
}
