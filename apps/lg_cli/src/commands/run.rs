// apps/lg_cli/src/commands/run.rs

//! 运行算例命令
//!
//! 读入算例，生成块网格和连续相场，按 `run.n_ranks` 分解后放置初始颗粒，
//! 以固定步长推进到结束时间。每隔 `write_interval` 写出一次颗粒云：
//!
//! ```text
//! <output>/<time>/lagrangian/<cloud>/{positions,fields}           单分区
//! <output>/<time>/processor<r>/lagrangian/<cloud>/{positions,fields}  多分区
//! ```
//!
//! 运行结束后在输出目录写出累计统计 `summary.json`。

use anyhow::{Context, Result};
use clap::Args;
use glam::DVec3;
use lg_config::CaseConfig;
use lg_mesh::PolyMeshAccess;
use lg_particles::{DecomposedCase, StepReport};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// 颗粒云名称
pub const CLOUD_NAME: &str = "kinematicCloud";

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 算例文件路径 (JSON)
    #[arg(short, long)]
    pub case: PathBuf,

    /// 输出目录（覆盖算例中的 run.output）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== Lagrange 颗粒追踪启动 ===");

    let mut case = CaseConfig::from_file(&args.case)
        .with_context(|| format!("读取算例失败: {}", args.case.display()))?;
    if let Some(output) = args.output {
        case.run.output = output;
    }

    let mesh = super::build_mesh(&case)?;
    info!(
        "网格: {} 单元, {} 面, {} 个边界片",
        mesh.n_cells(),
        mesh.n_faces(),
        mesh.patches().len()
    );

    let fields = super::carrier_fields(&case, &mesh)?;
    let gravity = DVec3::from_array(case.gravity);
    info!("插值: {:?}, 重力: {:?} m/s²", case.interpolation, case.gravity);

    let mut solver = DecomposedCase::new(
        &mesh,
        &fields,
        case.run.n_ranks,
        CLOUD_NAME,
        &case.cloud,
        case.interpolation,
        gravity,
    )
    .context("区域分解失败")?;

    for (i, seed) in case.particles.iter().enumerate() {
        let (rank, id) = solver
            .seed(
                DVec3::from_array(seed.position),
                seed.diameter,
                DVec3::from_array(seed.velocity),
            )
            .with_context(|| format!("放置初始颗粒 particles[{}] 失败", i))?;
        debug!("颗粒 {} 放在进程 {}", id, rank);
    }
    info!("初始颗粒: {} 个, {} 个分区", solver.n_particles(), solver.n_ranks());

    let run = &case.run;
    std::fs::create_dir_all(&run.output)
        .with_context(|| format!("无法创建输出目录: {}", run.output.display()))?;

    let n_steps = (run.end_time / run.dt).round() as usize;
    let write_every = ((run.write_interval / run.dt).round() as usize).max(1);
    info!(
        "开始推进: 结束时间={} s, 时间步长={} s, {} 步",
        run.end_time, run.dt, n_steps
    );

    write_time(&solver, &run.output, 0.0)?;
    let mut output_count = 1;
    let mut totals = StepReport::default();
    let start = Instant::now();

    for step in 1..=n_steps {
        let time = step as f64 * run.dt;
        let report = solver
            .evolve(run.dt)
            .with_context(|| format!("t={} s 推进失败", time_name(time)))?;

        info!(
            "t={} s: 颗粒 {}, 离开 {}, 移交 {} ({} 轮)",
            time_name(time),
            solver.n_particles(),
            report.removed,
            report.migrated,
            report.rounds
        );
        if report.dropped > 0 {
            warn!("t={} s: 丢弃 {} 个颗粒", time_name(time), report.dropped);
        }
        totals.merge(&report);

        if step % write_every == 0 || step == n_steps {
            write_time(&solver, &run.output, time)?;
            output_count += 1;
        }
    }

    let elapsed = start.elapsed();
    info!("=== 运行完成 ===");
    info!("总步数: {}", n_steps);
    info!("剩余颗粒: {}", solver.n_particles());
    info!(
        "累计: 离开 {}, 丢弃 {}, 移交 {}",
        totals.removed, totals.dropped, totals.migrated
    );
    info!("计算时间: {:.2} s", elapsed.as_secs_f64());
    info!("输出时刻数: {}", output_count);

    let summary = run.output.join("summary.json");
    std::fs::write(&summary, serde_json::to_string_pretty(&totals)?)
        .with_context(|| format!("无法写出 {}", summary.display()))?;

    Ok(())
}

/// 写出一个时刻
fn write_time(solver: &DecomposedCase, output: &Path, time: f64) -> Result<()> {
    let dir = output.join(time_name(time));
    solver
        .write(&dir)
        .with_context(|| format!("写出失败: {}", dir.display()))?;
    Ok(())
}

/// 时间目录名（去掉累加误差）
fn time_name(time: f64) -> String {
    let rounded = (time * 1e9).round() / 1e9;
    format!("{}", rounded)
}
