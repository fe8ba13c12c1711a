// apps/lg_cli/src/main.rs

//! Lagrange 颗粒追踪命令行界面
//!
//! 读入 JSON 算例，在块网格上推进颗粒云并按输出间隔写出。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**，负责时间循环和日志初始化，
//! 颗粒追踪本身全部在 `lg_particles` 中。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Lagrange 颗粒追踪命令行工具
#[derive(Parser)]
#[command(name = "lg_cli")]
#[command(author = "Lagrange Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lagrangian particle tracking on polyhedral meshes", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行算例
    Run(commands::run::RunArgs),
    /// 验证算例配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
