// crates/lg_config/src/case.rs

//! CaseConfig - 算例配置
//!
//! 描述一次颗粒追踪运行所需的全部输入：块网格、连续相场、重力、
//! 时间步进参数、区域分解数、插值格式、初始颗粒与颗粒云物性。
//!
//! 连续相默认是均匀场；给出 `fluid.fields` 时改为从该文件读入逐单元的
//! `U`、`rho`、`nu`。相对路径相对于算例文件所在目录。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cloud::CloudConfig;
use crate::error::ConfigError;

/// 块网格侧面边界类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    /// 固壁
    #[default]
    Wall,
    /// 封闭的普通边界
    Patch,
    /// 出流（开边界）
    Outflow,
}

/// 六个侧面的边界类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct SideBoundaries {
    /// x 最小侧
    #[serde(default)]
    pub x_min: BoundaryType,
    /// x 最大侧
    #[serde(default)]
    pub x_max: BoundaryType,
    /// y 最小侧
    #[serde(default)]
    pub y_min: BoundaryType,
    /// y 最大侧
    #[serde(default)]
    pub y_max: BoundaryType,
    /// z 最小侧
    #[serde(default)]
    pub z_min: BoundaryType,
    /// z 最大侧
    #[serde(default)]
    pub z_max: BoundaryType,
}

impl SideBoundaries {
    /// 按 xMin, xMax, yMin, yMax, zMin, zMax 顺序返回
    pub fn as_array(&self) -> [BoundaryType; 6] {
        [self.x_min, self.x_max, self.y_min, self.y_max, self.z_min, self.z_max]
    }
}

/// 块网格配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// 包围盒最小角点 [m]
    #[serde(default)]
    pub min: [f64; 3],
    /// 包围盒最大角点 [m]
    #[serde(default = "default_max")]
    pub max: [f64; 3],
    /// 每个方向的单元数
    #[serde(default = "default_divisions")]
    pub divisions: [usize; 3],
    /// 侧面边界类型
    #[serde(default)]
    pub boundaries: SideBoundaries,
}

fn default_max() -> [f64; 3] { [1.0, 1.0, 1.0] }
fn default_divisions() -> [usize; 3] { [10, 10, 10] }

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            min: [0.0; 3],
            max: default_max(),
            divisions: default_divisions(),
            boundaries: SideBoundaries::default(),
        }
    }
}

/// 连续相配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidConfig {
    /// 逐单元场文件，给出时忽略下面的均匀值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<PathBuf>,
    /// 速度 U [m/s]
    #[serde(default)]
    pub velocity: [f64; 3],
    /// 密度 rho [kg/m³]
    #[serde(default = "default_rho")]
    pub density: f64,
    /// 运动粘度 nu [m²/s]
    #[serde(default = "default_nu")]
    pub viscosity: f64,
}

fn default_rho() -> f64 { 1.2 }
fn default_nu() -> f64 { 1.5e-5 }

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            fields: None,
            velocity: [0.0; 3],
            density: default_rho(),
            viscosity: default_nu(),
        }
    }
}

/// 场插值格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationScheme {
    /// 单元中心值
    #[default]
    Cell,
    /// 单元及面邻居的反距离加权
    InverseDistance,
}

/// 时间步进与输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// 时间步长 [s]
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// 结束时间 [s]
    #[serde(default = "default_end_time")]
    pub end_time: f64,
    /// 输出间隔 [s]
    #[serde(default = "default_write_interval")]
    pub write_interval: f64,
    /// 区域分解数
    #[serde(default = "default_n_ranks")]
    pub n_ranks: usize,
    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
}

fn default_dt() -> f64 { 1e-3 }
fn default_end_time() -> f64 { 0.1 }
fn default_write_interval() -> f64 { 0.01 }
fn default_n_ranks() -> usize { 1 }
fn default_output_dir() -> PathBuf { PathBuf::from("output") }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            end_time: default_end_time(),
            write_interval: default_write_interval(),
            n_ranks: default_n_ranks(),
            output: default_output_dir(),
        }
    }
}

/// 初始颗粒
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSeed {
    /// 位置 [m]
    pub position: [f64; 3],
    /// 直径 [m]
    pub diameter: f64,
    /// 速度 [m/s]
    #[serde(default)]
    pub velocity: [f64; 3],
}

/// 算例配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseConfig {
    /// 网格
    #[serde(default)]
    pub mesh: MeshConfig,
    /// 连续相
    #[serde(default)]
    pub fluid: FluidConfig,
    /// 重力加速度 [m/s²]
    #[serde(default = "default_gravity")]
    pub gravity: [f64; 3],
    /// 插值格式
    #[serde(default)]
    pub interpolation: InterpolationScheme,
    /// 时间步进
    #[serde(default)]
    pub run: RunConfig,
    /// 颗粒云物性
    #[serde(default)]
    pub cloud: CloudConfig,
    /// 初始颗粒
    #[serde(default)]
    pub particles: Vec<ParticleSeed>,
}

fn default_gravity() -> [f64; 3] { [0.0, 0.0, -9.81] }

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            mesh: MeshConfig::default(),
            fluid: FluidConfig::default(),
            gravity: default_gravity(),
            interpolation: InterpolationScheme::default(),
            run: RunConfig::default(),
            cloud: CloudConfig::default(),
            particles: Vec::new(),
        }
    }
}

impl CaseConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: CaseConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let (Some(fields), Some(dir)) = (config.fluid.fields.as_mut(), path.parent()) {
            if fields.is_relative() {
                *fields = dir.join(&*fields);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        for axis in 0..3 {
            if !(self.mesh.max[axis] > self.mesh.min[axis]) {
                return Err(ConfigError::invalid(
                    "mesh.max",
                    format!("{:?}", self.mesh.max),
                    "包围盒最大角点必须大于最小角点",
                ));
            }
            if self.mesh.divisions[axis] == 0 {
                return Err(ConfigError::invalid(
                    "mesh.divisions",
                    format!("{:?}", self.mesh.divisions),
                    "每个方向至少一个单元",
                ));
            }
        }

        if !(self.fluid.density > 0.0) {
            return Err(ConfigError::invalid("fluid.density", self.fluid.density, "密度必须为正"));
        }
        if !(self.fluid.viscosity > 0.0) {
            return Err(ConfigError::invalid("fluid.viscosity", self.fluid.viscosity, "粘度必须为正"));
        }

        if !(self.run.dt > 0.0) {
            return Err(ConfigError::invalid("run.dt", self.run.dt, "时间步长必须为正"));
        }
        if self.run.end_time < 0.0 {
            return Err(ConfigError::invalid("run.end_time", self.run.end_time, "结束时间不能为负"));
        }
        if self.run.n_ranks == 0 || self.run.n_ranks > self.mesh.divisions[0] {
            return Err(ConfigError::invalid(
                "run.n_ranks",
                self.run.n_ranks,
                format!("分解数必须在 [1, {}] 范围内", self.mesh.divisions[0]),
            ));
        }

        for (i, seed) in self.particles.iter().enumerate() {
            if !(seed.diameter > 0.0) {
                return Err(ConfigError::invalid(
                    &format!("particles[{}].diameter", i),
                    seed.diameter,
                    "颗粒直径必须为正",
                ));
            }
        }

        self.cloud.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gravity, [0.0, 0.0, -9.81]);
    }

    #[test]
    fn test_too_many_ranks() {
        let mut config = CaseConfig::default();
        config.run.n_ranks = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_diameter() {
        let mut config = CaseConfig::default();
        config.particles.push(ParticleSeed {
            position: [0.5; 3],
            diameter: -1e-4,
            velocity: [0.0; 3],
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("particles[0].diameter"));
    }

    #[test]
    fn test_parse_minimal_case() {
        let json = r#"{
            "mesh": { "divisions": [4, 2, 2], "boundaries": { "x_max": "outflow" } },
            "run": { "n_ranks": 2 },
            "particles": [ { "position": [0.1, 0.5, 0.5], "diameter": 1e-4 } ]
        }"#;
        let config: CaseConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.mesh.boundaries.x_max, BoundaryType::Outflow);
        assert_eq!(config.mesh.boundaries.x_min, BoundaryType::Wall);
        assert_eq!(config.particles[0].velocity, [0.0; 3]);
        assert!(config.fluid.fields.is_none());
    }

    #[test]
    fn test_fields_path_relative_to_case() {
        let dir = std::env::temp_dir().join(format!("lg_config_fields_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let case_file = dir.join("case.json");
        std::fs::write(&case_file, r#"{ "fluid": { "fields": "0/carrier" } }"#).unwrap();

        let config = CaseConfig::from_file(&case_file).unwrap();
        assert_eq!(config.fluid.fields, Some(dir.join("0/carrier")));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
