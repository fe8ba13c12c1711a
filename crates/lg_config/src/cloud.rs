// crates/lg_config/src/cloud.rs

//! CloudConfig - 颗粒云物性配置
//!
//! 对应算例中的 `cloudProperties`：颗粒密度、壁面碰撞恢复系数与摩擦系数、
//! 曳力模型、追踪保护参数和输出策略。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// 曳力闭合模型
///
/// 所有模型在相对速度为零时给出零曳力加速度，且对输入连续。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DragLaw {
    /// Schiller-Naumann 修正：`f = 1 + 0.15 Re^0.687`（Re > 0.01）
    #[default]
    SchillerNaumann,
    /// Stokes 曳力：`f = 1`，适用于低雷诺数
    Stokes,
    /// 无曳力（弹道运动）
    None,
}

/// 字段输出策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteOption {
    /// 每个输出时刻写出
    #[default]
    AutoWrite,
    /// 不写出
    NoWrite,
}

/// 颗粒云配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// 颗粒密度 [kg/m³]
    #[serde(default = "default_rho_p")]
    pub rho_p: f64,

    /// 法向恢复系数 e ∈ [0, 1]
    #[serde(default = "default_e")]
    pub e: f64,

    /// 切向摩擦系数 μ ∈ [0, 1]
    #[serde(default)]
    pub mu: f64,

    /// 曳力模型
    #[serde(default)]
    pub drag: DragLaw,

    /// 每个时间步单个颗粒允许的最大子段数
    #[serde(default = "default_max_track_segments")]
    pub max_track_segments: usize,

    /// 输出策略
    #[serde(default)]
    pub write: WriteOption,
}

fn default_rho_p() -> f64 { 1000.0 }
fn default_e() -> f64 { 1.0 }
fn default_max_track_segments() -> usize { 1000 }

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            rho_p: default_rho_p(),
            e: default_e(),
            mu: 0.0,
            drag: DragLaw::default(),
            max_track_segments: default_max_track_segments(),
            write: WriteOption::default(),
        }
    }
}

impl CloudConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: CloudConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rho_p > 0.0) {
            return Err(ConfigError::invalid("cloud.rho_p", self.rho_p, "颗粒密度必须为正"));
        }
        if !(0.0..=1.0).contains(&self.e) {
            return Err(ConfigError::invalid("cloud.e", self.e, "恢复系数必须在 [0, 1] 范围内"));
        }
        if !(0.0..=1.0).contains(&self.mu) {
            return Err(ConfigError::invalid("cloud.mu", self.mu, "摩擦系数必须在 [0, 1] 范围内"));
        }
        if self.max_track_segments == 0 {
            return Err(ConfigError::invalid(
                "cloud.max_track_segments",
                self.max_track_segments,
                "至少允许一个子段",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CloudConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.drag, DragLaw::SchillerNaumann);
        assert_eq!(config.write, WriteOption::AutoWrite);
    }

    #[test]
    fn test_invalid_restitution() {
        let config = CloudConfig { e: 1.5, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CloudConfig =
            serde_json::from_str(r#"{ "rho_p": 2500.0, "drag": "stokes" }"#).unwrap();
        assert_eq!(config.rho_p, 2500.0);
        assert_eq!(config.drag, DragLaw::Stokes);
        assert_eq!(config.e, 1.0);
        assert_eq!(config.max_track_segments, 1000);
    }

    #[test]
    fn test_write_option_names() {
        let json = serde_json::to_string(&WriteOption::NoWrite).unwrap();
        assert_eq!(json, "\"no_write\"");
    }
}
