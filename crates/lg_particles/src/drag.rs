// crates/lg_particles/src/drag.rs

//! 曳力闭合
//!
//! 曳力系数 `Dc` [1/s] 定义为颗粒加速度 `Dc·(Uc − U)` 中的系数：
//!
//! ```text
//! Re = |Uc − U|·d / ν
//! Dc = 18·ν·ρc / (ρp·d²) · f(Re)
//! ```
//!
//! - Schiller-Naumann: `f = 1 + 0.15·Re^0.687`（Re > 0.01，否则 1）
//! - Stokes: `f = 1`
//! - None: `Dc = 0`

use lg_config::DragLaw;

/// Schiller-Naumann 修正的下限雷诺数
const RE_SMALL: f64 = 0.01;

/// 颗粒雷诺数
#[inline]
pub fn particle_reynolds(relative_speed: f64, d: f64, nu: f64) -> f64 {
    if nu > 0.0 {
        relative_speed * d / nu
    } else {
        0.0
    }
}

/// 雷诺数修正因子 f(Re)
#[inline]
pub fn correction_factor(law: DragLaw, re: f64) -> f64 {
    match law {
        DragLaw::SchillerNaumann if re > RE_SMALL => 1.0 + 0.15 * re.powf(0.687),
        DragLaw::SchillerNaumann | DragLaw::Stokes => 1.0,
        DragLaw::None => 0.0,
    }
}

/// 曳力系数 Dc [1/s]
///
/// 直径或粘度非正时返回 0。
pub fn drag_coefficient(
    law: DragLaw,
    relative_speed: f64,
    d: f64,
    nu: f64,
    rho_c: f64,
    rho_p: f64,
) -> f64 {
    if law == DragLaw::None || !(d > 0.0) || !(nu > 0.0) {
        return 0.0;
    }
    let re = particle_reynolds(relative_speed, d, nu);
    18.0 * nu * rho_c / (rho_p * d * d) * correction_factor(law, re)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stokes_limit() {
        // d = 100 μm，水中石英砂
        let dc = drag_coefficient(DragLaw::Stokes, 0.1, 1e-4, 1e-6, 1000.0, 2650.0);
        let expected = 18.0 * 1e-6 * 1000.0 / (2650.0 * 1e-8);
        assert!((dc - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_schiller_naumann_continuous() {
        // Re 跨过 0.01 时修正因子几乎连续
        let below = correction_factor(DragLaw::SchillerNaumann, 0.01);
        let above = correction_factor(DragLaw::SchillerNaumann, 0.0100001);
        assert_eq!(below, 1.0);
        assert!((above - below) < 0.01);

        let f = correction_factor(DragLaw::SchillerNaumann, 100.0);
        assert!((f - (1.0 + 0.15 * 100f64.powf(0.687))).abs() < 1e-12);
    }

    #[test]
    fn test_no_drag() {
        assert_eq!(drag_coefficient(DragLaw::None, 1.0, 1e-3, 1e-5, 1.2, 1000.0), 0.0);
        assert_eq!(drag_coefficient(DragLaw::Stokes, 1.0, 0.0, 1e-5, 1.2, 1000.0), 0.0);
    }
}
