// crates/lg_particles/src/particle.rs

//! 球形颗粒
//!
//! 每个颗粒持有位置、所在单元、直径、速度和身份编号。身份编号在颗粒
//! 创建时分配，之后在读写和进程间移交中保持不变。
//!
//! # 记录格式
//!
//! 一条记录一行，字段顺序固定：
//!
//! ```text
//! (x y z) cell d (Ux Uy Uz) id
//! ```
//!
//! 不写出物理字段时只有 `(x y z) cell`。进程间移交的记录把 `cell`
//! 换成进程边界片的局部面号，并在末尾附加 `stepFraction`。

use std::io::{BufRead, Write};

use glam::DVec3;
use lg_foundation::{CellIndex, TrackTolerance};
use lg_io::{StreamError, StreamReader, StreamResult, StreamWriter};
use lg_mesh::PatchTransform;

/// 球形颗粒
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// 位置 [m]
    pub position: DVec3,
    /// 所在单元
    pub cell: CellIndex,
    /// 直径 [m]
    pub d: f64,
    /// 速度 U [m/s]
    pub velocity: DVec3,
    /// 身份编号
    pub id: u64,
    /// 当前时间步已完成的分数
    pub step_fraction: f64,
}

impl Particle {
    /// 创建颗粒
    pub fn new(position: DVec3, cell: CellIndex, d: f64, velocity: DVec3, id: u64) -> Self {
        Self {
            position,
            cell,
            d,
            velocity,
            id,
            step_fraction: 0.0,
        }
    }

    /// 只有几何状态的颗粒（物理字段待从流中读入）
    pub fn with_base_state(position: DVec3, cell: CellIndex) -> Self {
        Self::new(position, cell, 0.0, DVec3::ZERO, 0)
    }

    /// 撞壁距离：颗粒中心到壁面的最小距离
    #[inline]
    pub fn wall_impact_distance(&self) -> f64 {
        0.5 * self.d
    }

    /// 本时间步是否已走完
    #[inline]
    pub fn step_done(&self, tol: &TrackTolerance) -> bool {
        tol.is_exhausted(1.0 - self.step_fraction)
    }

    /// 按进程边界变换位置和速度
    pub fn transform_properties(&mut self, transform: &PatchTransform) {
        self.position = transform.transform_position(self.position);
        self.velocity = transform.transform_vector(self.velocity);
    }

    // ========================================================
    // 记录读写
    // ========================================================

    /// 写一条记录
    pub fn write_record<W: Write>(
        &self,
        w: &mut StreamWriter<W>,
        with_fields: bool,
    ) -> StreamResult<()> {
        w.write_vector(self.position)?;
        w.write_label(self.cell.get() as u64)?;
        if with_fields {
            self.write_properties(w)?;
        }
        w.end_record()
    }

    /// 读一条记录
    pub fn read_record<R: BufRead>(
        r: &mut StreamReader<R>,
        with_fields: bool,
    ) -> StreamResult<Self> {
        let position = r.read_vector()?;
        let cell = read_cell(r)?;
        let mut particle = Self::with_base_state(position, cell);
        if with_fields {
            particle.read_properties(r)?;
        }
        Ok(particle)
    }

    /// 写物理字段 `d (U) id`
    pub fn write_properties<W: Write>(&self, w: &mut StreamWriter<W>) -> StreamResult<()> {
        w.write_scalar(self.d)?;
        w.write_vector(self.velocity)?;
        w.write_label(self.id)
    }

    /// 读物理字段 `d (U) id`
    pub fn read_properties<R: BufRead>(&mut self, r: &mut StreamReader<R>) -> StreamResult<()> {
        self.d = r.read_scalar()?;
        self.velocity = r.read_vector()?;
        self.id = r.read_label()?;
        Ok(())
    }

    /// 写移交记录，`face` 为进程边界片局部面号
    pub fn write_transfer<W: Write>(
        &self,
        w: &mut StreamWriter<W>,
        face: usize,
    ) -> StreamResult<()> {
        w.write_vector(self.position)?;
        w.write_label(face as u64)?;
        self.write_properties(w)?;
        w.write_scalar(self.step_fraction)?;
        w.end_record()
    }

    /// 读移交记录，返回颗粒（单元待接收方确定）和局部面号
    pub fn read_transfer<R: BufRead>(r: &mut StreamReader<R>) -> StreamResult<(Self, usize)> {
        let position = r.read_vector()?;
        let face = r.read_label()? as usize;
        let mut particle = Self::with_base_state(position, CellIndex::INVALID);
        particle.read_properties(r)?;
        particle.step_fraction = r.read_scalar()?;
        Ok((particle, face))
    }
}

/// 读单元编号，超出 `u32` 或等于无效编号时报错
fn read_cell<R: BufRead>(r: &mut StreamReader<R>) -> StreamResult<CellIndex> {
    let label = r.read_label()?;
    u32::try_from(label)
        .ok()
        .map(CellIndex::new)
        .filter(|cell| cell.is_valid())
        .ok_or_else(|| StreamError::unexpected(r.line(), "单元编号", label.to_string()))
}
