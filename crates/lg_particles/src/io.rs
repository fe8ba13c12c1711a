// crates/lg_particles/src/io.rs

//! 颗粒云读写
//!
//! 颗粒云持久化为两个流：
//!
//! - `positions`: 几何状态，每个颗粒一条 `(x y z) cell` 记录
//! - `fields`: 物理字段，按字段写出带标签数组 `d`、`U`、`origId`
//!
//! 读取时先由 `positions` 建立颗粒，再按同样顺序从 `fields` 填充物理字段。
//! 字段标签或数量与云不一致时读取失败。

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lg_config::{CloudConfig, WriteOption};
use lg_io::{StreamError, StreamReader, StreamWriter};
use lg_mesh::PolyMeshAccess;
use tracing::{debug, info};

use crate::cloud::{check_diameter, ParticleCloud};
use crate::error::{CloudError, CloudResult};
use crate::particle::Particle;

/// 几何状态流名称
pub const POSITIONS_STREAM: &str = "positions";
/// 物理字段流名称
pub const FIELDS_STREAM: &str = "fields";

/// 直径字段标签
pub const LABEL_D: &str = "d";
/// 速度字段标签
pub const LABEL_U: &str = "U";
/// 身份编号字段标签
pub const LABEL_ID: &str = "origId";

impl ParticleCloud {
    // ===== 几何状态 =====

    /// 写几何状态流
    pub fn write_positions<W: Write>(&self, w: &mut StreamWriter<W>) -> CloudResult<()> {
        w.write_comment(&format!("{} {}", self.name(), POSITIONS_STREAM))?;
        self.write_records(w, false)
    }

    /// 由几何状态流建立颗粒云（物理字段待读入）
    pub fn read_positions<R: BufRead>(
        name: impl Into<String>,
        config: CloudConfig,
        r: &mut StreamReader<R>,
    ) -> CloudResult<Self> {
        let mut cloud = Self::new(name, config);
        cloud.particles = read_list(r, POSITIONS_STREAM, |r| Particle::read_record(r, false))?;
        Ok(cloud)
    }

    // ===== 记录流 =====

    /// 按记录写出全部颗粒（数量前缀）
    pub fn write_records<W: Write>(
        &self,
        w: &mut StreamWriter<W>,
        with_fields: bool,
    ) -> CloudResult<()> {
        w.begin_list(self.len())?;
        for p in self.iter() {
            p.write_record(w, with_fields)?;
        }
        w.end_list()?;
        Ok(())
    }

    /// 按记录读入全部颗粒，替换云中已有颗粒
    pub fn read_records<R: BufRead>(
        &mut self,
        r: &mut StreamReader<R>,
        with_fields: bool,
    ) -> CloudResult<()> {
        let particles = read_list(r, "records", |r| Particle::read_record(r, with_fields))?;
        if with_fields {
            for p in &particles {
                check_diameter(p.d)?;
                check_id(p.id)?;
            }
        }
        for p in &particles {
            self.ids.observe(p.id);
        }
        self.particles = particles;
        Ok(())
    }

    // ===== 物理字段 =====

    /// 写物理字段流（带标签数组，按颗粒顺序）
    pub fn write_fields<W: Write>(&self, w: &mut StreamWriter<W>) -> CloudResult<()> {
        let d: Vec<f64> = self.iter().map(|p| p.d).collect();
        let u: Vec<_> = self.iter().map(|p| p.velocity).collect();
        let ids: Vec<u64> = self.iter().map(|p| p.id).collect();
        w.write_comment(&format!("{} {}", self.name(), FIELDS_STREAM))?;
        w.write_scalar_field(LABEL_D, &d)?;
        w.write_vector_field(LABEL_U, &u)?;
        w.write_label_field(LABEL_ID, &ids)?;
        Ok(())
    }

    /// 从物理字段流填充已建立颗粒的直径、速度和编号
    ///
    /// # 错误
    ///
    /// 字段标签或数量与云不一致、直径不是有限正数或编号越界时返回
    /// [`CloudError::Format`]，云中颗粒保持不变。
    pub fn read_fields<R: BufRead>(&mut self, r: &mut StreamReader<R>) -> CloudResult<()> {
        let n = self.len();
        let d = r.read_scalar_field(LABEL_D, Some(n)).map_err(format_error)?;
        let u = r.read_vector_field(LABEL_U, Some(n)).map_err(format_error)?;
        let ids = r.read_label_field(LABEL_ID, Some(n)).map_err(format_error)?;
        for (&d, &id) in d.iter().zip(&ids) {
            check_diameter(d)?;
            check_id(id)?;
        }

        for (((p, d), u), id) in self.particles.iter_mut().zip(d).zip(u).zip(ids) {
            p.d = d;
            p.velocity = u;
            p.id = id;
            self.ids.observe(id);
        }
        Ok(())
    }

    /// 由两个流建立完整颗粒云
    ///
    /// 单元编号只在 [`check_cells`](Self::check_cells) 中与网格核对。
    pub fn from_streams<R1: BufRead, R2: BufRead>(
        name: impl Into<String>,
        config: CloudConfig,
        positions: &mut StreamReader<R1>,
        fields: &mut StreamReader<R2>,
    ) -> CloudResult<Self> {
        let mut cloud = Self::read_positions(name, config, positions)?;
        cloud.read_fields(fields)?;
        Ok(cloud)
    }

    // ===== 目录 =====

    /// 颗粒云在时间目录下的路径 `<dir>/lagrangian/<name>`
    pub fn cloud_dir(&self, dir: &Path) -> PathBuf {
        dir.join("lagrangian").join(self.name())
    }

    /// 写出到时间目录
    ///
    /// 配置为 `no_write` 时不写出，返回 false。
    pub fn write_to_dir(&self, dir: &Path) -> CloudResult<bool> {
        if self.config().write == WriteOption::NoWrite {
            debug!("云 {} 配置为不写出", self.name());
            return Ok(false);
        }
        let cloud_dir = self.cloud_dir(dir);
        fs::create_dir_all(&cloud_dir).map_err(StreamError::from)?;

        let mut w = StreamWriter::new(BufWriter::new(
            File::create(cloud_dir.join(POSITIONS_STREAM)).map_err(StreamError::from)?,
        ));
        self.write_positions(&mut w)?;
        w.flush()?;

        let mut w = StreamWriter::new(BufWriter::new(
            File::create(cloud_dir.join(FIELDS_STREAM)).map_err(StreamError::from)?,
        ));
        self.write_fields(&mut w)?;
        w.flush()?;

        info!("写出颗粒云 {}: {} 个颗粒 -> {}", self.name(), self.len(), cloud_dir.display());
        Ok(true)
    }

    /// 从时间目录读入，并核对颗粒单元属于网格
    pub fn read_from_dir<M: PolyMeshAccess + ?Sized>(
        mesh: &M,
        name: impl Into<String>,
        config: CloudConfig,
        dir: &Path,
    ) -> CloudResult<Self> {
        let name = name.into();
        let cloud_dir = dir.join("lagrangian").join(&name);
        let open = |stream: &str| -> CloudResult<StreamReader<BufReader<File>>> {
            let file = File::open(cloud_dir.join(stream)).map_err(StreamError::from)?;
            Ok(StreamReader::new(BufReader::new(file)))
        };
        let mut positions = open(POSITIONS_STREAM)?;
        let mut fields = open(FIELDS_STREAM)?;
        let cloud = Self::from_streams(name, config, &mut positions, &mut fields)?;
        cloud.check_cells(mesh)?;
        Ok(cloud)
    }
}

/// 标签和数量不一致归为格式错误，其余保持为对象流错误
fn format_error(err: StreamError) -> CloudError {
    match err {
        StreamError::LabelMismatch { ref expected, .. } => {
            CloudError::format(expected.clone(), err.to_string())
        }
        StreamError::CountMismatch { ref field, .. } => {
            CloudError::format(field.clone(), err.to_string())
        }
        other => CloudError::Stream(other),
    }
}

/// 编号 `u64::MAX` 之后无法再分配新编号
fn check_id(id: u64) -> CloudResult<()> {
    if id == u64::MAX {
        return Err(CloudError::format(LABEL_ID, format!("编号 {} 超出范围", id)));
    }
    Ok(())
}

/// 读数量前缀的记录列表
fn read_list<R: BufRead, T>(
    r: &mut StreamReader<R>,
    field: &str,
    mut read_one: impl FnMut(&mut StreamReader<R>) -> lg_io::StreamResult<T>,
) -> CloudResult<Vec<T>> {
    let count = r.begin_list(field, None).map_err(format_error)?;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(read_one(r).map_err(format_error)?);
    }
    r.expect_close()?;
    if !r.is_eof()? {
        return Err(CloudError::format(field, format!("{} 条记录之后仍有数据", count)));
    }
    Ok(items)
}
