// crates/lg_io/src/stream.rs

//! 带标签的文本对象流
//!
//! 逐记录写入、逐记录读取的 ASCII 流。两种组织方式：
//!
//! - **记录流**: 每行一条记录，字段以空格分隔，矢量写作 `(x y z)`
//! - **字段数组**: `标签 数量 ( 值 ... )`，供按字段读写和后处理
//!
//! ```text
//! // positions
//! 2
//! (
//! (0.5 0.5 0.5) 0
//! (1.5 0.5 0.5) 1
//! )
//! d
//! 2
//! (
//! 1e-3
//! 2e-3
//! )
//! ```
//!
//! 浮点数以最短可往返的指数形式写出，读回后逐位相等。
//! `//` 起始到行尾为注释。

use std::collections::VecDeque;
use std::fmt;
use std::io::{BufRead, Write};

use glam::DVec3;

use crate::error::{StreamError, StreamResult};

// ============================================================
// 记号
// ============================================================

/// 流记号
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `(`
    Open,
    /// `)`
    Close,
    /// 其它以空白分隔的词
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "("),
            Self::Close => write!(f, ")"),
            Self::Word(w) => write!(f, "{}", w),
        }
    }
}

// ============================================================
// 写出
// ============================================================

/// 对象流写出器
pub struct StreamWriter<W: Write> {
    inner: W,
    /// 当前行是否已有内容（决定是否需要分隔空格）
    line_open: bool,
}

impl<W: Write> StreamWriter<W> {
    /// 包装写出目标
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            line_open: false,
        }
    }

    /// 取回写出目标
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn separator(&mut self) -> StreamResult<()> {
        if self.line_open {
            self.inner.write_all(b" ")?;
        }
        self.line_open = true;
        Ok(())
    }

    /// 写注释行
    pub fn write_comment(&mut self, text: &str) -> StreamResult<()> {
        self.end_record()?;
        writeln!(self.inner, "// {}", text)?;
        Ok(())
    }

    /// 写一个词（标签等）
    pub fn write_word(&mut self, word: &str) -> StreamResult<()> {
        self.separator()?;
        self.inner.write_all(word.as_bytes())?;
        Ok(())
    }

    /// 写标量
    pub fn write_scalar(&mut self, value: f64) -> StreamResult<()> {
        self.separator()?;
        write!(self.inner, "{:e}", value)?;
        Ok(())
    }

    /// 写整数
    pub fn write_label(&mut self, value: u64) -> StreamResult<()> {
        self.separator()?;
        write!(self.inner, "{}", value)?;
        Ok(())
    }

    /// 写矢量 `(x y z)`
    pub fn write_vector(&mut self, v: DVec3) -> StreamResult<()> {
        self.separator()?;
        write!(self.inner, "({:e} {:e} {:e})", v.x, v.y, v.z)?;
        Ok(())
    }

    /// 结束当前记录（换行）
    pub fn end_record(&mut self) -> StreamResult<()> {
        if self.line_open {
            self.inner.write_all(b"\n")?;
            self.line_open = false;
        }
        Ok(())
    }

    /// 写列表头 `数量 (`
    pub fn begin_list(&mut self, count: usize) -> StreamResult<()> {
        self.end_record()?;
        writeln!(self.inner, "{}\n(", count)?;
        Ok(())
    }

    /// 写列表尾 `)`
    pub fn end_list(&mut self) -> StreamResult<()> {
        self.end_record()?;
        writeln!(self.inner, ")")?;
        Ok(())
    }

    /// 写带标签的字段数组
    pub fn write_labelled<T>(
        &mut self,
        label: &str,
        values: &[T],
        mut write_one: impl FnMut(&mut Self, &T) -> StreamResult<()>,
    ) -> StreamResult<()> {
        self.end_record()?;
        writeln!(self.inner, "{}", label)?;
        self.begin_list(values.len())?;
        for v in values {
            write_one(self, v)?;
            self.end_record()?;
        }
        self.end_list()
    }

    /// 写带标签的标量数组
    pub fn write_scalar_field(&mut self, label: &str, values: &[f64]) -> StreamResult<()> {
        self.write_labelled(label, values, |w, &v| w.write_scalar(v))
    }

    /// 写带标签的矢量数组
    pub fn write_vector_field(&mut self, label: &str, values: &[DVec3]) -> StreamResult<()> {
        self.write_labelled(label, values, |w, &v| w.write_vector(v))
    }

    /// 写带标签的整数数组
    pub fn write_label_field(&mut self, label: &str, values: &[u64]) -> StreamResult<()> {
        self.write_labelled(label, values, |w, &v| w.write_label(v))
    }

    /// 刷新
    pub fn flush(&mut self) -> StreamResult<()> {
        self.end_record()?;
        self.inner.flush()?;
        Ok(())
    }
}

// ============================================================
// 读取
// ============================================================

/// 对象流读取器
pub struct StreamReader<R: BufRead> {
    inner: R,
    pending: VecDeque<Token>,
    line: usize,
    eof: bool,
}

impl<R: BufRead> StreamReader<R> {
    /// 包装读取源
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
            line: 0,
            eof: false,
        }
    }

    /// 当前行号（从 1 开始）
    pub fn line(&self) -> usize {
        self.line
    }

    /// 读入下一个非空行并切分记号
    fn fill(&mut self) -> StreamResult<()> {
        let mut buf = String::new();
        while self.pending.is_empty() && !self.eof {
            buf.clear();
            if self.inner.read_line(&mut buf)? == 0 {
                self.eof = true;
                break;
            }
            self.line += 1;
            let content = buf.split("//").next().unwrap_or("");
            let mut word = String::new();
            for ch in content.chars() {
                match ch {
                    '(' | ')' => {
                        if !word.is_empty() {
                            self.pending.push_back(Token::Word(std::mem::take(&mut word)));
                        }
                        self.pending.push_back(if ch == '(' { Token::Open } else { Token::Close });
                    }
                    c if c.is_whitespace() => {
                        if !word.is_empty() {
                            self.pending.push_back(Token::Word(std::mem::take(&mut word)));
                        }
                    }
                    c => word.push(c),
                }
            }
            if !word.is_empty() {
                self.pending.push_back(Token::Word(word));
            }
        }
        Ok(())
    }

    /// 下一个记号（流结束返回 None）
    pub fn next_token(&mut self) -> StreamResult<Option<Token>> {
        self.fill()?;
        Ok(self.pending.pop_front())
    }

    /// 查看下一个记号但不消费
    pub fn peek(&mut self) -> StreamResult<Option<&Token>> {
        self.fill()?;
        Ok(self.pending.front())
    }

    /// 流是否已读完
    pub fn is_eof(&mut self) -> StreamResult<bool> {
        Ok(self.peek()?.is_none())
    }

    fn require(&mut self, expected: &str) -> StreamResult<Token> {
        self.next_token()?.ok_or_else(|| StreamError::UnexpectedEof {
            expected: expected.to_string(),
        })
    }

    /// 读一个词
    pub fn read_word(&mut self) -> StreamResult<String> {
        match self.require("词")? {
            Token::Word(w) => Ok(w),
            other => Err(StreamError::unexpected(self.line, "词", other.to_string())),
        }
    }

    /// 读 `(`
    pub fn expect_open(&mut self) -> StreamResult<()> {
        match self.require("(")? {
            Token::Open => Ok(()),
            other => Err(StreamError::unexpected(self.line, "(", other.to_string())),
        }
    }

    /// 读 `)`
    pub fn expect_close(&mut self) -> StreamResult<()> {
        match self.require(")")? {
            Token::Close => Ok(()),
            other => Err(StreamError::unexpected(self.line, ")", other.to_string())),
        }
    }

    /// 读标量
    pub fn read_scalar(&mut self) -> StreamResult<f64> {
        let word = self.read_word()?;
        word.parse::<f64>()
            .map_err(|_| StreamError::unexpected(self.line, "浮点数", word))
    }

    /// 读非负整数
    pub fn read_label(&mut self) -> StreamResult<u64> {
        let word = self.read_word()?;
        word.parse::<u64>()
            .map_err(|_| StreamError::unexpected(self.line, "非负整数", word))
    }

    /// 读矢量 `(x y z)`
    pub fn read_vector(&mut self) -> StreamResult<DVec3> {
        self.expect_open()?;
        let x = self.read_scalar()?;
        let y = self.read_scalar()?;
        let z = self.read_scalar()?;
        self.expect_close()?;
        Ok(DVec3::new(x, y, z))
    }

    /// 读标签并检查
    pub fn expect_label(&mut self, label: &str) -> StreamResult<()> {
        let found = self.read_word()?;
        if found != label {
            return Err(StreamError::LabelMismatch {
                expected: label.to_string(),
                found,
            });
        }
        Ok(())
    }

    /// 读列表头 `数量 (`，`expected` 给定时检查数量
    pub fn begin_list(&mut self, field: &str, expected: Option<usize>) -> StreamResult<usize> {
        let count = self.read_label()? as usize;
        if let Some(expected) = expected {
            if count != expected {
                return Err(StreamError::CountMismatch {
                    field: field.to_string(),
                    expected,
                    actual: count,
                });
            }
        }
        self.expect_open()?;
        Ok(count)
    }

    /// 读带标签的字段数组
    pub fn read_labelled<T>(
        &mut self,
        label: &str,
        expected: Option<usize>,
        mut read_one: impl FnMut(&mut Self) -> StreamResult<T>,
    ) -> StreamResult<Vec<T>> {
        self.expect_label(label)?;
        let count = self.begin_list(label, expected)?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(read_one(self)?);
        }
        self.expect_close()?;
        Ok(values)
    }

    /// 读带标签的标量数组
    pub fn read_scalar_field(
        &mut self,
        label: &str,
        expected: Option<usize>,
    ) -> StreamResult<Vec<f64>> {
        self.read_labelled(label, expected, |r| r.read_scalar())
    }

    /// 读带标签的矢量数组
    pub fn read_vector_field(
        &mut self,
        label: &str,
        expected: Option<usize>,
    ) -> StreamResult<Vec<DVec3>> {
        self.read_labelled(label, expected, |r| r.read_vector())
    }

    /// 读带标签的整数数组
    pub fn read_label_field(
        &mut self,
        label: &str,
        expected: Option<usize>,
    ) -> StreamResult<Vec<u64>> {
        self.read_labelled(label, expected, |r| r.read_label())
    }
}
