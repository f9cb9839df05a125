//! 二值掩码及其压缩存储.

use super::grid::Grid;
use super::plane_of;
use crate::SegResult;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::{ArrayD, ArrayView2, ArrayViewD};
use std::io::{self, Read, Write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 与源体数据同形状的二值掩码. `true` 为前景.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    data: ArrayD<bool>,
}

impl From<ArrayD<bool>> for Mask {
    #[inline]
    fn from(data: ArrayD<bool>) -> Self {
        Self { data }
    }
}

impl Mask {
    /// 直接初始化.
    #[inline]
    pub fn new(data: ArrayD<bool>) -> Self {
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayViewD<'_, bool> {
        self.data.view()
    }

    /// 消费自我, 获得底层数组.
    #[inline]
    pub fn into_raw(self) -> ArrayD<bool> {
        self.data
    }

    /// 掩码形状.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 前景体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|p| **p).count()
    }

    /// 是否为全背景.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|p| *p)
    }

    /// 获取给定位置的值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: &[usize]) -> Option<bool> {
        self.data.get(pos).copied()
    }

    /// 依次固定前导轴的索引, 获取剩余的 2D 平面. 参见 [`crate::Volume::plane_at`].
    #[inline]
    pub fn plane_at(&self, leading: &[usize]) -> SegResult<ArrayView2<'_, bool>> {
        plane_of(self.data.view(), leading)
    }

    /// 行优先的扁平化数据.
    pub(crate) fn to_flat(&self) -> Vec<bool> {
        self.data.iter().copied().collect()
    }

    /// 由行优先扁平数据构建.
    pub(crate) fn from_flat(grid: &Grid, flat: Vec<bool>) -> Self {
        Self {
            data: grid.to_array(flat),
        }
    }

    /// 压缩数据.
    pub fn compress(&self) -> CompactMask {
        let buf: Vec<u8> = self.data.iter().map(|p| u8::from(*p)).collect();
        let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
        // 写入内存缓冲区不会失败.
        e.write_all(&buf).expect("Compression error");
        CompactMask {
            buf: e.finish().expect("Compression error"),
            shape: self.shape().to_vec(),
        }
    }
}

/// 压缩存储的 [`Mask`]; 不透明类型.
///
/// 用于在时间序列处理时廉价地保留每一帧被选中分量的掩码, 以便调用方随后渲染.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactMask {
    /// 压缩的不透明字节流.
    buf: Vec<u8>,

    /// 形状.
    shape: Vec<usize>,
}

impl CompactMask {
    /// 原掩码形状.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// 压缩后的字节数.
    #[inline]
    pub fn compressed_len(&self) -> usize {
        self.buf.len()
    }

    /// 解压缩数据. 字节流损坏 (例如反序列化了错误的数据) 时返回 `Err`.
    pub fn decompress(&self) -> io::Result<Mask> {
        let grid = Grid::new(&self.shape);
        let mut d = ZlibDecoder::new(self.buf.as_slice());
        let mut buf = Vec::with_capacity(grid.len());
        d.read_to_end(&mut buf)?;
        if buf.len() != grid.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "decompressed length does not match shape",
            ));
        }
        Ok(Mask::from_flat(&grid, buf.into_iter().map(|b| b != 0).collect()))
    }
}
