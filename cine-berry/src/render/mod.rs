//! 切片渲染. 渲染不影响任何计算结果, 仅用于可视化.

use crate::consts::gray::{BLACK, WHITE};
use crate::error::RenderError;
use crate::IntensityWindow;
use ndarray::ArrayView2;
use std::fs;
use std::path::{Path, PathBuf};

/// 将 2D 切片渲染为图像的对象.
///
/// 实现者只需提供 [`SliceRenderer::render_gray`]; 强度切片与掩码的映射规则由默认方法给出.
pub trait SliceRenderer {
    /// 渲染已经映射为 8-bit 灰度的切片, 返回输出位置.
    fn render_gray(&self, name: &str, gray: ArrayView2<u8>) -> Result<PathBuf, RenderError>;

    /// 以强度窗口 `window` 渲染强度切片. `window` 为 `None` 时取切片自身的
    /// 最小值到最大值. NaN / inf 渲染为黑色.
    fn render(
        &self,
        name: &str,
        slice: ArrayView2<f32>,
        window: Option<IntensityWindow>,
    ) -> Result<PathBuf, RenderError> {
        let window = window
            .or_else(|| IntensityWindow::fit(slice.view()))
            .ok_or(RenderError::InvalidSlice("no finite intensity"))?;
        let gray = slice.mapv(|v| window.eval(v).unwrap_or(BLACK));
        self.render_gray(name, gray.view())
    }

    /// 渲染掩码: 前景为白色, 背景为黑色.
    fn render_mask(&self, name: &str, mask: ArrayView2<bool>) -> Result<PathBuf, RenderError> {
        let gray = mask.mapv(|m| if m { WHITE } else { BLACK });
        self.render_gray(name, gray.view())
    }
}

/// 灰度映射方式.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Colormap {
    /// 强度越高越亮.
    #[default]
    Gray,

    /// 强度越高越暗.
    Inverted,
}

/// 将切片以 8-bit 灰度 PNG 格式写入目录 `dir`, 文件名为 `{name}.png`.
#[derive(Debug, Clone)]
pub struct PngRenderer {
    dir: PathBuf,
    colormap: Colormap,
}

impl PngRenderer {
    /// 输出到 `dir`. 目录不存在时会在第一次渲染时创建.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
            colormap: Colormap::default(),
        }
    }

    /// 设置灰度映射方式.
    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }
}

impl SliceRenderer for PngRenderer {
    fn render_gray(&self, name: &str, gray: ArrayView2<u8>) -> Result<PathBuf, RenderError> {
        let (height, width) = gray.dim();
        if height == 0 || width == 0 {
            return Err(RenderError::InvalidSlice("empty slice"));
        }
        fs::create_dir_all(&self.dir)?;

        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &pix) in gray.indexed_iter() {
            let pix = match self.colormap {
                Colormap::Gray => pix,
                Colormap::Inverted => WHITE - pix,
            };
            buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
        }
        let path = self.dir.join(format!("{name}.png"));
        buf.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{Colormap, PngRenderer, SliceRenderer};
    use crate::{IntensityWindow, RenderError};
    use ndarray::{array, Array2};

    fn tmp_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("cine-berry-render-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_render_slice_png() {
        let dir = tmp_dir("slice");
        let r = PngRenderer::new(&dir);
        let slice = array![[0.0f32, 10.0, 20.0], [f32::NAN, 5.0, 30.0]];

        let path = r.render("fit", slice.view(), None).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(2, 1).0, [255]);
        assert_eq!(img.get_pixel(0, 1).0, [0]);

        let w = IntensityWindow::from_range(0.0, 10.0).unwrap();
        let path = r.render("window", slice.view(), Some(w)).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        assert_eq!(img.get_pixel(1, 1).0, [127]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_render_mask_inverted() {
        let dir = tmp_dir("mask");
        let r = PngRenderer::new(&dir).with_colormap(Colormap::Inverted);
        let mask = array![[true, false], [false, true]];
        let path = r.render_mask("mask", mask.view()).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_render_invalid_slice() {
        let r = PngRenderer::new(tmp_dir("invalid"));
        let nan = array![[f32::NAN]];
        assert!(matches!(
            r.render("nan", nan.view(), None),
            Err(RenderError::InvalidSlice(_))
        ));
        let empty = Array2::<f32>::zeros((0, 4));
        let w = IntensityWindow::new(0.0, 1.0);
        assert!(matches!(
            r.render("empty", empty.view(), w),
            Err(RenderError::InvalidSlice(_))
        ));
    }
}
