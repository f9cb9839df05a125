//! 图像源: 由文件或目录路径得到 [`Volume`].
//!
//! 加载失败 (路径不存在, 格式不支持, 解码错误) 立即返回给调用方, 不做重试.

use crate::error::LoadError;
use crate::{Modality, Volume};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};

mod loader;
mod nii;
mod npy;

pub use loader::{CaseLoader, FilenameBuilder};
pub use nii::NiftiSource;
pub use npy::NpySource;

/// 由路径加载体数据的图像源.
pub trait ImageSource {
    /// 加载 `path` 处的体数据.
    fn load(&self, path: &Path) -> Result<Volume, LoadError>;
}

impl<T: ImageSource + ?Sized> ImageSource for &T {
    #[inline]
    fn load(&self, path: &Path) -> Result<Volume, LoadError> {
        (**self).load(path)
    }
}

/// 是否为 nifti 文件名.
fn is_nifti(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".nii") || n.ends_with(".nii.gz"))
}

/// 将目录下所有 nifti 文件 (按文件名排序) 各视为一帧, 聚合为 4D 时间序列.
///
/// 每个文件必须是 3D 体数据, 且形状与分辨率一致. 其余文件被忽略.
#[derive(Debug, Copy, Clone)]
pub struct FrameDirectory {
    modality: Modality,
    time_spacing: f64,
}

impl Default for FrameDirectory {
    fn default() -> Self {
        Self::new(Modality::Unknown, 1.0)
    }
}

impl FrameDirectory {
    /// `time_spacing` 为相邻两帧的时间间隔.
    #[inline]
    pub fn new(modality: Modality, time_spacing: f64) -> Self {
        Self {
            modality,
            time_spacing,
        }
    }

    /// 目录下按文件名排序的所有 nifti 文件.
    pub fn frame_paths(dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in dir.read_dir()? {
            let p = entry?.path();
            if p.is_file() && is_nifti(&p) {
                paths.push(p);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl ImageSource for FrameDirectory {
    fn load(&self, path: &Path) -> Result<Volume, LoadError> {
        let paths = Self::frame_paths(path)?;
        if paths.is_empty() {
            return Err(LoadError::EmptyDirectory(path.to_owned()));
        }
        debug!("{}: stacking {} frames", path.display(), paths.len());

        let src = NiftiSource::new(self.modality);
        let frames = paths
            .iter()
            .map(|p| src.load(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Volume::stack(&frames, self.time_spacing)?)
    }
}

/// 按路径类型自动选择图像源加载体数据.
///
/// 1. 目录: 见 [`FrameDirectory`];
/// 2. `.nii` / `.nii.gz`: 见 [`NiftiSource`];
/// 3. `.npy`: 见 [`NpySource`], 分辨率取 1.0.
///
/// 路径不存在时返回 [`LoadError::Io`], 其余扩展名返回 [`LoadError::UnsupportedFormat`].
pub fn open<P: AsRef<Path>>(path: P, modality: Modality) -> Result<Volume, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )
        .into());
    }
    if path.is_dir() {
        FrameDirectory::new(modality, 1.0).load(path)
    } else if is_nifti(path) {
        NiftiSource::new(modality).load(path)
    } else if path.extension().is_some_and(|e| e == "npy") {
        NpySource::new(None, modality).load(path)
    } else {
        Err(LoadError::UnsupportedFormat(path.to_owned()))
    }
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}
