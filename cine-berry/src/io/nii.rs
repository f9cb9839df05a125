//! NIfTI 图像源.

use super::ImageSource;
use crate::error::LoadError;
use crate::{Modality, SegError, Volume};
use log::debug;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::Path;

/// 读取 `.nii` / `.nii.gz` 文件.
///
/// nifti 的轴序为 `[W, H, Z, T]`, 加载后统一转换为 `(T, Z, H, W)`.
/// 原第一维向右增长, 原第二维向下增长.
#[derive(Debug, Copy, Clone, Default)]
pub struct NiftiSource {
    modality: Modality,
}

impl NiftiSource {
    /// 以 `modality` 标注加载结果.
    #[inline]
    pub fn new(modality: Modality) -> Self {
        Self { modality }
    }
}

impl ImageSource for NiftiSource {
    fn load(&self, path: &Path) -> Result<Volume, LoadError> {
        let obj = ReaderOptions::new().read_file(path)?;
        let pixdim = obj.header().pixdim;

        let data = obj.into_volume().into_ndarray::<f32>()?;
        let ndim = data.ndim();
        if !(2..=4).contains(&ndim) {
            return Err(SegError::InvalidParameter(format!(
                "expected 2-d, 3-d or 4-d nifti volume, found {ndim}-d"
            ))
            .into());
        }

        // [W, H, Z, T] -> [T, Z, H, W].
        let rev: Vec<usize> = (0..ndim).rev().collect();
        let data = data.permuted_axes(rev.as_slice());
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };

        let mut spacing: Vec<f64> = pixdim[1..=ndim].iter().rev().map(|&p| p as f64).collect();
        // 许多文件不记录时间间隔.
        if ndim == 4 && !(spacing[0].is_finite() && spacing[0] > 0.0) {
            debug!("{}: missing time spacing, using 1.0", path.display());
            spacing[0] = 1.0;
        }
        Ok(Volume::new(data, spacing, self.modality)?)
    }
}

/// 以 nifti 轴序 `[W, H, Z, T]` 写出 `data`, 分辨率为 `pixdim[1..]`.
#[cfg(test)]
pub(super) fn write_nifti(path: &Path, data: &ndarray::ArrayD<f32>, pixdim: [f32; 8]) {
    let header = nifti::NiftiHeader {
        pixdim,
        scl_slope: 1.0,
        scl_inter: 0.0,
        ..Default::default()
    };
    nifti::writer::WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(data)
        .unwrap();
}

#[cfg(test)]
mod tests {
    use super::{write_nifti, NiftiSource};
    use crate::io::ImageSource;
    use crate::Modality;
    use ndarray::{ArrayD, IxDyn};

    fn tmp_dir(name: &str) -> std::path::PathBuf {
        let d = std::env::temp_dir().join(format!("cine-berry-nii-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&d).unwrap();
        d
    }

    #[test]
    fn test_load_3d_axis_order() {
        let dir = tmp_dir("3d");
        let path = dir.join("frame.nii");
        // [W, H, Z] = [4, 3, 2], 值编码了体素坐标.
        let data = ArrayD::from_shape_fn(IxDyn(&[4, 3, 2]), |d| {
            (d[0] + 10 * d[1] + 100 * d[2]) as f32
        });
        write_nifti(&path, &data, [1.0, 0.5, 0.75, 2.0, 1.0, 1.0, 1.0, 1.0]);

        let v = NiftiSource::new(Modality::Mri).load(&path).unwrap();
        assert_eq!(v.shape(), &[2, 3, 4]);
        assert_eq!(v.spacing(), &[2.0, 0.75, 0.5]);
        assert_eq!(v.modality(), Modality::Mri);
        assert!(v.data().is_standard_layout());
        assert_eq!(v.data()[IxDyn(&[1, 2, 3])], 123.0);
        assert_eq!(v.data()[IxDyn(&[0, 1, 0])], 10.0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_4d_time_spacing() {
        let dir = tmp_dir("4d");
        let data = ArrayD::from_shape_fn(IxDyn(&[3, 2, 2, 5]), |d| (d[0] + 1000 * d[3]) as f32);

        // 缺失的时间间隔以 1.0 代替.
        let path = dir.join("cine.nii");
        write_nifti(&path, &data, [1.0, 1.5, 1.5, 8.0, 0.0, 1.0, 1.0, 1.0]);
        let v = NiftiSource::default().load(&path).unwrap();
        assert!(v.is_time_series());
        assert_eq!(v.shape(), &[5, 2, 2, 3]);
        assert_eq!(v.spacing(), &[1.0, 8.0, 1.5, 1.5]);
        assert_eq!(v.data()[IxDyn(&[4, 1, 0, 2])], 4002.0);

        let path = dir.join("cine_timed.nii");
        write_nifti(&path, &data, [1.0, 1.5, 1.5, 8.0, 0.04, 1.0, 1.0, 1.0]);
        let v = NiftiSource::default().load(&path).unwrap();
        assert!((v.spacing()[0] - 0.04).abs() < 1e-6);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_invalid_spatial_spacing() {
        let dir = tmp_dir("bad");
        let path = dir.join("frame.nii");
        let data = ArrayD::<f32>::zeros(IxDyn(&[2, 2, 2]));
        write_nifti(&path, &data, [1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(NiftiSource::default().load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
