//! `.npy` 图像源.

use super::ImageSource;
use crate::error::LoadError;
use crate::{Modality, Volume};
use ndarray::ArrayD;
use ndarray_npy::{read_npy, ReadNpyError};
use std::path::Path;

/// 读取 `.npy` 数组. npy 文件不携带分辨率, 需由调用方给出.
///
/// 支持 `f32` 和 `f64` 元素; 后者被转换为 `f32`.
#[derive(Debug, Clone, Default)]
pub struct NpySource {
    spacing: Option<Vec<f64>>,
    modality: Modality,
}

impl NpySource {
    /// 指定逐轴分辨率. 为 `None` 时每轴取 1.0.
    #[inline]
    pub fn new(spacing: Option<Vec<f64>>, modality: Modality) -> Self {
        Self { spacing, modality }
    }
}

impl ImageSource for NpySource {
    fn load(&self, path: &Path) -> Result<Volume, LoadError> {
        let data: ArrayD<f32> = match read_npy(path) {
            Ok(data) => data,
            Err(ReadNpyError::WrongDescriptor(_)) => {
                let data: ArrayD<f64> = read_npy(path)?;
                data.mapv(|v| v as f32)
            }
            Err(e) => return Err(e.into()),
        };
        let spacing = self
            .spacing
            .clone()
            .unwrap_or_else(|| vec![1.0; data.ndim()]);
        Ok(Volume::new(data, spacing, self.modality)?)
    }
}

#[cfg(test)]
mod tests {
    use super::NpySource;
    use crate::io::ImageSource;
    use crate::{LoadError, Modality};
    use ndarray::{ArrayD, IxDyn};
    use ndarray_npy::write_npy;

    fn tmp(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("cine-berry-{}-{name}.npy", std::process::id()))
    }

    #[test]
    fn test_npy_round_trip() {
        let path = tmp("f32");
        let data = ArrayD::from_shape_fn(IxDyn(&[2, 3, 4]), |d| (d[0] * 12 + d[1] * 4 + d[2]) as f32);
        write_npy(&path, &data).unwrap();

        let v = NpySource::new(Some(vec![2.0, 0.5, 0.5]), Modality::Mri)
            .load(&path)
            .unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(v.data(), data.view());
        assert_eq!(v.spacing(), &[2.0, 0.5, 0.5]);
        assert_eq!(v.voxel(), 0.5);
        assert_eq!(v.modality(), Modality::Mri);
    }

    #[test]
    fn test_npy_f64_and_bad_spacing() {
        let path = tmp("f64");
        let data = ArrayD::<f64>::from_elem(IxDyn(&[3, 3]), 1.5);
        write_npy(&path, &data).unwrap();

        let v = NpySource::default().load(&path).unwrap();
        assert!(v.data().iter().all(|x| *x == 1.5));
        assert_eq!(v.spacing(), &[1.0, 1.0]);

        let bad = NpySource::new(Some(vec![1.0]), Modality::Unknown).load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(bad, Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_npy_missing_file() {
        let r = NpySource::default().load(&tmp("missing"));
        assert!(matches!(r, Err(LoadError::Npy(_))));
    }
}
