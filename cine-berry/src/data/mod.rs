use ndarray::{ArrayD, ArrayView2, ArrayViewD, Axis, Ix2};

use crate::consts::{TIME_AXIS, TIME_SERIES_NDIM};
use crate::{SegError, SegResult};

pub(crate) mod grid;
pub mod label_map;
pub mod mask;
pub mod window;

pub use label_map::LabelMap;
pub use mask::{CompactMask, Mask};
pub use window::IntensityWindow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 成像模态.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Modality {
    /// 计算机断层扫描.
    Ct,

    /// 磁共振成像.
    Mri,

    /// 未知来源.
    #[default]
    Unknown,
}

/// 灰度体数据: 2D 切片, 3D 体, 或 `(t, z, h, w)` 排布的 4D 时间序列.
///
/// 同时携带每个轴的采样分辨率 (相邻两个体素沿该轴的物理距离) 和成像模态.
/// 创建后不可变; 所有变换都返回新的数据而不是原地修改.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Volume {
    data: ArrayD<f32>,
    spacing: Vec<f64>,
    modality: Modality,
}

/// 检查分辨率是否合法: 个数与维数一致, 且每个值都是有限正数.
fn check_spacing(shape: &[usize], spacing: &[f64]) -> SegResult<()> {
    if spacing.len() != shape.len() {
        return Err(SegError::InvalidParameter(format!(
            "{} spacing values given for a {}-d array",
            spacing.len(),
            shape.len()
        )));
    }
    if let Some(bad) = spacing.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
        return Err(SegError::InvalidParameter(format!(
            "spacing must be finite and positive, found {bad}"
        )));
    }
    Ok(())
}

impl Volume {
    /// 由裸数组、逐轴分辨率和模态创建体数据.
    ///
    /// 若 `spacing` 个数与维数不符, 或存在非正 / 非有限分辨率, 则返回 `Err`.
    pub fn new(data: ArrayD<f32>, spacing: Vec<f64>, modality: Modality) -> SegResult<Self> {
        check_spacing(data.shape(), &spacing)?;
        Ok(Self {
            data,
            spacing,
            modality,
        })
    }

    /// 以单位分辨率 (每轴 1.0) 创建体数据. 主要用于实验和测试.
    pub fn with_unit_spacing(data: ArrayD<f32>) -> Self {
        let spacing = vec![1.0; data.ndim()];
        Self {
            data,
            spacing,
            modality: Modality::Unknown,
        }
    }

    /// 将若干形状、分辨率、模态都相同的 3D 帧沿新的时间轴堆叠为 4D 体数据.
    ///
    /// `time_spacing` 为相邻两帧的时间间隔. 任一帧形状或分辨率不一致时返回
    /// [`SegError::ShapeMismatch`] / [`SegError::InvalidParameter`];
    /// `frames` 为空时同样返回 `Err`.
    pub fn stack(frames: &[Volume], time_spacing: f64) -> SegResult<Self> {
        let Some(first) = frames.first() else {
            return Err(SegError::InvalidParameter("no frame to stack".to_string()));
        };
        if first.ndim() != TIME_SERIES_NDIM - 1 {
            return Err(SegError::InvalidParameter(format!(
                "only 3-d frames can be stacked, found {}-d",
                first.ndim()
            )));
        }
        for f in frames.iter().skip(1) {
            if f.shape() != first.shape() {
                return Err(SegError::ShapeMismatch {
                    expected: first.shape().to_vec(),
                    found: f.shape().to_vec(),
                });
            }
            if f.spacing != first.spacing {
                return Err(SegError::InvalidParameter(format!(
                    "frame spacing {:?} differs from {:?}",
                    f.spacing, first.spacing
                )));
            }
        }

        let views: Vec<ArrayViewD<f32>> = frames.iter().map(|f| f.data.view()).collect();
        // 形状已检查一致, 该操作不会生成 `Err`.
        let data = ndarray::stack(Axis(TIME_AXIS), &views).map_err(|_| SegError::ShapeMismatch {
            expected: first.shape().to_vec(),
            found: vec![],
        })?;

        let mut spacing = Vec::with_capacity(TIME_SERIES_NDIM);
        spacing.push(time_spacing);
        spacing.extend_from_slice(&first.spacing);
        Self::new(data, spacing, first.modality)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    /// 消费自我, 获得底层数组.
    #[inline]
    pub fn into_raw(self) -> ArrayD<f32> {
        self.data
    }

    /// 数据形状.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 维数.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 逐轴分辨率, 与 [`Self::shape`] 一一对应.
    #[inline]
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// 成像模态.
    #[inline]
    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// 是否为 4D 时间序列.
    #[inline]
    pub fn is_time_series(&self) -> bool {
        self.ndim() == TIME_SERIES_NDIM
    }

    /// 空间轴的分辨率. 对于 4D 时间序列, 时间轴被排除在外.
    #[inline]
    pub fn spatial_spacing(&self) -> &[f64] {
        if self.is_time_series() {
            &self.spacing[TIME_AXIS + 1..]
        } else {
            &self.spacing
        }
    }

    /// 单个体素的物理体积 (2D 时为面积), 即各空间轴分辨率之积.
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.spatial_spacing().iter().product()
    }

    /// 时间帧个数. 非时间序列视为单帧.
    #[inline]
    pub fn len_t(&self) -> usize {
        if self.is_time_series() {
            self.data.len_of(Axis(TIME_AXIS))
        } else {
            1
        }
    }

    /// 获取第 `t` 帧的 3D 视图. 非时间序列或越界时返回 `None`.
    pub fn frame_view(&self, t: usize) -> Option<ArrayViewD<'_, f32>> {
        (self.is_time_series() && t < self.len_t())
            .then(|| self.data.index_axis(Axis(TIME_AXIS), t))
    }

    /// 获取第 `t` 帧, 作为一个拥有所有权的 3D 体数据.
    pub fn frame_at(&self, t: usize) -> Option<Volume> {
        let data = self.frame_view(t)?.to_owned();
        Some(Self {
            data,
            spacing: self.spatial_spacing().to_vec(),
            modality: self.modality,
        })
    }

    /// 获取能按时间升序迭代所有 3D 帧视图的迭代器. 非时间序列时迭代器为空.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = ArrayViewD<'_, f32>> {
        let n = if self.is_time_series() { self.len_t() } else { 0 };
        (0..n).map(move |t| self.data.index_axis(Axis(TIME_AXIS), t))
    }

    /// 依次固定前导轴的索引, 获取剩余的 2D 平面. 例如对 4D 数据,
    /// `plane_at(&[t, z])` 返回第 `t` 帧第 `z` 层切片.
    ///
    /// `leading` 的长度必须为 `ndim - 2`, 否则或越界时返回 `Err`.
    pub fn plane_at(&self, leading: &[usize]) -> SegResult<ArrayView2<'_, f32>> {
        plane_of(self.data.view(), leading)
    }
}

/// 依次固定 `view` 前导轴的索引, 获取剩余的 2D 平面.
pub(crate) fn plane_of<'a, T>(
    view: ArrayViewD<'a, T>,
    leading: &[usize],
) -> SegResult<ArrayView2<'a, T>> {
    let oob = || SegError::AnchorOutOfBounds {
        anchor: leading.to_vec(),
        shape: view.shape().to_vec(),
    };
    if view.ndim() != leading.len() + 2 {
        return Err(oob());
    }
    if leading.iter().zip(view.shape()).any(|(i, n)| i >= n) {
        return Err(oob());
    }
    let mut plane = view.clone();
    for &i in leading {
        plane = plane.index_axis_move(Axis(0), i);
    }
    plane.into_dimensionality::<Ix2>().map_err(|_| oob())
}

#[cfg(test)]
mod tests {
    use super::{Modality, Volume};
    use crate::SegError;
    use ndarray::{ArrayD, IxDyn};

    fn frame(val: f32) -> Volume {
        let data = ArrayD::from_elem(IxDyn(&[2, 3, 4]), val);
        Volume::new(data, vec![2.0, 1.5, 1.5], Modality::Mri).unwrap()
    }

    #[test]
    fn test_volume_invalid_spacing() {
        let data = ArrayD::<f32>::zeros(IxDyn(&[2, 2]));
        assert!(Volume::new(data.clone(), vec![1.0], Modality::Ct).is_err());
        assert!(Volume::new(data.clone(), vec![1.0, 0.0], Modality::Ct).is_err());
        assert!(Volume::new(data.clone(), vec![1.0, f64::NAN], Modality::Ct).is_err());
        assert!(Volume::new(data, vec![1.0, 0.5], Modality::Ct).is_ok());
    }

    #[test]
    fn test_stack_frames() {
        let frames: Vec<Volume> = (0..5).map(|t| frame(t as f32)).collect();
        let v = Volume::stack(&frames, 0.04).unwrap();
        assert!(v.is_time_series());
        assert_eq!(v.shape(), &[5, 2, 3, 4]);
        assert_eq!(v.len_t(), 5);
        assert_eq!(v.spacing(), &[0.04, 2.0, 1.5, 1.5]);
        assert_eq!(v.spatial_spacing(), &[2.0, 1.5, 1.5]);
        assert!((v.voxel() - 4.5).abs() < 1e-12);
        assert_eq!(v.modality(), Modality::Mri);

        for (t, f) in v.frames().enumerate() {
            assert!(f.iter().all(|p| *p == t as f32));
        }
        let f3 = v.frame_at(3).unwrap();
        assert_eq!(f3.shape(), &[2, 3, 4]);
        assert_eq!(f3.spacing(), &[2.0, 1.5, 1.5]);
        assert!(v.frame_at(5).is_none());
    }

    #[test]
    fn test_stack_shape_mismatch() {
        let other = Volume::new(
            ArrayD::zeros(IxDyn(&[2, 3, 5])),
            vec![2.0, 1.5, 1.5],
            Modality::Mri,
        )
        .unwrap();
        let err = Volume::stack(&[frame(0.0), other], 1.0).unwrap_err();
        assert!(matches!(err, SegError::ShapeMismatch { .. }));
        assert!(Volume::stack(&[], 1.0).is_err());
    }

    #[test]
    fn test_plane_at() {
        let frames: Vec<Volume> = (0..3).map(|t| frame(t as f32)).collect();
        let v = Volume::stack(&frames, 1.0).unwrap();
        let p = v.plane_at(&[2, 1]).unwrap();
        assert_eq!(p.shape(), &[3, 4]);
        assert!(p.iter().all(|x| *x == 2.0));
        assert!(v.plane_at(&[3, 0]).is_err());
        assert!(v.plane_at(&[0]).is_err());
    }
}
