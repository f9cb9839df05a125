//! 分割与容积序列引擎.
//!
//! 单帧处理是一条严格线性的流水线, 没有分支和重试:
//!
//! 1. [`filter_and_mask`]: 中值滤波, 阈值化, 闭运算;
//! 2. [`label_components`]: 面邻接连通分量标注;
//! 3. [`select_component`] 或任一 [`ComponentSelector`]: 选出目标分量;
//! 4. [`measure_volume`]: 体素数乘以体素体积.
//!
//! 多帧结果由 [`build_volume_series`] 组成容积序列, 再由 [`ejection_fraction`]
//! 求射血分数. [`Pipeline`] 将以上步骤串起来, 并在帧维度上并行.

use crate::consts::DEFAULT_CLOSING_ITERATIONS;
use crate::{Mask, SegResult, Volume};
use ndarray::ArrayViewD;

pub mod filter;
mod label;
pub mod measure;
pub mod morph;
pub mod pipeline;
pub mod select;

pub use filter::{median_filter, threshold};
pub use label::label_components;
pub use measure::{
    build_volume_series, ejection_fraction, measure_volume, EjectionFraction, MissPolicy,
    VolumeSeries,
};
pub use morph::binary_closing;
pub use pipeline::{FrameReport, Pipeline, PipelineConfig, SeriesReport};
pub use select::{select_component, Anchor, ComponentSelector, Selection};

/// 对 `volume` 依次做中值滤波 (邻域边长 `smoothing_size`), 阈值化 (严格大于
/// `threshold`) 和一次闭运算, 得到与 `volume` 同形状的二值掩码.
///
/// 全背景掩码是合法输出. `smoothing_size` 为 0 时返回 `Err`.
pub fn filter_and_mask(volume: &Volume, smoothing_size: usize, threshold: f32) -> SegResult<Mask> {
    mask_view(
        volume.data(),
        smoothing_size,
        threshold,
        DEFAULT_CLOSING_ITERATIONS,
    )
}

/// [`filter_and_mask`] 的视图版本, 可指定闭运算次数.
pub(crate) fn mask_view(
    data: ArrayViewD<f32>,
    smoothing_size: usize,
    threshold: f32,
    closing_iterations: usize,
) -> SegResult<Mask> {
    let smoothed = median_filter(data, smoothing_size)?;
    let mask = self::threshold(smoothed.view(), threshold);
    Ok(binary_closing(&mask, closing_iterations))
}

#[cfg(test)]
mod tests {
    use super::{filter_and_mask, label_components, select_component};
    use crate::Volume;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_filter_and_mask_denoises() {
        // 7x7 中心的 3x3 亮块, 外加一个孤立噪点和块内一个暗点.
        let mut data = ArrayD::from_shape_fn(IxDyn(&[7, 7]), |d| {
            if (2..5).contains(&d[0]) && (2..5).contains(&d[1]) {
                1.0f32
            } else {
                0.0
            }
        });
        data[[0, 6]] = 1.0;
        data[[3, 3]] = 0.0;
        let v = Volume::with_unit_spacing(data);
        let mask = filter_and_mask(&v, 3, 0.5).unwrap();
        assert_eq!(mask.shape(), &[7, 7]);
        assert_eq!(mask.get(&[0, 6]), Some(false));
        assert_eq!(mask.get(&[3, 3]), Some(true));

        let map = label_components(&mask);
        assert_eq!(map.len(), 1);
        assert_eq!(select_component(&map, &[3, 3]), Ok(1));
    }

    #[test]
    fn test_filter_and_mask_all_background() {
        let v = Volume::with_unit_spacing(ArrayD::zeros(IxDyn(&[4, 4, 4])));
        let mask = filter_and_mask(&v, 3, 0.0).unwrap();
        assert!(mask.is_empty());
        assert!(label_components(&mask).is_empty());
        assert!(filter_and_mask(&v, 0, 0.0).is_err());
    }
}
