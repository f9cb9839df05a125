//! 逐帧流水线: Volume -> Mask -> LabelMap -> 分量选取 -> 容积测量.
//!
//! 帧与帧之间相互独立, 开启 `rayon` feature 时在帧维度上并行;
//! 结果总是按帧索引收集, 与完成顺序无关.

use crate::consts::{DEFAULT_CLOSING_ITERATIONS, DEFAULT_SMOOTHING_SIZE, TIME_SERIES_NDIM};
use crate::engine::measure::{
    ejection_fraction, measure_volume, EjectionFraction, MissPolicy, VolumeSeries,
};
use crate::engine::select::{ComponentSelector, Selection};
use crate::engine::{label_components, mask_view};
use crate::{CompactMask, SegError, SegResult, Volume};
use log::{debug, info, warn};
use ndarray::ArrayViewD;

#[cfg(feature = "serde")]
use crate::error::PersistError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::{fs::File, io::BufReader, io::BufWriter, path::Path};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 流水线配置.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// 中值滤波邻域边长.
    pub smoothing_size: usize,

    /// 阈值, 强度严格大于它的体素为前景.
    pub threshold: f32,

    /// 闭运算次数. 0 表示不做闭运算.
    pub closing_iterations: usize,

    /// 分量选取策略.
    pub selection: Selection,

    /// 单帧选取失败时的处理方式.
    pub miss_policy: MissPolicy,

    /// 是否在帧维度上并行. 未开启 `rayon` feature 时忽略.
    pub parallel: bool,

    /// 是否在报告中保留每帧选中分量的压缩掩码.
    pub keep_masks: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            smoothing_size: DEFAULT_SMOOTHING_SIZE,
            threshold: 0.0,
            closing_iterations: DEFAULT_CLOSING_ITERATIONS,
            selection: Selection::default(),
            miss_policy: MissPolicy::default(),
            parallel: true,
            keep_masks: false,
        }
    }
}

impl PipelineConfig {
    /// 以阈值 `threshold` 构建, 其余参数取默认值.
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// 设置中值滤波邻域边长.
    pub fn smoothing_size(mut self, size: usize) -> Self {
        self.smoothing_size = size;
        self
    }

    /// 设置闭运算次数.
    pub fn closing_iterations(mut self, iterations: usize) -> Self {
        self.closing_iterations = iterations;
        self
    }

    /// 设置分量选取策略.
    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// 设置单帧选取失败时的处理方式.
    pub fn miss_policy(mut self, policy: MissPolicy) -> Self {
        self.miss_policy = policy;
        self
    }

    /// 是否并行.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 是否保留掩码.
    pub fn keep_masks(mut self, keep: bool) -> Self {
        self.keep_masks = keep;
        self
    }

    /// 检查配置是否合法.
    pub fn validate(&self) -> SegResult<()> {
        if self.smoothing_size == 0 {
            return Err(SegError::InvalidParameter(
                "smoothing size must be positive".to_string(),
            ));
        }
        if !self.threshold.is_finite() {
            return Err(SegError::InvalidParameter(format!(
                "threshold must be finite, found {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// 单帧处理结果.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// 时间索引.
    pub index: usize,

    /// 闭运算后掩码的前景体素数.
    pub mask_voxels: usize,

    /// 连通分量个数.
    pub components: u32,

    /// 选中的标签值. 选取失败且按 [`MissPolicy::ZeroFill`] 处理时为 `None`.
    pub selected: Option<u32>,

    /// 选中分量的物理容积.
    pub volume: f64,

    /// 选中分量的压缩掩码, 仅在 [`PipelineConfig::keep_masks`] 开启时保留.
    pub mask: Option<CompactMask>,
}

/// 整个时间序列的处理结果.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesReport {
    series: VolumeSeries,
    frames: Vec<FrameReport>,
}

impl SeriesReport {
    /// 容积序列.
    #[inline]
    pub fn series(&self) -> &VolumeSeries {
        &self.series
    }

    /// 按时间顺序排列的单帧结果.
    #[inline]
    pub fn frames(&self) -> &[FrameReport] {
        &self.frames
    }

    /// 见 [`ejection_fraction`].
    #[inline]
    pub fn ejection_fraction(&self) -> SegResult<EjectionFraction> {
        ejection_fraction(self.series.as_slice())
    }

    /// 以 bincode 格式保存到 `path`.
    #[cfg(feature = "serde")]
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let w = BufWriter::new(File::create(path)?);
        bincode::serialize_into(w, self)?;
        Ok(())
    }

    /// 从 `path` 读取 bincode 格式的报告.
    #[cfg(feature = "serde")]
    pub fn load_bincode<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let r = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(r)?)
    }
}

/// 分割与测量流水线. 创建后不可变, 可在多个线程间共享.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// 以 `config` 构建流水线. 配置不合法时返回 `Err`.
    pub fn new(config: PipelineConfig) -> SegResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 当前配置.
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn process(&self, index: usize, frame: ArrayViewD<f32>, voxel: f64) -> SegResult<FrameReport> {
        let cfg = &self.config;
        let mask = mask_view(
            frame,
            cfg.smoothing_size,
            cfg.threshold,
            cfg.closing_iterations,
        )?;
        let map = label_components(&mask);
        if map.is_empty() {
            warn!("frame {index}: mask is all background");
        }
        let selected = cfg
            .miss_policy
            .resolve(index, cfg.selection.select(&map))?;
        let volume = selected.map_or(0.0, |label| measure_volume(&map, label, voxel));
        let compact = match selected {
            Some(label) if cfg.keep_masks => Some(map.component_mask(label).compress()),
            _ => None,
        };
        debug!(
            "frame {index}: {} foreground voxels, {} components, selected {selected:?}, volume {volume:.3}",
            mask.count(),
            map.len(),
        );
        Ok(FrameReport {
            index,
            mask_voxels: mask.count(),
            components: map.len(),
            selected,
            volume,
            mask: compact,
        })
    }

    /// 处理单帧 (2D 或 3D) 体数据. 体素体积取自 [`Volume::voxel`].
    /// 4D 时间序列应使用 [`Pipeline::run_series`].
    pub fn run_frame(&self, frame: &Volume) -> SegResult<FrameReport> {
        if frame.is_time_series() {
            return Err(SegError::InvalidParameter(
                "run_frame expects a single frame, use run_series for time series".to_string(),
            ));
        }
        self.process(0, frame.data(), frame.voxel())
    }

    /// 处理 `(t, z, h, w)` 排布的 4D 时间序列.
    ///
    /// 非 4D 输入在开始任何计算前即返回 `Err`. 任一帧失败时返回该帧的错误;
    /// 并行模式下, 若有多帧失败, 返回其中索引最小者.
    pub fn run_series(&self, volume: &Volume) -> SegResult<SeriesReport> {
        if !volume.is_time_series() {
            return Err(SegError::InvalidParameter(format!(
                "expected a {TIME_SERIES_NDIM}-d time series, found shape {:?}",
                volume.shape()
            )));
        }
        let voxel = volume.voxel();
        let n = volume.len_t();
        info!("running pipeline on {n} frames of shape {:?}", &volume.shape()[1..]);

        let frames = self
            .run_frames(volume, voxel)
            .into_iter()
            .collect::<SegResult<Vec<_>>>()?;
        let series = VolumeSeries::new(frames.iter().map(|f| f.volume).collect());

        match ejection_fraction(series.as_slice()) {
            Ok(ef) => info!(
                "ejection fraction {:.4} (ED frame {}, ES frame {})",
                ef.ratio, ef.diastole_index, ef.systole_index
            ),
            Err(e) => warn!("{e}"),
        }
        Ok(SeriesReport { series, frames })
    }

    fn run_frames(&self, volume: &Volume, voxel: f64) -> Vec<SegResult<FrameReport>> {
        let sequential = || -> Vec<SegResult<FrameReport>> {
            volume
                .frames()
                .enumerate()
                .map(|(t, f)| self.process(t, f, voxel))
                .collect()
        };
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                if !self.config.parallel {
                    return sequential();
                }
                let frames: Vec<_> = volume.frames().collect();
                frames
                    .into_par_iter()
                    .enumerate()
                    .map(|(t, f)| self.process(t, f, voxel))
                    .collect()
            } else {
                sequential()
            }
        }
    }
}
