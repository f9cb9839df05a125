//! 容积测量, 容积序列与射血分数.

use crate::engine::select::ComponentSelector;
use crate::error::DegenerateReason;
use crate::{LabelMap, SegError, SegResult};
use itertools::{Itertools, MinMaxResult};
use log::warn;
use ordered_float::OrderedFloat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 标签值为 `label` 的体素数乘以单个体素的物理体积 `voxel`.
///
/// 标签不存在时返回 0, 这不是错误: 全背景帧是合法 (虽然临床上没有意义) 的结果.
#[inline]
pub fn measure_volume(map: &LabelMap, label: u32, voxel: f64) -> f64 {
    map.count(label) as f64 * voxel
}

/// 按时间顺序排列的容积测量值, 每帧一个.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeSeries(Vec<f64>);

impl VolumeSeries {
    /// 由测量值构建.
    #[inline]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// 所有测量值.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// 帧数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有任何帧.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按时间顺序迭代测量值.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// 见 [`ejection_fraction`].
    #[inline]
    pub fn ejection_fraction(&self) -> SegResult<EjectionFraction> {
        ejection_fraction(&self.0)
    }
}

impl From<Vec<f64>> for VolumeSeries {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// 单帧选取失败时的处理方式.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum MissPolicy {
    /// 立即返回 [`SegError::SelectionMiss`], 附带帧索引.
    #[default]
    Abort,

    /// 记该帧容积为 0 并输出警告日志, 继续处理后续帧.
    ZeroFill,
}

impl MissPolicy {
    /// 按照策略处理第 `frame` 帧的选取结果. 返回 `Ok(None)` 表示该帧按 0 计.
    pub(crate) fn resolve(self, frame: usize, picked: SegResult<u32>) -> SegResult<Option<u32>> {
        match (picked, self) {
            (Ok(label), _) => Ok(Some(label)),
            (Err(e), Self::Abort) => Err(SegError::SelectionMiss {
                frame,
                source: Box::new(e),
            }),
            (Err(e), Self::ZeroFill) => {
                warn!("frame {frame}: {e}, volume recorded as 0");
                Ok(None)
            }
        }
    }
}

/// 对每一帧标签图分别选取目标分量并测量容积, 按时间顺序组成容积序列.
///
/// 各帧独立标注, 因此标签值在帧间不稳定; 选取规则在每一帧上重新执行.
/// 输出长度总是等于输入帧数 (包括 0 帧和 1 帧).
///
/// # 注意
///
/// 各帧形状必须一致, 否则返回 [`SegError::ShapeMismatch`].
pub fn build_volume_series<S: ComponentSelector + ?Sized>(
    maps: &[LabelMap],
    selector: &S,
    voxel: f64,
    policy: MissPolicy,
) -> SegResult<VolumeSeries> {
    if let Some(first) = maps.first() {
        if let Some(bad) = maps.iter().find(|m| m.shape() != first.shape()) {
            return Err(SegError::ShapeMismatch {
                expected: first.shape().to_vec(),
                found: bad.shape().to_vec(),
            });
        }
    }

    let mut values = Vec::with_capacity(maps.len());
    for (frame, map) in maps.iter().enumerate() {
        let v = match policy.resolve(frame, selector.select(map))? {
            Some(label) => measure_volume(map, label, voxel),
            None => 0.0,
        };
        values.push(v);
    }
    Ok(VolumeSeries(values))
}

/// 射血分数及其对应的两个极值帧.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EjectionFraction {
    /// `(EDV - ESV) / EDV`, 取值 `[0, 1]`.
    pub ratio: f64,

    /// 容积最大帧 (舒张末期) 的时间索引.
    pub diastole_index: usize,

    /// 容积最小帧 (收缩末期) 的时间索引.
    pub systole_index: usize,

    /// 舒张末期容积 (EDV), 即序列最大值.
    pub diastolic_volume: f64,

    /// 收缩末期容积 (ESV), 即序列最小值.
    pub systolic_volume: f64,
}

/// 由容积序列计算射血分数 `(max - min) / max`.
///
/// 最小值取最早出现的一帧, 最大值取最晚出现的一帧.
/// 空序列, 最大值为 0, 或序列中存在负值与 NaN / inf 时返回
/// [`SegError::DegenerateSeries`]; 绝不返回 NaN.
pub fn ejection_fraction(series: &[f64]) -> SegResult<EjectionFraction> {
    let degenerate = |r| Err(SegError::DegenerateSeries(r));
    if let Some(i) = series.iter().position(|v| !v.is_finite()) {
        return degenerate(DegenerateReason::NonFinite(i));
    }
    if let Some(i) = series.iter().position(|v| *v < 0.0) {
        return degenerate(DegenerateReason::Negative(i));
    }

    let (systole_index, diastole_index) =
        match series.iter().map(|v| OrderedFloat(*v)).position_minmax() {
            MinMaxResult::NoElements => return degenerate(DegenerateReason::Empty),
            MinMaxResult::OneElement(i) => (i, i),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
    let edv = series[diastole_index];
    let esv = series[systole_index];
    if edv == 0.0 {
        return degenerate(DegenerateReason::ZeroMaximum);
    }
    Ok(EjectionFraction {
        ratio: (edv - esv) / edv,
        diastole_index,
        systole_index,
        diastolic_volume: edv,
        systolic_volume: esv,
    })
}
