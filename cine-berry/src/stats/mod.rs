//! 队列测量值的两样本假设检验.
//!
//! 队列表 [`CohortTable`] 创建后不可变, 总是显式地传给检验, 不存在全局共享的数据表.

use crate::error::StatsError;
use num::ToPrimitive;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 检验结果.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TestOutcome {
    /// 检验统计量.
    pub statistic: f64,

    /// 双侧 p 值.
    pub p_value: f64,

    /// 自由度.
    pub dof: f64,
}

/// 两样本假设检验.
pub trait TwoSampleTest {
    /// 检验 `a` 和 `b` 两组样本.
    fn test(&self, a: &[f64], b: &[f64]) -> Result<TestOutcome, StatsError>;
}

/// 单组样本的描述统计量.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Describe {
    /// 样本数.
    pub count: usize,

    /// 均值.
    pub mean: f64,

    /// 样本标准差 (分母为 `n - 1`). 单个样本时为 0.
    pub std: f64,

    /// 最小值.
    pub min: f64,

    /// 最大值.
    pub max: f64,
}

impl Describe {
    /// 计算描述统计量. 样本为空或含有 NaN / inf 时返回 `Err`.
    pub fn of(samples: &[f64]) -> Result<Self, StatsError> {
        if samples.is_empty() {
            return Err(StatsError::TooFewSamples(0, 1));
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::NonFinite);
        }
        let (mean, var) = mean_var(samples);
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Ok(Self {
            count: samples.len(),
            mean,
            std: var.sqrt(),
            min,
            max,
        })
    }
}

/// 均值与样本方差 (分母 `n - 1`, 单个样本时方差为 0).
fn mean_var(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if samples.len() < 2 {
        return (mean, 0.0);
    }
    let ss: f64 = samples.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, ss / (n - 1.0))
}

/// 自由度为 `dof` 的 Student t 分布的双侧 p 值 `P(|T| >= |t|)`.
pub fn student_t_two_sided(t: f64, dof: f64) -> Result<f64, StatsError> {
    let dist = StudentsT::new(0.0, 1.0, dof).map_err(|_| StatsError::InvalidDof(dof))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// 两样本 t 检验.
///
/// `equal_var` 为 `true` 时为假设方差相等的 Student t 检验 (合并方差),
/// 否则为 Welch t 检验 (Welch-Satterthwaite 自由度).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct TTest {
    /// 是否假设两组方差相等.
    pub equal_var: bool,
}

impl TTest {
    /// Student t 检验.
    pub const STUDENT: TTest = TTest { equal_var: true };

    /// Welch t 检验.
    pub const WELCH: TTest = TTest { equal_var: false };
}

impl TwoSampleTest for TTest {
    fn test(&self, a: &[f64], b: &[f64]) -> Result<TestOutcome, StatsError> {
        for g in [a, b] {
            if g.len() < 2 {
                return Err(StatsError::TooFewSamples(g.len(), 2));
            }
            if g.iter().any(|v| !v.is_finite()) {
                return Err(StatsError::NonFinite);
            }
        }
        let (na, nb) = (a.len() as f64, b.len() as f64);
        let (ma, va) = mean_var(a);
        let (mb, vb) = mean_var(b);
        if va == 0.0 && vb == 0.0 {
            return Err(StatsError::ZeroVariance);
        }

        let (se, dof) = if self.equal_var {
            let dof = na + nb - 2.0;
            let pooled = ((na - 1.0) * va + (nb - 1.0) * vb) / dof;
            ((pooled * (1.0 / na + 1.0 / nb)).sqrt(), dof)
        } else {
            let (qa, qb) = (va / na, vb / nb);
            let dof = (qa + qb).powi(2) / (qa * qa / (na - 1.0) + qb * qb / (nb - 1.0));
            ((qa + qb).sqrt(), dof)
        };
        let statistic = (ma - mb) / se;
        Ok(TestOutcome {
            statistic,
            p_value: student_t_two_sided(statistic, dof)?,
            dof,
        })
    }
}

/// 命名分组的标量测量值表 (例如各组病例的射血分数). 创建后不可变.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortTable {
    groups: BTreeMap<String, Vec<f64>>,
}

impl CohortTable {
    /// 由 `(组名, 测量值)` 序列构建. 同名组的测量值按出现顺序合并.
    ///
    /// 测量值可以是任意能转换为 `f64` 的数值类型; 无法转换的值被记为 NaN,
    /// 并在检验时报错.
    pub fn from_groups<K, V, I, T>(groups: I) -> Self
    where
        K: Into<String>,
        V: IntoIterator<Item = T>,
        I: IntoIterator<Item = (K, V)>,
        T: ToPrimitive,
    {
        let mut map: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (name, values) in groups {
            map.entry(name.into())
                .or_default()
                .extend(values.into_iter().map(|v| v.to_f64().unwrap_or(f64::NAN)));
        }
        Self { groups: map }
    }

    /// 组名为 `name` 的所有测量值.
    pub fn group(&self, name: &str) -> Result<&[f64], StatsError> {
        self.groups
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| StatsError::UnknownGroup(name.to_string()))
    }

    /// 按字典序迭代组名.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// 组数.
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// 是否没有任何组.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 组 `name` 的描述统计量.
    pub fn describe(&self, name: &str) -> Result<Describe, StatsError> {
        Describe::of(self.group(name)?)
    }

    /// 以检验 `test` 比较组 `a` 和组 `b`.
    pub fn compare<T: TwoSampleTest + ?Sized>(
        &self,
        a: &str,
        b: &str,
        test: &T,
    ) -> Result<TestOutcome, StatsError> {
        test.test(self.group(a)?, self.group(b)?)
    }
}
