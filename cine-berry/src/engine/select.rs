//! 目标连通分量的选取策略.
//!
//! 锚点选取 (默认取数组几何中心) 假设目标结构总是位于视野中央,
//! 对解剖变异和运动并不鲁棒, 因此将其做成可替换的策略.

use crate::consts::LABEL_BACKGROUND;
use crate::{LabelMap, SegError, SegResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 已知位于目标结构内部的锚点.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Anchor {
    /// 数组几何中心, 即每个轴取 `len / 2`.
    #[default]
    Center,

    /// 指定坐标.
    At(Vec<usize>),
}

impl Anchor {
    /// 将锚点解析为 `shape` 下的具体坐标. 越界或维数不符时返回 `Err`.
    pub fn resolve(&self, shape: &[usize]) -> SegResult<Vec<usize>> {
        let pos = match self {
            Self::Center => shape.iter().map(|n| n / 2).collect(),
            Self::At(pos) => pos.clone(),
        };
        let in_bounds = pos.len() == shape.len() && pos.iter().zip(shape).all(|(p, n)| p < n);
        if in_bounds {
            Ok(pos)
        } else {
            Err(SegError::AnchorOutOfBounds {
                anchor: pos,
                shape: shape.to_vec(),
            })
        }
    }
}

/// 读取标签图在 `anchor` 处的标签值.
///
/// 若该处为背景, 返回 [`SegError::NoComponentAtAnchor`];
/// 若 `anchor` 越界或维数不符, 返回 [`SegError::AnchorOutOfBounds`].
pub fn select_component(map: &LabelMap, anchor: &[usize]) -> SegResult<u32> {
    match map.get(anchor) {
        None => Err(SegError::AnchorOutOfBounds {
            anchor: anchor.to_vec(),
            shape: map.shape().to_vec(),
        }),
        Some(LABEL_BACKGROUND) => Err(SegError::NoComponentAtAnchor {
            anchor: anchor.to_vec(),
        }),
        Some(label) => Ok(label),
    }
}

/// 从一张标签图中选出目标分量的策略.
pub trait ComponentSelector {
    /// 选出目标分量的标签值. 选取失败时返回 `Err`.
    fn select(&self, map: &LabelMap) -> SegResult<u32>;
}

/// 内置的分量选取策略.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// 取覆盖锚点的分量.
    AnchorPoint(Anchor),

    /// 取体素最多的分量. 并列时取标签值最小者.
    LargestComponent,

    /// 直接指定标签值. 由于各帧独立标注, 该策略只适用于单帧或已知标签稳定的场景.
    LabelValue(u32),
}

impl Default for Selection {
    #[inline]
    fn default() -> Self {
        Self::AnchorPoint(Anchor::Center)
    }
}

impl ComponentSelector for Selection {
    fn select(&self, map: &LabelMap) -> SegResult<u32> {
        match self {
            Self::AnchorPoint(anchor) => select_component(map, &anchor.resolve(map.shape())?),
            Self::LargestComponent => map.largest().ok_or(SegError::NoComponents),
            Self::LabelValue(label) if map.contains(*label) => Ok(*label),
            Self::LabelValue(label) => Err(SegError::LabelNotFound(*label)),
        }
    }
}

impl<T: ComponentSelector + ?Sized> ComponentSelector for &T {
    #[inline]
    fn select(&self, map: &LabelMap) -> SegResult<u32> {
        (**self).select(map)
    }
}

#[cfg(test)]
mod tests {
    use super::{select_component, Anchor, ComponentSelector, Selection};
    use crate::engine::label_components;
    use crate::{LabelMap, Mask, SegError};
    use ndarray::{ArrayD, IxDyn};

    /// 中心 3x3 块 (标签 2) 与左上角 4x4 块 (标签 1).
    fn map() -> LabelMap {
        let data = ArrayD::from_shape_fn(IxDyn(&[11, 11]), |d| {
            let (h, w) = (d[0], d[1]);
            (h < 4 && w < 4) || ((4..7).contains(&h) && (5..8).contains(&w))
        });
        label_components(&Mask::new(data))
    }

    #[test]
    fn test_anchor_resolve() {
        assert_eq!(Anchor::Center.resolve(&[5, 5]).unwrap(), vec![2, 2]);
        assert_eq!(Anchor::Center.resolve(&[4, 7, 2]).unwrap(), vec![2, 3, 1]);
        assert!(Anchor::Center.resolve(&[0, 3]).is_err());
        assert!(Anchor::At(vec![5, 0]).resolve(&[5, 5]).is_err());
        assert!(Anchor::At(vec![1]).resolve(&[5, 5]).is_err());
    }

    #[test]
    fn test_select_at_anchor() {
        let m = map();
        assert_eq!(select_component(&m, &[5, 5]), Ok(2));
        assert_eq!(select_component(&m, &[0, 0]), Ok(1));
        assert_eq!(
            select_component(&m, &[10, 10]),
            Err(SegError::NoComponentAtAnchor {
                anchor: vec![10, 10]
            })
        );
        assert!(matches!(
            select_component(&m, &[11, 0]),
            Err(SegError::AnchorOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_strategies() {
        let m = map();
        assert_eq!(Selection::default().select(&m), Ok(2));
        assert_eq!(Selection::LargestComponent.select(&m), Ok(1));
        assert_eq!(Selection::LabelValue(2).select(&m), Ok(2));
        assert_eq!(
            Selection::LabelValue(3).select(&m),
            Err(SegError::LabelNotFound(3))
        );
        assert_eq!(
            Selection::LabelValue(0).select(&m),
            Err(SegError::LabelNotFound(0))
        );
        let at = Selection::AnchorPoint(Anchor::At(vec![1, 1]));
        assert_eq!((&at).select(&m), Ok(1));
    }

    #[test]
    fn test_empty_map() {
        let empty = label_components(&Mask::new(ArrayD::from_elem(IxDyn(&[4, 4]), false)));
        assert_eq!(
            Selection::LargestComponent.select(&empty),
            Err(SegError::NoComponents)
        );
        assert!(matches!(
            Selection::default().select(&empty),
            Err(SegError::NoComponentAtAnchor { .. })
        ));
    }
}
