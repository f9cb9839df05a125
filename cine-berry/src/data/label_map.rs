use super::grid::Grid;
use super::{plane_of, Mask};
use crate::consts::LABEL_BACKGROUND;
use crate::SegResult;
use ndarray::{ArrayD, ArrayView2, ArrayViewD};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 连通分量标签图.
///
/// 与源掩码同形状. `0` 为背景, `1..=K` 分别代表 `K` 个互不相同的连通分量.
/// 标签按各分量第一个体素的行优先顺序分配, 因此对相同输入结果稳定;
/// 但不同帧之间的标签值没有任何对应关系.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawLabelMap"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    data: ArrayD<u32>,
    count: u32,
}

/// 反序列化得到的未经检查的标签图.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RawLabelMap {
    data: ArrayD<u32>,
    count: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLabelMap> for LabelMap {
    type Error = String;

    /// 最大标签值必须等于 `count`.
    fn try_from(raw: RawLabelMap) -> Result<Self, Self::Error> {
        let max = raw.data.iter().copied().max().unwrap_or(LABEL_BACKGROUND);
        if max != raw.count {
            return Err(format!(
                "label map count {} does not match max label {max}",
                raw.count
            ));
        }
        Ok(Self {
            data: raw.data,
            count: raw.count,
        })
    }
}

impl LabelMap {
    /// 由已标注好的数组直接构建. `count` 必须等于最大标签值, 由调用方保证.
    pub(crate) fn from_parts(data: ArrayD<u32>, count: u32) -> Self {
        debug_assert_eq!(data.iter().copied().max().unwrap_or(0), count);
        Self { data, count }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayViewD<'_, u32> {
        self.data.view()
    }

    /// 标签图形状.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 连通分量个数 `K`.
    #[inline]
    pub fn len(&self) -> u32 {
        self.count
    }

    /// 是否不含任何连通分量 (`K == 0`).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// 获取给定位置的标签值. 越界或维数不符时返回 `None`.
    #[inline]
    pub fn get(&self, pos: &[usize]) -> Option<u32> {
        self.data.get(pos).copied()
    }

    /// `label` 是否是一个存在的分量标签 (`1..=K`).
    #[inline]
    pub fn contains(&self, label: u32) -> bool {
        label != LABEL_BACKGROUND && label <= self.count
    }

    /// 值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: u32) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 所有非背景体素个数.
    #[inline]
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|p| **p != LABEL_BACKGROUND).count()
    }

    /// 每个标签的体素个数. 返回值长度为 `K + 1`, 下标 0 为背景.
    pub fn sizes(&self) -> Vec<usize> {
        let mut ans = vec![0usize; self.count as usize + 1];
        for &p in self.data.iter() {
            ans[p as usize] += 1;
        }
        ans
    }

    /// 体素最多的分量标签. 并列时取标签值最小者. 不存在分量时返回 `None`.
    pub fn largest(&self) -> Option<u32> {
        let sizes = self.sizes();
        let mut best: Option<(u32, usize)> = None;
        for (label, &n) in sizes.iter().enumerate().skip(1) {
            if best.map_or(true, |(_, m)| n > m) {
                best = Some((label as u32, n));
            }
        }
        best.map(|(label, _)| label)
    }

    /// 分量 `label` 的轴对齐包围盒, 以 `(起点, 终点)` 表示, 起点包含, 终点不包含.
    /// 分量不存在时返回 `None`.
    pub fn bounding_box(&self, label: u32) -> Option<(Vec<usize>, Vec<usize>)> {
        let ndim = self.data.ndim();
        let mut lo = vec![usize::MAX; ndim];
        let mut hi = vec![0usize; ndim];
        let mut found = false;
        for (pos, _) in self.data.indexed_iter().filter(|(_, p)| **p == label) {
            found = true;
            for axis in 0..ndim {
                lo[axis] = lo[axis].min(pos[axis]);
                hi[axis] = hi[axis].max(pos[axis] + 1);
            }
        }
        found.then_some((lo, hi))
    }

    /// 分量 `label` 的质心 (体素坐标). 分量不存在时返回 `None`.
    pub fn centroid(&self, label: u32) -> Option<Vec<f64>> {
        let ndim = self.data.ndim();
        let mut sum = vec![0.0f64; ndim];
        let mut n = 0u64;
        for (pos, _) in self.data.indexed_iter().filter(|(_, p)| **p == label) {
            n += 1;
            for (axis, s) in sum.iter_mut().enumerate() {
                *s += pos[axis] as f64;
            }
        }
        (n != 0).then(|| sum.into_iter().map(|s| s / n as f64).collect())
    }

    /// 分量 `label` 的掩码.
    pub fn component_mask(&self, label: u32) -> Mask {
        Mask::new(self.data.mapv(|p| p == label))
    }

    /// 所有非背景体素的掩码.
    pub fn foreground_mask(&self) -> Mask {
        Mask::new(self.data.mapv(|p| p != LABEL_BACKGROUND))
    }

    /// 依次固定前导轴的索引, 获取剩余的 2D 平面.
    #[inline]
    pub fn plane_at(&self, leading: &[usize]) -> SegResult<ArrayView2<'_, u32>> {
        plane_of(self.data.view(), leading)
    }

    /// 行优先扁平数据构建, 供标注算法使用.
    pub(crate) fn from_flat(grid: &Grid, flat: Vec<u32>, count: u32) -> Self {
        Self::from_parts(grid.to_array(flat), count)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::label_components;
    use crate::Mask;
    use ndarray::{ArrayD, IxDyn};

    fn two_blocks() -> Mask {
        // 3x3 块与 2x2 块, 没有面邻接.
        let data = ArrayD::from_shape_fn(IxDyn(&[8, 8]), |d| {
            let (h, w) = (d[0], d[1]);
            (1..4).contains(&h) && (1..4).contains(&w) || (5..7).contains(&h) && (5..7).contains(&w)
        });
        Mask::new(data)
    }

    #[test]
    fn test_sizes_and_largest() {
        let map = label_components(&two_blocks());
        assert_eq!(map.len(), 2);
        assert_eq!(map.sizes(), vec![64 - 13, 9, 4]);
        assert_eq!(map.largest(), Some(1));
        assert!(map.contains(2));
        assert!(!map.contains(0));
        assert!(!map.contains(3));
    }

    #[test]
    fn test_bounding_box_and_centroid() {
        let map = label_components(&two_blocks());
        assert_eq!(map.bounding_box(1), Some((vec![1, 1], vec![4, 4])));
        assert_eq!(map.bounding_box(2), Some((vec![5, 5], vec![7, 7])));
        assert_eq!(map.bounding_box(3), None);
        assert_eq!(map.centroid(1), Some(vec![2.0, 2.0]));
        assert_eq!(map.centroid(2), Some(vec![5.5, 5.5]));
        assert_eq!(map.centroid(9), None);
    }

    #[test]
    fn test_component_masks() {
        let mask = two_blocks();
        let map = label_components(&mask);
        assert_eq!(map.component_mask(2).count(), 4);
        assert_eq!(map.foreground_mask(), mask);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_bad_count() {
        use super::{LabelMap, RawLabelMap};

        let map = label_components(&two_blocks());
        let bytes = bincode::serialize(&map).unwrap();
        let back: LabelMap = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, map);

        // 标签值超过分量个数.
        let raw = RawLabelMap {
            data: ArrayD::from_elem(IxDyn(&[2]), 5),
            count: 1,
        };
        let bytes = bincode::serialize(&raw).unwrap();
        assert!(bincode::deserialize::<LabelMap>(&bytes).is_err());
    }
}
