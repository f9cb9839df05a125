//! 行优先扁平索引与 n 维坐标之间的换算, 以及面邻接 (6-邻域的 n 维推广) 遍历.
//!
//! 所有逐体素算法都在扁平索引上工作, 避免为每个邻居分配坐标向量.

use ndarray::{ArrayD, IxDyn};

/// n 维行优先网格.
#[derive(Debug, Clone)]
pub(crate) struct Grid {
    shape: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
}

impl Grid {
    /// 由形状构建网格.
    pub fn new(shape: &[usize]) -> Self {
        let mut strides = vec![1usize; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Self {
            shape: shape.to_vec(),
            strides,
            len: shape.iter().product(),
        }
    }

    /// 体素总个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// 维数.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// 扁平索引 `flat` 在第 `axis` 轴上的坐标.
    #[inline]
    pub fn coord(&self, flat: usize, axis: usize) -> usize {
        (flat / self.strides[axis]) % self.shape[axis]
    }

    /// 扁平索引 -> n 维坐标, 写入 `out`.
    pub fn unravel(&self, flat: usize, out: &mut [usize]) {
        debug_assert_eq!(out.len(), self.ndim());
        for (axis, o) in out.iter_mut().enumerate() {
            *o = self.coord(flat, axis);
        }
    }

    /// 坐标已保证合法时的 n 维坐标 -> 扁平索引.
    #[inline]
    pub fn ravel_unchecked(&self, pos: &[usize]) -> usize {
        pos.iter().zip(self.strides.iter()).map(|(p, s)| p * s).sum()
    }

    /// 对 `flat` 的每一个面邻居 (各轴 ±1, 不含对角) 调用 `f`. 越界邻居被跳过.
    #[inline]
    pub fn for_each_face_neighbour(&self, flat: usize, mut f: impl FnMut(usize)) {
        for axis in 0..self.ndim() {
            let c = self.coord(flat, axis);
            let s = self.strides[axis];
            if c > 0 {
                f(flat - s);
            }
            if c + 1 < self.shape[axis] {
                f(flat + s);
            }
        }
    }

    /// 以行优先数据构建数组. `data` 的长度由调用方保证等于 `self.len()`.
    pub fn to_array<T>(&self, data: Vec<T>) -> ArrayD<T> {
        debug_assert_eq!(data.len(), self.len);
        // 长度由构造保证一致, 该操作不会生成 `Err`, 可直接 unwrap.
        ArrayD::from_shape_vec(IxDyn(&self.shape), data).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::Grid;

    #[test]
    fn test_ravel_unravel() {
        let g = Grid::new(&[2, 3, 4]);
        assert_eq!(g.len(), 24);
        let mut buf = [0usize; 3];
        for flat in 0..g.len() {
            g.unravel(flat, &mut buf);
            assert_eq!(g.ravel_unchecked(&buf), flat);
        }
        assert_eq!(g.ravel_unchecked(&[1, 2, 3]), 23);
        assert_eq!(g.coord(17, 1), 1);
    }

    #[test]
    fn test_face_neighbours() {
        let g = Grid::new(&[3, 3]);
        let collect = |flat| {
            let mut v = vec![];
            g.for_each_face_neighbour(flat, |n| v.push(n));
            v.sort_unstable();
            v
        };
        // 中心有 4 个邻居, 角落只有 2 个.
        assert_eq!(collect(4), vec![1, 3, 5, 7]);
        assert_eq!(collect(0), vec![1, 3]);
        assert_eq!(collect(8), vec![5, 7]);

        let g3 = Grid::new(&[3, 3, 3]);
        let mut cnt = 0;
        g3.for_each_face_neighbour(13, |_| cnt += 1);
        assert_eq!(cnt, 6);
    }

    #[test]
    fn test_empty_grid() {
        let g = Grid::new(&[0, 5]);
        assert_eq!(g.len(), 0);
    }
}
