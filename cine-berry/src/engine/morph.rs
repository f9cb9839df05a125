//! 二值形态学操作. 结构元素为面邻接十字 (2D 为 4-邻域, 3D 为 6-邻域).
//!
//! 膨胀时界外视为背景; 腐蚀时界外视为前景. 闭运算在四周补足背景后进行,
//! 因此既不会削掉贴边的前景, 也不会让前景沿边界扩张, 且结果总是包含原掩码.

use crate::data::grid::Grid;
use crate::Mask;

fn dilate_once(grid: &Grid, src: &[bool]) -> Vec<bool> {
    (0..grid.len())
        .map(|i| {
            let mut hit = src[i];
            if !hit {
                grid.for_each_face_neighbour(i, |n| hit |= src[n]);
            }
            hit
        })
        .collect()
}

fn erode_once(grid: &Grid, src: &[bool]) -> Vec<bool> {
    (0..grid.len())
        .map(|i| {
            let mut keep = src[i];
            if keep {
                grid.for_each_face_neighbour(i, |n| keep &= src[n]);
            }
            keep
        })
        .collect()
}

/// 连续 `iterations` 次二值膨胀.
pub fn binary_dilation(mask: &Mask, iterations: usize) -> Mask {
    let grid = Grid::new(mask.shape());
    let mut cur = mask.to_flat();
    for _ in 0..iterations {
        cur = dilate_once(&grid, &cur);
    }
    Mask::from_flat(&grid, cur)
}

/// 连续 `iterations` 次二值腐蚀.
pub fn binary_erosion(mask: &Mask, iterations: usize) -> Mask {
    let grid = Grid::new(mask.shape());
    let mut cur = mask.to_flat();
    for _ in 0..iterations {
        cur = erode_once(&grid, &cur);
    }
    Mask::from_flat(&grid, cur)
}

/// 在 `grid` 四周各补 `pad` 层背景.
fn pad_flat(grid: &Grid, src: &[bool], pad: usize) -> (Grid, Vec<bool>) {
    let padded_shape: Vec<usize> = grid.shape().iter().map(|n| n + 2 * pad).collect();
    let padded = Grid::new(&padded_shape);
    let mut out = vec![false; padded.len()];
    let mut pos = vec![0usize; grid.ndim()];
    for (i, _) in src.iter().enumerate().filter(|(_, p)| **p) {
        grid.unravel(i, &mut pos);
        pos.iter_mut().for_each(|c| *c += pad);
        out[padded.ravel_unchecked(&pos)] = true;
    }
    (padded, out)
}

/// [`pad_flat`] 的逆操作.
fn crop_flat(grid: &Grid, padded: &Grid, src: &[bool], pad: usize) -> Vec<bool> {
    let mut pos = vec![0usize; grid.ndim()];
    (0..grid.len())
        .map(|i| {
            grid.unravel(i, &mut pos);
            pos.iter_mut().for_each(|c| *c += pad);
            src[padded.ravel_unchecked(&pos)]
        })
        .collect()
}

/// 二值闭运算: 先膨胀 `iterations` 次, 再腐蚀 `iterations` 次.
/// 用于填补前景内部的小空洞, 而不扩张外边界.
pub fn binary_closing(mask: &Mask, iterations: usize) -> Mask {
    let grid = Grid::new(mask.shape());
    if iterations == 0 || grid.ndim() == 0 {
        return mask.clone();
    }
    let (padded, mut cur) = pad_flat(&grid, &mask.to_flat(), iterations);
    for _ in 0..iterations {
        cur = dilate_once(&padded, &cur);
    }
    for _ in 0..iterations {
        cur = erode_once(&padded, &cur);
    }
    Mask::from_flat(&grid, crop_flat(&grid, &padded, &cur, iterations))
}

#[cfg(test)]
mod tests {
    use super::{binary_closing, binary_dilation, binary_erosion};
    use crate::Mask;
    use ndarray::{ArrayD, Dimension, IxDyn};

    fn block(shape: &[usize], lo: usize, hi: usize) -> Mask {
        Mask::new(ArrayD::from_shape_fn(IxDyn(shape), |d| {
            d.slice().iter().all(|c| (lo..hi).contains(c))
        }))
    }

    #[test]
    fn test_dilation_is_cross_shaped() {
        let mut data = ArrayD::from_elem(IxDyn(&[5, 5]), false);
        data[[2, 2]] = true;
        let d = binary_dilation(&Mask::new(data), 1);
        assert_eq!(d.count(), 5);
        assert_eq!(d.get(&[1, 1]), Some(false));
        assert_eq!(d.get(&[1, 2]), Some(true));
    }

    #[test]
    fn test_erosion_shrinks_block() {
        let m = block(&[7, 7], 1, 6);
        let e = binary_erosion(&m, 1);
        assert_eq!(e, block(&[7, 7], 2, 5));
        assert!(binary_erosion(&m, 3).is_empty());
    }

    #[test]
    fn test_closing_fills_hole() {
        let mut m = block(&[7, 7, 7], 1, 6).into_raw();
        m[[3, 3, 3]] = false;
        let closed = binary_closing(&Mask::new(m), 1);
        assert_eq!(closed, block(&[7, 7, 7], 1, 6));
    }

    #[test]
    fn test_closing_keeps_border_object() {
        // 贴边的前景不会被闭运算削去.
        let m = block(&[6, 6], 0, 3);
        assert_eq!(binary_closing(&m, 2), m);
    }

    #[test]
    fn test_closing_does_not_grow_along_border() {
        let m = block(&[7, 7], 1, 6);
        assert_eq!(binary_closing(&m, 1), m);
        assert_eq!(binary_closing(&m, 3), m);
    }

    #[test]
    fn test_closing_of_empty_is_empty() {
        let m = Mask::new(ArrayD::from_elem(IxDyn(&[4, 4, 4]), false));
        assert!(binary_closing(&m, 1).is_empty());
    }
}
