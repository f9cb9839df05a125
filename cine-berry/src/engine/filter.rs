//! 中值滤波与阈值化.

use crate::data::grid::Grid;
use crate::{Mask, SegError, SegResult};
use ndarray::{ArrayD, ArrayViewD};
use ordered_float::OrderedFloat;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 半采样对称延拓 (`d c b a | a b c d | d c b a`): 将越界索引 `i` 映射回 `[0, n)`.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    debug_assert!(n > 0);
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    (if m >= n { period - 1 - m } else { m }) as usize
}

/// 单轴上以 `p` 为中心、边长为 `size` 的窗口经对称延拓后, 落在各索引上的次数.
/// 只保留次数非零的 `(索引, 次数)`.
///
/// 偶数边长时中心偏向窗口的后半部分, 即偏移量取值 `-size/2 ..= size - 1 - size/2`.
/// 延拓以 `2n` 为周期, 每个完整周期恰好覆盖每个索引两次, 因此窗口远大于轴长时也只需 `O(n)`.
fn axis_window(p: usize, n: usize, size: usize) -> Vec<(usize, usize)> {
    let period = 2 * n;
    let mut counts = vec![2 * (size / period); n];
    let lo = p as isize - (size / 2) as isize;
    for o in 0..size % period {
        counts[reflect(lo + o as isize, n)] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .filter(|(_, c)| *c > 0)
        .collect()
}

/// 各轴、各位置上的窗口, 以及窗口内的体素总数 `size^ndim`.
struct WindowTable {
    axes: Vec<Vec<Vec<(usize, usize)>>>,
    total: usize,
}

impl WindowTable {
    /// `size^ndim` 溢出时返回 `Err`.
    fn new(shape: &[usize], size: usize) -> SegResult<Self> {
        let total = u32::try_from(shape.len())
            .ok()
            .and_then(|ndim| size.checked_pow(ndim))
            .ok_or_else(|| {
                SegError::InvalidParameter(format!(
                    "smoothing window {size}^{} overflows",
                    shape.len()
                ))
            })?;
        let axes = shape
            .iter()
            .map(|&n| (0..n).map(|p| axis_window(p, n, size)).collect())
            .collect();
        Ok(Self { axes, total })
    }

    #[inline]
    fn at(&self, axis: usize, p: usize) -> &[(usize, usize)] {
        &self.axes[axis][p]
    }

    /// 单个体素窗口内不同索引组合数的上界.
    fn max_distinct(&self) -> usize {
        self.axes
            .iter()
            .map(|a| a.iter().map(Vec::len).max().unwrap_or(0))
            .product()
    }
}

/// 单个体素中值滤波的工作区, 每个工作线程各持有一份.
struct Scratch {
    pos: Vec<usize>,
    cur: Vec<usize>,
    probe: Vec<usize>,
    buf: Vec<(OrderedFloat<f32>, usize)>,
}

impl Scratch {
    fn new(ndim: usize, distinct: usize) -> Self {
        Self {
            pos: vec![0; ndim],
            cur: vec![0; ndim],
            probe: vec![0; ndim],
            buf: Vec::with_capacity(distinct),
        }
    }
}

/// 计算扁平索引 `flat` 处的邻域中值.
///
/// 取排序后第 `n / 2` 个元素 (`n` 为邻域体素数, 按重数计); 邻域体素数为偶数时即上中位数.
fn median_at(grid: &Grid, src: &[f32], table: &WindowTable, flat: usize, s: &mut Scratch) -> f32 {
    let ndim = grid.ndim();
    grid.unravel(flat, &mut s.pos);
    s.cur.fill(0);
    s.buf.clear();
    'walk: loop {
        let mut weight = 1;
        for axis in 0..ndim {
            let (idx, w) = table.at(axis, s.pos[axis])[s.cur[axis]];
            s.probe[axis] = idx;
            weight *= w;
        }
        s.buf
            .push((OrderedFloat(src[grid.ravel_unchecked(&s.probe)]), weight));
        // 里程表式进位.
        for axis in (0..ndim).rev() {
            s.cur[axis] += 1;
            if s.cur[axis] < table.at(axis, s.pos[axis]).len() {
                continue 'walk;
            }
            s.cur[axis] = 0;
        }
        break;
    }

    s.buf.sort_unstable_by_key(|e| e.0);
    let k = table.total / 2;
    let mut acc = 0;
    for (v, w) in s.buf.iter() {
        acc += w;
        if acc > k {
            return v.0;
        }
    }
    // 总重数恰为 `table.total`, 不会到达这里.
    s.buf.last().map_or(0.0, |e| e.0 .0)
}

/// 以边长为 `size` 的立方邻域对 `data` 做中值滤波. 边界以半采样对称方式延拓.
///
/// `size` 为 0 或 `size^ndim` 溢出时返回 `Err`. 邻域可以比数组本身更大.
/// 开启 `rayon` feature 时逐体素并行计算.
pub fn median_filter(data: ArrayViewD<f32>, size: usize) -> SegResult<ArrayD<f32>> {
    if size == 0 {
        return Err(SegError::InvalidParameter(
            "smoothing size must be positive".to_string(),
        ));
    }
    if size == 1 || data.ndim() == 0 || data.is_empty() {
        return Ok(data.to_owned());
    }

    let grid = Grid::new(data.shape());
    let src: Vec<f32> = data.iter().copied().collect();
    let table = WindowTable::new(grid.shape(), size)?;
    let distinct = table.max_distinct();

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let out: Vec<f32> = (0..grid.len())
                .into_par_iter()
                .map_init(
                    || Scratch::new(grid.ndim(), distinct),
                    |s, flat| median_at(&grid, &src, &table, flat, s),
                )
                .collect();
        } else {
            let mut s = Scratch::new(grid.ndim(), distinct);
            let out: Vec<f32> = (0..grid.len())
                .map(|flat| median_at(&grid, &src, &table, flat, &mut s))
                .collect();
        }
    }
    Ok(grid.to_array(out))
}

/// 阈值化: 强度严格大于 `threshold` 的体素为前景.
#[inline]
pub fn threshold(data: ArrayViewD<f32>, threshold: f32) -> Mask {
    Mask::new(data.mapv(|v| v > threshold))
}
