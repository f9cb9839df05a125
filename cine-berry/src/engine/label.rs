//! 连通分量标注.

use crate::data::grid::Grid;
use crate::{LabelMap, Mask};
use std::collections::VecDeque;

/// 按照面邻接规则 (2D 为 4-邻接, 3D 为 6-邻接) 标注 `mask` 中的所有连通分量.
///
/// 两个体素 `p1` 和 `p2` 属于同一个分量, 当且仅当存在一条从 `p1` 到 `p2`
/// 的面邻接路径, 且路径上的所有体素都是前景. 标签按分量中第一个体素的行优先顺序
/// 从 1 开始分配. 全背景掩码得到 `K == 0` 的标签图, 这不是错误.
pub fn label_components(mask: &Mask) -> LabelMap {
    let grid = Grid::new(mask.shape());
    let src = mask.to_flat();
    let mut labels = vec![0u32; grid.len()];
    let mut bfs_q = VecDeque::with_capacity(64);
    let mut count = 0u32;

    for seed in 0..grid.len() {
        if !src[seed] || labels[seed] != 0 {
            continue;
        }
        count += 1;
        labels[seed] = count;
        bfs_q.push_back(seed);

        // bfs
        while let Some(cur) = bfs_q.pop_front() {
            grid.for_each_face_neighbour(cur, |n| {
                if src[n] && labels[n] == 0 {
                    labels[n] = count;
                    bfs_q.push_back(n);
                }
            });
        }
    }
    LabelMap::from_flat(&grid, labels, count)
}
