//! 分量选取策略消融实验.
//!
//! 对数据集中每个病例, 分别以不同的分量选取策略运行流水线,
//! 比较各策略的选取失败帧数、射血分数分布和耗时.

mod profile;
mod result;
mod runner;

fn main() {
    utils::init_logger();
    let result = runner::run();
    result.analyze();
}
