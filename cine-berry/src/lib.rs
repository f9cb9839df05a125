#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对 3D+时间 的心脏电影 (cine) 影像逐帧分割目标结构,
//! 测量其容积随时间的变化, 并由容积极值计算射血分数.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 4D 体数据统一按 `(t, z, h, w)` 组织. nifti 文件在加载时自动转换轴序.
//! 2. 各帧的连通分量独立标注, 因此同一结构在不同帧上的标签值 **不保证** 相同.
//!   分量选取规则需要在每一帧上重新执行.
//! 3. 空掩码、零连通分量属于合法但平凡的结果, 不是错误;
//!   只有在计算射血分数时, 空序列或全零序列才会以错误的形式返回.
//!
//! # 开发计划
//!
//! ### 中值滤波, 阈值化, 闭运算 ✅
//!
//! 任意维数, 半采样对称边界. 开启 `rayon` feature 时逐体素并行.
//!
//! 实现位于 `cine-berry/src/engine/filter.rs` 和 `cine-berry/src/engine/morph.rs`.
//!
//! ### 面邻接连通分量标注 ✅
//!
//! 2D 为 4-邻接, 3D 为 6-邻接.
//!
//! 实现位于 `cine-berry/src/engine/label.rs`.
//!
//! ### 可替换的分量选取策略 ✅
//!
//! 锚点 (默认为几何中心), 最大分量, 指定标签值.
//!
//! 实现位于 `cine-berry/src/engine/select.rs`.
//!
//! ### 容积序列与射血分数 ✅
//!
//! 实现位于 `cine-berry/src/engine/measure.rs`.
//!
//! ### 帧级并行流水线 ✅
//!
//! 结果按帧索引收集, 与完成顺序无关. 报告可用 bincode 持久化.
//!
//! 实现位于 `cine-berry/src/engine/pipeline.rs`.
//!
//! ### 图像源 ✅
//!
//! nifti, npy, 以及 "一个目录一个时间序列" 的帧目录.
//!
//! 实现位于 `cine-berry/src/io`.
//!
//! ### 切片渲染 ✅
//!
//! 实现位于 `cine-berry/src/render`.
//!
//! ### 队列两样本 t 检验 ✅
//!
//! Student / Welch, t 分布由 `statrs` 提供.
//!
//! 实现位于 `cine-berry/src/stats`.

mod data;

pub use data::{CompactMask, IntensityWindow, LabelMap, Mask, Modality, Volume};

pub mod consts;

mod error;

pub use error::{DegenerateReason, LoadError, RenderError, SegError, SegResult, StatsError};

#[cfg(feature = "serde")]
pub use error::PersistError;

pub mod engine;
pub mod io;
pub mod prelude;
pub mod render;
pub mod stats;
