//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;
}

/// 标签图中背景的标签值.
pub const LABEL_BACKGROUND: u32 = 0;

/// 4D 时间序列体数据中时间轴的位置. 数据统一按 `(t, z, h, w)` 访问.
pub const TIME_AXIS: usize = 0;

/// 4D 时间序列体数据的维数.
pub const TIME_SERIES_NDIM: usize = 4;

/// 默认中值滤波邻域边长.
pub const DEFAULT_SMOOTHING_SIZE: usize = 3;

/// 默认闭运算迭代次数.
pub const DEFAULT_CLOSING_ITERATIONS: usize = 1;
