//! 运行时错误.
//!
//! 分为三类: 输入畸形 (致命, 立即返回), 选取失败 (锚点落在背景上),
//! 以及退化结果 (空序列、全零序列等). 空掩码、零连通分量本身 **不是** 错误.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 分割 / 测量流水线的运行时错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegError {
    /// 成对数据的形状不一致.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// 期望的形状.
        expected: Vec<usize>,

        /// 实际的形状.
        found: Vec<usize>,
    },

    /// 参数不合法, 附带说明.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// 锚点越界, 或锚点维数与数据维数不符.
    #[error("anchor {anchor:?} is out of bounds for shape {shape:?}")]
    AnchorOutOfBounds {
        /// 锚点坐标.
        anchor: Vec<usize>,

        /// 数据形状.
        shape: Vec<usize>,
    },

    /// 锚点落在背景上, 没有任何连通分量覆盖它.
    #[error("no component at anchor {anchor:?}")]
    NoComponentAtAnchor {
        /// 锚点坐标.
        anchor: Vec<usize>,
    },

    /// 指定的标签值不存在于标签图中.
    #[error("label {0} does not exist in the label map")]
    LabelNotFound(u32),

    /// 标签图中没有任何连通分量.
    #[error("label map has no component")]
    NoComponents,

    /// 第 `frame` 帧选取分量失败.
    #[error("component selection failed at frame {frame}: {source}")]
    SelectionMiss {
        /// 时间索引.
        frame: usize,

        /// 底层选取错误.
        source: Box<SegError>,
    },

    /// 容积序列退化, 无法计算比值.
    #[error("degenerate series: {0}")]
    DegenerateSeries(DegenerateReason),
}

/// 容积序列退化的具体原因.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DegenerateReason {
    /// 序列为空.
    Empty,

    /// 序列最大值为 0, 无法作为分母.
    ZeroMaximum,

    /// 序列中存在 NaN / inf. 参数为所在时间索引.
    NonFinite(usize),

    /// 序列中存在负值. 参数为所在时间索引.
    Negative(usize),
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty series"),
            Self::ZeroMaximum => write!(f, "maximum volume is zero"),
            Self::NonFinite(i) => write!(f, "non-finite value at frame {i}"),
            Self::Negative(i) => write!(f, "negative value at frame {i}"),
        }
    }
}

/// 分割 / 测量运行时结果.
pub type SegResult<T> = Result<T, SegError>;

/// 图像源加载错误.
#[derive(Debug, Error)]
pub enum LoadError {
    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// nifti 文件解析错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// npy 文件解析错误.
    #[error("npy error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// 不支持的文件格式.
    #[error("unsupported format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// 目录中没有可加载的帧.
    #[error("no frame found in directory {}", .0.display())]
    EmptyDirectory(PathBuf),

    /// 文件内容可以解析, 但不构成合法的体数据.
    #[error("malformed volume: {0}")]
    Malformed(#[from] SegError),
}

/// 切片渲染错误.
#[derive(Debug, Error)]
pub enum RenderError {
    /// 图像编码错误.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 切片为空, 或无法推断有效的强度窗口.
    #[error("slice cannot be rendered: {0}")]
    InvalidSlice(&'static str),
}

/// 统计检验错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// 样本太少. 第一个参数代表目前已有的样本数, 第二个参数代表最少需要的样本数.
    #[error("too few samples: {0} < {1}")]
    TooFewSamples(usize, usize),

    /// 两组样本方差均为 0, 检验统计量无定义.
    #[error("both groups have zero variance")]
    ZeroVariance,

    /// 队列表中不存在该组.
    #[error("unknown group `{0}`")]
    UnknownGroup(String),

    /// 样本中存在 NaN / inf.
    #[error("non-finite sample in group")]
    NonFinite,

    /// 自由度无效, 无法构造 t 分布.
    #[error("invalid degrees of freedom: {0}")]
    InvalidDof(f64),
}

/// 报告持久化错误.
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum PersistError {
    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// bincode 编解码错误.
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}
