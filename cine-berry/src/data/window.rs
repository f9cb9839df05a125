use ndarray::ArrayView2;

/// 强度窗口, 包含窗位 (window level) 和窗宽 (window width).
/// 用于将任意强度值映射为 8-bit 灰度值, 供渲染使用.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntensityWindow {
    level: f32,
    width: f32,
}

impl IntensityWindow {
    /// 构建强度窗.
    ///
    /// `level` 必须有限, `width` 必须为有限正数, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<IntensityWindow> {
        if level.is_finite() && width.is_finite() && width > 0.0 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 由强度范围 `[lo, hi]` 构建. 要求 `lo < hi` 且二者有限.
    pub fn from_range(lo: f32, hi: f32) -> Option<IntensityWindow> {
        Self::new((lo + hi) / 2.0, hi - lo)
    }

    /// 以切片中有限强度值的最小值和最大值为范围构建窗口.
    ///
    /// 如果切片没有有限值则返回 `None`. 若所有值相同, 则构建一个以该值为下限,
    /// 宽度为 1 的窗口.
    pub fn fit(slice: ArrayView2<f32>) -> Option<IntensityWindow> {
        let mut it = slice.iter().copied().filter(|v| v.is_finite());
        let first = it.next()?;
        let (lo, hi) = it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if lo < hi {
            Self::from_range(lo, hi)
        } else {
            Self::from_range(lo, lo + 1.0)
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 求在当前窗设置下, 强度值 `v` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        if v <= lb {
            Some(u8::MIN)
        } else if v >= self.upper_bound() {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((v - lb) / self.width()) * 255.0) as u8)
        }
    }
}
