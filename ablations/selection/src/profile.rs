//! 单个策略的运行统计.

use cine_berry::engine::SeriesReport;
use std::time::{Duration, Instant};

/// 单个选取策略在整个数据集上的统计.
#[derive(Clone, Debug, Default)]
pub struct Profile {
    /// 成功处理的病例数.
    cases: u64,

    /// 加载或处理失败的病例数.
    failed: u64,

    /// 处理的总帧数.
    frames: u64,

    /// 选取失败 (按 0 计) 的帧数.
    missed: u64,

    /// 无法计算射血分数的病例数.
    degenerate: u64,

    /// 每个病例的射血分数.
    ejection_fractions: Vec<f64>,

    /// 流水线耗时.
    busy: Duration,
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次失败的病例.
    #[inline]
    pub fn count_failed(&mut self) {
        self.failed += 1;
    }

    /// 记录一个成功处理的病例. `since` 为该病例开始处理的时刻.
    pub fn count_case(&mut self, report: &SeriesReport, since: Instant) {
        self.busy += since.elapsed();
        self.cases += 1;
        self.frames += report.frames().len() as u64;
        self.missed += report.frames().iter().filter(|f| f.selected.is_none()).count() as u64;
        match report.ejection_fraction() {
            Ok(ef) => self.ejection_fractions.push(ef.ratio),
            Err(_) => self.degenerate += 1,
        }
    }

    /// 成功处理的病例数.
    #[inline]
    pub fn get_cases(&self) -> u64 {
        self.cases
    }

    /// 失败的病例数.
    #[inline]
    pub fn get_failed(&self) -> u64 {
        self.failed
    }

    /// 总帧数.
    #[inline]
    pub fn get_frames(&self) -> u64 {
        self.frames
    }

    /// 选取失败的帧数.
    #[inline]
    pub fn get_missed(&self) -> u64 {
        self.missed
    }

    /// 射血分数退化的病例数.
    #[inline]
    pub fn get_degenerate(&self) -> u64 {
        self.degenerate
    }

    /// 所有有效的射血分数.
    #[inline]
    pub fn get_ejection_fractions(&self) -> &[f64] {
        &self.ejection_fractions
    }

    /// 以微秒为单位获得平均每帧耗时.
    #[inline]
    pub fn get_avg_frame_time_us(&self) -> Option<f64> {
        match self.frames {
            0 => None,
            frames => Some(self.busy.as_micros() as f64 / frames as f64),
        }
    }
}
