//! 🫀欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{CompactMask, IntensityWindow, LabelMap, Mask, Modality, Volume};
pub use crate::{LoadError, SegError, SegResult};

pub use crate::engine::{
    build_volume_series, ejection_fraction, filter_and_mask, label_components, measure_volume,
    select_component, Anchor, ComponentSelector, EjectionFraction, MissPolicy, Pipeline,
    PipelineConfig, Selection, SeriesReport, VolumeSeries,
};

pub use crate::io::{home_dataset_dir_with, open, ImageSource, NiftiSource, NpySource};
pub use crate::render::{PngRenderer, SliceRenderer};
pub use crate::stats::{CohortTable, TTest, TwoSampleTest};
