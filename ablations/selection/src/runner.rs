//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use cine_berry::engine::{Anchor, MissPolicy, Pipeline, PipelineConfig, Selection};
use log::{info, warn};
use std::env;
use std::path::Path;
use std::thread;
use std::time::Instant;
use utils::loader;

/// 未设置 `$CINE_THRESHOLD` 时的阈值. 假设强度已归一化到 `[0, 1]`.
const DEFAULT_THRESHOLD: f32 = 0.5;

fn threshold_from_env() -> f32 {
    env::var("CINE_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_THRESHOLD)
}

/// 以 `selection` 策略处理 `dir` 下的全部病例.
fn run_strategy(dir: &Path, selection: Selection, threshold: f32) -> Profile {
    let config = PipelineConfig::with_threshold(threshold)
        .selection(selection)
        .miss_policy(MissPolicy::ZeroFill);
    let pipeline = Pipeline::new(config).expect("Invalid pipeline config");
    let mut profile = Profile::new();

    for (id, case) in loader::case_loader(dir).expect("Loading dataset error") {
        let volume = match case {
            Ok(v) => v,
            Err(e) => {
                warn!("case {id}: {e}");
                profile.count_failed();
                continue;
            }
        };
        let since = Instant::now();
        match pipeline.run_series(&volume) {
            Ok(report) => profile.count_case(&report, since),
            Err(e) => {
                warn!("case {id}: {e}");
                profile.count_failed();
            }
        }
    }
    profile
}

/// 实际运行.
pub fn run() -> AblationResult {
    let data_dir = loader::data_dir_from_env_or_home();
    assert!(data_dir.is_dir(), "{} is not a directory", data_dir.display());
    let p = data_dir.as_path();

    // 短路判断
    assert!(
        loader::case_loader_from_env_or_home().is_ok_and(|l| l.len() > 0),
        "Loading dataset config error"
    );

    let threshold = threshold_from_env();
    info!("threshold {threshold}, {} cpus", utils::cpus());
    println!("Running ablation studies...");

    let strategies = [
        ("center", Selection::AnchorPoint(Anchor::Center)),
        ("largest", Selection::LargestComponent),
        ("label1", Selection::LabelValue(1)),
    ];
    thread::scope(|s| {
        let handles = strategies
            .clone()
            .map(|(_, sel)| s.spawn(move || run_strategy(p, sel, threshold)));

        AblationResult::from_iter(
            strategies.map(|(name, _)| name).into_iter().zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            ),
        )
    })
}
