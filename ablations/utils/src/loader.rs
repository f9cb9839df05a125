//! 对 `cine-berry::io` 的更一层封装. 提供更直接的数据集加载器.
//!
//! 数据集目录下每个病例是一个 4D nifti 文件, 文件名形如 `case_007.nii.gz`.

use cine_berry::io::{self, CaseLoader, NiftiSource};
use cine_berry::{LoadError, Modality};
use std::env;
use std::path::{Path, PathBuf};

const CASE_PREFIX: &str = "case_";
const CASE_SUFFIX: &str = ".nii.gz";

/// 获取 cine 数据集基本路径.
///
/// 1. 若环境变量 `$CINE_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cine`.
pub fn data_dir_from_env_or_home() -> PathBuf {
    match env::var("CINE_DATA_DIR") {
        Ok(d) if !d.is_empty() => PathBuf::from(d),
        _ => io::home_dataset_dir_with(["cine"]).expect("Home directory not found"),
    }
}

/// 由病例编号获得文件名.
pub fn case_filename(id: u32) -> String {
    format!("{CASE_PREFIX}{id:03}{CASE_SUFFIX}")
}

/// 由文件名解析病例编号. 不符合命名规则时返回 `None`.
pub fn parse_case_id(name: &str) -> Option<u32> {
    name.strip_prefix(CASE_PREFIX)?
        .strip_suffix(CASE_SUFFIX)?
        .parse()
        .ok()
}

/// 列出 `dir` 下所有病例编号, 升序排列.
pub fn case_ids<P: AsRef<Path>>(dir: P) -> std::io::Result<Vec<u32>> {
    let mut ids = Vec::new();
    for entry in dir.as_ref().read_dir()? {
        if let Some(id) = entry?.file_name().to_str().and_then(parse_case_id) {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// 获取 `dir` 下全部病例的加载器.
pub fn case_loader<P: AsRef<Path>>(dir: P) -> Result<CaseLoader<NiftiSource>, LoadError> {
    let ids = case_ids(dir.as_ref())?;
    CaseLoader::new(ids, dir, case_filename, NiftiSource::new(Modality::Mri))
}

/// 从 `$CINE_DATA_DIR` 或者 `$HOME/dataset/cine` 下加载全部病例.
#[inline]
pub fn case_loader_from_env_or_home() -> Result<CaseLoader<NiftiSource>, LoadError> {
    case_loader(data_dir_from_env_or_home())
}

#[cfg(test)]
mod tests {
    use super::{case_filename, parse_case_id};

    #[test]
    fn test_case_name() {
        assert_eq!(case_filename(7), "case_007.nii.gz");
        assert_eq!(case_filename(1234), "case_1234.nii.gz");
        assert_eq!(parse_case_id("case_007.nii.gz"), Some(7));
        assert_eq!(parse_case_id("case_x.nii.gz"), None);
        assert_eq!(parse_case_id("case_007.nii"), None);
        assert_eq!(parse_case_id("readme.md"), None);
    }
}
