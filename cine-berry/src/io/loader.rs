//! 迭代器风格的病例加载器.

use super::ImageSource;
use crate::error::LoadError;
use crate::Volume;
use std::io;
use std::path::{Path, PathBuf};

/// 文件名构造器. 接受病例编号, 获得文件名.
pub type FilenameBuilder = fn(u32) -> String;

/// 按编号依次加载病例的迭代器, 并在内部自动转换文件名.
///
/// 单个病例加载失败不会终止迭代; 错误随编号一起返回, 由调用方决定如何处理.
#[derive(Debug)]
pub struct CaseLoader<S> {
    path: PathBuf,
    ids_rev: Vec<u32>,
    builder: FilenameBuilder,
    source: S,
}

impl<S: ImageSource> CaseLoader<S> {
    /// 从指定编号、目录、文件名构造器和图像源创建加载器.
    ///
    /// `path` 必须是目录, 否则返回 `Err`. `ids` 中的每个编号 `id` 应在 `path`
    /// 下有名为 `builder(id)` 的文件, 否则迭代到该编号时返回 `Err`.
    pub fn new<I: IntoIterator<Item = u32>, P: AsRef<Path>>(
        ids: I,
        path: P,
        builder: FilenameBuilder,
        source: S,
    ) -> Result<Self, LoadError> {
        let path = path.as_ref().to_owned();
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", path.display()),
            )
            .into());
        }
        let mut ids_rev: Vec<u32> = ids.into_iter().collect();
        ids_rev.reverse();
        Ok(Self {
            path,
            ids_rev,
            builder,
            source,
        })
    }
}

impl<S: ImageSource> Iterator for CaseLoader<S> {
    type Item = (u32, Result<Volume, LoadError>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids_rev.pop()?;

        self.path.push((self.builder)(id));
        let data = self.source.load(self.path.as_path());
        self.path.pop();

        Some((id, data))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.ids_rev.len(), Some(self.ids_rev.len()))
    }
}

impl<S: ImageSource> ExactSizeIterator for CaseLoader<S> {}

#[cfg(test)]
mod tests {
    use super::CaseLoader;
    use crate::io::NpySource;
    use crate::LoadError;
    use ndarray::{ArrayD, IxDyn};
    use ndarray_npy::write_npy;

    fn case_name(id: u32) -> String {
        format!("case-{id:03}.npy")
    }

    #[test]
    fn test_case_loader() {
        let dir = std::env::temp_dir().join(format!("cine-berry-cases-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for id in [1, 3] {
            let a = ArrayD::<f32>::from_elem(IxDyn(&[2, 2, 2]), id as f32);
            write_npy(dir.join(case_name(id)), &a).unwrap();
        }

        let loader = CaseLoader::new([3, 2, 1], &dir, case_name, NpySource::default()).unwrap();
        assert_eq!(loader.len(), 3);
        let got: Vec<_> = loader.collect();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(got.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert!(got[0].1.as_ref().is_ok_and(|v| v.data()[[0, 0, 0]] == 3.0));
        assert!(got[1].1.is_err());
        assert!(got[2].1.is_ok());
    }

    #[test]
    fn test_case_loader_requires_dir() {
        let r = CaseLoader::new(0..2, "/definitely/not/here", case_name, NpySource::default());
        assert!(matches!(r, Err(LoadError::Io(_))));
    }
}
