// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::layer::{ExtractedLayer, LoadReport};
use crate::utils::errors::ExtractError;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// 归档加载器
///
/// 将下载的 zip 归档完整解压到其所在目录，并挑出第一个栅格文件
#[derive(Debug, Clone)]
pub struct ArchiveLoader {
    raster_extensions: Vec<String>,
}

impl Default for ArchiveLoader {
    fn default() -> Self {
        Self::new(vec![".tif".to_string(), ".tiff".to_string()])
    }
}

impl ArchiveLoader {
    /// 创建加载器
    ///
    /// # 参数
    ///
    /// * `raster_extensions` - 识别为栅格的扩展名，比较时忽略大小写
    pub fn new(raster_extensions: Vec<String>) -> Self {
        let raster_extensions = raster_extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.trim().to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self { raster_extensions }
    }

    fn is_raster(&self, entry_name: &str) -> bool {
        let lower = entry_name.to_lowercase();
        self.raster_extensions.iter().any(|ext| lower.ends_with(ext))
    }

    /// 解压单个归档
    ///
    /// # 参数
    ///
    /// * `path` - 归档路径
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(ExtractedLayer))` - 找到栅格
    /// * `Ok(None)` - 归档中没有栅格，这不是错误
    /// * `Err(ExtractError)` - 归档无法读取或解压
    pub fn load_archive(&self, path: &Path) -> Result<Option<ExtractedLayer>, ExtractError> {
        let extract_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
        let mut raster_entry: Option<PathBuf> = None;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let rel_path = entry
                .enclosed_name()
                .map(Path::to_path_buf)
                .ok_or_else(|| ExtractError::UnsafeEntry(entry.name().to_string()))?;

            let out_path = extract_dir.join(&rel_path);
            if entry.is_dir() {
                std::fs::create_dir_all(&out_path)?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out_file = File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out_file)?;

            if raster_entry.is_none() && self.is_raster(&rel_path.to_string_lossy()) {
                raster_entry = Some(rel_path);
            }
        }

        let Some(rel) = raster_entry else {
            debug!("No raster found in {}", path.display());
            return Ok(None);
        };

        let name = rel
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Some(ExtractedLayer {
            archive: path.to_path_buf(),
            raster: extract_dir.join(rel),
            name,
        }))
    }

    /// 依次处理一组归档
    ///
    /// 每个归档相互独立，单个失败只记录日志并跳过
    pub fn load_archives(&self, paths: &[PathBuf]) -> LoadReport {
        let mut report = LoadReport {
            attempted: paths.len(),
            ..LoadReport::default()
        };

        for path in paths {
            match self.load_archive(path) {
                Ok(Some(layer)) => {
                    info!("Extracted layer '{}' from {}", layer.name, path.display());
                    report.layers.push(layer);
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Failed to process {}: {}", path.display(), e);
                    report.failures.push((path.clone(), e.to_string()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
#[path = "archive_loader_test.rs"]
mod tests;
