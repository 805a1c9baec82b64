// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;

/// 从一个归档中解出的栅格图层
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLayer {
    /// 来源归档
    pub archive: PathBuf,
    /// 解压后的栅格文件
    pub raster: PathBuf,
    /// 显示名称（去掉扩展名的文件名）
    pub name: String,
}

/// 批量解压的汇总
#[derive(Debug, Default)]
pub struct LoadReport {
    /// 尝试处理的归档数
    pub attempted: usize,
    /// 成功产生的图层
    pub layers: Vec<ExtractedLayer>,
    /// 失败的归档及原因
    pub failures: Vec<(PathBuf, String)>,
}
