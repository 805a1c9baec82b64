// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::PortalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 产品类型
///
/// 门户提供的六种固定数据产品，代码与显示名称都不来自网络响应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    /// 正射影像
    Orthoimage,
    /// 数字高程模型（栅格）
    ElevationRaster,
    /// 数字高程模型（点云 XYZI）
    ElevationPoints,
    /// 数字地形模型（栅格）
    TerrainRaster,
    /// 数字地形模型（点云 XYZ）
    TerrainPoints,
    /// 强度-分层设色
    IntensityHypsometry,
}

impl ProductType {
    pub const ALL: [ProductType; 6] = [
        ProductType::Orthoimage,
        ProductType::ElevationRaster,
        ProductType::ElevationPoints,
        ProductType::TerrainRaster,
        ProductType::TerrainPoints,
        ProductType::IntensityHypsometry,
    ];

    /// 服务端使用的类型代码
    pub fn code(&self) -> u8 {
        match self {
            ProductType::Orthoimage => 1,
            ProductType::ElevationRaster => 2,
            ProductType::ElevationPoints => 3,
            ProductType::TerrainRaster => 4,
            ProductType::TerrainPoints => 5,
            ProductType::IntensityHypsometry => 6,
        }
    }

    /// 门户界面上的显示名称
    pub fn label(&self) -> &'static str {
        match self {
            ProductType::Orthoimage => "Ortoimagem",
            ProductType::ElevationRaster => "Modelo Digital de Elevação (RASTER)",
            ProductType::ElevationPoints => "Modelo Digital de Elevação (XYZI)",
            ProductType::TerrainRaster => "Modelo Digital de Terreno (RASTER)",
            ProductType::TerrainPoints => "Modelo Digital de Terreno (XYZ)",
            ProductType::IntensityHypsometry => "Intensidade-Hipsometria",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProductType {
    type Err = PortalError;

    /// 接受类型代码（如 `"2"`）或完整显示名称
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u8>()
            .ok()
            .and_then(Self::from_code)
            .or_else(|| Self::from_label(trimmed))
            .ok_or_else(|| PortalError::InputValidation(format!("unknown product type '{s}'")))
    }
}
