// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// 可选行政区域
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    /// 显示名称
    pub name: String,
    /// 内部标识
    pub id: String,
}

/// 区域目录
///
/// 从门户的静态文档加载一次，之后不可变。名称在规范化（去除首尾空白、
/// 忽略大小写）后唯一
#[derive(Debug, Clone, Default)]
pub struct AreaCatalog {
    areas: BTreeMap<String, Area>,
}

/// 规范化区域名称，作为目录内的查找键
pub fn normalize_area_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl AreaCatalog {
    /// 从 GeoJSON 风格的文档构建目录
    ///
    /// # 参数
    ///
    /// * `document` - 包含 `features[].properties.name` 的 JSON 文档
    ///
    /// # 返回值
    ///
    /// * `Ok(AreaCatalog)` - 解析成功
    /// * `Err(String)` - 缺少预期结构时的原因
    pub fn from_geojson(document: &Value) -> Result<Self, String> {
        let features = document
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| "missing 'features' array".to_string())?;

        let mut areas = BTreeMap::new();
        for (index, feature) in features.iter().enumerate() {
            let properties = feature
                .get("properties")
                .ok_or_else(|| format!("feature {index} has no 'properties'"))?;
            let name = properties
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| format!("feature {index} has no 'name'"))?;

            let id = ["id", "geocodigo"]
                .iter()
                .find_map(|key| properties.get(*key).and_then(identifier_text))
                .or_else(|| feature.get("id").and_then(identifier_text))
                .unwrap_or_else(|| name.to_string());

            let key = normalize_area_name(name);
            if areas.contains_key(&key) {
                warn!("Duplicate area name '{}' in catalog, keeping first", name);
                continue;
            }
            areas.insert(
                key,
                Area {
                    name: name.to_string(),
                    id,
                },
            );
        }

        if areas.is_empty() {
            return Err("catalog contains no areas".to_string());
        }

        Ok(Self { areas })
    }

    /// 按名称查找区域（忽略大小写和多余空白）
    pub fn get(&self, name: &str) -> Option<&Area> {
        self.areas.get(&normalize_area_name(name))
    }

    /// 按字母顺序返回所有显示名称
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.areas.values().map(|a| a.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
