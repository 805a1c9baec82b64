// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::area::AreaCatalog;
use crate::portal::session::{PortalSession, CATALOG_PATH};
use crate::utils::errors::{PortalError, Stage};
use serde_json::Value;
use tracing::{debug, info};

/// 获取区域目录
///
/// 不需要认证。网络错误、非 2xx 状态或缺少预期结构都视为目录不可用，
/// 调用方在成功前应禁用区域选择，并可重新调用重试
///
/// # 参数
///
/// * `session` - 门户会话
///
/// # 返回值
///
/// * `Ok(AreaCatalog)` - 区域目录
/// * `Err(PortalError)` - 目录不可用
pub async fn fetch_areas(session: &PortalSession) -> Result<AreaCatalog, PortalError> {
    let url = session.endpoint(CATALOG_PATH);
    debug!("Fetching area catalog from {}", url);

    let response = session
        .client()
        .get(url)
        .timeout(session.timeouts().catalog())
        .send()
        .await
        .map_err(|e| PortalError::connection(Stage::Catalog, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PortalError::service(
            Stage::Catalog,
            format!("unexpected status {status}"),
        ));
    }

    let document: Value = response
        .json()
        .await
        .map_err(|e| PortalError::service(Stage::Catalog, format!("malformed catalog: {e}")))?;

    let catalog = AreaCatalog::from_geojson(&document)
        .map_err(|reason| PortalError::service(Stage::Catalog, reason))?;

    info!("Loaded {} areas", catalog.len());
    Ok(catalog)
}
