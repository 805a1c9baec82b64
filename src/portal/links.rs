// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::ProductType;
use crate::portal::session::{PortalSession, DOWNLOAD_PATH};
use crate::utils::errors::{PortalError, Stage};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tracing::{debug, info, warn};

/// 从链接解析响应中提取文件地址
///
/// 作为独立接口，以便在不影响调用方的情况下替换为真正的HTML解析器
pub trait LinkExtractor: Send + Sync {
    /// 按文档顺序返回找到的地址
    fn extract(&self, html: &str) -> Vec<String>;
}

/// 基于 `src='` 标记的宽松扫描
///
/// 服务端输出的HTML并不规范，因此不构建DOM：找到每个标记后取其后
/// 单引号内的值，周围的标记是否合法无关紧要。没有闭合引号的值被丢弃
#[derive(Debug, Default, Clone, Copy)]
pub struct SrcMarkerExtractor;

impl SrcMarkerExtractor {
    const MARKER: &'static str = "src='";
}

impl LinkExtractor for SrcMarkerExtractor {
    fn extract(&self, html: &str) -> Vec<String> {
        html.split(Self::MARKER)
            .skip(1)
            .filter_map(|rest| rest.find('\'').map(|end| rest[..end].trim()))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// 构建链接解析的表单正文
///
/// 区域名称按表单规则转义（空格为 `+`），`id[]` 字段重复两次，第二个为空
pub fn resolve_form_body(area_name: &str, product: ProductType) -> String {
    let code = product.code().to_string();
    let fields = [
        ("tipo", code.as_str()),
        ("id[]", area_name),
        ("id[]", ""),
        ("mun_quad", "muni"),
        ("timeout", "5000"),
    ];
    // Serializing a slice of string pairs cannot fail.
    serde_urlencoded::to_string(fields).unwrap_or_default()
}

/// 解析指定区域和产品类型的下载地址
///
/// # 参数
///
/// * `session` - 已登录的门户会话
/// * `area_name` - 区域显示名称
/// * `product` - 产品类型
///
/// # 返回值
///
/// * `Ok(Vec<String>)` - 按文档顺序排列的绝对地址；为空表示"没有可用文件"
/// * `Err(PortalError)` - 连接失败或输入为空
pub async fn resolve_links(
    session: &PortalSession,
    area_name: &str,
    product: ProductType,
) -> Result<Vec<String>, PortalError> {
    resolve_links_with(session, &SrcMarkerExtractor, area_name, product).await
}

/// 使用指定提取器解析下载地址
pub async fn resolve_links_with(
    session: &PortalSession,
    extractor: &dyn LinkExtractor,
    area_name: &str,
    product: ProductType,
) -> Result<Vec<String>, PortalError> {
    let area_name = area_name.trim();
    if area_name.is_empty() {
        return Err(PortalError::InputValidation(
            "select an area first".to_string(),
        ));
    }

    debug!("Resolving links for '{}' ({})", area_name, product.code());
    let response = session
        .client()
        .post(session.endpoint(DOWNLOAD_PATH))
        .headers(session.ajax_headers())
        .header(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        )
        .body(resolve_form_body(area_name, product))
        .timeout(session.timeouts().resolve())
        .send()
        .await
        .map_err(|e| PortalError::connection(Stage::Resolve, e))?;

    let status = response.status();
    let html = response
        .text()
        .await
        .map_err(|e| PortalError::connection(Stage::Resolve, e))?;

    if status != reqwest::StatusCode::OK {
        warn!("Link resolution returned status {}, treating as no files", status);
        return Ok(Vec::new());
    }

    let links: Vec<String> = extractor
        .extract(&html)
        .iter()
        .map(|href| session.absolute_url(href))
        .collect();

    info!("Resolved {} file(s) for '{}'", links.len(), area_name);
    Ok(links)
}

#[cfg(test)]
#[path = "links_test.rs"]
mod tests;
