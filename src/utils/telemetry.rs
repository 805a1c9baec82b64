// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,pe3d_downloader=debug";

/// 日志格式环境变量，值为 `json` 时输出结构化日志
pub const LOG_FORMAT_ENV: &str = "PE3D_LOG_FORMAT";

/// 初始化日志订阅器
///
/// 默认级别为 `info,pe3d_downloader=debug`，可通过 `RUST_LOG` 覆盖。
/// 日志写到标准错误，标准输出留给终端交互
pub fn init_telemetry() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let (plain, structured) = if wants_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref()) {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(structured)
        .init();
}

fn wants_json(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"))
}
