// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;
use std::io::{Cursor, Write};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::FileOptions;

/// 挂载预热、区域目录和验证码接口
pub async fn mount_portal(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "PHPSESSID=abc; Path=/"))
        .mount(server)
        .await;

    let catalog = json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "name": "Recife", "id": "2611606" } },
            { "type": "Feature", "properties": { "name": "Olinda", "id": "2609600" } }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/estados_pe.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/get_captcha.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .mount(server)
        .await;
}

/// 构造内存中的 zip 归档
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
