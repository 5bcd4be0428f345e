//! 内联图片脱敏
//!
//! 渲染前递归遍历记录：键为 `url` 且值为 `data:image/...` 的字符串、逗号后负载不少于 MIN_PAYLOAD_LEN 字节时，
//! 负载替换为 `[b64 sha=<sha256 前 12 位十六进制> len=<字节数>]`，其余结构保持不变，便于对比。

use serde_json::Value;
use sha2::{Digest, Sha256};

/// 低于此长度的负载原样保留
pub const MIN_PAYLOAD_LEN: usize = 100;
const SHA_PREFIX_LEN: usize = 12;

/// 摘要化单个 data URL；不需要处理时返回 None
pub fn summarize_data_image_url(url: &str) -> Option<String> {
    if !url.starts_with("data:image/") {
        return None;
    }
    let comma = url.find(',')?;
    let (header, payload) = url.split_at(comma + 1);
    if payload.len() < MIN_PAYLOAD_LEN {
        return None;
    }
    let digest = hex::encode(Sha256::digest(payload.as_bytes()));
    Some(format!(
        "{header}[b64 sha={} len={}]",
        &digest[..SHA_PREFIX_LEN],
        payload.len()
    ))
}

/// 原地脱敏整个 JSON 值
pub fn redact_images(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                match v {
                    Value::String(s) if key == "url" => {
                        if let Some(summary) = summarize_data_image_url(s) {
                            *s = summary;
                        }
                    }
                    _ => redact_images(v),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_images),
        _ => {}
    }
}
