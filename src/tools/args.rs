//! 工具参数解析与校验
//!
//! 参数原值须为 JSON 编码的字符串（缺失 / null / 空串视为 `{}`），解码后必须是对象。
//! 各工具的字段约束在此校验，失败统一为 invalid_arguments，绝不向上抛出。

use serde_json::{Map, Value};

use crate::tools::outcome::ToolFailure;

/// 归一化坐标上限（0..1000 相对截图）
pub const NORM_MAX: f64 = 1000.0;

pub type Args = Map<String, Value>;

/// 将工具调用的原始 arguments 解码为 JSON 对象
pub fn parse_args(raw: Option<&Value>) -> Result<Args, ToolFailure> {
    let text = match raw {
        None | Some(Value::Null) => return Ok(Map::new()),
        Some(Value::String(s)) => s.as_str(),
        Some(_) => {
            return Err(ToolFailure::invalid_arguments(
                "arguments must be a JSON string",
            ))
        }
    };
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ToolFailure::invalid_arguments(format!("JSON decode error: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ToolFailure::invalid_arguments(
            "arguments must decode to an object",
        )),
    }
}

/// move_mouse 参数：x / y 必填且为数值（数字字符串亦可），越界静默钳制到 [0, 1000]
pub fn parse_point(raw: Option<&Value>) -> Result<(f64, f64), ToolFailure> {
    let args = parse_args(raw)?;
    let (Some(x), Some(y)) = (args.get("x"), args.get("y")) else {
        return Err(ToolFailure::invalid_arguments("missing x or y"));
    };
    match (as_number(x), as_number(y)) {
        (Some(x), Some(y)) => Ok((clamp_norm(x), clamp_norm(y))),
        _ => Err(ToolFailure::invalid_arguments("x and y must be numbers")),
    }
}

/// type_text 参数：text 缺失或 null 时为空串；非 ASCII 字符被剔除
pub fn parse_text(raw: Option<&Value>) -> Result<String, ToolFailure> {
    let args = parse_args(raw)?;
    let text = match args.get("text") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    Ok(strip_non_ascii(&text))
}

pub fn strip_non_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

pub fn clamp_norm(v: f64) -> f64 {
    v.clamp(0.0, NORM_MAX)
}

fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn test_empty_and_missing_args_are_empty_object() {
        assert!(parse_args(None).unwrap().is_empty());
        assert!(parse_args(Some(&Value::Null)).unwrap().is_empty());
        assert!(parse_args(Some(&s(""))).unwrap().is_empty());
    }

    #[test]
    fn test_non_string_arguments_rejected() {
        let err = parse_args(Some(&json!({"x": 1}))).unwrap_err();
        assert_eq!(err.message, "arguments must be a JSON string");
    }

    #[test]
    fn test_decode_error() {
        let err = parse_args(Some(&s("{not json"))).unwrap_err();
        assert!(err.message.starts_with("JSON decode error"));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = parse_args(Some(&s("[1,2]"))).unwrap_err();
        assert_eq!(err.message, "arguments must decode to an object");
    }

    #[test]
    fn test_point_clamped() {
        assert_eq!(parse_point(Some(&s(r#"{"x":-5,"y":1500}"#))).unwrap(), (0.0, 1000.0));
        assert_eq!(parse_point(Some(&s(r#"{"x":500.5,"y":"250"}"#))).unwrap(), (500.5, 250.0));
    }

    #[test]
    fn test_point_missing_or_wrong_type() {
        let err = parse_point(Some(&s(r#"{"x":1}"#))).unwrap_err();
        assert_eq!(err.message, "missing x or y");
        let err = parse_point(Some(&s(r#"{"x":"left","y":2}"#))).unwrap_err();
        assert_eq!(err.message, "x and y must be numbers");
        let err = parse_point(Some(&s(r#"{"x":null,"y":2}"#))).unwrap_err();
        assert_eq!(err.message, "x and y must be numbers");
    }

    #[test]
    fn test_text_defaults_and_sanitizes() {
        assert_eq!(parse_text(Some(&s("{}"))).unwrap(), "");
        assert_eq!(parse_text(Some(&s(r#"{"text":null}"#))).unwrap(), "");
        assert_eq!(parse_text(Some(&s(r#"{"text":"héllo 世界!"}"#))).unwrap(), "hllo !");
        assert_eq!(parse_text(Some(&s(r#"{"text":42}"#))).unwrap(), "42");
    }
}
