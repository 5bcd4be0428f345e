//! 截图上下文裁剪
//!
//! 只处理「content 为多段且含 image_url 的 user 消息」。数量超过 keep_last 时，
//! 除最近 keep_last 条外全部替换为占位文本；若紧邻的上一条是成功的截图工具结果（ok + file），
//! 占位文本附带文件路径提示。替换不可逆。

use serde_json::Value;

use crate::memory::{Message, MessageContent, Role};

/// 被裁剪截图的占位文本
pub const IMAGE_PLACEHOLDER: &str = "captured image data";

/// 对消息序列执行裁剪，返回新的序列（其余消息原样保留、顺序不变）
pub fn prune_image_messages(mut messages: Vec<Message>, keep_last: usize) -> Vec<Message> {
    let positions: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.carries_image())
        .map(|(i, _)| i)
        .collect();

    if positions.len() <= keep_last {
        return messages;
    }

    let cut = positions.len() - keep_last;
    for &i in &positions[..cut] {
        let hint = i
            .checked_sub(1)
            .and_then(|prev| capture_file_hint(&messages[prev]))
            .map(|file| format!(" (omitted; file={file})"))
            .unwrap_or_default();
        messages[i].content = Some(MessageContent::Text(format!("{IMAGE_PLACEHOLDER}{hint}")));
    }

    tracing::debug!(pruned = cut, kept = keep_last, "pruned screenshot messages");
    messages
}

/// 从工具结果消息中取出截图文件路径：须为 tool 消息，content 为 JSON 对象且 ok、file 均为真值
fn capture_file_hint(msg: &Message) -> Option<String> {
    if msg.role != Role::Tool {
        return None;
    }
    let meta: Value = serde_json::from_str(msg.text()?).ok()?;
    let obj = meta.as_object()?;
    if !obj.get("ok").is_some_and(is_truthy) {
        return None;
    }
    let file = obj.get("file").filter(|v| is_truthy(v))?;
    Some(match file {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ContentPart;

    fn image_msg(tag: &str) -> Message {
        Message::user_parts(vec![
            ContentPart::text(IMAGE_PLACEHOLDER),
            ContentPart::image_url(format!("data:image/png;base64,{tag}")),
        ])
    }

    fn capture_result(file: &str) -> Message {
        Message::tool(
            "call",
            "take_screenshot",
            format!(r#"{{"ok":true,"file":"{file}","screen_w":1920,"screen_h":1080}}"#),
        )
    }

    fn history(n: usize) -> Vec<Message> {
        let mut msgs = vec![Message::system("sys"), Message::user("task")];
        for i in 0..n {
            msgs.push(capture_result(&format!("dumps/screen_{:04}.png", i + 1)));
            msgs.push(image_msg(&format!("IMG{i}")));
        }
        msgs
    }

    #[test]
    fn test_noop_when_within_threshold() {
        let msgs = history(2);
        let pruned = prune_image_messages(msgs.clone(), 2);
        assert_eq!(pruned, msgs);
    }

    #[test]
    fn test_prunes_earliest_only() {
        let pruned = prune_image_messages(history(5), 2);
        let images: Vec<usize> = pruned
            .iter()
            .enumerate()
            .filter(|(_, m)| m.carries_image())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(images, vec![9, 11]);
        for i in [3, 5, 7] {
            let text = pruned[i].text().unwrap();
            assert!(text.starts_with(IMAGE_PLACEHOLDER));
        }
        assert_eq!(
            pruned[3].text(),
            Some("captured image data (omitted; file=dumps/screen_0001.png)")
        );
        assert_eq!(pruned.len(), 12);
    }

    #[test]
    fn test_hint_omitted_without_successful_tool_result() {
        let mut msgs = vec![
            Message::tool("c1", "take_screenshot", r#"{"ok":false,"error":{"type":"x","message":"y"}}"#),
            image_msg("A"),
            Message::assistant("between"),
            image_msg("B"),
            Message::tool("c3", "take_screenshot", "not json"),
            image_msg("C"),
            image_msg("D"),
        ];
        msgs = prune_image_messages(msgs, 1);
        assert_eq!(msgs[1].text(), Some(IMAGE_PLACEHOLDER));
        assert_eq!(msgs[3].text(), Some(IMAGE_PLACEHOLDER));
        assert_eq!(msgs[5].text(), Some(IMAGE_PLACEHOLDER));
        assert!(msgs[6].carries_image());
    }

    #[test]
    fn test_other_messages_untouched() {
        let mut msgs = history(3);
        msgs.push(Message::assistant("done"));
        let pruned = prune_image_messages(msgs.clone(), 1);
        for (before, after) in msgs.iter().zip(pruned.iter()) {
            if !before.carries_image() {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_keep_zero_compacts_everything() {
        let pruned = prune_image_messages(history(2), 0);
        assert!(pruned.iter().all(|m| !m.carries_image()));
    }
}
