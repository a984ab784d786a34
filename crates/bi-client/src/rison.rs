//! Rison encoding of JSON values, the query format of the list and export
//! endpoints (`?q=(filters:!(),page:0)`).

use serde_json::Value;

const NOT_ID_CHARS: &str = " '!:(),*@$";

fn is_id(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        None => false,
        Some(first) if first.is_ascii_digit() || first == '-' || NOT_ID_CHARS.contains(first) => {
            false
        }
        Some(_) => chars.all(|c| !NOT_ID_CHARS.contains(c)),
    }
}

fn encode_string(text: &str, out: &mut String) {
    if is_id(text) {
        out.push_str(text);
        return;
    }
    out.push('\'');
    for c in text.chars() {
        if c == '!' || c == '\'' {
            out.push('!');
        }
        out.push(c);
    }
    out.push('\'');
}

fn encode_into(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("!n"),
        Value::Bool(true) => out.push_str("!t"),
        Value::Bool(false) => out.push_str("!f"),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(text) => encode_string(text, out),
        Value::Array(items) => {
            out.push_str("!(");
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                encode_into(item, out);
            }
            out.push(')');
        }
        Value::Object(map) => {
            // Sorted keys keep the encoding stable.
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('(');
            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                encode_string(key, out);
                out.push(':');
                encode_into(item, out);
            }
            out.push(')');
        }
    }
}

/// Encode a JSON value as rison.
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    encode_into(value, &mut out);
    out
}
