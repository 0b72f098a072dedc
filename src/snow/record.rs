//! Table API 记录封装
//! 字段值可能是纯字符串，也可能是 {display_value, value} 形式的引用对象

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 一条 ServiceNow 表记录（字段名 → 值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub serde_json::Map<String, Value>);

impl Record {
    /// 读取字段的字符串值；缺失或非字符串时返回空串
    pub fn get_str(&self, field: &str) -> &str {
        match self.0.get(field) {
            Some(Value::String(s)) => s,
            // 引用字段展开为对象时取其 value
            Some(Value::Object(obj)) => match obj.get("value") {
                Some(Value::String(s)) => s,
                _ => "",
            },
            _ => "",
        }
    }

    /// 字段是否为空（缺失、空串或空对象值）
    pub fn is_empty_field(&self, field: &str) -> bool {
        self.get_str(field).is_empty()
    }

    /// 尝试把字段解析为数值，无法解析时返回 None（不报错）
    pub fn get_parsed<T: std::str::FromStr>(&self, field: &str) -> Option<T> {
        let raw = self.get_str(field).trim();
        if raw.is_empty() {
            return None;
        }
        raw.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_get_str_plain() {
        let r = record(json!({"sys_id": "abc123", "name": "web01"}));
        assert_eq!(r.get_str("sys_id"), "abc123");
        assert_eq!(r.get_str("missing"), "");
    }

    #[test]
    fn test_get_str_reference_object() {
        let r = record(json!({"assigned_to": {"display_value": "Alice", "value": "u1"}}));
        assert_eq!(r.get_str("assigned_to"), "u1");
    }

    #[test]
    fn test_is_empty_field() {
        let r = record(json!({"ip_address": "", "name": "db01"}));
        assert!(r.is_empty_field("ip_address"));
        assert!(r.is_empty_field("nonexistent"));
        assert!(!r.is_empty_field("name"));
    }

    #[test]
    fn test_get_parsed_skips_malformed() {
        let r = record(json!({"license_count": "25", "installed_count": "N/A"}));
        assert_eq!(r.get_parsed::<u64>("license_count"), Some(25));
        assert_eq!(r.get_parsed::<u64>("installed_count"), None);
        assert_eq!(r.get_parsed::<u64>("missing"), None);
    }
}
