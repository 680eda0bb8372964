//! 出口过滤引擎 (Outbound Filter Engine)
//!
//! 按标签做大小写不敏感的子串筛选，保持来源顺序与重复项。

use serde_json::Value;
use tracing::debug;

use crate::subscription::fetch::SubscriptionDoc;
use crate::subscription::parse::LegacyEntry;

/// 过滤词集合；空集合匹配所有条目
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    tokens: Vec<String>,
}

impl FilterSet {
    /// 从空白分隔的配置字符串解析
    pub fn parse(raw: &str) -> Self {
        Self {
            tokens: raw.split_whitespace().map(str::to_lowercase).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// 判断标签是否命中任一过滤词
    pub fn matches(&self, tag: &str) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let tag = tag.to_lowercase();
        self.tokens.iter().any(|token| tag.contains(token))
    }
}

/// 读取 outbound 对象上的标签；缺失时视为空标识，不做合成
fn outbound_tag(value: &Value) -> &str {
    value.get("tag").and_then(Value::as_str).unwrap_or_default()
}

/// 选取命中的标签序列
pub fn filter_tags(doc: &SubscriptionDoc, filters: &FilterSet) -> Vec<String> {
    match doc {
        SubscriptionDoc::Structured { outbounds, .. } => outbounds
            .iter()
            .map(outbound_tag)
            .filter(|tag| filters.matches(tag))
            .map(str::to_string)
            .collect(),
        SubscriptionDoc::Legacy { entries } => entries
            .iter()
            .filter(|e| filters.matches(&e.tag))
            .map(|e| e.tag.clone())
            .collect(),
    }
}

/// 选取命中的完整出口对象
///
/// 旧式订阅的链接载荷不在本核心解析范围内，对象视图约定为空集；
/// 需要连接串的调用方应改用原始链接查询。
pub fn filter_objects(doc: &SubscriptionDoc, filters: &FilterSet) -> Vec<Value> {
    match doc {
        SubscriptionDoc::Structured { outbounds, .. } => outbounds
            .iter()
            .filter(|o| filters.matches(outbound_tag(o)))
            .cloned()
            .collect(),
        SubscriptionDoc::Legacy { .. } => {
            debug!("Legacy subscriptions carry opaque links only; object view is empty");
            Vec::new()
        }
    }
}

/// 选取命中的原始连接链接 (仅旧式条目)
pub fn filter_links(entries: &[LegacyEntry], filters: &FilterSet) -> Vec<String> {
    entries
        .iter()
        .filter(|e| filters.matches(&e.tag))
        .map(|e| e.link.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn structured(tags: &[&str]) -> SubscriptionDoc {
        SubscriptionDoc::Structured {
            raw: String::new(),
            outbounds: tags.iter().map(|t| json!({ "tag": t })).collect(),
        }
    }

    fn legacy(pairs: &[(&str, &str)]) -> SubscriptionDoc {
        SubscriptionDoc::Legacy {
            entries: pairs
                .iter()
                .map(|(link, tag)| LegacyEntry {
                    link: link.to_string(),
                    tag: tag.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn substring_match_is_case_insensitive_and_ordered() {
        let doc = structured(&["US-1", "JP-2", "DE-3", "us-backup"]);
        let tags = filter_tags(&doc, &FilterSet::parse("us jp"));
        assert_eq!(tags, ["US-1", "JP-2", "us-backup"]);
    }

    #[test]
    fn empty_filter_set_matches_everything() {
        let filters = FilterSet::parse("   ");
        assert!(filters.is_empty());

        let doc = structured(&["US-1", "JP-2"]);
        assert_eq!(filter_tags(&doc, &filters), ["US-1", "JP-2"]);
    }

    #[test]
    fn duplicate_tags_survive_filtering() {
        let doc = structured(&["Node", "Node", "Other"]);
        let tags = filter_tags(&doc, &FilterSet::parse("node"));
        assert_eq!(tags, ["Node", "Node"]);
    }

    #[test]
    fn only_the_tag_field_is_consulted() {
        let doc = SubscriptionDoc::Structured {
            raw: String::new(),
            outbounds: vec![json!({ "tag": "DE-1", "server": "us.example.com" })],
        };
        assert!(filter_tags(&doc, &FilterSet::parse("us")).is_empty());
    }

    #[test]
    fn objects_keep_all_original_fields() {
        let doc = SubscriptionDoc::Structured {
            raw: String::new(),
            outbounds: vec![
                json!({ "tag": "US-1", "type": "trojan", "server": "a", "server_port": 443 }),
                json!({ "tag": "JP-2", "type": "vmess" }),
            ],
        };
        let objects = filter_objects(&doc, &FilterSet::parse("us"));
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["server_port"], 443);
        assert_eq!(objects[0]["type"], "trojan");
    }

    #[test]
    fn legacy_object_view_is_empty_by_policy() {
        let doc = legacy(&[("vmess://abc#US-1", "US-1")]);
        assert!(filter_objects(&doc, &FilterSet::default()).is_empty());
        // 标签视图不受该约定影响
        assert_eq!(filter_tags(&doc, &FilterSet::default()), ["US-1"]);
    }

    #[test]
    fn links_are_selected_by_tag_only() {
        let entries = vec![
            LegacyEntry {
                link: "vmess://abc#US-1".into(),
                tag: "US-1".into(),
            },
            LegacyEntry {
                link: "vmess://jp.example.com#DE-2".into(),
                tag: "DE-2".into(),
            },
        ];
        let links = filter_links(&entries, &FilterSet::parse("jp"));
        assert!(links.is_empty());

        let links = filter_links(&entries, &FilterSet::parse("de"));
        assert_eq!(links, ["vmess://jp.example.com#DE-2"]);
    }

    #[test]
    fn missing_tag_counts_as_empty_identity() {
        let doc = SubscriptionDoc::Structured {
            raw: String::new(),
            outbounds: vec![json!({ "type": "direct" })],
        };
        // 空过滤集合下仍被包含，标签为空串
        assert_eq!(filter_tags(&doc, &FilterSet::default()), [""]);
        // 任何过滤词都不可能命中空标签
        assert!(filter_tags(&doc, &FilterSet::parse("us")).is_empty());
    }
}
