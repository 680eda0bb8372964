//! 旧式列表解析器 (Legacy List Parser)
//!
//! 将 Base64 编码的逐行链接列表解码为带标签的有序条目序列，
//! 并为缺失标签的条目合成稳定标识。

use base64::{Engine as _, engine::general_purpose};
use tracing::debug;

use crate::core::error::{Result, SubError};

/// 旧式订阅中的单个条目
///
/// 链接是协议相关的不透明字符串，本核心不解析其载荷。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyEntry {
    /// 原始连接链接
    pub link: String,
    /// 解析得到的标签；缺失时为合成的 `proxy-<n>`
    pub tag: String,
}

/// 执行启发式 Base64 解码 (Heuristic Decoding)
fn decode_base64_auto(input: &str) -> Result<String> {
    let clean: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let engines = [
        &general_purpose::STANDARD,
        &general_purpose::URL_SAFE_NO_PAD,
        &general_purpose::URL_SAFE,
    ];

    for engine in engines {
        if let Ok(b) = engine.decode(&clean) {
            return Ok(String::from_utf8_lossy(&b).to_string());
        }
    }
    Err(SubError::Decode("not valid base64 content".into()))
}

/// 解析旧式订阅文档
///
/// 空行不产生条目；行号从 1 起计并包含空行，用于合成缺失标签。
pub fn parse_legacy(body: &str) -> Result<Vec<LegacyEntry>> {
    let decoded = decode_base64_auto(body)?;
    if decoded.trim().is_empty() {
        return Err(SubError::Decode("subscription decoded to empty content".into()));
    }

    let mut entries = Vec::new();
    for (idx, line) in decoded.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // scheme 仅用于识别行格式，不保留在条目上
        if line.split_once("://").is_none() {
            debug!("Skipping line {} without scheme: {}", idx + 1, line);
            continue;
        }

        let tag_raw = line.rsplit_once('#').map(|(_, frag)| frag).unwrap_or("");
        let tag = percent_encoding::percent_decode_str(tag_raw)
            .decode_utf8_lossy()
            .to_string();
        let tag = if tag.is_empty() {
            format!("proxy-{}", idx + 1)
        } else {
            tag
        };

        entries.push(LegacyEntry {
            link: line.to_string(),
            tag,
        });
    }
    Ok(entries)
}

/// 渲染缓存中间格式：每行 `link|tag`
///
/// 该格式仅本核心读写，不对外导出。
pub fn to_cache_lines(entries: &[LegacyEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}|{}", e.link, e.tag))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(content: &str) -> String {
        general_purpose::STANDARD.encode(content)
    }

    #[test]
    fn reference_document_tags_in_order() {
        let body = encode("vmess://abc#Tag%20One\nvmess://def\n\nvmess://ghi#");
        let entries = parse_legacy(&body).unwrap();

        let tags: Vec<&str> = entries.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["Tag One", "proxy-2", "proxy-4"]);

        let links: Vec<&str> = entries.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(links, ["vmess://abc#Tag%20One", "vmess://def", "vmess://ghi#"]);
    }

    #[test]
    fn tag_is_fragment_after_last_hash() {
        let body = encode("trojan://user#pass@host#Node%20A");
        let entries = parse_legacy(&body).unwrap();
        assert_eq!(entries[0].tag, "Node A");
    }

    #[test]
    fn url_safe_payloads_decode() {
        let body = general_purpose::URL_SAFE_NO_PAD.encode("ss://xyz#Tokyo");
        let entries = parse_legacy(&body).unwrap();
        assert_eq!(entries[0].tag, "Tokyo");
    }

    #[test]
    fn whitespace_in_payload_is_ignored() {
        let encoded = encode("vmess://abc#One\nvmess://def#Two");
        let wrapped: String = encoded
            .chars()
            .enumerate()
            .flat_map(|(i, c)| {
                if i > 0 && i % 8 == 0 {
                    vec!['\n', c]
                } else {
                    vec![c]
                }
            })
            .collect();
        let entries = parse_legacy(&wrapped).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        let err = parse_legacy("!!!not-base64!!!").unwrap_err();
        assert!(matches!(err, SubError::Decode(_)));
    }

    #[test]
    fn blank_decoded_content_is_a_decode_error() {
        let body = encode("\n  \n");
        let err = parse_legacy(&body).unwrap_err();
        assert!(matches!(err, SubError::Decode(_)));
    }

    #[test]
    fn lines_without_scheme_are_skipped() {
        let body = encode("not a link\nvmess://abc#Kept");
        let entries = parse_legacy(&body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, "Kept");
    }

    #[test]
    fn duplicate_tags_are_preserved() {
        let body = encode("vmess://a#Node\nvmess://b#Node");
        let entries = parse_legacy(&body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tag, "Node");
        assert_eq!(entries[1].tag, "Node");
    }

    #[test]
    fn cache_lines_pair_link_and_tag() {
        let body = encode("vmess://abc#One\nvmess://def");
        let entries = parse_legacy(&body).unwrap();
        assert_eq!(
            to_cache_lines(&entries),
            "vmess://abc#One|One\nvmess://def|proxy-2"
        );
    }
}
