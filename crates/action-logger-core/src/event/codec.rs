//! Text block format of the daily log file
//!
//! Each record looks like:
//!
//! ```text
//! ============================================================
//! | SOURCE   : CLI
//! | TIMESTAMP: 2023-11-14 22:13:20
//! | PID      : 1234
//! ============================================================
//!
//! ls -la
//! ```
//!
//! Records are separated by a blank line, oldest first. The decoder is
//! lenient: malformed header lines are dropped and segments without a body
//! are skipped rather than failing the whole read.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::models::{Event, LogRecord};

/// Record delimiter written by the encoder
pub const SEPARATOR: &str = "============================================================";

/// Joins consecutive records inside a log file
pub const RECORD_JOINER: &str = "\n\n";

/// A newline followed by at least 20 `=`; shorter runs are treated as content
fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n={20,}").expect("separator pattern is valid"))
}

/// Serialize an event to one record block
pub fn encode(event: &Event) -> String {
    encode_record(&LogRecord::from(event))
}

/// Serialize an already-parsed record (used to re-render query results)
pub fn encode_record(record: &LogRecord) -> String {
    let mut block = String::new();
    block.push_str(SEPARATOR);
    block.push('\n');
    push_header(&mut block, "SOURCE", record.source());
    push_header(&mut block, "TIMESTAMP", &record.timestamp);
    for (name, value) in record.origin.header_fields() {
        push_header(&mut block, name, value);
    }
    block.push_str(SEPARATOR);
    block.push_str("\n\n");
    block.push_str(record.content.trim());
    block
}

fn push_header(block: &mut String, name: &str, value: &str) {
    block.push_str(&format!("| {:<9}: {}\n", name, value));
}

/// Parse a whole log file into records, in file order (oldest first)
pub fn decode(text: &str) -> Vec<LogRecord> {
    if text.is_empty() {
        return Vec::new();
    }

    let prefixed = format!("\n{}", text);
    let parts: Vec<&str> = separator_pattern().split(&prefixed).collect();

    // parts[0] is whatever precedes the first separator; then header/body pairs
    let mut records = Vec::new();
    let mut idx = 1;
    while idx < parts.len() {
        let head = parts[idx];
        let body = parts.get(idx + 1).map(|b| b.trim()).unwrap_or("");
        idx += 2;

        if body.is_empty() {
            continue;
        }
        records.push(LogRecord::from_fields(parse_header(head), body.to_string()));
    }

    records
}

/// Same as [`decode`] but tolerates an absent file body
pub fn decode_opt(text: Option<&str>) -> Vec<LogRecord> {
    text.map(decode).unwrap_or_default()
}

/// Split a header block on `|` into `name: value` pairs keyed by lowercase name
fn parse_header(head: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for line in head.trim().split('|').map(str::trim).filter(|l| !l.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        fields.insert(name, value.to_string());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::models::{format_timestamp_ms, Origin};

    #[test]
    fn test_encode_cli_event() {
        let event = Event::cli(1234, "ls -la").with_timestamp(1_700_000_000_000);
        let block = encode(&event);
        let expected = format!(
            "{sep}\n| SOURCE   : CLI\n| TIMESTAMP: {ts}\n| PID      : 1234\n{sep}\n\nls -la",
            sep = SEPARATOR,
            ts = format_timestamp_ms(1_700_000_000_000)
        );
        assert_eq!(block, expected);
        assert_eq!(SEPARATOR.len(), 60);
    }

    #[test]
    fn test_cli_event_round_trip() {
        let event = Event::cli(1234, "ls -la").with_timestamp(1_700_000_000_000);
        let records = decode(&encode(&event));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source(), "CLI");
        assert_eq!(records[0].content, "ls -la");
        assert_eq!(records[0].timestamp, format_timestamp_ms(1_700_000_000_000));
        assert_eq!(
            records[0].origin,
            Origin::Cli {
                pid: "1234".to_string()
            }
        );
    }

    #[test]
    fn test_claude_code_round_trip_keeps_multiline_content() {
        let content = "  first line\n\nsecond: with colon | and pipe\n  ";
        let event = Event::claude_code("/work/repo", "sess-9", content);
        let records = decode(&encode(&event));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, content.trim());
        assert_eq!(
            records[0].origin,
            Origin::ClaudeCode {
                workspace: "/work/repo".to_string(),
                session_id: "sess-9".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_source_has_no_middle_block() {
        let event = Event::new(
            Origin::Other {
                source: "Slack".to_string(),
                attributes: BTreeMap::new(),
            },
            "message",
        );
        let block = encode(&event);
        let header_lines = block.lines().filter(|l| l.starts_with('|')).count();
        assert_eq!(header_lines, 2);
        assert!(!block.contains("\n\n|"));

        let records = decode(&block);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source(), "Slack");
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").is_empty());
        assert!(decode_opt(None).is_empty());
        assert!(decode_opt(Some("")).is_empty());
    }

    #[test]
    fn test_decode_preserves_file_order() {
        let first = encode(&Event::chrome("1", "first page"));
        let second = encode(&Event::chrome("2", "second page"));
        let text = format!("{}{}{}", first, RECORD_JOINER, second);
        let records = decode(&text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, "first page");
        assert_eq!(records[1].content, "second page");
        assert_eq!(
            records[1].origin,
            Origin::Chrome {
                tab_id: "2".to_string()
            }
        );
    }

    #[test]
    fn test_empty_body_segment_is_dropped() {
        let text = format!(
            "{sep}\n| SOURCE   : CLI\n| PID      : 1\n{sep}\n\n   \n\n{sep}\n| SOURCE   : CLI\n| PID      : 2\n{sep}\n\necho hi",
            sep = SEPARATOR
        );
        let records = decode(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "echo hi");
    }

    #[test]
    fn test_trailing_separator_is_ignored() {
        let text = format!(
            "{}{}{}\n| SOURCE   : CLI\n",
            encode(&Event::cli(5, "pwd")),
            RECORD_JOINER,
            SEPARATOR
        );
        let records = decode(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "pwd");
    }

    #[test]
    fn test_malformed_header_lines_are_dropped() {
        let text = format!(
            "{sep}\n| SOURCE   : CLI\n| garbage without colon\n| : no name\n| EMPTY:   \n| TIMESTAMP: 2024-05-06 07:08:09\n{sep}\n\nmake test",
            sep = SEPARATOR
        );
        let records = decode(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, "2024-05-06 07:08:09");
        assert_eq!(
            records[0].origin,
            Origin::Cli {
                pid: String::new()
            }
        );
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let text = format!(
            "{sep}\n| source   : Chrome\n| TabId    : 12\n{sep}\n\nDocs",
            sep = SEPARATOR
        );
        let records = decode(&text);
        assert_eq!(
            records[0].origin,
            Origin::Chrome {
                tab_id: "12".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_source_attributes_survive_decode() {
        let text = format!(
            "{sep}\n| SOURCE   : Terminal\n| TIMESTAMP: 2024-05-06 07:08:09\n| WINDOW   : 3\n{sep}\n\nvim",
            sep = SEPARATOR
        );
        let records = decode(&text);
        match &records[0].origin {
            Origin::Other { source, attributes } => {
                assert_eq!(source, "Terminal");
                assert_eq!(attributes.get("window").map(String::as_str), Some("3"));
            }
            other => panic!("unexpected origin: {:?}", other),
        }
    }
}
