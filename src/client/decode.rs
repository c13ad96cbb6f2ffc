//! Decoding of `/changes/` response bodies

use super::error::{ClientError, Result};
use crate::domain::{ChangeDto, ChangeRecord};

/// Gerrit prefixes JSON bodies with this to defeat cross-site script inclusion
pub const XSSI_PREFIX: &str = ")]}'";

/// Remove a single leading [`XSSI_PREFIX`], if present
pub fn strip_xssi_prefix(body: &str) -> &str {
    let trimmed = body.trim_start();
    trimmed.strip_prefix(XSSI_PREFIX).unwrap_or(trimmed)
}

/// Parse a `/changes/` body into change records
pub fn decode_changes(endpoint: &str, body: &str) -> Result<Vec<ChangeRecord>> {
    let json = strip_xssi_prefix(body);
    let changes: Vec<ChangeDto> = serde_json::from_str(json)
        .map_err(|e| ClientError::json_parse(endpoint, "Failed to parse change list", e))?;

    Ok(changes.into_iter().map(ChangeRecord::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ChangeId;

    const BODY: &str = r#"[
        {"_number": 42, "submittable": false, "revisions": {"a1": {}, "b2": {}}},
        {"_number": 43, "submittable": true}
    ]"#;

    #[test]
    fn parses_body_with_prefix() {
        let body = format!("{XSSI_PREFIX}\n{BODY}");
        let records = decode_changes("/changes/", &body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, ChangeId::new("42"));
        assert_eq!(records[0].revision_count, 2);
        assert!(records[1].is_submittable);
        assert_eq!(records[1].revision_count, 0);
    }

    #[test]
    fn parses_body_without_prefix() {
        let records = decode_changes("/changes/", BODY).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn strips_only_one_prefix() {
        assert_eq!(strip_xssi_prefix(")]}')]}'[]"), ")]}'[]");
        assert!(decode_changes("/changes/", ")]}')]}'[]").is_err());
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(decode_changes("/changes/", ")]}'\n[]\n").unwrap().is_empty());
    }

    #[test]
    fn malformed_body_reports_endpoint() {
        let err = decode_changes("/changes/", ")]}'\n<html>oops</html>").unwrap_err();
        match err {
            ClientError::JsonParse { endpoint, .. } => assert_eq!(endpoint, "/changes/"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
