use serde::Deserialize;
use serde_json::Value;

/// Attachment fields that hold downloadable URLs, in rewrite order.
pub const REFERENCE_FIELDS: [&str; 3] = ["url_private", "url_private_download", "thumb_pdf"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentMode {
    #[default]
    Normal,
    HiddenByLimit,
    Tombstone,
    #[serde(other)]
    Other,
}

/// The parts of an attachment that decide whether and where it is mirrored.
/// Everything else in the record is left alone.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AttachmentRecord {
    #[serde(default)]
    pub is_external: Option<bool>,
    #[serde(default)]
    pub mode: Option<AttachmentMode>,
    #[serde(default)]
    pub user_team: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AttachmentRecord {
    /// `None` when `value` is not an attachment object.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Self::deserialize(value).ok()
    }

    /// External links and attachments withheld by the workspace have nothing
    /// to download.
    pub fn is_skipped(&self) -> bool {
        self.is_external.unwrap_or(false)
            || matches!(
                self.mode,
                Some(AttachmentMode::HiddenByLimit | AttachmentMode::Tombstone)
            )
    }

    /// Directory name shared by every field of this attachment:
    /// `<team>-<id>`, or `<id>` without a team.
    pub fn object_key(&self) -> Option<String> {
        let id = self.id.as_deref().filter(|id| !id.is_empty())?;
        let key = match self.user_team.as_deref().filter(|t| !t.is_empty()) {
            Some(team) => format!("{team}-{id}"),
            None => id.to_string(),
        };
        Some(safe_component(&key)).filter(|k| !k.is_empty())
    }

    /// Local file name: the attachment name made safe, else `fallback`.
    pub fn file_name(&self, fallback: &str) -> String {
        self.name
            .as_deref()
            .map(safe_component)
            .filter(|n| !n.is_empty() && n != "." && n != "..")
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Remote references; anything else is taken to be a local path already.
pub fn is_remote(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn safe_component(raw: &str) -> String {
    sanitize_filename::sanitize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> AttachmentRecord {
        AttachmentRecord::from_value(&value).unwrap()
    }

    #[test]
    fn skip_rules() {
        assert!(record(json!({"id": "F1", "is_external": true})).is_skipped());
        assert!(record(json!({"id": "F1", "mode": "hidden_by_limit"})).is_skipped());
        assert!(record(json!({"id": "F1", "mode": "tombstone"})).is_skipped());
        assert!(!record(json!({"id": "F1", "mode": "hosted"})).is_skipped());
        assert!(!record(json!({"id": "F1", "is_external": false})).is_skipped());
        assert!(!record(json!({"id": "F1", "is_external": null})).is_skipped());
    }

    #[test]
    fn object_key() {
        assert_eq!(
            record(json!({"id": "F1", "user_team": "T1"})).object_key().as_deref(),
            Some("T1-F1")
        );
        assert_eq!(record(json!({"id": "F1"})).object_key().as_deref(), Some("F1"));
        assert_eq!(record(json!({"user_team": "T1"})).object_key(), None);
    }

    #[test]
    fn key_cannot_escape() {
        let key = record(json!({"id": "../../etc", "user_team": "T1"}))
            .object_key()
            .unwrap();
        assert!(!key.contains('/'));
    }

    #[test]
    fn file_name_fallback() {
        assert_eq!(record(json!({"name": "a/b.png"})).file_name("F1"), "ab.png");
        assert_eq!(record(json!({"name": ""})).file_name("F1"), "F1");
        assert_eq!(record(json!({})).file_name("F1"), "F1");
        assert_eq!(record(json!({"name": ".."})).file_name("F1"), "F1");
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://files.slack.com/a.png"));
        assert!(is_remote("HTTP://files.slack.com/a.png"));
        assert!(!is_remote("files/T1-F1/url_private/a.png"));
        assert!(!is_remote("ftp://example.com/a"));
        assert!(!is_remote("http"));
    }

    #[test]
    fn non_object_rejected() {
        assert!(AttachmentRecord::from_value(&json!("F1")).is_none());
        assert!(AttachmentRecord::from_value(&json!({"id": 42})).is_none());
    }
}
