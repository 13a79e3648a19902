//! Raw upstream reply
//!
//! The portal answers the same endpoint with JSON, HTML fragments or image
//! bytes depending on its mood; this keeps the reply undecoded until a caller
//! knows what it expects.

use serde_json::Value as JsonValue;

const IMAGE_MAGIC: [&[u8]; 4] = [b"\x89PNG", b"\xff\xd8\xff", b"GIF8", b"RIFF"];

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Final URL after redirects
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body as JSON, if it is JSON
    pub fn json(&self) -> Option<JsonValue> {
        let trimmed = self.body.iter().position(|b| !b.is_ascii_whitespace())?;
        if !matches!(self.body[trimmed], b'{' | b'[') {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    /// String field of a JSON object body
    pub fn json_str(&self, key: &str) -> Option<String> {
        self.json()?
            .get(key)?
            .as_str()
            .map(|s| s.to_string())
            .filter(|s| !s.trim().is_empty())
    }

    /// First non-empty string among several JSON keys
    pub fn json_str_any(&self, keys: &[&str]) -> Option<String> {
        let json = self.json()?;
        keys.iter().find_map(|key| {
            json.get(*key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.to_string())
        })
    }

    /// Rotated anti-forgery token carried by a JSON reply
    pub fn fresh_token(&self) -> Option<String> {
        self.json_str("app_token")
    }

    /// All string values of a JSON object joined, or the raw text otherwise
    pub fn searchable_text(&self) -> String {
        match self.json() {
            Some(JsonValue::Object(map)) => map
                .values()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            _ => self.text(),
        }
    }

    pub fn is_image(&self) -> bool {
        looks_like_image(&self.content_type, &self.body)
    }
}

/// Decide by content type or magic bytes whether a body is an image
pub fn looks_like_image(content_type: &str, body: &[u8]) -> bool {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("image") || ct.contains("octet-stream") {
        return !body.is_empty();
    }
    IMAGE_MAGIC.iter().any(|magic| body.starts_with(magic))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: &str, body: &[u8]) -> UpstreamResponse {
        UpstreamResponse {
            status: 200,
            url: "http://upstream/".into(),
            content_type: content_type.into(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_image_detection_by_magic_bytes() {
        assert!(response("text/html", b"\x89PNG\r\n\x1a\n....").is_image());
        assert!(response("", b"\xff\xd8\xff\xe0JFIF").is_image());
        assert!(!response("text/html", b"<html></html>").is_image());
        assert!(response("image/png", b"x").is_image());
    }

    #[test]
    fn test_json_helpers() {
        let resp = response(
            "application/json",
            br#" {"dist_list":"<option value='1'>A</option>","app_token":"abc","errormsg":""}"#,
        );
        assert_eq!(resp.fresh_token().as_deref(), Some("abc"));
        assert_eq!(resp.json_str("errormsg"), None);
        assert!(resp.json_str_any(&["complex_list", "dist_list"]).unwrap().contains("option"));
        assert!(response("text/html", b"<p>{not json}</p>").json().is_none());
    }
}
