use std::sync::LazyLock;

use regex::Regex;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"']+)["']"#).expect("img src pattern")
});

/// Locate a captcha image URL inside a JSON-ish or HTML reply
///
/// Only `<img>` sources that look like captcha renderers count.
pub fn find_captcha_src(text: &str) -> Option<String> {
    let unescaped = text.replace("\\/", "/").replace("\\\"", "\"");
    IMG_SRC
        .captures_iter(&unescaped)
        .map(|caps| caps[1].trim().replace("&amp;", "&"))
        .find(|src| {
            let lower = src.to_lowercase();
            lower.contains("securimage") || lower.contains("captcha")
        })
}
