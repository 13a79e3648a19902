//! `<option>` list extraction for the jurisdiction hierarchy

use std::collections::HashSet;

use scraper::Html;

use crate::error::AppResult;
use crate::models::{JurisdictionLevel, JurisdictionNode, COURT_CODE_SEPARATOR};
use crate::parsing::{element_text, normalize_ws, selector};

/// Option values the portal uses for "please select" entries
const PLACEHOLDER_VALUES: [&str; 4] = ["", "0", "null", "undefined"];

/// States from the `<select>` on the cause-list landing page
pub fn parse_state_select(page_html: &str) -> AppResult<Vec<JurisdictionNode>> {
    let doc = Html::parse_document(page_html);
    let sel = selector("select#sess_state_code option, select[name='state_code'] option")?;
    let raw = doc
        .select(&sel)
        .map(|opt| {
            (
                opt.value().attr("value").unwrap_or_default().to_string(),
                element_text(&opt),
            )
        })
        .collect::<Vec<_>>();
    Ok(collect_nodes(raw, JurisdictionLevel::State, |v| Some(v.to_string())))
}

pub fn parse_district_options(markup: &str) -> AppResult<Vec<JurisdictionNode>> {
    let raw = raw_options(markup)?;
    Ok(collect_nodes(raw, JurisdictionLevel::District, |v| Some(v.to_string())))
}

/// Complex options carry `code@est1,est2@flag`; the node code is the first part
pub fn parse_complex_options(markup: &str) -> AppResult<Vec<JurisdictionNode>> {
    let raw = raw_options(markup)?;
    Ok(collect_nodes(raw, JurisdictionLevel::Complex, |v| {
        v.split('@').next().map(str::to_string)
    }))
}

/// Court options; only `est^court` values are real courts
pub fn parse_court_options(markup: &str) -> AppResult<Vec<JurisdictionNode>> {
    let raw = raw_options(markup)?
        .into_iter()
        .map(|(value, name)| (value, clean_court_name(&name)))
        .collect();
    Ok(collect_nodes(raw, JurisdictionLevel::Court, |v| {
        v.contains(COURT_CODE_SEPARATOR).then(|| v.to_string())
    }))
}

/// Strip stray JSON fragments and escapes that leak into court labels
pub fn clean_court_name(name: &str) -> String {
    let name = name
        .replace("\\n", " ")
        .replace("\\t", " ")
        .replace("\\/", "/")
        .replace("\\\"", "");
    normalize_ws(&name)
        .trim_matches(|c: char| matches!(c, '"' | '{' | '}' | ',' | ':' | '\\') || c.is_whitespace())
        .to_string()
}

fn raw_options(markup: &str) -> AppResult<Vec<(String, String)>> {
    let wrapped;
    let markup = if markup.contains("<select") {
        markup
    } else {
        wrapped = format!("<select>{}</select>", markup);
        &wrapped
    };
    let doc = Html::parse_fragment(markup);
    let sel = selector("option")?;
    Ok(doc
        .select(&sel)
        .map(|opt| {
            (
                opt.value().attr("value").unwrap_or_default().trim().to_string(),
                element_text(&opt),
            )
        })
        .collect())
}

/// Drop placeholders and nameless entries, keep the first of duplicate codes
fn collect_nodes(
    raw: Vec<(String, String)>,
    level: JurisdictionLevel,
    code_of: impl Fn(&str) -> Option<String>,
) -> Vec<JurisdictionNode> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|(value, _)| !PLACEHOLDER_VALUES.contains(&value.trim()))
        .filter_map(|(value, name)| {
            let code = code_of(value.trim())?.trim().to_string();
            if code.is_empty() || name.is_empty() {
                return None;
            }
            Some(JurisdictionNode::new(code, name, level))
        })
        .filter(|node| seen.insert(node.code.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_select() {
        let page = r#"
            <select id="sess_state_code" name="state_code">
              <option value="0">Select state</option>
              <option value="4">Karnataka</option>
              <option value="26">Delhi</option>
            </select>"#;
        let states = parse_state_select(page).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0], JurisdictionNode::new("4", "Karnataka", JurisdictionLevel::State));
    }

    #[test]
    fn test_district_options_dedup() {
        let markup = "<option value=''>Select</option><option value='3'>Bangalore</option>\
                      <option value='3'>Bangalore Rural</option><option value='7'>Mysore</option>";
        let districts = parse_district_options(markup).unwrap();
        let codes: Vec<_> = districts.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["3", "7"]);
        assert_eq!(districts[0].name, "Bangalore");
    }

    #[test]
    fn test_complex_code_is_prefix() {
        let markup = "<option value='1040003@2,3,4@N'>City Civil Court Complex</option>";
        let complexes = parse_complex_options(markup).unwrap();
        assert_eq!(complexes[0].code, "1040003");
        assert_eq!(complexes[0].level, JurisdictionLevel::Complex);
    }

    #[test]
    fn test_court_options_keep_only_qualified() {
        let markup = r#"<select><option value="">Select Court</option>
            <option value="D" disabled>---Civil Judges---</option>
            <option value="2^7">1-Principal Judge\n"}</option>
            <option value="2^9">  2-Addl   Judge </option></select>"#;
        let courts = parse_court_options(markup).unwrap();
        assert_eq!(courts.len(), 2);
        assert_eq!(courts[0].code, "2^7");
        assert_eq!(courts[0].name, "1-Principal Judge");
        assert_eq!(courts[1].name, "2-Addl Judge");
    }

    #[test]
    fn test_empty_markup_yields_nothing() {
        assert!(parse_court_options("").unwrap().is_empty());
    }
}
