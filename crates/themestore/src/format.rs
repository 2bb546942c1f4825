//! # File Formats
//!
//! How a record's values are laid out inside its file. Only the filesystem datasource
//! uses this; the builder and records never see raw file text.
//!
//! ## Compound Objects
//!
//! Sections are separated by a line holding only `==`:
//!
//! ```text
//! title: About          <-- settings (YAML mapping, flattened into attributes)
//! url: /about
//! ==
//! function onStart() {} <-- code
//! ==
//! <p>Hi</p>             <-- markup
//! ```
//!
//! | Sections | Meaning |
//! |----------|---------|
//! | 1 | markup |
//! | 2 | settings, markup |
//! | 3+ | settings, code, markup (extra separators stay in the markup) |
//!
//! A separator is `==` at the start of a line, optionally followed by whitespace.
//! Indented `==` lines (such as inside a YAML block scalar) are content.
//!
//! Rendering emits the fewest sections that hold the values: code forces three,
//! settings alone force two, otherwise the file is just the markup. Markup that
//! itself holds a separator line always gets all three sections, since only the
//! first two separators split. Code is written as is and may not hold one.
//!
//! ## Plain and Yaml
//!
//! - **Plain**: the whole file is the `markup` attribute.
//! - **Yaml**: the whole file is a YAML mapping flattened into attributes.

use crate::error::{Result, ThemeStoreError};
use crate::record::{Values, RESERVED_ATTRIBUTES};
use serde_json::Value;

pub const SECTION_SEPARATOR: &str = "==";

const MARKUP: &str = "markup";
const CODE: &str = "code";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Settings, code and markup sections in one file.
    Compound,
    /// A single flat body.
    Plain,
    /// A YAML document.
    Yaml,
}

impl FileFormat {
    /// Parse file content into attribute values.
    pub fn decode(self, content: &str) -> Result<Values> {
        let content = content.replace("\r\n", "\n");
        match self {
            FileFormat::Compound => decode_compound(&content),
            FileFormat::Plain => {
                let mut values = Values::new();
                values.insert(MARKUP.to_string(), Value::String(content));
                Ok(values)
            }
            FileFormat::Yaml => parse_mapping(&content),
        }
    }

    /// Render attribute values into file content.
    pub fn encode(self, values: &Values) -> Result<String> {
        match self {
            FileFormat::Compound => encode_compound(values),
            FileFormat::Plain => Ok(text_value(values, MARKUP)?.to_string()),
            FileFormat::Yaml => render_mapping(&persisted(values, &[])),
        }
    }
}

fn decode_compound(content: &str) -> Result<Values> {
    let mut sections: Vec<Vec<&str>> = vec![Vec::new()];
    for line in content.split('\n') {
        // Only the first two separators split; later ones belong to the markup
        if sections.len() < 3 && is_separator(line) {
            sections.push(Vec::new());
        } else if let Some(current) = sections.last_mut() {
            current.push(line);
        }
    }
    let sections: Vec<String> = sections.into_iter().map(|lines| lines.join("\n")).collect();

    let (settings, code, markup) = match sections.as_slice() {
        [markup] => ("", "", markup.as_str()),
        [settings, markup] => (settings.as_str(), "", markup.as_str()),
        [settings, code, markup, ..] => (settings.as_str(), code.as_str(), markup.as_str()),
        [] => ("", "", ""),
    };

    let mut values = parse_mapping(settings)?;
    if !code.is_empty() {
        values.insert(CODE.to_string(), Value::String(code.to_string()));
    }
    values.insert(MARKUP.to_string(), Value::String(markup.to_string()));
    Ok(values)
}

fn encode_compound(values: &Values) -> Result<String> {
    let settings = persisted(values, &[MARKUP, CODE]);
    let code = text_value(values, CODE)?;
    let markup = text_value(values, MARKUP)?;

    if code.split('\n').any(is_separator) {
        return Err(ThemeStoreError::Format(format!(
            "'{}' may not contain a '{}' line",
            CODE, SECTION_SEPARATOR
        )));
    }

    let mut sections = Vec::new();
    if !code.is_empty() || markup.split('\n').any(is_separator) {
        let settings_text = if settings.is_empty() {
            String::new()
        } else {
            render_mapping(&settings)?
        };
        sections.push(settings_text);
        sections.push(code.to_string());
    } else if !settings.is_empty() {
        sections.push(render_mapping(&settings)?);
    }
    sections.push(markup.to_string());

    Ok(sections.join(&format!("\n{}\n", SECTION_SEPARATOR)))
}

fn is_separator(line: &str) -> bool {
    line.trim_end() == SECTION_SEPARATOR
}

/// Values minus engine-maintained attributes and the given section keys.
fn persisted(values: &Values, skip: &[&str]) -> Values {
    values
        .iter()
        .filter(|(key, _)| {
            !RESERVED_ATTRIBUTES.contains(&key.as_str()) && !skip.contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn text_value<'a>(values: &'a Values, key: &str) -> Result<&'a str> {
    match values.get(key) {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(ThemeStoreError::Format(format!(
            "'{}' must be a string",
            key
        ))),
    }
}

fn parse_mapping(text: &str) -> Result<Values> {
    if text.trim().is_empty() {
        return Ok(Values::new());
    }
    match serde_yaml::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Values::new()),
        other => Err(ThemeStoreError::Format(format!(
            "expected a mapping, found {}",
            other
        ))),
    }
}

fn render_mapping(values: &Values) -> Result<String> {
    let text = serde_yaml::to_string(values)?;
    Ok(text.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(v: Value) -> Values {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_decode_markup_only() {
        let decoded = FileFormat::Compound.decode("<p>Hi</p>").unwrap();
        assert_eq!(decoded, values(json!({"markup": "<p>Hi</p>"})));
    }

    #[test]
    fn test_decode_settings_and_markup() {
        let decoded = FileFormat::Compound
            .decode("title: About\nurl: /about\n==\n<p>Hi</p>")
            .unwrap();
        assert_eq!(decoded["title"], "About");
        assert_eq!(decoded["url"], "/about");
        assert_eq!(decoded["markup"], "<p>Hi</p>");
        assert!(decoded.get("code").is_none());
    }

    #[test]
    fn test_decode_three_sections() {
        let decoded = FileFormat::Compound
            .decode("title: Blog\n==\nfunction onStart() {}\n==\n<h1>Blog</h1>\n")
            .unwrap();
        assert_eq!(decoded["title"], "Blog");
        assert_eq!(decoded["code"], "function onStart() {}");
        assert_eq!(decoded["markup"], "<h1>Blog</h1>\n");
    }

    #[test]
    fn test_decode_keeps_extra_separators_in_markup() {
        let decoded = FileFormat::Compound
            .decode("a: 1\n==\ncode\n==\nfirst\n==\nsecond")
            .unwrap();
        assert_eq!(decoded["markup"], "first\n==\nsecond");
    }

    #[test]
    fn test_decode_normalizes_crlf() {
        let decoded = FileFormat::Compound
            .decode("title: Win\r\n==\r\n<p>x</p>")
            .unwrap();
        assert_eq!(decoded["title"], "Win");
        assert_eq!(decoded["markup"], "<p>x</p>");
    }

    #[test]
    fn test_decode_rejects_non_mapping_settings() {
        let result = FileFormat::Compound.decode("- a\n- b\n==\n<p></p>");
        assert!(matches!(result, Err(ThemeStoreError::Format(_))));
    }

    #[test]
    fn test_encode_picks_minimal_sections() {
        let markup_only = FileFormat::Compound
            .encode(&values(json!({"markup": "<p>Hi</p>"})))
            .unwrap();
        assert_eq!(markup_only, "<p>Hi</p>");

        let with_settings = FileFormat::Compound
            .encode(&values(json!({"title": "About", "markup": "<p>Hi</p>"})))
            .unwrap();
        assert_eq!(with_settings, "title: About\n==\n<p>Hi</p>");

        let with_code = FileFormat::Compound
            .encode(&values(json!({"code": "x();", "markup": "<p>Hi</p>"})))
            .unwrap();
        assert_eq!(with_code, "\n==\nx();\n==\n<p>Hi</p>");
    }

    #[test]
    fn test_encode_skips_reserved_attributes() {
        let encoded = FileFormat::Compound
            .encode(&values(json!({
                "file_name": "about.htm",
                "mtime": "2024-01-01T00:00:00Z",
                "content": "stale",
                "markup": "<p>Hi</p>"
            })))
            .unwrap();
        assert_eq!(encoded, "<p>Hi</p>");
    }

    #[test]
    fn test_encode_rejects_non_text_markup() {
        let result = FileFormat::Compound.encode(&values(json!({"markup": 5})));
        assert!(matches!(result, Err(ThemeStoreError::Format(_))));
    }

    #[test]
    fn test_compound_survives_encode_decode() {
        let original = values(json!({
            "title": "About",
            "is_hidden": false,
            "code": "function onStart() {}",
            "markup": "<p>Hi</p>\n"
        }));
        let text = FileFormat::Compound.encode(&original).unwrap();
        assert_eq!(FileFormat::Compound.decode(&text).unwrap(), original);
    }

    #[test]
    fn test_markup_separator_forces_three_sections() {
        let markup_only = values(json!({"markup": "intro\n==\nbody"}));
        let text = FileFormat::Compound.encode(&markup_only).unwrap();
        assert_eq!(text, "\n==\n\n==\nintro\n==\nbody");
        assert_eq!(FileFormat::Compound.decode(&text).unwrap(), markup_only);

        let with_settings = values(json!({"title": "B", "markup": "first\n==\nsecond"}));
        let text = FileFormat::Compound.encode(&with_settings).unwrap();
        assert_eq!(FileFormat::Compound.decode(&text).unwrap(), with_settings);
    }

    #[test]
    fn test_code_with_separator_is_rejected() {
        let result = FileFormat::Compound.encode(&values(json!({"code": "a\n==\nb"})));
        assert!(matches!(result, Err(ThemeStoreError::Format(_))));
    }

    #[test]
    fn test_code_whitespace_is_kept() {
        let original = values(json!({"code": "\n  x();\n", "markup": ""}));
        let text = FileFormat::Compound.encode(&original).unwrap();
        assert_eq!(FileFormat::Compound.decode(&text).unwrap(), original);
    }

    #[test]
    fn test_indented_separator_is_content() {
        let decoded = FileFormat::Compound.decode("<pre>\n  ==\n</pre>").unwrap();
        assert_eq!(decoded["markup"], "<pre>\n  ==\n</pre>");
    }

    #[test]
    fn test_plain_is_whole_body() {
        let body = "title: not settings\n==\nstill body";
        let decoded = FileFormat::Plain.decode(body).unwrap();
        assert_eq!(decoded["markup"], body);
        assert_eq!(FileFormat::Plain.encode(&decoded).unwrap(), body);
    }

    #[test]
    fn test_yaml_mapping() {
        let decoded = FileFormat::Yaml
            .decode("name: Main\nitems:\n  - title: Home\n    url: /\n")
            .unwrap();
        assert_eq!(decoded["name"], "Main");
        assert_eq!(decoded["items"][0]["url"], "/");

        assert!(FileFormat::Yaml.decode("").unwrap().is_empty());
        assert!(FileFormat::Yaml.decode("just a string").is_err());
    }
}
