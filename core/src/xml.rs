//! XML formatting helpers.

use crate::error::{GdscError, Result};
use quick_xml::{Reader, Writer, events::Event};
use std::io::Cursor;

/// Pretty-print an XML document with two-space indentation.
///
/// Whitespace-only text between elements is dropped; other text is kept. Malformed
/// input (mismatched or unclosed tags) is an error.
pub fn format_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => {
                match &event {
                    Event::Start(_) => depth += 1,
                    Event::End(_) => depth = depth.saturating_sub(1),
                    _ => {}
                }
                writer.write_event(event)?;
            }
            Err(e) => {
                return Err(GdscError::xml(format!(
                    "{} at position {}",
                    e,
                    reader.error_position()
                )));
            }
        }
    }

    if depth != 0 {
        return Err(GdscError::xml(format!("{} unclosed element(s)", depth)));
    }

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| GdscError::xml(e.to_string()))
}

/// Replace `&quot;` entities with literal quotes.
pub fn convert_quotes(xml: &str) -> String {
    xml.replace("&quot;", "\"")
}

/// Escape the XML special characters `< > & ' "`.
pub fn escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// Resolve the predefined XML entities and character references.
pub fn unescape(text: &str) -> Result<String> {
    quick_xml::escape::unescape(text)
        .map(|s| s.into_owned())
        .map_err(|e| GdscError::xml(e.to_string()))
}
