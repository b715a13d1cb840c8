//! YAML templates with `{{ key.path }}` placeholders.
//!
//! A placeholder is replaced by the namespace value at `key.path`, written as
//! a single-line flow node. `{{ key.path? }}` marks the placeholder optional:
//! if nothing resolves, the template line holding it is left out entirely.
//!
//! Example:
//! ```yaml
//! geometry: {{ geometry? }}
//! properties:
//!   datetime: {{ properties.datetime }}
//! ```

use crate::namespace::Namespace;
use crate::render::RenderError;
use anyhow::{Context, bail};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

const PLACEHOLDER_RE: &str = r"\{\{\s*([A-Za-z0-9_:\-]+(?:\.[A-Za-z0-9_:\-]+)*)(\?)?\s*\}\}";

/// A placeholder occurrence in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub path: String,
    pub optional: bool,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    re: Regex,
}

impl Template {
    /// Compile a template, rejecting `{{` sequences that are not well-formed
    /// placeholders.
    pub fn new(text: impl Into<String>) -> anyhow::Result<Self> {
        let text = text.into();
        let re = Regex::new(PLACEHOLDER_RE)?;

        for (lineno, line) in text.lines().enumerate() {
            let opened = line.matches("{{").count();
            let matched = re.find_iter(line).count();
            if opened != matched {
                bail!(
                    "malformed placeholder at template line {}: {:?}",
                    lineno + 1,
                    line.trim()
                );
            }
        }

        Ok(Self { text, re })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read template file {}", path.display()))?;
        Self::new(text).with_context(|| format!("compile template {}", path.display()))
    }

    /// All placeholders, in template order.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut out = Vec::new();
        for (lineno, line) in self.text.lines().enumerate() {
            for caps in self.re.captures_iter(line) {
                if let Some(path) = caps.get(1) {
                    out.push(Placeholder {
                        path: path.as_str().to_string(),
                        optional: caps.get(2).is_some(),
                        line: lineno + 1,
                    });
                }
            }
        }
        out
    }

    /// Substitute namespace values into the template.
    pub fn render(&self, ns: &Namespace) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.text.len());

        for (lineno, line) in self.text.split_inclusive('\n').enumerate() {
            let lno = lineno + 1;

            // An optional placeholder with nothing to say drops its whole line,
            // but only after every required placeholder on it has resolved.
            let mut drop_line = false;
            for caps in self.re.captures_iter(line) {
                let Some(path) = caps.get(1) else {
                    continue;
                };
                if ns.lookup(path.as_str()).is_some() {
                    continue;
                }
                if caps.get(2).is_none() {
                    return Err(RenderError::Unresolved {
                        path: path.as_str().to_string(),
                        line: lno,
                    });
                }
                drop_line = true;
            }
            if drop_line {
                continue;
            }

            let mut last = 0;
            for caps in self.re.captures_iter(line) {
                let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let path = path.as_str();
                let value = ns.lookup(path).ok_or_else(|| RenderError::Unresolved {
                    path: path.to_string(),
                    line: lno,
                })?;

                out.push_str(&line[last..whole.start()]);
                out.push_str(&to_flow(value).map_err(|source| RenderError::Encode {
                    path: path.to_string(),
                    source,
                })?);
                last = whole.end();
            }
            out.push_str(&line[last..]);
        }

        Ok(out)
    }
}

/// Single-line JSON with `", "` and `": "` separators; a valid YAML flow node.
fn to_flow(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, FlowFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

struct FlowFormatter;

impl serde_json::ser::Formatter for FlowFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            return Ok(());
        }
        writer.write_all(b", ")
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            return Ok(());
        }
        writer.write_all(b", ")
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    /// serde_json leaves DEL, C1 controls, the BOM and noncharacters raw. YAML
    /// rejects some of those and folds NEL and the Unicode line/paragraph
    /// separators as line breaks, so they are written escaped.
    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if yaml_unprintable(ch) {
                writer.write_all(fragment[start..idx].as_bytes())?;
                write!(writer, "\\u{:04X}", ch as u32)?;
                start = idx + ch.len_utf8();
            }
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

fn yaml_unprintable(ch: char) -> bool {
    matches!(
        ch,
        '\u{7F}'..='\u{9F}' | '\u{2028}' | '\u{2029}' | '\u{FEFF}' | '\u{FFFE}' | '\u{FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::parse_rendered;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn namespace(v: serde_json::Value) -> Namespace {
        let mut ns = Namespace::new();
        if let serde_json::Value::Object(map) = v {
            ns.merge(map).unwrap();
        }
        ns
    }

    #[test]
    fn substitutes_flow_values() {
        let tpl = Template::new("a: {{ properties.datetime }}\nb: {{lineage}}\n").unwrap();
        let ns = namespace(json!({
            "properties": {"datetime": "2013-04-17T23:52:18Z"},
            "lineage": {"nbar": ["id1", "id2"]},
        }));
        assert_eq!(
            tpl.render(&ns).unwrap(),
            "a: \"2013-04-17T23:52:18Z\"\nb: {\"nbar\": [\"id1\", \"id2\"]}\n"
        );
    }

    #[test]
    fn unresolved_placeholder_names_path_and_line() {
        let tpl = Template::new("x: 1\ngeometry: {{ geometry }}\n").unwrap();
        let err = tpl.render(&Namespace::new()).unwrap_err();
        match err {
            RenderError::Unresolved { path, line } => {
                assert_eq!(path, "geometry");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_placeholder_drops_line() {
        let tpl = Template::new("$schema: eo3\ngeometry: {{ geometry? }}\nlineage: {{ lineage }}\n").unwrap();
        let ns = namespace(json!({"lineage": {}}));
        assert_eq!(tpl.render(&ns).unwrap(), "$schema: eo3\nlineage: {}\n");

        let ns = namespace(json!({"lineage": {}, "geometry": {"type": "Point", "coordinates": [1.5, 2]}}));
        assert_eq!(
            tpl.render(&ns).unwrap(),
            "$schema: eo3\ngeometry: {\"coordinates\": [1.5, 2], \"type\": \"Point\"}\nlineage: {}\n"
        );
    }

    #[test]
    fn malformed_placeholder_is_rejected() {
        let err = Template::new("ok: 1\nbad: {{ not a path }}\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn lists_placeholders() {
        let tpl = Template::new("a: {{ x.y }}\nb: {{ z? }}\n").unwrap();
        assert_eq!(
            tpl.placeholders(),
            vec![
                Placeholder { path: "x.y".into(), optional: false, line: 1 },
                Placeholder { path: "z".into(), optional: true, line: 2 },
            ]
        );
    }

    #[test]
    fn render_then_parse_round_trips_values() {
        let ns = namespace(json!({
            "geometry": {"type": "Polygon", "coordinates": [[[1.0, 2.0], [1.0, 4.0], [3.0, 4.0], [1.0, 2.0]]]},
            "measurements": {"blue": {"path": "b2.tif", "band": 1, "layer": null, "grid": "default"}},
            "properties": {"datetime": "2013-04-17T23:52:18Z", "odc:creation_datetime": "2018-05-01T10:11:12Z"},
            "lineage": {"nbar": ["id1", "id2"], "pq": ["id3"]},
        }));
        let tpl = Template::new(
            "geometry: {{ geometry }}\nmeasurements: {{ measurements }}\nproperties:\n  datetime: {{ properties.datetime }}\n  odc:creation_datetime: {{ properties.odc:creation_datetime }}\nlineage: {{ lineage }}\n",
        )
        .unwrap();

        let parsed = parse_rendered(&tpl.render(&ns).unwrap()).unwrap();
        assert_eq!(parsed, ns.into_value());
    }

    #[test]
    fn required_placeholder_on_dropped_line_still_fails() {
        let tpl = Template::new("pair: [{{ geometry? }}, {{ properties.datetime }}]\n").unwrap();
        match tpl.render(&Namespace::new()).unwrap_err() {
            RenderError::Unresolved { path, line } => {
                assert_eq!(path, "properties.datetime");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        // With the required value present the optional one still drops the line.
        let ns = namespace(json!({"properties": {"datetime": "t"}}));
        assert_eq!(tpl.render(&ns).unwrap(), "");
    }

    #[test]
    fn control_characters_survive_render_and_parse() {
        let ns = namespace(json!({
            "measurements": {"blue": {"path": "b\u{7f}2\u{85}\u{9f}\u{2028}.tif", "grid": "\u{feff}ir"}},
        }));
        let tpl = Template::new("measurements: {{ measurements }}\n").unwrap();

        let rendered = tpl.render(&ns).unwrap();
        assert!(rendered.contains("\\u007F"));
        assert!(rendered.contains("\\u009F"));
        assert!(rendered.contains("\\uFEFF"));

        let parsed = parse_rendered(&rendered).unwrap();
        assert_eq!(parsed, ns.into_value());
    }
}
