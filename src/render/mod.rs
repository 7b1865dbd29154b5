//! Streaming Serializer
//!
//! Depth-first, single-pass rendering of a node tree to a byte sink. No
//! intermediate tree copy is made; escaping, numeric formatting and
//! structured-payload encoding all stream straight into the sink. Partial
//! output written before an error stays written - the sink is a stream,
//! not a transaction.
//!
//! Validation failures split two ways: a bad tag name or guarded script
//! content aborts the render with an error, while bad attribute/class
//! names are the caller's mistake on a single entry and are skipped.

mod escape;

use std::io::{self, Write};
use std::mem;

use thiserror::Error;

use crate::node::{AttrMap, ClassMap, Node, FLAG_UNSAFE_SCRIPT, FLAG_VOID};
use crate::value::Repr;

pub(crate) use escape::write_escaped;

/// Errors surfaced by a render call.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The tag name failed validation.
    #[error("invalid tag: {0:?}")]
    InvalidTag(String),
    /// A `script` element has content but the unsafe-script flag was not
    /// set. This guard stops accidental unescaped script injection.
    #[error("script tags are not allowed to have content; use unsafe_script to bypass this error")]
    ScriptContent,
    /// A structured payload failed to encode.
    #[error("value encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    /// The sink reported a write error.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl<'a> Node<'a> {
    /// Write the HTML representation of the node to `w`.
    ///
    /// A render override, if set, replaces this entirely. Otherwise any
    /// postponed modifiers run first (once), then the element is emitted:
    /// `<tag`, the class attribute, attributes in insertion order, then
    /// either `/>` for void elements or `>` content `</tag>`.
    pub fn render(&mut self, w: &mut dyn io::Write) -> Result<(), RenderError> {
        if let Some(f) = self.write_fn {
            return f(self, w);
        }
        for m in mem::take(&mut self.postponed) {
            m(self);
        }
        if !valid_tag(self.tag) {
            return Err(RenderError::InvalidTag(self.tag.to_string()));
        }

        w.write_all(b"<")?;
        w.write_all(self.tag.as_bytes())?;
        if self.class.has_active() {
            write_class(w, &self.class)?;
        }
        if !self.attrs.is_empty() {
            write_attrs(w, &self.attrs)?;
        }
        if self.flags & FLAG_VOID != 0 {
            // queued content on a void element is never visited
            w.write_all(b"/>")?;
            return Ok(());
        }
        w.write_all(b">")?;
        if !self.content.is_empty() {
            if self.flags & FLAG_UNSAFE_SCRIPT == 0 && is_script_tag(self.tag) {
                return Err(RenderError::ScriptContent);
            }
            for child in self.content.iter_mut().flatten() {
                child.render(w)?;
            }
        }
        w.write_all(b"</")?;
        w.write_all(self.tag.as_bytes())?;
        w.write_all(b">")?;
        Ok(())
    }
}

fn write_class(w: &mut dyn io::Write, class: &ClassMap<'_>) -> Result<(), RenderError> {
    w.write_all(b" class=\"")?;
    let mut first = true;
    for e in &class.entries {
        if !e.active || !valid_class(e.name) {
            continue;
        }
        if !first {
            w.write_all(b" ")?;
        }
        w.write_all(e.name.as_bytes())?;
        first = false;
    }
    w.write_all(b"\"")?;
    Ok(())
}

fn write_attrs(w: &mut dyn io::Write, attrs: &AttrMap<'_>) -> Result<(), RenderError> {
    for e in &attrs.entries {
        if !e.value.is_set() || !valid_attr(e.name) {
            continue;
        }
        let repr = e.value.repr();
        if matches!(repr, Repr::Bool(false)) {
            // present for lookups, absent in output
            continue;
        }

        w.write_all(b" ")?;
        w.write_all(e.name.as_bytes())?;

        if matches!(repr, Repr::Bool(true)) {
            continue; // bare name, no value
        }

        w.write_all(b"=\"")?;
        write_value(w, repr)?;
        w.write_all(b"\"")?;
    }
    Ok(())
}

fn write_value(w: &mut dyn io::Write, repr: Repr<'_>) -> Result<(), RenderError> {
    match repr {
        Repr::Str(s) => write_escaped(w, s.as_bytes())?,
        Repr::Bytes(b) => write_escaped(w, b)?,
        Repr::Int(v) => escape::write_int(w, v)?,
        Repr::Uint(v) => escape::write_uint(w, v)?,
        Repr::Float(v) => escape::write_float(w, v)?,
        Repr::Json(v) => serde_json::to_writer(escape::Escaper::new(w), v)?,
        Repr::Any(d) => {
            let mut esc = escape::Escaper::new(w);
            write!(esc, "{d}")?;
        }
        Repr::None | Repr::Bool(_) => {}
    }
    Ok(())
}

/// Render override for group nodes: children concatenated, no wrapper tag.
pub(crate) fn render_group<'a>(n: &mut Node<'a>, w: &mut dyn io::Write) -> Result<(), RenderError> {
    for child in n.content.iter_mut().flatten() {
        child.render(w)?;
    }
    Ok(())
}

/// Render override for raw nodes: payload bytes written verbatim.
pub(crate) fn render_raw<'a>(n: &mut Node<'a>, w: &mut dyn io::Write) -> Result<(), RenderError> {
    match n.value.repr() {
        Repr::Str(s) => w.write_all(s.as_bytes())?,
        Repr::Bytes(b) => w.write_all(b)?,
        _ => {}
    }
    Ok(())
}

const TRUE_VALUE: &[u8] = b"true";
const FALSE_VALUE: &[u8] = b"false";

/// Render override for text nodes: payload escaped per kind.
pub(crate) fn render_text<'a>(n: &mut Node<'a>, w: &mut dyn io::Write) -> Result<(), RenderError> {
    match n.value.repr() {
        Repr::None => {}
        Repr::Bool(v) => w.write_all(if v { TRUE_VALUE } else { FALSE_VALUE })?,
        Repr::Int(v) => escape::write_int(w, v)?,
        Repr::Uint(v) => escape::write_uint(w, v)?,
        Repr::Float(v) => escape::write_float(w, v)?,
        Repr::Str(s) => write_escaped(w, s.as_bytes())?,
        Repr::Bytes(b) => write_escaped(w, b)?,
        Repr::Json(v) => serde_json::to_writer(escape::Escaper::new(w), v)?,
        Repr::Any(d) => {
            let mut esc = escape::Escaper::new(w);
            write!(esc, "{d}")?;
        }
    }
    Ok(())
}

/// Check if the string is a valid HTML tag name: ASCII letters, digits,
/// underscore and hyphen, starting with a letter.
pub fn valid_tag(tag: &str) -> bool {
    let bytes = tag.as_bytes();
    let Some(&first) = bytes.first() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && bytes
            .iter()
            .all(|&c| c.is_ascii_alphanumeric() || c == b'_' || c == b'-')
}

/// Check if the string is a valid HTML attribute name: must not contain
/// `" < > # & ' \ =` or a space, and must not start with a digit or hyphen.
pub fn valid_attr(attr: &str) -> bool {
    let bytes = attr.as_bytes();
    let Some(&first) = bytes.first() else {
        return false;
    };
    if first.is_ascii_digit() || first == b'-' {
        return false;
    }
    !bytes
        .iter()
        .any(|&c| matches!(c, b'"' | b'<' | b'>' | b'#' | b' ' | b'&' | b'\'' | b'\\' | b'='))
}

/// Check if the string is usable as a CSS class token in output. Tokens
/// containing quote characters are skipped at render time.
pub fn valid_class(class: &str) -> bool {
    !class.is_empty() && !class.bytes().any(|c| c == b'"' || c == b'\'')
}

#[inline]
fn is_script_tag(tag: &str) -> bool {
    tag.len() == 6
        && tag
            .as_bytes()
            .iter()
            .zip(b"script")
            .all(|(&a, &b)| (a | 0x20) == b)
}
