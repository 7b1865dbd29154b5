//! HTML Escaping and Numeric Output
//!
//! The escape transform is a single streaming pass: clean runs between
//! special characters are written straight from the input slice, so input
//! with no special characters costs one scan and one write. Integer output
//! goes through a stack buffer (no locale, no allocation); floats use the
//! shortest round-trippable decimal form.

use memchr::{memchr2, memchr3};
use std::io::{self, Write};

const ESC_QUOT: &[u8] = b"&#34;";
const ESC_APOS: &[u8] = b"&#39;";
const ESC_LT: &[u8] = b"&lt;";
const ESC_GT: &[u8] = b"&gt;";
const ESC_AMP: &[u8] = b"&amp;";

/// Position of the next byte that needs escaping.
#[inline]
fn find_special(p: &[u8]) -> Option<usize> {
    match (memchr3(b'"', b'\'', b'<', p), memchr2(b'>', b'&', p)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Write `p` to `w`, escaping `"` `'` `<` `>` `&`. All other bytes pass
/// through unchanged.
pub(crate) fn write_escaped(w: &mut dyn io::Write, p: &[u8]) -> io::Result<()> {
    let mut rest = p;
    while let Some(i) = find_special(rest) {
        if i > 0 {
            w.write_all(&rest[..i])?;
        }
        let esc = match rest[i] {
            b'"' => ESC_QUOT,
            b'\'' => ESC_APOS,
            b'<' => ESC_LT,
            b'>' => ESC_GT,
            _ => ESC_AMP,
        };
        w.write_all(esc)?;
        rest = &rest[i + 1..];
    }
    if !rest.is_empty() {
        w.write_all(rest)?;
    }
    Ok(())
}

/// An `io::Write` adapter that escapes everything written through it.
/// Used to stream encoder output (JSON, `Display`) without an
/// intermediate buffer.
pub(crate) struct Escaper<'w> {
    inner: &'w mut dyn io::Write,
}

impl<'w> Escaper<'w> {
    pub(crate) fn new(inner: &'w mut dyn io::Write) -> Self {
        Escaper { inner }
    }
}

impl io::Write for Escaper<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        write_escaped(self.inner, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Write a signed integer as minimal decimal digits.
pub(crate) fn write_int(w: &mut dyn io::Write, n: i64) -> io::Result<()> {
    let mut buf = [0u8; 20]; // 19 digits + sign
    let mut i = buf.len();
    let mut u = n.unsigned_abs();
    if u == 0 {
        i -= 1;
        buf[i] = b'0';
    } else {
        while u > 0 {
            i -= 1;
            buf[i] = b'0' + (u % 10) as u8;
            u /= 10;
        }
    }
    if n < 0 {
        i -= 1;
        buf[i] = b'-';
    }
    w.write_all(&buf[i..])
}

/// Write an unsigned integer as minimal decimal digits.
pub(crate) fn write_uint(w: &mut dyn io::Write, mut n: u64) -> io::Result<()> {
    let mut buf = [0u8; 20]; // u64 max is 20 digits
    let mut i = buf.len();
    if n == 0 {
        i -= 1;
        buf[i] = b'0';
    } else {
        while n > 0 {
            i -= 1;
            buf[i] = b'0' + (n % 10) as u8;
            n /= 10;
        }
    }
    w.write_all(&buf[i..])
}

/// Write a float in its shortest round-trippable decimal form.
pub(crate) fn write_float(w: &mut dyn io::Write, f: f64) -> io::Result<()> {
    write!(w, "{f}")
}
