//! Ordered Class Set
//!
//! Insertion-ordered set of class tokens with an active flag per slot and a
//! token->slot index for O(1) toggles. Removing a token deactivates its slot
//! instead of deleting it, so re-adding the token later restores the
//! original position rather than appending a duplicate.

use std::collections::HashMap;

pub(crate) struct ClassEntry<'a> {
    pub(crate) name: &'a str,
    pub(crate) active: bool,
}

pub(crate) struct ClassMap<'a> {
    pub(crate) entries: Vec<ClassEntry<'a>>,
    index: HashMap<&'a str, usize>,
}

/// Token separators: ASCII space, tab, LF, CR and FF.
#[inline]
fn is_sep(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

impl<'a> ClassMap<'a> {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        ClassMap {
            entries: Vec::with_capacity(cap),
            index: HashMap::with_capacity(cap),
        }
    }

    /// Clear all slots and the index, keeping the allocations.
    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Reallocate smaller when the set has grown unusually large.
    pub(crate) fn shrink_if_oversized(&mut self, max: usize, to: usize) {
        if self.entries.capacity() > max {
            self.entries = Vec::with_capacity(to);
            self.index = HashMap::with_capacity(to);
        }
    }

    /// True if at least one token is active.
    pub(crate) fn has_active(&self) -> bool {
        self.entries.iter().any(|e| e.active)
    }

    /// Tokenize `s` on ASCII whitespace and set each token to `active`.
    /// Runs of separators collapse; leading/trailing whitespace is ignored.
    pub(crate) fn set_multi(&mut self, s: &'a str, active: bool) {
        let bytes = s.as_bytes();
        let mut start = None;
        for (i, &b) in bytes.iter().enumerate() {
            if !is_sep(b) {
                if start.is_none() {
                    start = Some(i);
                }
            } else if let Some(from) = start.take() {
                self.set_one(&s[from..i], active);
            }
        }
        if let Some(from) = start {
            self.set_one(&s[from..], active);
        }
    }

    /// Toggle a single token. Unknown tokens are appended only when
    /// activating; deactivating an unknown token is a no-op.
    pub(crate) fn set_one(&mut self, name: &'a str, active: bool) {
        if let Some(&idx) = self.index.get(name) {
            self.entries[idx].active = active;
            return;
        }
        if !active {
            return;
        }
        let idx = self.entries.len();
        self.entries.push(ClassEntry { name, active: true });
        self.index.insert(name, idx);
    }

    /// Deactivate `name`, reporting whether it was active.
    pub(crate) fn extract(&mut self, name: &str) -> bool {
        if let Some(&idx) = self.index.get(name) {
            if self.entries[idx].active {
                self.entries[idx].active = false;
                return true;
            }
        }
        false
    }

    pub(crate) fn has_any(&self, names: &[&str]) -> bool {
        names
            .iter()
            .any(|name| matches!(self.index.get(name), Some(&idx) if self.entries[idx].active))
    }

    pub(crate) fn has_all(&self, names: &[&str]) -> bool {
        names
            .iter()
            .all(|name| matches!(self.index.get(name), Some(&idx) if self.entries[idx].active))
    }

    pub(crate) fn has_prefix(&self, prefix: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.active && e.name.starts_with(prefix))
    }

    pub(crate) fn has_suffix(&self, suffix: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.active && e.name.ends_with(suffix))
    }

    /// Visit active tokens in insertion order. Stops early when `f`
    /// returns false.
    pub(crate) fn each(&self, mut f: impl FnMut(&'a str) -> bool) {
        for e in &self.entries {
            if e.active && !f(e.name) {
                return;
            }
        }
    }

    /// Copy active tokens matching any of `prefixes` into `dst`, keeping
    /// their relative order.
    pub(crate) fn copy_prefix_to(&self, dst: &mut ClassMap<'a>, prefixes: &[&str]) {
        for e in &self.entries {
            if e.active && prefixes.iter().any(|p| e.name.starts_with(p)) {
                dst.set_one(e.name, true);
            }
        }
    }

    /// Move active tokens matching any of `prefixes` into `dst`.
    pub(crate) fn move_prefix_to(&mut self, dst: &mut ClassMap<'a>, prefixes: &[&str]) {
        for e in self.entries.iter_mut() {
            if e.active && prefixes.iter().any(|p| e.name.starts_with(p)) {
                dst.set_one(e.name, true);
                e.active = false;
            }
        }
    }

    /// Copy active tokens matching any of `suffixes` into `dst`.
    pub(crate) fn copy_suffix_to(&self, dst: &mut ClassMap<'a>, suffixes: &[&str]) {
        for e in &self.entries {
            if e.active && suffixes.iter().any(|s| e.name.ends_with(s)) {
                dst.set_one(e.name, true);
            }
        }
    }

    /// Move active tokens matching any of `suffixes` into `dst`.
    pub(crate) fn move_suffix_to(&mut self, dst: &mut ClassMap<'a>, suffixes: &[&str]) {
        for e in self.entries.iter_mut() {
            if e.active && suffixes.iter().any(|s| e.name.ends_with(s)) {
                dst.set_one(e.name, true);
                e.active = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active<'a>(m: &ClassMap<'a>) -> Vec<&'a str> {
        let mut out = Vec::new();
        m.each(|name| {
            out.push(name);
            true
        });
        out
    }

    #[test]
    fn test_tokenizer_collapses_whitespace() {
        let mut m = ClassMap::with_capacity(8);
        m.set_multi("  a \t b\n\nc  ", true);
        assert_eq!(active(&m), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_no_duplicate_slots() {
        let mut m = ClassMap::with_capacity(8);
        m.set_multi("a b a", true);
        assert_eq!(active(&m), vec!["a", "b"]);
    }

    #[test]
    fn test_reactivation_keeps_original_position() {
        let mut m = ClassMap::with_capacity(8);
        m.set_multi("a b c", true);
        m.set_one("a", false);
        m.set_one("a", true);
        assert_eq!(active(&m), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_then_re_add_later_token() {
        let mut m = ClassMap::with_capacity(8);
        m.set_multi("a b c", true);
        m.set_multi("a", false);
        m.set_multi("c", true);
        assert_eq!(active(&m), vec!["b", "c"]);
    }

    #[test]
    fn test_deactivating_unknown_is_noop() {
        let mut m = ClassMap::with_capacity(8);
        m.set_one("nope", false);
        assert!(!m.has_active());
        assert!(m.entries.is_empty());
    }

    #[test]
    fn test_queries() {
        let mut m = ClassMap::with_capacity(8);
        m.set_multi("btn btn-lg text-sm", true);
        m.set_one("btn-lg", false);
        assert!(m.has_any(&["missing", "btn"]));
        assert!(!m.has_any(&["btn-lg"]));
        assert!(m.has_all(&["btn", "text-sm"]));
        assert!(!m.has_all(&["btn", "btn-lg"]));
        assert!(m.has_prefix("text-"));
        assert!(m.has_suffix("-sm"));
        assert!(!m.has_prefix("btn-"));
    }

    #[test]
    fn test_extract() {
        let mut m = ClassMap::with_capacity(8);
        m.set_multi("a b", true);
        assert!(m.extract("a"));
        assert!(!m.extract("a"));
        assert!(!m.extract("missing"));
        assert_eq!(active(&m), vec!["b"]);
    }

    #[test]
    fn test_move_prefix_preserves_relative_order() {
        let mut src = ClassMap::with_capacity(8);
        let mut dst = ClassMap::with_capacity(8);
        src.set_multi("a x:1 y:2 x:3 z", true);

        src.move_prefix_to(&mut dst, &["x:", "y:"]);

        assert_eq!(active(&src), vec!["a", "z"]);
        assert_eq!(active(&dst), vec!["x:1", "y:2", "x:3"]);
    }

    #[test]
    fn test_copy_suffix_leaves_source_intact() {
        let mut src = ClassMap::with_capacity(8);
        let mut dst = ClassMap::with_capacity(8);
        src.set_multi("big-end small-end mid", true);

        src.copy_suffix_to(&mut dst, &["-end"]);

        assert_eq!(active(&src), vec!["big-end", "small-end", "mid"]);
        assert_eq!(active(&dst), vec!["big-end", "small-end"]);
    }
}
