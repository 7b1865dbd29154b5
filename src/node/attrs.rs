//! Ordered Attribute Table
//!
//! Insertion-ordered mapping from attribute name to [`Value`]. Removal
//! tombstones the entry (value set to unset) instead of compacting, so an
//! attribute keeps its original position across set/remove cycles. The
//! serializer walks the table in order and skips tombstones.

use crate::value::Value;

pub(crate) struct AttrEntry<'a> {
    pub(crate) name: &'a str,
    pub(crate) value: Value<'a>,
}

pub(crate) struct AttrMap<'a> {
    pub(crate) entries: Vec<AttrEntry<'a>>,
}

impl<'a> AttrMap<'a> {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        AttrMap { entries: Vec::with_capacity(cap) }
    }

    /// Clear all entries, keeping the allocation.
    pub(crate) fn reset(&mut self) {
        self.entries.clear();
    }

    /// Reallocate smaller when the table has grown unusually large.
    pub(crate) fn shrink_if_oversized(&mut self, max: usize, to: usize) {
        if self.entries.capacity() > max {
            self.entries = Vec::with_capacity(to);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set `name` to `v`. An existing entry is updated in place, keeping
    /// its position; setting unset on an existing entry tombstones it.
    /// Unset values and empty names never create new entries.
    pub(crate) fn set(&mut self, name: &'a str, v: Value<'a>) {
        if name.is_empty() {
            return;
        }
        for e in self.entries.iter_mut() {
            if e.name == name {
                e.value = v;
                return;
            }
        }
        if !v.is_set() {
            return;
        }
        self.entries.push(AttrEntry { name, value: v });
    }

    /// Get the value for `name`. A tombstoned entry reports its (unset)
    /// value with `found = true`; a missing name is `(UNSET, false)`.
    pub(crate) fn get(&self, name: &str) -> (Value<'a>, bool) {
        for e in &self.entries {
            if e.name == name {
                return (e.value, true);
            }
        }
        (Value::UNSET, false)
    }

    fn find_active(&self, name: &str) -> Option<usize> {
        for (i, e) in self.entries.iter().enumerate() {
            if e.name == name {
                return if e.value.is_set() { Some(i) } else { None };
            }
        }
        None
    }

    pub(crate) fn has_any(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.find_active(name).is_some())
    }

    pub(crate) fn has_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.find_active(name).is_some())
    }

    pub(crate) fn has_prefix(&self, prefix: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.value.is_set() && e.name.starts_with(prefix))
    }

    pub(crate) fn has_suffix(&self, suffix: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.value.is_set() && e.name.ends_with(suffix))
    }

    /// Visit present entries in insertion order. Stops early when `f`
    /// returns false.
    pub(crate) fn each(&self, mut f: impl FnMut(&'a str, Value<'a>) -> bool) {
        for e in &self.entries {
            if e.value.is_set() && !f(e.name, e.value) {
                return;
            }
        }
    }

    /// Tombstone `name` and return its previous value. Tombstoned and
    /// missing entries yield `(UNSET, false)`.
    pub(crate) fn extract(&mut self, name: &str) -> (Value<'a>, bool) {
        for e in self.entries.iter_mut() {
            if e.name != name {
                continue;
            }
            if !e.value.is_set() {
                return (Value::UNSET, false);
            }
            let v = e.value;
            e.value = Value::UNSET;
            return (v, true);
        }
        (Value::UNSET, false)
    }

    /// Move every present entry whose name starts with `prefix` into `dst`,
    /// appending in original relative order and tombstoning the source.
    pub(crate) fn move_prefix_to(&mut self, dst: &mut AttrMap<'a>, prefix: &str) {
        for e in self.entries.iter_mut() {
            if e.value.is_set() && e.name.starts_with(prefix) {
                dst.set(e.name, e.value);
                e.value = Value::UNSET;
            }
        }
    }

    /// Move every present entry whose name ends with `suffix` into `dst`.
    pub(crate) fn move_suffix_to(&mut self, dst: &mut AttrMap<'a>, suffix: &str) {
        for e in self.entries.iter_mut() {
            if e.value.is_set() && e.name.ends_with(suffix) {
                dst.set(e.name, e.value);
                e.value = Value::UNSET;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(m: &AttrMap<'a>) -> Vec<&'a str> {
        let mut out = Vec::new();
        m.each(|name, _| {
            out.push(name);
            true
        });
        out
    }

    #[test]
    fn test_set_keeps_insertion_order() {
        let mut m = AttrMap::with_capacity(4);
        m.set("a", Value::str("1"));
        m.set("b", Value::str("2"));
        m.set("a", Value::str("3")); // update in place
        assert_eq!(names(&m), vec!["a", "b"]);
        assert_eq!(m.get("a").0.as_str(), Some("3"));
    }

    #[test]
    fn test_tombstone_preserves_position() {
        let mut m = AttrMap::with_capacity(4);
        m.set("a", Value::str("1"));
        m.set("b", Value::str("2"));
        m.set("c", Value::str("3"));
        m.set("b", Value::UNSET);
        assert_eq!(names(&m), vec!["a", "c"]);
        // re-setting revives the original slot
        m.set("b", Value::str("4"));
        assert_eq!(names(&m), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unset_never_creates_entries() {
        let mut m = AttrMap::with_capacity(4);
        m.set("a", Value::UNSET);
        m.set("", Value::str("x"));
        assert!(m.is_empty());
    }

    #[test]
    fn test_bool_false_is_present_for_lookup() {
        let mut m = AttrMap::with_capacity(4);
        m.set("disabled", Value::bool(false));
        let (v, found) = m.get("disabled");
        assert!(found);
        assert!(v.is_set());
        assert_eq!(v.as_bool(), Some(false));
        assert!(m.has_any(&["disabled"]));
    }

    #[test]
    fn test_has_any_all_prefix_suffix() {
        let mut m = AttrMap::with_capacity(4);
        m.set("data-x", Value::str("1"));
        m.set("role", Value::str("nav"));
        m.set("gone", Value::str("1"));
        m.set("gone", Value::UNSET);
        assert!(m.has_any(&["missing", "role"]));
        assert!(!m.has_any(&["gone"]));
        assert!(m.has_all(&["data-x", "role"]));
        assert!(!m.has_all(&["data-x", "gone"]));
        assert!(m.has_prefix("data-"));
        assert!(m.has_suffix("-x"));
        assert!(!m.has_prefix("xyz"));
    }

    #[test]
    fn test_extract() {
        let mut m = AttrMap::with_capacity(4);
        m.set("a", Value::str("1"));
        let (v, ok) = m.extract("a");
        assert!(ok);
        assert_eq!(v.as_str(), Some("1"));
        let (_, ok) = m.extract("a");
        assert!(!ok);
        assert!(!m.has_any(&["a"]));
    }

    #[test]
    fn test_move_prefix_keeps_relative_order() {
        let mut src = AttrMap::with_capacity(8);
        let mut dst = AttrMap::with_capacity(8);
        src.set("data-a", Value::str("1"));
        src.set("x-a", Value::str("2"));
        src.set("data-b", Value::str("3"));
        dst.set("id", Value::str("d"));

        src.move_prefix_to(&mut dst, "data-");

        assert_eq!(names(&src), vec!["x-a"]);
        assert_eq!(names(&dst), vec!["id", "data-a", "data-b"]);
        assert_eq!(dst.get("data-b").0.as_str(), Some("3"));
    }

    #[test]
    fn test_move_suffix_skips_tombstones() {
        let mut src = AttrMap::with_capacity(8);
        let mut dst = AttrMap::with_capacity(8);
        src.set("a-end", Value::str("1"));
        src.set("b-end", Value::str("2"));
        src.set("a-end", Value::UNSET);

        src.move_suffix_to(&mut dst, "-end");

        assert_eq!(names(&dst), vec!["b-end"]);
    }
}
