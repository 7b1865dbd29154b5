//! Markup Tree Nodes
//!
//! A [`Node`] is either a normal element (tag, attributes, classes,
//! children) or a special rendering node (text, raw, group) identified by a
//! reserved tag sentinel and a render override. Nodes are pooled: unless
//! marked as owned, a node and its subtree must be returned via
//! [`Node::release`] once rendered.
//!
//! Customization happens through modifier closures applied in order, not
//! through inheritance: every builder takes a list of [`Mod`]s and later
//! modifiers can override earlier ones.

mod attrs;
mod class;

pub(crate) use attrs::AttrMap;
pub(crate) use class::ClassMap;

use std::io;
use std::mem;
use std::sync::atomic::AtomicBool;

use crate::pool::{self, Pool};
use crate::render::RenderError;
use crate::value::Value;

/// A child position in a node's content. `None` entries come from
/// conditional builders and are skipped everywhere.
pub type Child<'a> = Option<Box<Node<'a>>>;

/// A modifier closure. Builders apply modifiers in order; application order
/// is significant and preserved exactly.
pub type Mod<'a> = Box<dyn FnOnce(&mut Node<'a>) + 'a>;

/// A render override. Replaces the default serialization of the node it is
/// set on; state for custom renderers travels through node variables.
pub type RenderFn<'a> = fn(&mut Node<'a>, &mut dyn io::Write) -> Result<(), RenderError>;

pub(crate) const FLAG_VOID: u8 = 1 << 0;
pub(crate) const FLAG_OWNED: u8 = 1 << 1;
pub(crate) const FLAG_UNSAFE_SCRIPT: u8 = 1 << 2;

/// Tag a recycled node resets to.
pub(crate) const TAG_DEFAULT: &str = "div";
/// Reserved sentinel tags for special nodes.
pub(crate) const TAG_TEXT: &str = "$text";
pub(crate) const TAG_RAW: &str = "$raw";
pub(crate) const TAG_GROUP: &str = "$group";

pub(crate) struct VarEntry<'a> {
    pub(crate) name: &'a str,
    pub(crate) value: Value<'a>,
}

pub(crate) struct SlotEntry<'a> {
    pub(crate) name: &'a str,
    pub(crate) content: Vec<Child<'a>>,
}

/// An HTML element or a special rendering node (text/raw/group).
pub struct Node<'a> {
    pub(crate) tag: &'a str,
    pub(crate) flags: u8,

    pub(crate) attrs: AttrMap<'a>,
    pub(crate) class: ClassMap<'a>,
    pub(crate) vars: Vec<VarEntry<'a>>,

    pub(crate) content: Vec<Child<'a>>,
    pub(crate) slots: Vec<SlotEntry<'a>>,

    pub(crate) postponed: Vec<Mod<'a>>,

    pub(crate) write_fn: Option<RenderFn<'a>>,

    pub(crate) value: Value<'a>,

    pub(crate) attached: Vec<Box<Node<'a>>>,
    pub(crate) pool: &'static Pool,
    pub(crate) acquired: AtomicBool,
}

/// Element names that are always void, regardless of the requested flag.
fn is_always_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

impl<'a> Node<'a> {
    pub(crate) fn fresh(pool: &'static Pool, prealloc: bool) -> Self {
        Node {
            tag: TAG_DEFAULT,
            flags: 0,
            attrs: AttrMap::with_capacity(8),
            class: ClassMap::with_capacity(16),
            vars: if prealloc { Vec::with_capacity(4) } else { Vec::new() },
            content: if prealloc { Vec::with_capacity(16) } else { Vec::new() },
            slots: if prealloc { Vec::with_capacity(4) } else { Vec::new() },
            postponed: Vec::new(),
            write_fn: None,
            value: Value::UNSET,
            attached: Vec::new(),
            pool,
            acquired: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Modifiers
    // ------------------------------------------------------------------

    /// Apply modifiers to the node, in order.
    pub fn apply(&mut self, mods: Vec<Mod<'a>>) -> &mut Self {
        for m in mods {
            m(self);
        }
        self
    }

    /// Run `f` on the node when `cond` is true.
    pub fn apply_if(&mut self, cond: bool, f: impl FnOnce(&mut Node<'a>)) -> &mut Self {
        if cond {
            f(self);
        }
        self
    }

    /// Queue modifiers to run once, immediately before this node is
    /// serialized. This is the hook for decisions that must resolve lazily.
    pub fn postpone(&mut self, mods: Vec<Mod<'a>>) -> &mut Self {
        self.postponed.extend(mods);
        self
    }

    // ------------------------------------------------------------------
    // Tag
    // ------------------------------------------------------------------

    /// The current tag name.
    pub fn tag_name(&self) -> &'a str {
        self.tag
    }

    /// True if the element renders self-closing with no content.
    pub fn is_void(&self) -> bool {
        self.flags & FLAG_VOID != 0
    }

    /// Set the tag name. Known void element names force the void flag.
    pub fn set_tag(&mut self, tag: &'a str) -> &mut Self {
        self.set_tag_ex(tag, false)
    }

    /// Set the tag name and the void flag. The fixed void set (br, img,
    /// input, ...) is void no matter what; empty tags are ignored.
    pub fn set_tag_ex(&mut self, tag: &'a str, void: bool) -> &mut Self {
        if tag.is_empty() {
            return self;
        }
        self.tag = tag;
        if void || is_always_void(tag) {
            self.flags |= FLAG_VOID;
        } else {
            self.flags &= !FLAG_VOID;
        }
        self
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// The attribute value for `name`, or the unset value. Check
    /// [`Value::is_set`] for presence.
    pub fn get_attr(&self, name: &str) -> Value<'a> {
        self.attrs.get(name).0
    }

    /// Set a string attribute.
    pub fn attr(&mut self, name: &'a str, value: &'a str) -> &mut Self {
        self.attrs.set(name, Value::str(value));
        self
    }

    /// Set a boolean-presence attribute (renders as the bare name).
    /// To unset it, use `attr_bool(name, false)` or [`Node::remove_attr`].
    pub fn attr_flag(&mut self, name: &'a str) -> &mut Self {
        self.attrs.set(name, Value::bool(true));
        self
    }

    /// Set a boolean attribute. `false` stays present for lookups but
    /// renders as absent.
    pub fn attr_bool(&mut self, name: &'a str, value: bool) -> &mut Self {
        self.attrs.set(name, Value::bool(value));
        self
    }

    /// Set an attribute to a typed value. Do not use this for `class`;
    /// use [`Node::class`] instead.
    pub fn attr_value(&mut self, name: &'a str, value: Value<'a>) -> &mut Self {
        self.attrs.set(name, value);
        self
    }

    /// Tombstone the named attributes.
    pub fn remove_attr(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            // tombstone in place; position survives for later re-set
            self.attrs.extract(name);
        }
        self
    }

    /// Tombstone `name` and return its previous value.
    pub fn extract_attr(&mut self, name: &str) -> Value<'a> {
        self.attrs.extract(name).0
    }

    /// True if at least one of the named attributes is present.
    pub fn has_attr(&self, names: &[&str]) -> bool {
        self.attrs.has_any(names)
    }

    /// True if all of the named attributes are present.
    pub fn has_attr_all(&self, names: &[&str]) -> bool {
        self.attrs.has_all(names)
    }

    /// True if any present attribute name starts with `prefix`.
    pub fn has_attr_prefix(&self, prefix: &str) -> bool {
        self.attrs.has_prefix(prefix)
    }

    /// True if any present attribute name ends with `suffix`.
    pub fn has_attr_suffix(&self, suffix: &str) -> bool {
        self.attrs.has_suffix(suffix)
    }

    /// Visit present attributes in insertion order; stop early by
    /// returning false.
    pub fn each_attr(&self, f: impl FnMut(&'a str, Value<'a>) -> bool) -> &Self {
        self.attrs.each(f);
        self
    }

    /// Move the named attributes to `dst`, keeping their relative order.
    pub fn move_attr_to(&mut self, dst: &mut Node<'a>, names: &[&str]) -> &mut Self {
        for name in names {
            for e in self.attrs.entries.iter_mut() {
                if e.name == *name && e.value.is_set() {
                    let (name, value) = (e.name, e.value);
                    e.value = Value::UNSET;
                    dst.attrs.set(name, value);
                    break;
                }
            }
        }
        self
    }

    /// Move all attributes whose name starts with `prefix` to `dst`.
    pub fn move_attr_prefix_to(&mut self, dst: &mut Node<'a>, prefix: &str) -> &mut Self {
        self.attrs.move_prefix_to(&mut dst.attrs, prefix);
        self
    }

    /// Move all attributes whose name ends with `suffix` to `dst`.
    pub fn move_attr_suffix_to(&mut self, dst: &mut Node<'a>, suffix: &str) -> &mut Self {
        self.attrs.move_suffix_to(&mut dst.attrs, suffix);
        self
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    /// Add class tokens. Multiple tokens can be separated by whitespace.
    pub fn class(&mut self, tokens: &'a str) -> &mut Self {
        self.class.set_multi(tokens, true);
        self
    }

    /// Deactivate the named class tokens.
    pub fn remove_class(&mut self, names: &[&'a str]) -> &mut Self {
        for &name in names {
            self.class.set_multi(name, false);
        }
        self
    }

    /// Deactivate `name`, reporting whether it was active.
    pub fn extract_class(&mut self, name: &str) -> bool {
        self.class.extract(name)
    }

    /// True if at least one of the named tokens is active.
    pub fn has_class(&self, names: &[&str]) -> bool {
        self.class.has_any(names)
    }

    /// True if all of the named tokens are active.
    pub fn has_class_all(&self, names: &[&str]) -> bool {
        self.class.has_all(names)
    }

    /// True if any active token starts with `prefix`.
    pub fn has_class_prefix(&self, prefix: &str) -> bool {
        self.class.has_prefix(prefix)
    }

    /// True if any active token ends with `suffix`.
    pub fn has_class_suffix(&self, suffix: &str) -> bool {
        self.class.has_suffix(suffix)
    }

    /// Visit active class tokens in insertion order; stop early by
    /// returning false.
    pub fn each_class(&self, f: impl FnMut(&'a str) -> bool) -> &Self {
        self.class.each(f);
        self
    }

    /// Move the named tokens to `dst`.
    pub fn move_class_to(&mut self, dst: &mut Node<'a>, names: &[&'a str]) -> &mut Self {
        for name in names {
            if self.class.extract(name) {
                dst.class.set_one(*name, true);
            }
        }
        self
    }

    /// Copy tokens starting with any of `prefixes` to `dst`.
    pub fn copy_class_prefix_to(&self, dst: &mut Node<'a>, prefixes: &[&str]) -> &Self {
        self.class.copy_prefix_to(&mut dst.class, prefixes);
        self
    }

    /// Move tokens starting with any of `prefixes` to `dst`.
    pub fn move_class_prefix_to(&mut self, dst: &mut Node<'a>, prefixes: &[&str]) -> &mut Self {
        self.class.move_prefix_to(&mut dst.class, prefixes);
        self
    }

    /// Copy tokens ending with any of `suffixes` to `dst`.
    pub fn copy_class_suffix_to(&self, dst: &mut Node<'a>, suffixes: &[&str]) -> &Self {
        self.class.copy_suffix_to(&mut dst.class, suffixes);
        self
    }

    /// Move tokens ending with any of `suffixes` to `dst`.
    pub fn move_class_suffix_to(&mut self, dst: &mut Node<'a>, suffixes: &[&str]) -> &mut Self {
        self.class.move_suffix_to(&mut dst.class, suffixes);
        self
    }

    // ------------------------------------------------------------------
    // Variables (out-of-band metadata, never serialized)
    // ------------------------------------------------------------------

    /// The variable value for `name`, or the unset value.
    pub fn get_var(&self, name: &str) -> Value<'a> {
        for v in &self.vars {
            if v.name == name {
                return if v.value.is_set() { v.value } else { Value::UNSET };
            }
        }
        Value::UNSET
    }

    /// Attach arbitrary string user data to the node.
    pub fn set_var(&mut self, name: &'a str, value: &'a str) -> &mut Self {
        self.set_var_value(name, Value::str(value))
    }

    /// Attach arbitrary typed user data to the node. First match wins;
    /// unset values only tombstone existing entries.
    pub fn set_var_value(&mut self, name: &'a str, value: Value<'a>) -> &mut Self {
        for i in 0..self.vars.len() {
            if self.vars[i].name == name {
                self.vars[i].value = value;
                return self;
            }
        }
        if !value.is_set() {
            return self;
        }
        self.vars.push(VarEntry { name, value });
        self
    }

    /// True if at least one of the named variables is set.
    pub fn has_var(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.get_var(name).is_set())
    }

    /// True if all of the named variables are set.
    pub fn has_var_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.get_var(name).is_set())
    }

    /// Tombstone the named variables.
    pub fn remove_var(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            for v in self.vars.iter_mut() {
                if v.name == *name {
                    v.value = Value::UNSET;
                    break;
                }
            }
        }
        self
    }

    /// Move the named variables to `dst`.
    pub fn move_var_to(&mut self, dst: &mut Node<'a>, names: &[&str]) -> &mut Self {
        'names: for name in names {
            for v in self.vars.iter_mut() {
                if v.name == *name {
                    if v.value.is_set() {
                        let (name, value) = (v.name, v.value);
                        v.value = Value::UNSET;
                        dst.set_var_value(name, value);
                    }
                    continue 'names;
                }
            }
        }
        self
    }

    /// Move variables whose name starts with `prefix` to `dst`.
    pub fn move_var_prefix_to(&mut self, dst: &mut Node<'a>, prefix: &str) -> &mut Self {
        for v in self.vars.iter_mut() {
            if v.value.is_set() && v.name.starts_with(prefix) {
                let (name, value) = (v.name, v.value);
                v.value = Value::UNSET;
                dst.set_var_value(name, value);
            }
        }
        self
    }

    /// Move variables whose name ends with `suffix` to `dst`.
    pub fn move_var_suffix_to(&mut self, dst: &mut Node<'a>, suffix: &str) -> &mut Self {
        for v in self.vars.iter_mut() {
            if v.value.is_set() && v.name.ends_with(suffix) {
                let (name, value) = (v.name, v.value);
                v.value = Value::UNSET;
                dst.set_var_value(name, value);
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// True if the node has any non-nil content entry.
    pub fn has_content(&self) -> bool {
        self.content.iter().any(|c| c.is_some())
    }

    /// Add nodes to the end of the content. A batch with no non-nil entry
    /// is ignored entirely.
    pub fn append(&mut self, nodes: Vec<Child<'a>>) -> &mut Self {
        if nodes.iter().any(|n| n.is_some()) {
            self.content.extend(nodes);
        }
        self
    }

    /// Add nodes to the beginning of the content.
    pub fn prepend(&mut self, nodes: Vec<Child<'a>>) -> &mut Self {
        if nodes.iter().any(|n| n.is_some()) {
            self.content.splice(0..0, nodes);
        }
        self
    }

    /// Replace the content, releasing previously held children.
    pub fn content(&mut self, nodes: Vec<Child<'a>>) -> &mut Self {
        self.remove_content();
        self.append(nodes)
    }

    /// Replace the content with a single escaped text node.
    pub fn text(&mut self, s: &'a str) -> &mut Self {
        let t = crate::text(s);
        self.content(vec![t])
    }

    /// Replace the content with a single text node built from a value.
    pub fn text_value(&mut self, v: Value<'a>) -> &mut Self {
        let t = crate::text_value(v);
        self.content(vec![t])
    }

    /// Clear the content, recursively releasing all child nodes.
    pub fn remove_content(&mut self) -> &mut Self {
        for c in self.content.drain(..) {
            pool::release_child(c);
        }
        self
    }

    /// Detach and return the content without releasing it.
    pub fn extract_content(&mut self) -> Vec<Child<'a>> {
        mem::take(&mut self.content)
    }

    /// Move all content to `dst`; whatever `dst` held before is released.
    pub fn move_content_to(&mut self, dst: &mut Node<'a>) -> &mut Self {
        mem::swap(&mut self.content, &mut dst.content);
        self.remove_content()
    }

    /// Visit each non-nil child in order; stop early by returning false.
    pub fn each_content(&self, mut f: impl FnMut(&Node<'a>) -> bool) -> &Self {
        for c in self.content.iter().flatten() {
            if !f(c) {
                break;
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Slots (named secondary content lists; staging areas for templated
    // insertion points - the serializer does not walk them)
    // ------------------------------------------------------------------

    /// True if the named slot exists and holds content.
    pub fn has_slot(&self, name: &str) -> bool {
        self.slots
            .iter()
            .any(|s| s.name == name && !s.content.is_empty())
    }

    /// Set the content of a named slot, replacing (and releasing) whatever
    /// it held. A batch with no non-nil entry leaves the slot empty.
    pub fn slot(&mut self, name: &'a str, nodes: Vec<Child<'a>>) -> &mut Self {
        for i in 0..self.slots.len() {
            if self.slots[i].name == name {
                for c in self.slots[i].content.drain(..) {
                    pool::release_child(c);
                }
                if nodes.iter().any(|n| n.is_some()) {
                    self.slots[i].content.extend(nodes);
                }
                return self;
            }
        }
        if nodes.iter().any(|n| n.is_some()) {
            self.slots.push(SlotEntry { name, content: nodes });
        }
        self
    }

    /// Add nodes to the end of a named slot, creating it if needed.
    pub fn append_slot(&mut self, name: &'a str, nodes: Vec<Child<'a>>) -> &mut Self {
        if !nodes.iter().any(|n| n.is_some()) {
            return self;
        }
        for i in 0..self.slots.len() {
            if self.slots[i].name == name {
                self.slots[i].content.extend(nodes);
                return self;
            }
        }
        self.slots.push(SlotEntry { name, content: nodes });
        self
    }

    /// Add nodes to the beginning of a named slot, creating it if needed.
    pub fn prepend_slot(&mut self, name: &'a str, nodes: Vec<Child<'a>>) -> &mut Self {
        if !nodes.iter().any(|n| n.is_some()) {
            return self;
        }
        for i in 0..self.slots.len() {
            if self.slots[i].name == name {
                self.slots[i].content.splice(0..0, nodes);
                return self;
            }
        }
        self.slots.push(SlotEntry { name, content: nodes });
        self
    }

    /// Release the content of the named slots. The empty slot entries are
    /// kept.
    pub fn delete_slot(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            for s in self.slots.iter_mut() {
                if s.name != *name {
                    continue;
                }
                for c in s.content.drain(..) {
                    pool::release_child(c);
                }
                break;
            }
        }
        self
    }

    /// Detach and return the content of a named slot without releasing it.
    pub fn extract_slot(&mut self, name: &str) -> Vec<Child<'a>> {
        for s in self.slots.iter_mut() {
            if s.name == name {
                return mem::take(&mut s.content);
            }
        }
        Vec::new()
    }

    /// Move named slots to `dst`. If the destination already has the slot,
    /// its stale content is released and replaced; otherwise the slot is
    /// created there.
    pub fn move_slot_to(&mut self, dst: &mut Node<'a>, names: &[&str]) -> &mut Self {
        for name in names {
            let Some(si) = self.slots.iter().position(|s| s.name == *name) else {
                continue;
            };
            let src_name = self.slots[si].name;
            let src_content = mem::take(&mut self.slots[si].content);

            if let Some(di) = dst.slots.iter().position(|s| s.name == *name) {
                for c in dst.slots[di].content.drain(..) {
                    pool::release_child(c);
                }
                dst.slots[di].content.extend(src_content);
            } else {
                dst.slots.push(SlotEntry { name: src_name, content: src_content });
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Mark the node as owned: it and its subtree are excluded from the
    /// pool, and [`Node::release`] drops it by normal means instead.
    pub fn own(&mut self) -> &mut Self {
        self.flags |= FLAG_OWNED;
        self
    }

    /// True if the node has been marked as owned.
    pub fn is_owned(&self) -> bool {
        self.flags & FLAG_OWNED != 0
    }

    /// Allow a `script` element to render its content. Without this opt-in,
    /// rendering a script element with content is an error.
    pub fn unsafe_script(&mut self) -> &mut Self {
        self.flags |= FLAG_UNSAFE_SCRIPT;
        self
    }

    /// Tie another node's lifecycle to this node: it is released (or
    /// dropped, if owned) together with this node.
    pub fn attach(&mut self, node: Box<Node<'a>>) -> &mut Self {
        self.attached.push(node);
        self
    }

    /// Return the node and its subtree to the pool for reuse. Owned nodes
    /// (and owned descendants) are dropped instead of recycled.
    pub fn release(self: Box<Self>) {
        pool::release_box(self);
    }

    /// Override the default serialization of this node.
    pub fn set_write_fn(&mut self, f: RenderFn<'a>) -> &mut Self {
        self.write_fn = Some(f);
        self
    }

    /// Set the content to the globally cached render of `f`.
    pub fn static_content(&mut self, f: fn() -> Child<'a>) -> &mut Self {
        let cached = crate::cache::static_node(f);
        self.content(vec![cached])
    }

    /// Render to a string. Render errors come back as the error text.
    pub fn to_html(&mut self) -> String {
        let mut buf = Vec::with_capacity(256);
        match self.render(&mut buf) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{build, text, Pool, Value};

    #[test]
    fn test_tag_forced_void_set() {
        let mut n = Pool::global().acquire();
        n.set_tag("img");
        assert!(n.is_void());
        n.set_tag_ex("div", true);
        assert!(n.is_void());
        n.set_tag("div");
        assert!(!n.is_void());
        n.release();
    }

    #[test]
    fn test_append_ignores_all_nil_batches() {
        let mut n = build("div", vec![]);
        n.append(vec![None, None]);
        assert!(!n.has_content());
        assert!(n.content.is_empty());
        n.append(vec![None, text("x")]);
        assert!(n.has_content());
        n.release();
    }

    #[test]
    fn test_prepend_orders_before_existing() {
        let mut n = build("div", vec![]);
        n.append(vec![text("b")]);
        n.prepend(vec![text("a")]);
        assert_eq!(n.to_html(), "<div>ab</div>");
        n.release();
    }

    #[test]
    fn test_content_replaces_and_releases() {
        let mut n = build("div", vec![]);
        n.content(vec![text("old")]);
        n.content(vec![text("new")]);
        assert_eq!(n.to_html(), "<div>new</div>");
        n.release();
    }

    #[test]
    fn test_extract_content_detaches() {
        let mut n = build("div", vec![]);
        n.content(vec![text("a"), text("b")]);
        let children = n.extract_content();
        assert_eq!(children.len(), 2);
        assert!(!n.has_content());
        for c in children {
            if let Some(c) = c {
                c.release();
            }
        }
        n.release();
    }

    #[test]
    fn test_move_content_to_releases_leftover() {
        let mut a = build("div", vec![]);
        let mut b = build("div", vec![]);
        a.content(vec![text("keep")]);
        b.content(vec![text("stale")]);
        a.move_content_to(&mut b);
        assert!(!a.has_content());
        assert_eq!(b.to_html(), "<div>keep</div>");
        a.release();
        b.release();
    }

    #[test]
    fn test_each_content_early_stop() {
        let mut n = build("div", vec![]);
        n.content(vec![text("a"), None, text("b"), text("c")]);
        let mut seen = 0;
        n.each_content(|_| {
            seen += 1;
            seen < 2
        });
        assert_eq!(seen, 2);
        n.release();
    }

    #[test]
    fn test_vars_first_match_and_tombstone() {
        let mut n = build("div", vec![]);
        n.set_var("k", "v1");
        n.set_var("k", "v2");
        assert_eq!(n.get_var("k").as_str(), Some("v2"));
        assert!(n.has_var(&["k", "other"]));
        assert!(!n.has_var_all(&["k", "other"]));
        n.remove_var(&["k"]);
        assert!(!n.get_var("k").is_set());
        // unset insert does not create an entry
        n.set_var_value("gone", Value::UNSET);
        assert!(!n.has_var(&["gone"]));
        n.release();
    }

    #[test]
    fn test_move_var_prefix() {
        let mut a = build("div", vec![]);
        let mut b = build("div", vec![]);
        a.set_var("ui.x", "1");
        a.set_var("ui.y", "2");
        a.set_var("data", "3");
        a.move_var_prefix_to(&mut b, "ui.");
        assert!(!a.has_var(&["ui.x", "ui.y"]));
        assert!(b.has_var_all(&["ui.x", "ui.y"]));
        assert_eq!(a.get_var("data").as_str(), Some("3"));
        a.release();
        b.release();
    }

    #[test]
    fn test_slot_replace_append_prepend_extract() {
        let mut n = build("div", vec![]);
        n.slot("x", vec![text("A")]);
        assert!(n.has_slot("x"));

        n.append_slot("x", vec![text("B")]);
        n.prepend_slot("x", vec![text("C")]);
        let ex = n.extract_slot("x");
        assert_eq!(ex.len(), 3);
        assert!(!n.has_slot("x"));
        let order: Vec<String> = ex
            .into_iter()
            .flatten()
            .map(|mut c| {
                let s = c.to_html();
                c.release();
                s
            })
            .collect();
        assert_eq!(order, vec!["C", "A", "B"]);
        n.release();
    }

    #[test]
    fn test_delete_slot_keeps_empty_entry() {
        let mut n = build("div", vec![]);
        n.slot("x", vec![text("A")]);
        n.delete_slot(&["x"]);
        assert!(!n.has_slot("x"));
        assert_eq!(n.slots.len(), 1);
        n.release();
    }

    #[test]
    fn test_move_slot_merges_into_destination() {
        let mut src = build("div", vec![]);
        let mut dst = build("div", vec![]);
        src.slot("a", vec![text("1"), text("2")]);
        dst.slot("a", vec![text("stale")]);

        src.move_slot_to(&mut dst, &["a"]);

        assert!(!src.has_slot("a"));
        let ex = dst.extract_slot("a");
        let order: Vec<String> = ex
            .into_iter()
            .flatten()
            .map(|mut c| {
                let s = c.to_html();
                c.release();
                s
            })
            .collect();
        assert_eq!(order, vec!["1", "2"]);
        src.release();
        dst.release();
    }

    #[test]
    fn test_move_slot_creates_missing_destination_slot() {
        let mut src = build("div", vec![]);
        let mut dst = build("div", vec![]);
        src.slot("a", vec![text("1")]);
        src.move_slot_to(&mut dst, &["a", "missing"]);
        assert!(dst.has_slot("a"));
        src.release();
        dst.release();
    }

    #[test]
    fn test_attr_move_to_named() {
        let mut a = build("div", vec![]);
        let mut b = build("div", vec![]);
        a.attr("data-a", "1").attr("x-a", "2");
        a.move_attr_to(&mut b, &["data-a"]);
        assert!(!a.get_attr("data-a").is_set());
        assert_eq!(b.get_attr("data-a").as_str(), Some("1"));
        assert_eq!(a.get_attr("x-a").as_str(), Some("2"));
        a.release();
        b.release();
    }
}
