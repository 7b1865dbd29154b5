//! tagforge - Pooled HTML tree building and rendering
//!
//! Building blocks:
//! - [`Value`]: copyable tagged values (scalars inline, strings/bytes as
//!   borrowed views, no allocation)
//! - [`Node`]: the element/text/raw/group tree node with ordered
//!   attributes, classes, slots and user variables
//! - [`Pool`]: recycling allocator with explicit acquire/release lifecycle
//! - [`Node::render`]: streaming serializer with escaping and the script
//!   content guard
//! - [`static_node`]: process-wide cache for pre-rendered static fragments
//!
//! Trees are composed through modifier closures ([`Mod`]) applied in
//! order, and returned to the pool with [`Node::release`] once rendered.

use std::io;

mod cache;
mod node;
mod pool;
mod render;
mod value;

pub use cache::static_node;
pub use node::{Child, Mod, Node, RenderFn};
pub use pool::Pool;
pub use render::{valid_attr, valid_class, valid_tag, RenderError};
pub use value::{Value, ValueKind};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                let mut peak = PEAK_ALLOCATED.load(Ordering::Relaxed);
                while current > peak {
                    match PEAK_ALLOCATED.compare_exchange_weak(
                        peak,
                        current,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break,
                        Err(p) => peak = p,
                    }
                }
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Bytes currently allocated. Requires the `memory_tracking` feature.
#[cfg(feature = "memory_tracking")]
pub fn allocated_bytes() -> usize {
    tracking::ALLOCATED.load(std::sync::atomic::Ordering::SeqCst)
}

/// Peak allocated bytes. Requires the `memory_tracking` feature.
#[cfg(feature = "memory_tracking")]
pub fn peak_allocated_bytes() -> usize {
    tracking::PEAK_ALLOCATED.load(std::sync::atomic::Ordering::SeqCst)
}

/// Reset the peak to the current allocation level; returns
/// `(current, previous peak)`. Requires the `memory_tracking` feature.
#[cfg(feature = "memory_tracking")]
pub fn reset_memory_stats() -> (usize, usize) {
    use std::sync::atomic::Ordering;
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

// ============================================================================
// Builders
// ============================================================================

/// Acquire a node from the global pool, set its tag, and apply the
/// modifiers in order.
pub fn build<'a>(tag: &'a str, mods: Vec<Mod<'a>>) -> Box<Node<'a>> {
    Pool::global().build(tag, mods)
}

/// A logical group of nodes that renders its children without a wrapping
/// parent tag.
pub fn group<'a>(nodes: Vec<Child<'a>>) -> Box<Node<'a>> {
    let mut n = Pool::global().acquire();
    n.tag = node::TAG_GROUP;
    n.content.extend(nodes);
    n.write_fn = Some(render::render_group);
    n
}

/// An escaped text node. Empty input produces no node.
pub fn text<'a>(s: &'a str) -> Child<'a> {
    if s.is_empty() {
        return None;
    }
    let mut n = Pool::global().acquire();
    n.tag = node::TAG_TEXT;
    n.value = Value::str(s);
    n.write_fn = Some(render::render_text);
    Some(n)
}

/// A text node over an arbitrary typed value, escaped at render time.
/// Unset input produces no node.
pub fn text_value<'a>(v: Value<'a>) -> Child<'a> {
    if !v.is_set() {
        return None;
    }
    let mut n = Pool::global().acquire();
    n.tag = node::TAG_TEXT;
    n.value = v;
    n.write_fn = Some(render::render_text);
    Some(n)
}

/// A raw node over a pre-escaped string, written to the output verbatim.
/// Empty input produces no node.
pub fn raw_str<'a>(s: &'a str) -> Child<'a> {
    if s.is_empty() {
        return None;
    }
    let mut n = Pool::global().acquire();
    n.tag = node::TAG_RAW;
    n.value = Value::str(s);
    n.write_fn = Some(render::render_raw);
    Some(n)
}

/// A raw node over pre-escaped bytes, written to the output verbatim.
/// Empty input produces no node.
pub fn raw_bytes<'a>(b: &'a [u8]) -> Child<'a> {
    if b.is_empty() {
        return None;
    }
    let mut n = Pool::global().acquire();
    n.tag = node::TAG_RAW;
    n.value = Value::bytes(b);
    n.write_fn = Some(render::render_raw);
    Some(n)
}

/// Build a node by calling `f` when `cond` is true; otherwise no node.
pub fn build_if<'a>(cond: bool, f: impl FnOnce() -> Child<'a>) -> Child<'a> {
    if cond {
        f()
    } else {
        None
    }
}

// ============================================================================
// Modifier constructors
// ============================================================================

/// Combine multiple modifiers into one.
pub fn mods<'a>(list: Vec<Mod<'a>>) -> Mod<'a> {
    Box::new(move |n| {
        for m in list {
            m(n);
        }
    })
}

/// Produce the modifier from `f` when `cond` is true; otherwise a no-op.
pub fn mod_if<'a>(cond: bool, f: impl FnOnce() -> Mod<'a>) -> Mod<'a> {
    if cond {
        f()
    } else {
        Box::new(|_| {})
    }
}

/// Modifier: set the tag name.
pub fn tag<'a>(t: &'a str) -> Mod<'a> {
    Box::new(move |n| {
        n.set_tag(t);
    })
}

/// Modifier: set the tag name and void status.
pub fn tag_ex<'a>(t: &'a str, void: bool) -> Mod<'a> {
    Box::new(move |n| {
        n.set_tag_ex(t, void);
    })
}

/// Modifier: set a string attribute. Not for `class`; use [`class`].
pub fn attr<'a>(name: &'a str, value: &'a str) -> Mod<'a> {
    Box::new(move |n| {
        n.attr(name, value);
    })
}

/// Modifier: set a boolean-presence attribute.
pub fn attr_flag<'a>(name: &'a str) -> Mod<'a> {
    Box::new(move |n| {
        n.attr_flag(name);
    })
}

/// Modifier: set a boolean attribute.
pub fn attr_bool<'a>(name: &'a str, value: bool) -> Mod<'a> {
    Box::new(move |n| {
        n.attr_bool(name, value);
    })
}

/// Modifier: set a typed attribute. Not for `class`; use [`class`].
pub fn attr_value<'a>(name: &'a str, value: Value<'a>) -> Mod<'a> {
    Box::new(move |n| {
        n.attr_value(name, value);
    })
}

/// Modifier: add class tokens (whitespace-separated).
pub fn class<'a>(tokens: &'a str) -> Mod<'a> {
    Box::new(move |n| {
        n.class(tokens);
    })
}

/// Modifier: replace the node's content.
pub fn content<'a>(nodes: Vec<Child<'a>>) -> Mod<'a> {
    Box::new(move |n| {
        n.content(nodes);
    })
}

/// Modifier: replace the content with a single escaped text node.
pub fn text_content<'a>(s: &'a str) -> Mod<'a> {
    Box::new(move |n| {
        n.text(s);
    })
}

/// Modifier: set the content of a named slot.
pub fn slot<'a>(name: &'a str, nodes: Vec<Child<'a>>) -> Mod<'a> {
    Box::new(move |n| {
        n.slot(name, nodes);
    })
}

/// Modifier: attach string user data. Variables are never rendered.
pub fn var<'a>(name: &'a str, value: &'a str) -> Mod<'a> {
    Box::new(move |n| {
        n.set_var(name, value);
    })
}

/// Modifier: attach typed user data. Variables are never rendered.
pub fn var_value<'a>(name: &'a str, value: Value<'a>) -> Mod<'a> {
    Box::new(move |n| {
        n.set_var_value(name, value);
    })
}

/// Modifier: override the node's serialization.
pub fn write_fn<'a>(f: RenderFn<'a>) -> Mod<'a> {
    Box::new(move |n| {
        n.set_write_fn(f);
    })
}

// ============================================================================
// Rendering entry points
// ============================================================================

/// Render a child entry to a sink; `None` renders nothing.
pub fn render<'a>(node: &mut Child<'a>, w: &mut dyn io::Write) -> Result<(), RenderError> {
    match node.as_mut() {
        Some(n) => n.render(w),
        None => Ok(()),
    }
}

/// Render a child entry to a string; `None` renders as empty. Render
/// errors come back as the error text.
pub fn to_html<'a>(node: &mut Child<'a>) -> String {
    match node.as_mut() {
        Some(n) => n.to_html(),
        None => String::new(),
    }
}

/// Turn recycling on or off for the global pool. With pooling off, nodes
/// are always freshly allocated and release is a drop.
pub fn set_pooling(enabled: bool) {
    Pool::global().set_pooling(enabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_mods_applies_in_order() {
        let mut n = build(
            "div",
            vec![
                class("flex p-7"),
                attr("id", "first"),
                attr("id", "root"), // later modifiers override earlier ones
                content(vec![text("hello")]),
            ],
        );
        assert_eq!(n.to_html(), r#"<div class="flex p-7" id="root">hello</div>"#);
        n.release();
    }

    #[test]
    fn test_mods_combinator_and_mod_if() {
        let highlight = |on: bool| mod_if(on, || class("highlight"));
        let mut a = build("span", vec![mods(vec![class("base"), highlight(true)])]);
        let mut b = build("span", vec![mods(vec![class("base"), highlight(false)])]);
        assert_eq!(a.to_html(), r#"<span class="base highlight"></span>"#);
        assert_eq!(b.to_html(), r#"<span class="base"></span>"#);
        a.release();
        b.release();
    }

    #[test]
    fn test_build_if() {
        let mut yes = build_if(true, || text("y"));
        let mut no = build_if(false, || text("n"));
        assert_eq!(to_html(&mut yes), "y");
        assert_eq!(to_html(&mut no), "");
        crate::pool::release_child(yes);
    }

    #[test]
    fn test_empty_text_and_raw_are_none() {
        assert!(text("").is_none());
        assert!(text_value(Value::UNSET).is_none());
        assert!(raw_str("").is_none());
        assert!(raw_bytes(b"").is_none());
    }

    #[test]
    fn test_render_into_sink() {
        let mut n: Child<'_> = Some(build("p", vec![text_content("ok")]));
        let mut out = Vec::new();
        render(&mut n, &mut out).unwrap();
        assert_eq!(out, b"<p>ok</p>");
        crate::pool::release_child(n);
    }

    #[test]
    fn test_typical_list_build_render_release_cycle() {
        struct Item {
            id: i64,
            name: &'static str,
            email: &'static str,
        }
        let items = [
            Item { id: 1, name: "Alice", email: "alice@example.com" },
            Item { id: 2, name: "Bob", email: "bob@example.com" },
        ];

        let mut list = build("ul", vec![class("user-list")]);
        for item in &items {
            let mut li = build(
                "li",
                vec![class("user-item"), attr_value("id", Value::int(item.id))],
            );
            let mut name = build("span", vec![class("name")]);
            name.text(item.name);
            let mut link = build("a", vec![attr("href", item.email)]);
            link.text(item.email);
            li.content(vec![Some(name), Some(link)]);
            list.append(vec![Some(li)]);
        }

        let html = list.to_html();
        list.release();

        assert!(html.starts_with(r#"<ul class="user-list">"#));
        assert!(html.ends_with("</ul>"));
        assert!(html.contains(r#"<li class="user-item" id="1"><span class="name">Alice</span>"#));
        assert!(html.contains(r#"<a href="bob@example.com">bob@example.com</a>"#));
    }

    #[test]
    fn test_var_mods_never_render() {
        let mut n = build(
            "div",
            vec![var("route", "/home"), var_value("depth", Value::int(2))],
        );
        assert_eq!(n.to_html(), "<div></div>");
        assert_eq!(n.get_var("route").as_str(), Some("/home"));
        assert_eq!(n.get_var("depth").as_i64(), Some(2));
        n.release();
    }

    #[test]
    fn test_tag_mods() {
        let mut n = build("div", vec![tag("section")]);
        assert_eq!(n.tag_name(), "section");
        n.apply(vec![tag_ex("widget", true)]);
        assert!(n.is_void());
        n.release();
    }

    #[test]
    fn test_slot_staging_with_postpone() {
        // slots stage content; a postponed mod decides placement at render
        let mut card = build("div", vec![class("card"), slot("footer", vec![text("f")])]);
        card.postpone(vec![Box::new(|n| {
            let footer = n.extract_slot("footer");
            n.append(footer);
        })]);
        assert_eq!(card.to_html(), r#"<div class="card">f</div>"#);
        card.release();
    }
}
