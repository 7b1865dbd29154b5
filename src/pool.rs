//! Node Pool and Lifecycle
//!
//! Nodes are recycled through an explicit free list instead of being
//! allocated per render. Each node carries an acquired guard; acquiring a
//! node that is already in use, or releasing one that is not, is treated as
//! pool corruption and aborts via panic rather than continuing on damaged
//! bookkeeping.
//!
//! Release is recursive: children, slot content and attached nodes go back
//! with their parent, each independently checked against its owned flag.
//! Owned nodes (and entire subtrees under them) are dropped by normal means
//! and never touch the free list.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::debug;

use crate::node::{Child, Mod, Node, TAG_DEFAULT};
use crate::value::Value;

/// A reset node waiting in the free list. The reset invariant (no borrowed
/// data, no closures, all collections empty) is what makes the lifetime
/// erasure and the Send impl below sound.
struct Parked(Box<Node<'static>>);

// SAFETY: a parked node has been through `reset` and carries no captured
// state another thread could observe.
unsafe impl Send for Parked {}

/// A recycling pool for nodes.
///
/// The process-wide instance is [`Pool::global`]; `Pool::new` is `const`,
/// so tests can hold isolated instances in their own statics. Nodes
/// remember their origin pool and are returned to it on release no matter
/// which code path triggers the release.
pub struct Pool {
    free: Mutex<Vec<Parked>>,
    disabled: AtomicBool,
}

static GLOBAL: Pool = Pool::new();

impl Pool {
    /// An empty pool.
    pub const fn new() -> Self {
        Pool {
            free: Mutex::new(Vec::new()),
            disabled: AtomicBool::new(false),
        }
    }

    /// The process-wide pool used by the free builder functions.
    pub fn global() -> &'static Pool {
        &GLOBAL
    }

    /// Turn recycling on or off. With pooling off, acquisition always
    /// allocates fresh and release drops instead of parking - useful when
    /// deterministic allocation matters more than reuse (tests, profiling).
    pub fn set_pooling(&self, enabled: bool) {
        self.disabled.store(!enabled, Ordering::Relaxed);
    }

    /// True if recycling is active.
    pub fn pooling_enabled(&self) -> bool {
        !self.disabled.load(Ordering::Relaxed)
    }

    /// Number of nodes currently parked in the free list.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap().len()
    }

    /// Take a reset node from the pool, or allocate one. Most users want
    /// [`crate::build`] and friends instead.
    ///
    /// # Panics
    ///
    /// Panics if the recycled node is already marked acquired; that means
    /// the pool bookkeeping is corrupted and continuing is unsafe.
    pub fn acquire<'a>(&'static self) -> Box<Node<'a>> {
        let parked = if self.pooling_enabled() {
            self.free.lock().unwrap().pop()
        } else {
            None
        };

        let node: Box<Node<'a>> = match parked {
            // SAFETY: the node was reset before parking; see `Parked`.
            Some(p) => unsafe { recycle(p.0) },
            None => Box::new(Node::fresh(self, self.pooling_enabled())),
        };

        if node.acquired.swap(true, Ordering::AcqRel) {
            panic!("tagforge: acquired a node that is already in use; pool is corrupted");
        }

        node
    }

    /// Acquire a node, set its tag and apply the modifiers.
    pub fn build<'a>(&'static self, tag: &'a str, mods: Vec<Mod<'a>>) -> Box<Node<'a>> {
        let mut n = self.acquire();
        n.set_tag(tag);
        for m in mods {
            m(&mut n);
        }
        n
    }
}

impl Default for Pool {
    fn default() -> Self {
        Pool::new()
    }
}

pub(crate) fn release_child(c: Child<'_>) {
    if let Some(n) = c {
        release_box(n);
    }
}

/// Return a node and its subtree to its origin pool. Owned nodes are
/// dropped (subtree included); with pooling disabled everything is dropped.
///
/// # Panics
///
/// Panics when the node's acquired guard is already clear - a double
/// release, which indicates corrupted lifecycle bookkeeping.
pub(crate) fn release_box(mut n: Box<Node<'_>>) {
    if n.is_owned() {
        return; // dropped, along with everything it holds
    }
    let pool = n.pool;
    if !pool.pooling_enabled() {
        return;
    }
    if !n.acquired.swap(false, Ordering::AcqRel) {
        panic!("tagforge: released a node that was not acquired");
    }

    reset(&mut n);

    // SAFETY: `reset` just ran; the node holds no borrowed data.
    pool.free.lock().unwrap().push(Parked(unsafe { park(n) }));
}

/// Restore a node to its default, borrow-free state. Collections keep
/// their allocations unless they have grown unusually large, in which case
/// they are reallocated smaller to bound long-run pool memory.
fn reset(n: &mut Node<'_>) {
    n.tag = TAG_DEFAULT;
    n.flags = 0;
    n.value = Value::UNSET;
    n.write_fn = None;

    n.attrs.reset();
    n.attrs.shrink_if_oversized(64, 16);
    n.class.reset();
    n.class.shrink_if_oversized(64, 16);

    for c in n.content.drain(..) {
        release_child(c);
    }
    shrink_if_oversized(&mut n.content, 128, 64);

    for mut s in n.slots.drain(..) {
        for c in s.content.drain(..) {
            release_child(c);
        }
    }
    shrink_if_oversized(&mut n.slots, 16, 8);

    n.vars.clear();
    shrink_if_oversized(&mut n.vars, 32, 16);

    for a in n.attached.drain(..) {
        release_box(a);
    }
    shrink_if_oversized(&mut n.attached, 64, 32);

    n.postponed.clear();
}

fn shrink_if_oversized<T>(v: &mut Vec<T>, max: usize, to: usize) {
    if v.capacity() > max {
        debug!("pool: shrinking oversized list ({} -> {} slots)", v.capacity(), to);
        *v = Vec::with_capacity(to);
    }
}

/// Rename a parked node's lifetime to the caller's.
///
/// SAFETY: callers must only pass reset nodes. All collections are empty
/// and the tag is the `'static` default, so no borrow with the old
/// lifetime exists; renaming the (invariant) parameter is then sound.
unsafe fn recycle<'a>(n: Box<Node<'static>>) -> Box<Node<'a>> {
    mem::transmute(n)
}

/// Erase the lifetime of a reset node for parking.
///
/// SAFETY: same invariant as `recycle` - the node must be reset first.
unsafe fn park(n: Box<Node<'_>>) -> Box<Node<'static>> {
    mem::transmute(n)
}
