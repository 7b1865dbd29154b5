//! Static Render Cache
//!
//! Renders the output of a pure builder function once, then serves the
//! cached bytes as a raw node on every later call. Keyed by the builder's
//! function pointer, so the builder must be referentially identifiable and
//! pure with respect to anything it closes over - the cache never
//! re-invokes it.
//!
//! Cached buffers are leaked to `'static`: the set of builder functions in
//! a process is finite and their output is invariant by contract, so the
//! cache grows once and then stays flat.

use std::sync::{Mutex, OnceLock};

use log::debug;
use lru::LruCache;

use crate::node::Child;
use crate::pool;

static CACHE: OnceLock<Mutex<LruCache<usize, &'static [u8]>>> = OnceLock::new();

fn cache() -> &'static Mutex<LruCache<usize, &'static [u8]>> {
    CACHE.get_or_init(|| Mutex::new(LruCache::unbounded()))
}

/// Return a raw node over the globally cached render of `f`.
///
/// The first call invokes `f`, renders the result, releases the built tree
/// and caches the bytes; every later call returns a raw node over the same
/// bytes without invoking `f`. A render failure caches the error text
/// (builders are pure, so the failure is deterministic).
pub fn static_node<'a>(f: fn() -> Child<'a>) -> Child<'a> {
    let key = f as usize;
    if let Some(&bytes) = cache().lock().unwrap().get(&key) {
        return crate::raw_bytes(bytes);
    }

    let mut built = f();
    let mut buf = Vec::new();
    let rendered = match crate::render(&mut built, &mut buf) {
        Ok(()) => buf,
        Err(e) => e.to_string().into_bytes(),
    };
    pool::release_child(built);

    debug!("static cache miss: rendered {} bytes", rendered.len());
    let bytes: &'static [u8] = Box::leak(rendered.into_boxed_slice());
    cache().lock().unwrap().put(key, bytes);
    crate::raw_bytes(bytes)
}
