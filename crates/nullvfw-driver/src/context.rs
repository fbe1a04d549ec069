//! Instance tokens and the table that owns every live instance context.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::descriptor::FrameDescriptor;
use crate::error::{DriverError, Result};
use crate::fourcc::FourCc;
use crate::message::OpenParams;

/// Opaque instance token handed to the host by a successful open.
///
/// The value is a key into the context table and is never dereferenced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverId(pub usize);

impl DriverId {
    /// The zero token. Never assigned.
    pub const NULL: Self = Self(0);

    /// The invalid-instance sentinel (all bits set). Never assigned.
    pub const INVALID: Self = Self(usize::MAX);

    /// Returns true for the zero token and the invalid sentinel.
    pub fn is_reserved(self) -> bool {
        self == Self::NULL || self == Self::INVALID
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NULL => f.write_str("null token"),
            Self::INVALID => f.write_str("invalid token"),
            Self(raw) => write!(f, "token {raw}"),
        }
    }
}

impl fmt::Debug for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DriverId({:#x})", self.0)
    }
}

/// Descriptors fixed by a begin message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    pub input: FrameDescriptor,
    pub output: Option<FrameDescriptor>,
}

/// State kept for one open instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverContext {
    pub fcc_type: FourCc,
    pub fcc_handler: FourCc,
    pub mode: u32,
    /// Set by compress-begin, cleared by compress-end.
    pub compress: Option<Negotiated>,
    /// Set by decompress-begin, cleared by decompress-end.
    pub decompress: Option<Negotiated>,
    pub frames_compressed: u64,
    pub frames_decompressed: u64,
}

impl DriverContext {
    pub fn new(params: &OpenParams) -> Self {
        Self {
            fcc_type: params.fcc_type,
            fcc_handler: params.fcc_handler,
            mode: params.flags,
            compress: None,
            decompress: None,
            frames_compressed: 0,
            frames_decompressed: 0,
        }
    }
}

struct Slots {
    contexts: HashMap<DriverId, Box<DriverContext>>,
    next: usize,
}

/// Owns every live [`DriverContext`], keyed by token.
///
/// Each context is held in exactly one box. Removing it hands that box back
/// once; the token is dead afterwards.
pub struct ContextTable {
    slots: Mutex<Slots>,
}

impl ContextTable {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                contexts: HashMap::new(),
                next: 1,
            }),
        }
    }

    // A panic while holding the lock cannot leave a half-inserted entry, so
    // the data behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new context and return its token.
    ///
    /// Fails with [`DriverError::Exhausted`] if storage cannot be reserved or
    /// the token space is used up.
    pub fn insert(&self, context: DriverContext) -> Result<DriverId> {
        let mut slots = self.lock();
        slots
            .contexts
            .try_reserve(1)
            .map_err(|_| DriverError::Exhausted)?;

        let id = next_free(&mut slots)?;
        slots.contexts.insert(id, Box::new(context));
        Ok(id)
    }

    /// Remove a context. Returns `None` if the token is not live.
    pub fn remove(&self, id: DriverId) -> Option<Box<DriverContext>> {
        if id.is_reserved() {
            return None;
        }
        self.lock().contexts.remove(&id)
    }

    pub fn contains(&self, id: DriverId) -> bool {
        !id.is_reserved() && self.lock().contexts.contains_key(&id)
    }

    /// Run `f` against a live context. Returns `None` if the token is not live.
    pub fn with<T>(&self, id: DriverId, f: impl FnOnce(&mut DriverContext) -> T) -> Option<T> {
        if id.is_reserved() {
            return None;
        }
        let mut slots = self.lock();
        slots.contexts.get_mut(&id).map(|context| f(context))
    }

    /// Copy of a live context.
    pub fn snapshot(&self, id: DriverId) -> Option<DriverContext> {
        self.with(id, |context| context.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ContextTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextTable")
            .field("live", &self.len())
            .finish()
    }
}

// Skips the reserved values and any token still live after wrap-around.
fn next_free(slots: &mut Slots) -> Result<DriverId> {
    let live = slots.contexts.len();
    // Two reserved values plus every live token; more attempts cannot help.
    let mut attempts = live.saturating_add(2);
    loop {
        let id = DriverId(slots.next);
        slots.next = slots.next.wrapping_add(1);
        if !id.is_reserved() && !slots.contexts.contains_key(&id) {
            return Ok(id);
        }
        if attempts == 0 {
            return Err(DriverError::Exhausted);
        }
        attempts -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fourcc::{NULL_CODEC, VIDEO};
    use crate::mode::ICMODE_COMPRESS;

    fn params() -> OpenParams {
        OpenParams::new(VIDEO, NULL_CODEC, ICMODE_COMPRESS)
    }

    #[test]
    fn insert_assigns_distinct_non_reserved_tokens() {
        let table = ContextTable::new();
        let a = table.insert(DriverContext::new(&params())).unwrap();
        let b = table.insert(DriverContext::new(&params())).unwrap();

        assert_ne!(a, b);
        assert!(!a.is_reserved());
        assert!(!b.is_reserved());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn remove_hands_back_the_context_once() {
        let table = ContextTable::new();
        let id = table.insert(DriverContext::new(&params())).unwrap();

        let context = table.remove(id).unwrap();
        assert_eq!(context.mode, ICMODE_COMPRESS);
        assert!(table.remove(id).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn reserved_tokens_are_never_live() {
        let table = ContextTable::new();
        table.insert(DriverContext::new(&params())).unwrap();

        assert!(!table.contains(DriverId::NULL));
        assert!(!table.contains(DriverId::INVALID));
        assert!(table.remove(DriverId::INVALID).is_none());
        assert!(table.with(DriverId::NULL, |_| ()).is_none());
    }

    #[test]
    fn counter_skips_sentinel_on_wrap() {
        let table = ContextTable::new();
        table.lock().next = usize::MAX;

        let id = table.insert(DriverContext::new(&params())).unwrap();
        assert_eq!(id, DriverId(1));
    }

    #[test]
    fn counter_skips_live_tokens_on_wrap() {
        let table = ContextTable::new();
        let first = table.insert(DriverContext::new(&params())).unwrap();
        assert_eq!(first, DriverId(1));

        table.lock().next = usize::MAX - 1;
        let a = table.insert(DriverContext::new(&params())).unwrap();
        let b = table.insert(DriverContext::new(&params())).unwrap();
        assert_eq!(a, DriverId(usize::MAX - 1));
        assert_eq!(b, DriverId(2));
    }

    #[test]
    fn with_mutates_in_place() {
        let table = ContextTable::new();
        let id = table.insert(DriverContext::new(&params())).unwrap();

        table.with(id, |context| context.frames_compressed += 3);
        assert_eq!(table.snapshot(id).unwrap().frames_compressed, 3);
    }

    #[test]
    fn display_names_reserved_tokens() {
        assert_eq!(DriverId::NULL.to_string(), "null token");
        assert_eq!(DriverId::INVALID.to_string(), "invalid token");
        assert_eq!(DriverId(7).to_string(), "token 7");
    }
}
