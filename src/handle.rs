//! Native handles and the guards that own them
//!
//! A [`RawHandle`] is the integer a backend hands out for one of its objects.
//! Zero never names an object, so the "no resource" case is `Option<RawHandle>::None`.
//! A [`Peer`] owns exactly one handle and gives it back to the backend once.

use std::fmt;
use std::num::NonZeroU64;

use crate::backend::Engine;

/// Opaque identifier of a native-side object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(NonZeroU64);

impl RawHandle {
    /// Wrap a raw value; zero yields `None`.
    #[inline]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:#x})", self.0.get())
    }
}

/// Which native destructor a handle needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PeerKind {
    Image,
    Scanner,
    SymbolSet,
    Symbol,
}

impl PeerKind {
    fn name(self) -> &'static str {
        match self {
            PeerKind::Image => "image",
            PeerKind::Scanner => "image scanner",
            PeerKind::SymbolSet => "symbol set",
            PeerKind::Symbol => "symbol",
        }
    }
}

/// Owner of one native handle.
///
/// Releasing happens at most once: explicitly through [`Peer::release`] or
/// implicitly when the guard is dropped.
pub(crate) struct Peer {
    engine: Engine,
    raw: RawHandle,
    kind: PeerKind,
    released: bool,
}

impl Peer {
    pub(crate) fn new(engine: Engine, kind: PeerKind, raw: RawHandle) -> Self {
        tracing::trace!(kind = kind.name(), handle = raw.get(), "acquired native handle");
        Peer {
            engine,
            raw,
            kind,
            released: false,
        }
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    pub(crate) fn raw(&self) -> RawHandle {
        self.raw
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        self.released
    }

    /// Give the handle back to the backend. Later calls do nothing.
    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let backend = self.engine.backend();
        match self.kind {
            PeerKind::Image => backend.image_destroy(self.raw),
            PeerKind::Scanner => backend.scanner_destroy(self.raw),
            PeerKind::SymbolSet => backend.symbol_set_release(self.raw),
            PeerKind::Symbol => backend.symbol_release(self.raw),
        }
        tracing::trace!(
            kind = self.kind.name(),
            handle = self.raw.get(),
            "released native handle"
        );
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("kind", &self.kind)
            .field("raw", &self.raw)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::backend::Backend;
    use std::sync::Arc;

    #[test]
    fn test_zero_is_not_a_handle() {
        assert!(RawHandle::new(0).is_none());
        assert_eq!(RawHandle::new(7).map(RawHandle::get), Some(7));
    }

    #[test]
    fn test_release_is_idempotent() {
        let backend = Arc::new(MemoryBackend::new());
        let engine = Engine::from_shared(backend.clone());
        let raw = backend.image_create().unwrap();

        let mut peer = Peer::new(engine, PeerKind::Image, raw);
        peer.release();
        peer.release();
        assert!(peer.is_released());
        drop(peer);

        let stats = backend.stats();
        assert_eq!(stats.live_images, 0);
        assert_eq!(stats.destroy_calls, 1);
    }

    #[test]
    fn test_drop_releases() {
        let backend = Arc::new(MemoryBackend::new());
        let engine = Engine::from_shared(backend.clone());
        let raw = backend.scanner_create().unwrap();

        drop(Peer::new(engine, PeerKind::Scanner, raw));

        let stats = backend.stats();
        assert_eq!(stats.live_scanners, 0);
        assert_eq!(stats.destroy_calls, 1);
    }
}
