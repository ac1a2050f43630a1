//! Native engine entry points
//!
//! [`Backend`] lists what a barcode engine must provide, one method per native
//! entry point, addressed by [`RawHandle`]. The handle-owning types in this crate
//! never touch native state any other way.
//!
//! Handles returned from `*_create`, `image_convert`, `image_symbols`,
//! `scanner_results`, `symbol_set_first`, `symbol_next` and `symbol_components`
//! carry one reference that the caller gives back through the matching
//! destroy/release method.

use std::fmt;
use std::sync::Arc;

use crate::handle::RawHandle;
use crate::image::{Crop, Fourcc};

pub mod memory;
#[cfg(feature = "system")]
mod system;

pub use memory::MemoryBackend;

/// Native entry points of a barcode engine.
pub trait Backend: Send + Sync {
    fn image_create(&self) -> Option<RawHandle>;
    fn image_destroy(&self, image: RawHandle);
    /// New image holding the pixels of `image` in `format`; `None` when the
    /// conversion is not supported.
    fn image_convert(&self, image: RawHandle, format: Fourcc) -> Option<RawHandle>;
    fn image_format(&self, image: RawHandle) -> Fourcc;
    fn image_set_format(&self, image: RawHandle, format: Fourcc);
    fn image_sequence(&self, image: RawHandle) -> u32;
    fn image_set_sequence(&self, image: RawHandle, sequence: u32);
    fn image_size(&self, image: RawHandle) -> (u32, u32);
    /// Resets the crop rectangle to the full image.
    fn image_set_size(&self, image: RawHandle, width: u32, height: u32);
    fn image_crop(&self, image: RawHandle) -> Crop;
    /// Clamps `crop` to the image bounds.
    fn image_set_crop(&self, image: RawHandle, crop: Crop);
    fn image_data(&self, image: RawHandle) -> Vec<u8>;
    fn image_set_data(&self, image: RawHandle, data: &[u8]);
    /// Results attached to the image by its most recent scan.
    fn image_symbols(&self, image: RawHandle) -> Option<RawHandle>;

    fn scanner_create(&self) -> Option<RawHandle>;
    fn scanner_destroy(&self, scanner: RawHandle);
    /// Returns `false` when the combination is not supported.
    fn scanner_set_config(&self, scanner: RawHandle, symbology: i32, option: i32, value: i32)
        -> bool;
    fn scanner_config(&self, scanner: RawHandle, symbology: i32, option: i32) -> Option<i32>;
    fn scanner_enable_cache(&self, scanner: RawHandle, enable: bool);
    /// Number of decoded symbols, or a negative value for an unusable image.
    fn scanner_scan(&self, scanner: RawHandle, image: RawHandle) -> i32;
    fn scanner_results(&self, scanner: RawHandle) -> Option<RawHandle>;

    fn symbol_set_release(&self, set: RawHandle);
    fn symbol_set_size(&self, set: RawHandle) -> i32;
    fn symbol_set_first(&self, set: RawHandle) -> Option<RawHandle>;

    fn symbol_release(&self, symbol: RawHandle);
    fn symbol_next(&self, symbol: RawHandle) -> Option<RawHandle>;
    fn symbol_type(&self, symbol: RawHandle) -> i32;
    fn symbol_configs(&self, symbol: RawHandle) -> u32;
    fn symbol_modifiers(&self, symbol: RawHandle) -> u32;
    fn symbol_data(&self, symbol: RawHandle) -> Vec<u8>;
    fn symbol_quality(&self, symbol: RawHandle) -> i32;
    fn symbol_count(&self, symbol: RawHandle) -> i32;
    fn symbol_orientation(&self, symbol: RawHandle) -> i32;
    fn symbol_location_size(&self, symbol: RawHandle) -> u32;
    fn symbol_location_x(&self, symbol: RawHandle, index: u32) -> i32;
    fn symbol_location_y(&self, symbol: RawHandle, index: u32) -> i32;
    fn symbol_components(&self, symbol: RawHandle) -> Option<RawHandle>;
}

/// Shared reference to one backend.
///
/// Every image, scanner and result remembers the engine that created it;
/// handles from different engines are never mixed.
#[derive(Clone)]
pub struct Engine {
    backend: Arc<dyn Backend>,
}

impl Engine {
    pub fn new<B: Backend + 'static>(backend: B) -> Self {
        Engine {
            backend: Arc::new(backend),
        }
    }

    /// Wrap a backend the caller keeps a handle on, e.g. to inspect
    /// [`MemoryBackend::stats`].
    pub fn from_shared<B: Backend + 'static>(backend: Arc<B>) -> Self {
        Engine { backend }
    }

    /// Engine backed by the system libzbar.
    #[cfg(feature = "system")]
    pub fn system() -> Self {
        Engine::new(system::SystemBackend)
    }

    /// Engine backed by a fresh [`MemoryBackend`].
    pub fn memory() -> Self {
        Engine::new(MemoryBackend::new())
    }

    pub fn same(&self, other: &Engine) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &Arc::as_ptr(&self.backend))
            .finish()
    }
}
