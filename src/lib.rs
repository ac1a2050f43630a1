//! Barcode scanning through the ZBar engine
//!
//! Every [`Image`], [`ImageScanner`], [`SymbolSet`] and [`Symbol`] owns one
//! native handle and releases it exactly once, when the value is dropped or
//! destroyed. Native calls go through an [`Engine`]: the system libzbar with
//! the `system` feature, or the in-process [`MemoryBackend`].
//!
//! ```
//! use zbar_bind::backend::memory::{MemoryBackend, SymbolRecord};
//! use zbar_bind::{Engine, Image, ImageScanner, SymbolType};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let engine = Engine::from_shared(backend.clone());
//! backend.push_frame(vec![SymbolRecord::new(SymbolType::QrCode, "hello")]);
//!
//! let mut scanner = ImageScanner::new(&engine).unwrap();
//! let mut image = Image::from_gray(&engine, &[255; 100], 10, 10).unwrap();
//! assert_eq!(scanner.scan_image(&mut image).unwrap(), 1);
//!
//! for symbol in &image.symbols() {
//!     assert_eq!(symbol.symbol_type(), SymbolType::QrCode);
//!     assert_eq!(symbol.data(), "hello");
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
mod handle;
pub mod image;
pub mod scanner;
pub mod symbol;

// Re-export main types
pub use backend::{Backend, Engine, MemoryBackend};
pub use config::{Config, ScannerSettings, Setting};
pub use error::{Error, Result};
pub use handle::RawHandle;
pub use image::{Crop, Fourcc, Image};
pub use scanner::ImageScanner;
pub use symbol::{
    Bounds, CacheStatus, Orientation, Point, Symbol, SymbolIterator, SymbolSet, SymbolType,
};
