//! Image scanner for finding barcodes in 2D images

use std::fmt;

use crate::backend::Engine;
use crate::config::{self, Config, ScannerSettings, Setting};
use crate::handle::{Peer, PeerKind, RawHandle};
use crate::image::Image;
use crate::symbol::{SymbolSet, SymbolType};
use crate::{Error, Result};

/// Image scanner that can find barcodes in 2D images
///
/// Configuration lives on the native side; every setter forwards to the
/// engine and reports whether it accepted the option.
///
/// # Example
/// ```
/// use zbar_bind::config::*;
/// use zbar_bind::{Engine, Image, ImageScanner};
///
/// let engine = Engine::memory();
/// let settings = ScannerSettings::new()
///     .enable(Ean13)
///     .enable(QrCode)
///     .set_binary(QrCode, true)
///     .position_tracking(true)
///     .scan_density(1, 1);
///
/// let mut scanner = ImageScanner::new(&engine).unwrap();
/// scanner.apply(&settings).unwrap();
///
/// let data = vec![0u8; 640 * 480];
/// let mut image = Image::from_gray(&engine, &data, 640, 480).unwrap();
/// let num_symbols = scanner.scan_image(&mut image).unwrap();
/// assert_eq!(num_symbols, 0);
/// ```
pub struct ImageScanner {
    peer: Peer,
}

impl ImageScanner {
    /// Create a new image scanner with the engine's default configuration
    pub fn new(engine: &Engine) -> Result<Self> {
        let raw = engine
            .backend()
            .scanner_create()
            .ok_or(Error::OutOfMemory("an image scanner"))?;
        Ok(ImageScanner {
            peer: Peer::new(engine.clone(), PeerKind::Scanner, raw),
        })
    }

    /// Set one option for one symbology.
    ///
    /// [`SymbolType::None`] applies the option to every symbology,
    /// [`SymbolType::Partial`] to the scanner itself.
    pub fn set_config(&mut self, symbology: SymbolType, option: Config, value: i32) -> Result<()> {
        self.set_config_raw(symbology.code(), option.code(), value)
    }

    /// [`set_config`](Self::set_config) with untyped codes.
    pub fn set_config_raw(&mut self, symbology: i32, option: i32, value: i32) -> Result<()> {
        if Config::try_from(option).is_err() {
            tracing::warn!(symbology, option, value, "unknown configuration option");
            return Err(Error::UnsupportedConfig {
                symbology,
                option,
                value,
            });
        }
        let accepted = self
            .peer
            .engine()
            .backend()
            .scanner_set_config(self.raw(), symbology, option, value);
        if !accepted {
            tracing::warn!(symbology, option, value, "configuration rejected");
            return Err(Error::UnsupportedConfig {
                symbology,
                option,
                value,
            });
        }
        tracing::debug!(symbology, option, value, "configuration applied");
        Ok(())
    }

    /// Current value of one option.
    pub fn config(&self, symbology: SymbolType, option: Config) -> Result<i32> {
        self.peer
            .engine()
            .backend()
            .scanner_config(self.raw(), symbology.code(), option.code())
            .ok_or(Error::UnsupportedConfig {
                symbology: symbology.code(),
                option: option.code(),
                value: 0,
            })
    }

    /// Apply one setting in text form, e.g. `"qrcode.disable"` or `"ean13.emit-check=0"`.
    ///
    /// See [`config::parse`] for the grammar.
    pub fn parse_config(&mut self, text: &str) -> Result<()> {
        let setting = config::parse(text)?;
        self.apply_setting(setting)
    }

    /// Apply every change recorded in `settings`, stopping at the first rejection.
    pub fn apply(&mut self, settings: &ScannerSettings) -> Result<()> {
        settings
            .settings()
            .into_iter()
            .try_for_each(|setting| self.apply_setting(setting))
    }

    fn apply_setting(&mut self, setting: Setting) -> Result<()> {
        self.set_config(setting.symbology, setting.option, setting.value)
    }

    /// Turn the inter-frame result cache on or off. Cached state is cleared either way.
    ///
    /// With the cache on, a symbol is reported once it has been seen in
    /// enough consecutive frames; [`Symbol::count`](crate::Symbol::count)
    /// then tells new results from repeats.
    pub fn enable_cache(&mut self, enable: bool) {
        self.peer
            .engine()
            .backend()
            .scanner_enable_cache(self.raw(), enable);
        tracing::debug!(enable, "scanner cache reset");
    }

    /// Scan an image for barcodes
    ///
    /// Returns the number of symbols found. The results replace those of the
    /// previous scan and are also attached to `image`.
    pub fn scan_image(&mut self, image: &mut Image) -> Result<usize> {
        let engine = self.peer.engine();
        if !engine.same(image.engine()) {
            return Err(Error::EngineMismatch);
        }

        let n = engine.backend().scanner_scan(self.raw(), image.raw());
        let format = image.format();
        if n < 0 {
            tracing::debug!(%format, "image format not supported by scanner");
            return Err(Error::UnsupportedFormat(format));
        }

        let (width, height) = image.size();
        tracing::debug!(count = n, width, height, %format, "scanned image");
        Ok(n as usize)
    }

    /// Results of the most recent scan; empty before the first one.
    ///
    /// Each call returns a new set that stays valid across later scans.
    pub fn results(&self) -> SymbolSet {
        let engine = self.peer.engine();
        SymbolSet::from_raw(engine, engine.backend().scanner_results(self.raw()))
    }

    /// Release the native scanner now instead of at end of scope.
    pub fn destroy(mut self) {
        self.peer.release();
    }

    pub fn engine(&self) -> &Engine {
        self.peer.engine()
    }

    fn raw(&self) -> RawHandle {
        self.peer.raw()
    }
}

impl fmt::Debug for ImageScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageScanner")
            .field("peer", &self.peer)
            .finish()
    }
}
