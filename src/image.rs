//! Image handling and format support

use std::fmt;
use std::str::FromStr;

use crate::backend::Engine;
use crate::handle::{Peer, PeerKind, RawHandle};
use crate::symbol::SymbolSet;
use crate::{Error, Result};

/// Four-character pixel format code, packed little-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fourcc(u32);

impl Fourcc {
    /// 8-bit grayscale
    pub const Y800: Fourcc = fourcc(b'Y', b'8', b'0', b'0');
    /// Same as Y800
    pub const GREY: Fourcc = fourcc(b'G', b'R', b'E', b'Y');
    /// Same as Y800
    pub const GRAY: Fourcc = fourcc(b'G', b'R', b'A', b'Y');

    pub const fn from_u32(code: u32) -> Self {
        Fourcc(code)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Single-channel luma formats the scanner accepts.
    pub fn is_luma(self) -> bool {
        self == Self::Y800 || self == Self::GREY || self == Self::GRAY
    }
}

/// Create a fourcc code from 4 bytes
const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> Fourcc {
    Fourcc((a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24))
}

impl FromStr for Fourcc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.as_bytes() {
            &[a, b, c, d] if s.is_ascii() => Ok(fourcc(a, b, c, d)),
            _ => Err(Error::InvalidFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.bytes() {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fourcc({self})")
    }
}

/// Crop rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Crop {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Crop {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp to an image of `width` x `height`.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Crop {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }
}

/// Pixel buffer plus format metadata, owned by the native engine.
pub struct Image {
    peer: Peer,
}

impl Image {
    /// Create a new empty image
    pub fn new(engine: &Engine) -> Result<Self> {
        let raw = engine
            .backend()
            .image_create()
            .ok_or(Error::OutOfMemory("an image"))?;
        Ok(Image {
            peer: Peer::new(engine.clone(), PeerKind::Image, raw),
        })
    }

    pub fn with_size(engine: &Engine, width: u32, height: u32) -> Result<Self> {
        let mut image = Self::new(engine)?;
        image.set_size(width, height);
        Ok(image)
    }

    pub fn with_size_and_format(
        engine: &Engine,
        width: u32,
        height: u32,
        format: Fourcc,
    ) -> Result<Self> {
        let mut image = Self::with_size(engine, width, height)?;
        image.set_format(format);
        Ok(image)
    }

    pub fn with_format(engine: &Engine, format: Fourcc) -> Result<Self> {
        let mut image = Self::new(engine)?;
        image.set_format(format);
        Ok(image)
    }

    /// Create a Y800 image from grayscale data
    pub fn from_gray(engine: &Engine, data: &[u8], width: u32, height: u32) -> Result<Self> {
        let expected = (width as u64) * (height as u64);
        if data.len() as u64 != expected {
            return Err(Error::DataLength {
                expected,
                actual: data.len() as u64,
            });
        }

        let mut image = Self::with_size_and_format(engine, width, height, Fourcc::Y800)?;
        image.set_data(data);
        Ok(image)
    }

    pub(crate) fn from_raw(engine: &Engine, raw: RawHandle) -> Self {
        Image {
            peer: Peer::new(engine.clone(), PeerKind::Image, raw),
        }
    }

    /// Convert to another pixel format.
    ///
    /// Returns `None` when the engine cannot perform the conversion. The
    /// result is an independent image; this one is left untouched.
    pub fn convert(&self, format: Fourcc) -> Option<Image> {
        let engine = self.peer.engine();
        match engine.backend().image_convert(self.raw(), format) {
            Some(raw) => Some(Image::from_raw(engine, raw)),
            None => {
                tracing::debug!(from = %self.format(), to = %format, "image conversion unsupported");
                None
            }
        }
    }

    pub fn format(&self) -> Fourcc {
        self.peer.engine().backend().image_format(self.raw())
    }

    pub fn sequence(&self) -> u32 {
        self.peer.engine().backend().image_sequence(self.raw())
    }

    /// Get the image width
    pub fn width(&self) -> u32 {
        self.size().0
    }

    /// Get the image height
    pub fn height(&self) -> u32 {
        self.size().1
    }

    pub fn size(&self) -> (u32, u32) {
        self.peer.engine().backend().image_size(self.raw())
    }

    pub fn crop(&self) -> Crop {
        self.peer.engine().backend().image_crop(self.raw())
    }

    /// Copy of the raw image data
    pub fn data(&self) -> Vec<u8> {
        self.peer.engine().backend().image_data(self.raw())
    }

    /// Get the symbols found in this image (if it has been scanned)
    pub fn symbols(&self) -> SymbolSet {
        let engine = self.peer.engine();
        SymbolSet::from_raw(engine, engine.backend().image_symbols(self.raw()))
    }

    pub fn set_format(&mut self, format: Fourcc) {
        self.peer.engine().backend().image_set_format(self.raw(), format);
    }

    /// Tag the image with a frame number, e.g. for video.
    pub fn set_sequence(&mut self, sequence: u32) {
        self.peer
            .engine()
            .backend()
            .image_set_sequence(self.raw(), sequence);
    }

    /// Resize; the crop rectangle is reset to cover the whole image.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.peer
            .engine()
            .backend()
            .image_set_size(self.raw(), width, height);
    }

    /// Restrict scanning to a rectangle, clamped to the image bounds.
    pub fn set_crop(&mut self, crop: Crop) {
        self.peer.engine().backend().image_set_crop(self.raw(), crop);
    }

    /// Replace the image data with a copy of `data`.
    pub fn set_data(&mut self, data: &[u8]) {
        self.peer.engine().backend().image_set_data(self.raw(), data);
    }

    /// Replace the image data with packed pixel words, in native byte order.
    pub fn set_packed_data(&mut self, data: &[u32]) {
        let bytes: Vec<u8> = data.iter().flat_map(|word| word.to_ne_bytes()).collect();
        self.set_data(&bytes);
    }

    /// Release the native image now instead of at end of scope.
    pub fn destroy(mut self) {
        self.peer.release();
    }

    pub fn engine(&self) -> &Engine {
        self.peer.engine()
    }

    pub(crate) fn raw(&self) -> RawHandle {
        self.peer.raw()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image").field("peer", &self.peer).finish()
    }
}
