//! Decoded symbols and result sets
//!
//! A [`SymbolSet`] copies the native result list into an owned, ordered
//! vector when it is created. Every [`Symbol`] in it holds its own native
//! reference, so iteration is unaffected by later scans on the same scanner.

use std::fmt::{self, Display};
use std::iter::FusedIterator;
use std::sync::OnceLock;

use crate::backend::Engine;
use crate::handle::{Peer, PeerKind, RawHandle};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum SymbolType {
    /// No symbol decoded; as a configuration target, every symbology.
    #[default]
    None = 0,
    /// Symbol detected but not decoded; as a configuration target, the scanner itself.
    Partial = 1,
    Ean2 = 2,
    Ean5 = 5,
    Ean8 = 8,
    Upce = 9,
    Isbn10 = 10,
    Upca = 12,
    Ean13 = 13,
    Isbn13 = 14,
    Composite = 15,
    I25 = 25,
    Databar = 34,
    DatabarExp = 35,
    Codabar = 38,
    Code39 = 39,
    Pdf417 = 57,
    QrCode = 64,
    SqCode = 80,
    Code93 = 93,
    Code128 = 128,
}

impl SymbolType {
    /// Every symbology a decoder can be configured for.
    pub const ALL: [Self; 18] = [
        SymbolType::Ean13,
        SymbolType::Ean2,
        SymbolType::Ean5,
        SymbolType::Ean8,
        SymbolType::Upca,
        SymbolType::Upce,
        SymbolType::Isbn10,
        SymbolType::Isbn13,
        SymbolType::I25,
        SymbolType::Databar,
        SymbolType::DatabarExp,
        SymbolType::Codabar,
        SymbolType::Code39,
        SymbolType::Code93,
        SymbolType::Code128,
        SymbolType::QrCode,
        SymbolType::SqCode,
        SymbolType::Pdf417,
    ];

    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "None",
                Self::Partial => "Partial",
                Self::Ean2 => "EAN-2",
                Self::Ean5 => "EAN-5",
                Self::Ean8 => "EAN-8",
                Self::Upce => "UPC-E",
                Self::Isbn10 => "ISBN-10",
                Self::Upca => "UPC-A",
                Self::Ean13 => "EAN-13",
                Self::Isbn13 => "ISBN-13",
                Self::Composite => "COMPOSITE",
                Self::I25 => "I2/5",
                Self::Databar => "DataBar",
                Self::DatabarExp => "DataBar-Exp",
                Self::Codabar => "Codabar",
                Self::Code39 => "CODE-39",
                Self::Pdf417 => "PDF417",
                Self::QrCode => "QR-Code",
                Self::SqCode => "SQ-Code",
                Self::Code93 => "CODE-93",
                Self::Code128 => "CODE-128",
            }
        )
    }
}

impl From<SymbolType> for i32 {
    fn from(value: SymbolType) -> Self {
        value as i32
    }
}

impl From<i32> for SymbolType {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Partial,
            2 => Self::Ean2,
            5 => Self::Ean5,
            8 => Self::Ean8,
            9 => Self::Upce,
            10 => Self::Isbn10,
            12 => Self::Upca,
            13 => Self::Ean13,
            14 => Self::Isbn13,
            15 => Self::Composite,
            25 => Self::I25,
            34 => Self::Databar,
            35 => Self::DatabarExp,
            38 => Self::Codabar,
            39 => Self::Code39,
            57 => Self::Pdf417,
            64 => Self::QrCode,
            80 => Self::SqCode,
            93 => Self::Code93,
            128 => Self::Code128,
            _ => Self::None,
        }
    }
}

/// Axis-aligned orientation of a decoded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Unknown,
    Up,
    Right,
    Down,
    Left,
}

impl From<i32> for Orientation {
    fn from(value: i32) -> Self {
        match value {
            0 => Orientation::Up,
            1 => Orientation::Right,
            2 => Orientation::Down,
            3 => Orientation::Left,
            _ => Orientation::Unknown,
        }
    }
}

/// Inter-frame reliability of a result, decoded from [`Symbol::count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Seen, but not yet consistently enough to report.
    Uncertain,
    /// Verified by this frame.
    Verified,
    /// Reported before; the payload is the number of repeats.
    Duplicate(u32),
}

impl From<i32> for CacheStatus {
    fn from(count: i32) -> Self {
        match count {
            c if c < 0 => CacheStatus::Uncertain,
            0 => CacheStatus::Verified,
            c => CacheStatus::Duplicate(c.unsigned_abs()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Bounding box as `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    /// Smallest box containing every point; `None` without points.
    pub fn enclosing<I>(points: I) -> Option<Bounds>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut xmin, mut xmax, mut ymin, mut ymax) = (first.x, first.x, first.y, first.y);
        for p in points {
            xmin = xmin.min(p.x);
            xmax = xmax.max(p.x);
            ymin = ymin.min(p.y);
            ymax = ymax.max(p.y);
        }
        Some(Bounds {
            x: xmin,
            y: ymin,
            width: xmax.wrapping_sub(xmin),
            height: ymax.wrapping_sub(ymin),
        })
    }
}

impl From<Bounds> for [i32; 4] {
    fn from(b: Bounds) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One decoded barcode. Immutable once decoded.
pub struct Symbol {
    peer: Peer,
    raw_type: OnceLock<i32>,
}

impl Symbol {
    pub(crate) fn from_raw(engine: &Engine, raw: RawHandle) -> Self {
        Symbol {
            peer: Peer::new(engine.clone(), PeerKind::Symbol, raw),
            raw_type: OnceLock::new(),
        }
    }

    /// Symbology code as reported by the engine.
    ///
    /// Fetched on first use and cached for the life of this value, including
    /// a code of zero.
    pub fn raw_type(&self) -> i32 {
        *self
            .raw_type
            .get_or_init(|| self.peer.engine().backend().symbol_type(self.peer.raw()))
    }

    /// Get the symbol type
    pub fn symbol_type(&self) -> SymbolType {
        SymbolType::from(self.raw_type())
    }

    /// Boolean configs in effect while decoding, one bit per [`Config`](crate::Config) code.
    pub fn config_mask(&self) -> u32 {
        self.backend_call(|b, h| b.symbol_configs(h))
    }

    /// Symbology characteristics detected while decoding.
    pub fn modifier_mask(&self) -> u32 {
        self.backend_call(|b, h| b.symbol_modifiers(h))
    }

    /// Get the decoded data as bytes
    pub fn data_bytes(&self) -> Vec<u8> {
        self.backend_call(|b, h| b.symbol_data(h))
    }

    /// Decoded data as text; invalid UTF-8 is replaced.
    pub fn data(&self) -> String {
        String::from_utf8_lossy(&self.data_bytes()).into_owned()
    }

    /// Get the decoded data as a string (if valid UTF-8)
    pub fn data_string(&self) -> Option<String> {
        String::from_utf8(self.data_bytes()).ok()
    }

    /// Unscaled, relative confidence: larger is better.
    pub fn quality(&self) -> i32 {
        self.backend_call(|b, h| b.symbol_quality(h))
    }

    /// Cache count: < 0 uncertain, 0 newly verified, > 0 duplicate.
    ///
    /// Only meaningful when the scanner cache is enabled.
    pub fn count(&self) -> i32 {
        self.backend_call(|b, h| b.symbol_count(h))
    }

    pub fn cache_status(&self) -> CacheStatus {
        CacheStatus::from(self.count())
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from(self.backend_call(|b, h| b.symbol_orientation(h)))
    }

    pub fn location_size(&self) -> usize {
        self.backend_call(|b, h| b.symbol_location_size(h)) as usize
    }

    pub fn location_point(&self, index: usize) -> Option<Point> {
        if index >= self.location_size() {
            return None;
        }
        let index = index as u32;
        Some(self.backend_call(|b, h| Point {
            x: b.symbol_location_x(h, index),
            y: b.symbol_location_y(h, index),
        }))
    }

    /// Location polygon, in the order the decoder reported it.
    pub fn locations(&self) -> Vec<Point> {
        let n = self.backend_call(|b, h| b.symbol_location_size(h));
        (0..n)
            .map(|i| {
                self.backend_call(|b, h| Point {
                    x: b.symbol_location_x(h, i),
                    y: b.symbol_location_y(h, i),
                })
            })
            .collect()
    }

    /// Approximate axis-aligned bounding box, `None` without location points.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.locations())
    }

    /// Get the component symbols (for composite symbols like EAN+add-on or QR structured append)
    ///
    /// The returned set holds its own reference and may outlive this symbol.
    pub fn components(&self) -> SymbolSet {
        let engine = self.peer.engine();
        SymbolSet::from_raw(engine, engine.backend().symbol_components(self.peer.raw()))
    }

    /// Release the native symbol now instead of at end of scope.
    pub fn destroy(mut self) {
        self.peer.release();
    }

    fn backend_call<T>(&self, f: impl FnOnce(&dyn crate::backend::Backend, RawHandle) -> T) -> T {
        f(self.peer.engine().backend(), self.peer.raw())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("peer", &self.peer)
            .field("raw_type", &self.raw_type.get())
            .finish()
    }
}

/// Iterator over symbols
///
/// Forward only. Advancing past the end keeps returning `None`;
/// [`SymbolIterator::try_next`] reports it as [`Error::EndOfIteration`].
pub struct SymbolIterator<'a> {
    iter: std::slice::Iter<'a, Symbol>,
}

impl<'a> SymbolIterator<'a> {
    pub fn has_next(&self) -> bool {
        self.iter.len() > 0
    }

    pub fn try_next(&mut self) -> Result<&'a Symbol> {
        self.iter.next().ok_or(Error::EndOfIteration)
    }

    /// Results are immutable; this always fails.
    pub fn remove(&mut self) -> Result<()> {
        Err(Error::Unsupported("SymbolIterator is immutable"))
    }
}

impl<'a> Iterator for SymbolIterator<'a> {
    type Item = &'a Symbol;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl ExactSizeIterator for SymbolIterator<'_> {}

impl FusedIterator for SymbolIterator<'_> {}

/// Collection of decoded symbols, in decode order
pub struct SymbolSet {
    symbols: Vec<Symbol>,
    peer: Option<Peer>,
}

impl SymbolSet {
    /// Take ownership of a native set reference and copy out its symbol list.
    pub(crate) fn from_raw(engine: &Engine, raw: Option<RawHandle>) -> Self {
        let Some(raw) = raw else {
            return SymbolSet::empty();
        };
        let peer = Peer::new(engine.clone(), PeerKind::SymbolSet, raw);
        let backend = engine.backend();

        let mut symbols = Vec::new();
        let mut cursor = backend.symbol_set_first(raw);
        while let Some(sym) = cursor {
            let symbol = Symbol::from_raw(engine, sym);
            cursor = backend.symbol_next(sym);
            symbols.push(symbol);
        }

        SymbolSet {
            symbols,
            peer: Some(peer),
        }
    }

    pub fn empty() -> Self {
        SymbolSet {
            symbols: Vec::new(),
            peer: None,
        }
    }

    /// Get an iterator over the symbols
    pub fn iter(&self) -> SymbolIterator<'_> {
        SymbolIterator {
            iter: self.symbols.iter(),
        }
    }

    /// Check if there are any symbols
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of symbols, as reported by the engine.
    pub fn len(&self) -> usize {
        match &self.peer {
            Some(peer) => {
                let size = peer.engine().backend().symbol_set_size(peer.raw());
                usize::try_from(size).unwrap_or(0)
            }
            None => 0,
        }
    }

    pub fn first(&self) -> Option<&Symbol> {
        self.symbols.first()
    }

    /// Release the native set and every symbol copied out of it.
    pub fn destroy(mut self) {
        self.symbols.clear();
        if let Some(peer) = self.peer.as_mut() {
            peer.release();
        }
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        SymbolSet::empty()
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = &'a Symbol;
    type IntoIter = SymbolIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.symbols.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryBackend, SymbolRecord};
    use crate::{Image, ImageScanner};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn scan(backend: &Arc<MemoryBackend>, frame: Vec<SymbolRecord>) -> (Engine, SymbolSet) {
        let engine = Engine::from_shared(backend.clone());
        let mut scanner = ImageScanner::new(&engine).unwrap();
        let mut image = Image::from_gray(&engine, &[0; 16], 4, 4).unwrap();
        backend.push_frame(frame);
        scanner.scan_image(&mut image).unwrap();
        let results = scanner.results();
        (engine, results)
    }

    fn pt(x: i32, y: i32) -> Point {
        Point { x, y }
    }

    #[test]
    fn test_symbol_type_codes() {
        assert_eq!(SymbolType::from(64), SymbolType::QrCode);
        assert_eq!(SymbolType::from(57), SymbolType::Pdf417);
        assert_eq!(SymbolType::from(999), SymbolType::None);
        assert_eq!(i32::from(SymbolType::Code128), 128);
        assert_eq!(SymbolType::DatabarExp.to_string(), "DataBar-Exp");
    }

    #[test]
    fn test_cache_status() {
        assert_eq!(CacheStatus::from(-2), CacheStatus::Uncertain);
        assert_eq!(CacheStatus::from(0), CacheStatus::Verified);
        assert_eq!(CacheStatus::from(3), CacheStatus::Duplicate(3));
    }

    #[test]
    fn test_bounds_of_rectangle() {
        let bounds = Bounds::enclosing([pt(1, 1), pt(5, 1), pt(5, 4), pt(1, 4)]).unwrap();
        assert_eq!(<[i32; 4]>::from(bounds), [1, 1, 4, 3]);
    }

    #[test]
    fn test_bounds_without_points() {
        assert_eq!(Bounds::enclosing(Vec::new()), None);

        let backend = Arc::new(MemoryBackend::new());
        let (_engine, results) = scan(&backend, vec![SymbolRecord::new(SymbolType::Ean13, "1")]);
        assert_eq!(results.first().unwrap().bounds(), None);
    }

    #[test]
    fn test_symbol_bounds_from_locations() {
        let backend = Arc::new(MemoryBackend::new());
        let record = SymbolRecord::new(SymbolType::QrCode, "hello")
            .with_points([(1, 1), (5, 1), (5, 4), (1, 4)]);
        let (_engine, results) = scan(&backend, vec![record]);

        let symbol = results.first().unwrap();
        assert_eq!(symbol.location_size(), 4);
        assert_eq!(symbol.location_point(2), Some(pt(5, 4)));
        assert_eq!(symbol.location_point(4), None);
        assert_eq!(
            symbol.bounds(),
            Some(Bounds {
                x: 1,
                y: 1,
                width: 4,
                height: 3
            })
        );
    }

    #[test]
    fn test_symbol_fields() {
        let backend = Arc::new(MemoryBackend::new());
        let record = SymbolRecord::new(SymbolType::Code128, "ABC-123")
            .with_quality(7)
            .with_orientation(2)
            .with_masks(0b101, 0b10);
        let (_engine, results) = scan(&backend, vec![record]);

        let symbol = results.first().unwrap();
        assert_eq!(symbol.symbol_type(), SymbolType::Code128);
        assert_eq!(symbol.data(), "ABC-123");
        assert_eq!(symbol.data_bytes(), b"ABC-123");
        assert_eq!(symbol.quality(), 7);
        assert_eq!(symbol.orientation(), Orientation::Down);
        assert_eq!(symbol.config_mask(), 0b101);
        assert_eq!(symbol.modifier_mask(), 0b10);
        assert_eq!(symbol.count(), 0);
        assert!(symbol.components().is_empty());
    }

    #[test]
    fn test_invalid_utf8_data() {
        let backend = Arc::new(MemoryBackend::new());
        let record = SymbolRecord::new(SymbolType::QrCode, [0x66, 0xff, 0x6f].as_slice());
        let (_engine, results) = scan(&backend, vec![record]);

        let symbol = results.first().unwrap();
        assert_eq!(symbol.data_string(), None);
        assert_eq!(symbol.data(), "f\u{fffd}o");
    }

    #[test]
    fn test_type_fetched_once() {
        let backend = Arc::new(MemoryBackend::new());
        let (_engine, results) = scan(&backend, vec![SymbolRecord::new(SymbolType::Ean8, "1")]);
        let symbol = results.first().unwrap();

        assert_eq!(backend.stats().type_fetches, 0);
        for _ in 0..3 {
            assert_eq!(symbol.symbol_type(), SymbolType::Ean8);
        }
        assert_eq!(backend.stats().type_fetches, 1);
    }

    #[test]
    fn test_zero_type_fetched_once() {
        let backend = Arc::new(MemoryBackend::new());
        let (_engine, results) = scan(&backend, vec![SymbolRecord::new(SymbolType::None, "")]);
        let symbol = results.first().unwrap();

        assert_eq!(symbol.raw_type(), 0);
        assert_eq!(symbol.raw_type(), 0);
        assert_eq!(backend.stats().type_fetches, 1);
    }

    #[test]
    fn test_iterator_exhaustion() {
        let backend = Arc::new(MemoryBackend::new());
        let (_engine, results) = scan(
            &backend,
            vec![
                SymbolRecord::new(SymbolType::Ean13, "1"),
                SymbolRecord::new(SymbolType::Ean13, "2"),
            ],
        );

        let mut iter = results.iter();
        assert!(iter.has_next());
        assert_eq!(iter.try_next().unwrap().data(), "1");
        assert_eq!(iter.next().unwrap().data(), "2");
        assert!(!iter.has_next());
        assert!(iter.next().is_none());
        assert!(matches!(iter.try_next(), Err(Error::EndOfIteration)));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_remove_always_fails() {
        let backend = Arc::new(MemoryBackend::new());
        let (_engine, results) = scan(&backend, vec![SymbolRecord::new(SymbolType::Ean13, "1")]);

        let mut iter = results.iter();
        assert!(iter.remove().is_err());
        iter.next();
        assert_eq!(
            iter.remove(),
            Err(Error::Unsupported("SymbolIterator is immutable"))
        );

        let mut empty = SymbolSet::empty();
        assert!(empty.iter().remove().is_err());
        empty = SymbolSet::default();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_components_outlive_parent() {
        let backend = Arc::new(MemoryBackend::new());
        let composite = SymbolRecord::new(SymbolType::Composite, "9780201379624 51000")
            .with_component(SymbolRecord::new(SymbolType::Ean13, "9780201379624"))
            .with_component(SymbolRecord::new(SymbolType::Ean5, "51000"));
        let (_engine, results) = scan(&backend, vec![composite]);

        let components = results.first().unwrap().components();
        drop(results);

        assert_eq!(components.len(), 2);
        let types: Vec<_> = components.iter().map(Symbol::symbol_type).collect();
        assert_eq!(types, vec![SymbolType::Ean13, SymbolType::Ean5]);
    }

    #[test]
    fn test_destroy_releases_symbols() {
        let backend = Arc::new(MemoryBackend::new());
        let engine = Engine::from_shared(backend.clone());
        {
            let mut scanner = ImageScanner::new(&engine).unwrap();
            let mut image = Image::from_gray(&engine, &[0; 4], 2, 2).unwrap();
            backend.push_frame(vec![
                SymbolRecord::new(SymbolType::QrCode, "a"),
                SymbolRecord::new(SymbolType::QrCode, "b"),
            ]);
            scanner.scan_image(&mut image).unwrap();

            let results = scanner.results();
            results.destroy();
        }
        let stats = backend.stats();
        assert_eq!(stats.live_sets, 0);
        assert_eq!(stats.live_symbols, 0);
    }

    proptest! {
        #[test]
        fn prop_set_size_matches_iteration(n in 0usize..12) {
            let backend = Arc::new(MemoryBackend::new());
            let frame = (0..n)
                .map(|i| SymbolRecord::new(SymbolType::Code39, i.to_string().as_str()))
                .collect();
            let (_engine, results) = scan(&backend, frame);

            prop_assert_eq!(results.len(), n);
            prop_assert_eq!(results.iter().count(), n);
            prop_assert_eq!(results.is_empty(), n == 0);
        }

        #[test]
        fn prop_bounds_contain_every_point(
            points in prop::collection::vec((-1000i32..1000, -1000i32..1000), 1..16)
        ) {
            let points: Vec<Point> = points.into_iter().map(|(x, y)| pt(x, y)).collect();
            let b = Bounds::enclosing(points.iter().copied()).unwrap();
            for p in &points {
                prop_assert!(p.x >= b.x && p.x <= b.x + b.width);
                prop_assert!(p.y >= b.y && p.y <= b.y + b.height);
            }
            prop_assert!(points.iter().any(|p| p.x == b.x));
            prop_assert!(points.iter().any(|p| p.y == b.y + b.height));
        }
    }
}
