//! In-process backend
//!
//! Keeps every native-side object in a handle table guarded by one mutex and
//! follows ZBar's rules for configuration, reference counting and result
//! ownership. It does not decode pixels: each scan reports the next frame of
//! results queued with [`MemoryBackend::push_frame`], filtered through the
//! scanner configuration the way the native decoders would apply it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Backend;
use crate::config::Config;
use crate::handle::RawHandle;
use crate::image::{Crop, Fourcc};
use crate::symbol::SymbolType;

const ENABLE: i32 = Config::Enable as i32;
const EMIT_CHECK: i32 = Config::EmitCheck as i32;
const MIN_LEN: i32 = Config::MinLen as i32;
const MAX_LEN: i32 = Config::MaxLen as i32;
const UNCERTAINTY: i32 = Config::Uncertainty as i32;
const POSITION: i32 = Config::Position as i32;
const X_DENSITY: i32 = Config::XDensity as i32;
const Y_DENSITY: i32 = Config::YDensity as i32;

/// Boolean decoder options occupy codes `0..NUM_BOOL_CONFIGS`.
const NUM_BOOL_CONFIGS: i32 = 5;

const NONE: i32 = SymbolType::None as i32;
const PARTIAL: i32 = SymbolType::Partial as i32;
const COMPOSITE: i32 = SymbolType::Composite as i32;

/// One decode result to report from a scripted scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolRecord {
    pub symbol_type: i32,
    pub data: Vec<u8>,
    pub quality: i32,
    /// Cache count reported while the scanner cache is enabled.
    pub count: i32,
    pub orientation: i32,
    pub configs: u32,
    pub modifiers: u32,
    pub points: Vec<(i32, i32)>,
    pub components: Vec<SymbolRecord>,
}

impl SymbolRecord {
    pub fn new(symbol_type: SymbolType, data: impl Into<Vec<u8>>) -> Self {
        SymbolRecord {
            symbol_type: symbol_type.code(),
            data: data.into(),
            quality: 1,
            orientation: -1,
            ..Default::default()
        }
    }

    pub fn with_points(mut self, points: impl IntoIterator<Item = (i32, i32)>) -> Self {
        self.points = points.into_iter().collect();
        self
    }

    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_count(mut self, count: i32) -> Self {
        self.count = count;
        self
    }

    pub fn with_orientation(mut self, orientation: i32) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_masks(mut self, configs: u32, modifiers: u32) -> Self {
        self.configs = configs;
        self.modifiers = modifiers;
        self
    }

    pub fn with_component(mut self, component: SymbolRecord) -> Self {
        self.components.push(component);
        self
    }
}

/// Snapshot of native-side bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub live_images: usize,
    pub live_scanners: usize,
    pub live_sets: usize,
    pub live_symbols: usize,
    /// Image and scanner destructor calls.
    pub destroy_calls: usize,
    /// Symbol and symbol set reference drops.
    pub release_calls: usize,
    pub type_fetches: usize,
    pub cache_resets: usize,
    pub scans: usize,
}

#[derive(Debug, Default)]
struct ImageState {
    format: Fourcc,
    width: u32,
    height: u32,
    crop: Crop,
    data: Vec<u8>,
    sequence: u32,
    symbols: Option<u64>,
}

#[derive(Debug)]
struct ScannerState {
    settings: HashMap<(i32, i32), i32>,
    /// Report composite symbols; cleared by disabling `Composite` or every symbology.
    composite: bool,
    cache: bool,
    results: Option<u64>,
}

impl Default for ScannerState {
    fn default() -> Self {
        ScannerState {
            settings: HashMap::new(),
            composite: true,
            cache: false,
            results: None,
        }
    }
}

#[derive(Debug)]
struct SetState {
    symbols: Vec<u64>,
    refs: u32,
}

#[derive(Debug)]
struct SymbolState {
    record: SymbolRecord,
    count: i32,
    next: Option<u64>,
    components: Option<u64>,
    refs: u32,
}

#[derive(Debug)]
enum Object {
    Image(ImageState),
    Scanner(ScannerState),
    Set(SetState),
    Symbol(SymbolState),
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    objects: HashMap<u64, Object>,
    frames: VecDeque<Vec<SymbolRecord>>,
    stats: MemoryStats,
}

/// Backend that keeps native state in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the results of one future scan.
    pub fn push_frame(&self, frame: Vec<SymbolRecord>) {
        self.lock().frames.push_back(frame);
    }

    pub fn pending_frames(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn stats(&self) -> MemoryStats {
        let state = self.lock();
        let mut stats = state.stats;
        for object in state.objects.values() {
            match object {
                Object::Image(_) => stats.live_images += 1,
                Object::Scanner(_) => stats.live_scanners += 1,
                Object::Set(_) => stats.live_sets += 1,
                Object::Symbol(_) => stats.live_symbols += 1,
            }
        }
        stats
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn image<T>(&self, image: RawHandle, f: impl FnOnce(&mut ImageState) -> T) -> Option<T> {
        let mut state = self.lock();
        match state.objects.get_mut(&image.get()) {
            Some(Object::Image(img)) => Some(f(img)),
            _ => {
                tracing::warn!(handle = image.get(), "not an image handle");
                None
            }
        }
    }

    fn scanner<T>(&self, scanner: RawHandle, f: impl FnOnce(&mut ScannerState) -> T) -> Option<T> {
        let mut state = self.lock();
        match state.objects.get_mut(&scanner.get()) {
            Some(Object::Scanner(scn)) => Some(f(scn)),
            _ => {
                tracing::warn!(handle = scanner.get(), "not an image scanner handle");
                None
            }
        }
    }

    fn symbol<T>(&self, symbol: RawHandle, f: impl FnOnce(&SymbolState) -> T) -> Option<T> {
        let state = self.lock();
        match state.objects.get(&symbol.get()) {
            Some(Object::Symbol(sym)) => Some(f(sym)),
            _ => {
                tracing::warn!(handle = symbol.get(), "not a symbol handle");
                None
            }
        }
    }
}

impl State {
    fn alloc(&mut self, object: Object) -> RawHandle {
        loop {
            self.next_handle = self.next_handle.wrapping_add(1);
            if let Some(raw) = RawHandle::new(self.next_handle) {
                if !self.objects.contains_key(&raw.get()) {
                    self.objects.insert(raw.get(), object);
                    return raw;
                }
            }
        }
    }

    /// Add a reference to a set or symbol and hand it out.
    fn retain(&mut self, id: u64) -> Option<RawHandle> {
        match self.objects.get_mut(&id) {
            Some(Object::Set(set)) => set.refs += 1,
            Some(Object::Symbol(sym)) => sym.refs += 1,
            _ => return None,
        }
        RawHandle::new(id)
    }

    fn release_set(&mut self, id: u64) {
        let Some(Object::Set(set)) = self.objects.get_mut(&id) else {
            return;
        };
        set.refs = set.refs.saturating_sub(1);
        if set.refs > 0 {
            return;
        }
        if let Some(Object::Set(set)) = self.objects.remove(&id) {
            for sym in set.symbols {
                self.release_symbol(sym);
            }
        }
    }

    fn release_symbol(&mut self, id: u64) {
        let Some(Object::Symbol(sym)) = self.objects.get_mut(&id) else {
            return;
        };
        sym.refs = sym.refs.saturating_sub(1);
        if sym.refs > 0 {
            return;
        }
        if let Some(Object::Symbol(sym)) = self.objects.remove(&id) {
            if let Some(components) = sym.components {
                self.release_set(components);
            }
        }
    }

    /// Build a set holding one reference, owning one reference on each symbol.
    fn build_set(&mut self, records: Vec<SymbolRecord>, cache: bool, position: bool) -> u64 {
        let mut ids = Vec::with_capacity(records.len());
        for mut record in records {
            let components = if record.components.is_empty() {
                None
            } else {
                let parts = std::mem::take(&mut record.components);
                Some(self.build_set(parts, cache, position))
            };
            if !position {
                record.points.clear();
            }
            let count = if cache { record.count } else { 0 };
            let id = self.alloc(Object::Symbol(SymbolState {
                record,
                count,
                next: None,
                components,
                refs: 1,
            }));
            ids.push(id.get());
        }
        for pair in ids.windows(2) {
            if let Some(Object::Symbol(sym)) = self.objects.get_mut(&pair[0]) {
                sym.next = Some(pair[1]);
            }
        }
        self.alloc(Object::Set(SetState {
            symbols: ids,
            refs: 1,
        }))
        .get()
    }
}

fn has_length_limits(sym: i32) -> bool {
    [
        SymbolType::I25,
        SymbolType::Codabar,
        SymbolType::Code39,
        SymbolType::Code93,
        SymbolType::Code128,
        SymbolType::Pdf417,
    ]
    .iter()
    .any(|s| s.code() == sym)
}

fn is_decodable(sym: i32) -> bool {
    SymbolType::ALL.iter().any(|s| s.code() == sym)
}

/// Symbologies with per-symbology scanner settings.
fn has_scanner_slot(sym: i32) -> bool {
    is_decodable(sym) || sym == COMPOSITE
}

fn default_config(sym: i32, cfg: i32) -> i32 {
    let sym = SymbolType::from(sym);
    match cfg {
        ENABLE => i32::from(matches!(
            sym,
            SymbolType::Ean13
                | SymbolType::Ean8
                | SymbolType::I25
                | SymbolType::Databar
                | SymbolType::DatabarExp
                | SymbolType::Codabar
                | SymbolType::Code39
                | SymbolType::Code93
                | SymbolType::Code128
                | SymbolType::QrCode
                | SymbolType::SqCode
        )),
        EMIT_CHECK => i32::from(matches!(
            sym,
            SymbolType::Ean13
                | SymbolType::Ean8
                | SymbolType::Upca
                | SymbolType::Upce
                | SymbolType::Isbn10
                | SymbolType::Isbn13
        )),
        MIN_LEN => match sym {
            SymbolType::I25 => 6,
            SymbolType::Codabar => 4,
            SymbolType::Code39 => 1,
            _ => 0,
        },
        MAX_LEN => match sym {
            SymbolType::I25 | SymbolType::Codabar | SymbolType::Code39 => 256,
            _ => 0,
        },
        UNCERTAINTY => match sym {
            SymbolType::Ean2
            | SymbolType::Ean5
            | SymbolType::Ean8
            | SymbolType::Ean13
            | SymbolType::Upca
            | SymbolType::Upce
            | SymbolType::Isbn10
            | SymbolType::Isbn13
            | SymbolType::I25
            | SymbolType::Databar
            | SymbolType::DatabarExp => 2,
            SymbolType::Codabar => 1,
            _ => 0,
        },
        POSITION | X_DENSITY | Y_DENSITY => 1,
        _ => 0,
    }
}

impl ScannerState {
    fn get(&self, sym: i32, cfg: i32) -> i32 {
        self.settings
            .get(&(sym, cfg))
            .copied()
            .unwrap_or_else(|| default_config(sym, cfg))
    }

    fn is_enabled(&self, sym: i32) -> bool {
        if sym == COMPOSITE {
            return self.composite;
        }
        !is_decodable(sym) || self.get(sym, ENABLE) != 0
    }

    fn decoder_set(&mut self, sym: i32, cfg: i32, val: i32) -> bool {
        // the wildcard succeeds when at least one symbology took the option
        if sym == NONE {
            let mut accepted = false;
            for s in SymbolType::ALL {
                accepted |= self.decoder_set(s.code(), cfg, val);
            }
            return accepted;
        }
        if (0..NUM_BOOL_CONFIGS).contains(&cfg) {
            if !is_decodable(sym) || !(val == 0 || val == 1) {
                return false;
            }
        } else if cfg == MIN_LEN || cfg == MAX_LEN {
            if !has_length_limits(sym) {
                return false;
            }
        } else {
            return false;
        }
        self.settings.insert((sym, cfg), val);
        true
    }

    fn set(&mut self, sym: i32, cfg: i32, val: i32) -> bool {
        if sym == COMPOSITE && cfg == ENABLE {
            self.composite = val != 0;
            return true;
        }

        if cfg < UNCERTAINTY {
            let accepted = self.decoder_set(sym, cfg, val);
            if accepted && sym == NONE && cfg == ENABLE {
                self.composite = val != 0;
            }
            return accepted;
        }

        if cfg < POSITION {
            if cfg != UNCERTAINTY {
                return false;
            }
            if sym > PARTIAL {
                if !has_scanner_slot(sym) {
                    return false;
                }
                self.settings.insert((sym, cfg), val);
            } else {
                for s in SymbolType::ALL {
                    self.settings.insert((s.code(), cfg), val);
                }
                self.settings.insert((COMPOSITE, cfg), val);
            }
            return true;
        }

        // image scanner parameters apply only to the scanner itself
        if sym > PARTIAL {
            return false;
        }
        match cfg {
            X_DENSITY | Y_DENSITY => {
                self.settings.insert((NONE, cfg), val);
                true
            }
            POSITION if val == 0 || val == 1 => {
                self.settings.insert((NONE, cfg), val);
                true
            }
            _ => false,
        }
    }

    fn lookup(&self, sym: i32, cfg: i32) -> Option<i32> {
        if sym < PARTIAL || sym > SymbolType::Code128.code() || sym == COMPOSITE {
            return None;
        }

        if cfg < UNCERTAINTY {
            let valid = if (0..NUM_BOOL_CONFIGS).contains(&cfg) {
                is_decodable(sym)
            } else {
                (cfg == MIN_LEN || cfg == MAX_LEN) && has_length_limits(sym)
            };
            return valid.then(|| self.get(sym, cfg));
        }

        if cfg < POSITION {
            if sym == PARTIAL || cfg != UNCERTAINTY || !has_scanner_slot(sym) {
                return None;
            }
            return Some(self.get(sym, cfg));
        }

        if sym > PARTIAL {
            return None;
        }
        matches!(cfg, POSITION | X_DENSITY | Y_DENSITY).then(|| self.get(NONE, cfg))
    }
}

impl Backend for MemoryBackend {
    fn image_create(&self) -> Option<RawHandle> {
        Some(self.lock().alloc(Object::Image(ImageState::default())))
    }

    fn image_destroy(&self, image: RawHandle) {
        let mut state = self.lock();
        state.stats.destroy_calls += 1;
        if let Some(Object::Image(img)) = state.objects.remove(&image.get()) {
            if let Some(set) = img.symbols {
                state.release_set(set);
            }
        }
    }

    fn image_convert(&self, image: RawHandle, format: Fourcc) -> Option<RawHandle> {
        let mut state = self.lock();
        let Some(Object::Image(src)) = state.objects.get(&image.get()) else {
            return None;
        };
        // grayscale aliases share one layout; everything else needs real pixel conversion
        if !(src.format.is_luma() && format.is_luma()) {
            return None;
        }
        let copy = ImageState {
            format,
            width: src.width,
            height: src.height,
            crop: src.crop,
            data: src.data.clone(),
            sequence: src.sequence,
            symbols: None,
        };
        Some(state.alloc(Object::Image(copy)))
    }

    fn image_format(&self, image: RawHandle) -> Fourcc {
        self.image(image, |img| img.format).unwrap_or_default()
    }

    fn image_set_format(&self, image: RawHandle, format: Fourcc) {
        self.image(image, |img| img.format = format);
    }

    fn image_sequence(&self, image: RawHandle) -> u32 {
        self.image(image, |img| img.sequence).unwrap_or(0)
    }

    fn image_set_sequence(&self, image: RawHandle, sequence: u32) {
        self.image(image, |img| img.sequence = sequence);
    }

    fn image_size(&self, image: RawHandle) -> (u32, u32) {
        self.image(image, |img| (img.width, img.height))
            .unwrap_or((0, 0))
    }

    fn image_set_size(&self, image: RawHandle, width: u32, height: u32) {
        self.image(image, |img| {
            img.width = width;
            img.height = height;
            img.crop = Crop::new(0, 0, width, height);
        });
    }

    fn image_crop(&self, image: RawHandle) -> Crop {
        self.image(image, |img| img.crop).unwrap_or_default()
    }

    fn image_set_crop(&self, image: RawHandle, crop: Crop) {
        self.image(image, |img| img.crop = crop.clamped(img.width, img.height));
    }

    fn image_data(&self, image: RawHandle) -> Vec<u8> {
        self.image(image, |img| img.data.clone()).unwrap_or_default()
    }

    fn image_set_data(&self, image: RawHandle, data: &[u8]) {
        self.image(image, |img| img.data = data.to_vec());
    }

    fn image_symbols(&self, image: RawHandle) -> Option<RawHandle> {
        let mut state = self.lock();
        let set = match state.objects.get(&image.get()) {
            Some(Object::Image(img)) => img.symbols?,
            _ => return None,
        };
        state.retain(set)
    }

    fn scanner_create(&self) -> Option<RawHandle> {
        Some(self.lock().alloc(Object::Scanner(ScannerState::default())))
    }

    fn scanner_destroy(&self, scanner: RawHandle) {
        let mut state = self.lock();
        state.stats.destroy_calls += 1;
        if let Some(Object::Scanner(scn)) = state.objects.remove(&scanner.get()) {
            if let Some(set) = scn.results {
                state.release_set(set);
            }
        }
    }

    fn scanner_set_config(&self, scanner: RawHandle, symbology: i32, option: i32, value: i32) -> bool {
        self.scanner(scanner, |scn| scn.set(symbology, option, value))
            .unwrap_or(false)
    }

    fn scanner_config(&self, scanner: RawHandle, symbology: i32, option: i32) -> Option<i32> {
        self.scanner(scanner, |scn| scn.lookup(symbology, option))
            .flatten()
    }

    fn scanner_enable_cache(&self, scanner: RawHandle, enable: bool) {
        let mut state = self.lock();
        if let Some(Object::Scanner(scn)) = state.objects.get_mut(&scanner.get()) {
            scn.cache = enable;
            state.stats.cache_resets += 1;
        }
    }

    fn scanner_scan(&self, scanner: RawHandle, image: RawHandle) -> i32 {
        let mut state = self.lock();
        match state.objects.get(&image.get()) {
            Some(Object::Image(img)) if img.format.is_luma() => {}
            _ => return -1,
        }
        let (cache, position, records) = match state.objects.get(&scanner.get()) {
            Some(Object::Scanner(scn)) => {
                let frame = state.frames.front().cloned().unwrap_or_default();
                let records: Vec<SymbolRecord> = frame
                    .into_iter()
                    .filter(|r| scn.is_enabled(r.symbol_type))
                    .collect();
                (scn.cache, scn.get(NONE, POSITION) != 0, records)
            }
            _ => return -1,
        };
        state.frames.pop_front();
        state.stats.scans += 1;

        let count = records.len() as i32;
        let set = state.build_set(records, cache, position);

        // the scanner keeps the set's initial reference, the image takes another
        let previous = match state.objects.get_mut(&scanner.get()) {
            Some(Object::Scanner(scn)) => scn.results.replace(set),
            _ => None,
        };
        if let Some(old) = previous {
            state.release_set(old);
        }
        state.retain(set);
        let previous = match state.objects.get_mut(&image.get()) {
            Some(Object::Image(img)) => img.symbols.replace(set),
            _ => None,
        };
        if let Some(old) = previous {
            state.release_set(old);
        }

        tracing::debug!(scanner = scanner.get(), count, "memory scan");
        count
    }

    fn scanner_results(&self, scanner: RawHandle) -> Option<RawHandle> {
        let mut state = self.lock();
        let set = match state.objects.get(&scanner.get()) {
            Some(Object::Scanner(scn)) => scn.results?,
            _ => return None,
        };
        state.retain(set)
    }

    fn symbol_set_release(&self, set: RawHandle) {
        let mut state = self.lock();
        state.stats.release_calls += 1;
        state.release_set(set.get());
    }

    fn symbol_set_size(&self, set: RawHandle) -> i32 {
        match self.lock().objects.get(&set.get()) {
            Some(Object::Set(set)) => set.symbols.len() as i32,
            _ => 0,
        }
    }

    fn symbol_set_first(&self, set: RawHandle) -> Option<RawHandle> {
        let mut state = self.lock();
        let first = match state.objects.get(&set.get()) {
            Some(Object::Set(set)) => *set.symbols.first()?,
            _ => return None,
        };
        state.retain(first)
    }

    fn symbol_release(&self, symbol: RawHandle) {
        let mut state = self.lock();
        state.stats.release_calls += 1;
        state.release_symbol(symbol.get());
    }

    fn symbol_next(&self, symbol: RawHandle) -> Option<RawHandle> {
        let mut state = self.lock();
        let next = match state.objects.get(&symbol.get()) {
            Some(Object::Symbol(sym)) => sym.next?,
            _ => return None,
        };
        state.retain(next)
    }

    fn symbol_type(&self, symbol: RawHandle) -> i32 {
        self.lock().stats.type_fetches += 1;
        self.symbol(symbol, |s| s.record.symbol_type).unwrap_or(NONE)
    }

    fn symbol_configs(&self, symbol: RawHandle) -> u32 {
        self.symbol(symbol, |s| s.record.configs).unwrap_or(0)
    }

    fn symbol_modifiers(&self, symbol: RawHandle) -> u32 {
        self.symbol(symbol, |s| s.record.modifiers).unwrap_or(0)
    }

    fn symbol_data(&self, symbol: RawHandle) -> Vec<u8> {
        self.symbol(symbol, |s| s.record.data.clone())
            .unwrap_or_default()
    }

    fn symbol_quality(&self, symbol: RawHandle) -> i32 {
        self.symbol(symbol, |s| s.record.quality).unwrap_or(0)
    }

    fn symbol_count(&self, symbol: RawHandle) -> i32 {
        self.symbol(symbol, |s| s.count).unwrap_or(0)
    }

    fn symbol_orientation(&self, symbol: RawHandle) -> i32 {
        self.symbol(symbol, |s| s.record.orientation).unwrap_or(-1)
    }

    fn symbol_location_size(&self, symbol: RawHandle) -> u32 {
        self.symbol(symbol, |s| s.record.points.len() as u32)
            .unwrap_or(0)
    }

    fn symbol_location_x(&self, symbol: RawHandle, index: u32) -> i32 {
        self.symbol(symbol, |s| s.record.points.get(index as usize).map(|p| p.0))
            .flatten()
            .unwrap_or(-1)
    }

    fn symbol_location_y(&self, symbol: RawHandle, index: u32) -> i32 {
        self.symbol(symbol, |s| s.record.points.get(index as usize).map(|p| p.1))
            .flatten()
            .unwrap_or(-1)
    }

    fn symbol_components(&self, symbol: RawHandle) -> Option<RawHandle> {
        let mut state = self.lock();
        let set = match state.objects.get(&symbol.get()) {
            Some(Object::Symbol(sym)) => sym.components?,
            _ => return None,
        };
        state.retain(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(backend: &MemoryBackend) -> RawHandle {
        backend.scanner_create().unwrap()
    }

    #[test]
    fn test_wildcard_config_applies_to_every_symbology() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        assert!(backend.scanner_set_config(scn, NONE, ENABLE, 0));
        assert!(backend.scanner_set_config(scn, NONE, MIN_LEN, 3));
        assert_eq!(backend.scanner_config(scn, SymbolType::QrCode.code(), ENABLE), Some(0));
        assert_eq!(backend.scanner_config(scn, SymbolType::Code39.code(), MIN_LEN), Some(3));
    }

    #[test]
    fn test_wildcard_rejects_unknown_options() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        assert!(!backend.scanner_set_config(scn, NONE, 0x07, 1));
        assert!(!backend.scanner_set_config(scn, NONE, 0x30, 9));
        assert!(!backend.scanner_set_config(scn, NONE, ENABLE, 2));
        assert_eq!(backend.scanner_config(scn, SymbolType::QrCode.code(), ENABLE), Some(1));
    }

    #[test]
    fn test_composite_can_be_disabled() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        let img = backend.image_create().unwrap();
        backend.image_set_format(img, Fourcc::Y800);
        let frame = || {
            vec![
                SymbolRecord::new(SymbolType::Composite, "a b")
                    .with_component(SymbolRecord::new(SymbolType::Ean13, "a")),
                SymbolRecord::new(SymbolType::QrCode, "q"),
            ]
        };

        backend.push_frame(frame());
        assert_eq!(backend.scanner_scan(scn, img), 2);

        assert!(backend.scanner_set_config(scn, COMPOSITE, ENABLE, 0));
        backend.push_frame(frame());
        assert_eq!(backend.scanner_scan(scn, img), 1);

        assert!(backend.scanner_set_config(scn, COMPOSITE, ENABLE, 1));
        backend.push_frame(frame());
        assert_eq!(backend.scanner_scan(scn, img), 2);
    }

    #[test]
    fn test_length_limits_only_for_variable_length() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        assert!(backend.scanner_set_config(scn, SymbolType::Code128.code(), MIN_LEN, 4));
        assert!(!backend.scanner_set_config(scn, SymbolType::Ean13.code(), MIN_LEN, 4));
        assert!(!backend.scanner_set_config(scn, SymbolType::QrCode.code(), MAX_LEN, 4));
        assert_eq!(backend.scanner_config(scn, SymbolType::Ean13.code(), MIN_LEN), None);
    }

    #[test]
    fn test_boolean_values_are_checked() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        assert!(backend.scanner_set_config(scn, SymbolType::Ean8.code(), ENABLE, 1));
        assert!(!backend.scanner_set_config(scn, SymbolType::Ean8.code(), ENABLE, 2));
        assert!(!backend.scanner_set_config(scn, NONE, POSITION, 5));
        assert!(backend.scanner_set_config(scn, NONE, POSITION, 0));
        assert_eq!(backend.scanner_config(scn, PARTIAL, POSITION), Some(0));
    }

    #[test]
    fn test_scanner_options_reject_symbologies() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        assert!(!backend.scanner_set_config(scn, SymbolType::QrCode.code(), X_DENSITY, 2));
        assert!(backend.scanner_set_config(scn, PARTIAL, Y_DENSITY, 3));
        assert_eq!(backend.scanner_config(scn, PARTIAL, Y_DENSITY), Some(3));
        assert!(!backend.scanner_set_config(scn, NONE, 0x102, 1));
        assert!(!backend.scanner_set_config(scn, NONE, UNCERTAINTY + 1, 1));
    }

    #[test]
    fn test_uncertainty_defaults_and_overrides() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        assert_eq!(backend.scanner_config(scn, SymbolType::Ean13.code(), UNCERTAINTY), Some(2));
        assert_eq!(backend.scanner_config(scn, SymbolType::Codabar.code(), UNCERTAINTY), Some(1));
        assert!(backend.scanner_set_config(scn, NONE, UNCERTAINTY, 0));
        assert_eq!(backend.scanner_config(scn, SymbolType::Ean13.code(), UNCERTAINTY), Some(0));
        assert_eq!(backend.scanner_config(scn, PARTIAL, UNCERTAINTY), None);
    }

    #[test]
    fn test_unknown_symbology_rejected() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        assert!(!backend.scanner_set_config(scn, 999, ENABLE, 1));
        assert!(!backend.scanner_set_config(scn, PARTIAL, ENABLE, 1));
        assert!(backend.scanner_set_config(scn, COMPOSITE, ENABLE, 0));
    }

    #[test]
    fn test_scan_rejects_color_images() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        let img = backend.image_create().unwrap();
        backend.image_set_format(img, "RGB3".parse().unwrap());
        backend.push_frame(vec![SymbolRecord::new(SymbolType::QrCode, "x")]);
        assert_eq!(backend.scanner_scan(scn, img), -1);
        assert_eq!(backend.pending_frames(), 1);
    }

    #[test]
    fn test_scan_filters_disabled_symbologies() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        let img = backend.image_create().unwrap();
        backend.image_set_format(img, Fourcc::Y800);

        assert!(backend.scanner_set_config(scn, SymbolType::QrCode.code(), ENABLE, 0));
        backend.push_frame(vec![
            SymbolRecord::new(SymbolType::QrCode, "qr"),
            SymbolRecord::new(SymbolType::Upca, "012345678905"),
            SymbolRecord::new(SymbolType::Code128, "c128"),
        ]);
        assert_eq!(backend.scanner_scan(scn, img), 1);

        let set = backend.scanner_results(scn).unwrap();
        assert_eq!(backend.symbol_set_size(set), 1);
        let first = backend.symbol_set_first(set).unwrap();
        assert_eq!(backend.symbol_data(first), b"c128");
        assert_eq!(backend.symbol_next(first), None);
    }

    #[test]
    fn test_position_disabled_drops_points() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        let img = backend.image_create().unwrap();
        backend.image_set_format(img, Fourcc::GREY);
        assert!(backend.scanner_set_config(scn, NONE, POSITION, 0));

        backend.push_frame(vec![
            SymbolRecord::new(SymbolType::QrCode, "qr").with_points([(0, 0), (3, 3)])
        ]);
        backend.scanner_scan(scn, img);
        let set = backend.scanner_results(scn).unwrap();
        let first = backend.symbol_set_first(set).unwrap();
        assert_eq!(backend.symbol_location_size(first), 0);
    }

    #[test]
    fn test_reference_counting() {
        let backend = MemoryBackend::new();
        let scn = scanner(&backend);
        let img = backend.image_create().unwrap();
        backend.image_set_format(img, Fourcc::Y800);
        backend.push_frame(vec![
            SymbolRecord::new(SymbolType::QrCode, "a"),
            SymbolRecord::new(SymbolType::QrCode, "b"),
        ]);
        backend.scanner_scan(scn, img);

        let set = backend.scanner_results(scn).unwrap();
        let first = backend.symbol_set_first(set).unwrap();
        backend.symbol_set_release(set);
        backend.scanner_destroy(scn);
        backend.image_destroy(img);

        // the caller still holds the first symbol
        let stats = backend.stats();
        assert_eq!(stats.live_sets, 0);
        assert_eq!(stats.live_symbols, 1);
        assert_eq!(backend.symbol_data(first), b"a");

        backend.symbol_release(first);
        assert_eq!(backend.stats().live_symbols, 0);
    }
}
