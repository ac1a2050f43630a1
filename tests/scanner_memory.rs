//! End-to-end scanning flows against the in-process backend

use std::sync::Arc;

use zbar_bind::backend::memory::{MemoryBackend, SymbolRecord};
use zbar_bind::config::{Code128, Ean13, QrCode, ScannerSettings};
use zbar_bind::{CacheStatus, Config, Engine, Fourcc, Image, ImageScanner, SymbolType};

fn engine() -> (Arc<MemoryBackend>, Engine) {
    let backend = Arc::new(MemoryBackend::new());
    let engine = Engine::from_shared(backend.clone());
    (backend, engine)
}

#[test]
fn test_video_frames_with_cache() {
    let (backend, engine) = engine();
    let mut scanner = ImageScanner::new(&engine).unwrap();
    scanner.enable_cache(true);

    let record = SymbolRecord::new(SymbolType::Ean13, "4006381333931");
    for count in [-1, 0, 1, 2] {
        backend.push_frame(vec![record.clone().with_count(count)]);
    }

    let mut statuses = Vec::new();
    for seq in 0..4u32 {
        let mut frame = Image::from_gray(&engine, &[128; 320 * 240], 320, 240).unwrap();
        frame.set_sequence(seq);
        assert_eq!(scanner.scan_image(&mut frame).unwrap(), 1);
        assert_eq!(frame.sequence(), seq);

        let results = scanner.results();
        let symbol = results.first().unwrap();
        assert_eq!(symbol.data(), "4006381333931");
        statuses.push(symbol.cache_status());
    }

    assert_eq!(
        statuses,
        vec![
            CacheStatus::Uncertain,
            CacheStatus::Verified,
            CacheStatus::Duplicate(1),
            CacheStatus::Duplicate(2),
        ]
    );
    assert_eq!(backend.pending_frames(), 0);
}

#[test]
fn test_components_survive_their_parents() {
    let (backend, engine) = engine();
    let mut scanner = ImageScanner::new(&engine).unwrap();
    let mut image = Image::from_gray(&engine, &[0; 64], 8, 8).unwrap();

    backend.push_frame(vec![SymbolRecord::new(SymbolType::Composite, "012345678905 12")
        .with_component(SymbolRecord::new(SymbolType::Upca, "012345678905"))
        .with_component(SymbolRecord::new(SymbolType::Ean2, "12"))]);
    scanner.scan_image(&mut image).unwrap();

    let components = {
        let results = scanner.results();
        let parent = results.first().unwrap();
        assert_eq!(parent.symbol_type(), SymbolType::Composite);
        parent.components()
    };
    scanner.destroy();
    image.destroy();

    let data: Vec<String> = components.iter().map(|s| s.data()).collect();
    assert_eq!(data, vec!["012345678905", "12"]);
    assert!(backend.stats().live_sets >= 1);

    drop(components);
    let stats = backend.stats();
    assert_eq!(stats.live_sets, 0);
    assert_eq!(stats.live_symbols, 0);
}

#[test]
fn test_release_accounting() {
    let (backend, engine) = engine();
    {
        let mut scanner = ImageScanner::new(&engine).unwrap();
        let images: Vec<Image> = (0..5)
            .map(|_| Image::from_gray(&engine, &[0; 4], 2, 2).unwrap())
            .collect();
        for mut image in images {
            backend.push_frame(vec![SymbolRecord::new(SymbolType::QrCode, "x")]);
            scanner.scan_image(&mut image).unwrap();
            let _held = image.symbols();
        }
        assert_eq!(backend.stats().live_images, 0);
        assert_eq!(backend.stats().live_scanners, 1);
    }

    let stats = backend.stats();
    assert_eq!(stats.live_images, 0);
    assert_eq!(stats.live_scanners, 0);
    assert_eq!(stats.live_sets, 0);
    assert_eq!(stats.live_symbols, 0);
    assert_eq!(stats.destroy_calls, 6);
    assert_eq!(stats.scans, 5);
}

#[test]
fn test_settings_filter_results() {
    let (backend, engine) = engine();
    let mut scanner = ImageScanner::new(&engine).unwrap();
    scanner
        .apply(
            &ScannerSettings::new()
                .disable_all()
                .enable(QrCode)
                .enable(Ean13)
                .disable(Code128),
        )
        .unwrap();

    backend.push_frame(vec![
        SymbolRecord::new(SymbolType::Code128, "dropped"),
        SymbolRecord::new(SymbolType::QrCode, "kept"),
        SymbolRecord::new(SymbolType::Ean13, "9780201379624"),
    ]);
    let mut image = Image::from_gray(&engine, &[0; 16], 4, 4).unwrap();
    assert_eq!(scanner.scan_image(&mut image).unwrap(), 2);

    let types: Vec<SymbolType> = scanner.results().iter().map(|s| s.symbol_type()).collect();
    assert_eq!(types, vec![SymbolType::QrCode, SymbolType::Ean13]);
}

#[test]
fn test_text_config_and_positions() {
    let (backend, engine) = engine();
    let mut scanner = ImageScanner::new(&engine).unwrap();
    scanner.parse_config("scanner.no-position").unwrap();
    assert_eq!(scanner.config(SymbolType::Partial, Config::Position), Ok(0));

    backend.push_frame(vec![
        SymbolRecord::new(SymbolType::QrCode, "p").with_points([(0, 0), (9, 9)])
    ]);
    let mut image = Image::from_gray(&engine, &[0; 100], 10, 10).unwrap();
    scanner.scan_image(&mut image).unwrap();

    let results = scanner.results();
    let symbol = results.first().unwrap();
    assert_eq!(symbol.location_size(), 0);
    assert_eq!(symbol.bounds(), None);
}

#[test]
fn test_scan_converted_image() {
    let (backend, engine) = engine();
    let mut scanner = ImageScanner::new(&engine).unwrap();
    let original = Image::from_gray(&engine, &[7; 9], 3, 3).unwrap();

    let mut grey = original.convert(Fourcc::GREY).unwrap();
    assert_eq!(grey.size(), (3, 3));
    assert_eq!(grey.data(), vec![7; 9]);

    backend.push_frame(vec![SymbolRecord::new(SymbolType::Code39, "ABC")]);
    assert_eq!(scanner.scan_image(&mut grey).unwrap(), 1);
    assert!(original.symbols().is_empty());
    assert_eq!(grey.symbols().len(), 1);
}
