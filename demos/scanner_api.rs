//! Example demonstrating the ImageScanner with type-safe configuration
//!
//! Runs against the in-process backend, which reports queued results
//! instead of decoding pixels, so it works without libzbar installed.

use std::sync::Arc;

use zbar_bind::backend::memory::{MemoryBackend, SymbolRecord};
use zbar_bind::config::*;
use zbar_bind::{Engine, Image, ImageScanner, SymbolType};

fn main() -> zbar_bind::Result<()> {
    println!("=== ImageScanner API Examples ===\n");

    let backend = Arc::new(MemoryBackend::new());
    let engine = Engine::from_shared(backend.clone());

    // Example 1: Custom configuration with specific symbologies
    println!("1. Scanner with custom symbology selection:");
    let settings = ScannerSettings::new()
        .enable(Ean13)
        .enable(Ean8)
        .enable(QrCode)
        .disable(Code39)
        .disable(Code128);
    let mut scanner = ImageScanner::new(&engine)?;
    scanner.apply(&settings)?;
    for setting in settings.settings() {
        println!("   {setting}");
    }
    println!();

    // Example 2: Configure symbology-specific settings
    println!("2. Scanner with symbology-specific settings:");
    let settings = ScannerSettings::new()
        .set_length_limits(Code39, 4, 20) // Code39 must be 4-20 characters
        .set_checksum(Code39, true, false) // Validate checksum, don't emit
        .set_uncertainty(Code39, 2);
    scanner.apply(&settings)?;
    println!(
        "   Code39 min length now {}\n",
        scanner.config(SymbolType::Code39, Config::MinLen)?
    );

    // Example 3: Text configuration, as accepted by zbarimg -S
    println!("3. Text configuration:");
    for text in ["qrcode.binary", "scanner.x-density=2", "i25.disable"] {
        scanner.parse_config(text)?;
        println!("   applied {text:?}");
    }
    match scanner.parse_config("ean13.min-length=3") {
        Ok(()) => println!("   unexpectedly accepted"),
        Err(e) => println!("   rejected: {e}"),
    }
    println!();

    // Example 4: Scanning
    println!("4. Scanning an image:");
    backend.push_frame(vec![
        SymbolRecord::new(SymbolType::QrCode, "https://example.com")
            .with_points([(10, 10), (90, 10), (90, 90), (10, 90)]),
        SymbolRecord::new(SymbolType::Code39, "ABC-1234"),
    ]);
    let mut image = Image::from_gray(&engine, &vec![255u8; 100 * 100], 100, 100)?;
    let n = scanner.scan_image(&mut image)?;
    println!("   found {n} symbols");
    for symbol in &scanner.results() {
        match symbol.bounds() {
            Some(b) => println!(
                "   {}:{} at [{},{},{},{}]",
                symbol.symbol_type(),
                symbol.data(),
                b.x,
                b.y,
                b.width,
                b.height
            ),
            None => println!("   {}:{}", symbol.symbol_type(), symbol.data()),
        }
    }
    println!();

    println!("=== Type Safety Demonstrations ===\n");

    println!("The following configurations are INVALID and won't compile:\n");
    println!("  // settings.set_length_limits(Ean13, 1, 20);");
    println!("  // ❌ Compile error: EAN-13 has fixed length!\n");

    println!("  // settings.set_binary(Code39, true);");
    println!("  // ❌ Compile error: Code39 is not a 2D code!\n");

    println!("  // settings.set_length_limits(QrCode, 1, 100);");
    println!("  // ❌ Compile error: QR codes don't use length limits!\n");

    println!("=== Example Complete ===");
    Ok(())
}
