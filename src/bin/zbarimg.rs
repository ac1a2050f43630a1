//! Command-line barcode scanner for image files

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;
use zbar_bind::{Engine, Image, ImageScanner, Symbol};

/// Scan image files for barcodes and print what was decoded.
#[derive(Debug, Parser)]
#[command(name = "zbarimg", version, about)]
struct Cli {
    /// Image files to scan
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Scanner setting, `[symbology.]option[=value]`; may be repeated
    #[arg(short = 'S', long = "set", value_name = "CONFIG")]
    settings: Vec<String>,

    /// Report a symbol once it is stable across images
    #[arg(long)]
    cache: bool,

    /// Only print decoded symbols
    #[arg(short, long)]
    quiet: bool,

    /// Print data without the symbology prefix
    #[arg(long)]
    raw: bool,

    /// Append the bounding box of each symbol
    #[arg(long)]
    bounds: bool,

    /// More log output; repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(engine: &Engine, path: &Path) -> Result<Image, String> {
    let img = ::image::open(path).map_err(|e| format!("{}: {e}", path.display()))?;

    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    Image::from_gray(engine, gray.as_raw(), width, height)
        .map_err(|e| format!("{}: {e}", path.display()))
}

fn format_symbol(symbol: &Symbol, cli: &Cli) -> String {
    let mut line = if cli.raw {
        symbol.data()
    } else {
        format!("{}:{}", symbol.symbol_type(), symbol.data())
    };
    if cli.bounds {
        if let Some(b) = symbol.bounds() {
            line.push_str(&format!(" [{},{},{},{}]", b.x, b.y, b.width, b.height));
        }
    }
    line
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let engine = Engine::system();
    let mut scanner = match ImageScanner::new(&engine) {
        Ok(scanner) => scanner,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::from(1);
        }
    };

    for setting in &cli.settings {
        if let Err(e) = scanner.parse_config(setting) {
            eprintln!("ERROR: invalid config {setting:?}: {e}");
            return ExitCode::from(1);
        }
    }
    if cli.cache {
        scanner.enable_cache(true);
    }

    let mut found = 0usize;
    let mut scanned = 0usize;
    let mut failed = false;

    for path in &cli.files {
        let mut image = match load(&engine, path) {
            Ok(image) => image,
            Err(e) => {
                eprintln!("ERROR: {e}");
                failed = true;
                continue;
            }
        };

        match scanner.scan_image(&mut image) {
            Ok(_) => scanned += 1,
            Err(e) => {
                eprintln!("ERROR: {}: {e}", path.display());
                failed = true;
                continue;
            }
        }

        for symbol in &image.symbols() {
            // with the cache on, only newly verified symbols are reported
            if cli.cache && symbol.count() != 0 {
                continue;
            }
            println!("{}", format_symbol(symbol, &cli));
            found += 1;
        }
    }

    if !cli.quiet {
        eprintln!("scanned {found} barcode symbols from {scanned} images");
    }

    if failed {
        ExitCode::from(1)
    } else if found == 0 {
        ExitCode::from(4)
    } else {
        ExitCode::SUCCESS
    }
}
