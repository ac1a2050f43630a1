//! Scanner configuration
//!
//! Three ways to configure an [`ImageScanner`](crate::ImageScanner), all
//! ending in the same native `set_config` call:
//!
//! - raw codes: [`Config`] plus a [`SymbolType`] selector,
//! - text in ZBar's `[symbology.]option[=value]` form, see [`parse`],
//! - the typed [`ScannerSettings`] builder, which only accepts options the
//!   chosen symbology understands.
//!
//! # Examples
//!
//! ```
//! use zbar_bind::config::*;
//!
//! let settings = ScannerSettings::new()
//!     .disable_all()
//!     .enable(QrCode)
//!     .enable(Code39)
//!     .set_length_limits(Code39, 4, 20)   // ✓ Code39 supports variable length
//!     .set_binary(QrCode, true)           // ✓ QR codes support binary mode
//!     .position_tracking(true);
//! assert!(!settings.settings().is_empty());
//! ```
//!
//! The following configurations will NOT compile:
//!
//! ```compile_fail
//! # use zbar_bind::config::*;
//! // ❌ EAN-13 has fixed length, doesn't support length limits
//! ScannerSettings::new().set_length_limits(Ean13, 1, 20);
//! ```
//!
//! ```compile_fail
//! # use zbar_bind::config::*;
//! // ❌ Code39 is not a 2D code, doesn't support binary mode
//! ScannerSettings::new().set_binary(Code39, true);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::symbol::SymbolType;
use crate::Error;

pub mod parse;
pub mod symbologies;

pub use parse::parse;
pub use symbologies::*;

/// Option codes understood by `set_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum Config {
    Enable = 0,
    /// Verify the check digit
    AddCheck = 1,
    /// Include the check digit in decoded data
    EmitCheck = 2,
    /// Full ASCII character set
    Ascii = 3,
    /// Keep binary payloads as-is instead of converting to text
    Binary = 4,
    MinLen = 0x20,
    MaxLen = 0x21,
    /// Required agreement between scan passes
    Uncertainty = 0x40,
    /// Record symbol locations
    Position = 0x80,
    XDensity = 0x100,
    YDensity = 0x101,
}

impl Config {
    pub const ALL: [Config; 11] = [
        Config::Enable,
        Config::AddCheck,
        Config::EmitCheck,
        Config::Ascii,
        Config::Binary,
        Config::MinLen,
        Config::MaxLen,
        Config::Uncertainty,
        Config::Position,
        Config::XDensity,
        Config::YDensity,
    ];

    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Name used by the text grammar.
    pub const fn name(self) -> &'static str {
        match self {
            Config::Enable => "enable",
            Config::AddCheck => "add-check",
            Config::EmitCheck => "emit-check",
            Config::Ascii => "ascii",
            Config::Binary => "binary",
            Config::MinLen => "min-length",
            Config::MaxLen => "max-length",
            Config::Uncertainty => "uncertainty",
            Config::Position => "position",
            Config::XDensity => "x-density",
            Config::YDensity => "y-density",
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Config> for i32 {
    fn from(value: Config) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for Config {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Config::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or(Error::UnsupportedConfig {
                symbology: 0,
                option: code,
                value: 0,
            })
    }
}

/// One `set_config` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setting {
    /// `None` targets every symbology, `Partial` the scanner itself.
    pub symbology: SymbolType,
    pub option: Config,
    pub value: i32,
}

impl Setting {
    pub const fn new(symbology: SymbolType, option: Config, value: i32) -> Self {
        Setting {
            symbology,
            option,
            value,
        }
    }
}

/// Written in the form [`parse`] reads back.
impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbology {
            SymbolType::None => {}
            SymbolType::Partial => f.write_str("scanner.")?,
            sym => match symbology_info(sym) {
                Some(row) => write!(f, "{}.", row.grammar)?,
                None => write!(f, "{sym}.")?,
            },
        }
        write!(f, "{}={}", self.option, self.value)
    }
}

/// Marker trait for symbologies that can be enabled/disabled
pub trait SupportsEnable: Symbology {}

/// Marker trait for symbologies that support checksum configuration
pub trait SupportsChecksum: Symbology {}

/// Marker trait for symbologies that support variable length limits
pub trait SupportsLengthLimits: Symbology {}

/// Marker trait for symbologies that support binary mode
pub trait SupportsBinary: Symbology {}

/// Marker trait for symbologies with a full ASCII mode
pub trait SupportsAscii: Symbology {}

/// Marker trait for symbologies that support uncertainty configuration
pub trait SupportsUncertainty: Symbology {}

/// Base trait that all symbology types must implement
pub trait Symbology: Sized {
    /// The corresponding SymbolType enum value
    const TYPE: SymbolType;

    /// Human-readable name
    const NAME: &'static str;
}

/// Symbologies the engine decodes before any configuration.
pub const DEFAULT_ENABLED: [SymbolType; 11] = [
    SymbolType::Ean13,
    SymbolType::Ean8,
    SymbolType::I25,
    SymbolType::Databar,
    SymbolType::DatabarExp,
    SymbolType::Codabar,
    SymbolType::Code39,
    SymbolType::Code93,
    SymbolType::Code128,
    SymbolType::QrCode,
    SymbolType::SqCode,
];

/// Type-safe configuration builder for an image scanner
///
/// Starts from the engine defaults and records changes. [`settings`]
/// turns the changes into the `set_config` calls that produce them, so
/// options left alone are never sent.
///
/// [`settings`]: ScannerSettings::settings
///
/// # Example
/// ```
/// use zbar_bind::config::*;
///
/// let settings = ScannerSettings::new()
///     .enable(Ean13)
///     .enable(Code39)
///     .set_checksum(Code39, true, false)
///     .set_length_limits(Code39, 4, 20)
///     .position_tracking(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerSettings {
    enabled: BTreeSet<SymbolType>,
    /// Start from nothing enabled instead of the engine defaults.
    cleared: bool,
    checksum_flags: BTreeMap<SymbolType, (bool, bool)>,
    length_limits: BTreeMap<SymbolType, (u32, u32)>,
    binary_mode: BTreeMap<SymbolType, bool>,
    ascii_mode: BTreeMap<SymbolType, bool>,
    uncertainty: BTreeMap<SymbolType, u32>,
    position_tracking: Option<bool>,
    x_density: Option<u32>,
    y_density: Option<u32>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerSettings {
    /// Settings equal to the engine defaults
    ///
    /// By default:
    /// - EAN-13, EAN-8, I25, DataBar, Codabar, Code39, Code93, Code128, QR, SQ are enabled
    /// - UPC-A, UPC-E, ISBN-10, ISBN-13 are reported as EAN-13/EAN-8 unless enabled
    /// - Position tracking is enabled
    /// - Scan density is 1x1
    pub fn new() -> Self {
        Self {
            enabled: DEFAULT_ENABLED.into_iter().collect(),
            cleared: false,
            checksum_flags: BTreeMap::new(),
            length_limits: BTreeMap::new(),
            binary_mode: BTreeMap::new(),
            ascii_mode: BTreeMap::new(),
            uncertainty: BTreeMap::new(),
            position_tracking: None,
            x_density: None,
            y_density: None,
        }
    }

    /// Enable a symbology
    pub fn enable<S: Symbology + SupportsEnable>(mut self, _: S) -> Self {
        self.enabled.insert(S::TYPE);
        self
    }

    /// Disable a symbology
    pub fn disable<S: Symbology + SupportsEnable>(mut self, _: S) -> Self {
        self.enabled.remove(&S::TYPE);
        self
    }

    /// Disable all symbologies
    ///
    /// Useful when you want to start with a clean slate and only enable
    /// specific symbologies.
    ///
    /// # Example
    /// ```
    /// use zbar_bind::config::*;
    ///
    /// let settings = ScannerSettings::new()
    ///     .disable_all()
    ///     .enable(QrCode)
    ///     .enable(Code39);
    /// ```
    pub fn disable_all(mut self) -> Self {
        self.enabled.clear();
        self.cleared = true;
        self
    }

    /// Check if a symbology is enabled
    pub fn is_enabled(&self, sym: SymbolType) -> bool {
        self.enabled.contains(&sym)
    }

    /// Configure checksum behavior for a symbology
    ///
    /// # Arguments
    /// * `add_check` - Validate checksum during decoding
    /// * `emit_check` - Include checksum digit in decoded data
    pub fn set_checksum<S: Symbology + SupportsChecksum>(
        mut self,
        _: S,
        add_check: bool,
        emit_check: bool,
    ) -> Self {
        self.checksum_flags.insert(S::TYPE, (add_check, emit_check));
        self
    }

    /// Set minimum and maximum length limits
    ///
    /// Only valid for variable-length symbologies like Code39, Code128, etc.
    ///
    /// # Panics
    /// When `min > max` or `max > 256`.
    pub fn set_length_limits<S: Symbology + SupportsLengthLimits>(
        mut self,
        _: S,
        min: u32,
        max: u32,
    ) -> Self {
        assert!(min <= max, "min length must be <= max length");
        assert!(max <= 256, "max length must be <= 256");
        self.length_limits.insert(S::TYPE, (min, max));
        self
    }

    /// Enable or disable binary mode for 2D codes
    ///
    /// When enabled, binary data is preserved without text conversion.
    pub fn set_binary<S: Symbology + SupportsBinary>(mut self, _: S, enabled: bool) -> Self {
        self.binary_mode.insert(S::TYPE, enabled);
        self
    }

    /// Decode the full ASCII character set
    pub fn set_ascii<S: Symbology + SupportsAscii>(mut self, _: S, enabled: bool) -> Self {
        self.ascii_mode.insert(S::TYPE, enabled);
        self
    }

    /// Set uncertainty threshold for edge detection
    ///
    /// Higher values are more tolerant of poor quality images but may
    /// produce more false positives.
    pub fn set_uncertainty<S: Symbology + SupportsUncertainty>(
        mut self,
        _: S,
        threshold: u32,
    ) -> Self {
        self.uncertainty.insert(S::TYPE, threshold);
        self
    }

    /// Enable or disable position tracking
    ///
    /// When enabled, the scanner records the pixel coordinates of each
    /// detected symbol.
    pub fn position_tracking(mut self, enabled: bool) -> Self {
        self.position_tracking = Some(enabled);
        self
    }

    /// Set scan density for both axes
    ///
    /// Higher density means fewer scan lines. A value of 1 means scan every line;
    /// 0 disables scanning along that axis.
    pub fn scan_density(self, x: u32, y: u32) -> Self {
        self.x_density(x).y_density(y)
    }

    /// Set horizontal scan density
    pub fn x_density(mut self, density: u32) -> Self {
        self.x_density = Some(density);
        self
    }

    /// Set vertical scan density
    pub fn y_density(mut self, density: u32) -> Self {
        self.y_density = Some(density);
        self
    }

    /// The `set_config` calls that turn a fresh scanner into this configuration, in order.
    pub fn settings(&self) -> Vec<Setting> {
        let mut out = Vec::new();

        if self.cleared {
            out.push(Setting::new(SymbolType::None, Config::Enable, 0));
            out.extend(
                self.enabled
                    .iter()
                    .map(|&sym| Setting::new(sym, Config::Enable, 1)),
            );
        } else {
            for sym in DEFAULT_ENABLED {
                if !self.enabled.contains(&sym) {
                    out.push(Setting::new(sym, Config::Enable, 0));
                }
            }
            for &sym in &self.enabled {
                if !DEFAULT_ENABLED.contains(&sym) {
                    out.push(Setting::new(sym, Config::Enable, 1));
                }
            }
        }

        for (&sym, &(add, emit)) in &self.checksum_flags {
            out.push(Setting::new(sym, Config::AddCheck, i32::from(add)));
            out.push(Setting::new(sym, Config::EmitCheck, i32::from(emit)));
        }
        for (&sym, &(min, max)) in &self.length_limits {
            out.push(Setting::new(sym, Config::MinLen, min as i32));
            out.push(Setting::new(sym, Config::MaxLen, max as i32));
        }
        for (&sym, &on) in &self.ascii_mode {
            out.push(Setting::new(sym, Config::Ascii, i32::from(on)));
        }
        for (&sym, &on) in &self.binary_mode {
            out.push(Setting::new(sym, Config::Binary, i32::from(on)));
        }
        for (&sym, &threshold) in &self.uncertainty {
            out.push(Setting::new(sym, Config::Uncertainty, clamp_i32(threshold)));
        }

        if let Some(on) = self.position_tracking {
            out.push(Setting::new(SymbolType::Partial, Config::Position, i32::from(on)));
        }
        if let Some(x) = self.x_density {
            out.push(Setting::new(SymbolType::Partial, Config::XDensity, clamp_i32(x)));
        }
        if let Some(y) = self.y_density {
            out.push(Setting::new(SymbolType::Partial, Config::YDensity, clamp_i32(y)));
        }

        out
    }
}

fn clamp_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}
