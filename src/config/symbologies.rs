//! Zero-sized markers for each symbology and the options each one accepts
//!
//! Markers are generated from one table so that the capability impls, the
//! display names and the text grammar names cannot drift apart.

use super::{
    SupportsAscii, SupportsBinary, SupportsChecksum, SupportsEnable, SupportsLengthLimits,
    SupportsUncertainty, Symbology,
};
use crate::symbol::SymbolType;

/// One row of the symbology table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbologyInfo {
    pub symbol_type: SymbolType,
    pub name: &'static str,
    /// Canonical name in `[symbology.]option[=value]` text.
    pub grammar: &'static str,
    /// Names of the capability traits the marker implements.
    pub capabilities: &'static [&'static str],
}

impl SymbologyInfo {
    /// Whether the marker implements the named capability trait.
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.contains(&capability)
    }
}

macro_rules! symbologies {
    ($(
        $(#[$doc:meta])*
        $marker:ident => $name:literal, $grammar:literal: [$($cap:ident),* $(,)?];
    )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy)]
            pub struct $marker;

            impl Symbology for $marker {
                const TYPE: SymbolType = SymbolType::$marker;
                const NAME: &'static str = $name;
            }

            $(impl $cap for $marker {})*
        )*

        /// Every marker, with its names and capabilities.
        pub const ALL_SYMBOLOGIES: &[SymbologyInfo] = &[
            $(SymbologyInfo {
                symbol_type: SymbolType::$marker,
                name: $name,
                grammar: $grammar,
                capabilities: &[$(stringify!($cap)),*],
            },)*
        ];
    };
}

symbologies! {
    /// EAN-2 add-on (2-digit supplement)
    Ean2 => "EAN-2", "ean2": [SupportsEnable, SupportsChecksum];
    /// EAN-5 add-on (5-digit supplement)
    Ean5 => "EAN-5", "ean5": [SupportsEnable, SupportsChecksum];
    Ean8 => "EAN-8", "ean8": [SupportsEnable, SupportsChecksum, SupportsUncertainty];
    Upce => "UPC-E", "upce": [SupportsEnable, SupportsChecksum, SupportsUncertainty];
    /// ISBN-10, reported from EAN-13 symbols in the 978 range
    Isbn10 => "ISBN-10", "isbn10": [SupportsEnable, SupportsChecksum];
    Upca => "UPC-A", "upca": [SupportsEnable, SupportsChecksum, SupportsUncertainty];
    Ean13 => "EAN-13", "ean13": [SupportsEnable, SupportsChecksum, SupportsUncertainty];
    Isbn13 => "ISBN-13", "isbn13": [SupportsEnable, SupportsChecksum];
    /// EAN/UPC symbol joined with its add-on
    ///
    /// Not a decoder of its own: enabling it only controls whether joined
    /// results are reported.
    Composite => "Composite", "composite": [SupportsUncertainty];
    /// Interleaved 2 of 5
    I25 => "Interleaved 2 of 5", "i25": [SupportsEnable, SupportsLengthLimits, SupportsUncertainty];
    /// GS1 DataBar (RSS-14)
    Databar => "DataBar", "databar": [SupportsEnable, SupportsChecksum, SupportsUncertainty];
    DatabarExp => "DataBar Expanded", "databar-exp": [SupportsEnable, SupportsChecksum, SupportsUncertainty];
    Codabar => "Codabar", "codabar": [
        SupportsEnable, SupportsChecksum, SupportsLengthLimits, SupportsUncertainty,
    ];
    Code39 => "Code 39", "code39": [
        SupportsEnable, SupportsChecksum, SupportsLengthLimits, SupportsAscii, SupportsUncertainty,
    ];
    QrCode => "QR Code", "qrcode": [SupportsEnable, SupportsBinary, SupportsUncertainty];
    /// SQ Code (experimental)
    SqCode => "SQ Code", "sqcode": [SupportsEnable, SupportsBinary, SupportsUncertainty];
    Code93 => "Code 93", "code93": [
        SupportsEnable, SupportsChecksum, SupportsLengthLimits, SupportsUncertainty,
    ];
    Code128 => "Code 128", "code128": [
        SupportsEnable, SupportsChecksum, SupportsLengthLimits, SupportsUncertainty,
    ];
    /// PDF417 stacked barcode
    Pdf417 => "PDF417", "pdf417": [SupportsEnable, SupportsLengthLimits];
}

/// Table row for a symbology, if it has a marker.
pub fn symbology_info(symbol_type: SymbolType) -> Option<&'static SymbologyInfo> {
    ALL_SYMBOLOGIES.iter().find(|row| row.symbol_type == symbol_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse, Config};
    use std::collections::BTreeSet;

    fn type_of<S: Symbology>(_: S) -> (SymbolType, &'static str) {
        (S::TYPE, S::NAME)
    }

    #[test]
    fn test_markers_match_symbol_types() {
        assert_eq!(type_of(QrCode), (SymbolType::QrCode, "QR Code"));
        assert_eq!(type_of(Pdf417), (SymbolType::Pdf417, "PDF417"));
        assert_eq!(type_of(Composite).0.code(), 15);
        assert_eq!(symbology_info(SymbolType::Code39).map(|r| r.grammar), Some("code39"));
        assert_eq!(symbology_info(SymbolType::Partial), None);
    }

    #[test]
    fn test_enable_capability_matches_decodable_types() {
        let enabled: BTreeSet<i32> = ALL_SYMBOLOGIES
            .iter()
            .filter(|row| row.supports("SupportsEnable"))
            .map(|row| row.symbol_type.code())
            .collect();
        let all: BTreeSet<i32> = SymbolType::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(enabled, all);
    }

    #[test]
    fn test_table_covers_distinct_types() {
        let types: BTreeSet<i32> = ALL_SYMBOLOGIES.iter().map(|row| row.symbol_type.code()).collect();
        assert_eq!(types.len(), ALL_SYMBOLOGIES.len());
        assert_eq!(ALL_SYMBOLOGIES.len(), SymbolType::ALL.len() + 1);
    }

    #[test]
    fn test_grammar_names_parse_back() {
        for row in ALL_SYMBOLOGIES {
            let setting = parse(&format!("{}.enable", row.grammar)).unwrap();
            assert_eq!(setting.symbology, row.symbol_type, "{}", row.grammar);
            assert_eq!(setting.option, Config::Enable);
        }
    }

    #[test]
    fn test_only_variable_length_codes_take_limits() {
        let limited: Vec<&str> = ALL_SYMBOLOGIES
            .iter()
            .filter(|row| row.supports("SupportsLengthLimits"))
            .map(|row| row.grammar)
            .collect();
        assert_eq!(
            limited,
            vec!["i25", "codabar", "code39", "code93", "code128", "pdf417"]
        );
    }
}
