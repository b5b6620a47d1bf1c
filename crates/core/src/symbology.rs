//! Barcode symbologies.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// A barcode symbology, named the way platform barcode detectors report them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    UpcA,
    UpcE,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "code_93")]
    Code93,
    #[serde(rename = "code_128")]
    Code128,
    Itf,
    Codabar,
    QrCode,
    DataMatrix,
    Aztec,
    #[serde(rename = "pdf417")]
    Pdf417,
}

/// Linear retail symbologies a stock-take needs, in preference order.
pub const RETAIL_FORMATS: [BarcodeFormat; 9] = [
    BarcodeFormat::Ean13,
    BarcodeFormat::Ean8,
    BarcodeFormat::UpcA,
    BarcodeFormat::UpcE,
    BarcodeFormat::Code39,
    BarcodeFormat::Code128,
    BarcodeFormat::Itf,
    BarcodeFormat::Codabar,
    BarcodeFormat::Code93,
];

impl BarcodeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::UpcE => "upc_e",
            BarcodeFormat::Code39 => "code_39",
            BarcodeFormat::Code93 => "code_93",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::Itf => "itf",
            BarcodeFormat::Codabar => "codabar",
            BarcodeFormat::QrCode => "qr_code",
            BarcodeFormat::DataMatrix => "data_matrix",
            BarcodeFormat::Aztec => "aztec",
            BarcodeFormat::Pdf417 => "pdf417",
        }
    }

    pub fn is_retail(&self) -> bool {
        RETAIL_FORMATS.contains(self)
    }
}

impl ValueObject for BarcodeFormat {}

impl core::fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the retail formats the detector should be configured with.
///
/// Returns the intersection of [`RETAIL_FORMATS`] and `supported`. The result
/// follows [`RETAIL_FORMATS`] order, not the order the detector reported, so
/// the configured list is the same on every platform. Empty means the detector
/// is useless for stock-taking.
pub fn negotiate_formats(supported: &[BarcodeFormat]) -> Vec<BarcodeFormat> {
    RETAIL_FORMATS
        .iter()
        .copied()
        .filter(|f| supported.contains(f))
        .collect()
}
