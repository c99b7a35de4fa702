use std::fmt;
use std::path::Path;

use encoding_rs::{EUC_KR, UTF_8};

use super::error::ImportError;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "title",
    "description",
    "season",
    "episode",
    "episode_title",
    "content",
];

pub const GENRE_COLUMN: &str = "genre";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, leading byte-order mark stripped when present
    Utf8Sig,
    /// Korean code page 949 (EUC-KR superset)
    Cp949,
    Utf8,
}

/// Tried in order; the first clean decode wins.
pub const ENCODING_FALLBACKS: [TextEncoding; 3] = [
    TextEncoding::Utf8Sig,
    TextEncoding::Cp949,
    TextEncoding::Utf8,
];

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Cp949 => "cp949",
            TextEncoding::Utf8 => "utf-8",
        }
    }

    /// Strict decode, `None` on any malformed sequence
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8Sig => {
                let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
                (!had_errors).then(|| text.into_owned())
            }
            TextEncoding::Cp949 => EUC_KR
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            TextEncoding::Utf8 => UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }
}

/// One data row: column name to raw cell value, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRow {
    fields: Vec<(String, String)>,
}

impl TabularRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Cell value, empty when the column is absent
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or_default()
    }
}

impl fmt::Display for TabularRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {:?}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone)]
pub struct CatalogTable {
    pub columns: Vec<String>,
    pub rows: Vec<TabularRow>,
    pub encoding: TextEncoding,
}

impl CatalogTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Decode and parse a catalog file. Reads only, no other side effects.
pub fn read_catalog_file(path: &Path) -> Result<CatalogTable, ImportError> {
    log::debug!("Reading catalog file: {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let (encoding, text) = decode_with_fallback(&bytes).ok_or_else(|| ImportError::Encoding {
        path: path.display().to_string(),
        tried: ENCODING_FALLBACKS.iter().map(|e| e.label()).collect(),
    })?;
    log::debug!("Decoded {} as {}", path.display(), encoding.label());

    parse_catalog(&text, encoding, &path.display().to_string())
}

pub fn decode_with_fallback(bytes: &[u8]) -> Option<(TextEncoding, String)> {
    ENCODING_FALLBACKS
        .iter()
        .find_map(|&encoding| encoding.decode(bytes).map(|text| (encoding, text)))
}

pub fn parse_catalog(
    text: &str,
    encoding: TextEncoding,
    source_name: &str,
) -> Result<CatalogTable, ImportError> {
    let csv_err = |source| ImportError::Csv {
        path: source_name.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::Schema {
            required: REQUIRED_COLUMNS.to_vec(),
            missing,
            found: columns,
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        // Short rows read missing cells as empty, extra cells are dropped
        let fields = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), record.get(i).unwrap_or_default().to_string()))
            .collect();
        rows.push(TabularRow { fields });
    }

    if rows.is_empty() {
        return Err(ImportError::EmptyInput {
            path: source_name.to_string(),
        });
    }

    Ok(CatalogTable {
        columns,
        rows,
        encoding,
    })
}
