// src/ingest/reader.rs
//! Source readers: raw upload bytes → strongly typed raw records.
//!
//! Field names are matched verbatim against the export (via serde renames on
//! each platform's record struct), so nothing is renamed here. Two kinds of
//! schema problems are told apart:
//! - a required field absent from the *whole* file → `IngestError::Schema`
//!   (the platform contributes nothing this run);
//! - a record that does not fit the struct → dropped and counted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::IngestError;
use crate::ingest::types::Platform;

/// A required field, with the other names it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct Required {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Required {
    pub const fn field(name: &'static str) -> Self {
        Self { name, aliases: &[] }
    }

    pub const fn with_aliases(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }

    fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

#[derive(Debug)]
pub struct Decoded<R> {
    pub records: Vec<R>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

fn json_reason(e: &serde_json::Error) -> String {
    use serde_json::error::Category;
    match e.classify() {
        Category::Io => "the file could not be read".to_string(),
        Category::Syntax | Category::Eof => format!(
            "the file is not valid JSON (line {}, column {})",
            e.line(),
            e.column()
        ),
        Category::Data => "expected a JSON list of entries".to_string(),
    }
}

/// Decode a JSON array of objects into `R` records.
pub fn read_json_array<R: DeserializeOwned>(
    platform: Platform,
    bytes: &[u8],
    required: &[Required],
) -> Result<Decoded<R>, IngestError> {
    let rows: Vec<Value> =
        serde_json::from_slice(strip_bom(bytes)).map_err(|e| IngestError::Decode {
            platform,
            reason: json_reason(&e),
        })?;

    let rows_read = rows.len();
    let objects: Vec<Map<String, Value>> = rows
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(m) => Some(m),
            _ => None,
        })
        .collect();
    // scalars and nested arrays are rows too, just unusable ones
    let mut rows_dropped = rows_read - objects.len();
    if rows_dropped > 0 {
        debug!(target: "ingest", %platform, skipped = rows_dropped, "non-object entries skipped");
    }

    if !objects.is_empty() {
        for req in required {
            let present = objects
                .iter()
                .any(|o| req.names().any(|n| o.contains_key(n)));
            if !present {
                return Err(IngestError::Schema {
                    platform,
                    field: req.name.to_string(),
                });
            }
        }
    }

    let mut records = Vec::with_capacity(objects.len());
    for (idx, obj) in objects.into_iter().enumerate() {
        match serde_json::from_value::<R>(Value::Object(obj)) {
            Ok(r) => records.push(r),
            Err(e) => {
                rows_dropped += 1;
                debug!(target: "ingest", %platform, row = idx, error = %e, "record skipped");
            }
        }
    }

    Ok(Decoded {
        records,
        rows_read,
        rows_dropped,
    })
}

/// Decode a CSV file with a header row into `R` records.
pub fn read_csv<R: DeserializeOwned>(
    platform: Platform,
    bytes: &[u8],
    required: &[Required],
) -> Result<Decoded<R>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(strip_bom(bytes));

    let headers = rdr
        .headers()
        .map_err(|e| IngestError::Decode {
            platform,
            reason: csv_reason(&e),
        })?
        .clone();

    for req in required {
        if !req.names().any(|n| headers.iter().any(|h| h == n)) {
            return Err(IngestError::Schema {
                platform,
                field: req.name.to_string(),
            });
        }
    }

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;
    for result in rdr.deserialize::<R>() {
        rows_read += 1;
        match result {
            Ok(r) => records.push(r),
            Err(e) => match e.kind() {
                csv::ErrorKind::Deserialize { .. } | csv::ErrorKind::UnequalLengths { .. } => {
                    rows_dropped += 1;
                    debug!(
                        target: "ingest",
                        %platform,
                        row = rows_read,
                        error = %e,
                        "record skipped"
                    );
                }
                _ => {
                    return Err(IngestError::Decode {
                        platform,
                        reason: csv_reason(&e),
                    })
                }
            },
        }
    }

    Ok(Decoded {
        records,
        rows_read,
        rows_dropped,
    })
}

fn csv_reason(e: &csv::Error) -> String {
    match e.kind() {
        csv::ErrorKind::Utf8 { pos, .. } => match pos {
            Some(p) => format!("the file is not UTF-8 text (line {})", p.line()),
            None => "the file is not UTF-8 text".to_string(),
        },
        csv::ErrorKind::Io(_) => "the file could not be read".to_string(),
        _ => "the file is not a valid CSV table".to_string(),
    }
}

/// `None` for missing, empty or whitespace-only text values.
pub fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Millisecond counts written as integers, floats ("1234.0") or text; anything
/// unusable (negative, non-numeric, empty) becomes `None` rather than failing the row.
pub fn lenient_millis<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let parsed = Option::<Millis>::deserialize(de)?;
    Ok(match parsed {
        Some(Millis::Int(v)) if v >= 0 => Some(v),
        Some(Millis::Float(f)) if f.is_finite() && f >= 0.0 => Some(f.round() as i64),
        Some(Millis::Text(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
                .filter(|v| *v >= 0)
        }
        _ => None,
    })
}
