//! The station reference table and its loader.
//!
//! Station markers live in a published JavaScript file as
//! `const AREA_MARKERS = { ... }`. The loader finds that declaration, cuts out
//! the balanced object literal and normalizes it to JSON. Entries are kept as
//! raw JSON because the upstream file has used several coordinate layouts;
//! [`MarkerCoords`] decides per entry which layout applies.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

use crate::distance::{coerce_f64, Point};
use crate::error::{ExtractError, LoadError};
use crate::extract::{extract_block, normalize};
use crate::fetch::DocumentFetcher;

/// Declaration searched for when no other name is configured.
pub const DEFAULT_DECLARATION: &str = "AREA_MARKERS";

/// Station name to raw marker entry, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    entries: Map<String, Value>,
}

impl ReferenceTable {
    /// Wraps a parsed literal. The top level must be an object.
    pub fn from_value(value: Value) -> Result<Self, ExtractError> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(ExtractError::MalformedInput {
                offset: 0,
                reason: format!("expected an object of markers, found {}", kind_of(&other)),
            }),
        }
    }

    /// Number of stations declared, resolvable or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entry for `name` exactly as it appeared in the literal.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Station names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Coordinate layout of the named station, `Unresolved` if unknown.
    pub fn coords(&self, name: &str) -> MarkerCoords {
        self.entries
            .get(name)
            .map(MarkerCoords::resolve)
            .unwrap_or(MarkerCoords::Unresolved)
    }

    /// Stations whose coordinates resolve, with their location.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, Point)> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| MarkerCoords::resolve(entry).point().map(|p| (name.as_str(), p)))
    }

    /// Writes the table as indented JSON.
    pub async fn save_pretty(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        tokio::fs::write(path, json).await?;
        info!("💾 Saved {} station markers to {}", self.len(), path.display());
        Ok(())
    }
}

/// Where a marker entry keeps its coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerCoords {
    /// `{pos|position|coords: {x|lon|lng, y|lat}}`
    Nested(Point),
    /// `{x, y}`
    Flat(Point),
    /// `[x, y, ...]`
    Sequence(Point),
    Unresolved,
}

type CoordRule = fn(&Value) -> Option<MarkerCoords>;

/// Tried in order; the first rule that yields coordinates wins.
const COORD_RULES: &[CoordRule] = &[nested_coords, flat_coords, sequence_coords];

impl MarkerCoords {
    pub fn resolve(entry: &Value) -> Self {
        COORD_RULES
            .iter()
            .find_map(|rule| rule(entry))
            .unwrap_or(MarkerCoords::Unresolved)
    }

    pub fn point(&self) -> Option<Point> {
        match *self {
            MarkerCoords::Nested(p) | MarkerCoords::Flat(p) | MarkerCoords::Sequence(p) => Some(p),
            MarkerCoords::Unresolved => None,
        }
    }
}

fn first_number(object: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| object.get(*key).and_then(coerce_f64))
}

fn nested_coords(entry: &Value) -> Option<MarkerCoords> {
    let inner = ["pos", "position", "coords"]
        .iter()
        .filter_map(|key| entry.get(*key))
        .find(|candidate| candidate.is_object())?;
    let x = first_number(inner, &["x", "lon", "lng"])?;
    let y = first_number(inner, &["y", "lat"])?;
    Some(MarkerCoords::Nested(Point::new(x, y)))
}

fn flat_coords(entry: &Value) -> Option<MarkerCoords> {
    let x = entry.get("x").and_then(coerce_f64)?;
    let y = entry.get("y").and_then(coerce_f64)?;
    Some(MarkerCoords::Flat(Point::new(x, y)))
}

fn sequence_coords(entry: &Value) -> Option<MarkerCoords> {
    match entry.as_array()?.as_slice() {
        [x, y, ..] => Some(MarkerCoords::Sequence(Point::new(coerce_f64(x)?, coerce_f64(y)?))),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loads the `AREA_MARKERS` table from JavaScript source text.
///
/// No network access happens here; see [`fetch_reference_table`] for the
/// fetching variant.
///
/// # Arguments
///
/// * `document` - Full source text of the file declaring the markers
///
/// # Returns
///
/// The table in document order, or the first extraction failure:
/// [`ExtractError::DeclarationNotFound`] when there is no declaration, and
/// the block or normalization error otherwise.
///
/// # Example
///
/// ```rust
/// use station_feed::{load_reference_table, Point};
///
/// let table = load_reference_table(r#"const AREA_MARKERS = { "Hayton": {x: 12, y: 34}, };"#)?;
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.coords("Hayton").point(), Some(Point::new(12.0, 34.0)));
/// # Ok::<(), station_feed::ExtractError>(())
/// ```
pub fn load_reference_table(document: &str) -> Result<ReferenceTable, ExtractError> {
    load_reference_table_named(document, DEFAULT_DECLARATION)
}

/// Loads the table assigned to `const <name> = { ... }`.
pub fn load_reference_table_named(document: &str, name: &str) -> Result<ReferenceTable, ExtractError> {
    let pattern = Regex::new(&format!(r"const\s+{}\s*=\s*\{{", regex::escape(name))).map_err(|e| {
        ExtractError::MalformedInput {
            offset: 0,
            reason: format!("invalid declaration name {name:?}: {e}"),
        }
    })?;

    let declaration = pattern
        .find(document)
        .ok_or_else(|| ExtractError::DeclarationNotFound(name.to_string()))?;

    // The match ends on the opening brace.
    let block = extract_block(document, declaration.end() - 1)?;
    debug!("Found `{}` block of {} bytes at {}", name, block.len(), declaration.start());

    ReferenceTable::from_value(normalize(block)?)
}

/// Fetches `locator` and loads the table declared as `name` from it.
///
/// # Arguments
///
/// * `fetcher` - Retrieval backend, usually from [`fetcher_for`](crate::fetch::fetcher_for)
/// * `locator` - URL or path of the JavaScript file
/// * `name` - Declaration to look for, e.g. [`DEFAULT_DECLARATION`]
///
/// # Returns
///
/// The loaded table, [`LoadError::Retrieval`] when the document could not be
/// read, or [`LoadError::Extract`] when it held no usable declaration.
pub async fn fetch_reference_table(
    fetcher: &dyn DocumentFetcher,
    locator: &str,
    name: &str,
) -> Result<ReferenceTable, LoadError> {
    let document = fetcher.fetch_text(locator).await?;
    let table = load_reference_table_named(&document, name)?;
    info!("📍 Loaded {} station markers from {}", table.len(), locator);
    Ok(table)
}
