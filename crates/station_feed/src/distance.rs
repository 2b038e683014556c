//! Player samples and per-message distance reports.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::MessageError;
use crate::markers::ReferenceTable;

/// Username used when a player entry carries none.
pub const UNKNOWN_PLAYER: &str = "<unknown>";

/// A 2D position in map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Reads a coordinate that may be a JSON number or a numeric string.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// One player's identity and position, taken from a message's `players`
/// array.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSample {
    pub username: String,
    pub position: Point,
}

impl PlayerSample {
    /// Builds a sample from one `players` entry.
    ///
    /// The position is read from `position`, falling back to `pos`; both
    /// coordinates must be numeric.
    pub fn from_value(entry: &Value) -> Result<Self, MessageError> {
        let username = match entry.get("username") {
            None | Some(Value::Null) => UNKNOWN_PLAYER.to_string(),
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
        };

        let empty = Value::Object(Default::default());
        let position = ["position", "pos"]
            .iter()
            .filter_map(|key| entry.get(*key))
            .find(|candidate| !is_blank(candidate))
            .unwrap_or(&empty);

        let x = position.get("x").and_then(coerce_f64);
        let y = position.get("y").and_then(coerce_f64);
        match (x, y) {
            (Some(x), Some(y)) => Ok(Self {
                username,
                position: Point::new(x, y),
            }),
            _ => Err(MessageError::Position {
                username,
                position: position.to_string(),
            }),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Rounded distances from one player to each station, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationDistances {
    entries: Vec<(String, i64)>,
}

impl StationDistances {
    /// Sets the distance to `station`, keeping its original slot if it was
    /// already present.
    pub fn insert(&mut self, station: &str, distance: i64) {
        match self.entries.iter_mut().find(|(name, _)| name == station) {
            Some(slot) => slot.1 = distance,
            None => self.entries.push((station.to_string(), distance)),
        }
    }

    pub fn get(&self, station: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(name, _)| name == station)
            .map(|(_, distance)| *distance)
    }

    /// Station names and distances, in the order they were first recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(name, distance)| (name.as_str(), *distance))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for StationDistances {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (station, distance) in &self.entries {
            map.serialize_entry(station, distance)?;
        }
        map.end()
    }
}

/// Distances, keyed by username then station name, for a single message.
///
/// Players keep the order they appeared in the message and stations keep
/// the order of the marker table, so a logged report reads like the map
/// source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistanceReport {
    players: Vec<(String, StationDistances)>,
}

impl DistanceReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes a report for `samples` against every resolvable station.
    ///
    /// Stations whose coordinates do not resolve are left out. A player with
    /// no resolvable station gets no entry. Two samples with the same
    /// username merge, later distances winning.
    pub fn compute(samples: &[PlayerSample], table: &ReferenceTable) -> Self {
        let mut report = Self::new();
        for sample in samples {
            for (station, location) in table.resolved() {
                report.record(&sample.username, station, sample.position.distance(location));
            }
        }
        report
    }

    /// Stores a distance rounded half-to-even.
    pub fn record(&mut self, username: &str, station: &str, distance: f64) {
        let rounded = distance.round_ties_even() as i64;
        match self.players.iter_mut().find(|(name, _)| name == username) {
            Some((_, distances)) => distances.insert(station, rounded),
            None => {
                let mut distances = StationDistances::default();
                distances.insert(station, rounded);
                self.players.push((username.to_string(), distances));
            }
        }
    }

    pub fn player(&self, username: &str) -> Option<&StationDistances> {
        self.players
            .iter()
            .find(|(name, _)| name == username)
            .map(|(_, distances)| distances)
    }

    /// Players in message order.
    pub fn players(&self) -> impl Iterator<Item = (&str, &StationDistances)> {
        self.players.iter().map(|(name, distances)| (name.as_str(), distances))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Serialize for DistanceReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.players.len()))?;
        for (username, distances) in &self.players {
            map.serialize_entry(username, distances)?;
        }
        map.end()
    }
}

impl fmt::Display for DistanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.players),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_distance() {
        assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
        assert_eq!(Point::new(-1.0, -1.0).distance(Point::new(-1.0, -1.0)), 0.0);
    }

    #[test]
    fn test_coerce_f64() {
        assert_eq!(coerce_f64(&json!(12)), Some(12.0));
        assert_eq!(coerce_f64(&json!(-3.25)), Some(-3.25));
        assert_eq!(coerce_f64(&json!(" 7.5 ")), Some(7.5));
        assert_eq!(coerce_f64(&json!("abc")), None);
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!([1])), None);
    }

    #[test]
    fn test_sample_from_position() {
        let sample = PlayerSample::from_value(&json!({
            "username": "alice",
            "position": {"x": 1, "y": "2"}
        }))
        .unwrap();
        assert_eq!(sample.username, "alice");
        assert_eq!(sample.position, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_sample_falls_back_to_pos_and_unknown_name() {
        let sample = PlayerSample::from_value(&json!({
            "position": {},
            "pos": {"x": 0, "y": 0}
        }))
        .unwrap();
        assert_eq!(sample.username, UNKNOWN_PLAYER);
        assert_eq!(sample.position, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_sample_invalid_position() {
        let err = PlayerSample::from_value(&json!({
            "username": "bob",
            "position": {"x": "abc"}
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), r#"bob: invalid position {"x":"abc"}"#);

        let err = PlayerSample::from_value(&json!({"username": "carol"})).unwrap_err();
        assert_eq!(err.to_string(), "carol: invalid position {}");

        assert!(PlayerSample::from_value(&json!("not a player")).is_err());
    }

    #[test]
    fn test_record_rounds_half_to_even() {
        let mut report = DistanceReport::new();
        report.record("p", "a", 2.5);
        report.record("p", "b", 3.5);
        report.record("p", "c", 4.4999);
        let distances = report.player("p").unwrap();
        assert_eq!(distances.get("a"), Some(2));
        assert_eq!(distances.get("b"), Some(4));
        assert_eq!(distances.get("c"), Some(4));
    }

    #[test]
    fn test_compute_three_four_five() {
        let table = ReferenceTable::from_value(json!({"A": {"x": 3, "y": 4}})).unwrap();
        let samples = vec![PlayerSample {
            username: "alice".to_string(),
            position: Point::new(0.0, 0.0),
        }];
        let report = DistanceReport::compute(&samples, &table);
        assert_eq!(serde_json::to_value(&report).unwrap(), json!({"alice": {"A": 5}}));
        assert_eq!(report.to_string(), r#"{"alice":{"A":5}}"#);
    }

    #[test]
    fn test_compute_skips_unresolved_stations() {
        let table = ReferenceTable::from_value(json!({
            "Good": [6, 8],
            "Bad": {"label": "no coordinates"}
        }))
        .unwrap();
        let samples = vec![PlayerSample {
            username: "alice".to_string(),
            position: Point::new(0.0, 0.0),
        }];
        let report = DistanceReport::compute(&samples, &table);
        assert_eq!(serde_json::to_value(&report).unwrap(), json!({"alice": {"Good": 10}}));
    }

    #[test]
    fn test_compute_with_empty_table_is_empty() {
        let samples = vec![PlayerSample {
            username: "alice".to_string(),
            position: Point::new(1.0, 1.0),
        }];
        let report = DistanceReport::compute(&samples, &ReferenceTable::default());
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "{}");
    }

    #[test]
    fn test_report_follows_table_and_message_order() {
        let table = ReferenceTable::from_value(json!({
            "Zebra Yard": [0, 1],
            "Hayton": [0, 2],
            "Middle": [0, 3]
        }))
        .unwrap();
        let samples = vec![
            PlayerSample {
                username: "zoe".to_string(),
                position: Point::new(0.0, 0.0),
            },
            PlayerSample {
                username: "adam".to_string(),
                position: Point::new(0.0, 0.0),
            },
        ];
        let report = DistanceReport::compute(&samples, &table);

        let stations: Vec<&str> = report.player("zoe").unwrap().iter().map(|(name, _)| name).collect();
        assert_eq!(stations, vec!["Zebra Yard", "Hayton", "Middle"]);
        let players: Vec<&str> = report.players().map(|(name, _)| name).collect();
        assert_eq!(players, vec!["zoe", "adam"]);
        assert_eq!(
            report.to_string(),
            r#"{"zoe":{"Zebra Yard":1,"Hayton":2,"Middle":3},"adam":{"Zebra Yard":1,"Hayton":2,"Middle":3}}"#
        );
    }

    #[test]
    fn test_duplicate_player_merges_in_place() {
        let mut report = DistanceReport::new();
        report.record("p", "a", 1.0);
        report.record("q", "a", 2.0);
        report.record("p", "a", 7.0);
        report.record("p", "b", 3.0);

        assert_eq!(report.len(), 2);
        let p = report.player("p").unwrap();
        assert_eq!(p.get("a"), Some(7));
        assert_eq!(p.iter().map(|(name, _)| name).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
