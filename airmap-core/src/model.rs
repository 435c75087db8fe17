use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::error::{CoordinateError, FetchError};

/// A clicked point, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(CoordinateError::NotANumber);
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(CoordinateError::LongitudeOutOfRange(self.lon));
        }
        Ok(())
    }

    /// Parse two free-text inputs (e.g. form fields) and validate them.
    pub fn parse(lat: &str, lon: &str) -> Result<Self, CoordinateError> {
        let lat = lat.trim().parse::<f64>().map_err(|_| CoordinateError::NotANumber)?;
        let lon = lon.trim().parse::<f64>().map_err(|_| CoordinateError::NotANumber)?;
        let coords = Self::new(lat, lon);
        coords.validate()?;
        Ok(coords)
    }
}

/// Accepts `"lat,lon"` or `"lat lon"`. Range is not checked here; a click
/// may land anywhere and [`Coordinates::validate`] decides.
impl FromStr for Coordinates {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty());
        let number = |p: &str| p.parse::<f64>().map_err(|_| CoordinateError::NotANumber);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(lat), Some(lon), None) => Ok(Self::new(number(lat)?, number(lon)?)),
            _ => Err(CoordinateError::NotANumber),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}°, {:.3}°", self.lat, self.lon)
    }
}

/// A point in time as sent by the service: epoch seconds or an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleTime {
    Epoch(f64),
    Text(String),
}

impl SampleTime {
    /// Strings without an offset are taken as UTC.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            SampleTime::Epoch(secs) => DateTime::from_timestamp(secs.trunc() as i64, 0),
            SampleTime::Text(s) => {
                let s = s.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Some(dt.with_timezone(&Utc));
                }
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|ndt| ndt.and_utc())
            }
        }
    }

    /// Hour of day in the sample's own clock: local wall time for ISO
    /// strings with an offset, UTC for epoch values.
    pub fn hour(&self) -> Option<u32> {
        match self {
            SampleTime::Text(s) => match DateTime::parse_from_rfc3339(s.trim()) {
                Ok(dt) => Some(dt.hour()),
                Err(_) => self.to_utc().map(|dt| dt.hour()),
            },
            SampleTime::Epoch(_) => self.to_utc().map(|dt| dt.hour()),
        }
    }
}

/// One named measurement: current value plus optional history.
///
/// `history` keeps `None` for hours the service had no reading, so the
/// positions still line up with `times`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePollutant")]
pub struct PollutantEntry {
    pub value: Option<f64>,
    pub unit: String,
    pub history: Vec<Option<f64>>,
    pub times: Vec<SampleTime>,
}

impl PollutantEntry {
    /// True when at least one historic reading is present.
    pub fn has_history(&self) -> bool {
        self.history.iter().any(Option::is_some)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePollutant {
    Full(WirePollutantFields),
    Bare(Option<f64>),
}

#[derive(Deserialize)]
struct WirePollutantFields {
    #[serde(default)]
    value: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    unit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    history: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "null_as_default")]
    times: Vec<SampleTime>,
}

impl From<WirePollutant> for PollutantEntry {
    fn from(wire: WirePollutant) -> Self {
        match wire {
            WirePollutant::Full(f) => {
                Self { value: f.value, unit: f.unit, history: f.history, times: f.times }
            }
            WirePollutant::Bare(value) => Self { value, ..Self::default() },
        }
    }
}

/// Pollutant entries in the order the service sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pollutants(Vec<(String, PollutantEntry)>);

impl Pollutants {
    pub fn new(entries: Vec<(String, PollutantEntry)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&PollutantEntry> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PollutantEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First entry whose current value is known.
    pub fn first_with_value(&self) -> Option<(&str, &PollutantEntry)> {
        self.iter().find(|(_, entry)| entry.value.is_some())
    }
}

impl Serialize for Pollutants {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entry) in &self.0 {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Pollutants {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PollutantsVisitor;

        impl<'de> Visitor<'de> for PollutantsVisitor {
            type Value = Pollutants;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of pollutant entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Pollutants, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, entry)) = access.next_entry::<String, PollutantEntry>()? {
                    entries.push((key, entry));
                }
                Ok(Pollutants(entries))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Pollutants, E> {
                Ok(Pollutants::default())
            }
        }

        deserializer.deserialize_any(PollutantsVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum Priority {
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Case-insensitive; anything unrecognised is treated as low priority.
impl From<Option<String>> for Priority {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Priority::High,
            Some("medium") => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(default)]
    pub priority: Priority,
}

/// Ground-station average reported by OpenAQ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAqMeasurement {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub mean_value: Option<f64>,
}

/// Aggregated air-quality result for one coordinate query.
///
/// Always replaced as a whole; nothing in the crate mutates a report after
/// it has been decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub pollutants: Pollutants,
    pub recommendations: Vec<Recommendation>,
    pub openaq: Vec<OpenAqMeasurement>,
    pub weather: Option<Value>,
    /// The body exactly as received.
    #[serde(skip)]
    pub raw: Value,
}

impl Report {
    /// Decode either response shape the service is known to produce:
    /// the flat `/coords` body, or the `/air_weather` body that nests the
    /// measurements under `data`.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let raw: Value =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, FetchError> {
        let nested = raw.get("data").is_some_and(Value::is_object);
        let decode = |e: serde_json::Error| FetchError::Decode(e.to_string());

        let report = if nested {
            let wire: NestedReport = serde_json::from_value(raw.clone()).map_err(decode)?;
            Report {
                lat: wire.data.lat,
                lon: wire.data.lon,
                timestamp: wire.data.timestamp.as_ref().and_then(SampleTime::to_utc),
                pollutants: wire.data.pollutants,
                recommendations: wire.recommendations,
                openaq: wire.data.openaq_pollutants,
                weather: wire.data.weather,
                raw,
            }
        } else {
            let wire: FlatReport = serde_json::from_value(raw.clone()).map_err(decode)?;
            Report {
                lat: wire.lat,
                lon: wire.lon,
                timestamp: wire.timestamp.as_ref().and_then(SampleTime::to_utc),
                pollutants: wire.pollutants,
                recommendations: wire.recommendations,
                openaq: wire.openaq.map(|block| block.pollutants).unwrap_or_default(),
                weather: wire.weather.filter(|w| !w.is_null()),
                raw,
            }
        };

        Ok(report)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

#[derive(Deserialize)]
struct FlatReport {
    lat: f64,
    lon: f64,
    #[serde(default)]
    timestamp: Option<SampleTime>,
    #[serde(default)]
    pollutants: Pollutants,
    #[serde(default, deserialize_with = "null_as_default")]
    recommendations: Vec<Recommendation>,
    #[serde(default)]
    openaq: Option<OpenAqBlock>,
    #[serde(default)]
    weather: Option<Value>,
}

#[derive(Deserialize)]
struct OpenAqBlock {
    #[serde(default, deserialize_with = "null_as_default")]
    pollutants: Vec<OpenAqMeasurement>,
}

#[derive(Deserialize)]
struct NestedReport {
    data: NestedData,
    #[serde(default, deserialize_with = "null_as_default")]
    recommendations: Vec<Recommendation>,
}

#[derive(Deserialize)]
struct NestedData {
    lat: f64,
    lon: f64,
    #[serde(default)]
    timestamp: Option<SampleTime>,
    #[serde(default)]
    pollutants: Pollutants,
    #[serde(default, deserialize_with = "null_as_default")]
    openaq_pollutants: Vec<OpenAqMeasurement>,
    #[serde(default)]
    weather: Option<Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
