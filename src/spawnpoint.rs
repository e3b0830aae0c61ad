/*!
 * A single observation of a spawn location and its time of day.
 *
 * Collectors hand us loosely typed JSON records. They are normalized into [Spawnpoint] values
 * here, and anything malformed is rejected with an [InputError] before it reaches the clustering
 * engine.
 */
use crate::{error::InputError, geo::Coord, SpawnResult};
use chrono::{DateTime, Timelike, Utc};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::io::Read;

/// Seconds in the recurring cycle the collector reports times in.
const SECONDS_PER_HOUR: i64 = 3600;

/// The default presumed length of a spawn in minutes.
pub const DEFAULT_SPAWN_TIMESPAN: i64 = 15;

/**
 * A location where something was observed and the time (seconds past the hour) it appears.
 *
 * Constructed once and never modified.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Spawnpoint {
    /// Only carried along so results can be traced back to their source.
    pub id: Option<String>,
    pub position: Coord,
    /// Treated as a plain linear scalar, there is no wrap around at the top of the hour.
    pub time: i64,
}

impl Spawnpoint {
    pub fn new(id: Option<String>, position: Coord, time: i64) -> Self {
        Spawnpoint { id, position, time }
    }
}

impl Serialize for Spawnpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.id.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(ref id) = self.id {
            map.serialize_entry("spawnpoint_id", id)?;
        }
        map.serialize_entry("lat", &self.position.lat)?;
        map.serialize_entry("lng", &self.position.lon)?;
        map.serialize_entry("time", &self.time)?;
        map.end()
    }
}

/// A record as the collector sends it. Every field is checked during normalization.
#[derive(Debug, Default, Deserialize)]
pub struct RawSpawnpoint {
    #[serde(default)]
    pub spawnpoint_id: Option<Value>,
    #[serde(default)]
    pub sid: Option<Value>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    /// RFC 3339 timestamp of when the spawn disappeared, used when `time` is absent.
    #[serde(default)]
    pub disappear_time: Option<String>,
}

impl RawSpawnpoint {
    /**
     * Check the record and turn it into a [Spawnpoint].
     *
     * #Arguments
     * index - the position of this record in the input, used for error messages.
     * spawn_timespan - minutes a spawn lasts, used to back out the spawn time from
     *                  `disappear_time` when `time` is not given.
     */
    pub fn normalize(self, index: usize, spawn_timespan: i64) -> Result<Spawnpoint, InputError> {
        // An empty or null `spawnpoint_id` counts as absent, so `sid` can stand in for it.
        let spawnpoint_id = self.spawnpoint_id.filter(|v| !is_blank_id(v));
        let id = match spawnpoint_id.or(self.sid) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(InputError {
                    index,
                    id: None,
                    field: "spawnpoint_id",
                    msg: format!("expected a string or number, found {}", other),
                })
            }
        };

        let err = |field: &'static str, msg: String| InputError {
            index,
            id: id.clone(),
            field,
            msg,
        };

        let lat = parse_degrees(self.lat.as_ref(), 90.0).map_err(|msg| err("lat", msg))?;
        let lon = parse_degrees(self.lng.as_ref(), 180.0).map_err(|msg| err("lng", msg))?;

        let time = match (self.time.as_ref(), self.disappear_time.as_deref()) {
            (Some(val), _) if !val.is_null() => parse_time(val).map_err(|msg| err("time", msg))?,
            (_, Some(disappear)) => {
                let disappear = DateTime::parse_from_rfc3339(disappear)
                    .map_err(|e| err("disappear_time", e.to_string()))?
                    .with_timezone(&Utc);
                spawn_time_from_disappear(&disappear, spawn_timespan)
            }
            _ => return Err(err("time", "missing".to_owned())),
        };

        Ok(Spawnpoint {
            id,
            position: Coord { lat, lon },
            time,
        })
    }
}

fn is_blank_id(val: &Value) -> bool {
    match val {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn parse_degrees(val: Option<&Value>, limit: f64) -> Result<f64, String> {
    let deg = match val {
        None | Some(Value::Null) => return Err("missing".to_owned()),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("{} is not representable as a double", n))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s))?,
        Some(other) => return Err(format!("expected a number, found {}", other)),
    };

    if !deg.is_finite() || deg.abs() > limit {
        return Err(format!("{} is outside [-{}, {}]", deg, limit, limit));
    }

    Ok(deg)
}

fn parse_time(val: &Value) -> Result<i64, String> {
    match val {
        Value::Number(n) => {
            if let Some(t) = n.as_i64() {
                Ok(t)
            } else {
                match n.as_f64() {
                    Some(t) if t.fract() == 0.0 && t.abs() < i64::MAX as f64 => Ok(t as i64),
                    _ => Err(format!("{} is not an integer", n)),
                }
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{}' is not an integer", s)),
        other => Err(format!("expected an integer, found {}", other)),
    }
}

/**
 * Back out when a spawn appeared from when it disappeared.
 *
 * Only the minute and second of `disappear` matter. The result is seconds past the hour, shifted
 * back by the spawn timespan and wrapped into `[0, 3600)`.
 */
pub fn spawn_time_from_disappear(disappear: &DateTime<Utc>, spawn_timespan: i64) -> i64 {
    let seconds = i64::from(disappear.minute() * 60 + disappear.second());
    (seconds + SECONDS_PER_HOUR - spawn_timespan * 60).rem_euclid(SECONDS_PER_HOUR)
}

/// Normalize a list of JSON records, stopping at the first bad one.
pub fn normalize_records(
    records: Vec<Value>,
    spawn_timespan: i64,
) -> Result<Vec<Spawnpoint>, InputError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let raw: RawSpawnpoint = match record {
                Value::Object(_) => serde_json::from_value(record).map_err(|e| InputError {
                    index,
                    id: None,
                    field: "record",
                    msg: e.to_string(),
                })?,
                other => {
                    return Err(InputError {
                        index,
                        id: None,
                        field: "record",
                        msg: format!("expected an object, found {}", other),
                    })
                }
            };
            raw.normalize(index, spawn_timespan)
        })
        .collect()
}

/// Read a JSON array of records and normalize them.
pub fn load_spawnpoints<R: Read>(reader: R, spawn_timespan: i64) -> SpawnResult<Vec<Spawnpoint>> {
    let records: Vec<Value> = serde_json::from_reader(reader)?;
    let points = normalize_records(records, spawn_timespan)?;
    Ok(points)
}
