use crate::error::ConfigError;

/// Default maximum distance in meters from any member of a cluster to its centroid.
pub const DEFAULT_RADIUS: f64 = 70.0;

/// Default maximum spread in seconds between the earliest and latest member of a cluster. Four
/// minutes is fine since most spawns last 30 minutes or more.
pub const DEFAULT_TIME_THRESHOLD: i64 = 180;

/// The spatial and temporal limits every cluster must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    /// Meters.
    pub radius: f64,
    /// Same unit as [Spawnpoint::time](crate::Spawnpoint::time), seconds by default.
    pub time_threshold: i64,
}

impl ClusterConfig {
    pub fn new(radius: f64, time_threshold: i64) -> Result<Self, ConfigError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError {
                msg: format!("radius must be a positive number of meters, got {}", radius),
            });
        }

        if time_threshold < 0 {
            return Err(ConfigError {
                msg: format!("time threshold must not be negative, got {}", time_threshold),
            });
        }

        Ok(ClusterConfig {
            radius,
            time_threshold,
        })
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            radius: DEFAULT_RADIUS,
            time_threshold: DEFAULT_TIME_THRESHOLD,
        }
    }
}
