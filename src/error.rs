use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type used by the pipeline and the binary.
pub type SpawnResult<T> = Result<T, Box<dyn Error>>;

/// A raw record could not be turned into a [Spawnpoint](crate::Spawnpoint).
#[derive(Debug, Clone, PartialEq)]
pub struct InputError {
    /// Position of the offending record in the input sequence.
    pub index: usize,
    /// The record's identifier, if it had one.
    pub id: Option<String>,
    /// The field that was missing or malformed.
    pub field: &'static str,
    pub msg: String,
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self.id {
            Some(ref id) => write!(
                f,
                "invalid record {} (id {}): field '{}': {}",
                self.index, id, self.field, self.msg
            ),
            None => write!(
                f,
                "invalid record {}: field '{}': {}",
                self.index, self.field, self.msg
            ),
        }
    }
}

impl Error for InputError {}

/// The checks the validator runs over every produced cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Invariant {
    /// `max_time - min_time <= time_threshold`
    #[strum(serialize = "time span")]
    TimeSpan,
    /// Every member is within `radius` of the centroid.
    #[strum(serialize = "distance to centroid")]
    DistanceToCentroid,
    /// Every member's time lies within `[min_time, max_time]`.
    #[strum(serialize = "time bounds")]
    TimeBounds,
}

/// A produced cluster broke one of its invariants. This is an engine bug, never bad input.
#[derive(Debug, Clone, PartialEq)]
pub struct InvariantViolation {
    /// Index of the cluster in the engine's output (creation order).
    pub cluster_index: usize,
    pub invariant: Invariant,
    pub detail: String,
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "cluster {} violates the {} invariant: {}",
            self.cluster_index, self.invariant, self.detail
        )
    }
}

impl Error for InvariantViolation {}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub msg: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.msg)
    }
}

impl Error for ConfigError {}
