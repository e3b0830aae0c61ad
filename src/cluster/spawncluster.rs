use crate::{
    geo::{intermediate_point, Coord},
    spawnpoint::Spawnpoint,
};

/**
 * A growing group of spawn points with a running centroid and time range.
 *
 * A cluster always has at least one member, members are only ever added, and the centroid is
 * updated incrementally on each append rather than recomputed from all the members.
 */
#[derive(Debug, Clone)]
pub struct Spawncluster {
    members: Vec<Spawnpoint>,
    centroid: Coord,
    min_time: i64,
    max_time: i64,
}

impl Spawncluster {
    /// Start a new cluster with a single member.
    pub fn new(spawnpoint: Spawnpoint) -> Self {
        Spawncluster {
            centroid: spawnpoint.position,
            min_time: spawnpoint.time,
            max_time: spawnpoint.time,
            members: vec![spawnpoint],
        }
    }

    /// Add a member, moving the centroid `1 / (n + 1)` of the way toward it and widening the time
    /// range if needed.
    pub fn append(&mut self, spawnpoint: Spawnpoint) {
        self.centroid = self.simulate_append(&spawnpoint);

        self.min_time = self.min_time.min(spawnpoint.time);
        self.max_time = self.max_time.max(spawnpoint.time);

        self.members.push(spawnpoint);
    }

    /// The centroid this cluster would have if `spawnpoint` were appended.
    pub fn simulate_append(&self, spawnpoint: &Spawnpoint) -> Coord {
        let n = self.members.len() as f64;
        let f = n / (n + 1.0);
        intermediate_point(spawnpoint.position, self.centroid, f)
    }

    pub fn centroid(&self) -> Coord {
        self.centroid
    }

    pub fn min_time(&self) -> i64 {
        self.min_time
    }

    pub fn max_time(&self) -> i64 {
        self.max_time
    }

    /// The spread between the earliest and latest member. Never overflows, even for times at
    /// opposite ends of the `i64` range.
    pub fn time_span(&self) -> u64 {
        self.max_time.abs_diff(self.min_time)
    }

    /// Members in the order they were added.
    pub fn members(&self) -> &[Spawnpoint] {
        &self.members
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Spawnpoint> {
        self.members.iter()
    }

    pub fn contains(&self, spawnpoint: &Spawnpoint) -> bool {
        self.members.contains(spawnpoint)
    }

    /// Number of members, never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.members.len()
    }
}

impl<'a> IntoIterator for &'a Spawncluster {
    type Item = &'a Spawnpoint;
    type IntoIter = std::slice::Iter<'a, Spawnpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Does a time span of `span` break a `threshold` of the same unit? A negative threshold is
/// broken by every span.
pub(crate) fn span_exceeds(span: u64, threshold: i64) -> bool {
    u64::try_from(threshold).map_or(true, |threshold| span > threshold)
}
