/*!
 * Turn the final clusters into one output row per cluster.
 */
use crate::{
    cluster::{cluster, validate_all, Spawncluster},
    config::ClusterConfig,
    error::InvariantViolation,
    spawnpoint::Spawnpoint,
};
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

/// The representative point of a cluster, handed to the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnRow {
    /// The id of a randomly chosen member. Advisory only, it is not deterministic.
    #[serde(rename = "spawnpoint_id")]
    pub id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// The latest time in the cluster, so by then every member has already spawned.
    pub time: i64,
}

/**
 * Emit one row per cluster, smallest clusters first.
 *
 * The sort is stable, so clusters of equal size keep their creation order.
 */
pub fn reduce<R>(mut clusters: Vec<Spawncluster>, rng: &mut R) -> Vec<SpawnRow>
where
    R: Rng + ?Sized,
{
    clusters.sort_by_key(|c| c.len());

    clusters
        .iter()
        .map(|c| {
            let centroid = c.centroid();
            SpawnRow {
                // TODO: pick the id of the member closest to the centroid instead of a random one.
                id: c.members().choose(&mut *rng).and_then(|m| m.id.clone()),
                lat: centroid.lat,
                lng: centroid.lon,
                time: c.max_time(),
            }
        })
        .collect()
}

/// Validate finished clusters and reduce them to rows. No rows are produced if any cluster is
/// invalid.
pub fn process_clusters<R>(
    clusters: Vec<Spawncluster>,
    config: &ClusterConfig,
    rng: &mut R,
) -> Result<Vec<SpawnRow>, InvariantViolation>
where
    R: Rng + ?Sized,
{
    validate_all(&clusters, config)?;
    Ok(reduce(clusters, rng))
}

/// Cluster, validate, and reduce a batch of spawn points.
pub fn process<R>(
    spawnpoints: Vec<Spawnpoint>,
    config: &ClusterConfig,
    rng: &mut R,
) -> Result<Vec<SpawnRow>, InvariantViolation>
where
    R: Rng + ?Sized,
{
    let num_points = spawnpoints.len();
    let clusters = cluster(spawnpoints, config);
    log::info!(
        "{} spawn points grouped into {} clusters",
        num_points,
        clusters.len()
    );

    process_clusters(clusters, config, rng)
}
