use super::{spawncluster::span_exceeds, Spawncluster};
use crate::{config::ClusterConfig, geo::distance, spawnpoint::Spawnpoint};

/// The outcome of testing whether a spawn point may join a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Admission {
    #[strum(serialize = "accepted")]
    Accepted,
    /// Outside the time window, or more than twice the radius from the centroid.
    #[strum(serialize = "too far in space or time")]
    TooFar,
    /// The point would be outside the radius of the centroid it creates.
    #[strum(serialize = "would exclude itself")]
    ExcludesSelf,
    /// An existing member would be left outside the radius of the new centroid.
    #[strum(serialize = "would orphan an existing member")]
    OrphansMember,
}

impl Admission {
    pub fn is_accepted(self) -> bool {
        self == Admission::Accepted
    }
}

/**
 * Score how well a spawn point fits a cluster, lower is better.
 *
 * #Returns
 * The distance in meters from the point to the cluster centroid, or infinity if adding the point
 * would stretch the cluster's time range past the threshold.
 */
pub fn cost(spawnpoint: &Spawnpoint, cluster: &Spawncluster, time_threshold: i64) -> f64 {
    let min_time = cluster.min_time().min(spawnpoint.time);
    let max_time = cluster.max_time().max(spawnpoint.time);

    if span_exceeds(max_time.abs_diff(min_time), time_threshold) {
        return f64::INFINITY;
    }

    distance(spawnpoint.position, cluster.centroid())
}

/// Decide if `spawnpoint` can be added to `cluster` without breaking the cluster's invariants.
pub fn check_cluster(
    spawnpoint: &Spawnpoint,
    cluster: &Spawncluster,
    config: &ClusterConfig,
) -> Admission {
    if cost(spawnpoint, cluster, config.time_threshold) > 2.0 * config.radius {
        return Admission::TooFar;
    }

    let new_centroid = cluster.simulate_append(spawnpoint);

    if distance(spawnpoint.position, new_centroid) > config.radius {
        return Admission::ExcludesSelf;
    }

    if cluster
        .iter()
        .any(|member| distance(member.position, new_centroid) > config.radius)
    {
        return Admission::OrphansMember;
    }

    Admission::Accepted
}

/**
 * Group spawn points into clusters in a single greedy pass.
 *
 * Each point goes to the lowest cost existing cluster if it is admissible there, otherwise it
 * starts a new cluster. Ties go to the earliest created cluster. Points are never reassigned, so
 * the result depends on the order of the input.
 *
 * #Returns
 * The clusters in the order they were created.
 */
pub fn cluster<I>(spawnpoints: I, config: &ClusterConfig) -> Vec<Spawncluster>
where
    I: IntoIterator<Item = Spawnpoint>,
{
    cluster_with_origins(spawnpoints, config).0
}

/// Same as [cluster], but also returns the input position of the point that founded each
/// cluster.
pub(crate) fn cluster_with_origins<I>(
    spawnpoints: I,
    config: &ClusterConfig,
) -> (Vec<Spawncluster>, Vec<usize>)
where
    I: IntoIterator<Item = Spawnpoint>,
{
    let mut clusters: Vec<Spawncluster> = vec![];
    let mut origins: Vec<usize> = vec![];

    for (i, p) in spawnpoints.into_iter().enumerate() {
        let best = clusters
            .iter()
            .enumerate()
            .map(|(idx, c)| (idx, cost(&p, c, config.time_threshold)))
            .fold(None, |best: Option<(usize, f64)>, (idx, cst)| match best {
                Some((_, best_cst)) if best_cst <= cst => best,
                _ => Some((idx, cst)),
            });

        let admission = match best {
            Some((idx, _)) => {
                let admission = check_cluster(&p, &clusters[idx], config);
                if admission.is_accepted() {
                    log::trace!("point {} joins cluster {}", i, idx);
                    clusters[idx].append(p);
                    continue;
                }
                log::trace!("point {} rejected by cluster {}: {}", i, idx, admission);
                Some(admission)
            }
            None => None,
        };

        log::debug!(
            "opening cluster {} at {} t={}{}",
            clusters.len(),
            p.position,
            p.time,
            admission
                .map(|a| format!(" ({})", a))
                .unwrap_or_default()
        );
        clusters.push(Spawncluster::new(p));
        origins.push(i);
    }

    (clusters, origins)
}
