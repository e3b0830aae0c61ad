use super::{spawncluster::span_exceeds, Spawncluster};
use crate::{
    config::ClusterConfig,
    error::{Invariant, InvariantViolation},
    geo::distance,
};

/**
 * Re-check a finished cluster against its invariants.
 *
 * The engine only builds clusters that satisfy these, so a failure here means the engine is
 * broken. Nothing is corrected.
 *
 * #Arguments
 * cluster_index - position of the cluster in the engine output, for the diagnostic.
 */
pub fn validate(
    cluster_index: usize,
    cluster: &Spawncluster,
    config: &ClusterConfig,
) -> Result<(), InvariantViolation> {
    let violation = |invariant: Invariant, detail: String| InvariantViolation {
        cluster_index,
        invariant,
        detail,
    };

    if span_exceeds(cluster.time_span(), config.time_threshold) {
        return Err(violation(
            Invariant::TimeSpan,
            format!(
                "max_time {} - min_time {} = {} exceeds {}",
                cluster.max_time(),
                cluster.min_time(),
                cluster.time_span(),
                config.time_threshold
            ),
        ));
    }

    let centroid = cluster.centroid();
    for (i, member) in cluster.iter().enumerate() {
        let dist = distance(member.position, centroid);
        if dist > config.radius {
            return Err(violation(
                Invariant::DistanceToCentroid,
                format!(
                    "member {} ({}) at {} is {:.3} m from centroid {}, radius is {} m",
                    i,
                    member.id.as_deref().unwrap_or("no id"),
                    member.position,
                    dist,
                    centroid,
                    config.radius
                ),
            ));
        }

        if member.time < cluster.min_time() || member.time > cluster.max_time() {
            return Err(violation(
                Invariant::TimeBounds,
                format!(
                    "member {} time {} is outside [{}, {}]",
                    i,
                    member.time,
                    cluster.min_time(),
                    cluster.max_time()
                ),
            ));
        }
    }

    Ok(())
}

/// Validate every cluster, stopping at the first violation.
pub fn validate_all(
    clusters: &[Spawncluster],
    config: &ClusterConfig,
) -> Result<(), InvariantViolation> {
    for (i, c) in clusters.iter().enumerate() {
        if let Err(violation) = validate(i, c, config) {
            log::error!("clustering produced an invalid cluster: {}", violation);
            return Err(violation);
        }
    }

    Ok(())
}
