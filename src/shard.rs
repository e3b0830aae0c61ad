/*!
 * Split the input into geographic shards and cluster them in parallel.
 *
 * Two points end up in the same shard if they are linked by a chain of points where each step is
 * no more than three times the cluster radius. Every member of a cluster is within one radius of
 * its centroid, so a point in another shard is always more than twice the radius from any
 * centroid in this one and the engine would never admit it. Clustering each shard on its own and
 * ordering the clusters by their founding point therefore gives exactly the same result as a
 * single sequential pass.
 */
use crate::{
    cluster::{cluster_with_origins, Spawncluster},
    config::ClusterConfig,
    geo::{distance, meters_to_lat_degrees, EARTH_RADIUS_M},
    spawnpoint::Spawnpoint,
    SpawnResult,
};
use crossbeam_channel::{bounded, unbounded};
use rustc_hash::{FxHashMap, FxHashSet};
use static_assertions::assert_impl_all;
use std::thread::{self, JoinHandle};

assert_impl_all!(Spawnpoint: Send);
assert_impl_all!(Spawncluster: Send);

const CHANNEL_SIZE: usize = 100;

/// Multiples of the radius two points may be apart and still be forced into the same shard.
const LINK_RADII: f64 = 3.0;

type Job = Vec<(usize, Spawnpoint)>;
type JobResult = Vec<(usize, Spawncluster)>;

/**
 * Cluster the points with the work spread over `threads` worker threads.
 *
 * The output is identical to [cluster](crate::cluster()) over the same input.
 */
pub fn cluster_sharded(
    spawnpoints: Vec<Spawnpoint>,
    config: &ClusterConfig,
    threads: usize,
) -> SpawnResult<Vec<Spawncluster>> {
    let shards = partition(&spawnpoints, LINK_RADII * config.radius);
    let num_workers = threads.max(1).min(shards.len().max(1));

    log::info!(
        "split {} spawn points into {} shards across {} threads",
        spawnpoints.len(),
        shards.len(),
        num_workers
    );

    let mut slots: Vec<Option<Spawnpoint>> = spawnpoints.into_iter().map(Some).collect();
    let jobs: Vec<Job> = shards
        .into_iter()
        .map(|shard| {
            shard
                .into_iter()
                .filter_map(|idx| slots[idx].take().map(|sp| (idx, sp)))
                .collect()
        })
        .collect();

    let (to_workers, from_main) = bounded::<Job>(CHANNEL_SIZE);
    let (to_main, from_workers) = unbounded::<JobResult>();

    let workers = (0..num_workers)
        .map(|i| start_worker_thread(i, from_main.clone(), to_main.clone(), *config))
        .collect::<Result<Vec<_>, _>>()?;
    drop(from_main);
    drop(to_main);

    for job in jobs {
        to_workers.send(job)?;
    }
    drop(to_workers);

    let mut clusters: JobResult = from_workers.iter().flatten().collect();

    for worker in workers {
        worker
            .join()
            .map_err(|_| "a shard worker thread panicked".to_owned())?;
    }

    clusters.sort_by_key(|(origin, _)| *origin);

    Ok(clusters.into_iter().map(|(_, c)| c).collect())
}

fn start_worker_thread(
    id: usize,
    jobs: crossbeam_channel::Receiver<Job>,
    results: crossbeam_channel::Sender<JobResult>,
    config: ClusterConfig,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("spawncluster-shard-{}", id))
        .spawn(move || {
            for job in jobs {
                let (indexes, points): (Vec<usize>, Vec<Spawnpoint>) = job.into_iter().unzip();
                let (clusters, origins) = cluster_with_origins(points, &config);

                let tagged = origins
                    .into_iter()
                    .map(|local| indexes[local])
                    .zip(clusters)
                    .collect();

                if results.send(tagged).is_err() {
                    log::warn!("shard results dropped, receiver is gone");
                    return;
                }
            }
        })
}

/**
 * Group point indexes into shards by single linkage at `link_distance` meters.
 *
 * Shards are ordered by their first point and the indexes in each shard are ascending.
 */
pub fn partition(spawnpoints: &[Spawnpoint], link_distance: f64) -> Vec<Vec<usize>> {
    if spawnpoints.is_empty() {
        return vec![];
    }

    let grid = Grid::new(spawnpoints, link_distance);

    let mut cells: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();
    for (i, sp) in spawnpoints.iter().enumerate() {
        cells.entry(grid.cell(sp)).or_default().push(i);
    }

    let mut links = UnionFind::new(spawnpoints.len());
    for (i, sp) in spawnpoints.iter().enumerate() {
        for neighbor in grid.neighbors(grid.cell(sp)) {
            let candidates = match cells.get(&neighbor) {
                Some(c) => c,
                None => continue,
            };

            for &j in candidates.iter().filter(|&&j| j > i) {
                if distance(sp.position, spawnpoints[j].position) <= link_distance {
                    links.union(i, j);
                }
            }
        }
    }

    let mut shard_of_root: FxHashMap<usize, usize> = FxHashMap::default();
    let mut shards: Vec<Vec<usize>> = vec![];
    for i in 0..spawnpoints.len() {
        let root = links.find(i);
        let shard = *shard_of_root.entry(root).or_insert_with(|| {
            shards.push(vec![]);
            shards.len() - 1
        });
        shards[shard].push(i);
    }

    shards
}

/// A lat/lon grid where points within `link_distance` of each other are always in neighboring
/// cells.
struct Grid {
    cell_lat: f64,
    cell_lon: f64,
    num_cols: i64,
}

impl Grid {
    fn new(spawnpoints: &[Spawnpoint], link_distance: f64) -> Self {
        // A hair of slack so points exactly link_distance apart never skip a cell.
        let cell_lat = meters_to_lat_degrees(link_distance) * 1.001;

        let max_abs_lat = spawnpoints
            .iter()
            .map(|sp| sp.position.lat.abs())
            .fold(0.0, f64::max);

        // From the haversine formula, sin(d / 2) >= cos(max_lat) * sin(dlon / 2), which bounds
        // how far apart in longitude two linked points can be.
        let half_arc = f64::sin(link_distance / EARTH_RADIUS_M / 2.0);
        let ratio = half_arc / f64::cos(max_abs_lat.to_radians());

        let num_cols = if ratio < 1.0 {
            let lon_width = 2.0 * f64::asin(ratio).to_degrees() * 1.001;
            if lon_width < 120.0 {
                (360.0 / lon_width).floor() as i64
            } else {
                1
            }
        } else {
            1
        };

        Grid {
            cell_lat,
            cell_lon: 360.0 / num_cols as f64,
            num_cols,
        }
    }

    fn cell(&self, sp: &Spawnpoint) -> (i64, i64) {
        let row = ((sp.position.lat + 90.0) / self.cell_lat).floor() as i64;
        let col = ((sp.position.lon + 180.0) / self.cell_lon).floor() as i64;
        (row, col.rem_euclid(self.num_cols))
    }

    fn neighbors(&self, (row, col): (i64, i64)) -> FxHashSet<(i64, i64)> {
        let mut cells = FxHashSet::default();
        for dr in -1..=1 {
            for dc in -1..=1 {
                cells.insert((row + dr, (col + dc).rem_euclid(self.num_cols)));
            }
        }
        cells
    }
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut curr = x;
        while self.parent[curr] != root {
            let next = self.parent[curr];
            self.parent[curr] = root;
            curr = next;
        }

        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }

        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{cluster::cluster, geo::Coord};

    fn pt(lat: f64, lon: f64, time: i64) -> Spawnpoint {
        Spawnpoint::new(None, Coord::new(lat, lon), time)
    }

    #[test]
    fn test_partition_separates_distant_groups() {
        let points = vec![
            pt(45.0, -120.0, 0),
            pt(46.0, -120.0, 0),
            pt(45.0001, -120.0, 0),
            pt(46.0001, -120.0, 0),
            pt(-10.0, 30.0, 0),
        ];

        let shards = partition(&points, 210.0);
        assert_eq!(shards, vec![vec![0, 2], vec![1, 3], vec![4]]);
    }

    #[test]
    fn test_partition_chains_links() {
        // Each step is 150 m, well apart end to end but linked through the middle.
        let step = meters_to_lat_degrees(150.0);
        let points: Vec<_> = (0..10).map(|i| pt(i as f64 * step, 0.0, 0)).collect();

        let shards = partition(&points, 210.0);
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0], (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_across_antimeridian() {
        let points = vec![pt(0.0, 179.9995, 0), pt(0.0, -179.9995, 0)];
        let shards = partition(&points, 210.0);
        assert_eq!(shards.len(), 1);
    }

    #[test]
    fn test_partition_near_pole() {
        let points = vec![pt(89.9995, 0.0, 0), pt(89.9995, 180.0, 0)];
        let shards = partition(&points, 210.0);
        assert_eq!(shards.len(), 1);
    }

    #[test]
    fn test_sharded_matches_sequential() {
        let config = ClusterConfig::default();
        let step = meters_to_lat_degrees(40.0);
        let mut points = vec![];
        for region in 0..4 {
            let base_lon = region as f64 * 0.5;
            for i in 0..12 {
                points.push(pt((i % 5) as f64 * step, base_lon, (i * 37) % 400));
            }
        }
        // Interleave regions so shard order differs from input order.
        points.sort_by_key(|p| p.time);

        let sequential = cluster(points.clone(), &config);
        let sharded = cluster_sharded(points, &config, 3).unwrap();

        assert_eq!(sequential.len(), sharded.len());
        for (a, b) in sequential.iter().zip(&sharded) {
            assert_eq!(a.members(), b.members());
            assert_eq!(a.centroid(), b.centroid());
        }
    }

    #[test]
    fn test_sharded_empty() {
        let clusters = cluster_sharded(vec![], &ClusterConfig::default(), 4).unwrap();
        assert!(clusters.is_empty());
    }
}
