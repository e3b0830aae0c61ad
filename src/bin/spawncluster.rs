use clap::Parser;
use log::{info, LevelFilter};
use rand::{rngs::StdRng, SeedableRng};
use simple_logger::SimpleLogger;
use spawncluster::{
    cluster, cluster_sharded, load_spawnpoints, process_clusters, save_kml, ClusterConfig,
    SpawnResult, DEFAULT_RADIUS, DEFAULT_SPAWN_TIMESPAN, DEFAULT_TIME_THRESHOLD,
};
use std::{
    fmt::{self, Display},
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Reduce spawn point observations to one representative point per cluster.
///
/// Observations that are close in both space and time are grouped into a single cluster, and each
/// cluster is written out as its centroid and latest time.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "spawncluster")]
#[clap(author, version, about)]
struct SpawnClusterOptionsInit {
    /// The path to a JSON array of observations, use "-" for stdin.
    ///
    /// If this is not specified, then the program will check for it in the "SPAWNPOINTS_FILE"
    /// environment variable.
    #[clap(env = "SPAWNPOINTS_FILE")]
    input: PathBuf,

    /// The path to write the JSON output rows to. Defaults to stdout.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Maximum distance in meters from any member of a cluster to its centroid.
    #[clap(short, long)]
    #[clap(env = "SPAWNCLUSTER_RADIUS")]
    #[clap(default_value_t=DEFAULT_RADIUS)]
    radius: f64,

    /// Maximum spread in seconds between the earliest and latest member of a cluster.
    #[clap(short, long)]
    #[clap(env = "SPAWNCLUSTER_TIME_THRESHOLD")]
    #[clap(default_value_t=DEFAULT_TIME_THRESHOLD)]
    time_threshold: i64,

    /// Minutes a spawn lasts, used to derive the spawn time of records that only have a
    /// disappear_time.
    #[clap(long)]
    #[clap(default_value_t=DEFAULT_SPAWN_TIMESPAN)]
    spawn_timespan: i64,

    /// Seed for picking the representative id of each cluster.
    ///
    /// If this is not specified the choice is random on every run.
    #[clap(long)]
    seed: Option<u64>,

    /// Split the input into independent geographic regions and cluster them in parallel.
    #[clap(long)]
    shards: bool,

    /// The number of worker threads used with --shards. Defaults to the number of CPUs.
    #[clap(long)]
    threads: Option<usize>,

    /// The path to a KML file of the output rows.
    #[clap(short, long)]
    kml_file: Option<PathBuf>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct SpawnClusterOptionsChecked {
    /// Where to read observations from, None for stdin.
    input: Option<PathBuf>,

    /// Where to write rows to, None for stdout.
    output: Option<PathBuf>,

    /// Cluster limits.
    config: ClusterConfig,

    /// Spawn length in minutes.
    spawn_timespan: i64,

    /// Seed for the representative id choice.
    seed: Option<u64>,

    /// None for a single sequential pass.
    threads: Option<usize>,

    /// The path to a KML file to produce from this run.
    kml_file: Option<PathBuf>,

    /// Verbose output
    verbose: bool,
}

impl Display for SpawnClusterOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let or_std = |p: &Option<PathBuf>, std: &str| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| std.to_owned())
        };

        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "          Input: {}", or_std(&self.input, "stdin"))?;
        writeln!(f, "         Output: {}", or_std(&self.output, "stdout"))?;
        writeln!(f, "     Radius (m): {}", self.config.radius)?;
        writeln!(f, "  Threshold (s): {}", self.config.time_threshold)?;
        writeln!(f, " Timespan (min): {}", self.spawn_timespan)?;
        match self.seed {
            Some(seed) => writeln!(f, "           Seed: {}", seed)?,
            None => writeln!(f, "           Seed: random")?,
        }
        match self.threads {
            Some(threads) => writeln!(f, "        Threads: {}", threads)?,
            None => writeln!(f, "        Threads: sequential")?,
        }
        if let Some(ref kml_file) = self.kml_file {
            writeln!(f, "     Output KML: {}", kml_file.display())?;
        }
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> SpawnResult<SpawnClusterOptionsChecked> {
    let SpawnClusterOptionsInit {
        input,
        output,
        radius,
        time_threshold,
        spawn_timespan,
        seed,
        shards,
        threads,
        kml_file,
        verbose,
    } = SpawnClusterOptionsInit::parse();

    let config = ClusterConfig::new(radius, time_threshold)?;

    if !(0..60).contains(&spawn_timespan) {
        return Err(format!(
            "spawn timespan must be between 0 and 59 minutes, got {}",
            spawn_timespan
        )
        .into());
    }

    let input = if input.as_os_str() == "-" {
        None
    } else {
        Some(input)
    };

    let threads = if shards {
        Some(threads.unwrap_or_else(num_cpus::get).max(1))
    } else {
        None
    };

    Ok(SpawnClusterOptionsChecked {
        input,
        output,
        config,
        spawn_timespan,
        seed,
        threads,
        kml_file,
        verbose,
    })
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> SpawnResult<()> {
    let opts = parse_args()?;

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .with_module_level("spawncluster", level)
        .init()?;

    if opts.verbose {
        info!("{}", opts);
    }

    //
    // Load and check the observations.
    //
    let reader: Box<dyn Read> = match opts.input {
        Some(ref path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin()),
    };
    let spawnpoints = load_spawnpoints(reader, opts.spawn_timespan)?;
    let num_points = spawnpoints.len();

    //
    // Cluster, validate, and reduce.
    //
    let clusters = match opts.threads {
        Some(threads) => cluster_sharded(spawnpoints, &opts.config, threads)?,
        None => cluster(spawnpoints, &opts.config),
    };

    if opts.verbose {
        let largest = clusters.iter().map(|c| c.len()).max().unwrap_or(0);
        info!(
            "Clustered {} spawn points into {} clusters, the largest has {} members.",
            num_points,
            clusters.len(),
            largest
        );
    }

    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let rows = match process_clusters(clusters, &opts.config, &mut rng) {
        Ok(rows) => rows,
        Err(violation) => {
            log::error!("No output produced: {}", violation);
            return Err(violation.into());
        }
    };

    //
    // Write the output.
    //
    let mut writer: Box<dyn Write> = match opts.output {
        Some(ref path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writeln!(writer)?;
    writer.flush()?;

    if let Some(ref kml_file) = opts.kml_file {
        save_kml(&rows, kml_file)?;
    }

    if opts.verbose {
        info!("Wrote {} rows.", rows.len());
    }

    Ok(())
}
