use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;
use tile_search::pdb::PdbSet;
use tile_search::TileProblem;
use tracing::Level;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Build pattern databases for a sliding-tile problem", long_about = None)]
struct Args {
    /// File holding the goal description (adj and at predicates)
    goal_file: PathBuf,

    /// Number of tile IDs merged per pattern, e.g. `-s 7 -s 5 -s 3`
    #[clap(short, long = "strength", required = true)]
    strengths: Vec<usize>,

    /// Optional file with one start state per line to evaluate
    #[clap(short, long)]
    problems: Option<PathBuf>,

    /// Fraction of patterns sampled per evaluation
    #[clap(long, default_value_t = 1.0)]
    fraction: f64,

    /// Seed for pattern sampling
    #[clap(long, default_value_t = 42)]
    seed: u64,

    /// Build the patterns of each strength concurrently
    #[clap(long)]
    parallel: bool,

    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let goal = fs::read_to_string(&args.goal_file)?;
    let problem = TileProblem::new(goal.trim())?;
    let starts = match &args.problems {
        Some(path) => fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| problem.parse_state(line))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let mut rng = SmallRng::seed_from_u64(args.seed);

    for &strength in &args.strengths {
        let set = if args.parallel {
            PdbSet::build_parallel(&problem, strength)?
        } else {
            PdbSet::build(&problem, strength)?
        };
        let states: usize = set.databases().iter().map(|db| db.len()).sum();
        println!(
            "Strength {}: {} patterns, {} abstract states in total",
            strength,
            set.len(),
            states
        );

        for (index, start) in starts.iter().enumerate() {
            let sampled = set.sample(&mut rng, args.fraction);
            let values: Vec<String> = sampled
                .iter()
                .map(|db| match db.lookup(start) {
                    Some(d) => d.to_string(),
                    None => "inf".to_string(),
                })
                .collect();
            println!(
                "  Problem {:<4} max h = {:<4} sampled = [{}]",
                index + 1,
                set.max_heuristic(start),
                values.join(", ")
            );
        }
    }
    Ok(())
}
