use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tile_search::bounds::BoundedSolution;
use tile_search::config::SearchConfig;
use tile_search::{SearchEngine, SearchError, SearchResult, TileProblem, TileState};
use tracing::Level;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Weighted A* with suboptimality bounds over sliding-tile problems", long_about = None)]
struct Args {
    /// File holding the goal description (adj and at predicates)
    goal_file: PathBuf,

    /// File with one start state per line
    problems_file: PathBuf,

    /// Heuristic weights to run, e.g. `-w 4 -w 8`
    #[clap(short, long = "weight", default_values_t = vec![1.0])]
    weights: Vec<f64>,

    /// Abort a search after this many expansions
    #[clap(long)]
    max_expansions: Option<usize>,

    /// Print the solution path of each problem
    #[clap(long)]
    path: bool,

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
    let starts: Vec<String> = fs::read_to_string(&args.problems_file)?
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    println!("Loaded goal from {}", args.goal_file.display());
    println!("Goal state: {}\n", problem);

    let mut config = SearchConfig::new();
    if let Some(limit) = args.max_expansions {
        config = config.with_max_expansions(limit);
    }

    for &weight in &args.weights {
        println!("Weight {}:", weight);
        println!(
            "  {:<8} {:>5} {:>12} {:>12} {:>8} {:>8} {:>7}",
            "Problem", "C", "F/Iter", "gMin/Iter", "FBound", "XBound", "FB/XB"
        );
        for (index, raw) in starts.iter().enumerate() {
            let start = problem.parse_state(raw)?;
            let mut engine = SearchEngine::with_config(&problem, config);
            let outcome = engine.weighted_search_with_bounds(&start, |s| problem.manhattan(s), weight);
            println!("{}", report_row(index + 1, &outcome)?);
            if args.path {
                if let Ok(Some(found)) = &outcome {
                    for (step, state) in found.solution.path.iter().enumerate() {
                        println!("      {:>3}: {}", step, problem.compact(state));
                    }
                }
            }
        }
        println!();
    }
    Ok(())
}

/// One line of the result table. A search cut off by the expansion limit is
/// reported on its own row; any other error ends the batch.
fn report_row(
    number: usize,
    outcome: &SearchResult<Option<BoundedSolution<TileState>>>,
) -> SearchResult<String> {
    let found = match outcome {
        Ok(Some(found)) => found,
        Ok(None) => return Ok(format!("  {:<8} unreachable", number)),
        Err(SearchError::ResourceExhausted { expanded, .. }) => {
            return Ok(format!("  {:<8} stopped after {} expansions", number, expanded));
        }
        Err(e) => return Err(e.clone()),
    };
    let b = &found.bounds;
    Ok(format!(
        "  {:<8} {:>5} {:>12} {:>12} {:>8.4} {:>8.4} {:>7.4}{}",
        number,
        found.solution.cost,
        format!("{}/{}", b.f, b.f_iteration),
        format!("{}/{}", b.g_min, b.g_min_iteration),
        b.f_bound,
        b.x_bound,
        b.ratio(),
        if b.is_anomalous() { "  XXX" } else { "" }
    ))
}
