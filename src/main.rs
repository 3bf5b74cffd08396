//! Branch-and-Bound TSP Solver - Command Line Interface

use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use bnb_tsp_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use bnb_tsp_solver::exact::{BnbConfig, BranchAndBound, PriorityMetric};
use bnb_tsp_solver::heuristics::construction::{GreedyTour, RandomTour, TourConstructor};
use bnb_tsp_solver::heuristics::local_search::{LocalSearch, SwapSearch};
use bnb_tsp_solver::instance::{Difficulty, ScenarioConfig, TspInstance};

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "bnb-tsp-solver")]
#[command(version = "1.0")]
#[command(about = "A time-bounded branch-and-bound solver for the asymmetric TSP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance file or a generated scenario
    Solve {
        /// Path to a TSP-LIB instance file
        #[arg(short, long, conflicts_with = "generate")]
        instance: Option<PathBuf>,

        /// Generate a random scenario with this many cities instead
        #[arg(short, long)]
        generate: Option<usize>,

        /// Difficulty of the generated scenario
        #[arg(short, long, value_enum, default_value = "hard")]
        difficulty: DifficultyArg,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "bnb")]
        algorithm: Algorithm,

        /// Queue ordering for branch and bound
        #[arg(short, long, value_enum, default_value = "cost-per-depth")]
        priority: PriorityArg,

        /// Time limit in seconds
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output result to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a random scenario as a TSP-LIB file
    Generate {
        /// Number of cities
        #[arg(short, long)]
        size: usize,

        #[arg(short, long, value_enum, default_value = "hard")]
        difficulty: DifficultyArg,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run benchmarks on a directory of instances or on generated scenarios
    Benchmark {
        /// Directory containing .tsp files
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Sizes of generated scenarios, used when no directory is given
        #[arg(long, value_delimiter = ',', default_value = "8,10,12,14")]
        sizes: Vec<usize>,

        #[arg(long, value_enum, default_value = "hard")]
        difficulty: DifficultyArg,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of seeded runs per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Time limit per run
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Run instances one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Branch and bound with greedy seeding
    Bnb,
    /// Nearest neighbor with random restarts
    Greedy,
    /// Random valid permutation
    Random,
    /// Greedy followed by swap local search
    GreedySwap,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(d: DifficultyArg) -> Self {
        match d {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Normal => Difficulty::Normal,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum PriorityArg {
    /// Lower bound divided by depth
    CostPerDepth,
    /// Plain lower bound
    LowerBound,
}

impl From<PriorityArg> for PriorityMetric {
    fn from(p: PriorityArg) -> Self {
        match p {
            PriorityArg::CostPerDepth => PriorityMetric::CostPerDepth,
            PriorityArg::LowerBound => PriorityMetric::LowerBound,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { instance, generate, difficulty, algorithm, priority, time_limit, seed, output, verbose } => {
            let instance = match (instance, generate) {
                (Some(path), _) => load_or_exit(&path),
                (None, Some(size)) => generate_or_exit(size, difficulty.into(), seed),
                (None, None) => {
                    eprintln!("Either --instance or --generate is required");
                    std::process::exit(2);
                }
            };
            solve_instance(&instance, algorithm, priority.into(), time_limit, seed, output, verbose);
        }

        Commands::Generate { size, difficulty, seed, output } => {
            let instance = generate_or_exit(size, difficulty.into(), seed);
            if let Err(e) = instance.save(&output) {
                eprintln!("Error writing instance: {}", e);
                std::process::exit(1);
            }
            println!("Scenario {} saved to {:?}", instance.name, output);
        }

        Commands::Benchmark { dir, sizes, difficulty, output, runs, time_limit, sequential } => {
            let instances = match dir {
                Some(dir) => {
                    println!("Loading instances from {:?}...", dir);
                    load_instances_from_dir(&dir)
                }
                None => sizes
                    .iter()
                    .enumerate()
                    .map(|(i, &size)| generate_or_exit(size, difficulty.into(), i as u64))
                    .collect(),
            };
            run_benchmark(&instances, &output, runs, time_limit, !sequential);
        }

        Commands::Analyze { instance } => {
            analyze_instance(&load_or_exit(&instance));
        }
    }
}

fn load_or_exit(path: &Path) -> TspInstance {
    println!("Loading instance from {:?}...", path);
    match TspInstance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn generate_or_exit(size: usize, difficulty: Difficulty, seed: u64) -> TspInstance {
    let config = ScenarioConfig {
        size,
        difficulty,
        ..Default::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    match TspInstance::generate(&config, &mut rng) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error generating scenario: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_instance(
    instance: &TspInstance,
    algorithm: Algorithm,
    priority: PriorityMetric,
    time_limit: f64,
    seed: u64,
    output: Option<PathBuf>,
    verbose: bool,
) {
    if verbose {
        println!("{}", instance.statistics());
    }

    println!("Solving with {:?} algorithm...", algorithm);
    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let json = match algorithm {
        Algorithm::Bnb => {
            let solver = BranchAndBound::new(BnbConfig {
                time_limit,
                priority,
                seed,
                ..Default::default()
            });
            let result = match solver.solve(instance) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Solver error: {}", e);
                    std::process::exit(1);
                }
            };
            println!("\n========== Results ==========");
            print!("{}", result);
            if !result.is_feasible() {
                println!("No tour exists (or none was found in time)");
            }
            serde_json::to_string_pretty(&result)
        }

        Algorithm::Greedy | Algorithm::Random | Algorithm::GreedySwap => {
            let mut solution = match algorithm {
                Algorithm::Random => RandomTour::new(time_limit, usize::MAX).construct(instance, &mut rng),
                _ => GreedyTour::new(time_limit, usize::MAX).construct(instance, &mut rng),
            };
            if algorithm == Algorithm::GreedySwap {
                SwapSearch::new(time_limit).improve(instance, &mut solution);
                solution.algorithm = "Greedy + Swap".to_string();
            }
            solution.computation_time = start.elapsed().as_secs_f64();
            println!("\n========== Results ==========");
            print!("{}", solution);
            serde_json::to_string_pretty(&solution)
        }
    };

    if let Some(out_path) = output {
        let written = json
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&out_path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("\nResult saved to {:?}", out_path),
            Err(e) => {
                eprintln!("Failed to write output: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_benchmark(instances: &[TspInstance], output: &Path, runs: usize, time_limit: f64, parallel: bool) {
    println!("Benchmarking {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return;
    }

    if let Err(e) = std::fs::create_dir_all(output) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    let config = BenchmarkConfig {
        num_runs: runs,
        time_limit,
        parallel,
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(instances);

    let results_path = output.join("results.csv");
    match benchmark.export_to_csv(&results_path) {
        Ok(()) => println!("\nResults exported to {:?}", results_path),
        Err(e) => eprintln!("Failed to export results: {}", e),
    }

    let stats_path = output.join("statistics.csv");
    match benchmark.export_statistics_csv(&stats_path) {
        Ok(()) => println!("Statistics exported to {:?}", stats_path),
        Err(e) => eprintln!("Failed to export statistics: {}", e),
    }

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    match std::fs::write(&report_path, &report) {
        Ok(()) => println!("Report saved to {:?}", report_path),
        Err(e) => eprintln!("Failed to save report: {}", e),
    }
}

fn analyze_instance(instance: &TspInstance) {
    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let n = instance.dimension;
    let out_degrees: Vec<usize> = (0..n)
        .map(|i| (0..n).filter(|&j| instance.cost(i, j).is_finite()).count())
        .collect();
    let in_degrees: Vec<usize> = (0..n)
        .map(|j| (0..n).filter(|&i| instance.cost(i, j).is_finite()).count())
        .collect();

    println!("Degree Statistics:");
    println!(
        "  Out-degree: min {} / max {}",
        out_degrees.iter().min().copied().unwrap_or(0),
        out_degrees.iter().max().copied().unwrap_or(0)
    );
    println!(
        "  In-degree: min {} / max {}",
        in_degrees.iter().min().copied().unwrap_or(0),
        in_degrees.iter().max().copied().unwrap_or(0)
    );
    if n > 1 && (out_degrees.contains(&0) || in_degrees.contains(&0)) {
        println!("  Some city cannot be left or reached: no tour exists");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let random = RandomTour::default().construct(instance, &mut rng);
    let greedy = GreedyTour::default().construct(instance, &mut rng);

    println!("\nQuick Solution Estimates:");
    println!("  Random: {:.2} (feasible: {})", random.cost, random.feasible);
    println!("  Greedy: {:.2} (feasible: {})", greedy.cost, greedy.feasible);
}
