//! Benchmarking and experimentation module.
//!
//! Runs the tour constructors, the swap search and branch and bound over a set
//! of instances, collects statistics and exports them.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::exact::{BnbConfig, BranchAndBound, PriorityMetric};
use crate::heuristics::construction::{GreedyTour, RandomTour, TourConstructor};
use crate::heuristics::local_search::{LocalSearch, SwapSearch};
use crate::instance::TspInstance;
use crate::solution::Solution;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Number of cities
    pub dimension: usize,
    /// Seed of this run
    pub seed: u64,
    /// Solution cost
    pub cost: f64,
    /// Whether a tour was found
    pub feasible: bool,
    /// Computation time in seconds
    pub time: f64,
    /// States expanded (branch and bound only)
    pub states_expanded: Option<usize>,
    /// States pruned (branch and bound only)
    pub states_pruned: Option<usize>,
    /// Maximum queue size (branch and bound only)
    pub max_queue_size: Option<usize>,
    /// Gap to the best cost found on this instance, in percent
    pub gap_to_best: Option<f64>,
}

impl AlgorithmResult {
    fn from_solution(instance: &TspInstance, seed: u64, solution: &Solution) -> Self {
        AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            dimension: instance.dimension,
            seed,
            cost: solution.cost,
            feasible: solution.feasible,
            time: solution.computation_time,
            states_expanded: None,
            states_pruned: None,
            max_queue_size: None,
            gap_to_best: None,
        }
    }
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs
    pub num_runs: usize,
    /// Number of runs that found a tour
    pub num_feasible: usize,
    /// Average cost
    pub avg_cost: f64,
    /// Best cost
    pub best_cost: f64,
    /// Worst cost
    pub worst_cost: f64,
    /// Sample standard deviation of cost
    pub std_cost: f64,
    /// Average time
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
    /// Average gap to best
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per algorithm
    pub num_runs: usize,
    /// Time limit per run in seconds
    pub time_limit: f64,
    /// Queue ordering for branch and bound
    pub priority: PriorityMetric,
    /// Process instances in parallel
    pub parallel: bool,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            time_limit: 60.0,
            priority: PriorityMetric::CostPerDepth,
            parallel: true,
            progress: true,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run every algorithm on one instance, `num_runs` seeds each
    pub fn run_instance(&self, instance: &TspInstance) -> Vec<AlgorithmResult> {
        log::info!("Running benchmark on instance: {}", instance.name);
        let mut results = Vec::new();

        for seed in 0..self.config.num_runs as u64 {
            let constructors: Vec<Box<dyn TourConstructor>> = vec![
                Box::new(RandomTour::new(self.config.time_limit, 100_000)),
                Box::new(GreedyTour::new(self.config.time_limit, 1_000)),
            ];
            for constructor in &constructors {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let solution = constructor.construct(instance, &mut rng);
                results.push(AlgorithmResult::from_solution(instance, seed, &solution));
            }

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut solution = GreedyTour::default().construct(instance, &mut rng);
            let start = std::time::Instant::now();
            SwapSearch::new(self.config.time_limit).improve(instance, &mut solution);
            solution.computation_time += start.elapsed().as_secs_f64();
            solution.algorithm = "Greedy + Swap".to_string();
            results.push(AlgorithmResult::from_solution(instance, seed, &solution));

            let solver = BranchAndBound::new(BnbConfig {
                time_limit: self.config.time_limit,
                priority: self.config.priority,
                seed,
                ..Default::default()
            });
            match solver.solve(instance) {
                Ok(result) => {
                    let mut record = AlgorithmResult::from_solution(instance, seed, &result.to_solution());
                    record.states_expanded = Some(result.stats.states_expanded);
                    record.states_pruned = Some(result.stats.states_pruned);
                    record.max_queue_size = Some(result.stats.max_queue_size);
                    results.push(record);
                }
                Err(e) => log::error!("Branch and bound failed on {}: {}", instance.name, e),
            }
        }

        results
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[TspInstance]) {
        let progress = if self.config.progress {
            let pb = ProgressBar::new(instances.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
                pb.set_style(style);
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let batches: Vec<Vec<AlgorithmResult>> = if self.config.parallel {
            instances
                .par_iter()
                .map(|instance| {
                    let r = self.run_instance(instance);
                    progress.inc(1);
                    r
                })
                .collect()
        } else {
            instances
                .iter()
                .map(|instance| {
                    progress.set_message(instance.name.clone());
                    let r = self.run_instance(instance);
                    progress.inc(1);
                    r
                })
                .collect()
        };
        progress.finish_and_clear();

        for mut batch in batches {
            Self::fill_gaps(&mut batch);
            self.results.extend(batch);
        }
    }

    /// Gap of every feasible result to the best cost on the same instance
    fn fill_gaps(results: &mut [AlgorithmResult]) {
        let mut best: HashMap<String, f64> = HashMap::new();
        for r in results.iter().filter(|r| r.feasible) {
            let entry = best.entry(r.instance.clone()).or_insert(f64::INFINITY);
            *entry = entry.min(r.cost);
        }
        for r in results.iter_mut().filter(|r| r.feasible) {
            if let Some(&b) = best.get(&r.instance) {
                if b > 0.0 {
                    r.gap_to_best = Some((r.cost - b) / b * 100.0);
                }
            }
        }
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            stats_map.entry(result.algorithm.clone()).or_default().push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let feasible_results: Vec<_> = results.iter().filter(|r| r.feasible).collect();

            if feasible_results.is_empty() {
                continue;
            }

            let costs: Vec<f64> = feasible_results.iter().map(|r| r.cost).collect();
            let times: Vec<f64> = feasible_results.iter().map(|r| r.time).collect();
            let gaps: Vec<f64> = feasible_results.iter().filter_map(|r| r.gap_to_best).collect();

            let std_cost = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_runs: results.len(),
                num_feasible: feasible_results.len(),
                avg_cost: costs.iter().mean(),
                best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                worst_cost: costs.iter().cloned().fold(0.0, f64::max),
                std_cost,
                avg_time: times.iter().mean(),
                total_time: times.iter().sum::<f64>(),
                avg_gap: if gaps.is_empty() { None } else { Some(gaps.iter().mean()) },
            });
        }

        statistics.sort_by(|a, b| a.avg_cost.total_cmp(&b.avg_cost));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> csv::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> csv::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       TSP Benchmark Report\n");
        report.push_str(&format!("       {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        report.push_str("========================================\n\n");

        let stats = self.compute_statistics();

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<20} {:>10} {:>12} {:>12} {:>10} {:>10}\n",
            "Algorithm", "Feasible", "Avg Cost", "Best Cost", "Avg Gap%", "Avg Time"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for stat in &stats {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<20} {:>10} {:>12.2} {:>12.2} {:>10} {:>10.4}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_feasible, stat.num_runs),
                stat.avg_cost,
                stat.best_cost,
                gap_str,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");

        let mut instance_best: HashMap<&str, &AlgorithmResult> = HashMap::new();
        for result in self.results.iter().filter(|r| r.feasible) {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }

        let mut names: Vec<&&str> = instance_best.keys().collect();
        names.sort();
        for name in names {
            let best = instance_best[*name];
            report.push_str(&format!("  {}: {:.2} ({})\n", name, best.cost, best.algorithm));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

/// Load every `.tsp` file of a directory, sorted by size
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<TspInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "tsp").unwrap_or(false) {
                match TspInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("Skipping {:?}: {}", path, e),
                }
            }
        }
    }

    instances.sort_by_key(|i| i.dimension);

    instances
}
