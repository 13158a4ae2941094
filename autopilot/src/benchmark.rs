use crate::bots::bot_ids;
use crate::runner::{outcome_label, run_bot, RunMetrics};
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use dropcatch_core::sim::{Difficulty, Outcome};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Score,
    Wins,
    Hybrid,
}

impl Objective {
    pub fn run_value(self, metrics: &RunMetrics) -> f64 {
        match self {
            Self::Score => metrics.final_score as f64,
            Self::Wins => {
                (if metrics.won { 1_000.0 } else { 0.0 }) + (metrics.final_score as f64)
                    - (metrics.tick_count as f64) * 0.01
            }
            Self::Hybrid => {
                (metrics.final_score as f64)
                    + (if metrics.won { 250.0 } else { 0.0 })
                    - (if matches!(metrics.outcome, Some(Outcome::ScoreLoss)) {
                        100.0
                    } else {
                        0.0
                    })
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::Wins => "wins",
            Self::Hybrid => "hybrid",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub bots: Vec<String>,
    pub seeds: Vec<u32>,
    pub difficulty: Difficulty,
    pub max_ticks: u32,
    pub objective: Objective,
    pub out_dir: PathBuf,
    pub save_top: usize,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub seed: u32,
    pub seed_hex: String,
    pub difficulty: Difficulty,
    pub tick_count: u32,
    pub final_score: i32,
    pub outcome: Option<Outcome>,
    pub won: bool,
    pub objective_value: f64,
    pub collect_ticks: u32,
    pub steer_ticks: u32,
    pub pointer_ticks: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotAggregate {
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub runs: usize,
    pub avg_score: f64,
    pub max_score: i32,
    pub min_score: i32,
    pub win_rate: f64,
    pub timeout_rate: f64,
    pub score_loss_rate: f64,
    pub avg_ticks: f64,
    pub avg_collect_ticks: f64,
    pub objective_value: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedTapeRecord {
    pub rank: usize,
    pub metric: String,
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub seed: u32,
    pub seed_hex: String,
    pub score: i32,
    pub ticks: u32,
    pub won: bool,
    pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub objective: Objective,
    pub difficulty: Difficulty,
    pub max_ticks: u32,
    pub jobs: Option<usize>,
    pub bots: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub bot_rankings: Vec<BotAggregate>,
    pub runs: Vec<RunRecord>,
    pub saved_tapes: Vec<SavedTapeRecord>,
}

#[derive(Clone, Debug)]
struct InternalRun {
    metrics: RunMetrics,
    objective_value: f64,
    tape: Vec<u8>,
}

pub fn resolve_bots(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(bot_ids().iter().map(|id| (*id).to_string()).collect()),
        Some(raw) => {
            let mut bots = Vec::new();
            for token in raw.split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                bots.push(token.to_string());
            }
            if bots.is_empty() {
                return Err(anyhow!("--bots resolved to empty list"));
            }
            Ok(bots)
        }
    }
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.bots.is_empty() {
        return Err(anyhow!("benchmark requires at least one bot"));
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }

    let run_jobs: Vec<(String, u32)> = config
        .bots
        .iter()
        .flat_map(|bot| config.seeds.iter().map(move |seed| (bot.clone(), *seed)))
        .collect();

    let run_one = |(bot_id, seed): &(String, u32)| -> Result<InternalRun> {
        let artifact = run_bot(bot_id, *seed, config.difficulty, config.max_ticks)
            .with_context(|| format!("benchmark run failed for bot={bot_id} seed={seed:#x}"))?;
        let objective_value = config.objective.run_value(&artifact.metrics);
        Ok(InternalRun {
            metrics: artifact.metrics,
            objective_value,
            tape: artifact.tape,
        })
    };

    let run_results: Vec<Result<InternalRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(run_results.len());
    for result in run_results {
        runs.push(result?);
    }

    let mut grouped: HashMap<String, Vec<&InternalRun>> = HashMap::new();
    for run in &runs {
        grouped
            .entry(run.metrics.bot_id.clone())
            .or_default()
            .push(run);
    }

    let mut rankings = Vec::new();
    for (bot_id, bot_runs) in grouped {
        let runs_count = bot_runs.len();
        let bot_fingerprint = bot_runs
            .first()
            .map(|run| run.metrics.bot_fingerprint.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let sum_score: i64 = bot_runs
            .iter()
            .map(|run| run.metrics.final_score as i64)
            .sum();
        let max_score = bot_runs
            .iter()
            .map(|run| run.metrics.final_score)
            .max()
            .unwrap_or_default();
        let min_score = bot_runs
            .iter()
            .map(|run| run.metrics.final_score)
            .min()
            .unwrap_or_default();
        let sum_ticks: u64 = bot_runs
            .iter()
            .map(|run| run.metrics.tick_count as u64)
            .sum();
        let sum_collect: u64 = bot_runs
            .iter()
            .map(|run| run.metrics.collect_ticks as u64)
            .sum();
        let won_count = bot_runs.iter().filter(|run| run.metrics.won).count();
        let timeout_count = bot_runs
            .iter()
            .filter(|run| matches!(run.metrics.outcome, Some(Outcome::TimeUp)))
            .count();
        let score_loss_count = bot_runs
            .iter()
            .filter(|run| matches!(run.metrics.outcome, Some(Outcome::ScoreLoss)))
            .count();
        let objective_value =
            bot_runs.iter().map(|run| run.objective_value).sum::<f64>() / runs_count as f64;

        rankings.push(BotAggregate {
            bot_id,
            bot_fingerprint,
            runs: runs_count,
            avg_score: sum_score as f64 / runs_count as f64,
            max_score,
            min_score,
            win_rate: won_count as f64 / runs_count as f64,
            timeout_rate: timeout_count as f64 / runs_count as f64,
            score_loss_rate: score_loss_count as f64 / runs_count as f64,
            avg_ticks: sum_ticks as f64 / runs_count as f64,
            avg_collect_ticks: sum_collect as f64 / runs_count as f64,
            objective_value,
        });
    }

    rankings.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.avg_score.total_cmp(&a.avg_score))
            .then_with(|| a.bot_id.cmp(&b.bot_id))
    });

    let mut run_records: Vec<RunRecord> = runs
        .iter()
        .map(|run| RunRecord {
            bot_id: run.metrics.bot_id.clone(),
            bot_fingerprint: run.metrics.bot_fingerprint.clone(),
            seed: run.metrics.seed,
            seed_hex: seed_to_hex(run.metrics.seed),
            difficulty: run.metrics.difficulty,
            tick_count: run.metrics.tick_count,
            final_score: run.metrics.final_score,
            outcome: run.metrics.outcome,
            won: run.metrics.won,
            objective_value: run.objective_value,
            collect_ticks: run.metrics.collect_ticks,
            steer_ticks: run.metrics.steer_ticks,
            pointer_ticks: run.metrics.pointer_ticks,
        })
        .collect();

    run_records.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.final_score.cmp(&a.final_score))
            .then_with(|| a.bot_id.cmp(&b.bot_id))
    });

    let mut saved_tapes = Vec::new();
    if config.save_top > 0 {
        save_top_tapes(
            &config.out_dir,
            &runs,
            "objective",
            config.save_top,
            |run| run.objective_value,
            &mut saved_tapes,
        )?;
        save_top_tapes(
            &config.out_dir,
            &runs,
            "score",
            config.save_top,
            |run| run.metrics.final_score as f64,
            &mut saved_tapes,
        )?;
    }

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        objective: config.objective,
        difficulty: config.difficulty,
        max_ticks: config.max_ticks,
        jobs: config.jobs,
        bots: config.bots,
        seeds: config.seeds,
        run_count: run_records.len(),
        bot_rankings: rankings,
        runs: run_records,
        saved_tapes,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    Ok(report)
}

fn save_top_tapes<F>(
    out_dir: &Path,
    runs: &[InternalRun],
    metric_name: &str,
    count: usize,
    metric: F,
    saved_tapes: &mut Vec<SavedTapeRecord>,
) -> Result<()>
where
    F: Fn(&InternalRun) -> f64,
{
    let mut order: Vec<&InternalRun> = runs.iter().collect();
    order.sort_by(|a, b| {
        metric(b)
            .total_cmp(&metric(a))
            .then_with(|| b.metrics.final_score.cmp(&a.metrics.final_score))
            .then_with(|| a.metrics.bot_id.cmp(&b.metrics.bot_id))
    });

    let save_dir = out_dir.join(format!("top-{metric_name}"));
    fs::create_dir_all(&save_dir)
        .with_context(|| format!("failed creating {}", save_dir.display()))?;

    for (index, run) in order.into_iter().take(count).enumerate() {
        let rank = index + 1;
        let base = format!(
            "rank{rank:02}-{}-{}-seed{:08x}-score{}-ticks{}",
            run.metrics.bot_id,
            run.metrics.difficulty.as_str(),
            run.metrics.seed,
            run.metrics.final_score,
            run.metrics.tick_count
        );
        let tape_path = save_dir.join(format!("{base}.tape"));
        fs::write(&tape_path, &run.tape)
            .with_context(|| format!("failed writing {}", tape_path.display()))?;

        let meta = serde_json::json!({
            "rank": rank,
            "metric": metric_name,
            "bot_id": run.metrics.bot_id,
            "bot_fingerprint": run.metrics.bot_fingerprint,
            "seed": run.metrics.seed,
            "seed_hex": seed_to_hex(run.metrics.seed),
            "difficulty": run.metrics.difficulty.as_str(),
            "max_ticks": run.metrics.max_ticks,
            "tick_count": run.metrics.tick_count,
            "final_score": run.metrics.final_score,
            "final_rng_state": run.metrics.final_rng_state,
            "outcome": outcome_label(run.metrics.outcome),
            "objective_value": run.objective_value,
            "collect_ticks": run.metrics.collect_ticks,
            "steer_ticks": run.metrics.steer_ticks,
            "pointer_ticks": run.metrics.pointer_ticks,
        });
        let meta_path = save_dir.join(format!("{base}.json"));
        fs::write(
            &meta_path,
            serde_json::to_vec_pretty(&meta).context("failed to serialize top tape metadata")?,
        )
        .with_context(|| format!("failed writing {}", meta_path.display()))?;

        saved_tapes.push(SavedTapeRecord {
            rank,
            metric: metric_name.to_string(),
            bot_id: run.metrics.bot_id.clone(),
            bot_fingerprint: run.metrics.bot_fingerprint.clone(),
            seed: run.metrics.seed,
            seed_hex: seed_to_hex(run.metrics.seed),
            score: run.metrics.final_score,
            ticks: run.metrics.tick_count,
            won: run.metrics.won,
            path: tape_path.to_string_lossy().into_owned(),
        });
    }

    Ok(())
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "bot_id,bot_fingerprint,seed_hex,seed,difficulty,tick_count,final_score,outcome,won,objective_value,collect_ticks,steer_ticks,pointer_ticks\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            row.bot_id,
            row.bot_fingerprint,
            row.seed_hex,
            row.seed,
            row.difficulty.as_str(),
            row.tick_count,
            row.final_score,
            outcome_label(row.outcome),
            row.won,
            row.objective_value,
            row.collect_ticks,
            row.steer_ticks,
            row.pointer_ticks
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[BotAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,bot_id,bot_fingerprint,runs,avg_score,max_score,min_score,win_rate,timeout_rate,score_loss_rate,avg_ticks,avg_collect_ticks,objective_value\n",
    );
    for (index, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{:.2},{},{},{:.4},{:.4},{:.4},{:.2},{:.2},{:.4}\n",
            index + 1,
            row.bot_id,
            row.bot_fingerprint,
            row.runs,
            row.avg_score,
            row.max_score,
            row.min_score,
            row.win_rate,
            row.timeout_rate,
            row.score_loss_rate,
            row.avg_ticks,
            row.avg_collect_ticks,
            row.objective_value
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
