use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dropcatch_autopilot::benchmark::{resolve_bots, run_benchmark, BenchmarkConfig, Objective};
use dropcatch_autopilot::bots::{bot_ids, bot_manifest_entries, create_bot, describe_bots};
use dropcatch_autopilot::runner::{outcome_label, run_bot, write_tape};
use dropcatch_autopilot::util::{parse_seed, parse_seed_csv, parse_seed_file, seed_to_hex};
use dropcatch_core::constants::MAX_TICKS_DEFAULT;
use dropcatch_core::sim::Difficulty;
use dropcatch_core::tape::parse_tape;
use dropcatch_core::verify_tape;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "dropcatch-autopilot")]
#[command(about = "Headless lab for deterministic drop-catch tape generation and benchmarking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available bots
    ListBots,
    /// Export the full bot manifest (including config fingerprints)
    RosterManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate a single verifiable tape
    Generate {
        #[arg(long)]
        bot: String,
        #[arg(long)]
        seed: String,
        #[arg(long, value_enum, default_value_t = CliDifficulty::Easy)]
        difficulty: CliDifficulty,
        #[arg(long, default_value_t = MAX_TICKS_DEFAULT)]
        max_ticks: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Verify an existing tape against the current game rules
    VerifyTape {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = MAX_TICKS_DEFAULT)]
        max_ticks: u32,
    },
    /// Run a multi-seed benchmark across one or more bots
    Benchmark {
        #[arg(long)]
        bots: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long, value_enum, default_value_t = CliDifficulty::Easy)]
        difficulty: CliDifficulty,
        #[arg(long, default_value_t = MAX_TICKS_DEFAULT)]
        max_ticks: u32,
        #[arg(long, value_enum, default_value_t = CliObjective::Score)]
        objective: CliObjective,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 4)]
        save_top: usize,
        #[arg(long)]
        jobs: Option<usize>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliDifficulty {
    Easy,
    Medium,
    Hard,
}

impl From<CliDifficulty> for Difficulty {
    fn from(value: CliDifficulty) -> Self {
        match value {
            CliDifficulty::Easy => Difficulty::Easy,
            CliDifficulty::Medium => Difficulty::Medium,
            CliDifficulty::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliObjective {
    Score,
    Wins,
    Hybrid,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::Score => Objective::Score,
            CliObjective::Wins => Objective::Wins,
            CliObjective::Hybrid => Objective::Hybrid,
        }
    }
}

fn main() -> Result<()> {
    let Cli { command } = Cli::parse();

    match command {
        Commands::ListBots => {
            for (id, description) in describe_bots() {
                println!("{id:20} {description}");
            }
        }
        Commands::RosterManifest { output } => {
            let manifest = bot_manifest_entries();
            let encoded = serde_json::to_vec_pretty(&manifest)?;
            if let Some(path) = output {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, encoded)?;
                println!("wrote={}", path.display());
                println!("bots={}", manifest.len());
            } else {
                println!("{}", String::from_utf8_lossy(&encoded));
            }
        }
        Commands::Generate {
            bot,
            seed,
            difficulty,
            max_ticks,
            output,
        } => {
            if create_bot(&bot).is_none() {
                let available = bot_ids().join(", ");
                return Err(anyhow!("unknown bot '{bot}'. available: {available}"));
            }
            let seed = parse_seed(&seed)?;
            let difficulty: Difficulty = difficulty.into();
            let artifact = run_bot(&bot, seed, difficulty, max_ticks)?;
            let output_path = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "tapes/{}-{}-{}-score{}-ticks{}.tape",
                    bot,
                    difficulty.as_str(),
                    seed_to_hex(seed).replace("0x", "seed"),
                    artifact.metrics.final_score,
                    artifact.metrics.tick_count
                ))
            });
            write_tape(&output_path, &artifact.tape)?;

            println!("bot={}", artifact.metrics.bot_id);
            println!("bot_fingerprint={}", artifact.metrics.bot_fingerprint);
            println!("seed={}", seed_to_hex(seed));
            println!("difficulty={}", difficulty.as_str());
            println!("ticks={}", artifact.metrics.tick_count);
            println!("score={}", artifact.metrics.final_score);
            println!("outcome={}", outcome_label(artifact.metrics.outcome));
            if let Some(outcome) = artifact.metrics.outcome {
                println!("message={}", outcome.message());
            }
            println!("rng={:#010x}", artifact.metrics.final_rng_state);
            println!("rules_digest={:#010x}", artifact.metrics.rules_digest);
            println!("output={}", output_path.display());
        }
        Commands::VerifyTape { input, max_ticks } => {
            let bytes = fs::read(&input)?;
            let tape = parse_tape(&bytes, max_ticks)?;
            let journal = verify_tape(&bytes, max_ticks)?;
            println!("input={}", input.display());
            println!("seed={}", seed_to_hex(tape.header.seed));
            println!("difficulty={}", tape.header.difficulty.as_str());
            println!("tick_count={}", tape.header.tick_count);
            println!("final_score={}", tape.footer.final_score);
            println!("final_rng_state={:#010x}", tape.footer.final_rng_state);
            println!("outcome={}", outcome_label(journal.outcome));
            if let Some(outcome) = journal.outcome {
                println!("message={}", outcome.message());
            }
            println!("rules_digest={:#010x}", journal.rules_digest);
        }
        Commands::Benchmark {
            bots,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            difficulty,
            max_ticks,
            objective,
            out_dir,
            save_top,
            jobs,
        } => {
            let bots = resolve_bots(bots.as_deref())?;
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let difficulty: Difficulty = difficulty.into();
            let objective: Objective = objective.into();

            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "benchmarks/{}-{}-{}",
                    objective.as_str(),
                    difficulty.as_str(),
                    timestamp_suffix()
                ))
            });

            let report = run_benchmark(BenchmarkConfig {
                bots,
                seeds,
                difficulty,
                max_ticks,
                objective,
                out_dir: out_dir.clone(),
                save_top,
                jobs,
            })?;

            println!("objective={}", objective.as_str());
            println!("difficulty={}", difficulty.as_str());
            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("top bots:");
            for (index, bot) in report.bot_rankings.iter().take(5).enumerate() {
                println!(
                    "  {}. {}  objective={:.2} avg_score={:.1} win_rate={:.0}% timeout={:.0}% avg_ticks={:.1} avg_collects={:.1}",
                    index + 1,
                    bot.bot_id,
                    bot.objective_value,
                    bot.avg_score,
                    bot.win_rate * 100.0,
                    bot.timeout_rate * 100.0,
                    bot.avg_ticks,
                    bot.avg_collect_ticks,
                );
            }

            println!("saved tapes:");
            for tape in report.saved_tapes.iter().take(10) {
                println!(
                    "  [{} #{:02}] {} {} score={} ticks={} won={}",
                    tape.metric, tape.rank, tape.bot_id, tape.seed_hex, tape.score, tape.ticks,
                    tape.won,
                );
            }
        }
    }

    Ok(())
}

fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }

    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }

    let start = if let Some(start) = seed_start {
        parse_seed(start)?
    } else {
        0xD20C_0001
    };

    let mut out = Vec::with_capacity(seed_count as usize);
    let mut cur = start;
    for _ in 0..seed_count {
        out.push(cur);
        cur = cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    Ok(out)
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
