use crate::bots::{bot_fingerprint, create_bot, CatcherBot};
use anyhow::{anyhow, Context, Result};
use dropcatch_core::sim::{Difficulty, LiveSession, Outcome, Phase};
use dropcatch_core::tape::{serialize_tape, TickInput};
use dropcatch_core::verify_tape;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub seed: u32,
    pub difficulty: Difficulty,
    pub max_ticks: u32,
    pub tick_count: u32,
    pub final_score: i32,
    pub final_rng_state: u32,
    pub outcome: Option<Outcome>,
    pub won: bool,
    pub rules_digest: u32,
    pub collect_ticks: u32,
    pub steer_ticks: u32,
    pub pointer_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub inputs: Vec<TickInput>,
    pub tape: Vec<u8>,
}

pub fn outcome_label(outcome: Option<Outcome>) -> &'static str {
    match outcome {
        Some(Outcome::Won) => "won",
        Some(Outcome::ScoreLoss) => "score_loss",
        Some(Outcome::TimeUp) => "time_up",
        None => "running",
    }
}

pub fn run_bot(
    bot_id: &str,
    seed: u32,
    difficulty: Difficulty,
    max_ticks: u32,
) -> Result<RunArtifact> {
    let mut bot = create_bot(bot_id).ok_or_else(|| anyhow!("unknown bot '{bot_id}'"))?;
    run_bot_instance(bot.as_mut(), seed, difficulty, max_ticks)
}

pub fn run_bot_instance(
    bot: &mut dyn CatcherBot,
    seed: u32,
    difficulty: Difficulty,
    max_ticks: u32,
) -> Result<RunArtifact> {
    if max_ticks == 0 {
        return Err(anyhow!("max_ticks must be > 0"));
    }

    bot.reset(seed);

    let mut session = LiveSession::new(seed, difficulty);
    session
        .validate()
        .map_err(|rule| anyhow!("initial invariant failure: {rule}"))?;

    let mut snapshot = session.snapshot();
    let mut inputs = Vec::with_capacity(max_ticks as usize);

    while snapshot.tick_count < max_ticks && snapshot.phase == Phase::Running {
        let input = bot.next_input(&snapshot);
        session.step_checked(input).map_err(|rule| {
            anyhow!(
                "bot '{}' produced an illegal tick {}: {rule}",
                bot.id(),
                snapshot.tick_count + 1
            )
        })?;
        inputs.push(input);
        snapshot = session.snapshot();
    }

    let result = session.result();
    let tape = serialize_tape(
        seed,
        difficulty,
        &inputs,
        result.final_score,
        result.final_rng_state,
    );
    let journal = verify_tape(&tape, max_ticks.max(result.tick_count))
        .map_err(|err| anyhow!("generated tape failed verification: {err}"))?;

    let mut collect_ticks = 0u32;
    let mut steer_ticks = 0u32;
    let mut pointer_ticks = 0u32;
    for input in &inputs {
        if input.collect {
            collect_ticks += 1;
        }
        if input.left || input.right || input.up || input.down {
            steer_ticks += 1;
        }
        if input.pointer.is_some() {
            pointer_ticks += 1;
        }
    }

    Ok(RunArtifact {
        metrics: RunMetrics {
            bot_id: bot.id().to_string(),
            bot_fingerprint: bot_fingerprint(bot.id()).unwrap_or_else(|| "unknown".to_string()),
            seed,
            difficulty,
            max_ticks,
            tick_count: result.tick_count,
            final_score: result.final_score,
            final_rng_state: result.final_rng_state,
            outcome: result.outcome,
            won: matches!(result.outcome, Some(Outcome::Won)),
            rules_digest: journal.rules_digest,
            collect_ticks,
            steer_ticks,
            pointer_ticks,
        },
        inputs,
        tape,
    })
}

pub fn write_tape(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}
