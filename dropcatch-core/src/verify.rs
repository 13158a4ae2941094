use serde::{Deserialize, Serialize};

use crate::constants::RULES_DIGEST;
use crate::error::VerifyError;
use crate::sim::{replay_strict, Difficulty, Outcome, ReplayResult, ReplayViolation};
use crate::tape::{parse_tape, TickInput};

/// The verified facts about a session, derived by replaying its tape and
/// cross-checking the claims embedded in the footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionJournal {
    pub seed: u32,
    pub difficulty: Difficulty,
    pub tick_count: u32,
    pub final_score: i32,
    pub outcome: Option<Outcome>,
    pub tape_checksum: u32,
    pub rules_digest: u32,
}

pub fn verify_tape(bytes: &[u8], max_ticks: u32) -> Result<SessionJournal, VerifyError> {
    verify_tape_with_replay(bytes, max_ticks, replay_strict)
}

fn verify_tape_with_replay<F>(
    bytes: &[u8],
    max_ticks: u32,
    replay_fn: F,
) -> Result<SessionJournal, VerifyError>
where
    F: FnOnce(u32, Difficulty, &[TickInput]) -> Result<ReplayResult, ReplayViolation>,
{
    let tape = parse_tape(bytes, max_ticks)?;
    let inputs = tape.inputs();
    let replay_result = replay_fn(tape.header.seed, tape.header.difficulty, &inputs).map_err(
        |violation| VerifyError::RuleViolation {
            tick: violation.tick,
            rule: violation.rule,
        },
    )?;

    if replay_result.tick_count != tape.header.tick_count {
        return Err(VerifyError::TickCountMismatch {
            claimed: tape.header.tick_count,
            computed: replay_result.tick_count,
        });
    }

    if replay_result.final_score != tape.footer.final_score {
        return Err(VerifyError::ScoreMismatch {
            claimed: tape.footer.final_score,
            computed: replay_result.final_score,
        });
    }

    if replay_result.final_rng_state != tape.footer.final_rng_state {
        return Err(VerifyError::RngMismatch {
            claimed: tape.footer.final_rng_state,
            computed: replay_result.final_rng_state,
        });
    }

    Ok(SessionJournal {
        seed: tape.header.seed,
        difficulty: tape.header.difficulty,
        tick_count: tape.header.tick_count,
        final_score: replay_result.final_score,
        outcome: replay_result.outcome,
        tape_checksum: tape.footer.checksum,
        rules_digest: RULES_DIGEST,
    })
}
