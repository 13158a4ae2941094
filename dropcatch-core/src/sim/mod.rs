use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CATCHER_BOTTOM_MARGIN, CATCHER_HEIGHT, CATCHER_STEP_PX, CATCHER_WIDTH,
    COUNTDOWN_PERIOD_TICKS, DROP_CAP, DROP_EDGE_MARGIN, DROP_SIZE_MIN, DROP_SIZE_SPAN,
    FALL_TICKS_EASY, FALL_TICKS_HARD, FALL_TICKS_MEDIUM, LOSS_SCORE, SCORE_BAD, SCORE_COIN,
    SCORE_DANGER, SCORE_GOOD, SPAWN_PERIOD_TICKS, TIME_LIMIT_HARD_SECONDS, TIME_LIMIT_SECONDS,
    WIN_SCORE, WORLD_HEIGHT, WORLD_HEIGHT_Q12_4, WORLD_WIDTH, WORLD_WIDTH_Q12_4,
};
use crate::error::RuleCode;
use crate::geom::{px_to_q12_4, Rect};
use crate::rng::SeededRng;
use crate::sched::Cadence;
use crate::tape::TickInput;

mod session;

use session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn time_limit_seconds(self) -> u32 {
        match self {
            Self::Hard => TIME_LIMIT_HARD_SECONDS,
            _ => TIME_LIMIT_SECONDS,
        }
    }

    pub fn fall_ticks_range(self) -> (i32, i32) {
        match self {
            Self::Easy => FALL_TICKS_EASY,
            Self::Medium => FALL_TICKS_MEDIUM,
            Self::Hard => FALL_TICKS_HARD,
        }
    }

    /// Drop-kind weights in percentage points; each row sums to 100.
    pub fn kind_weights(self) -> [(DropKind, u32); 4] {
        match self {
            Self::Easy => [
                (DropKind::Good, 65),
                (DropKind::Bad, 25),
                (DropKind::Coin, 10),
                (DropKind::Danger, 0),
            ],
            Self::Medium => [
                (DropKind::Good, 55),
                (DropKind::Bad, 25),
                (DropKind::Coin, 10),
                (DropKind::Danger, 10),
            ],
            Self::Hard => [
                (DropKind::Good, 50),
                (DropKind::Bad, 25),
                (DropKind::Coin, 10),
                (DropKind::Danger, 15),
            ],
        }
    }

    /// Map a uniform roll in [0, 100) onto a drop kind via cumulative weights.
    pub fn kind_for_roll(self, roll: u32) -> DropKind {
        debug_assert!(roll < 100);
        let weights = self.kind_weights();
        let mut cumulative = 0u32;
        for (kind, weight) in weights.iter().take(weights.len() - 1) {
            cumulative += weight;
            if roll < cumulative {
                return *kind;
            }
        }
        weights[weights.len() - 1].0
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Easy),
            1 => Some(Self::Medium),
            2 => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropKind {
    Good,
    Bad,
    Coin,
    Danger,
}

impl DropKind {
    pub fn score_delta(self) -> i32 {
        match self {
            Self::Good => SCORE_GOOD,
            Self::Bad => SCORE_BAD,
            Self::Coin => SCORE_COIN,
            Self::Danger => SCORE_DANGER,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    ScoreLoss,
    TimeUp,
}

impl Outcome {
    /// End-of-game message shown to the player. The two loss texts are
    /// distinct so the cause of a loss is visible.
    pub fn message(self) -> &'static str {
        match self {
            Self::Won => "You win!",
            Self::ScoreLoss => "Game Over — Reached -25 points",
            Self::TimeUp => "Time's up — Try again!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Idle,
    Running,
    Ended(Outcome),
}

impl Mode {
    fn phase(self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Running => Phase::Running,
            Self::Ended(_) => Phase::Ended,
        }
    }

    fn outcome(self) -> Option<Outcome> {
        match self {
            Self::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Drop {
    kind: DropKind,
    rect: Rect,
    vy: i32,
    fall_ticks: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropSnapshot {
    pub kind: DropKind,
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub vy: i32,
    pub fall_ticks: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub tick_count: u32,
    pub phase: Phase,
    pub difficulty: Difficulty,
    pub score: i32,
    pub time_left: u32,
    pub outcome: Option<Outcome>,
    pub rng_state: u32,
    pub spawn_in: u32,
    pub countdown_in: u32,
    pub catcher: Rect,
    pub drops: Vec<DropSnapshot>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub final_score: i32,
    pub outcome: Option<Outcome>,
    pub final_rng_state: u32,
    pub tick_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayCheckpoint {
    pub tick_count: u32,
    pub rng_state: u32,
    pub score: i32,
    pub time_left: u32,
    pub phase: Phase,
    pub outcome: Option<Outcome>,
    pub drops: usize,
    pub catcher_x: i32,
    pub catcher_y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayViolation {
    pub tick: u32,
    pub rule: RuleCode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TransitionState {
    tick_count: u32,
    phase: Phase,
    outcome: Option<Outcome>,
    score: i32,
    time_left: u32,
    drops: usize,
    catcher: Rect,
    spawn_in: u32,
    countdown_in: u32,
}

// A single tick can collect at most the whole live-drop set, so a legal
// per-tick score delta is a sum of at most DROP_CAP catch values.
const MAX_CATCHES_PER_TICK: usize = DROP_CAP;
const CATCH_DELTA_VALUES: [i32; 4] = [SCORE_GOOD, SCORE_BAD, SCORE_COIN, SCORE_DANGER];
const SCORE_DELTA_OFFSET: i32 = (MAX_CATCHES_PER_TICK as i32) * 10;
const SCORE_DELTA_TABLE_SIZE: usize = (2 * SCORE_DELTA_OFFSET + 1) as usize;
const LEGAL_SCORE_DELTAS: [bool; SCORE_DELTA_TABLE_SIZE] = build_legal_score_delta_table();

const fn build_legal_score_delta_table() -> [bool; SCORE_DELTA_TABLE_SIZE] {
    let mut reachable = [false; SCORE_DELTA_TABLE_SIZE];
    reachable[SCORE_DELTA_OFFSET as usize] = true;

    // Sums reachable with exactly k catches, folded into the table per round.
    let mut frontier = reachable;
    let mut catches = 0;
    while catches < MAX_CATCHES_PER_TICK {
        let mut next = [false; SCORE_DELTA_TABLE_SIZE];
        let mut index = 0;
        while index < SCORE_DELTA_TABLE_SIZE {
            if frontier[index] {
                let mut value = 0;
                while value < CATCH_DELTA_VALUES.len() {
                    let shifted = index as i32 + CATCH_DELTA_VALUES[value];
                    if shifted >= 0 && (shifted as usize) < SCORE_DELTA_TABLE_SIZE {
                        next[shifted as usize] = true;
                    }
                    value += 1;
                }
            }
            index += 1;
        }

        let mut index = 0;
        while index < SCORE_DELTA_TABLE_SIZE {
            if next[index] {
                reachable[index] = true;
            }
            index += 1;
        }

        frontier = next;
        catches += 1;
    }

    reachable
}

fn is_legal_catch_delta(delta: i32) -> bool {
    let shifted = delta + SCORE_DELTA_OFFSET;
    if shifted < 0 || shifted >= SCORE_DELTA_TABLE_SIZE as i32 {
        return false;
    }

    LEGAL_SCORE_DELTAS[shifted as usize]
}

// Vertical Q8.8 velocity that covers the play-area height in `fall_ticks`.
#[inline]
fn fall_speed_q8_8(fall_ticks: i32) -> i32 {
    (WORLD_HEIGHT * 256) / fall_ticks
}

fn home_catcher() -> Rect {
    Rect::from_px(
        (WORLD_WIDTH - CATCHER_WIDTH) / 2,
        WORLD_HEIGHT - CATCHER_HEIGHT - CATCHER_BOTTOM_MARGIN,
        CATCHER_WIDTH,
        CATCHER_HEIGHT,
    )
}

// The catcher's per-tick movement rule: a pointer teleports its center to
// the given px coordinates, otherwise arrow flags step it by a fixed amount;
// either way the result is clamped to the play area.
fn expected_catcher_rect(prev: Rect, input: TickInput) -> Rect {
    if let Some((px, py)) = input.pointer {
        return prev
            .centered_at(px_to_q12_4(px as i32), px_to_q12_4(py as i32))
            .clamped_within(WORLD_WIDTH_Q12_4, WORLD_HEIGHT_Q12_4);
    }

    let dx = CATCHER_STEP_PX * (i32::from(input.right) - i32::from(input.left));
    let dy = CATCHER_STEP_PX * (i32::from(input.down) - i32::from(input.up));
    if dx == 0 && dy == 0 {
        return prev;
    }

    Rect {
        x: prev.x + px_to_q12_4(dx),
        y: prev.y + px_to_q12_4(dy),
        ..prev
    }
    .clamped_within(WORLD_WIDTH_Q12_4, WORLD_HEIGHT_Q12_4)
}

pub fn replay(seed: u32, difficulty: Difficulty, inputs: &[TickInput]) -> ReplayResult {
    let mut session = Session::new(seed);
    session.start(difficulty);

    for input in inputs {
        session.step(*input);
    }

    session.result()
}

pub fn replay_strict(
    seed: u32,
    difficulty: Difficulty,
    inputs: &[TickInput],
) -> Result<ReplayResult, ReplayViolation> {
    let mut session = Session::new(seed);
    session.start(difficulty);
    session.validate_invariants().map_err(|rule| ReplayViolation {
        tick: session.tick_count(),
        rule,
    })?;

    for input in inputs {
        let before_step = session.transition_state();
        session.step(*input);
        let after_step = session.transition_state();

        validate_transition(&before_step, &after_step, *input).map_err(|rule| {
            ReplayViolation {
                tick: session.tick_count(),
                rule,
            }
        })?;

        session.validate_invariants().map_err(|rule| ReplayViolation {
            tick: session.tick_count(),
            rule,
        })?;
    }

    Ok(session.result())
}

pub fn replay_with_checkpoints(
    seed: u32,
    difficulty: Difficulty,
    inputs: &[TickInput],
    sample_every: u32,
) -> Vec<ReplayCheckpoint> {
    let mut session = Session::new(seed);
    session.start(difficulty);

    let stride = if sample_every == 0 { 1 } else { sample_every };
    let total_ticks = inputs.len() as u32;
    let mut checkpoints = Vec::new();
    checkpoints.push(session.checkpoint());

    for (index, input) in inputs.iter().enumerate() {
        session.step(*input);
        let tick = (index + 1) as u32;
        if tick % stride == 0 || tick == total_ticks {
            checkpoints.push(session.checkpoint());
        }
    }

    checkpoints
}

fn validate_transition(
    prev: &TransitionState,
    next: &TransitionState,
    input: TickInput,
) -> Result<(), RuleCode> {
    if next.tick_count != prev.tick_count.wrapping_add(1) {
        return Err(RuleCode::ProgressionTick);
    }

    let phase_ok = matches!(
        (prev.phase, next.phase),
        (Phase::Idle, Phase::Idle)
            | (Phase::Running, Phase::Running)
            | (Phase::Running, Phase::Ended)
            | (Phase::Ended, Phase::Ended)
    );
    if !phase_ok {
        return Err(RuleCode::ProgressionPhase);
    }
    if next.phase == Phase::Ended && next.outcome.is_none() {
        return Err(RuleCode::ProgressionPhase);
    }
    if prev.outcome.is_some() && next.outcome != prev.outcome {
        return Err(RuleCode::ProgressionPhase);
    }

    if next.catcher != expected_catcher_rect(prev.catcher, input) {
        return Err(RuleCode::CatcherPositionStep);
    }

    if prev.phase == Phase::Running {
        let delta = next.score - prev.score;
        if delta != 0 && !input.collect {
            return Err(RuleCode::ProgressionScoreDelta);
        }
        if !is_legal_catch_delta(delta) {
            return Err(RuleCode::ProgressionScoreDelta);
        }
    } else if next.score != prev.score {
        return Err(RuleCode::ProgressionScoreDelta);
    }

    if prev.phase == Phase::Running {
        // Collect runs before the cadences fire, so a score-triggered end
        // cancels the countdown even on a countdown boundary.
        let countdown_due = prev.countdown_in == 1;
        match next.outcome {
            Some(Outcome::TimeUp) => {
                if !(countdown_due && prev.time_left == 1 && next.time_left == 0) {
                    return Err(RuleCode::ProgressionCountdown);
                }
            }
            _ => {
                let expected_time = if countdown_due && next.phase == Phase::Running {
                    prev.time_left - 1
                } else {
                    prev.time_left
                };
                if next.time_left != expected_time {
                    return Err(RuleCode::ProgressionCountdown);
                }
            }
        }
    } else if next.time_left != prev.time_left {
        return Err(RuleCode::ProgressionCountdown);
    }

    if next.phase == Phase::Ended {
        if next.drops != 0 {
            return Err(RuleCode::ProgressionSpawn);
        }
    } else if next.phase == Phase::Running {
        let spawn_due = prev.spawn_in == 1;
        let max_drops = prev.drops + usize::from(spawn_due);
        if next.drops > max_drops {
            return Err(RuleCode::ProgressionSpawn);
        }
    }

    Ok(())
}

/// Incrementally driven session, for interactive adapters and bots.
pub struct LiveSession {
    session: Session,
}

impl LiveSession {
    /// A session already started at the given difficulty.
    pub fn new(seed: u32, difficulty: Difficulty) -> Self {
        let mut live = Self::idle(seed);
        live.start(difficulty);
        live
    }

    /// An idle session; `start` begins play.
    pub fn idle(seed: u32) -> Self {
        Self {
            session: Session::new(seed),
        }
    }

    /// Begin play. A no-op unless the session is idle.
    pub fn start(&mut self, difficulty: Difficulty) {
        self.session.start(difficulty);
    }

    /// Stop play and restore idle defaults, discarding any live drops.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[inline]
    pub fn step(&mut self, input: TickInput) {
        self.session.step(input);
    }

    pub fn can_step_strict(&self, input: TickInput) -> Result<(), RuleCode> {
        let before_step = self.session.transition_state();
        let mut next = self.session.clone();
        next.step(input);
        let after_step = next.transition_state();

        validate_transition(&before_step, &after_step, input)?;
        next.validate_invariants()?;
        Ok(())
    }

    pub fn step_checked(&mut self, input: TickInput) -> Result<(), RuleCode> {
        self.can_step_strict(input)?;
        self.session.step(input);
        Ok(())
    }

    #[inline]
    pub fn snapshot(&self) -> WorldSnapshot {
        self.session.world_snapshot()
    }

    #[inline]
    pub fn result(&self) -> ReplayResult {
        self.session.result()
    }

    #[inline]
    pub fn validate(&self) -> Result<(), RuleCode> {
        self.session.validate_invariants()
    }
}
