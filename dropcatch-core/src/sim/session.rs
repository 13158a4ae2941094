use super::*;

#[derive(Clone)]
pub(super) struct Session {
    mode: Mode,
    difficulty: Difficulty,
    score: i32,
    time_left: u32,
    tick_count: u32,
    catcher: Rect,
    drops: Vec<Drop>,
    spawn_cadence: Cadence,
    countdown: Cadence,
    rng: SeededRng,
}

impl Session {
    pub(super) fn new(seed: u32) -> Self {
        Self {
            mode: Mode::Idle,
            difficulty: Difficulty::Easy,
            score: 0,
            time_left: TIME_LIMIT_SECONDS,
            tick_count: 0,
            catcher: home_catcher(),
            drops: Vec::with_capacity(DROP_CAP),
            spawn_cadence: Cadence::idle(SPAWN_PERIOD_TICKS),
            countdown: Cadence::idle(COUNTDOWN_PERIOD_TICKS),
            rng: SeededRng::new(seed),
        }
    }

    pub(super) fn start(&mut self, difficulty: Difficulty) {
        if !matches!(self.mode, Mode::Idle) {
            return;
        }

        self.difficulty = difficulty;
        self.score = 0;
        self.time_left = difficulty.time_limit_seconds();
        self.drops.clear();
        self.catcher = home_catcher();
        self.spawn_cadence.arm();
        self.countdown.arm();
        self.mode = Mode::Running;
    }

    pub(super) fn reset(&mut self) {
        self.spawn_cadence.cancel();
        self.countdown.cancel();
        self.drops.clear();
        self.score = 0;
        self.time_left = TIME_LIMIT_SECONDS;
        self.catcher = home_catcher();
        self.mode = Mode::Idle;
    }

    pub(super) fn step(&mut self, input: TickInput) {
        self.tick_count += 1;
        self.catcher = expected_catcher_rect(self.catcher, input);

        if !matches!(self.mode, Mode::Running) {
            return;
        }

        self.advance_drops();
        if input.collect {
            self.collect_overlapping();
        }

        // A collect that crossed an end threshold cancelled both cadences,
        // so neither effect can fire after the transition.
        if self.spawn_cadence.fire() {
            self.spawn_drop();
        }
        if self.countdown.fire() {
            self.tick_second();
        }
    }

    fn advance_drops(&mut self) {
        for drop in &mut self.drops {
            drop.rect.y += drop.vy >> 4;
        }
        self.drops.retain(|drop| drop.rect.y <= WORLD_HEIGHT_Q12_4);
    }

    fn collect_overlapping(&mut self) {
        let mut index = 0;
        while index < self.drops.len() {
            if self.drops[index].rect.overlaps(&self.catcher) {
                let kind = self.drops[index].kind;
                self.drops.remove(index);
                self.apply_catch(kind);
            } else {
                index += 1;
            }
        }
    }

    fn apply_catch(&mut self, kind: DropKind) {
        self.score += kind.score_delta();

        if self.score <= LOSS_SCORE {
            self.end(Outcome::ScoreLoss);
        } else if self.score >= WIN_SCORE {
            self.end(Outcome::Won);
        }
    }

    fn tick_second(&mut self) {
        self.time_left -= 1;
        if self.time_left == 0 {
            self.end(Outcome::TimeUp);
        }
    }

    fn end(&mut self, outcome: Outcome) {
        if !matches!(self.mode, Mode::Running) {
            return;
        }

        self.spawn_cadence.cancel();
        self.countdown.cancel();
        self.drops.clear();
        self.mode = Mode::Ended(outcome);
    }

    fn spawn_drop(&mut self) {
        if self.drops.len() >= DROP_CAP {
            return;
        }

        let size_px = DROP_SIZE_MIN + self.rng.next_range(0, DROP_SIZE_SPAN);
        let x_px = DROP_EDGE_MARGIN
            + self
                .rng
                .next_range(0, WORLD_WIDTH - size_px - 2 * DROP_EDGE_MARGIN);
        let (min_ticks, max_ticks) = self.difficulty.fall_ticks_range();
        let fall_ticks = self.rng.next_range(min_ticks, max_ticks);
        let kind = self.difficulty.kind_for_roll(self.rng.next_percent());

        let size = px_to_q12_4(size_px);
        self.drops.push(Drop {
            kind,
            rect: Rect {
                x: px_to_q12_4(x_px),
                y: -size,
                w: size,
                h: size,
            },
            vy: fall_speed_q8_8(fall_ticks),
            fall_ticks,
        });
    }

    #[inline]
    pub(super) fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub(super) fn result(&self) -> ReplayResult {
        ReplayResult {
            final_score: self.score,
            outcome: self.mode.outcome(),
            final_rng_state: self.rng.state(),
            tick_count: self.tick_count,
        }
    }

    pub(super) fn checkpoint(&self) -> ReplayCheckpoint {
        ReplayCheckpoint {
            tick_count: self.tick_count,
            rng_state: self.rng.state(),
            score: self.score,
            time_left: self.time_left,
            phase: self.mode.phase(),
            outcome: self.mode.outcome(),
            drops: self.drops.len(),
            catcher_x: self.catcher.x,
            catcher_y: self.catcher.y,
        }
    }

    pub(super) fn world_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick_count: self.tick_count,
            phase: self.mode.phase(),
            difficulty: self.difficulty,
            score: self.score,
            time_left: self.time_left,
            outcome: self.mode.outcome(),
            rng_state: self.rng.state(),
            spawn_in: cadence_remaining(&self.spawn_cadence),
            countdown_in: cadence_remaining(&self.countdown),
            catcher: self.catcher,
            drops: self
                .drops
                .iter()
                .map(|drop| DropSnapshot {
                    kind: drop.kind,
                    x: drop.rect.x,
                    y: drop.rect.y,
                    size: drop.rect.w,
                    vy: drop.vy,
                    fall_ticks: drop.fall_ticks,
                })
                .collect(),
        }
    }

    pub(super) fn transition_state(&self) -> TransitionState {
        TransitionState {
            tick_count: self.tick_count,
            phase: self.mode.phase(),
            outcome: self.mode.outcome(),
            score: self.score,
            time_left: self.time_left,
            drops: self.drops.len(),
            catcher: self.catcher,
            spawn_in: cadence_remaining(&self.spawn_cadence),
            countdown_in: cadence_remaining(&self.countdown),
        }
    }

    pub(super) fn validate_invariants(&self) -> Result<(), RuleCode> {
        let score_consistent = match self.mode {
            Mode::Idle => self.score == 0,
            Mode::Running => self.score > LOSS_SCORE && self.score < WIN_SCORE,
            Mode::Ended(Outcome::Won) => self.score >= WIN_SCORE,
            Mode::Ended(Outcome::ScoreLoss) => self.score <= LOSS_SCORE,
            Mode::Ended(Outcome::TimeUp) => self.score > LOSS_SCORE && self.score < WIN_SCORE,
        };
        if !score_consistent {
            return Err(RuleCode::PhaseScoreConsistency);
        }

        let time_consistent = match self.mode {
            Mode::Idle => self.time_left == TIME_LIMIT_SECONDS,
            Mode::Running => {
                self.time_left >= 1 && self.time_left <= self.difficulty.time_limit_seconds()
            }
            Mode::Ended(Outcome::TimeUp) => self.time_left == 0,
            Mode::Ended(_) => self.time_left <= self.difficulty.time_limit_seconds(),
        };
        if !time_consistent {
            return Err(RuleCode::TimeRemainingRange);
        }

        if self.drops.len() > DROP_CAP {
            return Err(RuleCode::DropCount);
        }
        if !matches!(self.mode, Mode::Running) && !self.drops.is_empty() {
            return Err(RuleCode::DropCount);
        }

        let (min_fall, max_fall) = self.difficulty.fall_ticks_range();
        let min_size = px_to_q12_4(DROP_SIZE_MIN);
        let max_size = px_to_q12_4(DROP_SIZE_MIN + DROP_SIZE_SPAN);
        let margin = px_to_q12_4(DROP_EDGE_MARGIN);
        for drop in &self.drops {
            let rect = drop.rect;
            let geometry_ok = rect.w == rect.h
                && rect.w >= min_size
                && rect.w < max_size
                && rect.x >= margin
                && rect.right() <= WORLD_WIDTH_Q12_4 - margin
                && rect.y >= -rect.h
                && rect.y <= WORLD_HEIGHT_Q12_4;
            let motion_ok = drop.fall_ticks >= min_fall
                && drop.fall_ticks < max_fall
                && drop.vy == fall_speed_q8_8(drop.fall_ticks);
            if !geometry_ok || !motion_ok {
                return Err(RuleCode::DropState);
            }
        }

        if !self.catcher.in_play_area() {
            return Err(RuleCode::CatcherBounds);
        }

        let cadences_ok = if matches!(self.mode, Mode::Running) {
            self.spawn_cadence.is_armed()
                && self.countdown.is_armed()
                && self.spawn_cadence.remaining() >= 1
                && self.spawn_cadence.remaining() <= self.spawn_cadence.period()
                && self.countdown.remaining() >= 1
                && self.countdown.remaining() <= self.countdown.period()
        } else {
            !self.spawn_cadence.is_armed() && !self.countdown.is_armed()
        };
        if !cadences_ok {
            return Err(RuleCode::CadenceState);
        }

        Ok(())
    }
}

#[inline]
fn cadence_remaining(cadence: &Cadence) -> u32 {
    if cadence.is_armed() {
        cadence.remaining()
    } else {
        0
    }
}

#[cfg(test)]
mod tests;
