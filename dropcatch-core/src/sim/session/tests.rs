use super::*;
use std::collections::HashSet;

fn assert_invariant_violation(mutator: impl FnOnce(&mut Session), expected: RuleCode) {
    let mut session = Session::new(0xDEAD_BEEF);
    session.start(Difficulty::Medium);
    mutator(&mut session);
    assert_eq!(session.validate_invariants(), Err(expected));
}

fn assert_transition_violation_at_tick(
    difficulty: Difficulty,
    inputs: &[TickInput],
    tick_to_mutate: u32,
    mutate: impl FnOnce(&mut TransitionState),
    expected: RuleCode,
) {
    let mut session = Session::new(0xDEAD_BEEF);
    session.start(difficulty);
    session
        .validate_invariants()
        .expect("initial state must be valid");

    let mut mutate = Some(mutate);
    for input in inputs {
        let before_step = session.transition_state();
        session.step(*input);
        let mut after_step = session.transition_state();

        if after_step.tick_count == tick_to_mutate {
            if let Some(mutate_once) = mutate.take() {
                mutate_once(&mut after_step);
            }
        }

        if let Err(rule) = validate_transition(&before_step, &after_step, *input) {
            assert_eq!(after_step.tick_count, tick_to_mutate);
            assert_eq!(rule, expected);
            return;
        }

        session
            .validate_invariants()
            .expect("post-step state must satisfy invariants");
    }

    panic!("expected transition violation at tick {tick_to_mutate}");
}

fn drop_on_catcher(session: &Session, kind: DropKind) -> Drop {
    let fall_ticks = session.difficulty.fall_ticks_range().0;
    let size = px_to_q12_4(DROP_SIZE_MIN);
    Drop {
        kind,
        rect: Rect {
            x: session.catcher.x,
            y: session.catcher.y,
            w: size,
            h: size,
        },
        vy: fall_speed_q8_8(fall_ticks),
        fall_ticks,
    }
}

fn valid_drop(difficulty: Difficulty) -> Drop {
    let fall_ticks = difficulty.fall_ticks_range().0;
    let size = px_to_q12_4(DROP_SIZE_MIN);
    Drop {
        kind: DropKind::Good,
        rect: Rect {
            x: px_to_q12_4(100),
            y: px_to_q12_4(50),
            w: size,
            h: size,
        },
        vy: fall_speed_q8_8(fall_ticks),
        fall_ticks,
    }
}

fn random_inputs(rng: &mut SeededRng, len: usize) -> Vec<TickInput> {
    (0..len)
        .map(|_| {
            let roll = rng.next();
            let mut input = TickInput::idle();
            input.left = (roll & 0x01) != 0;
            input.right = (roll & 0x02) != 0;
            input.collect = (roll & 0x04) != 0;
            if (roll & 0x18) == 0x18 {
                input.pointer = Some((
                    rng.next_int(WORLD_WIDTH as u32) as u16,
                    rng.next_int(WORLD_HEIGHT as u32) as u16,
                ));
            }
            input
        })
        .collect()
}

#[test]
fn kind_weights_sum_to_one_hundred_for_every_difficulty() {
    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        let total: u32 = difficulty.kind_weights().iter().map(|(_, w)| w).sum();
        assert_eq!(total, 100, "{difficulty:?}");
    }
}

#[test]
fn kind_roll_boundaries_match_the_distribution_table() {
    assert_eq!(Difficulty::Easy.kind_for_roll(0), DropKind::Good);
    assert_eq!(Difficulty::Easy.kind_for_roll(64), DropKind::Good);
    assert_eq!(Difficulty::Easy.kind_for_roll(65), DropKind::Bad);
    assert_eq!(Difficulty::Easy.kind_for_roll(89), DropKind::Bad);
    assert_eq!(Difficulty::Easy.kind_for_roll(90), DropKind::Coin);
    assert_eq!(Difficulty::Easy.kind_for_roll(99), DropKind::Coin);

    assert_eq!(Difficulty::Medium.kind_for_roll(54), DropKind::Good);
    assert_eq!(Difficulty::Medium.kind_for_roll(55), DropKind::Bad);
    assert_eq!(Difficulty::Medium.kind_for_roll(89), DropKind::Coin);
    assert_eq!(Difficulty::Medium.kind_for_roll(90), DropKind::Danger);

    assert_eq!(Difficulty::Hard.kind_for_roll(49), DropKind::Good);
    assert_eq!(Difficulty::Hard.kind_for_roll(50), DropKind::Bad);
    assert_eq!(Difficulty::Hard.kind_for_roll(84), DropKind::Coin);
    assert_eq!(Difficulty::Hard.kind_for_roll(85), DropKind::Danger);
    assert_eq!(Difficulty::Hard.kind_for_roll(99), DropKind::Danger);
}

#[test]
fn easy_sessions_never_spawn_danger_drops() {
    for roll in 0..100 {
        assert_ne!(Difficulty::Easy.kind_for_roll(roll), DropKind::Danger);
    }
}

#[test]
fn legal_score_delta_lookup_matches_bruteforce() {
    let mut reachable: HashSet<i32> = HashSet::new();
    reachable.insert(0);
    let mut frontier = vec![0i32];
    for _ in 0..MAX_CATCHES_PER_TICK {
        let mut next = Vec::new();
        for base in &frontier {
            for value in CATCH_DELTA_VALUES {
                let sum = base + value;
                if reachable.insert(sum) {
                    next.push(sum);
                }
            }
        }
        frontier = next;
    }

    for delta in -(SCORE_DELTA_OFFSET + 20)..=(SCORE_DELTA_OFFSET + 20) {
        assert_eq!(
            is_legal_catch_delta(delta),
            reachable.contains(&delta),
            "delta {delta} mismatch"
        );
    }
}

#[test]
fn same_seed_and_inputs_are_deterministic() {
    let mut rng = SeededRng::new(0xC0FF_EE00);
    let inputs = random_inputs(&mut rng, 400);
    let a = replay(0x1234_5678, Difficulty::Medium, &inputs);
    let b = replay(0x1234_5678, Difficulty::Medium, &inputs);
    assert_eq!(a, b);
}

#[test]
fn strict_replay_matches_regular_replay_on_random_inputs() {
    let mut rng = SeededRng::new(0xC0FF_EE00);

    for _ in 0..24 {
        let seed = rng.next();
        let len = (rng.next() % 600 + 1) as usize;
        let inputs = random_inputs(&mut rng, len);

        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let regular = replay(seed, difficulty, &inputs);
            let strict =
                replay_strict(seed, difficulty, &inputs).expect("strict replay should succeed");
            assert_eq!(regular, strict);
        }
    }
}

#[test]
fn live_session_result_matches_replay_for_same_inputs() {
    let seed = 0xA11C_E123;
    let mut rng = SeededRng::new(seed);
    let inputs = random_inputs(&mut rng, 250);
    let expected = replay(seed, Difficulty::Hard, &inputs);

    let mut live = LiveSession::new(seed, Difficulty::Hard);
    for input in &inputs {
        live.step(*input);
    }

    assert_eq!(live.result(), expected);
    live.validate().expect("live session must remain valid");
}

#[test]
fn live_snapshot_matches_initial_checkpoint() {
    let seed = 0xDEAD_BEEF;
    let snapshot = LiveSession::new(seed, Difficulty::Easy).snapshot();
    let checkpoints = replay_with_checkpoints(seed, Difficulty::Easy, &[], 1);
    let initial = checkpoints.first().expect("initial checkpoint exists");

    assert_eq!(snapshot.tick_count, initial.tick_count);
    assert_eq!(snapshot.score, initial.score);
    assert_eq!(snapshot.time_left, initial.time_left);
    assert_eq!(snapshot.phase, initial.phase);
    assert_eq!(snapshot.rng_state, initial.rng_state);
    assert_eq!(snapshot.drops.len(), initial.drops);
    assert_eq!(snapshot.catcher.x, initial.catcher_x);
    assert_eq!(snapshot.catcher.y, initial.catcher_y);
}

#[test]
fn step_checked_accepts_honest_play() {
    let seed = 0xBEEF_FACE;
    let mut rng = SeededRng::new(seed);
    let inputs = random_inputs(&mut rng, 300);

    let mut live = LiveSession::new(seed, Difficulty::Medium);
    for input in &inputs {
        live.step_checked(*input)
            .expect("honest ticks should pass checked stepping");
    }

    assert_eq!(live.result(), replay(seed, Difficulty::Medium, &inputs));
}

#[test]
fn start_is_a_noop_while_running() {
    let mut session = Session::new(1);
    session.start(Difficulty::Easy);
    for _ in 0..10 {
        session.step(TickInput::idle());
    }

    let before = session.checkpoint();
    session.start(Difficulty::Hard);
    assert_eq!(session.checkpoint(), before);
    assert_eq!(session.difficulty, Difficulty::Easy);
}

#[test]
fn start_sets_the_time_limit_by_difficulty() {
    let mut easy = Session::new(2);
    easy.start(Difficulty::Easy);
    assert_eq!(easy.time_left, 60);

    let mut medium = Session::new(2);
    medium.start(Difficulty::Medium);
    assert_eq!(medium.time_left, 60);

    let mut hard = Session::new(2);
    hard.start(Difficulty::Hard);
    assert_eq!(hard.time_left, 30);
}

#[test]
fn catch_deltas_match_the_score_table() {
    for (kind, delta) in [
        (DropKind::Good, 10),
        (DropKind::Bad, -5),
        (DropKind::Coin, 5),
        (DropKind::Danger, -10),
    ] {
        let mut session = Session::new(0xAA);
        session.start(Difficulty::Medium);
        let drop = drop_on_catcher(&session, kind);
        session.drops.push(drop);
        session.step(TickInput::collect());
        assert_eq!(session.score, delta, "{kind:?}");
        assert!(session.drops.is_empty());
    }
}

#[test]
fn collect_applies_every_overlapping_drop() {
    let mut session = Session::new(0xAB);
    session.start(Difficulty::Medium);
    let good = drop_on_catcher(&session, DropKind::Good);
    let bad = drop_on_catcher(&session, DropKind::Bad);
    session.drops.push(good);
    session.drops.push(bad);
    session.step(TickInput::collect());
    assert_eq!(session.score, 5);
    assert!(session.drops.is_empty());
}

#[test]
fn collect_ignores_drops_outside_the_catcher() {
    let mut session = Session::new(0xAC);
    session.start(Difficulty::Medium);
    session.drops.push(valid_drop(Difficulty::Medium));
    session.step(TickInput::collect());
    assert_eq!(session.score, 0);
    assert_eq!(session.drops.len(), 1);
}

#[test]
fn crossing_the_loss_threshold_ends_at_that_catch() {
    let mut session = Session::new(0xAD);
    session.start(Difficulty::Medium);
    session.score = -15;
    let danger = drop_on_catcher(&session, DropKind::Danger);
    session.drops.push(danger);
    session.drops.push(danger);

    session.step(TickInput::collect());

    // The second danger drop is discarded by the end transition, not applied.
    assert_eq!(session.score, -25);
    assert_eq!(session.mode, Mode::Ended(Outcome::ScoreLoss));
    assert!(session.drops.is_empty());
}

#[test]
fn crossing_the_win_threshold_ends_at_that_catch() {
    let mut session = Session::new(0xAE);
    session.start(Difficulty::Easy);
    session.score = 195;
    let good = drop_on_catcher(&session, DropKind::Good);
    let coin = drop_on_catcher(&session, DropKind::Coin);
    session.drops.push(good);
    session.drops.push(coin);

    session.step(TickInput::collect());

    assert_eq!(session.score, 205);
    assert_eq!(session.mode, Mode::Ended(Outcome::Won));
    assert!(session.drops.is_empty());
}

#[test]
fn countdown_decrements_every_sixty_ticks() {
    let mut session = Session::new(0x1234);
    session.start(Difficulty::Easy);

    for _ in 0..59 {
        session.step(TickInput::idle());
    }
    assert_eq!(session.time_left, 60);

    session.step(TickInput::idle());
    assert_eq!(session.time_left, 59);
}

#[test]
fn drops_spawn_on_the_spawn_cadence() {
    let mut session = Session::new(0x4321);
    session.start(Difficulty::Easy);

    for _ in 0..44 {
        session.step(TickInput::idle());
    }
    assert!(session.drops.is_empty());

    session.step(TickInput::idle());
    assert_eq!(session.drops.len(), 1);

    for _ in 0..45 {
        session.step(TickInput::idle());
    }
    assert_eq!(session.drops.len(), 2);
}

#[test]
fn hard_session_times_out_after_thirty_seconds() {
    let mut session = Session::new(0xFEED_F00D);
    session.start(Difficulty::Hard);
    assert_eq!(session.time_left, 30);

    for _ in 0..1800 {
        session.step(TickInput::idle());
    }

    assert_eq!(session.mode, Mode::Ended(Outcome::TimeUp));
    assert_eq!(session.time_left, 0);
    assert!(session.drops.is_empty());
    assert!(!session.spawn_cadence.is_armed());
    assert!(!session.countdown.is_armed());

    // Ticks keep counting after the end, but nothing else moves.
    let ended_tick = session.tick_count;
    let ended_score = session.score;
    for _ in 0..120 {
        session.step(TickInput::collect());
    }
    assert_eq!(session.score, ended_score);
    assert_eq!(session.time_left, 0);
    assert!(session.drops.is_empty());
    assert_eq!(session.tick_count, ended_tick + 120);
}

#[test]
fn scoring_sequence_then_timeout_keeps_the_score() {
    let mut session = Session::new(0xABCD);
    session.start(Difficulty::Easy);
    assert_eq!((session.score, session.time_left), (0, 60));

    for _ in 0..3 {
        let good = drop_on_catcher(&session, DropKind::Good);
        session.drops.push(good);
    }
    session.step(TickInput::collect());
    assert_eq!(session.score, 30);

    let bad = drop_on_catcher(&session, DropKind::Bad);
    session.drops.push(bad);
    session.step(TickInput::collect());
    assert_eq!(session.score, 25);

    session.time_left = 1;
    while matches!(session.mode, Mode::Running) {
        session.step(TickInput::idle());
    }

    assert_eq!(session.mode, Mode::Ended(Outcome::TimeUp));
    assert_eq!(session.score, 25);
}

#[test]
fn loss_messages_distinguish_score_from_timeout() {
    assert!(Outcome::TimeUp.message().starts_with("Time's up"));
    assert!(Outcome::ScoreLoss.message().contains("-25"));
    assert_ne!(Outcome::TimeUp.message(), Outcome::ScoreLoss.message());
    assert_ne!(Outcome::Won.message(), Outcome::TimeUp.message());
}

#[test]
fn reset_restores_idle_defaults_from_any_phase() {
    let mut session = Session::new(7);
    session.start(Difficulty::Hard);
    for _ in 0..200 {
        session.step(TickInput::idle());
    }
    assert!(!session.drops.is_empty());

    session.reset();
    assert_eq!(session.mode, Mode::Idle);
    assert_eq!(session.score, 0);
    assert_eq!(session.time_left, TIME_LIMIT_SECONDS);
    assert!(session.drops.is_empty());
    assert!(!session.spawn_cadence.is_armed());
    assert!(!session.countdown.is_armed());
    session
        .validate_invariants()
        .expect("reset session must be valid");

    session.start(Difficulty::Hard);
    for _ in 0..1800 {
        session.step(TickInput::idle());
    }
    assert_eq!(session.mode, Mode::Ended(Outcome::TimeUp));

    session.reset();
    assert_eq!(session.mode, Mode::Idle);
    assert_eq!(session.score, 0);
    assert_eq!(session.time_left, TIME_LIMIT_SECONDS);
    assert!(session.drops.is_empty());
    session
        .validate_invariants()
        .expect("reset session must be valid");
}

#[test]
fn hard_fall_durations_stay_in_range() {
    let mut session = Session::new(0x600D_5EED);
    session.start(Difficulty::Hard);
    let (min_fall, max_fall) = Difficulty::Hard.fall_ticks_range();

    let mut most_seen = 0;
    for _ in 0..900 {
        session.step(TickInput::idle());
        for drop in &session.drops {
            assert!(drop.fall_ticks >= min_fall && drop.fall_ticks < max_fall);
        }
        most_seen = most_seen.max(session.drops.len());
    }
    assert!(most_seen >= 2);
}

#[test]
fn catcher_movement_follows_inputs_and_clamps() {
    let mut session = Session::new(3);
    session.start(Difficulty::Easy);

    let x0 = session.catcher.x;
    session.step(TickInput {
        right: true,
        ..TickInput::idle()
    });
    assert_eq!(session.catcher.x, x0 + px_to_q12_4(CATCHER_STEP_PX));

    session.step(TickInput::pointer_to(0, 0));
    assert_eq!((session.catcher.x, session.catcher.y), (0, 0));

    session.step(TickInput::pointer_to(5000, 5000));
    assert!(session.catcher.in_play_area());
    assert_eq!(session.catcher.right(), WORLD_WIDTH_Q12_4);
    assert_eq!(session.catcher.bottom(), WORLD_HEIGHT_Q12_4);
}

#[test]
fn catcher_can_move_while_idle() {
    let mut session = Session::new(3);
    let x0 = session.catcher.x;
    session.step(TickInput {
        left: true,
        ..TickInput::idle()
    });
    assert_eq!(session.catcher.x, x0 - px_to_q12_4(CATCHER_STEP_PX));
    assert_eq!(session.mode, Mode::Idle);
    session
        .validate_invariants()
        .expect("idle session must stay valid");
}

#[test]
fn invariant_checks_report_expected_rule_codes() {
    assert_invariant_violation(
        |session| session.score = WIN_SCORE,
        RuleCode::PhaseScoreConsistency,
    );
    assert_invariant_violation(
        |session| session.score = LOSS_SCORE,
        RuleCode::PhaseScoreConsistency,
    );
    assert_invariant_violation(
        |session| session.time_left = 0,
        RuleCode::TimeRemainingRange,
    );
    assert_invariant_violation(
        |session| session.time_left = 61,
        RuleCode::TimeRemainingRange,
    );
    assert_invariant_violation(
        |session| {
            for _ in 0..(DROP_CAP + 1) {
                session.drops.push(valid_drop(Difficulty::Medium));
            }
        },
        RuleCode::DropCount,
    );
    assert_invariant_violation(
        |session| {
            let mut drop = valid_drop(Difficulty::Medium);
            drop.vy += 1;
            session.drops.push(drop);
        },
        RuleCode::DropState,
    );
    assert_invariant_violation(
        |session| {
            let mut drop = valid_drop(Difficulty::Medium);
            drop.fall_ticks = 300;
            drop.vy = fall_speed_q8_8(300);
            session.drops.push(drop);
        },
        RuleCode::DropState,
    );
    assert_invariant_violation(
        |session| {
            let mut drop = valid_drop(Difficulty::Medium);
            drop.rect.x = 0;
            session.drops.push(drop);
        },
        RuleCode::DropState,
    );
    assert_invariant_violation(
        |session| session.catcher.x = -16,
        RuleCode::CatcherBounds,
    );
    assert_invariant_violation(
        |session| session.spawn_cadence.cancel(),
        RuleCode::CadenceState,
    );
    assert_invariant_violation(
        |session| {
            session.mode = Mode::Ended(Outcome::TimeUp);
            session.time_left = 5;
        },
        RuleCode::TimeRemainingRange,
    );
}

#[test]
fn strict_replay_detects_forced_catcher_teleport() {
    assert_transition_violation_at_tick(
        Difficulty::Easy,
        &[TickInput::idle()],
        1,
        |state| {
            state.catcher.x += px_to_q12_4(32);
        },
        RuleCode::CatcherPositionStep,
    );
}

#[test]
fn strict_replay_detects_score_change_without_collect() {
    assert_transition_violation_at_tick(
        Difficulty::Easy,
        &[TickInput::idle()],
        1,
        |state| {
            state.score += 10;
        },
        RuleCode::ProgressionScoreDelta,
    );
}

#[test]
fn strict_replay_detects_illegal_score_increment() {
    assert_transition_violation_at_tick(
        Difficulty::Easy,
        &[TickInput::collect()],
        1,
        |state| {
            state.score += 3;
        },
        RuleCode::ProgressionScoreDelta,
    );
}

#[test]
fn strict_replay_detects_forced_tick_skip() {
    assert_transition_violation_at_tick(
        Difficulty::Easy,
        &[TickInput::idle()],
        1,
        |state| {
            state.tick_count += 1;
        },
        RuleCode::ProgressionTick,
    );
}

#[test]
fn strict_replay_detects_off_cadence_countdown() {
    assert_transition_violation_at_tick(
        Difficulty::Easy,
        &[TickInput::idle()],
        1,
        |state| {
            state.time_left -= 1;
        },
        RuleCode::ProgressionCountdown,
    );
}

#[test]
fn strict_replay_detects_off_cadence_spawn() {
    assert_transition_violation_at_tick(
        Difficulty::Easy,
        &[TickInput::idle()],
        1,
        |state| {
            state.drops += 3;
        },
        RuleCode::ProgressionSpawn,
    );
}

#[test]
fn strict_replay_detects_forced_phase_regression() {
    assert_transition_violation_at_tick(
        Difficulty::Easy,
        &[TickInput::idle()],
        1,
        |state| {
            state.phase = Phase::Idle;
        },
        RuleCode::ProgressionPhase,
    );
}
