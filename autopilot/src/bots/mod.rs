use dropcatch_core::constants::{
    CATCHER_BOTTOM_MARGIN, CATCHER_HEIGHT, CATCHER_STEP_PX, CATCHER_WIDTH, WORLD_HEIGHT,
    WORLD_WIDTH,
};
use dropcatch_core::geom::{q12_4_to_px, Rect};
use dropcatch_core::sim::{DropKind, Phase, WorldSnapshot};
use dropcatch_core::tape::TickInput;
use serde::Serialize;

mod roster;

pub use roster::{bot_fingerprint, bot_ids, bot_manifest_entries, create_bot, describe_bots};

pub trait CatcherBot {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn reset(&mut self, seed: u32);
    fn next_input(&mut self, world: &WorldSnapshot) -> TickInput;
}

#[derive(Clone, Debug, Serialize)]
pub struct BotManifestEntry {
    pub id: String,
    pub family: String,
    pub description: String,
    pub config_hash: String,
    pub config: serde_json::Value,
}

#[derive(Clone, Copy, Serialize)]
struct SteerConfig {
    id: &'static str,
    description: &'static str,
    // Steering: pointer bots teleport under the target, stride bots walk
    // there in arrow-key steps.
    pointer_steering: bool,
    recenter: bool,
    horizon_ticks: f64,
    value_good: f64,
    value_coin: f64,
    risk_bad: f64,
    risk_danger: f64,
    urgency_weight: f64,
    travel_penalty: f64,
    // Minimum net score of the overlapping set before collecting.
    collect_margin: i32,
}

struct SteerBot {
    cfg: SteerConfig,
}

impl SteerBot {
    fn new(cfg: SteerConfig) -> Self {
        Self { cfg }
    }

    // Penalty for steering toward `cx` while hazardous drops share the lane.
    fn hazard_near(&self, world: &WorldSnapshot, cx: i32) -> f64 {
        let reach = CATCHER_WIDTH as f64;
        let mut hazard = 0.0;
        for drop in &world.drops {
            let risk = match drop.kind {
                DropKind::Bad => self.cfg.risk_bad,
                DropKind::Danger => self.cfg.risk_danger,
                DropKind::Good | DropKind::Coin => continue,
            };
            let lateral = (q12_4_to_px(drop.x + drop.size / 2) - cx).abs() as f64;
            if lateral < reach {
                hazard += risk * (1.0 - lateral / reach);
            }
        }
        hazard
    }

    /// Pick the px center of the most valuable reachable drop, if any is
    /// worth intercepting at all.
    fn target_center_x(&self, world: &WorldSnapshot) -> Option<i32> {
        let catcher = world.catcher;
        let catcher_cx = q12_4_to_px(catcher.center_x());
        let mut best: Option<(f64, i32)> = None;

        for drop in &world.drops {
            let value = match drop.kind {
                DropKind::Good => self.cfg.value_good,
                DropKind::Coin => self.cfg.value_coin,
                DropKind::Bad | DropKind::Danger => continue,
            };
            if drop.y > catcher.bottom() {
                continue; // already past the catcher
            }
            let step = drop.vy >> 4;
            if step <= 0 {
                continue;
            }
            let gap = catcher.y - (drop.y + drop.size);
            let eta = if gap > 0 { (gap / step) as f64 } else { 0.0 };
            if eta > self.cfg.horizon_ticks {
                continue;
            }

            let drop_cx = q12_4_to_px(drop.x + drop.size / 2);
            let travel = (drop_cx - catcher_cx).abs() as f64;
            let urgency = 1.0 + self.cfg.urgency_weight * (1.0 - eta / self.cfg.horizon_ticks);
            let utility = value * urgency
                - self.cfg.travel_penalty * travel
                - self.hazard_near(world, drop_cx);

            if utility > 0.0 && best.map_or(true, |(top, _)| utility > top) {
                best = Some((utility, drop_cx));
            }
        }

        best.map(|(_, cx)| cx)
    }
}

impl CatcherBot for SteerBot {
    fn id(&self) -> &'static str {
        self.cfg.id
    }

    fn description(&self) -> &'static str {
        self.cfg.description
    }

    fn reset(&mut self, _seed: u32) {}

    fn next_input(&mut self, world: &WorldSnapshot) -> TickInput {
        if world.phase != Phase::Running {
            return TickInput::idle();
        }

        let (net, any_overlap) = overlap_net(world);
        let collect = any_overlap && net >= self.cfg.collect_margin;

        let catcher_cx = q12_4_to_px(world.catcher.center_x());
        let target_cx = self.target_center_x(world).unwrap_or(if self.cfg.recenter {
            WORLD_WIDTH / 2
        } else {
            catcher_cx
        });

        if self.cfg.pointer_steering {
            if target_cx != catcher_cx {
                let home_y = WORLD_HEIGHT - CATCHER_HEIGHT / 2 - CATCHER_BOTTOM_MARGIN;
                return TickInput {
                    collect,
                    pointer: Some((target_cx.clamp(0, WORLD_WIDTH - 1) as u16, home_y as u16)),
                    ..TickInput::idle()
                };
            }
            return TickInput {
                collect,
                ..TickInput::idle()
            };
        }

        let mut input = TickInput {
            collect,
            ..TickInput::idle()
        };
        let dx = target_cx - catcher_cx;
        if dx > CATCHER_STEP_PX / 2 {
            input.right = true;
        } else if dx < -(CATCHER_STEP_PX / 2) {
            input.left = true;
        }
        input
    }
}

// Net score of the drops currently overlapping the catcher.
fn overlap_net(world: &WorldSnapshot) -> (i32, bool) {
    let mut net = 0;
    let mut any = false;
    for drop in &world.drops {
        let rect = Rect {
            x: drop.x,
            y: drop.y,
            w: drop.size,
            h: drop.size,
        };
        if rect.overlaps(&world.catcher) {
            any = true;
            net += drop.kind.score_delta();
        }
    }
    (net, any)
}

struct IdleBot;

impl CatcherBot for IdleBot {
    fn id(&self) -> &'static str {
        "idle-baseline"
    }

    fn description(&self) -> &'static str {
        "Never moves, never collects; the drift-through baseline."
    }

    fn reset(&mut self, _seed: u32) {}

    fn next_input(&mut self, _world: &WorldSnapshot) -> TickInput {
        TickInput::idle()
    }
}
