use super::*;
use dropcatch_core::tape::crc32;

// Curated roster: a spread of steering styles and risk appetites.
pub(super) fn steer_bot_configs() -> &'static [SteerConfig] {
    &[
        SteerConfig {
            id: "skim-steady",
            description: "Pointer-follow generalist balancing value against lane hazards.",
            pointer_steering: true,
            recenter: true,
            horizon_ticks: 150.0,
            value_good: 1.0,
            value_coin: 0.6,
            risk_bad: 0.35,
            risk_danger: 0.8,
            urgency_weight: 0.6,
            travel_penalty: 0.0011,
            collect_margin: 5,
        },
        SteerConfig {
            id: "skim-coinhound",
            description: "Pointer chaser that overweights coins and tolerates bad-drop grazes.",
            pointer_steering: true,
            recenter: true,
            horizon_ticks: 180.0,
            value_good: 0.9,
            value_coin: 1.3,
            risk_bad: 0.18,
            risk_danger: 0.55,
            urgency_weight: 0.85,
            travel_penalty: 0.0008,
            collect_margin: 1,
        },
        SteerConfig {
            id: "skim-shutout",
            description: "Hazard-averse pointer bot that only collects clean multi-drop hauls.",
            pointer_steering: true,
            recenter: false,
            horizon_ticks: 120.0,
            value_good: 1.0,
            value_coin: 0.5,
            risk_bad: 0.9,
            risk_danger: 1.8,
            urgency_weight: 0.4,
            travel_penalty: 0.0016,
            collect_margin: 15,
        },
        SteerConfig {
            id: "stride-cautious",
            description: "Arrow-step walker with heavy danger weighting for medium and hard.",
            pointer_steering: false,
            recenter: true,
            horizon_ticks: 220.0,
            value_good: 1.0,
            value_coin: 0.55,
            risk_bad: 0.6,
            risk_danger: 1.4,
            urgency_weight: 0.5,
            travel_penalty: 0.0024,
            collect_margin: 10,
        },
        SteerConfig {
            id: "stride-sprinter",
            description: "Arrow-step opportunist that commits early to far intercepts.",
            pointer_steering: false,
            recenter: false,
            horizon_ticks: 260.0,
            value_good: 1.0,
            value_coin: 0.8,
            risk_bad: 0.25,
            risk_danger: 0.7,
            urgency_weight: 1.1,
            travel_penalty: 0.0006,
            collect_margin: 5,
        },
    ]
}

pub fn bot_ids() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = steer_bot_configs().iter().map(|cfg| cfg.id).collect();
    ids.push("idle-baseline");
    ids
}

pub fn describe_bots() -> Vec<(&'static str, &'static str)> {
    let mut out: Vec<(&'static str, &'static str)> = steer_bot_configs()
        .iter()
        .map(|cfg| (cfg.id, cfg.description))
        .collect();
    let idle = IdleBot;
    out.push((idle.id(), idle.description()));
    out
}

pub fn create_bot(id: &str) -> Option<Box<dyn CatcherBot>> {
    if let Some(cfg) = steer_bot_configs().iter().find(|cfg| cfg.id == id) {
        return Some(Box::new(SteerBot::new(*cfg)));
    }
    if id == "idle-baseline" {
        return Some(Box::new(IdleBot));
    }
    None
}

fn hash_json(value: &serde_json::Value) -> String {
    let encoded =
        serde_json::to_vec(value).expect("serializing bot config for fingerprint should not fail");
    let digest = crc32(&encoded);
    format!("crc32:{digest:08x}:len:{}", encoded.len())
}

pub fn bot_manifest_entries() -> Vec<BotManifestEntry> {
    let mut out = Vec::new();

    for cfg in steer_bot_configs() {
        let config = serde_json::to_value(cfg).expect("steer bot config should serialize");
        out.push(BotManifestEntry {
            id: cfg.id.to_string(),
            family: "steer".to_string(),
            description: cfg.description.to_string(),
            config_hash: hash_json(&config),
            config,
        });
    }

    let idle = IdleBot;
    let config = serde_json::json!({});
    out.push(BotManifestEntry {
        id: idle.id().to_string(),
        family: "baseline".to_string(),
        description: idle.description().to_string(),
        config_hash: hash_json(&config),
        config,
    });

    out
}

pub fn bot_fingerprint(id: &str) -> Option<String> {
    bot_manifest_entries()
        .into_iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.config_hash)
}
