//! Session constants.
//!
//! The original game runs on wall-clock interval timers; here everything is
//! expressed in ticks at a fixed 60 ticks per second, so cadences and fall
//! durations are exact integers.

// Tick rate
pub const TICKS_PER_SECOND: u32 = 60;

// Cadence periods (ticks)
pub const SPAWN_PERIOD_TICKS: u32 = 45; // 750ms
pub const COUNTDOWN_PERIOD_TICKS: u32 = TICKS_PER_SECOND; // 1s

// Session time limits (seconds)
pub const TIME_LIMIT_SECONDS: u32 = 60;
pub const TIME_LIMIT_HARD_SECONDS: u32 = 30;

// Play area (px)
pub const WORLD_WIDTH: i32 = 960;
pub const WORLD_HEIGHT: i32 = 720;

// Q12.4 play area (16 units per px)
pub const WORLD_WIDTH_Q12_4: i32 = WORLD_WIDTH << 4;
pub const WORLD_HEIGHT_Q12_4: i32 = WORLD_HEIGHT << 4;

// Catcher (px)
pub const CATCHER_WIDTH: i32 = 160;
pub const CATCHER_HEIGHT: i32 = 110;
pub const CATCHER_BOTTOM_MARGIN: i32 = 12;
pub const CATCHER_STEP_PX: i32 = 20; // arrow-key step

// Drops (px). Side length is drawn from [DROP_SIZE_MIN, DROP_SIZE_MIN + DROP_SIZE_SPAN).
pub const DROP_SIZE_MIN: i32 = 36;
pub const DROP_SIZE_SPAN: i32 = 28;
pub const DROP_EDGE_MARGIN: i32 = 4;

// Upper bound on concurrent live drops. The slowest drop survives
// (WORLD_HEIGHT + size) px at easy-minimum speed, just under 8 spawn periods.
pub const DROP_CAP: usize = 10;

// Fall duration ranges in ticks, [min, max)
pub const FALL_TICKS_EASY: (i32, i32) = (210, 312); // 3.5-5.2s
pub const FALL_TICKS_MEDIUM: (i32, i32) = (120, 180); // 2.0-3.0s
pub const FALL_TICKS_HARD: (i32, i32) = (72, 120); // 1.2-2.0s

// Scoring
pub const SCORE_GOOD: i32 = 10;
pub const SCORE_BAD: i32 = -5;
pub const SCORE_COIN: i32 = 5;
pub const SCORE_DANGER: i32 = -10;
pub const WIN_SCORE: i32 = 200;
pub const LOSS_SCORE: i32 = -25;

// Tape format
pub const TAPE_MAGIC: u32 = 0x3154_4344; // "DCT1" in little-endian byte order
pub const TAPE_VERSION: u8 = 1;
pub const RULES_TAG: u8 = 1;
pub const TAPE_HEADER_SIZE: usize = 16;
pub const TAPE_FOOTER_SIZE: usize = 12;
pub const INPUT_RECORD_SIZE: usize = 5;

// Identifies the rule set a verification journal was produced under.
// Bump when any gameplay constant or validation rule changes.
pub const RULES_DIGEST: u32 = 0x6463_0001;

// A full 60-second session is exactly 3600 ticks.
pub const MAX_TICKS_DEFAULT: u32 = TIME_LIMIT_SECONDS * TICKS_PER_SECOND;
