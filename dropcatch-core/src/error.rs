use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    PhaseScoreConsistency,
    TimeRemainingRange,
    DropCount,
    DropState,
    CatcherBounds,
    CadenceState,
    ProgressionTick,
    ProgressionPhase,
    ProgressionScoreDelta,
    ProgressionCountdown,
    ProgressionSpawn,
    CatcherPositionStep,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseScoreConsistency => write!(f, "PHASE_SCORE_CONSISTENCY"),
            Self::TimeRemainingRange => write!(f, "TIME_REMAINING_RANGE"),
            Self::DropCount => write!(f, "DROP_COUNT"),
            Self::DropState => write!(f, "DROP_STATE"),
            Self::CatcherBounds => write!(f, "CATCHER_BOUNDS"),
            Self::CadenceState => write!(f, "CADENCE_STATE"),
            Self::ProgressionTick => write!(f, "PROGRESSION_TICK"),
            Self::ProgressionPhase => write!(f, "PROGRESSION_PHASE"),
            Self::ProgressionScoreDelta => write!(f, "PROGRESSION_SCORE_DELTA"),
            Self::ProgressionCountdown => write!(f, "PROGRESSION_COUNTDOWN"),
            Self::ProgressionSpawn => write!(f, "PROGRESSION_SPAWN"),
            Self::CatcherPositionStep => write!(f, "CATCHER_POSITION_STEP"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyError {
    TapeTooShort { actual: usize, min: usize },
    InvalidMagic { found: u32 },
    UnsupportedVersion { found: u8 },
    UnknownRulesTag { found: u8 },
    UnknownDifficulty { found: u8 },
    HeaderReservedNonZero,
    TickCountOutOfRange { tick_count: u32, max_ticks: u32 },
    TapeLengthMismatch { expected: usize, actual: usize },
    ReservedInputBitsNonZero { tick: u32, byte: u8 },
    PointerBytesWithoutFlag { tick: u32 },
    CrcMismatch { stored: u32, computed: u32 },
    RuleViolation { tick: u32, rule: RuleCode },
    TickCountMismatch { claimed: u32, computed: u32 },
    ScoreMismatch { claimed: i32, computed: i32 },
    RngMismatch { claimed: u32, computed: u32 },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TapeTooShort { actual, min } => {
                write!(f, "tape too short: got {actual} bytes, need at least {min}")
            }
            Self::InvalidMagic { found } => write!(f, "invalid tape magic: 0x{found:08x}"),
            Self::UnsupportedVersion { found } => write!(f, "unsupported tape version: {found}"),
            Self::UnknownRulesTag { found } => write!(f, "unknown rules tag: {found}"),
            Self::UnknownDifficulty { found } => write!(f, "unknown difficulty byte: {found}"),
            Self::HeaderReservedNonZero => write!(f, "header reserved byte is non-zero"),
            Self::TickCountOutOfRange {
                tick_count,
                max_ticks,
            } => write!(
                f,
                "tick count out of range: {tick_count} (allowed 1..={max_ticks})"
            ),
            Self::TapeLengthMismatch { expected, actual } => write!(
                f,
                "tape length mismatch: expected {expected} bytes, got {actual}"
            ),
            Self::ReservedInputBitsNonZero { tick, byte } => write!(
                f,
                "input flag reserved bits set at tick {tick}: 0x{byte:02x}"
            ),
            Self::PointerBytesWithoutFlag { tick } => write!(
                f,
                "pointer bytes set without pointer flag at tick {tick}"
            ),
            Self::CrcMismatch { stored, computed } => write!(
                f,
                "crc mismatch: stored=0x{stored:08x}, computed=0x{computed:08x}"
            ),
            Self::RuleViolation { tick, rule } => {
                write!(f, "rule violation at tick {tick}: {rule}")
            }
            Self::TickCountMismatch { claimed, computed } => {
                write!(
                    f,
                    "tick-count mismatch: claimed={claimed}, computed={computed}"
                )
            }
            Self::ScoreMismatch { claimed, computed } => {
                write!(f, "score mismatch: claimed={claimed}, computed={computed}")
            }
            Self::RngMismatch { claimed, computed } => {
                write!(
                    f,
                    "rng mismatch: claimed=0x{claimed:08x}, computed=0x{computed:08x}"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for VerifyError {}
