use std::env;

use chrono::{DateTime, TimeDelta, Utc};
use derive_more::derive::Display;
use dotenv::dotenv;
use once_cell::sync::Lazy;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
    #[display("Environment variable {_0} is not a valid RFC 3339 timestamp")]
    BadTimestamp(&'static str),

    #[display("Hunt timeline must satisfy start <= end <= close")]
    UnorderedTimeline,

    #[display("Accrual interval must be positive")]
    NonPositiveInterval,

    #[display("Accrual table entries must be non-negative")]
    NegativeAccrual,

    #[display("Guess cap and intro hint allotment must be non-negative")]
    NegativeAllotment,
}

/// Hunt-wide parameters. Validated once at startup; the engines assume a
/// validated configuration and never re-check it per call.
#[derive(Clone)]
pub struct HuntConfig {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,

    pub max_guesses_per_puzzle: i32,

    pub hints_enabled: bool,
    /// Hints accrued per interval, starting at `hint_time`.
    pub hints_per_interval: Vec<i32>,
    pub hint_interval: TimeDelta,
    pub hint_time: DateTime<Utc>,
    /// Teams younger than this get manual grants only, to discourage
    /// sockpuppet registrations. Once it elapses the full accrual applies
    /// retroactively.
    pub team_age_before_hints: TimeDelta,
    /// If positive, a team's first N hints are usable only in the intro round.
    pub intro_hints: i32,
    pub one_hint_at_a_time: bool,

    pub free_answers_enabled: bool,
    pub free_answers_per_interval: Vec<i32>,
    pub free_answer_interval: TimeDelta,
    pub free_answer_time: DateTime<Utc>,
    pub team_age_before_free_answers: TimeDelta,

    /// Solves in this round never count toward global unlock thresholds.
    pub intro_round_slug: String,
    /// Slug of the puzzle whose solve finishes the hunt.
    pub meta_meta_slug: String,
    /// Optional second milestone used as a leaderboard tiebreaker.
    pub secondary_milestone_slug: Option<String>,
}

const DEFAULT_HINTS_PER_INTERVAL: [i32; 12] = [1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 0, 1];
const DEFAULT_FREE_ANSWERS_PER_INTERVAL: [i32; 3] = [1, 2, 2];

impl HuntConfig {
    /// Default knobs for a hunt running over the given timeline.
    pub fn standard(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        close_time: DateTime<Utc>,
    ) -> Self {
        let hint_interval = TimeDelta::hours(6);
        Self {
            start_time,
            end_time,
            close_time,
            max_guesses_per_puzzle: 20,
            hints_enabled: true,
            hints_per_interval: DEFAULT_HINTS_PER_INTERVAL.to_vec(),
            hint_interval,
            hint_time: start_time + hint_interval,
            team_age_before_hints: hint_interval,
            intro_hints: 0,
            one_hint_at_a_time: true,
            free_answers_enabled: false,
            free_answers_per_interval: DEFAULT_FREE_ANSWERS_PER_INTERVAL.to_vec(),
            free_answer_interval: TimeDelta::days(1),
            free_answer_time: start_time + TimeDelta::days(6),
            team_age_before_free_answers: TimeDelta::days(3),
            intro_round_slug: "intro".to_owned(),
            meta_meta_slug: "metameta".to_owned(),
            secondary_milestone_slug: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        let start_time = env_time("HUNT_START_TIME", "2025-03-08T21:00:00Z")?;
        let end_time = env_time("HUNT_END_TIME", "2025-03-17T00:00:00Z")?;
        let close_time = env_time("HUNT_CLOSE_TIME", "2025-03-31T00:00:00Z")?;
        let mut config = Self::standard(start_time, end_time, close_time);
        if let Ok(slug) = env::var("META_META_SLUG") {
            config.meta_meta_slug = slug;
        }
        config.secondary_milestone_slug = env::var("SECONDARY_MILESTONE_SLUG").ok();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_time > self.end_time || self.end_time > self.close_time {
            return Err(ConfigError::UnorderedTimeline);
        }
        if self.hint_interval <= TimeDelta::zero() || self.free_answer_interval <= TimeDelta::zero()
        {
            return Err(ConfigError::NonPositiveInterval);
        }
        if self
            .hints_per_interval
            .iter()
            .chain(self.free_answers_per_interval.iter())
            .any(|&n| n < 0)
        {
            return Err(ConfigError::NegativeAccrual);
        }
        if self.max_guesses_per_puzzle < 0 || self.intro_hints < 0 {
            return Err(ConfigError::NegativeAllotment);
        }
        if self.team_age_before_hints < TimeDelta::zero()
            || self.team_age_before_free_answers < TimeDelta::zero()
        {
            return Err(ConfigError::NonPositiveInterval);
        }
        Ok(())
    }
}

fn env_time(var: &'static str, default: &str) -> Result<DateTime<Utc>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<DateTime<Utc>>()
            .map_err(|_| ConfigError::BadTimestamp(var)),
        Err(_) => Ok(default
            .parse::<DateTime<Utc>>()
            .expect("default timestamp is well-formed")),
    }
}

static HUNT_CONFIG: Lazy<HuntConfig> =
    Lazy::new(|| HuntConfig::from_env().expect("invalid hunt configuration"));

/// Process-wide configuration, loaded from the environment on first use.
/// Configuration errors are fatal here; everything downstream assumes a
/// validated config.
pub fn hunt_config() -> &'static HuntConfig {
    &HUNT_CONFIG
}
