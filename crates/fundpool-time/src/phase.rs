//! Campaign lifecycle phases
//!
//! `loading` until both timestamps are known, then `preparing` before the
//! start, `active` from start to end inclusive, and `ended` after. `ended`
//! is terminal; a periodic sampler may stop once it sees it.

use std::fmt;

use serde::{Deserialize, Serialize};

use fundpool_core::Campaign;

use crate::Clock;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Lifecycle phase of a campaign
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignPhase {
    Loading,
    Preparing,
    Active,
    Ended,
}

impl fmt::Display for CampaignPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CampaignPhase::Loading => "loading",
            CampaignPhase::Preparing => "preparing",
            CampaignPhase::Active => "active",
            CampaignPhase::Ended => "ended",
        };
        f.write_str(label)
    }
}

/// Time left until a phase boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Countdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Countdown {
    pub fn from_secs(total: u64) -> Self {
        Countdown {
            days: total / SECS_PER_DAY,
            hours: (total % SECS_PER_DAY) / SECS_PER_HOUR,
            minutes: (total % SECS_PER_HOUR) / SECS_PER_MINUTE,
            seconds: total % SECS_PER_MINUTE,
        }
    }

    pub fn as_secs(&self) -> u64 {
        self.days * SECS_PER_DAY
            + self.hours * SECS_PER_HOUR
            + self.minutes * SECS_PER_MINUTE
            + self.seconds
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Phase plus the countdown to the relevant boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub phase: CampaignPhase,
    /// To start while preparing, to end while active, `None` otherwise
    pub remaining: Option<Countdown>,
}

impl PhaseState {
    pub const LOADING: PhaseState = PhaseState {
        phase: CampaignPhase::Loading,
        remaining: None,
    };

    pub fn is_terminal(&self) -> bool {
        self.phase == CampaignPhase::Ended
    }
}

/// Derive the phase from campaign timestamps and a sampled `now`.
/// A missing or zero timestamp means the campaign is still loading.
pub fn derive_phase(start_time: Option<u64>, end_time: Option<u64>, now: u64) -> PhaseState {
    let (start, end) = match (start_time, end_time) {
        (Some(start), Some(end)) if start > 0 && end > 0 => (start, end),
        _ => return PhaseState::LOADING,
    };

    if now < start {
        PhaseState {
            phase: CampaignPhase::Preparing,
            remaining: Some(Countdown::from_secs(start - now)),
        }
    } else if now <= end {
        PhaseState {
            phase: CampaignPhase::Active,
            remaining: Some(Countdown::from_secs(end - now)),
        }
    } else {
        PhaseState {
            phase: CampaignPhase::Ended,
            remaining: None,
        }
    }
}

/// Samples a clock to derive campaign phases
pub struct PhaseClock<C: Clock> {
    clock: C,
}

impl<C: Clock> PhaseClock<C> {
    pub fn new(clock: C) -> Self {
        PhaseClock { clock }
    }

    pub fn now(&self) -> u64 {
        self.clock.now_unix()
    }

    /// Phase of a campaign at the current clock reading
    pub fn phase(&self, campaign: &Campaign) -> PhaseState {
        derive_phase(campaign.start_time, campaign.end_time, self.clock.now_unix())
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
