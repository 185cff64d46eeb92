//! Seasonal cycle.
//!
//! Four seasons of equal length. Each transition applies a one-off shock to
//! the world: an ambient temperature shift, a plant nutrition multiplier and
//! a predator efficiency multiplier.

use serde::{Deserialize, Serialize};

/// The four seasons, in cycle order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
    ];

    /// Degrees added to the ambient temperature when the season begins
    pub fn temperature_modifier(&self) -> f64 {
        match self {
            Season::Spring => 5.0,
            Season::Summer => 10.0,
            Season::Autumn => 0.0,
            Season::Winter => -5.0,
        }
    }

    /// Plant growth factor; plant nutrition is scaled by half of it
    pub fn food_growth_rate(&self) -> f64 {
        match self {
            Season::Spring => 1.2,
            Season::Summer => 1.0,
            Season::Autumn => 0.8,
            Season::Winter => 0.5,
        }
    }

    /// Multiplier applied to every predator's hunting success rate
    pub fn predator_efficiency(&self) -> f64 {
        match self {
            Season::Spring => 1.0,
            Season::Summer => 1.2,
            Season::Autumn => 1.0,
            Season::Winter => 1.1,
        }
    }

    /// Position in the cycle (Spring = 0)
    pub fn index(&self) -> usize {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Autumn => 2,
            Season::Winter => 3,
        }
    }

    /// Get next season
    pub fn next(&self) -> Season {
        Season::ALL[(self.index() + 1) % Season::ALL.len()]
    }

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Season scheduler
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeasonalSystem {
    pub current_season: Season,
    /// Ticks elapsed in the current season
    pub season_cycle: u64,
    pub season_duration: u64,
}

impl SeasonalSystem {
    pub fn new(config: &SeasonsConfig) -> Self {
        Self {
            current_season: Season::Spring,
            season_cycle: 0,
            season_duration: config.season_duration,
        }
    }

    /// Count one tick. Returns the new season when a transition happens.
    pub fn advance(&mut self) -> Option<Season> {
        self.season_cycle += 1;
        if self.season_cycle >= self.season_duration {
            self.current_season = self.current_season.next();
            self.season_cycle = 0;
            Some(self.current_season)
        } else {
            None
        }
    }
}

/// Seasons configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonsConfig {
    /// Ticks per season
    pub season_duration: u64,
}

impl Default for SeasonsConfig {
    fn default() -> Self {
        Self {
            season_duration: 50,
        }
    }
}
