//! Statistics tracking for the simulation.

use crate::animal::{Animal, DeathCause, Populations, Species};
use crate::ecology::Season;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Deaths counted by cause
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathTally {
    pub old_age: usize,
    pub starvation: usize,
    pub dehydration: usize,
    pub hyperthermia: usize,
    pub exhaustion: usize,
    pub predation: usize,
    pub drowning: usize,
}

impl DeathTally {
    pub fn record(&mut self, cause: DeathCause) {
        *self.slot(cause) += 1;
    }

    pub fn get(&self, cause: DeathCause) -> usize {
        match cause {
            DeathCause::OldAge => self.old_age,
            DeathCause::Starvation => self.starvation,
            DeathCause::Dehydration => self.dehydration,
            DeathCause::Hyperthermia => self.hyperthermia,
            DeathCause::Exhaustion => self.exhaustion,
            DeathCause::Predation => self.predation,
            DeathCause::Drowning => self.drowning,
        }
    }

    fn slot(&mut self, cause: DeathCause) -> &mut usize {
        match cause {
            DeathCause::OldAge => &mut self.old_age,
            DeathCause::Starvation => &mut self.starvation,
            DeathCause::Dehydration => &mut self.dehydration,
            DeathCause::Hyperthermia => &mut self.hyperthermia,
            DeathCause::Exhaustion => &mut self.exhaustion,
            DeathCause::Predation => &mut self.predation,
            DeathCause::Drowning => &mut self.drowning,
        }
    }

    pub fn total(&self) -> usize {
        DeathCause::ALL.iter().map(|&c| self.get(c)).sum()
    }

    /// Add another tally into this one
    pub fn merge(&mut self, other: &DeathTally) {
        for cause in DeathCause::ALL {
            *self.slot(cause) += other.get(cause);
        }
    }

    /// Non-zero causes, e.g. `Starvation:3 Predation:1`
    pub fn describe(&self) -> String {
        let parts: Vec<String> = DeathCause::ALL
            .iter()
            .filter(|&&c| self.get(c) > 0)
            .map(|&c| format!("{}:{}", c, self.get(c)))
            .collect();
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// What happened to the animals during one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    pub herbivore_births: usize,
    pub predator_births: usize,
    /// Hunts attempted
    pub hunts: usize,
    /// Hunts that killed their prey
    pub kills: usize,
    pub herbivore_deaths: DeathTally,
    pub predator_deaths: DeathTally,
    /// Animals removed after fully decaying
    pub decomposed: usize,
    pub plants_grown: usize,
    pub plants_eaten: usize,
    /// Plants lost to heat or flooding
    pub plants_lost: usize,
}

impl TickEvents {
    pub fn record_birth(&mut self, species: Species) {
        match species {
            Species::Herbivore => self.herbivore_births += 1,
            Species::Predator => self.predator_births += 1,
        }
    }

    pub fn record_death(&mut self, species: Species, cause: DeathCause) {
        self.deaths_mut(species).record(cause);
    }

    fn deaths_mut(&mut self, species: Species) -> &mut DeathTally {
        match species {
            Species::Herbivore => &mut self.herbivore_deaths,
            Species::Predator => &mut self.predator_deaths,
        }
    }

    pub fn births(&self) -> usize {
        self.herbivore_births + self.predator_births
    }
}

/// Result of one tick
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Tick that just ran, starting at 0
    pub cycle: u64,
    pub season: Season,
    pub ambient_temperature: f64,
    pub living_herbivores: usize,
    pub living_predators: usize,
    pub total_plants: usize,
    pub events: TickEvents,
}

impl TickSummary {
    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | {:6} | {:5.1}°C | Herb:{:5} | Pred:{:5} | Plants:{:5} | Births:{:3} | Kills:{:3}",
            self.cycle,
            self.season.name(),
            self.ambient_temperature,
            self.living_herbivores,
            self.living_predators,
            self.total_plants,
            self.events.births(),
            self.events.kills,
        )
    }
}

/// Head count for one species
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCensus {
    pub adults: usize,
    pub juveniles: usize,
    /// Dead but not yet decomposed
    pub dead: usize,
    pub pregnant: usize,
}

impl SpeciesCensus {
    pub fn count(animals: &[Animal]) -> Self {
        let mut census = Self::default();
        for animal in animals {
            if animal.is_dead {
                census.dead += 1;
            } else if animal.is_adult {
                census.adults += 1;
            } else {
                census.juveniles += 1;
            }
            if animal.is_pregnant {
                census.pregnant += 1;
            }
        }
        census
    }

    pub fn alive(&self) -> usize {
        self.adults + self.juveniles
    }

    pub fn total(&self) -> usize {
        self.alive() + self.dead
    }
}

/// Population census with lifetime death causes
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    pub cycle: u64,
    pub herbivores: SpeciesCensus,
    pub predators: SpeciesCensus,
    pub herbivore_deaths: DeathTally,
    pub predator_deaths: DeathTally,
}

impl Census {
    pub fn new(
        cycle: u64,
        populations: &Populations,
        herbivore_deaths: DeathTally,
        predator_deaths: DeathTally,
    ) -> Self {
        Self {
            cycle,
            herbivores: SpeciesCensus::count(&populations.herbivores),
            predators: SpeciesCensus::count(&populations.predators),
            herbivore_deaths,
            predator_deaths,
        }
    }

    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Day {} | Herbivores {} (alive {}, dead {}) deaths [{}] | Predators {} (alive {}, dead {}) deaths [{}]",
            self.cycle,
            self.herbivores.total(),
            self.herbivores.alive(),
            self.herbivores.dead,
            self.herbivore_deaths.describe(),
            self.predators.total(),
            self.predators.alive(),
            self.predators.dead,
            self.predator_deaths.describe(),
        )
    }
}

/// Population time series, one entry per tick per channel
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PopulationHistory {
    pub herbivores: Vec<usize>,
    pub predators: Vec<usize>,
    pub plants: Vec<usize>,
}

impl PopulationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the counts of a finished tick
    pub fn record(&mut self, summary: &TickSummary) {
        self.herbivores.push(summary.living_herbivores);
        self.predators.push(summary.living_predators);
        self.plants.push(summary.total_plants);
    }

    /// Number of recorded ticks
    pub fn len(&self) -> usize {
        self.herbivores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.herbivores.is_empty()
    }

    /// The last `n` entries of a series (for graphs)
    pub fn tail(series: &[usize], n: usize) -> &[usize] {
        &series[series.len().saturating_sub(n)..]
    }

    /// Save history to a JSON file
    pub fn save_json(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn summary(cycle: u64, herbivores: usize) -> TickSummary {
        TickSummary {
            cycle,
            season: Season::Spring,
            ambient_temperature: 20.0,
            living_herbivores: herbivores,
            living_predators: 3,
            total_plants: 40,
            events: TickEvents::default(),
        }
    }

    #[test]
    fn test_death_tally() {
        let mut tally = DeathTally::default();
        tally.record(DeathCause::Starvation);
        tally.record(DeathCause::Starvation);
        tally.record(DeathCause::Predation);

        assert_eq!(tally.get(DeathCause::Starvation), 2);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.describe(), "Starvation:2 Predation:1");

        let mut sum = DeathTally::default();
        sum.merge(&tally);
        sum.merge(&tally);
        assert_eq!(sum.total(), 6);
    }

    #[test]
    fn test_history_one_entry_per_tick() {
        let mut history = PopulationHistory::new();
        for i in 0..5 {
            history.record(&summary(i, 10 + i as usize));
        }

        assert_eq!(history.len(), 5);
        assert_eq!(history.predators.len(), 5);
        assert_eq!(history.plants.len(), 5);
        assert_eq!(history.herbivores[4], 14);
        assert_eq!(PopulationHistory::tail(&history.herbivores, 2), &[13, 14]);
        assert_eq!(PopulationHistory::tail(&history.herbivores, 50).len(), 5);
    }

    #[test]
    fn test_census_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut populations = Populations::default();
        for id in 0..4 {
            let mut animal = Animal::founder(id, Species::Herbivore, 0, 0, &mut rng);
            animal.is_adult = id % 2 == 0;
            populations.herbivores.push(animal);
        }
        populations.herbivores[3].die(DeathCause::Exhaustion);

        let census = Census::new(7, &populations, DeathTally::default(), DeathTally::default());
        assert_eq!(census.herbivores.adults, 2);
        assert_eq!(census.herbivores.juveniles, 1);
        assert_eq!(census.herbivores.dead, 1);
        assert_eq!(census.predators.total(), 0);
        assert!(census.summary().starts_with("Day 7"));
    }

    #[test]
    fn test_summary_line() {
        let line = summary(12, 100).summary();
        assert!(line.contains("Herb:  100"));
        assert!(line.contains("Spring"));
    }
}
