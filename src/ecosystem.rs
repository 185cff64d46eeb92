//! Ecosystem simulation engine - the tick pipeline.
//!
//! The ecosystem owns every collection, the occupancy index, the season
//! scheduler and the single seeded random generator. One call to
//! [`Ecosystem::tick`] runs the fixed pipeline and ends with an audit of the
//! engine invariants.

use crate::animal::{Animal, AnimalId, DeathCause, Populations, Species};
use crate::behavior::{self, TickContext};
use crate::commands::{CommandOutcome, SimCommand};
use crate::config::Config;
use crate::ecology::{hydrology, Environment, Season, SeasonalSystem, Terrain, TerrainGrid};
use crate::error::{Result, SimError};
use crate::grid::{OccupancyIndex, Occupant};
use crate::plant::PlantLayer;
use crate::snapshot::EcosystemSnapshot;
use crate::stats::{Census, DeathTally, PopulationHistory, TickEvents, TickSummary};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// The one random generator behind every decision
pub type SimRng = ChaCha8Rng;

/// The simulated ecosystem
pub struct Ecosystem {
    // Environment
    grid: TerrainGrid,
    environment: Environment,
    seasons: SeasonalSystem,
    plants: PlantLayer,

    // Population
    populations: Populations,
    occupancy: OccupancyIndex,
    next_id: AnimalId,

    // State
    cycle: u64,
    config: Config,
    seed: u64,

    // Random number generator (seeded for reproducibility)
    rng: SimRng,

    // Statistics
    history: PopulationHistory,
    herbivore_deaths: DeathTally,
    predator_deaths: DeathTally,
}

impl Ecosystem {
    /// Create an ecosystem with a random seed
    pub fn new(config: &Config) -> Result<Self> {
        let seed = rand::thread_rng().gen();
        Self::from_config(config, seed)
    }

    /// Create a default world of the given size and populations
    pub fn initialize(
        rows: usize,
        cols: usize,
        initial_herbivores: usize,
        initial_predators: usize,
        seed: u64,
    ) -> Result<Self> {
        let mut config = Config::default();
        config.world.rows = rows;
        config.world.cols = cols;
        config.world.initial_herbivores = initial_herbivores;
        config.world.initial_predators = initial_predators;
        Self::from_config(&config, seed)
    }

    /// Generate terrain, sow plants and place founders
    pub fn from_config(config: &Config, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = SimRng::seed_from_u64(seed);
        let grid = TerrainGrid::generate(config.world.rows, config.world.cols, &config.terrain, &mut rng)?;

        let mut eco = Self::assemble(grid, config, seed, rng);
        eco.plants.seed(
            &mut eco.grid,
            config.world.initial_plants,
            config.plants.initial_nutrition,
            &mut eco.rng,
        )?;
        let herbivores = eco.spawn_founders(Species::Herbivore, config.world.initial_herbivores)?;
        let predators = eco.spawn_founders(Species::Predator, config.world.initial_predators)?;

        let terrain = eco.grid.terrain_counts();
        log::info!(
            "Initialized {}x{} world (seed {}): {} herbivores, {} predators, {} plants, {} water cells",
            eco.grid.rows(),
            eco.grid.cols(),
            seed,
            herbivores,
            predators,
            eco.plants.len(),
            terrain.get(&Terrain::Water).copied().unwrap_or(0)
        );

        eco.check_invariants()?;
        Ok(eco)
    }

    /// Build an empty ecosystem on a prepared grid.
    ///
    /// Every Vegetation cell receives a plant; no animals are placed.
    pub fn with_grid(grid: TerrainGrid, config: &Config, seed: u64) -> Result<Self> {
        config.validate()?;
        hydrology::check_water(&grid)?;
        let rng = SimRng::seed_from_u64(seed);
        Ok(Self::assemble(grid, config, seed, rng))
    }

    fn assemble(grid: TerrainGrid, config: &Config, seed: u64, rng: SimRng) -> Self {
        let plants = PlantLayer::from_grid(&grid, config.plants.initial_nutrition);
        let occupancy = OccupancyIndex::new(grid.rows(), grid.cols());

        Self {
            environment: Environment::new(&config.climate, &config.hydrology),
            seasons: SeasonalSystem::new(&config.seasons),
            plants,
            grid,
            populations: Populations::default(),
            occupancy,
            next_id: 0,
            cycle: 0,
            config: config.clone(),
            seed,
            rng,
            history: PopulationHistory::new(),
            herbivore_deaths: DeathTally::default(),
            predator_deaths: DeathTally::default(),
        }
    }

    /// Place founders on random free passable cells
    fn spawn_founders(&mut self, species: Species, count: usize) -> Result<usize> {
        let mut free: Vec<(usize, usize)> = (0..self.grid.rows())
            .flat_map(|r| (0..self.grid.cols()).map(move |c| (r, c)))
            .filter(|&(r, c)| {
                self.grid.terrain(r, c).is_some_and(|t| t.is_passable())
                    && !self.occupancy.is_occupied(r, c)
            })
            .collect();

        let mut placed = 0;
        while placed < count && !free.is_empty() {
            let pick = self.rng.gen_range(0..free.len());
            let (row, col) = free.swap_remove(pick);
            self.place_founder(species, row, col)?;
            placed += 1;
        }

        if placed < count {
            log::warn!(
                "Only {} of {} {}s found a free cell",
                placed,
                count,
                species.name().to_lowercase()
            );
        }
        Ok(placed)
    }

    fn place_founder(&mut self, species: Species, row: usize, col: usize) -> Result<AnimalId> {
        let id = self.next_id;
        self.next_id += 1;
        let animal = Animal::founder(id, species, row, col, &mut self.rng);
        self.occupancy.insert(row, col, Occupant { id, species })?;
        self.populations.roster_mut(species).push(animal);
        Ok(id)
    }

    /// Place a new founder at a given cell
    pub fn spawn(&mut self, species: Species, row: usize, col: usize) -> Result<AnimalId> {
        let terrain = self.grid.get(row, col)?.terrain;
        if !terrain.is_passable() {
            return Err(SimError::Impassable { row, col });
        }
        self.place_founder(species, row, col)
    }

    /// Kill a living animal. Returns false when it is missing or already dead.
    pub fn kill(&mut self, id: AnimalId, cause: DeathCause) -> Result<bool> {
        let Some(animal) = self.populations.get_mut(id) else {
            return Ok(false);
        };
        if animal.is_dead {
            return Ok(false);
        }
        animal.die(cause);
        let (row, col) = animal.position();
        let species = animal.species;
        self.occupancy.remove(row, col, id)?;
        match species {
            Species::Herbivore => self.herbivore_deaths.record(cause),
            Species::Predator => self.predator_deaths.record(cause),
        }
        Ok(true)
    }

    /// Main simulation tick
    pub fn tick(&mut self) -> Result<TickSummary> {
        let mut events = TickEvents::default();

        // Phase 1: Climate, water and seasons
        let report = self.environment.update(&mut self.grid, self.cycle, &mut self.rng)?;
        if report.rained {
            log::debug!(
                "Rain at cycle {}: {} cells flooded, {} dried, {:.1} water on the map",
                self.cycle,
                report.flooded,
                report.dried,
                self.grid.total_water()
            );
        }
        if let Some(season) = self.seasons.advance() {
            self.apply_season(season);
        }
        self.settle_after_hydrology(&mut events)?;

        // Phase 2: Herbivores, then predators
        self.species_pass(Species::Herbivore, &mut events)?;
        self.species_pass(Species::Predator, &mut events)?;

        // Phase 3: Plant growth and vitals
        let ambient = self.environment.ambient_temperature;
        events.plants_grown = self.plants.grow(&mut self.grid, &self.config.plants, &mut self.rng)?;
        self.plants
            .update_vitals(ambient, self.environment.climate().plant_death_temperature);
        events.plants_lost += self.plants.purge_dead(&mut self.grid)?;

        // Phase 4: Temperature drift
        for animal in self.populations.iter_mut() {
            animal.drift_body_temperature(ambient);
        }
        self.plants.drift_nutrition(ambient);

        // Phase 5: Audit and statistics
        self.check_invariants()?;
        self.herbivore_deaths.merge(&events.herbivore_deaths);
        self.predator_deaths.merge(&events.predator_deaths);

        let summary = TickSummary {
            cycle: self.cycle,
            season: self.seasons.current_season,
            ambient_temperature: ambient,
            living_herbivores: self.populations.living(Species::Herbivore),
            living_predators: self.populations.living(Species::Predator),
            total_plants: self.plants.len(),
            events,
        };
        self.history.record(&summary);
        self.cycle += 1;

        Ok(summary)
    }

    /// Run several ticks, returning the last summary
    pub fn run(&mut self, ticks: u64) -> Result<Option<TickSummary>> {
        let mut last = None;
        for _ in 0..ticks {
            last = Some(self.tick()?);
        }
        Ok(last)
    }

    /// One-off effects of a new season
    fn apply_season(&mut self, season: Season) {
        self.environment.ambient_temperature += season.temperature_modifier();
        self.plants.scale_nutrition(season.food_growth_rate() / 2.0);
        let efficiency = season.predator_efficiency();
        for predator in &mut self.populations.predators {
            predator.hunting_success_rate =
                (predator.hunting_success_rate * efficiency).clamp(0.0, 1.0);
        }

        log::info!(
            "Cycle {}: {} begins ({:.1}°C)",
            self.cycle,
            season,
            self.environment.ambient_temperature
        );
    }

    /// Repair the world after water moved: drop flooded plants and move
    /// stranded animals to the first dry neighbor, or drown them.
    fn settle_after_hydrology(&mut self, events: &mut TickEvents) -> Result<()> {
        events.plants_lost += self.plants.sync_with_grid(&self.grid);

        for species in Species::ALL {
            for idx in 0..self.populations.roster(species).len() {
                let animal = &self.populations.roster(species)[idx];
                if animal.is_dead {
                    continue;
                }
                let (row, col) = animal.position();
                let id = animal.id;
                if self.grid.terrain(row, col).is_some_and(|t| t.is_passable()) {
                    continue;
                }

                let escape = self.grid.passable_neighbors(row, col).first().copied();
                let animal = &mut self.populations.roster_mut(species)[idx];
                match escape {
                    Some(to) => {
                        self.occupancy
                            .relocate(Occupant { id, species }, (row, col), to)?;
                        animal.row = to.0;
                        animal.col = to.1;
                    }
                    None => {
                        animal.die(DeathCause::Drowning);
                        self.occupancy.remove(row, col, id)?;
                        events.record_death(species, DeathCause::Drowning);
                    }
                }
            }
        }
        Ok(())
    }

    /// Run every animal of one species, then drop decomposed bodies and add newborns
    fn species_pass(&mut self, species: Species, events: &mut TickEvents) -> Result<()> {
        let mut newborns = Vec::new();
        {
            let mut ctx = TickContext {
                species,
                grid: &mut self.grid,
                occupancy: &mut self.occupancy,
                populations: &mut self.populations,
                plants: &mut self.plants,
                rng: &mut self.rng,
                next_id: &mut self.next_id,
                events: &mut *events,
                newborns: &mut newborns,
            };
            let count = ctx.populations.roster(species).len();
            for idx in 0..count {
                behavior::step(&mut ctx, idx)?;
            }
        }

        let roster = self.populations.roster_mut(species);
        let before = roster.len();
        roster.retain(|a| !a.is_decomposed());
        events.decomposed += before - roster.len();

        for child in newborns {
            self.occupancy.insert(
                child.row,
                child.col,
                Occupant {
                    id: child.id,
                    species,
                },
            )?;
            self.populations.roster_mut(species).push(child);
        }
        Ok(())
    }

    /// Verify the engine invariants, failing on the first violation
    pub fn check_invariants(&self) -> Result<()> {
        hydrology::check_water(&self.grid)?;
        self.plants.check_coupling(&self.grid)?;
        if !self.populations.is_sorted_by_id() {
            return Err(SimError::Invariant("roster out of id order".to_string()));
        }

        let mut living = 0;
        for animal in self.populations.iter() {
            animal.check_ranges()?;
            let (row, col) = animal.position();
            let cell = self.grid.get(row, col)?;
            if animal.is_dead {
                continue;
            }
            living += 1;

            if !cell.terrain.is_passable() {
                return Err(SimError::Invariant(format!(
                    "{} {} stands on {:?} at ({}, {})",
                    animal.species, animal.id, cell.terrain, row, col
                )));
            }
            let indexed = self
                .occupancy
                .get(row, col)
                .iter()
                .any(|o| o.id == animal.id && o.species == animal.species);
            if !indexed {
                return Err(SimError::Invariant(format!(
                    "{} {} missing from occupancy at ({}, {})",
                    animal.species, animal.id, row, col
                )));
            }
        }

        if self.occupancy.len() != living {
            return Err(SimError::Invariant(format!(
                "occupancy holds {} entries for {} living animals",
                self.occupancy.len(),
                living
            )));
        }
        Ok(())
    }

    /// Apply a steering command between ticks
    pub fn apply_command(&mut self, command: SimCommand) -> CommandOutcome {
        let env = &mut self.environment;
        match command {
            SimCommand::ToggleManualTemperature => {
                env.manual_temperature_control = !env.manual_temperature_control;
                log::info!(
                    "Manual temperature control {}",
                    if env.manual_temperature_control { "on" } else { "off" }
                );
            }
            SimCommand::RaiseTemperature | SimCommand::LowerTemperature => {
                if !env.manual_temperature_control {
                    return CommandOutcome::IgnoredAutomaticClimate;
                }
                if command == SimCommand::RaiseTemperature {
                    env.ambient_temperature += 1.0;
                } else {
                    env.ambient_temperature -= 1.0;
                }
            }
            SimCommand::SetPrecipitation(level) => env.set_precipitation_level(level),
            SimCommand::ToggleEvaporation => {
                env.evaporation_enabled = !env.evaporation_enabled;
            }
        }
        CommandOutcome::Applied
    }

    // Read-only accessors

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn populations(&self) -> &Populations {
        &self.populations
    }

    pub fn herbivores(&self) -> &[Animal] {
        &self.populations.herbivores
    }

    pub fn predators(&self) -> &[Animal] {
        &self.populations.predators
    }

    pub fn plants(&self) -> &PlantLayer {
        &self.plants
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn animal(&self, id: AnimalId) -> Option<&Animal> {
        self.populations.get(id)
    }

    /// Mutable access for scenario setup. Position changes must go
    /// through the engine, or the next audit fails.
    pub fn animal_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        self.populations.get_mut(id)
    }

    /// Ticks completed so far
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn season(&self) -> Season {
        self.seasons.current_season
    }

    /// Ticks elapsed in the current season
    pub fn season_cycle(&self) -> u64 {
        self.seasons.season_cycle
    }

    pub fn ambient_temperature(&self) -> f64 {
        self.environment.ambient_temperature
    }

    pub fn precipitation_level(&self) -> f64 {
        self.environment.precipitation_level()
    }

    pub fn manual_temperature_control(&self) -> bool {
        self.environment.manual_temperature_control
    }

    pub fn evaporation_enabled(&self) -> bool {
        self.environment.evaporation_enabled
    }

    pub fn living(&self, species: Species) -> usize {
        self.populations.living(species)
    }

    pub fn history(&self) -> &PopulationHistory {
        &self.history
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Head counts and lifetime death causes
    pub fn census(&self) -> Census {
        Census::new(
            self.cycle,
            &self.populations,
            self.herbivore_deaths,
            self.predator_deaths,
        )
    }

    pub fn snapshot(&self) -> EcosystemSnapshot {
        EcosystemSnapshot::from_ecosystem(self)
    }
}
