//! Per-tick behavior of animals.
//!
//! Species differ only in how they move, feed and reproduce. Each species has
//! a [`Behavior`] table of plain functions selected by variant; the rest of
//! the tick is shared and runs in a fixed order:
//! fertility, waste, vitals, movement, feeding, drinking, mating, gestation.

use crate::animal::{Animal, AnimalId, DeathCause, Populations, Species};
use crate::ecology::terrain::TerrainGrid;
use crate::ecosystem::SimRng;
use crate::error::Result;
use crate::grid::{manhattan_to, OccupancyIndex, Occupant};
use crate::plant::PlantLayer;
use crate::stats::TickEvents;
use rand::Rng;

/// Nutrition a herbivore gets from eating a plant
pub const HERBIVORE_NUTRITION: f64 = 30.0;
/// Euclidean radius in which a juvenile looks for adults to follow
pub const HERD_RADIUS: usize = 5;
/// Energy a predator pays per move
pub const PREDATOR_MOVE_COST: f64 = 1.0;
/// Energy a hunt costs, successful or not
pub const HUNT_COST: f64 = 20.0;
/// Hunger removed by a successful hunt
pub const PREY_HUNGER_RELIEF: f64 = 80.0;
/// Thirst removed by a successful hunt
pub const PREY_THIRST_RELIEF: f64 = 50.0;

/// Mutable view of the world handed to behavior functions during one species pass
pub struct TickContext<'a> {
    /// Species whose roster is being processed
    pub species: Species,
    pub grid: &'a mut TerrainGrid,
    pub occupancy: &'a mut OccupancyIndex,
    pub populations: &'a mut Populations,
    pub plants: &'a mut PlantLayer,
    pub rng: &'a mut SimRng,
    pub next_id: &'a mut AnimalId,
    pub events: &'a mut TickEvents,
    /// Births of this pass, added to the roster once the pass ends
    pub newborns: &'a mut Vec<Animal>,
}

impl TickContext<'_> {
    #[inline]
    fn animal(&self, idx: usize) -> &Animal {
        &self.populations.roster(self.species)[idx]
    }

    #[inline]
    fn animal_mut(&mut self, idx: usize) -> &mut Animal {
        &mut self.populations.roster_mut(self.species)[idx]
    }

    fn allocate_id(&mut self) -> AnimalId {
        let id = *self.next_id;
        *self.next_id += 1;
        id
    }

    /// Move an animal and keep the occupancy index in step
    fn move_to(&mut self, idx: usize, to: (usize, usize)) -> Result<()> {
        let species = self.species;
        let animal = &mut self.populations.roster_mut(species)[idx];
        let from = animal.position();
        let occupant = Occupant {
            id: animal.id,
            species,
        };
        self.occupancy.relocate(occupant, from, to)?;
        animal.row = to.0;
        animal.col = to.1;
        Ok(())
    }
}

/// Behavior step taking the pass context and a roster index
pub type BehaviorFn = fn(&mut TickContext<'_>, usize) -> Result<()>;

/// Dispatch table of species-specific behavior
pub struct Behavior {
    pub relocate: BehaviorFn,
    pub feed: BehaviorFn,
    pub reproduce: BehaviorFn,
}

pub const HERBIVORE: Behavior = Behavior {
    relocate: herd_or_wander,
    feed: graze,
    reproduce: mate,
};

pub const PREDATOR: Behavior = Behavior {
    relocate: prowl,
    feed: hunt,
    reproduce: mate,
};

impl Behavior {
    pub fn of(species: Species) -> &'static Behavior {
        match species {
            Species::Herbivore => &HERBIVORE,
            Species::Predator => &PREDATOR,
        }
    }
}

/// Run one tick for the animal at `idx` of the context's roster.
///
/// Dead animals only decay. An animal that dies during its vitals check
/// leaves the occupancy index and does nothing else this tick.
pub fn step(ctx: &mut TickContext<'_>, idx: usize) -> Result<()> {
    let species = ctx.species;
    let animal = ctx.animal_mut(idx);
    if animal.is_dead {
        animal.undergo_decay();
        return Ok(());
    }

    animal.update_fertility();
    animal.eliminate_waste();
    let died = animal.handle_vital_stats();
    let (row, col) = animal.position();
    let id = animal.id;

    // Every living animal marks the cell it starts the tick on
    let flags = &mut ctx.grid.get_mut(row, col)?.flags;
    flags.feces = true;
    flags.urine = true;

    if let Some(cause) = died {
        ctx.occupancy.remove(row, col, id)?;
        ctx.events.record_death(species, cause);
        return Ok(());
    }

    let behavior = Behavior::of(species);
    (behavior.relocate)(ctx, idx)?;
    (behavior.feed)(ctx, idx)?;
    drink(ctx, idx)?;
    (behavior.reproduce)(ctx, idx)?;
    gestate(ctx, idx)
}

/// Centroid of living same-species adults within the herd radius
fn herd_centroid(ctx: &TickContext<'_>, idx: usize) -> Option<(f64, f64)> {
    let me = ctx.animal(idx);
    let radius_sq = (HERD_RADIUS * HERD_RADIUS) as f64;

    let mut sum = (0.0, 0.0);
    let mut count = 0usize;
    for occupant in ctx.occupancy.query_radius(me.row, me.col, HERD_RADIUS) {
        if occupant.species != ctx.species || occupant.id == me.id {
            continue;
        }
        let Some(other) = ctx.populations.find(ctx.species, occupant.id) else {
            continue;
        };
        let dr = other.row as f64 - me.row as f64;
        let dc = other.col as f64 - me.col as f64;
        if other.is_adult && !other.is_dead && dr * dr + dc * dc <= radius_sq {
            sum.0 += other.row as f64;
            sum.1 += other.col as f64;
            count += 1;
        }
    }

    (count > 0).then(|| (sum.0 / count as f64, sum.1 / count as f64))
}

/// Herbivore movement: juveniles follow nearby adults, everyone else wanders.
///
/// Candidate cells are passable neighbors free of the same species.
fn herd_or_wander(ctx: &mut TickContext<'_>, idx: usize) -> Result<()> {
    let animal = ctx.animal(idx);
    if animal.energy <= 0.0 {
        return Ok(());
    }
    let (row, col) = animal.position();
    let is_adult = animal.is_adult;

    let candidates: Vec<(usize, usize)> = ctx
        .grid
        .passable_neighbors(row, col)
        .into_iter()
        .filter(|&(r, c)| !ctx.occupancy.has_species(r, c, ctx.species))
        .collect();
    if candidates.is_empty() {
        return Ok(());
    }

    let centroid = if is_adult {
        None
    } else {
        herd_centroid(ctx, idx)
    };

    let target = match centroid {
        Some(center) => candidates
            .iter()
            .copied()
            .min_by(|&a, &b| manhattan_to(a, center).total_cmp(&manhattan_to(b, center))),
        None => Some(candidates[ctx.rng.gen_range(0..candidates.len())]),
    };

    match target {
        Some(to) => ctx.move_to(idx, to),
        None => Ok(()),
    }
}

/// Predator movement: a random passable neighbor, paying energy
fn prowl(ctx: &mut TickContext<'_>, idx: usize) -> Result<()> {
    let animal = ctx.animal(idx);
    if animal.energy <= 0.0 {
        return Ok(());
    }
    let candidates = ctx.grid.passable_neighbors(animal.row, animal.col);
    if candidates.is_empty() {
        return Ok(());
    }

    let to = candidates[ctx.rng.gen_range(0..candidates.len())];
    ctx.move_to(idx, to)?;
    ctx.animal_mut(idx).spend_energy(PREDATOR_MOVE_COST);
    Ok(())
}

/// Herbivore feeding: eat the plant on the current cell
fn graze(ctx: &mut TickContext<'_>, idx: usize) -> Result<()> {
    let (row, col) = ctx.animal(idx).position();
    if ctx.plants.destroy(ctx.grid, row, col)?.is_some() {
        ctx.animal_mut(idx).eat(HERBIVORE_NUTRITION);
        ctx.events.plants_eaten += 1;
    }
    Ok(())
}

/// Predator feeding: attack a random living herbivore within one cell
fn hunt(ctx: &mut TickContext<'_>, idx: usize) -> Result<()> {
    let (row, col) = ctx.animal(idx).position();
    let prey: Vec<Occupant> = ctx
        .occupancy
        .query_radius(row, col, 1)
        .into_iter()
        .filter(|o| o.species == Species::Herbivore)
        .collect();
    if prey.is_empty() {
        return Ok(());
    }

    let target = prey[ctx.rng.gen_range(0..prey.len())];
    let roll: f64 = ctx.rng.gen();
    let predator = ctx.animal_mut(idx);
    predator.spend_energy(HUNT_COST);
    let success = roll < predator.hunting_success_rate;
    ctx.events.hunts += 1;
    if !success {
        return Ok(());
    }

    let Some(victim) = ctx.populations.find_mut(Species::Herbivore, target.id) else {
        return Ok(());
    };
    let (prey_row, prey_col) = victim.position();
    victim.die(DeathCause::Predation);
    ctx.occupancy.remove(prey_row, prey_col, target.id)?;
    ctx.events.record_death(Species::Herbivore, DeathCause::Predation);
    ctx.events.kills += 1;

    let predator = ctx.animal_mut(idx);
    predator.hunger = (predator.hunger - PREY_HUNGER_RELIEF).max(0.0);
    predator.thirst = (predator.thirst - PREY_THIRST_RELIEF).max(0.0);
    Ok(())
}

/// Drink when any of the 8 neighbors is water
fn drink(ctx: &mut TickContext<'_>, idx: usize) -> Result<()> {
    let (row, col) = ctx.animal(idx).position();
    if ctx.grid.has_water_nearby(row, col) {
        ctx.animal_mut(idx).drink();
    }
    Ok(())
}

/// An eligible female conceives with the first valid mate within one cell
fn mate(ctx: &mut TickContext<'_>, idx: usize) -> Result<()> {
    let female = ctx.animal(idx);
    if !female.can_reproduce() {
        return Ok(());
    }

    let populations = &*ctx.populations;
    let sire = ctx
        .occupancy
        .query_radius(female.row, female.col, 1)
        .into_iter()
        .filter(|o| o.species == ctx.species && o.id != female.id)
        .filter_map(|o| populations.find(o.species, o.id))
        .find(|male| female.is_valid_mate(male))
        .map(Animal::genome);

    if let Some(genome) = sire {
        ctx.animal_mut(idx).conceive(genome);
    }
    Ok(())
}

/// Count down gestation and deliver the newborn when it is due
fn gestate(ctx: &mut TickContext<'_>, idx: usize) -> Result<()> {
    let species = ctx.species;
    let Some(father) = ctx.animal_mut(idx).advance_gestation() else {
        return Ok(());
    };

    let id = ctx.allocate_id();
    let mother = ctx.animal(idx);
    let (row, col) = mother.position();
    let genome = mother.genome();
    let mother_id = mother.id;
    let child = Animal::offspring(id, species, row, col, &genome, &father, &mut *ctx.rng);

    log::debug!("{} {} born to {} at ({}, {})", species, id, mother_id, row, col);
    ctx.newborns.push(child);
    ctx.events.record_birth(species);
    Ok(())
}
