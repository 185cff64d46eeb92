//! Animal structure and lifecycle.
//!
//! An animal moves through `{Juvenile, Adult} x {Alive, Dead} x {Pregnant, NotPregnant}`.
//! Death is terminal; a dead animal only decays until it is removed from its
//! roster. The species-specific parts of behavior live in [`crate::behavior`].

use crate::error::{Result, SimError};
use crate::grid::chebyshev;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Unique animal identifier, assigned in creation order
pub type AnimalId = u64;

/// RGB display color
pub type Color = [u8; 3];

/// Age at which an animal becomes an adult
pub const ADULT_AGE: u32 = 20;
/// Hunger and thirst gained per tick
pub const NEED_INCREASE: f64 = 10.0;
/// Energy regained per tick while not starving
pub const ENERGY_REGEN: f64 = 5.0;
/// Decay lost per tick after death
pub const DECAY_RATE: f64 = 5.0;
/// Body temperature that kills
pub const HYPERTHERMIA: f64 = 42.0;
/// Thirst removed by one drink
pub const DRINK_RELIEF: f64 = 50.0;
/// Colon fill added per meal
pub const COLON_PER_MEAL: f64 = 20.0;
/// Bladder fill added per drink
pub const BLADDER_PER_DRINK: f64 = 30.0;
/// Length of the female fertility cycle in ticks
pub const FERTILITY_CYCLE: u32 = 28;
/// Fertility needed to conceive
pub const FERTILITY_THRESHOLD: f64 = 8.0;
/// Upper bound of fertility
pub const MAX_FERTILITY: f64 = 10.0;
/// Ticks a mother waits after giving birth
pub const BIRTH_COOLDOWN: u32 = 300;
/// Half-width of the uniform jitter added to inherited traits
pub const TRAIT_MUTATION: f64 = 0.1;
/// Half-width of the uniform jitter added to inherited color channels
pub const COLOR_MUTATION: i32 = 10;

/// Closed set of species
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    Herbivore,
    Predator,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Herbivore, Species::Predator];

    /// Founder display color
    pub fn color(&self) -> Color {
        match self {
            Species::Herbivore => [0, 255, 255],
            Species::Predator => [255, 0, 0],
        }
    }

    /// Ticks from conception to birth
    pub fn gestation_period(&self) -> u32 {
        match self {
            Species::Herbivore => 20,
            Species::Predator => 100,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Species::Herbivore => "Herbivore",
            Species::Predator => "Predator",
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Biological sex
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Draw a sex 50/50
    pub fn random(rng: &mut impl Rng) -> Self {
        if rng.gen_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

/// Cause of death tracking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeathCause {
    OldAge,
    Starvation,
    Dehydration,
    Hyperthermia,
    Exhaustion,
    Predation,
    /// Cell flooded with no dry neighbor to escape to
    Drowning,
}

impl DeathCause {
    pub const ALL: [DeathCause; 7] = [
        DeathCause::OldAge,
        DeathCause::Starvation,
        DeathCause::Dehydration,
        DeathCause::Hyperthermia,
        DeathCause::Exhaustion,
        DeathCause::Predation,
        DeathCause::Drowning,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DeathCause::OldAge => "Old Age",
            DeathCause::Starvation => "Starvation",
            DeathCause::Dehydration => "Dehydration",
            DeathCause::Hyperthermia => "Hyperthermia",
            DeathCause::Exhaustion => "Exhaustion",
            DeathCause::Predation => "Predation",
            DeathCause::Drowning => "Drowning",
        }
    }
}

impl std::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Heritable traits passed from parents to offspring
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub speed: f64,
    pub strength: f64,
    pub agility: f64,
    pub wisdom: f64,
    pub intelligence: f64,
    pub fertility: f64,
    pub immune_system: f64,
    pub sensory_perception: f64,
    pub color: Color,
}

impl Genome {
    /// Random traits for an animal created at world initialization
    pub fn founder(species: Species, rng: &mut impl Rng) -> Self {
        let immune_system = match species {
            Species::Herbivore => rng.gen_range(0.5..=1.5),
            Species::Predator => rng.gen_range(1.0..=2.0),
        };
        Self {
            speed: rng.gen_range(0.5..=1.5),
            strength: rng.gen_range(0.5..=1.5),
            agility: rng.gen_range(0.5..=1.5),
            wisdom: rng.gen_range(0.5..=1.5),
            intelligence: rng.gen_range(0.5..=1.5),
            fertility: rng.gen_range(0.5..=1.5),
            immune_system,
            sensory_perception: rng.gen_range(0.5..=1.5),
            color: species.color(),
        }
    }

    /// Per-trait parent average plus uniform jitter
    pub fn inherit(mother: &Genome, father: &Genome, rng: &mut impl Rng) -> Self {
        let mut mix = |a: f64, b: f64| (a + b) / 2.0 + rng.gen_range(-TRAIT_MUTATION..=TRAIT_MUTATION);

        let speed = mix(mother.speed, father.speed);
        let strength = mix(mother.strength, father.strength);
        let agility = mix(mother.agility, father.agility);
        let wisdom = mix(mother.wisdom, father.wisdom);
        let intelligence = mix(mother.intelligence, father.intelligence);
        let fertility = mix(mother.fertility, father.fertility).clamp(0.0, MAX_FERTILITY);
        let immune_system = mix(mother.immune_system, father.immune_system);
        let sensory_perception = mix(mother.sensory_perception, father.sensory_perception);

        Self {
            speed,
            strength,
            agility,
            wisdom,
            intelligence,
            fertility,
            immune_system,
            sensory_perception,
            color: mix_color(mother.color, father.color, rng),
        }
    }
}

/// Channel average plus integer jitter, clamped to the byte range
pub fn mix_color(a: Color, b: Color, rng: &mut impl Rng) -> Color {
    let mut out = [0u8; 3];
    for (i, channel) in out.iter_mut().enumerate() {
        let avg = (i32::from(a[i]) + i32::from(b[i])) / 2;
        let jitter = rng.gen_range(-COLOR_MUTATION..=COLOR_MUTATION);
        *channel = (avg + jitter).clamp(0, 255) as u8;
    }
    out
}

/// Predator hunting success rate from speed, clamped to [0, 1]
#[inline]
pub fn hunting_success_rate(speed: f64) -> f64 {
    (0.2 + (speed - 3.5)).clamp(0.0, 1.0)
}

/// An animal in the simulation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Animal {
    // Identity
    pub id: AnimalId,
    pub species: Species,
    pub sex: Sex,
    pub color: Color,

    // Position
    pub row: usize,
    pub col: usize,

    // Traits
    pub speed: f64,
    pub strength: f64,
    pub agility: f64,
    pub wisdom: f64,
    pub intelligence: f64,
    pub fertility: f64,
    pub immune_system: f64,
    pub sensory_perception: f64,
    /// Zero for herbivores
    pub hunting_success_rate: f64,

    // Lifecycle
    pub age: u32,
    pub max_age: u32,
    pub is_adult: bool,
    pub is_dead: bool,
    pub cause_of_death: Option<DeathCause>,
    pub decay: f64,

    // Needs and physiology
    pub hunger: f64,
    pub thirst: f64,
    pub energy: f64,
    pub body_temperature: f64,
    pub colon_fill: f64,
    pub bladder_fill: f64,

    // Reproduction
    pub is_pregnant: bool,
    pub gestation_remaining: u32,
    pub reproduction_cooldown: u32,
    pub reproductive_day: u32,
    /// Father's traits, held from conception until birth
    pub sire: Option<Genome>,
}

impl Animal {
    fn from_genome(
        id: AnimalId,
        species: Species,
        row: usize,
        col: usize,
        genome: Genome,
        age: u32,
        rng: &mut impl Rng,
    ) -> Self {
        let hunting_success_rate = match species {
            Species::Predator => hunting_success_rate(genome.speed),
            Species::Herbivore => 0.0,
        };

        Self {
            id,
            species,
            sex: Sex::random(rng),
            color: genome.color,
            row,
            col,
            speed: genome.speed,
            strength: genome.strength,
            agility: genome.agility,
            wisdom: genome.wisdom,
            intelligence: genome.intelligence,
            fertility: genome.fertility,
            immune_system: genome.immune_system,
            sensory_perception: genome.sensory_perception,
            hunting_success_rate,
            age,
            max_age: rng.gen_range(50..=100),
            is_adult: age >= ADULT_AGE,
            is_dead: false,
            cause_of_death: None,
            decay: 100.0,
            hunger: 0.0,
            thirst: 0.0,
            energy: 100.0,
            body_temperature: 37.0,
            colon_fill: 0.0,
            bladder_fill: 0.0,
            is_pregnant: false,
            gestation_remaining: 0,
            reproduction_cooldown: 0,
            reproductive_day: rng.gen_range(0..FERTILITY_CYCLE),
            sire: None,
        }
    }

    /// Create a founder with random traits; half start as adults aged 20-40
    pub fn founder(
        id: AnimalId,
        species: Species,
        row: usize,
        col: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let genome = Genome::founder(species, rng);
        let age = if rng.gen_bool(0.5) {
            rng.gen_range(20..=40)
        } else {
            0
        };
        Self::from_genome(id, species, row, col, genome, age, rng)
    }

    /// Create a newborn from both parents' genomes
    pub fn offspring(
        id: AnimalId,
        species: Species,
        row: usize,
        col: usize,
        mother: &Genome,
        father: &Genome,
        rng: &mut impl Rng,
    ) -> Self {
        let genome = Genome::inherit(mother, father, rng);
        Self::from_genome(id, species, row, col, genome, 0, rng)
    }

    /// This animal's heritable traits
    pub fn genome(&self) -> Genome {
        Genome {
            speed: self.speed,
            strength: self.strength,
            agility: self.agility,
            wisdom: self.wisdom,
            intelligence: self.intelligence,
            fertility: self.fertility,
            immune_system: self.immune_system,
            sensory_perception: self.sensory_perception,
            color: self.color,
        }
    }

    #[inline]
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Advance the fertility cycle; days 7-14 raise fertility, other days lower it.
    pub fn update_fertility(&mut self) {
        if self.sex != Sex::Female {
            return;
        }
        self.reproductive_day = (self.reproductive_day + 1) % FERTILITY_CYCLE;
        self.fertility = if (7..=14).contains(&self.reproductive_day) {
            (self.fertility + 1.0).min(MAX_FERTILITY)
        } else {
            (self.fertility - 1.0).max(0.0)
        };
    }

    /// Empty colon and bladder
    pub fn eliminate_waste(&mut self) {
        self.colon_fill = 0.0;
        self.bladder_fill = 0.0;
    }

    /// Age, grow needs, check death, regenerate energy.
    ///
    /// Returns the cause when the animal dies during this call.
    pub fn handle_vital_stats(&mut self) -> Option<DeathCause> {
        if self.is_dead {
            return None;
        }

        self.age += 1;
        if self.age >= ADULT_AGE {
            self.is_adult = true;
        }
        self.hunger = (self.hunger + NEED_INCREASE).min(100.0);
        self.thirst = (self.thirst + NEED_INCREASE).min(100.0);

        if let Some(cause) = self.death_check() {
            self.die(cause);
            return Some(cause);
        }

        if self.hunger < 100.0 {
            self.energy = (self.energy + ENERGY_REGEN).min(100.0);
        }
        None
    }

    /// First satisfied death condition, in priority order
    pub fn death_check(&self) -> Option<DeathCause> {
        if self.age >= self.max_age {
            Some(DeathCause::OldAge)
        } else if self.hunger >= 100.0 {
            Some(DeathCause::Starvation)
        } else if self.thirst >= 100.0 {
            Some(DeathCause::Dehydration)
        } else if self.body_temperature >= HYPERTHERMIA {
            Some(DeathCause::Hyperthermia)
        } else if self.energy <= 0.0 {
            Some(DeathCause::Exhaustion)
        } else {
            None
        }
    }

    /// Mark the animal dead. Later calls keep the first cause.
    pub fn die(&mut self, cause: DeathCause) {
        if self.is_dead {
            return;
        }
        self.is_dead = true;
        self.cause_of_death = Some(cause);
        self.is_pregnant = false;
        self.sire = None;

        log::debug!(
            "{} {} died from {} (age {}, hunger {:.0}, thirst {:.0}, energy {:.0}, body temp {:.1})",
            self.species,
            self.id,
            cause,
            self.age,
            self.hunger,
            self.thirst,
            self.energy,
            self.body_temperature
        );
    }

    /// Lose decay while dead
    pub fn undergo_decay(&mut self) {
        if self.is_dead {
            self.decay = (self.decay - DECAY_RATE).max(0.0);
        }
    }

    /// Dead and fully decayed
    #[inline]
    pub fn is_decomposed(&self) -> bool {
        self.is_dead && self.decay <= 0.0
    }

    /// Eat food worth `nutrition`
    pub fn eat(&mut self, nutrition: f64) {
        self.hunger = (self.hunger - nutrition).max(0.0);
        self.energy = (self.energy + nutrition).clamp(0.0, 100.0);
        self.colon_fill = (self.colon_fill + COLON_PER_MEAL).min(100.0);
    }

    pub fn drink(&mut self) {
        self.thirst = (self.thirst - DRINK_RELIEF).max(0.0);
        self.bladder_fill = (self.bladder_fill + BLADDER_PER_DRINK).min(100.0);
    }

    /// Lose energy, never below zero
    pub fn spend_energy(&mut self, amount: f64) {
        self.energy = (self.energy - amount).max(0.0);
    }

    /// Can this animal conceive right now?
    pub fn can_reproduce(&self) -> bool {
        !self.is_dead
            && self.sex == Sex::Female
            && self.is_adult
            && !self.is_pregnant
            && self.reproduction_cooldown == 0
            && self.age > ADULT_AGE
            && self.age < 50
            && self.hunger < 20.0
            && self.thirst < 20.0
            && self.fertility >= FERTILITY_THRESHOLD
    }

    /// Is `other` a valid mate for this female?
    pub fn is_valid_mate(&self, other: &Animal) -> bool {
        self.id != other.id
            && !other.is_dead
            && other.is_adult
            && other.species == self.species
            && other.sex != self.sex
            && chebyshev(self.position(), other.position()) <= 1
    }

    /// Become pregnant, keeping the father's traits until birth
    pub fn conceive(&mut self, sire: Genome) {
        self.is_pregnant = true;
        self.gestation_remaining = self.species.gestation_period();
        self.sire = Some(sire);
    }

    /// Count down cooldown and gestation. Returns the sire's genome when birth is due.
    pub fn advance_gestation(&mut self) -> Option<Genome> {
        if self.reproduction_cooldown > 0 {
            self.reproduction_cooldown -= 1;
        }
        if !self.is_pregnant {
            return None;
        }

        self.gestation_remaining = self.gestation_remaining.saturating_sub(1);
        if self.gestation_remaining > 0 {
            return None;
        }

        self.is_pregnant = false;
        self.reproduction_cooldown = BIRTH_COOLDOWN;
        self.sire.take()
    }

    /// Move body temperature 1% toward the ambient temperature
    pub fn drift_body_temperature(&mut self, ambient: f64) {
        self.body_temperature += (ambient - self.body_temperature) * 0.01;
    }

    /// Validate bounded fields
    pub fn check_ranges(&self) -> Result<()> {
        let bounded = [
            ("hunger", self.hunger, 100.0),
            ("thirst", self.thirst, 100.0),
            ("energy", self.energy, 100.0),
            ("decay", self.decay, 100.0),
            ("colon", self.colon_fill, 100.0),
            ("bladder", self.bladder_fill, 100.0),
            ("fertility", self.fertility, MAX_FERTILITY),
        ];
        for (name, value, max) in bounded {
            if !(0.0..=max).contains(&value) {
                return Err(SimError::Invariant(format!(
                    "{} {} has {} = {} outside [0, {}]",
                    self.species, self.id, name, value, max
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.hunting_success_rate) {
            return Err(SimError::Invariant(format!(
                "{} {} has hunting success rate {}",
                self.species, self.id, self.hunting_success_rate
            )));
        }
        Ok(())
    }
}

/// The two species rosters.
///
/// Ids are handed out in increasing order and animals only ever join the
/// end of a roster, so each roster stays sorted by id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Populations {
    pub herbivores: Vec<Animal>,
    pub predators: Vec<Animal>,
}

impl Populations {
    #[inline]
    pub fn roster(&self, species: Species) -> &Vec<Animal> {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Predator => &self.predators,
        }
    }

    #[inline]
    pub fn roster_mut(&mut self, species: Species) -> &mut Vec<Animal> {
        match species {
            Species::Herbivore => &mut self.herbivores,
            Species::Predator => &mut self.predators,
        }
    }

    /// Roster index of an animal, by binary search on id
    pub fn index_of(&self, species: Species, id: AnimalId) -> Option<usize> {
        self.roster(species)
            .binary_search_by_key(&id, |a| a.id)
            .ok()
    }

    pub fn find(&self, species: Species, id: AnimalId) -> Option<&Animal> {
        let idx = self.index_of(species, id)?;
        self.roster(species).get(idx)
    }

    pub fn find_mut(&mut self, species: Species, id: AnimalId) -> Option<&mut Animal> {
        let idx = self.index_of(species, id)?;
        self.roster_mut(species).get_mut(idx)
    }

    pub fn get(&self, id: AnimalId) -> Option<&Animal> {
        Species::ALL.iter().find_map(|&s| self.find(s, id))
    }

    pub fn get_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        let species = Species::ALL
            .into_iter()
            .find(|&s| self.index_of(s, id).is_some())?;
        self.find_mut(species, id)
    }

    /// Whether both rosters are strictly increasing by id
    pub fn is_sorted_by_id(&self) -> bool {
        Species::ALL
            .iter()
            .all(|&s| self.roster(s).windows(2).all(|w| w[0].id < w[1].id))
    }

    /// Herbivores then predators
    pub fn iter(&self) -> impl Iterator<Item = &Animal> {
        self.herbivores.iter().chain(self.predators.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Animal> {
        self.herbivores.iter_mut().chain(self.predators.iter_mut())
    }

    pub fn living(&self, species: Species) -> usize {
        self.roster(species).iter().filter(|a| a.is_alive()).count()
    }

    pub fn len(&self) -> usize {
        self.herbivores.len() + self.predators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.herbivores.is_empty() && self.predators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn adult(id: AnimalId, species: Species, sex: Sex) -> Animal {
        let mut rng = rng();
        let mut animal = Animal::founder(id, species, 5, 5, &mut rng);
        animal.sex = sex;
        animal.age = 25;
        animal.max_age = 90;
        animal.is_adult = true;
        animal
    }

    fn fertile_female(id: AnimalId) -> Animal {
        let mut female = adult(id, Species::Herbivore, Sex::Female);
        female.fertility = 9.0;
        female
    }

    #[test]
    fn test_founder_ranges() {
        let mut rng = rng();
        for id in 0..200 {
            let animal = Animal::founder(id, Species::Predator, 0, 0, &mut rng);
            assert!(animal.age == 0 || (20..=40).contains(&animal.age));
            assert_eq!(animal.is_adult, animal.age >= ADULT_AGE);
            assert!((50..=100).contains(&animal.max_age));
            assert!((1.0..=2.0).contains(&animal.immune_system));
            assert!((0.5..=1.5).contains(&animal.speed));
            assert_eq!(animal.color, [255, 0, 0]);
            assert_eq!(animal.energy, 100.0);
            assert!(animal.reproductive_day < FERTILITY_CYCLE);
        }
    }

    #[test]
    fn test_hunting_rate_clamped() {
        assert_eq!(hunting_success_rate(1.0), 0.0);
        assert!((hunting_success_rate(3.8) - 0.5).abs() < 1e-9);
        assert_eq!(hunting_success_rate(9.0), 1.0);
    }

    #[test]
    fn test_starvation_is_only_cause() {
        let mut animal = adult(1, Species::Herbivore, Sex::Male);
        animal.hunger = 100.0;

        assert_eq!(animal.handle_vital_stats(), Some(DeathCause::Starvation));
        assert!(animal.is_dead);
        assert_eq!(animal.cause_of_death, Some(DeathCause::Starvation));
    }

    #[test]
    fn test_death_priority() {
        let mut animal = adult(1, Species::Herbivore, Sex::Male);
        animal.age = animal.max_age;
        animal.thirst = 95.0;
        assert_eq!(animal.handle_vital_stats(), Some(DeathCause::OldAge));

        let mut animal = adult(2, Species::Herbivore, Sex::Male);
        animal.energy = 0.0;
        assert_eq!(animal.death_check(), Some(DeathCause::Exhaustion));

        let mut animal = adult(3, Species::Predator, Sex::Female);
        animal.body_temperature = 42.0;
        assert_eq!(animal.death_check(), Some(DeathCause::Hyperthermia));
    }

    #[test]
    fn test_vitals_progression() {
        let mut animal = adult(1, Species::Herbivore, Sex::Male);
        animal.age = 19;
        animal.is_adult = false;
        animal.energy = 50.0;

        assert_eq!(animal.handle_vital_stats(), None);
        assert!(animal.is_adult);
        assert_eq!(animal.hunger, 10.0);
        assert_eq!(animal.thirst, 10.0);
        assert_eq!(animal.energy, 55.0);
    }

    #[test]
    fn test_die_keeps_first_cause() {
        let mut animal = adult(1, Species::Herbivore, Sex::Male);
        animal.die(DeathCause::Predation);
        animal.die(DeathCause::OldAge);
        assert_eq!(animal.cause_of_death, Some(DeathCause::Predation));
        assert_eq!(animal.handle_vital_stats(), None);
    }

    #[test]
    fn test_decay() {
        let mut animal = adult(1, Species::Herbivore, Sex::Male);
        animal.undergo_decay();
        assert_eq!(animal.decay, 100.0);

        animal.die(DeathCause::Starvation);
        let mut last = animal.decay;
        for _ in 0..19 {
            animal.undergo_decay();
            assert!(animal.decay < last);
            last = animal.decay;
            assert!(!animal.is_decomposed());
        }
        animal.undergo_decay();
        assert_eq!(animal.decay, 0.0);
        assert!(animal.is_decomposed());
    }

    #[test]
    fn test_fertility_cycle_bounds() {
        let mut female = adult(1, Species::Herbivore, Sex::Female);
        female.fertility = 9.5;
        for _ in 0..200 {
            female.update_fertility();
            assert!((0.0..=MAX_FERTILITY).contains(&female.fertility));
        }

        let mut male = adult(2, Species::Herbivore, Sex::Male);
        let before = male.fertility;
        male.update_fertility();
        assert_eq!(male.fertility, before);
    }

    #[test]
    fn test_fertility_peak_window() {
        let mut female = adult(1, Species::Herbivore, Sex::Female);
        female.reproductive_day = 6;
        female.fertility = 2.0;
        female.update_fertility();
        assert_eq!(female.reproductive_day, 7);
        assert_eq!(female.fertility, 3.0);

        female.reproductive_day = 14;
        female.update_fertility();
        assert_eq!(female.fertility, 2.0);
    }

    #[test]
    fn test_waste_elimination() {
        let mut animal = adult(1, Species::Herbivore, Sex::Male);
        animal.eat(30.0);
        animal.drink();
        assert!(animal.colon_fill > 0.0);
        assert!(animal.bladder_fill > 0.0);

        animal.eliminate_waste();
        assert_eq!(animal.colon_fill, 0.0);
        assert_eq!(animal.bladder_fill, 0.0);
    }

    #[test]
    fn test_eat_and_drink() {
        let mut animal = adult(1, Species::Herbivore, Sex::Male);
        animal.hunger = 50.0;
        animal.thirst = 40.0;
        animal.energy = 90.0;

        animal.eat(30.0);
        animal.drink();

        assert_eq!(animal.hunger, 20.0);
        assert_eq!(animal.energy, 100.0);
        assert_eq!(animal.colon_fill, COLON_PER_MEAL);
        assert_eq!(animal.thirst, 0.0);
        assert_eq!(animal.bladder_fill, BLADDER_PER_DRINK);
    }

    #[test]
    fn test_reproduction_eligibility() {
        let female = fertile_female(1);
        assert!(female.can_reproduce());

        let mut young = fertile_female(2);
        young.age = 20;
        assert!(!young.can_reproduce());

        let mut hungry = fertile_female(3);
        hungry.hunger = 20.0;
        assert!(!hungry.can_reproduce());

        let mut infertile = fertile_female(4);
        infertile.fertility = 7.9;
        assert!(!infertile.can_reproduce());

        let male = adult(5, Species::Herbivore, Sex::Male);
        assert!(!male.can_reproduce());
    }

    #[test]
    fn test_mate_validity() {
        let female = fertile_female(1);
        let male = adult(2, Species::Herbivore, Sex::Male);
        assert!(female.is_valid_mate(&male));

        let other_female = adult(3, Species::Herbivore, Sex::Female);
        assert!(!female.is_valid_mate(&other_female));

        let predator = adult(4, Species::Predator, Sex::Male);
        assert!(!female.is_valid_mate(&predator));

        let mut far = adult(5, Species::Herbivore, Sex::Male);
        far.row += 2;
        assert!(!female.is_valid_mate(&far));

        let mut juvenile = adult(6, Species::Herbivore, Sex::Male);
        juvenile.is_adult = false;
        assert!(!female.is_valid_mate(&juvenile));
    }

    #[test]
    fn test_gestation_and_birth() {
        let mut female = fertile_female(1);
        let male = adult(2, Species::Herbivore, Sex::Male);
        female.conceive(male.genome());
        assert_eq!(female.gestation_remaining, 20);

        for _ in 0..19 {
            assert!(female.advance_gestation().is_none());
        }
        let sire = female.advance_gestation();
        assert_eq!(sire, Some(male.genome()));
        assert!(!female.is_pregnant);
        assert_eq!(female.reproduction_cooldown, BIRTH_COOLDOWN);
        assert!(!female.can_reproduce());
    }

    #[test]
    fn test_offspring_traits_near_parent_average() {
        let mut rng = rng();
        let mother = Genome::founder(Species::Herbivore, &mut rng);
        let father = Genome::founder(Species::Herbivore, &mut rng);
        let child = Animal::offspring(10, Species::Herbivore, 1, 1, &mother, &father, &mut rng);

        let avg = (mother.speed + father.speed) / 2.0;
        assert!((child.speed - avg).abs() <= TRAIT_MUTATION + 1e-12);
        assert_eq!(child.age, 0);
        assert!(!child.is_adult);
        for i in 0..3 {
            let avg = (i32::from(mother.color[i]) + i32::from(father.color[i])) / 2;
            assert!((i32::from(child.color[i]) - avg).abs() <= COLOR_MUTATION);
        }
    }

    #[test]
    fn test_color_clamped() {
        let mut rng = rng();
        for _ in 0..50 {
            let c = mix_color([255, 0, 255], [255, 0, 255], &mut rng);
            assert!(c[0] >= 245);
            assert!(c[1] <= 10);
        }
    }

    #[test]
    fn test_body_temperature_drift() {
        let mut animal = adult(1, Species::Herbivore, Sex::Male);
        animal.drift_body_temperature(137.0);
        assert!((animal.body_temperature - 38.0).abs() < 1e-9);
    }

    #[test]
    fn test_roster_lookup_by_id() {
        let mut populations = Populations::default();
        for id in [0, 3, 4, 9] {
            populations.herbivores.push(adult(id, Species::Herbivore, Sex::Male));
        }
        for id in [1, 2, 7] {
            populations.predators.push(adult(id, Species::Predator, Sex::Female));
        }

        assert!(populations.is_sorted_by_id());
        assert_eq!(populations.index_of(Species::Herbivore, 9), Some(3));
        assert_eq!(populations.index_of(Species::Herbivore, 2), None);
        assert_eq!(populations.index_of(Species::Predator, 2), Some(1));
        assert_eq!(populations.get(7).map(|a| a.species), Some(Species::Predator));
        assert!(populations.get(5).is_none());

        if let Some(a) = populations.get_mut(4) {
            a.energy = 12.0;
        }
        assert_eq!(populations.find(Species::Herbivore, 4).map(|a| a.energy), Some(12.0));

        populations.herbivores.push(adult(8, Species::Herbivore, Sex::Male));
        assert!(!populations.is_sorted_by_id());
    }
}
