//! Environment of the ecosystem.
//!
//! This module contains:
//! - Terrain grid generation, smoothing and shorelines
//! - Climate and hydrology (temperature, rain, flow, evaporation)
//! - Seasonal cycle

pub mod hydrology;
pub mod seasons;
pub mod terrain;

pub use hydrology::{ClimateConfig, Environment, HydrologyConfig, HydrologyReport};
pub use seasons::{Season, SeasonalSystem, SeasonsConfig};
pub use terrain::{Cell, CellFlags, Terrain, TerrainConfig, TerrainGrid};
