//! Commands for steering a running simulation.

use serde::{Deserialize, Serialize};

/// Commands a front end may send between ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimCommand {
    /// Switch between the sine-curve climate and manual temperature control
    ToggleManualTemperature,
    /// Raise ambient temperature by 1 °C (manual control only)
    RaiseTemperature,
    /// Lower ambient temperature by 1 °C (manual control only)
    LowerTemperature,
    /// Set the chance of rain per tick, in percent (0-100)
    SetPrecipitation(f64),
    /// Switch evaporation on or off
    ToggleEvaporation,
}

/// What happened to a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Temperature nudges while the climate is automatic
    IgnoredAutomaticClimate,
}

impl SimCommand {
    /// Map a key to a command (`m`, `+`, `-`, `e`)
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'm' | 'M' => Some(SimCommand::ToggleManualTemperature),
            '+' | '=' => Some(SimCommand::RaiseTemperature),
            '-' | '_' => Some(SimCommand::LowerTemperature),
            'e' | 'E' => Some(SimCommand::ToggleEvaporation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(SimCommand::from_key('m'), Some(SimCommand::ToggleManualTemperature));
        assert_eq!(SimCommand::from_key('+'), Some(SimCommand::RaiseTemperature));
        assert_eq!(SimCommand::from_key('-'), Some(SimCommand::LowerTemperature));
        assert_eq!(SimCommand::from_key('x'), None);
    }
}
