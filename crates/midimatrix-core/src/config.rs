//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// First menu index that selects a controller number
pub const CONTROLLER_BASE: u32 = 5;

/// Source bound to a matrix input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    #[default]
    Off,
    Note,
    Velocity,
    Pitchbend,
    Pressure,
    Controller(u8),
}

impl InputSource {
    /// Map a UI menu index: 0 off, 1 note, 2 velocity, 3 pitchbend,
    /// 4 pressure, 5.. controller `index - 5`.
    pub fn from_menu_index(index: u32) -> Self {
        match index {
            0 => Self::Off,
            1 => Self::Note,
            2 => Self::Velocity,
            3 => Self::Pitchbend,
            4 => Self::Pressure,
            n if n - CONTROLLER_BASE < 128 => Self::Controller((n - CONTROLLER_BASE) as u8),
            _ => Self::Off,
        }
    }

    pub fn menu_index(&self) -> u32 {
        match self {
            Self::Off => 0,
            Self::Note => 1,
            Self::Velocity => 2,
            Self::Pitchbend => 3,
            Self::Pressure => 4,
            Self::Controller(cc) => CONTROLLER_BASE + *cc as u32,
        }
    }
}

/// Output range of one target, stored as percentages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetRange {
    pub min_percent: f32,
    pub max_percent: f32,
}

impl Default for TargetRange {
    fn default() -> Self {
        Self { min_percent: 0.0, max_percent: 100.0 }
    }
}

impl TargetRange {
    pub fn output_min(&self) -> f32 {
        self.min_percent / 100.0
    }

    pub fn output_max(&self) -> f32 {
        self.max_percent / 100.0
    }
}

/// How percentage controls are drawn. Has no effect on scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleCurve {
    #[default]
    Linear,
    Logarithmic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub inputs: Vec<InputSource>,
    pub targets_per_input: usize,
    /// `inputs.len() * targets_per_input` entries; target `t` belongs to
    /// input `ceil(t / targets_per_input)`
    pub targets: Vec<TargetRange>,
    pub block_cc_passthrough: bool,
    pub curve: ScaleCurve,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self::new(4, 1)
    }
}

impl MatrixConfig {
    /// All inputs off, every target spanning 0%..100%
    pub fn new(inputs: usize, targets_per_input: usize) -> Self {
        Self {
            inputs: vec![InputSource::Off; inputs],
            targets_per_input,
            targets: vec![TargetRange::default(); inputs * targets_per_input],
            block_cc_passthrough: false,
            curve: ScaleCurve::Linear,
        }
    }

    pub fn total_targets(&self) -> usize {
        self.inputs.len() * self.targets_per_input
    }

    /// 1-based inclusive range of targets owned by 1-based `input`
    pub fn target_span(&self, input: usize) -> std::ops::RangeInclusive<usize> {
        let max = input * self.targets_per_input;
        let min = max + 1 - self.targets_per_input;
        min..=max
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets_per_input == 0 {
            return Err(ConfigError::NoTargetsPerInput);
        }
        if self.targets.len() != self.total_targets() {
            return Err(ConfigError::TargetCount {
                inputs: self.inputs.len(),
                per_input: self.targets_per_input,
                expected: self.total_targets(),
                got: self.targets.len(),
            });
        }
        for source in &self.inputs {
            if let InputSource::Controller(cc) = *source {
                if cc > 127 {
                    return Err(ConfigError::ControllerOutOfRange(cc));
                }
            }
        }
        for (i, range) in self.targets.iter().enumerate() {
            for (field, value) in [("min", range.min_percent), ("max", range.max_percent)] {
                if !(0.0..=100.0).contains(&value) {
                    return Err(ConfigError::PercentOutOfRange { target: i + 1, field, value });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrumConfig {
    /// Transposed copies stacked above the held chord
    pub steps: u32,
    pub semitones_per_step: u32,
    pub note_length_ms: u32,
    pub never_same_note_twice: bool,
    pub fixed_top_bottom: bool,
    pub block_note_and_mod_passthrough: bool,
    /// Controller that drives the strum (1 = mod wheel)
    pub strum_controller: u8,
}

impl Default for StrumConfig {
    fn default() -> Self {
        Self {
            steps: 3,
            semitones_per_step: 12,
            note_length_ms: 200,
            never_same_note_twice: true,
            fixed_top_bottom: true,
            block_note_and_mod_passthrough: true,
            strum_controller: 1,
        }
    }
}

impl StrumConfig {
    pub const STEPS: (u32, u32) = (1, 24);
    pub const SEMITONES: (u32, u32) = (1, 24);
    pub const NOTE_LENGTH_MS: (u32, u32) = (1, 1000);

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("steps", self.steps, Self::STEPS),
            ("semitones_per_step", self.semitones_per_step, Self::SEMITONES),
            ("note_length_ms", self.note_length_ms, Self::NOTE_LENGTH_MS),
        ];
        for (field, value, (min, max)) in checks {
            if value < min || value > max {
                return Err(ConfigError::StrumOutOfRange { field, value, min, max });
            }
        }
        if self.strum_controller > 127 {
            return Err(ConfigError::ControllerOutOfRange(self.strum_controller));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_index_mapping() {
        assert_eq!(InputSource::from_menu_index(0), InputSource::Off);
        assert_eq!(InputSource::from_menu_index(3), InputSource::Pitchbend);
        assert_eq!(InputSource::from_menu_index(5), InputSource::Controller(0));
        assert_eq!(InputSource::from_menu_index(6), InputSource::Controller(1));
        assert_eq!(InputSource::from_menu_index(132), InputSource::Controller(127));
        assert_eq!(InputSource::from_menu_index(133), InputSource::Off);
        assert_eq!(InputSource::Controller(74).menu_index(), 79);
    }

    #[test]
    fn test_target_span_is_contiguous() {
        let config = MatrixConfig::new(3, 2);
        assert_eq!(config.target_span(1), 1..=2);
        assert_eq!(config.target_span(2), 3..=4);
        assert_eq!(config.target_span(3), 5..=6);
    }

    #[test]
    fn test_matrix_validation() {
        assert!(MatrixConfig::default().validate().is_ok());

        let mut config = MatrixConfig::new(2, 2);
        config.targets.pop();
        assert!(matches!(config.validate(), Err(ConfigError::TargetCount { expected: 4, got: 3, .. })));

        let mut config = MatrixConfig::new(1, 1);
        config.targets[0].max_percent = 120.0;
        assert!(matches!(config.validate(), Err(ConfigError::PercentOutOfRange { target: 1, .. })));

        let config = MatrixConfig::new(1, 0);
        assert_eq!(config.validate(), Err(ConfigError::NoTargetsPerInput));
    }

    #[test]
    fn test_strum_validation() {
        assert!(StrumConfig::default().validate().is_ok());
        let config = StrumConfig { steps: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::StrumOutOfRange { field: "steps", .. })));
    }
}
