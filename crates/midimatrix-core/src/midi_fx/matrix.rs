//! Modulation matrix: routes classified MIDI values to scaled targets

use tracing::trace;

use super::{impl_midi_fx_boilerplate, MidiFxParam};
use crate::config::{InputSource, MatrixConfig, ScaleCurve, CONTROLLER_BASE};
use crate::error::Result;
use crate::event::{FxOutput, MidiEvent, TargetEvent};
use crate::scale::{scale_value, PITCH_BEND_RANGE, SEVEN_BIT_RANGE};

/// Resolution of the value an input slot extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    SevenBit,
    PitchBend,
}

impl ValueKind {
    fn input_range(self) -> (f32, f32) {
        match self {
            Self::SevenBit => SEVEN_BIT_RANGE,
            Self::PitchBend => PITCH_BEND_RANGE,
        }
    }
}

/// Value extracted from `event` if it matches `source`
fn classify(source: InputSource, event: &MidiEvent) -> Option<(f32, ValueKind)> {
    match (source, *event) {
        (InputSource::Note, MidiEvent::NoteOn { pitch, .. }) => Some((pitch as f32, ValueKind::SevenBit)),
        (InputSource::Velocity, MidiEvent::NoteOn { velocity, .. }) => {
            Some((velocity as f32, ValueKind::SevenBit))
        }
        (InputSource::Pressure, MidiEvent::ChannelPressure { value, .. }) => {
            Some((value as f32, ValueKind::SevenBit))
        }
        (InputSource::Controller(cc), MidiEvent::ControlChange { controller, value, .. }) if cc == controller => {
            Some((value as f32, ValueKind::SevenBit))
        }
        (InputSource::Pitchbend, MidiEvent::PitchBend { value, .. }) => Some((value as f32, ValueKind::PitchBend)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct MatrixFx {
    params: Vec<MidiFxParam>,
    bypass: bool,
    config: MatrixConfig,
}

impl MatrixFx {
    pub fn new(config: MatrixConfig) -> Result<Self> {
        config.validate()?;

        let mut params = vec![
            MidiFxParam::toggle("block_cc", config.block_cc_passthrough),
            MidiFxParam::toggle("logarithmic", config.curve == ScaleCurve::Logarithmic),
        ];
        let menu_max = (CONTROLLER_BASE + 127) as f32;
        for (i, source) in config.inputs.iter().enumerate() {
            let input = i + 1;
            params.push(MidiFxParam::new(&format!("input_type_{input}"), source.menu_index() as f32, 0.0, menu_max));
            for target in config.target_span(input) {
                let range = config.targets[target - 1];
                params.push(MidiFxParam::new(&format!("min_{target}"), range.min_percent, 0.0, 100.0));
                params.push(MidiFxParam::new(&format!("max_{target}"), range.max_percent, 0.0, 100.0));
            }
        }

        Ok(Self { params, bypass: false, config })
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    fn apply_param(&mut self, name: &str, value: f32) {
        match name {
            "block_cc" => self.config.block_cc_passthrough = value >= 0.5,
            "logarithmic" => {
                self.config.curve = if value >= 0.5 { ScaleCurve::Logarithmic } else { ScaleCurve::Linear };
            }
            _ => {
                if let Some(input) = indexed(name, "input_type_") {
                    if let Some(slot) = self.config.inputs.get_mut(input - 1) {
                        *slot = InputSource::from_menu_index(value.round() as u32);
                    }
                } else if let Some(target) = indexed(name, "min_") {
                    if let Some(range) = self.config.targets.get_mut(target - 1) {
                        range.min_percent = value;
                    }
                } else if let Some(target) = indexed(name, "max_") {
                    if let Some(range) = self.config.targets.get_mut(target - 1) {
                        range.max_percent = value;
                    }
                }
            }
        }
    }

    fn reset_impl(&mut self) {}

    /// Scale `raw` into every target owned by `input`
    fn route(&self, input: usize, raw: f32, kind: ValueKind, outputs: &mut Vec<FxOutput>) {
        let (input_min, input_max) = kind.input_range();
        for target in self.config.target_span(input) {
            let Some(range) = self.config.targets.get(target - 1) else { break };
            let Some(value) = scale_value(raw, input_min, input_max, range.output_min(), range.output_max()) else {
                continue;
            };
            trace!(input, slot = target, value, "routed");
            outputs.push(FxOutput::Target(TargetEvent { target, value }));
        }
    }

    /// A controller bound to any input is swallowed when CC blocking is on
    fn blocks_passthrough(&self, event: &MidiEvent) -> bool {
        let MidiEvent::ControlChange { controller, .. } = *event else { return false };
        self.config.block_cc_passthrough
            && self.config.inputs.iter().any(|s| *s == InputSource::Controller(controller))
    }

    fn handle_impl(&mut self, event: MidiEvent) -> Vec<FxOutput> {
        let mut outputs = Vec::new();
        for (i, source) in self.config.inputs.iter().enumerate() {
            if let Some((raw, kind)) = classify(*source, &event) {
                self.route(i + 1, raw, kind, &mut outputs);
            }
        }
        if !self.blocks_passthrough(&event) {
            outputs.push(FxOutput::Midi(event));
        }
        outputs
    }
}

/// 1-based index following `prefix` in a parameter name
fn indexed(name: &str, prefix: &str) -> Option<usize> {
    name.strip_prefix(prefix)?.parse().ok().filter(|&i| i >= 1)
}

impl_midi_fx_boilerplate!(MatrixFx, "Matrix");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetRange;
    use crate::midi_fx::MidiFx;

    fn targets(outputs: &[FxOutput]) -> Vec<(usize, f32)> {
        outputs
            .iter()
            .filter_map(|o| match o {
                FxOutput::Target(t) => Some((t.target, t.value)),
                _ => None,
            })
            .collect()
    }

    fn passed_through(outputs: &[FxOutput], event: MidiEvent) -> bool {
        outputs.contains(&FxOutput::Midi(event))
    }

    fn cc(controller: u8, value: u8) -> MidiEvent {
        MidiEvent::ControlChange { channel: 0, controller, value }
    }

    #[test]
    fn test_routes_only_to_owned_targets() {
        let mut config = MatrixConfig::new(3, 2);
        config.inputs[1] = InputSource::Controller(74);
        let mut fx = MatrixFx::new(config).unwrap();

        let outputs = fx.handle_event(cc(74, 127));
        assert_eq!(targets(&outputs), vec![(3, 1.0), (4, 1.0)]);
        assert!(passed_through(&outputs, cc(74, 127)));
    }

    #[test]
    fn test_each_target_uses_its_own_range() {
        let mut config = MatrixConfig::new(1, 2);
        config.inputs[0] = InputSource::Velocity;
        config.targets[0] = TargetRange { min_percent: 20.0, max_percent: 40.0 };
        config.targets[1] = TargetRange { min_percent: 100.0, max_percent: 0.0 };
        let mut fx = MatrixFx::new(config).unwrap();

        let outputs = fx.handle_event(MidiEvent::NoteOn { channel: 0, pitch: 60, velocity: 0x7F });
        assert_eq!(targets(&outputs), vec![(1, 0.4), (2, 0.0)]);
    }

    #[test]
    fn test_note_and_velocity_slots_both_fire() {
        let mut config = MatrixConfig::new(2, 1);
        config.inputs = vec![InputSource::Note, InputSource::Velocity];
        let mut fx = MatrixFx::new(config).unwrap();

        let outputs = fx.handle_event(MidiEvent::NoteOn { channel: 0, pitch: 0, velocity: 127 });
        assert_eq!(targets(&outputs), vec![(1, 0.0), (2, 1.0)]);
    }

    #[test]
    fn test_pitch_bend_uses_fourteen_bit_range() {
        let mut config = MatrixConfig::new(1, 1);
        config.inputs[0] = InputSource::Pitchbend;
        let mut fx = MatrixFx::new(config).unwrap();

        let low = fx.handle_event(MidiEvent::PitchBend { channel: 0, value: -8192 });
        let high = fx.handle_event(MidiEvent::PitchBend { channel: 0, value: 8191 });
        assert_eq!(targets(&low), vec![(1, 0.0)]);
        assert_eq!(targets(&high), vec![(1, 1.0)]);
    }

    #[test]
    fn test_unmatched_events_only_pass_through() {
        let mut config = MatrixConfig::new(1, 1);
        config.inputs[0] = InputSource::Pressure;
        let mut fx = MatrixFx::new(config).unwrap();

        let note_off = MidiEvent::NoteOff { channel: 0, pitch: 60, velocity: 0 };
        assert_eq!(fx.handle_event(note_off), vec![FxOutput::Midi(note_off)]);

        let outputs = fx.handle_event(MidiEvent::ChannelPressure { channel: 0, value: 127 });
        assert_eq!(targets(&outputs), vec![(1, 1.0)]);
    }

    #[test]
    fn test_block_cc_suppresses_bound_controller_after_routing() {
        let mut config = MatrixConfig::new(2, 1);
        config.inputs[0] = InputSource::Controller(1);
        config.block_cc_passthrough = true;
        let mut fx = MatrixFx::new(config).unwrap();

        let outputs = fx.handle_event(cc(1, 64));
        assert_eq!(targets(&outputs).len(), 1);
        assert!(!passed_through(&outputs, cc(1, 64)));

        // Unbound controllers and other message kinds still pass
        assert!(passed_through(&fx.handle_event(cc(2, 64)), cc(2, 64)));
        let bend = MidiEvent::PitchBend { channel: 0, value: 100 };
        assert!(passed_through(&fx.handle_event(bend), bend));
    }

    #[test]
    fn test_block_cc_off_forwards_everything() {
        let mut config = MatrixConfig::new(1, 1);
        config.inputs[0] = InputSource::Controller(1);
        let mut fx = MatrixFx::new(config).unwrap();
        assert!(passed_through(&fx.handle_event(cc(1, 10)), cc(1, 10)));
    }

    #[test]
    fn test_set_param_rebinds_inputs_and_ranges() {
        let mut fx = MatrixFx::new(MatrixConfig::new(2, 1)).unwrap();
        fx.set_param("input_type_2", 79.0);
        fx.set_param("max_2", 50.0);
        fx.set_param("block_cc", 1.0);
        fx.set_param("no_such_param", 3.0);

        assert_eq!(fx.config().inputs[1], InputSource::Controller(74));
        let outputs = fx.handle_event(cc(74, 127));
        assert_eq!(targets(&outputs), vec![(2, 0.5)]);
        assert!(!passed_through(&outputs, cc(74, 127)));
    }

    #[test]
    fn test_set_param_clamps_percentages() {
        let mut fx = MatrixFx::new(MatrixConfig::new(1, 1)).unwrap();
        fx.set_param("min_1", -20.0);
        fx.set_param("max_1", 250.0);
        assert_eq!(fx.config().targets[0], TargetRange { min_percent: 0.0, max_percent: 100.0 });
    }

    #[test]
    fn test_bypass_forwards_untouched() {
        let mut config = MatrixConfig::new(1, 1);
        config.inputs[0] = InputSource::Controller(1);
        config.block_cc_passthrough = true;
        let mut fx = MatrixFx::new(config).unwrap();
        fx.set_bypass(true);
        assert_eq!(fx.handle_event(cc(1, 5)), vec![FxOutput::Midi(cc(1, 5))]);
    }
}
