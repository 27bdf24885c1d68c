//! Real-time MIDI effects: the modulation matrix and the chord strummer

mod matrix;
mod strum;

pub use matrix::MatrixFx;
pub use strum::StrumFx;

use serde::{Deserialize, Serialize};

use crate::event::{FxOutput, MidiEvent};

/// Named parameter exposed to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiFxParam {
    pub name: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl MidiFxParam {
    pub fn new(name: &str, value: f32, min: f32, max: f32) -> Self {
        Self { name: name.to_string(), value, min, max }
    }

    pub fn toggle(name: &str, on: bool) -> Self {
        Self::new(name, if on { 1.0 } else { 0.0 }, 0.0, 1.0)
    }
}

/// Trait for MIDI effects.
///
/// `handle_event` runs once per incoming event on the host's event thread and
/// must never fail; impossible requests are dropped rather than reported.
pub trait MidiFx: Send {
    fn name(&self) -> &str;
    fn handle_event(&mut self, event: MidiEvent) -> Vec<FxOutput>;
    fn get_params(&self) -> &[MidiFxParam];
    /// Push a changed parameter. Unknown names are ignored.
    fn set_param(&mut self, name: &str, value: f32);
    /// Drop session state (held notes, last played note)
    fn reset(&mut self);
    fn is_bypassed(&self) -> bool;
    fn set_bypass(&mut self, bypass: bool);
}

/// Implements common MidiFx boilerplate for structs with `params: Vec<MidiFxParam>`
/// and `bypass: bool` fields plus `handle_impl`, `apply_param` and `reset_impl` methods.
/// Usage: `impl_midi_fx_boilerplate!(StructName, "Display Name");`
macro_rules! impl_midi_fx_boilerplate {
    ($ty:ty, $name:expr) => {
        impl super::MidiFx for $ty {
            fn name(&self) -> &str { $name }

            fn get_params(&self) -> &[MidiFxParam] { &self.params }

            fn set_param(&mut self, name: &str, value: f32) {
                let Some(p) = self.params.iter_mut().find(|p| p.name == name) else {
                    tracing::debug!(fx = $name, param = name, "ignoring unknown parameter");
                    return;
                };
                p.value = value.clamp(p.min, p.max);
                let value = p.value;
                tracing::debug!(fx = $name, param = name, value, "parameter changed");
                self.apply_param(name, value);
            }

            fn reset(&mut self) { self.reset_impl(); }

            fn is_bypassed(&self) -> bool { self.bypass }
            fn set_bypass(&mut self, bypass: bool) { self.bypass = bypass; }

            fn handle_event(&mut self, event: MidiEvent) -> Vec<FxOutput> {
                if self.bypass { return vec![FxOutput::Midi(event)]; }
                self.handle_impl(event)
            }
        }
    };
}

pub(crate) use impl_midi_fx_boilerplate;

/// Enum wrapper for all MIDI effects
#[derive(Debug, Clone)]
pub enum MidiEffect {
    Matrix(MatrixFx),
    Strum(StrumFx),
}

impl MidiEffect {
    pub fn name(&self) -> &str {
        match self {
            Self::Matrix(fx) => fx.name(),
            Self::Strum(fx) => fx.name(),
        }
    }

    pub fn handle_event(&mut self, event: MidiEvent) -> Vec<FxOutput> {
        match self {
            Self::Matrix(fx) => fx.handle_event(event),
            Self::Strum(fx) => fx.handle_event(event),
        }
    }

    pub fn get_params(&self) -> &[MidiFxParam] {
        match self {
            Self::Matrix(fx) => fx.get_params(),
            Self::Strum(fx) => fx.get_params(),
        }
    }

    pub fn set_param(&mut self, name: &str, value: f32) {
        match self {
            Self::Matrix(fx) => fx.set_param(name, value),
            Self::Strum(fx) => fx.set_param(name, value),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Matrix(fx) => fx.reset(),
            Self::Strum(fx) => fx.reset(),
        }
    }

    pub fn is_bypassed(&self) -> bool {
        match self {
            Self::Matrix(fx) => fx.is_bypassed(),
            Self::Strum(fx) => fx.is_bypassed(),
        }
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        match self {
            Self::Matrix(fx) => fx.set_bypass(bypass),
            Self::Strum(fx) => fx.set_bypass(bypass),
        }
    }
}

/// MIDI FX Chain
///
/// Immediate MIDI output of each effect feeds the next one. Target values and
/// delayed events leave the chain from the effect that produced them.
#[derive(Debug, Clone, Default)]
pub struct MidiFxChain {
    pub effects: Vec<MidiEffect>,
    pub bypass_all: bool,
}

impl MidiFxChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: MidiEffect) {
        if self.effects.len() < 8 {
            self.effects.push(effect);
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<MidiEffect> {
        if index < self.effects.len() {
            return Some(self.effects.remove(index));
        }
        None
    }

    pub fn handle_event(&mut self, event: MidiEvent) -> Vec<FxOutput> {
        if self.bypass_all { return vec![FxOutput::Midi(event)]; }

        let mut outputs = Vec::new();
        run_from(&mut self.effects, event, &mut outputs);
        outputs
    }

    /// Forward a named parameter change to the first effect with that name
    pub fn set_param(&mut self, effect: &str, name: &str, value: f32) {
        match self.effects.iter_mut().find(|fx| fx.name() == effect) {
            Some(fx) => fx.set_param(name, value),
            None => tracing::debug!(effect, param = name, "no such effect in chain"),
        }
    }

    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Run `event` through `effects`, keeping emission order
fn run_from(effects: &mut [MidiEffect], event: MidiEvent, outputs: &mut Vec<FxOutput>) {
    let Some((effect, rest)) = effects.split_first_mut() else {
        outputs.push(FxOutput::Midi(event));
        return;
    };
    if effect.is_bypassed() {
        return run_from(rest, event, outputs);
    }
    for output in effect.handle_event(event) {
        match output {
            FxOutput::Midi(e) => run_from(rest, e, outputs),
            other => outputs.push(other),
        }
    }
}
