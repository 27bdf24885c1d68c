//! midimatrix-core: real-time MIDI transformers
//!
//! Two engines share one shape: externally pushed configuration, a small
//! amount of session state, and a `handle_event` reducer called once per
//! incoming MIDI event.
//!
//! - [`MatrixFx`] classifies note, velocity, pressure, pitch-bend and
//!   controller values per input slot and fans them out, scaled, to the
//!   target slots owned by that input.
//! - [`StrumFx`] tracks held notes, stacks transposed copies of the chord
//!   into a ladder, and plays ladder notes from a controller sweep.

pub mod config;
mod error;
pub mod event;
pub mod midi_fx;
mod notes;
mod scale;

pub use config::{InputSource, MatrixConfig, ScaleCurve, StrumConfig, TargetRange};
pub use error::{ConfigError, DecodeError, MidiMatrixError, Result};
pub use event::{FxOutput, MidiEvent, RawMessage, TargetEvent};
pub use midi_fx::{MatrixFx, MidiEffect, MidiFx, MidiFxChain, MidiFxParam, StrumFx};
pub use notes::{build_ladder, ActiveNoteSet, HeldNote};
pub use scale::scale_value;
