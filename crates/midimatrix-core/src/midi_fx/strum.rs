//! Chord strummer: hold a chord, sweep a controller to play its ladder

use tracing::debug;

use super::{impl_midi_fx_boilerplate, MidiFxParam};
use crate::config::StrumConfig;
use crate::error::Result;
use crate::event::{FxOutput, MidiEvent};
use crate::notes::{build_ladder, ActiveNoteSet, HeldNote};

/// Strums the held chord, transposed upwards in `steps` layers, with a
/// controller sweep.
///
/// Every strummed note-on is paired with a [`FxOutput::Delayed`] note-off
/// `note_length_ms` later. Releases are independent: strumming the same pitch
/// twice within one note length schedules two note-offs, the first of which
/// cuts the second note short.
#[derive(Debug, Clone)]
pub struct StrumFx {
    params: Vec<MidiFxParam>,
    bypass: bool,
    config: StrumConfig,
    active: ActiveNoteSet,
    ladder: Vec<HeldNote>,
    last_played: Option<u8>,
}

impl StrumFx {
    pub fn new(config: StrumConfig) -> Result<Self> {
        config.validate()?;

        let (steps_min, steps_max) = StrumConfig::STEPS;
        let (st_min, st_max) = StrumConfig::SEMITONES;
        let (len_min, len_max) = StrumConfig::NOTE_LENGTH_MS;
        let params = vec![
            MidiFxParam::toggle("block_note_and_mod", config.block_note_and_mod_passthrough),
            MidiFxParam::toggle("never_same_note_twice", config.never_same_note_twice),
            MidiFxParam::toggle("fixed_top_bottom", config.fixed_top_bottom),
            MidiFxParam::new("note_length", config.note_length_ms as f32, len_min as f32, len_max as f32),
            MidiFxParam::new("steps", config.steps as f32, steps_min as f32, steps_max as f32),
            MidiFxParam::new("semitones_per_step", config.semitones_per_step as f32, st_min as f32, st_max as f32),
            MidiFxParam::new("strum_cc", config.strum_controller as f32, 0.0, 127.0),
        ];

        Ok(Self {
            params,
            bypass: false,
            config,
            active: ActiveNoteSet::new(),
            ladder: Vec::new(),
            last_played: None,
        })
    }

    pub fn config(&self) -> &StrumConfig {
        &self.config
    }

    pub fn active_notes(&self) -> &ActiveNoteSet {
        &self.active
    }

    pub fn ladder(&self) -> &[HeldNote] {
        &self.ladder
    }

    pub fn last_played(&self) -> Option<u8> {
        self.last_played
    }

    /// Any configuration change is a hard reset
    fn apply_param(&mut self, name: &str, value: f32) {
        let on = value >= 0.5;
        let number = value.round() as u32;
        match name {
            "block_note_and_mod" => self.config.block_note_and_mod_passthrough = on,
            "never_same_note_twice" => self.config.never_same_note_twice = on,
            "fixed_top_bottom" => self.config.fixed_top_bottom = on,
            "note_length" => self.config.note_length_ms = number,
            "steps" => self.config.steps = number,
            "semitones_per_step" => self.config.semitones_per_step = number,
            "strum_cc" => self.config.strum_controller = number as u8,
            _ => return,
        }
        self.reset_impl();
    }

    fn reset_impl(&mut self) {
        self.active.clear();
        self.last_played = None;
        self.rebuild_ladder();
    }

    fn rebuild_ladder(&mut self) {
        self.ladder = build_ladder(self.active.sorted(), self.config.steps, self.config.semitones_per_step);
    }

    /// Ladder entry picked by a gesture value, if any
    fn select(&self, gesture: u8) -> Option<HeldNote> {
        if self.config.fixed_top_bottom {
            match gesture {
                0 => return self.ladder.first().copied(),
                127 => return self.ladder.last().copied(),
                _ => {}
            }
        }
        if self.ladder.is_empty() {
            return None;
        }
        let slot_width = 127 / self.ladder.len();
        if slot_width == 0 {
            return None;
        }
        self.ladder.get(gesture as usize / slot_width).copied()
    }

    fn strum(&mut self, channel: u8, gesture: u8) -> Vec<FxOutput> {
        let Some(note) = self.select(gesture) else {
            return Vec::new();
        };
        if self.config.never_same_note_twice && self.last_played == Some(note.pitch) {
            debug!(pitch = note.pitch, gesture, "repeat suppressed");
            return Vec::new();
        }

        self.last_played = Some(note.pitch);
        vec![
            FxOutput::Midi(MidiEvent::NoteOn { channel, pitch: note.pitch, velocity: note.velocity }),
            FxOutput::Delayed {
                event: MidiEvent::NoteOff { channel, pitch: note.pitch, velocity: 0 },
                delay_ms: self.config.note_length_ms,
            },
        ]
    }

    fn handle_impl(&mut self, event: MidiEvent) -> Vec<FxOutput> {
        let block = self.config.block_note_and_mod_passthrough;
        match event {
            MidiEvent::NoteOn { pitch, velocity, .. } => {
                self.active.add(pitch, velocity);
                self.rebuild_ladder();
                if block { Vec::new() } else { vec![FxOutput::Midi(event)] }
            }
            MidiEvent::NoteOff { pitch, .. } => {
                self.active.remove(pitch);
                self.rebuild_ladder();
                vec![FxOutput::Midi(event)]
            }
            MidiEvent::ControlChange { channel, controller, value } if controller == self.config.strum_controller => {
                let mut outputs = self.strum(channel, value);
                if !block {
                    outputs.push(FxOutput::Midi(event));
                }
                outputs
            }
            _ => vec![FxOutput::Midi(event)],
        }
    }
}

impl_midi_fx_boilerplate!(StrumFx, "Strum");
