//! Glue between the MIDI input callback, the effect chain and the output thread

use std::time::{Duration, Instant};

use midimatrix_core::{FxOutput, MidiEvent, MidiFxChain, TargetEvent};
use tracing::{debug, trace, warn};

use crate::config::TargetMapping;
use crate::scheduler::SchedulerHandle;

const START: u8 = 0xFA;
const STOP: u8 = 0xFC;
const SYSTEM_RESET: u8 = 0xFF;

pub struct Processor {
    chain: MidiFxChain,
    targets: Vec<TargetMapping>,
    output: SchedulerHandle,
}

impl Processor {
    pub fn new(chain: MidiFxChain, targets: Vec<TargetMapping>, output: SchedulerHandle) -> Self {
        Self { chain, targets, output }
    }

    /// Handle one raw message from the input port
    pub fn handle_message(&mut self, bytes: &[u8]) {
        let now = Instant::now();

        if let Some(&(START | STOP | SYSTEM_RESET)) = bytes.first() {
            debug!(status = bytes[0], "transport reset");
            self.chain.reset();
        }

        let event = match MidiEvent::from_bytes(bytes) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "dropping undecodable message");
                return;
            }
        };

        for output in self.chain.handle_event(event) {
            match output {
                FxOutput::Midi(event) => self.output.send_now(event.to_bytes()),
                FxOutput::Target(target) => self.send_target(target),
                FxOutput::Delayed { event, delay_ms } => {
                    self.output.send_at(now + Duration::from_millis(delay_ms as u64), event.to_bytes());
                }
            }
        }
    }

    /// Send a target value as a controller change, if the target is mapped
    fn send_target(&self, target: TargetEvent) {
        let Some(mapping) = self.targets.iter().find(|m| m.target == target.target) else {
            trace!(slot = target.target, value = target.value, "unmapped target");
            return;
        };
        let value = (target.value.clamp(0.0, 1.0) * 127.0).round() as u8;
        let event = MidiEvent::ControlChange { channel: mapping.channel, controller: mapping.controller, value };
        self.output.send_now(event.to_bytes());
    }
}
