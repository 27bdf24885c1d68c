//! MIDI port discovery and connections

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use thiserror::Error;
use tracing::info;

use crate::config::PortConfig;

const CLIENT_NAME: &str = "midimatrix";

#[derive(Debug, Error)]
pub enum MidiIoError {
    #[error("MIDI init error: {0}")]
    Init(#[from] midir::InitError),
    #[error("MIDI port info error: {0}")]
    PortInfo(#[from] midir::PortInfoError),
    #[error("MIDI connect error: {0}")]
    Connect(String),
    #[error("MIDI send error: {0}")]
    Send(#[from] midir::SendError),
    #[error("no MIDI {direction} port matching '{pattern}'")]
    NoSuchPort { direction: &'static str, pattern: String },
    #[error("virtual MIDI ports are not supported here; name a {0} port")]
    VirtualUnsupported(&'static str),
}

/// Destination for outgoing MIDI bytes
pub trait MidiSink: Send + 'static {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiIoError>;
}

impl MidiSink for MidiOutputConnection {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiIoError> {
        MidiOutputConnection::send(self, message)?;
        Ok(())
    }
}

/// Names of all input and output ports
pub fn list_ports() -> Result<(Vec<String>, Vec<String>), MidiIoError> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;
    let inputs = midi_in.ports().iter().map(|p| midi_in.port_name(p)).collect::<Result<_, _>>()?;

    let midi_out = MidiOutput::new(CLIENT_NAME)?;
    let outputs = midi_out.ports().iter().map(|p| midi_out.port_name(p)).collect::<Result<_, _>>()?;

    Ok((inputs, outputs))
}

pub fn open_output(ports: &PortConfig) -> Result<MidiOutputConnection, MidiIoError> {
    let midi_out = MidiOutput::new(CLIENT_NAME)?;

    let Some(pattern) = ports.output.as_deref() else {
        return create_virtual_output(midi_out);
    };

    let port = midi_out
        .ports()
        .into_iter()
        .find(|p| midi_out.port_name(p).is_ok_and(|n| n.contains(pattern)))
        .ok_or_else(|| MidiIoError::NoSuchPort { direction: "output", pattern: pattern.to_string() })?;
    let name = midi_out.port_name(&port)?;

    let conn = midi_out
        .connect(&port, &format!("{CLIENT_NAME}-out"))
        .map_err(|e| MidiIoError::Connect(e.to_string()))?;
    info!(port = %name, "connected MIDI output");
    Ok(conn)
}

/// Connect an input port and feed every message to `on_message` on midir's
/// callback thread
pub fn open_input<F>(ports: &PortConfig, on_message: F) -> Result<MidiInputConnection<()>, MidiIoError>
where
    F: FnMut(&[u8]) + Send + 'static,
{
    let mut midi_in = MidiInput::new(CLIENT_NAME)?;
    // Realtime transport messages are needed for resets
    midi_in.ignore(Ignore::SysexAndActiveSense);

    let mut on_message = on_message;
    let callback = move |_stamp: u64, message: &[u8], _: &mut ()| on_message(message);

    let Some(pattern) = ports.input.as_deref() else {
        return create_virtual_input(midi_in, callback);
    };

    let port = midi_in
        .ports()
        .into_iter()
        .find(|p| midi_in.port_name(p).is_ok_and(|n| n.contains(pattern)))
        .ok_or_else(|| MidiIoError::NoSuchPort { direction: "input", pattern: pattern.to_string() })?;
    let name = midi_in.port_name(&port)?;

    let conn = midi_in
        .connect(&port, &format!("{CLIENT_NAME}-in"), callback, ())
        .map_err(|e| MidiIoError::Connect(e.to_string()))?;
    info!(port = %name, "connected MIDI input");
    Ok(conn)
}

#[cfg(unix)]
fn create_virtual_output(midi_out: MidiOutput) -> Result<MidiOutputConnection, MidiIoError> {
    use midir::os::unix::VirtualOutput;

    let conn = midi_out.create_virtual(CLIENT_NAME).map_err(|e| MidiIoError::Connect(e.to_string()))?;
    info!(port = CLIENT_NAME, "created virtual MIDI output");
    Ok(conn)
}

#[cfg(not(unix))]
fn create_virtual_output(_midi_out: MidiOutput) -> Result<MidiOutputConnection, MidiIoError> {
    Err(MidiIoError::VirtualUnsupported("output"))
}

#[cfg(unix)]
fn create_virtual_input<C>(midi_in: MidiInput, callback: C) -> Result<MidiInputConnection<()>, MidiIoError>
where
    C: FnMut(u64, &[u8], &mut ()) + Send + 'static,
{
    use midir::os::unix::VirtualInput;

    let conn = midi_in
        .create_virtual(CLIENT_NAME, callback, ())
        .map_err(|e| MidiIoError::Connect(e.to_string()))?;
    info!(port = CLIENT_NAME, "created virtual MIDI input");
    Ok(conn)
}

#[cfg(not(unix))]
fn create_virtual_input<C>(_midi_in: MidiInput, _callback: C) -> Result<MidiInputConnection<()>, MidiIoError>
where
    C: FnMut(u64, &[u8], &mut ()) + Send + 'static,
{
    Err(MidiIoError::VirtualUnsupported("input"))
}
