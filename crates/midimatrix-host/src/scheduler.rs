//! Output thread: sends MIDI now or at a later instant
//!
//! Every delayed message is an independent one-shot job. Jobs are never
//! merged or cancelled, so two releases scheduled for the same pitch both
//! fire. When every handle is dropped the pending jobs are flushed at once,
//! leaving no note hanging.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use midimatrix_core::RawMessage;
use tracing::{debug, warn};

use crate::midi_io::MidiSink;

#[derive(Debug, Clone, Copy)]
pub enum OutputJob {
    Now(RawMessage),
    At(Instant, RawMessage),
}

/// Cheap handle for queueing output from the event thread
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: Sender<OutputJob>,
}

impl SchedulerHandle {
    pub(crate) fn new(tx: Sender<OutputJob>) -> Self {
        Self { tx }
    }

    pub fn send_now(&self, message: RawMessage) {
        if self.tx.send(OutputJob::Now(message)).is_err() {
            warn!("output thread gone, dropping message");
        }
    }

    pub fn send_at(&self, due: Instant, message: RawMessage) {
        if self.tx.send(OutputJob::At(due, message)).is_err() {
            warn!("output thread gone, dropping delayed message");
        }
    }
}

pub struct OutputScheduler {
    thread: JoinHandle<()>,
}

impl OutputScheduler {
    /// Spawn the output thread. It runs until every handle has been dropped.
    pub fn start<S: MidiSink>(sink: S) -> std::io::Result<(Self, SchedulerHandle)> {
        let (tx, rx) = unbounded();
        let thread = thread::Builder::new()
            .name("midimatrix-output".into())
            .spawn(move || run(sink, rx))?;
        Ok((Self { thread }, SchedulerHandle::new(tx)))
    }

    /// Wait for the output thread to flush and exit
    pub fn join(self) {
        if self.thread.join().is_err() {
            warn!("output thread panicked");
        }
    }
}

struct Pending {
    due: Instant,
    seq: u64,
    message: RawMessage,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the earliest job, FIFO among equal instants
impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other.due.cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
    }
}

fn emit<S: MidiSink>(sink: &mut S, message: &RawMessage) {
    if let Err(e) = sink.send(message.as_bytes()) {
        warn!(error = %e, "failed to send MIDI message");
    }
}

fn run<S: MidiSink>(mut sink: S, rx: Receiver<OutputJob>) {
    let mut pending: BinaryHeap<Pending> = BinaryHeap::new();
    let mut seq = 0u64;

    loop {
        let job = match pending.peek() {
            Some(next) => match rx.recv_timeout(next.due.saturating_duration_since(Instant::now())) {
                Ok(job) => Some(job),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(job) => Some(job),
                Err(_) => break,
            },
        };

        match job {
            Some(OutputJob::Now(message)) => emit(&mut sink, &message),
            Some(OutputJob::At(due, message)) => {
                pending.push(Pending { due, seq, message });
                seq += 1;
            }
            None => {}
        }

        let now = Instant::now();
        while pending.peek().is_some_and(|p| p.due <= now) {
            if let Some(p) = pending.pop() {
                emit(&mut sink, &p.message);
            }
        }
    }

    if !pending.is_empty() {
        debug!(count = pending.len(), "flushing pending releases");
    }
    while let Some(p) = pending.pop() {
        emit(&mut sink, &p.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::midi_io::MidiIoError;

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<(Instant, Vec<u8>)>>>,
    }

    impl MidiSink for RecordingSink {
        fn send(&mut self, message: &[u8]) -> Result<(), MidiIoError> {
            self.sent.lock().unwrap().push((Instant::now(), message.to_vec()));
            Ok(())
        }
    }

    impl RecordingSink {
        fn messages(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }
    }

    fn msg(bytes: &[u8]) -> RawMessage {
        RawMessage::new(bytes)
    }

    #[test]
    fn test_delayed_after_immediate() {
        let sink = RecordingSink::default();
        let (scheduler, handle) = OutputScheduler::start(sink.clone()).unwrap();

        let start = Instant::now();
        handle.send_at(start + Duration::from_millis(40), msg(&[0x80, 60, 0]));
        handle.send_now(msg(&[0x90, 60, 100]));
        thread::sleep(Duration::from_millis(150));

        assert_eq!(sink.messages(), vec![vec![0x90, 60, 100], vec![0x80, 60, 0]]);
        let released_at = sink.sent.lock().unwrap()[1].0;
        assert!(released_at >= start + Duration::from_millis(40));

        drop(handle);
        scheduler.join();
    }

    #[test]
    fn test_due_order_and_fifo_ties() {
        let sink = RecordingSink::default();
        let (scheduler, handle) = OutputScheduler::start(sink.clone()).unwrap();

        let due = Instant::now() + Duration::from_millis(30);
        handle.send_at(due + Duration::from_millis(20), msg(&[0x80, 64, 0]));
        handle.send_at(due, msg(&[0x80, 60, 0]));
        handle.send_at(due, msg(&[0x80, 62, 0]));
        thread::sleep(Duration::from_millis(150));

        assert_eq!(sink.messages(), vec![vec![0x80, 60, 0], vec![0x80, 62, 0], vec![0x80, 64, 0]]);
        drop(handle);
        scheduler.join();
    }

    #[test]
    fn test_overlapping_releases_both_fire() {
        let sink = RecordingSink::default();
        let (scheduler, handle) = OutputScheduler::start(sink.clone()).unwrap();

        let now = Instant::now();
        handle.send_at(now + Duration::from_millis(20), msg(&[0x80, 60, 0]));
        handle.send_at(now + Duration::from_millis(30), msg(&[0x80, 60, 0]));
        drop(handle);
        scheduler.join();

        assert_eq!(sink.messages().len(), 2);
    }

    #[test]
    fn test_shutdown_flushes_pending() {
        let sink = RecordingSink::default();
        let (scheduler, handle) = OutputScheduler::start(sink.clone()).unwrap();

        handle.send_at(Instant::now() + Duration::from_secs(60), msg(&[0x80, 72, 0]));
        let start = Instant::now();
        drop(handle);
        scheduler.join();

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(sink.messages(), vec![vec![0x80, 72, 0]]);
    }
}
