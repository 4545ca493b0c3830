//! Step tracing hooks
//!
//! A [`Tracer`] observes execution without influencing it: the interpreter
//! emits one [`StepEvent`] per opcode, before the opcode is charged or run.

use crate::message::{CallKind, Message};
use crate::result::{ExecResult, ExitStatus};
use cadenza_primitives::U256;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

/// Snapshot of the interpreter before one opcode executes
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepEvent {
    /// Call depth of the frame
    pub depth: usize,
    /// Program counter
    pub pc: usize,
    /// Opcode byte
    pub opcode: u8,
    /// Opcode mnemonic
    pub op_name: &'static str,
    /// Gas left before the step
    pub gas_left: u64,
    /// Static cost of the step
    pub gas_cost: u64,
    /// Stack contents, bottom first
    pub stack: Vec<U256>,
    /// Memory size in bytes
    pub memory_size: usize,
}

/// Receives execution events
pub trait Tracer: Send {
    /// A frame is about to start
    fn on_enter(&mut self, _message: &Message) {}

    /// An opcode is about to execute
    fn on_step(&mut self, event: &StepEvent);

    /// A frame finished
    fn on_exit(&mut self, _depth: usize, _result: &ExecResult) {}
}

/// Frame boundary recorded by [`CollectingTracer`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    /// Frame entered
    Enter {
        /// Depth of the new frame
        depth: usize,
        /// How it was entered
        kind: CallKind,
    },
    /// Frame exited
    Exit {
        /// Depth of the frame
        depth: usize,
        /// How it ended
        status: ExitStatus,
        /// Gas it used
        gas_used: u64,
    },
}

#[derive(Debug, Default)]
struct Collected {
    steps: Vec<StepEvent>,
    frames: Vec<FrameEvent>,
}

/// Tracer that keeps every event in memory.
///
/// Clones share storage, so a caller can keep one clone and inspect it after
/// handing the other to the engine.
#[derive(Clone, Debug, Default)]
pub struct CollectingTracer {
    inner: Arc<Mutex<Collected>>,
}

impl CollectingTracer {
    /// New, empty tracer
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps recorded so far
    pub fn steps(&self) -> Vec<StepEvent> {
        self.inner.lock().steps.clone()
    }

    /// Frame boundaries recorded so far
    pub fn frames(&self) -> Vec<FrameEvent> {
        self.inner.lock().frames.clone()
    }

    /// Mnemonics of the recorded steps, in order
    pub fn op_names(&self) -> Vec<&'static str> {
        self.inner.lock().steps.iter().map(|s| s.op_name).collect()
    }
}

impl Tracer for CollectingTracer {
    fn on_enter(&mut self, message: &Message) {
        self.inner.lock().frames.push(FrameEvent::Enter {
            depth: message.depth,
            kind: message.kind,
        });
    }

    fn on_step(&mut self, event: &StepEvent) {
        self.inner.lock().steps.push(event.clone());
    }

    fn on_exit(&mut self, depth: usize, result: &ExecResult) {
        self.inner.lock().frames.push(FrameEvent::Exit {
            depth,
            status: result.status,
            gas_used: result.gas_used,
        });
    }
}

/// Tracer writing one JSON object per step, newline separated
pub struct JsonTracer<W: Write + Send> {
    out: W,
    failed: bool,
}

impl<W: Write + Send> JsonTracer<W> {
    /// Write to `out`
    pub fn new(out: W) -> Self {
        Self { out, failed: false }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Tracer for JsonTracer<W> {
    fn on_step(&mut self, event: &StepEvent) {
        if self.failed {
            return;
        }
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"));
        if let Err(err) = written {
            // tracing must never abort execution; stop writing instead
            warn!(%err, "json tracer output failed");
            self.failed = true;
        }
    }
}
