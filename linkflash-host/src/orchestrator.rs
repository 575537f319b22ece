//! Flash sequence orchestration
//!
//! [`Orchestrator`] lives on the event-loop thread. A flash request that
//! passes the gate (port selected, form valid, form merged into the
//! document) spawns one worker thread that saves the header, builds and
//! flashes. The worker never touches front-end state: it reports
//! [`WorkerEvent`]s over a channel, and [`Orchestrator::poll`] applies them
//! to the [`FlashState`] machine in order.
//!
//! Only one sequence is in flight at a time; a request while busy is
//! ignored.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use linkflash_core::{ConfigDocument, FailureKind, FlashEvent, FlashState, Form, Outcome};
use log::{debug, error, info, warn};

use crate::error::FlashError;
use crate::runner::{CommandRunner, Step};
use crate::store::ConfigStore;

/// Colour class of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    /// Step in progress
    Working,
    Success,
    Error,
    /// Operator instruction
    Accent,
}

/// One line for the front end's log pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    pub tone: Tone,
}

impl LogLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    /// Red `ERROR: ...` line for a failure
    pub fn error(err: &FlashError) -> Self {
        Self::new(format!("ERROR: {err}"), Tone::Error)
    }
}

/// Worker-to-event-loop message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Log(LogLine),
    Progress(FlashEvent),
}

/// Result of a flash request that passed or skipped the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A worker was spawned
    Started,
    /// A sequence is already in flight
    Ignored,
}

/// Owns the flash state machine and the in-flight worker
pub struct Orchestrator {
    store: Arc<dyn ConfigStore>,
    runner: Arc<dyn CommandRunner>,
    tail_lines: usize,
    state: FlashState,
    last_outcome: Option<Outcome>,
    /// Receiver of the in-flight worker; `Some` while busy
    events: Option<Receiver<WorkerEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        runner: Arc<dyn CommandRunner>,
        tail_lines: usize,
    ) -> Self {
        Self {
            store,
            runner,
            tail_lines,
            state: FlashState::Idle,
            last_outcome: None,
            events: None,
            worker: None,
        }
    }

    pub fn state(&self) -> FlashState {
        self.state
    }

    /// A sequence is in flight and the trigger is disabled
    pub fn is_busy(&self) -> bool {
        self.events.is_some()
    }

    /// How the most recent sequence ended
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Status line text
    ///
    /// After a sequence the machine is back in Idle, but the status keeps
    /// showing the outcome until the next sequence starts.
    pub fn status(&self) -> &'static str {
        match (self.state, self.last_outcome) {
            (FlashState::Idle, Some(outcome)) => FlashState::Done(outcome).status(),
            (state, _) => state.status(),
        }
    }

    /// Start a flash sequence
    ///
    /// Gate failures return an error and leave the state and `doc`
    /// untouched. On success `doc` holds the merged form values and a worker
    /// owns a copy of it.
    pub fn request_flash(
        &mut self,
        port: Option<&str>,
        form: &Form,
        doc: &mut ConfigDocument,
    ) -> Result<Trigger, FlashError> {
        if self.is_busy() {
            debug!("flash request ignored: sequence in flight");
            return Ok(Trigger::Ignored);
        }

        let port = port
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(FlashError::NoPort)?;
        form.validate()?;
        form.apply_to(doc)?;

        let job = Job {
            doc: doc.clone(),
            port: port.to_string(),
            store: Arc::clone(&self.store),
            runner: Arc::clone(&self.runner),
            tail_lines: self.tail_lines,
        };
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("linkflash-worker".into())
            .spawn(move || job.run(tx))
            .map_err(|e| FlashError::Unexpected(format!("cannot start worker: {e}")))?;

        info!("flash sequence started for {port}");
        self.state = self.state.transition(FlashEvent::Start);
        self.last_outcome = None;
        self.events = Some(rx);
        self.worker = Some(handle);
        Ok(Trigger::Started)
    }

    /// Apply whatever the worker has reported so far, without blocking
    pub fn poll(&mut self) -> Vec<WorkerEvent> {
        self.drain(false)
    }

    /// Block until the in-flight sequence (if any) finishes
    pub fn wait(&mut self) -> Vec<WorkerEvent> {
        self.drain(true)
    }

    fn drain(&mut self, blocking: bool) -> Vec<WorkerEvent> {
        let mut drained = Vec::new();
        let Some(rx) = self.events.take() else {
            return drained;
        };

        let mut disconnected = false;
        loop {
            let next = if blocking {
                rx.recv().map_err(|_| TryRecvError::Disconnected)
            } else {
                rx.try_recv()
            };
            match next {
                Ok(event) => {
                    let mut terminal = false;
                    if let WorkerEvent::Progress(progress) = event {
                        self.state = self.state.transition(progress);
                        terminal = progress.is_terminal();
                    }
                    drained.push(event);
                    if terminal {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if disconnected && !self.state.is_done() {
            // Worker vanished without a terminal event
            warn!("worker exited without reporting an outcome");
            let failed = FlashEvent::Failed(FailureKind::Unexpected);
            drained.push(WorkerEvent::Log(LogLine::new(
                "ERROR: worker stopped unexpectedly",
                Tone::Error,
            )));
            drained.push(WorkerEvent::Progress(failed));
            self.state = self.state.transition(failed);
        }

        match self.state {
            FlashState::Done(outcome) => {
                info!("flash sequence finished: {:?}", outcome);
                self.last_outcome = Some(outcome);
                self.state = self.state.transition(FlashEvent::Acknowledge);
                if let Some(handle) = self.worker.take() {
                    if handle.join().is_err() {
                        error!("worker thread panicked after reporting");
                    }
                }
            }
            _ => self.events = Some(rx),
        }
        drained
    }
}

/// Everything a worker needs, moved into its thread
struct Job {
    doc: ConfigDocument,
    port: String,
    store: Arc<dyn ConfigStore>,
    runner: Arc<dyn CommandRunner>,
    tail_lines: usize,
}

/// Sending half of the worker channel
///
/// Send errors mean the event loop is gone; the worker just runs out.
struct Reporter {
    tx: Sender<WorkerEvent>,
}

impl Reporter {
    fn log(&self, text: impl Into<String>, tone: Tone) {
        let _ = self.tx.send(WorkerEvent::Log(LogLine::new(text, tone)));
    }

    fn progress(&self, event: FlashEvent) {
        let _ = self.tx.send(WorkerEvent::Progress(event));
    }

    fn failure(&self, err: &FlashError) {
        error!("flash sequence failed: {err}");
        match err {
            FlashError::ExternalCommand { step, tail, .. } => {
                self.log(format!("{} FAILED:", step.to_uppercase()), Tone::Error);
                for line in tail {
                    self.log(format!("  {line}"), Tone::Error);
                }
            }
            _ => {
                let _ = self.tx.send(WorkerEvent::Log(LogLine::error(err)));
            }
        }
        self.progress(FlashEvent::Failed(err.failure_kind()));
    }
}

impl Job {
    fn run(self, tx: Sender<WorkerEvent>) {
        let out = Reporter { tx };
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.sequence(&out)));
        let err = match result {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(payload) => FlashError::Unexpected(panic_message(payload.as_ref())),
        };
        out.failure(&err);
    }

    fn sequence(&self, out: &Reporter) -> Result<(), FlashError> {
        out.log("Writing config...", Tone::Plain);
        self.store.save(&self.doc)?;
        out.progress(FlashEvent::ConfigWritten);

        out.log("Building firmware...", Tone::Working);
        match self.runner.run(&Step::Clean) {
            Ok(output) if !output.success => {
                debug!("clean exited with {:?}, continuing", output.code)
            }
            Err(e) => debug!("clean not run: {e}"),
            Ok(_) => {}
        }
        self.checked(Step::Build)?;
        out.log("Build OK", Tone::Success);
        out.progress(FlashEvent::BuildSucceeded);

        out.log(format!("Flashing {}...", self.port), Tone::Working);
        self.checked(Step::Flash {
            port: self.port.clone(),
        })?;
        out.log("Flash complete!", Tone::Success);
        out.log("Switch to UART mode to run.", Tone::Accent);
        out.progress(FlashEvent::FlashSucceeded);
        Ok(())
    }

    /// Run a step, turning a non-zero exit into an error
    fn checked(&self, step: Step) -> Result<(), FlashError> {
        let output = self.runner.run(&step)?;
        if output.success {
            return Ok(());
        }
        Err(FlashError::ExternalCommand {
            step: step.name(),
            code: output.code,
            tail: output.tail(self.tail_lines),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
