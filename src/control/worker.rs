use super::{Controller, RunState, Snapshot};
use crate::error::{Result, SimError};
use crate::ising::Parameter;
use async_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Single-slot, latest-frame-wins handoff between the worker and readers
///
/// Publishing overwrites whatever was not yet taken, so a slow reader only
/// ever skips frames and never holds the worker back.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: Mutex<Option<Snapshot>>,
    published: AtomicU64,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: Snapshot) {
        *lock(&self.slot) = Some(snapshot);
        self.published.fetch_add(1, Ordering::Release);
    }

    /// Take the newest snapshot, leaving the slot empty.
    pub fn take(&self) -> Option<Snapshot> {
        lock(&self.slot).take()
    }

    /// Copy of the newest snapshot, leaving it in place.
    pub fn peek(&self) -> Option<Snapshot> {
        lock(&self.slot).clone()
    }

    /// Number of snapshots published so far
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panicking reader cannot leave a snapshot half-written
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Pacing of the background loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Sleep between ticks while running; zero runs flat out
    pub tick_interval: Duration,
    /// Publish a snapshot every this many ticks
    pub publish_every: usize,
    /// Pause once this many ticks have run in total
    pub tick_limit: Option<usize>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::ZERO,
            publish_every: 1,
            tick_limit: None,
        }
    }
}

enum Command {
    Start,
    Pause,
    Stop,
    SetParameter(Parameter, f64),
    SetSweepsPerTick(usize),
    Resize(usize, usize),
    Shutdown,
}

struct Request {
    command: Command,
    reply: Sender<Result<()>>,
}

/// Runs a [`Controller`] on its own thread
///
/// Commands are applied between ticks, so parameter changes and resizes never
/// land mid-sweep. Each call waits for the worker to acknowledge the command.
pub struct SimulationWorker {
    requests: Sender<Request>,
    latest: Arc<LatestFrame>,
    handle: Option<JoinHandle<Controller>>,
}

impl SimulationWorker {
    pub fn spawn(controller: Controller, settings: WorkerSettings) -> Self {
        let (requests, inbox) = async_channel::unbounded::<Request>();
        let latest = Arc::new(LatestFrame::new());
        latest.publish(controller.snapshot());

        let shared = Arc::clone(&latest);
        let handle = thread::spawn(move || run_loop(controller, inbox, shared, settings));
        info!("Simulation worker started");

        Self {
            requests,
            latest,
            handle: Some(handle),
        }
    }

    /// Shared handle to the snapshot slot, for readers on other threads
    pub fn latest(&self) -> Arc<LatestFrame> {
        Arc::clone(&self.latest)
    }

    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    pub fn set_parameter(&self, name: &str, value: f64) -> Result<()> {
        let parameter: Parameter = name.parse()?;
        self.schedule_parameter(parameter, value)
    }

    pub fn schedule_parameter(&self, parameter: Parameter, value: f64) -> Result<()> {
        self.send(Command::SetParameter(parameter, value))
    }

    pub fn set_sweeps_per_tick(&self, sweeps_per_tick: usize) -> Result<()> {
        self.send(Command::SetSweepsPerTick(sweeps_per_tick))
    }

    pub fn resize(&self, width: usize, height: usize) -> Result<()> {
        self.send(Command::Resize(width, height))
    }

    /// True once the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Stop the loop, join the thread and return the controller.
    pub fn shutdown(mut self) -> Result<Controller> {
        self.send(Command::Shutdown)?;
        let handle = self.handle.take().ok_or(SimError::WorkerDisconnected)?;
        handle.join().map_err(|_| SimError::WorkerDisconnected)
    }

    fn send(&self, command: Command) -> Result<()> {
        let (reply, response) = async_channel::bounded(1);
        self.requests
            .send_blocking(Request { command, reply })
            .map_err(|_| SimError::WorkerDisconnected)?;
        response
            .recv_blocking()
            .map_err(|_| SimError::WorkerDisconnected)?
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let (reply, _response) = async_channel::bounded(1);
            let _ = self.requests.send_blocking(Request {
                command: Command::Shutdown,
                reply,
            });
            if handle.join().is_err() {
                warn!("Simulation worker panicked during shutdown");
            }
        }
    }
}

fn run_loop(
    mut controller: Controller,
    inbox: Receiver<Request>,
    latest: Arc<LatestFrame>,
    settings: WorkerSettings,
) -> Controller {
    let publish_every = settings.publish_every.max(1);
    let mut ticks = 0usize;

    loop {
        // Block while idle; drain without waiting while running.
        if controller.state() != RunState::Running {
            match inbox.recv_blocking() {
                Ok(request) => {
                    if handle_request(&mut controller, request, &latest) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }

        loop {
            match inbox.try_recv() {
                Ok(request) => {
                    if handle_request(&mut controller, request, &latest) {
                        return controller;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    controller.stop();
                    return controller;
                }
            }
        }

        if controller.state() == RunState::Running
            && settings.tick_limit.is_some_and(|limit| ticks >= limit)
        {
            debug!("Tick limit of {} reached", ticks);
            // always succeeds from Running
            let _ = controller.pause();
            latest.publish(controller.snapshot());
            continue;
        }

        if controller.tick().is_some() {
            ticks += 1;
            if ticks % publish_every == 0 {
                latest.publish(controller.snapshot());
            }
            if !settings.tick_interval.is_zero() {
                thread::sleep(settings.tick_interval);
            }
        }
    }

    controller.stop();
    controller
}

/// Apply one request; returns true when the loop should exit.
fn handle_request(controller: &mut Controller, request: Request, latest: &LatestFrame) -> bool {
    let Request { command, reply } = request;
    let mut exit = false;

    let result = match command {
        Command::Start => controller.start(),
        Command::Pause => controller.pause(),
        Command::Stop => {
            controller.stop();
            Ok(())
        }
        Command::SetParameter(parameter, value) => controller.schedule_parameter(parameter, value),
        Command::SetSweepsPerTick(n) => controller.set_sweeps_per_tick(n),
        Command::Resize(width, height) => controller.resize(width, height),
        Command::Shutdown => {
            controller.stop();
            exit = true;
            Ok(())
        }
    };

    if let Err(err) = &result {
        debug!("Worker rejected command: {}", err);
    } else {
        latest.publish(controller.snapshot());
    }
    // the caller may have gone away; nothing to report to
    let _ = reply.try_send(result);
    exit
}
