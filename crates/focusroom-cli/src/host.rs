//! Async host for the controller.
//!
//! One loop owns the controller and processes events strictly in arrival
//! order. Around it:
//!
//! - an input reader polling crossterm on a blocking thread
//! - a 1s ticker
//! - one worker running commands and recorder calls in order, so a
//!   `[Stop, Break]` pair reaches the service as issued
//! - a blocking task per snapshot fetch; fetches may overlap and their
//!   results come back as ordinary events

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use focusroom_core::{Controller, ControllerEvent, Effect, LocalSessionService};
use ratatui::backend::Backend;
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;

use crate::keys;

pub const TICK: Duration = Duration::from_secs(1);
const INPUT_POLL: Duration = Duration::from_millis(100);

type Events = mpsc::UnboundedSender<ControllerEvent>;

pub async fn drive<B, R>(
    terminal: &mut Terminal<B>,
    mut controller: Controller,
    service: Arc<LocalSessionService>,
    render: R,
) -> Result<Controller, Box<dyn std::error::Error>>
where
    B: Backend,
    R: Fn(&mut Frame, &Controller),
{
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let (work_tx, work_rx) = mpsc::unbounded_channel();
    let stop = StopOnDrop(Arc::new(AtomicBool::new(false)));

    let reader = spawn_input_reader(events_tx.clone(), Arc::clone(&stop.0));
    let ticker = tokio::spawn(tick_loop(events_tx.clone()));
    let worker = tokio::spawn(sequential_worker(work_rx, Arc::clone(&service), events_tx.clone()));

    let host = Host {
        service,
        events: events_tx,
        work: work_tx,
    };
    host.apply(controller.bootstrap());

    terminal.draw(|frame| render(frame, &controller))?;
    while let Some(event) = events.recv().await {
        let effects = controller.dispatch(event);
        host.apply(effects);
        if controller.is_exited() {
            break;
        }
        terminal.draw(|frame| render(frame, &controller))?;
    }

    drop(stop);
    ticker.abort();
    drop(host);
    if let Err(err) = worker.await {
        tracing::warn!(error = %err, "effect worker ended abnormally");
    }
    if let Err(err) = reader.await {
        tracing::warn!(error = %err, "input reader ended abnormally");
    }
    Ok(controller)
}

/// Tells the input reader to exit when dropped, including on early
/// returns from [`drive`].
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

struct Host {
    service: Arc<LocalSessionService>,
    events: Events,
    work: mpsc::UnboundedSender<Effect>,
}

impl Host {
    fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Exit => {}
                Effect::NotifySessionComplete { session_type } => {
                    tracing::info!(%session_type, "session complete");
                    ring_bell();
                }
                effect if effect.is_sequential() => {
                    if self.work.send(effect).is_err() {
                        tracing::warn!("effect worker gone; dropping effect");
                    }
                }
                effect => {
                    let service = Arc::clone(&self.service);
                    let events = self.events.clone();
                    tokio::task::spawn_blocking(move || {
                        if let Some(event) = effect.execute(service.as_ref()) {
                            let _ = events.send(event);
                        }
                    });
                }
            }
        }
    }
}

fn ring_bell() {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x07");
    let _ = stdout.flush();
}

async fn tick_loop(events: Events) {
    let mut interval = tokio::time::interval(TICK);
    // The first tick of a tokio interval fires immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        if events.send(ControllerEvent::Tick).is_err() {
            break;
        }
    }
}

async fn sequential_worker(
    mut work: mpsc::UnboundedReceiver<Effect>,
    service: Arc<LocalSessionService>,
    events: Events,
) {
    while let Some(effect) = work.recv().await {
        let service = Arc::clone(&service);
        let label = format!("{effect:?}");
        let result = tokio::task::spawn_blocking(move || effect.execute(service.as_ref())).await;
        match result {
            Ok(Some(event)) => {
                let _ = events.send(event);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(effect = %label, error = %err, "effect task failed"),
        }
    }
}

fn spawn_input_reader(events: Events, stop: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Relaxed) {
            match crossterm::event::poll(INPUT_POLL) {
                Ok(true) => match crossterm::event::read() {
                    Ok(raw) => {
                        if let Some(event) = keys::translate(raw) {
                            if events.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "terminal read failed");
                        break;
                    }
                },
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "terminal poll failed");
                    break;
                }
            }
        }
    })
}
