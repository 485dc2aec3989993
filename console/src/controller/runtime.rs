//! Command loop that owns the controller
//!
//! UI commands and the periodic position refresh are serialised through one
//! task. The next refresh is armed only after the current pass has finished,
//! so passes never overlap each other or a command handler.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info};

use super::app::App;
use super::types::{ControllerError, Mode, Outcome};
use crate::api::LocationApi;
use crate::config::RefreshConfig;
use crate::map::{MapClick, MapRenderer};

const COMMAND_BUFFER: usize = 64;

/// Input accepted by the controller loop
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetMode(Mode),
    Click(MapClick),
    MouseMove,
    SetGeofenceId(String),
    SetDeviceId(String),
    CommitGeofence,
    CommitDevice,
    DeleteGeofence(String),
    DeleteDevice(String),
    RefreshGeofences,
    RefreshDevices,
    Search(String),
    /// Run a position refresh pass now
    RefreshPositions,
    Snapshot,
}

struct Envelope {
    command: Command,
    reply: Option<oneshot::Sender<Result<Outcome, ControllerError>>>,
}

/// Handle to a running controller loop
pub struct ControllerHandle<A, R> {
    tx: mpsc::Sender<Envelope>,
    task: JoinHandle<App<A, R>>,
}

impl<A, R> ControllerHandle<A, R> {
    /// Send a command and wait for its outcome
    pub async fn send(&self, command: Command) -> Result<Outcome, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                command,
                reply: Some(reply),
            })
            .await
            .map_err(|_| ControllerError::Stopped)?;
        rx.await.map_err(|_| ControllerError::Stopped)?
    }

    /// Queue a command without waiting; failures are logged by the loop
    pub async fn post(&self, command: Command) -> Result<(), ControllerError> {
        self.tx
            .send(Envelope {
                command,
                reply: None,
            })
            .await
            .map_err(|_| ControllerError::Stopped)
    }

    /// Stop the loop once queued commands are handled and hand the `App` back
    pub async fn shutdown(self) -> Result<App<A, R>, ControllerError> {
        drop(self.tx);
        self.task.await.map_err(|e| {
            error!("Controller task ended abnormally: {}", e);
            ControllerError::Stopped
        })
    }
}

/// Move `app` onto its own task and start the command loop
pub fn spawn<A, R>(app: App<A, R>, refresh: RefreshConfig) -> ControllerHandle<A, R>
where
    A: LocationApi + 'static,
    R: MapRenderer + 'static,
{
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run(app, rx, refresh));
    ControllerHandle { tx, task }
}

async fn run<A, R>(
    mut app: App<A, R>,
    mut rx: mpsc::Receiver<Envelope>,
    refresh: RefreshConfig,
) -> App<A, R>
where
    A: LocationApi,
    R: MapRenderer,
{
    info!(
        "Controller loop started (position refresh {})",
        if refresh.enabled {
            format!("every {:?}", refresh.interval)
        } else {
            "disabled".to_string()
        }
    );

    let mut next_pass = Instant::now();
    loop {
        tokio::select! {
            envelope = rx.recv() => {
                let Some(Envelope { command, reply }) = envelope else {
                    break;
                };
                let outcome = dispatch(&mut app, command).await;
                match reply {
                    Some(reply) => {
                        let _ = reply.send(outcome);
                    }
                    None => {
                        if let Err(e) = outcome {
                            error!("Command failed: {}", e);
                        }
                    }
                }
            }
            _ = sleep_until(next_pass), if refresh.enabled => {
                let summary = app.update_device_positions().await;
                debug!("Position pass finished: {:?}", summary);
                next_pass = Instant::now() + refresh.interval;
            }
        }
    }

    info!("Controller loop stopped");
    app
}

/// Apply one command to the controller
pub async fn dispatch<A, R>(app: &mut App<A, R>, command: Command) -> Result<Outcome, ControllerError>
where
    A: LocationApi,
    R: MapRenderer,
{
    match command {
        Command::SetMode(mode) => app.set_mode(mode),
        Command::Click(click) => app.on_click(click).await?,
        Command::MouseMove => app.on_mouse_move(),
        Command::SetGeofenceId(text) => app.set_geofence_id_input(text),
        Command::SetDeviceId(text) => app.set_device_id_input(text),
        Command::CommitGeofence => app.commit_geofence().await?,
        Command::CommitDevice => app.commit_device().await?,
        Command::DeleteGeofence(id) => app.delete_geofence(&id).await?,
        Command::DeleteDevice(id) => app.delete_device(&id).await?,
        Command::RefreshGeofences => app.refresh_geofences().await?,
        Command::RefreshDevices => app.refresh_devices().await?,
        Command::Search(term) => return app.search_pois(&term).await.map(Outcome::Places),
        Command::RefreshPositions => return Ok(Outcome::Pass(app.update_device_positions().await)),
        Command::Snapshot => return Ok(Outcome::Snapshot(app.snapshot())),
    }
    Ok(Outcome::Done)
}
