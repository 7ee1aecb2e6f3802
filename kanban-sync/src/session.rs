//! Async driver for one board.
//!
//! A [`BoardSession`] owns an [`OptimisticSyncEngine`] and a gateway and runs
//! as a single tokio task. Views talk to it through a cloneable
//! [`BoardHandle`]; every board change is published on a `watch` channel.
//!
//! Remote moves run in their own tasks and report back to the actor, so the
//! actor keeps accepting gestures while a move is in flight. Those gestures
//! are queued by the engine and sent one at a time in the order they were
//! applied.

use crate::board::Board;
use crate::config::SyncConfig;
use crate::engine::{OptimisticSyncEngine, Resolution, Submission};
use crate::error::{Result, SyncError};
use crate::gateway::{RemoteFailure, RemoteGateway};
use crate::notice::{FailureNotice, Notifier, TracingNotifier};
use crate::reconciler::DragEnd;
use crate::types::{BoardScope, MoveRequest, MoveTicket};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Reply to a drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAck {
    /// Applied to the board; the remote call for `ticket` is on its way
    Applied(MoveTicket),
    /// Applied later, once the moves ahead of it resolve
    Queued,
    /// Resolved to no move, or raced a newer arrangement
    Ignored,
}

enum Command {
    Drag {
        gesture: DragEnd,
        reply: oneshot::Sender<Result<DragAck>>,
    },
    SetMoveGate(bool),
    Refetch {
        reply: oneshot::Sender<Result<()>>,
    },
    Settled {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct MoveOutcome {
    ticket: MoveTicket,
    result: Result<()>,
}

/// Run a remote call under a deadline. Elapsing counts as unavailable.
async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = std::result::Result<T, RemoteFailure>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(SyncError::from),
        Err(_) => Err(SyncError::timed_out(limit)),
    }
}

/// A mounted board, ready to be spawned
pub struct BoardSession<G: RemoteGateway + ?Sized + 'static> {
    gateway: Arc<G>,
    engine: OptimisticSyncEngine,
    config: SyncConfig,
    notifier: Arc<dyn Notifier>,
}

impl<G: RemoteGateway + ?Sized + 'static> BoardSession<G> {
    /// Fetch the listing for `scope` and build its board
    pub async fn mount(gateway: Arc<G>, scope: BoardScope, config: SyncConfig) -> Result<Self> {
        config.validate()?;
        let records = with_deadline(config.remote_timeout(), gateway.list_items(&scope)).await?;
        let engine = OptimisticSyncEngine::from_records(scope, records)?;
        info!(
            scope = %engine.scope(),
            items = engine.board().len(),
            "board mounted"
        );

        Ok(Self {
            gateway,
            engine,
            config,
            notifier: Arc::new(TracingNotifier),
        })
    }

    /// Send failure notices to `notifier` instead of the log
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn engine(&self) -> &OptimisticSyncEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut OptimisticSyncEngine {
        &mut self.engine
    }

    /// Start the actor task
    pub fn spawn(self) -> BoardHandle {
        let (commands_tx, commands_rx) = mpsc::channel(self.config.command_buffer);
        let (board_tx, board_rx) = watch::channel(self.engine.board().clone());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let actor = SessionActor {
            gateway: self.gateway,
            engine: self.engine,
            timeout: self.config.remote_timeout(),
            notifier: self.notifier,
            board_tx,
            completions_tx,
            completions: completions_rx,
            settled_waiters: Vec::new(),
        };
        tokio::spawn(actor.run(commands_rx));

        BoardHandle {
            commands: commands_tx,
            board: board_rx,
        }
    }
}

/// Cloneable handle to a running session.
///
/// The session stops when [`shutdown`](Self::shutdown) is called or when the
/// last handle is dropped.
#[derive(Clone)]
pub struct BoardHandle {
    commands: mpsc::Sender<Command>,
    board: watch::Receiver<Board>,
}

impl BoardHandle {
    /// Submit a finished drag gesture
    pub async fn drag(&self, gesture: DragEnd) -> Result<DragAck> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Drag { gesture, reply }).await?;
        response.await.map_err(|_| SyncError::SessionClosed)?
    }

    pub async fn set_move_gate(&self, allowed: bool) -> Result<()> {
        self.send(Command::SetMoveGate(allowed)).await
    }

    /// Reload the board from the remote side. Refused while a move is in
    /// flight.
    pub async fn refetch(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Refetch { reply }).await?;
        response.await.map_err(|_| SyncError::SessionClosed)?
    }

    /// Wait until no move is in flight or queued
    pub async fn settled(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Settled { reply }).await?;
        response.await.map_err(|_| SyncError::SessionClosed)
    }

    /// Stop the session. A move still in flight is awaited first; its
    /// outcome is not applied.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Shutdown { reply }).await?;
        response.await.map_err(|_| SyncError::SessionClosed)
    }

    /// Latest published board
    pub fn board(&self) -> Board {
        self.board.borrow().clone()
    }

    /// Receiver notified on every board change
    pub fn subscribe(&self) -> watch::Receiver<Board> {
        self.board.clone()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SyncError::SessionClosed)
    }
}

struct SessionActor<G: RemoteGateway + ?Sized + 'static> {
    gateway: Arc<G>,
    engine: OptimisticSyncEngine,
    timeout: Duration,
    notifier: Arc<dyn Notifier>,
    board_tx: watch::Sender<Board>,
    completions_tx: mpsc::UnboundedSender<MoveOutcome>,
    completions: mpsc::UnboundedReceiver<MoveOutcome>,
    settled_waiters: Vec<oneshot::Sender<()>>,
}

impl<G: RemoteGateway + ?Sized + 'static> SessionActor<G> {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        debug!(scope = %self.engine.scope(), "board session started");

        let shutdown = loop {
            tokio::select! {
                biased;
                Some(outcome) = self.completions.recv() => self.on_outcome(outcome).await,
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => break Some(reply),
                    Some(command) => self.on_command(command).await,
                    None => break None,
                },
            }
        };

        self.drain_in_flight().await;
        if let Some(reply) = shutdown {
            let _ = reply.send(());
        }
        info!(scope = %self.engine.scope(), "board session stopped");
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Drag { gesture, reply } => {
                let ack = self.drag(&gesture);
                let _ = reply.send(ack);
            }
            Command::SetMoveGate(allowed) => {
                debug!(allowed, "move gate changed");
                self.engine.set_move_gate(allowed);
            }
            Command::Refetch { reply } => {
                let result = if self.engine.is_applying() {
                    Err(SyncError::MoveInFlight)
                } else {
                    self.refetch().await
                };
                let _ = reply.send(result);
            }
            Command::Settled { reply } => {
                self.settled_waiters.push(reply);
                self.wake_settled();
            }
            // Handled by the run loop
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn drag(&mut self, gesture: &DragEnd) -> Result<DragAck> {
        match self.engine.submit(gesture) {
            Ok(Submission::Dispatched(request)) => {
                let ticket = request.ticket;
                self.publish();
                self.dispatch(request);
                Ok(DragAck::Applied(ticket))
            }
            Ok(Submission::Queued(_)) => Ok(DragAck::Queued),
            Ok(Submission::Ignored) => Ok(DragAck::Ignored),
            Err(error) if error.is_local_race() => {
                debug!(item = %gesture.active, %error, "ignoring gesture");
                Ok(DragAck::Ignored)
            }
            Err(error) => Err(error),
        }
    }

    fn dispatch(&self, request: MoveRequest) {
        let gateway = self.gateway.clone();
        let scope = self.engine.scope().clone();
        let completions = self.completions_tx.clone();
        let limit = self.timeout;

        debug!(
            ticket = %request.ticket,
            item = %request.item,
            column = %request.column,
            order = request.order,
            "sending move"
        );
        tokio::spawn(async move {
            let result = with_deadline(limit, gateway.move_item(&scope, &request)).await;
            let _ = completions.send(MoveOutcome {
                ticket: request.ticket,
                result,
            });
        });
    }

    async fn on_outcome(&mut self, outcome: MoveOutcome) {
        match self.engine.resolve(outcome.ticket, outcome.result) {
            Ok(Resolution::Committed(mv)) => debug!(%mv, "move confirmed"),
            Ok(Resolution::RolledBack { notice, .. }) => {
                self.publish();
                self.notifier.notify(&notice);
                if let Err(error) = self.refetch().await {
                    let notice = FailureNotice::refetch_failed(self.engine.scope(), &error);
                    self.notifier.notify(&notice);
                }
            }
            Err(error) => warn!(ticket = %outcome.ticket, %error, "discarding move outcome"),
        }

        if let Some(request) = self.engine.next_request() {
            self.publish();
            self.dispatch(request);
        }
        self.wake_settled();
    }

    async fn refetch(&mut self) -> Result<()> {
        let scope = self.engine.scope().clone();
        let result = with_deadline(self.timeout, self.gateway.list_items(&scope))
            .await
            .and_then(|records| self.engine.rebuild(records));

        match result {
            Ok(()) => {
                self.publish();
                Ok(())
            }
            Err(error) => {
                warn!(%scope, %error, "refetch failed, keeping current board");
                Err(error)
            }
        }
    }

    /// Teardown: wait for the in-flight call, then drop its outcome.
    async fn drain_in_flight(&mut self) {
        let Some(mv) = self.engine.in_flight().cloned() else {
            return;
        };
        debug!(%mv, queued = self.engine.queued(), "waiting for in-flight move before stopping");
        if let Some(outcome) = self.completions.recv().await {
            match outcome.result {
                Ok(()) => debug!(ticket = %outcome.ticket, "in-flight move confirmed at teardown"),
                Err(error) => {
                    info!(ticket = %outcome.ticket, %error, "in-flight move failed at teardown")
                }
            }
        }
    }

    fn publish(&self) {
        self.board_tx.send_replace(self.engine.board().clone());
    }

    fn wake_settled(&mut self) {
        if self.engine.is_settled() {
            for waiter in self.settled_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }
}
