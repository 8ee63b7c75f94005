//! Tokio session actor
//!
//! One task owns the [`SessionController`]. Everything else talks to it through
//! a cloneable [`SessionHandle`]:
//!
//! - commands go over an `mpsc` channel, each with a `oneshot` for the answer
//! - a `tokio::time::interval` feeds elapsed time into the controller
//! - advisor calls run in spawned tasks; their answers come back over a second
//!   channel and are validated by the controller before anything changes
//! - every state change is published as a [`SessionView`] on a `watch` channel
//!
//! Dropping every handle (or calling [`SessionHandle::shutdown`]) stops the
//! actor and aborts an advisor call in flight.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! let handle = SessionHandle::spawn(controller, Arc::new(RandomAdvisor::new()), tick);
//! handle.start_puzzle(definition).await?;
//! handle.place_piece(PieceType::Queen, cell).await?;
//! let mut views = handle.subscribe();
//! views.changed().await?;
//! ```

use crate::core::{CoreError, CoreResult};
use crate::session::controller::{
    SessionController, SessionEvent, SessionView, SuggestionOutcome, SuggestionRequest,
};
use battler_engine::{
    suggest, Cell, DragId, DragSource, DropResolution, DropTarget, Move, MoveAdvisor, MoveRecord,
    PieceId, PieceType, PuzzleDefinition, Rejection,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capacity of the command queue
const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<T>;

/// Messages understood by the session actor
#[derive(Debug)]
pub enum SessionCommand {
    StartPuzzle {
        definition: PuzzleDefinition,
        reply: Reply<CoreResult<()>>,
    },
    PlacePiece {
        piece_type: PieceType,
        cell: Cell,
        reply: Reply<Result<PieceId, Rejection>>,
    },
    BeginDrag {
        source: DragSource,
        reply: Reply<Result<DragId, Rejection>>,
    },
    CommitDrag {
        drag: DragId,
        target: DropTarget,
        reply: Reply<Result<DropResolution, Rejection>>,
    },
    CancelDrag {
        drag: DragId,
        reply: Reply<bool>,
    },
    StartPlaying {
        reply: Reply<bool>,
    },
    MovePiece {
        from: Cell,
        to: Cell,
        reply: Reply<Result<MoveRecord, Rejection>>,
    },
    Pause,
    Resume,
    Restart {
        reply: Reply<CoreResult<bool>>,
    },
    Reset,
    Shutdown,
}

/// Client side of a running session actor
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    commands: mpsc::Sender<SessionCommand>,
    views: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// Spawn the actor on the current tokio runtime
    pub fn spawn(
        controller: SessionController,
        advisor: Arc<dyn MoveAdvisor>,
        tick: Duration,
    ) -> Self {
        let id = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(controller.view());
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        let actor = SessionActor {
            id,
            controller,
            advisor,
            views: view_tx,
            results: result_tx,
            advisor_task: None,
        };
        tokio::spawn(actor.run(command_rx, result_rx, tick));
        info!("[SESSION] Actor {} spawned (tick {:?})", id, tick);

        Self {
            id,
            commands: command_tx,
            views: view_rx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Latest published view
    pub fn view(&self) -> SessionView {
        self.views.borrow().clone()
    }

    /// Receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.views.clone()
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> SessionCommand) -> CoreResult<T> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| CoreError::SessionClosed)?;
        answer.await.map_err(|_| CoreError::SessionClosed)
    }

    async fn notify(&self, command: SessionCommand) -> CoreResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::SessionClosed)
    }

    pub async fn start_puzzle(&self, definition: PuzzleDefinition) -> CoreResult<()> {
        self.request(|reply| SessionCommand::StartPuzzle { definition, reply })
            .await?
    }

    pub async fn place_piece(
        &self,
        piece_type: PieceType,
        cell: Cell,
    ) -> CoreResult<Result<PieceId, Rejection>> {
        self.request(|reply| SessionCommand::PlacePiece {
            piece_type,
            cell,
            reply,
        })
        .await
    }

    pub async fn begin_drag(&self, source: DragSource) -> CoreResult<Result<DragId, Rejection>> {
        self.request(|reply| SessionCommand::BeginDrag { source, reply })
            .await
    }

    pub async fn commit_drag(
        &self,
        drag: DragId,
        target: DropTarget,
    ) -> CoreResult<Result<DropResolution, Rejection>> {
        self.request(|reply| SessionCommand::CommitDrag {
            drag,
            target,
            reply,
        })
        .await
    }

    pub async fn cancel_drag(&self, drag: DragId) -> CoreResult<bool> {
        self.request(|reply| SessionCommand::CancelDrag { drag, reply })
            .await
    }

    pub async fn start_playing(&self) -> CoreResult<bool> {
        self.request(|reply| SessionCommand::StartPlaying { reply })
            .await
    }

    pub async fn move_piece(&self, from: Cell, to: Cell) -> CoreResult<Result<MoveRecord, Rejection>> {
        self.request(|reply| SessionCommand::MovePiece { from, to, reply })
            .await
    }

    pub async fn pause(&self) -> CoreResult<()> {
        self.notify(SessionCommand::Pause).await
    }

    pub async fn resume(&self) -> CoreResult<()> {
        self.notify(SessionCommand::Resume).await
    }

    pub async fn restart(&self) -> CoreResult<bool> {
        self.request(|reply| SessionCommand::Restart { reply })
            .await?
    }

    pub async fn reset(&self) -> CoreResult<()> {
        self.notify(SessionCommand::Reset).await
    }

    /// Stop the actor; later calls on any clone return `SessionClosed`
    pub async fn shutdown(&self) -> CoreResult<()> {
        self.notify(SessionCommand::Shutdown).await
    }
}

struct SessionActor {
    id: Uuid,
    controller: SessionController,
    advisor: Arc<dyn MoveAdvisor>,
    views: watch::Sender<SessionView>,
    results: mpsc::UnboundedSender<(SuggestionRequest, Option<Move>)>,
    advisor_task: Option<JoinHandle<()>>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut results: mpsc::UnboundedReceiver<(SuggestionRequest, Option<Move>)>,
        tick: Duration,
    ) {
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                now = ticker.tick() => {
                    let elapsed = now.saturating_duration_since(last_tick);
                    last_tick = now;
                    self.advance(elapsed);
                }
                Some((request, suggestion)) = results.recv() => {
                    self.handle_suggestion(&request, suggestion);
                }
            }
            self.sync_advisor_task();
            self.publish();
        }

        self.abort_advisor();
        info!("[SESSION] Actor {} stopped", self.id);
    }

    fn handle_command(&mut self, command: SessionCommand) {
        debug!("[SESSION] {} <- {:?}", self.id, command);
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            SessionCommand::StartPuzzle { definition, reply } => {
                let _ = reply.send(self.controller.start_puzzle(&definition));
            }
            SessionCommand::PlacePiece {
                piece_type,
                cell,
                reply,
            } => {
                let _ = reply.send(self.controller.place_piece(piece_type, cell));
            }
            SessionCommand::BeginDrag { source, reply } => {
                let _ = reply.send(self.controller.begin_drag(source));
            }
            SessionCommand::CommitDrag {
                drag,
                target,
                reply,
            } => {
                let _ = reply.send(self.controller.commit_drag(drag, target));
            }
            SessionCommand::CancelDrag { drag, reply } => {
                let _ = reply.send(self.controller.cancel_drag(drag));
            }
            SessionCommand::StartPlaying { reply } => {
                let _ = reply.send(self.controller.start_playing());
            }
            SessionCommand::MovePiece { from, to, reply } => {
                let _ = reply.send(self.controller.move_piece(from, to));
            }
            SessionCommand::Pause => self.controller.pause(),
            SessionCommand::Resume => self.controller.resume(),
            SessionCommand::Restart { reply } => {
                let _ = reply.send(self.controller.restart());
            }
            SessionCommand::Reset => self.controller.reset(),
            SessionCommand::Shutdown => {}
        }
    }

    fn advance(&mut self, elapsed: Duration) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        for event in self.controller.advance(millis) {
            match event {
                SessionEvent::CountdownTick { remaining } => {
                    debug!("[SESSION] {} preparation units left", remaining);
                }
                SessionEvent::PlayStarted => {
                    info!("[SESSION] Countdown expired; play started");
                }
                SessionEvent::SuggestionRequested(request) => self.spawn_advisor(request),
            }
        }
    }

    fn spawn_advisor(&mut self, request: SuggestionRequest) {
        self.abort_advisor();
        let advisor = Arc::clone(&self.advisor);
        let results = self.results.clone();
        self.advisor_task = Some(tokio::spawn(async move {
            let suggestion = suggest(advisor.as_ref(), &request.notation).await;
            if results.send((request, suggestion)).is_err() {
                debug!("[SESSION] Actor gone before the advisor answered");
            }
        }));
    }

    fn handle_suggestion(&mut self, request: &SuggestionRequest, suggestion: Option<Move>) {
        match self.controller.apply_suggestion(request, suggestion) {
            SuggestionOutcome::Applied(record) => {
                info!("[SESSION] Opponent played {:?} -> {:?}", record.from, record.to);
            }
            SuggestionOutcome::Passed => info!("[SESSION] Opponent passed"),
            SuggestionOutcome::Rejected(rejection) => {
                warn!("[SESSION] Opponent suggestion rejected: {}", rejection);
            }
            SuggestionOutcome::Stale => debug!("[SESSION] Stale suggestion dropped"),
        }
    }

    /// Abort the advisor call once nothing waits for its answer
    fn sync_advisor_task(&mut self) {
        if self.controller.pending_request().is_none() {
            self.abort_advisor();
        }
    }

    fn abort_advisor(&mut self) {
        if let Some(task) = self.advisor_task.take() {
            if !task.is_finished() {
                debug!("[SESSION] Aborting advisor call");
            }
            task.abort();
        }
    }

    fn publish(&self) {
        let view = self.controller.view();
        self.views.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
