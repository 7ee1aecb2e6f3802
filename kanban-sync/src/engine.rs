//! Optimistic move engine.
//!
//! The engine owns the board a view renders from. A gesture is reconciled
//! into a [`Move`], applied to the board at once, and handed back as a
//! [`MoveRequest`] for the caller to send. The caller reports the remote
//! outcome with [`OptimisticSyncEngine::resolve`]: success commits, failure
//! restores the snapshot taken just before the move.
//!
//! Per move the phases are `Idle -> Applying -> Committed | RolledBack`.
//! Only one move is `Applying` at a time. Gestures that arrive meanwhile are
//! queued. Each is reconciled against a projected board: the live board with
//! every move queued ahead of it already applied, so a run of drags lands
//! where the user saw it land. [`OptimisticSyncEngine::next_request`] starts
//! queued moves in arrival order once the in-flight move is resolved.
//!
//! The engine performs no I/O. [`crate::session`] drives it against a
//! [`crate::gateway::RemoteGateway`].

use crate::board::{Board, BoardSnapshot};
use crate::error::{Result, SyncError};
use crate::notice::FailureNotice;
use crate::reconciler::{DragEnd, MoveReconciler};
use crate::types::{BoardScope, ItemRecord, Move, MoveRequest, MoveTicket};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Lifecycle of the most recent move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePhase {
    /// No move has been applied yet
    Idle,
    /// Applied locally, waiting for the remote outcome
    Applying,
    /// Remote side confirmed
    Committed,
    /// Remote side refused or was unreachable; board restored
    RolledBack,
}

/// What happened to a submitted gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Applied locally; send this request
    Dispatched(MoveRequest),
    /// Another move is in flight; this one waits its turn
    Queued(Move),
    /// The gesture does not resolve to a move
    Ignored,
}

/// Outcome of resolving an in-flight move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Committed(Move),
    /// The board was restored. The caller must show `notice` and refetch.
    RolledBack { mv: Move, notice: FailureNotice },
}

#[derive(Debug)]
struct InFlight {
    ticket: MoveTicket,
    mv: Move,
    snapshot: BoardSnapshot,
}

/// Applies moves optimistically and rolls them back on remote failure
#[derive(Debug)]
pub struct OptimisticSyncEngine {
    scope: BoardScope,
    board: Board,
    phase: MovePhase,
    in_flight: Option<InFlight>,
    queue: VecDeque<Move>,
    /// Live board plus every queued move; `None` while the queue is empty
    projected: Option<Board>,
    next_ticket: u64,
    move_gate: bool,
}

impl OptimisticSyncEngine {
    /// Engine over an already built board. The move gate starts open.
    pub fn new(scope: BoardScope, board: Board) -> Self {
        Self {
            scope,
            board,
            phase: MovePhase::Idle,
            in_flight: None,
            queue: VecDeque::new(),
            projected: None,
            next_ticket: 1,
            move_gate: true,
        }
    }

    /// Engine over a board built from a remote listing
    pub fn from_records(scope: BoardScope, records: Vec<ItemRecord>) -> Result<Self> {
        let board = Board::for_scope(&scope, records)?;
        Ok(Self::new(scope, board))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn scope(&self) -> &BoardScope {
        &self.scope
    }

    pub fn phase(&self) -> MovePhase {
        self.phase
    }

    pub fn is_applying(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The move waiting for its remote outcome, if any
    pub fn in_flight(&self) -> Option<&Move> {
        self.in_flight.as_ref().map(|f| &f.mv)
    }

    /// Number of moves waiting behind the in-flight one
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// The board new gestures are reconciled against: the live board with
    /// all queued moves applied
    pub fn projected(&self) -> &Board {
        self.projected.as_ref().unwrap_or(&self.board)
    }

    /// Nothing in flight and nothing queued
    pub fn is_settled(&self) -> bool {
        self.in_flight.is_none() && self.queue.is_empty()
    }

    pub fn move_gate(&self) -> bool {
        self.move_gate
    }

    /// Open or close the move gate. The flag comes from the session
    /// provider; the engine does not decide who may move what.
    pub fn set_move_gate(&mut self, allowed: bool) {
        self.move_gate = allowed;
    }

    /// Reconcile a gesture and apply it, or queue it behind the in-flight move.
    ///
    /// `NotFound` and `StaleMove` errors mean the gesture raced a newer
    /// arrangement; callers drop them without telling the user.
    pub fn submit(&mut self, gesture: &DragEnd) -> Result<Submission> {
        if !self.move_gate {
            return Err(SyncError::MoveNotPermitted {
                id: gesture.active.to_string(),
            });
        }

        let Some(mv) = MoveReconciler::new(self.projected()).reconcile(gesture) else {
            debug!(item = %gesture.active, "gesture resolves to no move");
            return Ok(Submission::Ignored);
        };

        if self.in_flight.is_some() || !self.queue.is_empty() {
            let projected = self.projected.get_or_insert_with(|| self.board.clone());
            projected.apply_move(&mv)?;
            debug!(%mv, queued = self.queue.len() + 1, "queueing move behind in-flight move");
            self.queue.push_back(mv.clone());
            return Ok(Submission::Queued(mv));
        }

        self.start(mv).map(Submission::Dispatched)
    }

    /// Report the remote outcome for `ticket`.
    pub fn resolve(&mut self, ticket: MoveTicket, outcome: Result<()>) -> Result<Resolution> {
        let in_flight = match self.in_flight.take() {
            Some(in_flight) if in_flight.ticket == ticket => in_flight,
            other => {
                self.in_flight = other;
                return Err(SyncError::UnknownTicket { ticket });
            }
        };

        match outcome {
            Ok(()) => {
                self.phase = MovePhase::Committed;
                debug!(%ticket, mv = %in_flight.mv, "move committed");
                Ok(Resolution::Committed(in_flight.mv))
            }
            Err(error) => {
                self.board.restore(in_flight.snapshot);
                self.phase = MovePhase::RolledBack;
                warn!(%ticket, mv = %in_flight.mv, %error, "move rolled back");
                self.reproject();
                let notice = FailureNotice::move_failed(&in_flight.mv, &error);
                Ok(Resolution::RolledBack {
                    mv: in_flight.mv,
                    notice,
                })
            }
        }
    }

    /// Start the next queued move, if nothing is in flight.
    ///
    /// Queued moves whose origin no longer matches the board are dropped.
    pub fn next_request(&mut self) -> Option<MoveRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        while let Some(mv) = self.queue.pop_front() {
            match self.start(mv) {
                Ok(request) => {
                    if self.queue.is_empty() {
                        self.projected = None;
                    }
                    return Some(request);
                }
                Err(error) => {
                    debug!(%error, "dropping queued move");
                    self.reproject();
                }
            }
        }
        self.projected = None;
        None
    }

    /// Replace the board with a fresh listing. Refused while a move is in
    /// flight, since its snapshot belongs to the current board.
    pub fn rebuild(&mut self, records: Vec<ItemRecord>) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(SyncError::MoveInFlight);
        }
        self.board = Board::for_scope(&self.scope, records)?;
        info!(scope = %self.scope, items = self.board.len(), "board rebuilt");
        self.reproject();
        Ok(())
    }

    /// Replay the queue over the live board, dropping moves that no longer
    /// apply. Runs whenever the live board changes under the queue.
    fn reproject(&mut self) {
        if self.queue.is_empty() {
            self.projected = None;
            return;
        }
        let mut projected = self.board.clone();
        self.queue.retain(|mv| match projected.apply_move(mv) {
            Ok(_) => true,
            Err(error) => {
                debug!(%mv, %error, "dropping queued move");
                false
            }
        });
        self.projected = (!self.queue.is_empty()).then_some(projected);
    }

    fn start(&mut self, mv: Move) -> Result<MoveRequest> {
        let snapshot = self.board.snapshot();
        let landed = self.board.apply_move(&mv)?;

        let ticket = MoveTicket::new(self.next_ticket);
        self.next_ticket += 1;

        let request = MoveRequest {
            ticket,
            item: mv.item.clone(),
            column: landed.column,
            order: landed.index,
        };
        debug!(%ticket, %mv, "move applied optimistically");

        self.in_flight = Some(InFlight {
            ticket,
            mv,
            snapshot,
        });
        self.phase = MovePhase::Applying;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RemoteFailure;
    use crate::notice::NoticeKind;
    use crate::types::{ColumnId, ItemId, Slot};

    fn engine(layout: &[(&str, &[i64])]) -> OptimisticSyncEngine {
        let columns: Vec<ColumnId> = layout.iter().map(|(c, _)| ColumnId::from(*c)).collect();
        let records = layout.iter().flat_map(|(c, ids)| {
            ids.iter()
                .enumerate()
                .map(move |(order, id)| ItemRecord::new(*id, *c, order as i64))
        });
        OptimisticSyncEngine::new(
            BoardScope::Projects,
            Board::from_records(columns, records).unwrap(),
        )
    }

    fn column(engine: &OptimisticSyncEngine, id: &str) -> Vec<String> {
        engine
            .board()
            .column(&ColumnId::from(id))
            .unwrap()
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    fn dispatched(submission: Submission) -> MoveRequest {
        match submission {
            Submission::Dispatched(request) => request,
            other => panic!("expected dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_applies_optimistically() {
        let mut e = engine(&[("A", &[1, 2, 3]), ("B", &[])]);
        assert_eq!(e.phase(), MovePhase::Idle);

        let request = dispatched(e.submit(&DragEnd::onto_column(2, "B")).unwrap());

        assert_eq!(request.item, ItemId::from(2));
        assert_eq!(request.column.as_str(), "B");
        assert_eq!(request.order, 0);
        assert_eq!(e.phase(), MovePhase::Applying);
        assert_eq!(column(&e, "A"), ["1", "3"]);
        assert_eq!(column(&e, "B"), ["2"]);
    }

    #[test]
    fn test_commit_keeps_arrangement() {
        let mut e = engine(&[("A", &[1, 2, 3]), ("B", &[])]);
        let request = dispatched(e.submit(&DragEnd::onto_column(2, "B")).unwrap());
        let after_apply = e.board().clone();

        let resolution = e.resolve(request.ticket, Ok(())).unwrap();

        assert!(matches!(resolution, Resolution::Committed(_)));
        assert_eq!(e.phase(), MovePhase::Committed);
        assert_eq!(e.board(), &after_apply);
        assert!(e.is_settled());
    }

    #[test]
    fn test_failure_rolls_back_exactly() {
        let mut e = engine(&[("A", &[1, 2, 3]), ("B", &[5])]);
        let before = e.board().clone();
        let request = dispatched(e.submit(&DragEnd::onto_item(1, 5)).unwrap());
        assert_ne!(e.board(), &before);

        let resolution = e
            .resolve(
                request.ticket,
                Err(RemoteFailure::permission("teachers only").into()),
            )
            .unwrap();

        match resolution {
            Resolution::RolledBack { mv, notice } => {
                assert_eq!(mv.item, ItemId::from(1));
                assert_eq!(notice.kind, NoticeKind::Rejected);
            }
            other => panic!("expected rollback, got {:?}", other),
        }
        assert_eq!(e.phase(), MovePhase::RolledBack);
        assert_eq!(e.board(), &before);
    }

    #[test]
    fn test_gesture_during_flight_is_queued_against_optimistic_state() {
        let mut e = engine(&[("A", &[1, 2, 3]), ("B", &[])]);
        let first = dispatched(e.submit(&DragEnd::onto_column(1, "B")).unwrap());

        // Item 3 is at A/1 once item 1 has left, not at A/2.
        let queued = e.submit(&DragEnd::onto_column(3, "B")).unwrap();
        assert_eq!(
            queued,
            Submission::Queued(Move::new(3, Slot::new("A", 1), "B", 1))
        );
        assert_eq!(e.queued(), 1);
        assert!(e.next_request().is_none());

        e.resolve(first.ticket, Ok(())).unwrap();
        let second = e.next_request().unwrap();

        assert!(second.ticket > first.ticket);
        assert_eq!(second.order, 1);
        assert_eq!(column(&e, "B"), ["1", "3"]);
        assert_eq!(column(&e, "A"), ["2"]);
    }

    #[test]
    fn test_queued_move_dropped_when_stale_after_rollback() {
        let mut e = engine(&[("A", &[1, 2, 3]), ("B", &[])]);
        let first = dispatched(e.submit(&DragEnd::onto_column(1, "B")).unwrap());
        e.submit(&DragEnd::onto_column(3, "B")).unwrap();

        e.resolve(first.ticket, Err(RemoteFailure::unavailable("down").into()))
            .unwrap();

        // Item 3 is back at A/2, the queued move recorded A/1.
        assert!(e.next_request().is_none());
        assert!(e.is_settled());
        assert_eq!(column(&e, "A"), ["1", "2", "3"]);
    }

    /// Drive queued moves to completion, committing each one
    fn drain(e: &mut OptimisticSyncEngine, first: MoveRequest) -> Vec<MoveRequest> {
        let mut sent = vec![first];
        loop {
            let ticket = sent[sent.len() - 1].ticket;
            e.resolve(ticket, Ok(())).unwrap();
            match e.next_request() {
                Some(request) => sent.push(request),
                None => return sent,
            }
        }
    }

    #[test]
    fn test_several_queued_gestures_all_land() {
        let mut e = engine(&[("A", &[1, 2, 3, 4]), ("B", &[])]);
        let first = dispatched(e.submit(&DragEnd::onto_column(1, "B")).unwrap());

        // Each queued gesture sees the ones queued before it.
        assert_eq!(
            e.submit(&DragEnd::onto_column(2, "B")).unwrap(),
            Submission::Queued(Move::new(2, Slot::new("A", 0), "B", 1))
        );
        assert_eq!(
            e.submit(&DragEnd::onto_column(3, "B")).unwrap(),
            Submission::Queued(Move::new(3, Slot::new("A", 0), "B", 2))
        );
        assert_eq!(e.queued(), 2);
        assert_eq!(column(&e, "B"), ["1"]);

        let sent = drain(&mut e, first);

        let items: Vec<String> = sent.iter().map(|r| r.item.to_string()).collect();
        let orders: Vec<usize> = sent.iter().map(|r| r.order).collect();
        assert_eq!(items, ["1", "2", "3"]);
        assert_eq!(orders, [0, 1, 2]);
        assert_eq!(column(&e, "A"), ["4"]);
        assert_eq!(column(&e, "B"), ["1", "2", "3"]);
        assert!(e.is_settled());
        assert_eq!(e.projected(), e.board());
    }

    #[test]
    fn test_queued_reorders_within_column() {
        let mut e = engine(&[("A", &[1, 2, 3, 4])]);
        let first = dispatched(e.submit(&DragEnd::onto_item(4, 1)).unwrap());
        assert_eq!(column(&e, "A"), ["4", "1", "2", "3"]);

        e.submit(&DragEnd::onto_item(3, 4)).unwrap();
        // Item 2 sits at A/3 once item 3 has moved to the front.
        assert_eq!(
            e.submit(&DragEnd::onto_item(2, 4)).unwrap(),
            Submission::Queued(Move::new(2, Slot::new("A", 3), "A", 1))
        );

        let sent = drain(&mut e, first);

        assert_eq!(sent.len(), 3);
        assert_eq!(column(&e, "A"), ["3", "2", "4", "1"]);
        assert!(e.board().is_consistent());
    }

    #[test]
    fn test_rollback_prunes_dependent_queue() {
        let mut e = engine(&[("A", &[1, 2, 3]), ("B", &[7])]);
        let first = dispatched(e.submit(&DragEnd::onto_column(1, "B")).unwrap());
        e.submit(&DragEnd::onto_column(2, "B")).unwrap();
        // Dropped onto item 1 in B, item 7 stays at B/0 whether or not 1 lands.
        e.submit(&DragEnd::onto_item(7, 1)).unwrap();
        assert_eq!(e.queued(), 2);

        e.resolve(first.ticket, Err(RemoteFailure::unavailable("down").into()))
            .unwrap();

        // Item 2 recorded A/0 but is back at A/1; item 7 still matches.
        assert_eq!(e.queued(), 1);
        let request = e.next_request().unwrap();
        assert_eq!(request.item, ItemId::from(7));
        assert_eq!(column(&e, "A"), ["1", "2", "3"]);
        assert_eq!(column(&e, "B"), ["7"]);
    }

    #[test]
    fn test_rebuild_reprojects_queue() {
        let mut e = engine(&[("column1", &[1, 2, 3]), ("column2", &[])]);
        let first = dispatched(e.submit(&DragEnd::onto_column(1, "column2")).unwrap());
        e.submit(&DragEnd::onto_column(3, "column2")).unwrap();
        e.resolve(first.ticket, Ok(())).unwrap();

        // Another client already moved item 3
        e.rebuild(vec![
            ItemRecord::new(1, "column2", 0),
            ItemRecord::new(3, "column2", 1),
            ItemRecord::new(2, "column1", 0),
        ])
        .unwrap();

        assert_eq!(e.queued(), 0);
        assert!(e.is_settled());
        assert!(e.next_request().is_none());
        assert_eq!(e.projected(), e.board());
    }

    #[test]
    fn test_stale_submission_leaves_board_alone() {
        let mut e = engine(&[("A", &[1, 2])]);
        let before = e.board().clone();

        let ignored = e.submit(&DragEnd::onto_item(1, 99)).unwrap();
        assert_eq!(ignored, Submission::Ignored);
        assert_eq!(e.board(), &before);
        assert_eq!(e.phase(), MovePhase::Idle);
    }

    #[test]
    fn test_closed_gate_refuses_locally() {
        let mut e = engine(&[("A", &[1, 2])]);
        e.set_move_gate(false);

        let result = e.submit(&DragEnd::onto_item(2, 1));
        assert!(matches!(result, Err(SyncError::MoveNotPermitted { .. })));
        assert!(e.is_settled());

        e.set_move_gate(true);
        assert!(e.submit(&DragEnd::onto_item(2, 1)).is_ok());
    }

    #[test]
    fn test_unknown_ticket() {
        let mut e = engine(&[("A", &[1, 2])]);
        let request = dispatched(e.submit(&DragEnd::onto_column(1, "A")).unwrap());

        let wrong = MoveTicket::new(request.ticket.as_u64() + 10);
        let result = e.resolve(wrong, Ok(()));
        assert!(matches!(result, Err(SyncError::UnknownTicket { .. })));
        assert!(e.is_applying());

        e.resolve(request.ticket, Ok(())).unwrap();
        assert!(matches!(
            e.resolve(request.ticket, Ok(())),
            Err(SyncError::UnknownTicket { .. })
        ));
    }

    #[test]
    fn test_rebuild_refused_in_flight() {
        let mut e = engine(&[("column1", &[1, 2]), ("column2", &[])]);
        let request = dispatched(e.submit(&DragEnd::onto_column(1, "column2")).unwrap());

        let result = e.rebuild(vec![ItemRecord::new(9, "column3", 0)]);
        assert!(matches!(result, Err(SyncError::MoveInFlight)));

        e.resolve(request.ticket, Ok(())).unwrap();
        e.rebuild(vec![ItemRecord::new(9, "column3", 0)]).unwrap();
        assert_eq!(e.board().len(), 1);
        assert_eq!(e.board().columns().count(), 3);
    }

    #[test]
    fn test_self_drop_dispatches_noop() {
        let mut e = engine(&[("A", &[1, 2, 3])]);
        let before = e.board().clone();
        let request = dispatched(e.submit(&DragEnd::onto_item(2, 2)).unwrap());
        assert_eq!(request.order, 1);
        assert_eq!(e.board(), &before);
    }
}
