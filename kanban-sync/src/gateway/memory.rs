//! In-process gateway holding server-side boards in memory.
//!
//! Moves are applied with the same board rules the client uses. Failures can
//! be scripted per call and move responses can be parked until released,
//! which lets callers observe a move while it is still in flight.

use super::{RemoteFailure, RemoteGateway};
use crate::board::Board;
use crate::error::Result;
use crate::types::{BoardScope, ItemRecord, Move, MoveRequest};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    boards: HashMap<BoardScope, Board>,
    move_failures: VecDeque<RemoteFailure>,
    list_failures: VecDeque<RemoteFailure>,
    list_calls: usize,
    move_requests: Vec<MoveRequest>,
}

/// Gateway backed by in-memory boards
#[derive(Debug)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    hold_moves: AtomicBool,
    released: Semaphore,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            hold_moves: AtomicBool::new(false),
            released: Semaphore::new(0),
        }
    }

    /// Seed the server-side board for `scope`
    pub fn with_board(mut self, scope: BoardScope, records: Vec<ItemRecord>) -> Result<Self> {
        let board = Board::for_scope(&scope, records)?;
        self.state.get_mut().boards.insert(scope, board);
        Ok(self)
    }

    /// Fail the next move call with `failure`
    pub async fn fail_next_move(&self, failure: RemoteFailure) {
        self.state.lock().await.move_failures.push_back(failure);
    }

    /// Fail the next listing call with `failure`
    pub async fn fail_next_list(&self, failure: RemoteFailure) {
        self.state.lock().await.list_failures.push_back(failure);
    }

    /// Park move responses until [`release_move`](Self::release_move) is called.
    /// A parked move that is never released never answers.
    pub fn hold_moves(&self, hold: bool) {
        self.hold_moves.store(hold, Ordering::SeqCst);
    }

    /// Let one parked move answer
    pub fn release_move(&self) {
        self.released.add_permits(1);
    }

    pub async fn list_calls(&self) -> usize {
        self.state.lock().await.list_calls
    }

    /// Every move request received, in arrival order
    pub async fn move_requests(&self) -> Vec<MoveRequest> {
        self.state.lock().await.move_requests.clone()
    }

    /// Server-side arrangement for `scope`
    pub async fn records(&self, scope: &BoardScope) -> Vec<ItemRecord> {
        self.state
            .lock()
            .await
            .boards
            .get(scope)
            .map(Board::to_records)
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn list_items(
        &self,
        scope: &BoardScope,
    ) -> std::result::Result<Vec<ItemRecord>, RemoteFailure> {
        let mut state = self.state.lock().await;
        state.list_calls += 1;
        if let Some(failure) = state.list_failures.pop_front() {
            return Err(failure);
        }
        state
            .boards
            .get(scope)
            .map(Board::to_records)
            .ok_or_else(|| RemoteFailure::not_found(format!("no board for {}", scope)))
    }

    async fn move_item(
        &self,
        scope: &BoardScope,
        request: &MoveRequest,
    ) -> std::result::Result<(), RemoteFailure> {
        self.state.lock().await.move_requests.push(request.clone());

        if self.hold_moves.load(Ordering::SeqCst) {
            let permit = self
                .released
                .acquire()
                .await
                .map_err(|_| RemoteFailure::unavailable("gateway shut down"))?;
            permit.forget();
        }

        let mut state = self.state.lock().await;
        if let Some(failure) = state.move_failures.pop_front() {
            debug!(ticket = %request.ticket, %failure, "scripted move failure");
            return Err(failure);
        }

        let board = state
            .boards
            .get_mut(scope)
            .ok_or_else(|| RemoteFailure::not_found(format!("no board for {}", scope)))?;
        let origin = board
            .find_item(&request.item)
            .map_err(|e| RemoteFailure::not_found(e.to_string()))?;
        board
            .apply_move(&Move::new(
                request.item.clone(),
                origin,
                request.column.clone(),
                request.order,
            ))
            .map_err(|e| RemoteFailure::validation(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnId, ItemId, MoveTicket};

    fn request(item: i64, column: &str, order: usize) -> MoveRequest {
        MoveRequest {
            ticket: MoveTicket::new(1),
            item: ItemId::from(item),
            column: ColumnId::from(column),
            order,
        }
    }

    fn gateway() -> MemoryGateway {
        MemoryGateway::new()
            .with_board(
                BoardScope::Projects,
                vec![
                    ItemRecord::new(1, "column1", 0),
                    ItemRecord::new(2, "column1", 1),
                ],
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_and_move() {
        let gw = gateway();
        let scope = BoardScope::Projects;

        assert_eq!(gw.list_items(&scope).await.unwrap().len(), 2);
        gw.move_item(&scope, &request(1, "column3", 0)).await.unwrap();

        let records = gw.records(&scope).await;
        assert!(records.contains(&ItemRecord::new(1, "column3", 0)));
        assert!(records.contains(&ItemRecord::new(2, "column1", 0)));
        assert_eq!(gw.list_calls().await, 1);
        assert_eq!(gw.move_requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let gw = gateway();
        let scope = BoardScope::Projects;

        gw.fail_next_move(RemoteFailure::permission("read only")).await;
        let err = gw.move_item(&scope, &request(1, "column2", 0)).await.unwrap_err();
        assert_eq!(err, RemoteFailure::permission("read only"));
        // Server state untouched
        assert!(gw.records(&scope).await.contains(&ItemRecord::new(1, "column1", 0)));

        gw.fail_next_list(RemoteFailure::unavailable("down")).await;
        assert!(gw.list_items(&scope).await.is_err());
        assert!(gw.list_items(&scope).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_scope_and_item() {
        let gw = gateway();
        let other = BoardScope::StageTasks { stage: 1.into() };
        let err = gw.list_items(&other).await.unwrap_err();
        assert_eq!(err.kind, crate::gateway::FailureKind::NotFound);

        let err = gw
            .move_item(&BoardScope::Projects, &request(42, "column1", 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::gateway::FailureKind::NotFound);
    }

    #[tokio::test]
    async fn test_held_move_waits_for_release() {
        let gw = std::sync::Arc::new(gateway());
        gw.hold_moves(true);

        let pending = {
            let gw = gw.clone();
            tokio::spawn(async move {
                gw.move_item(&BoardScope::Projects, &request(2, "column2", 0))
                    .await
            })
        };

        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gw.release_move();
        pending.await.unwrap().unwrap();
        assert!(gw
            .records(&BoardScope::Projects)
            .await
            .contains(&ItemRecord::new(2, "column2", 0)));
    }
}
