use std::sync::{Arc, Mutex, PoisonError};

use datajpa_core::{sqlite_member_service, with_transaction, RepoResult, SqliteMemberService};
use log::warn;
use rusqlite::Connection;

use crate::problem::{ApiProblem, ApiResult};

/// Router state: one SQLite connection shared by all requests.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `work` against the member service inside one transaction.
    ///
    /// The connection is used on the blocking pool; requests are serialized
    /// by the connection lock. A worker that panicked mid-request has already
    /// rolled its transaction back, so a poisoned lock is recovered.
    pub async fn with_service<T, F>(&self, work: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteMemberService<'_>) -> RepoResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|poisoned| {
                warn!("event=conn_lock module=web status=recovered reason=poisoned");
                conn.clear_poison();
                PoisonError::into_inner(poisoned)
            });
            with_transaction(&mut guard, |tx| {
                let service = sqlite_member_service(tx)?;
                work(&service)
            })
            .map_err(ApiProblem::from_repo)
        })
        .await
        .map_err(|err| ApiProblem::internal(format!("request worker failed: {err}")))?
    }
}
