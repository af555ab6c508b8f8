//! Explicit unit-of-work boundary.
//!
//! Repositories operate on `&Connection`; a `Transaction` derefs to one, so
//! the same repository code runs inside or outside a scoped transaction.

use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `work` inside one immediate transaction.
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
/// If `work` panics the transaction is dropped, which also rolls back.
///
/// # Errors
/// - Begin/commit failures are converted through `From<rusqlite::Error>`.
/// - Errors returned by `work` are passed through unchanged.
pub fn with_transaction<T, E, F>(conn: &mut Connection, work: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match work(&tx) {
        Ok(value) => {
            tx.commit()?;
            debug!("event=tx_end module=db status=commit");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=tx_end module=db status=error error_code=rollback_failed error={}",
                    rollback_err
                );
            } else {
                debug!("event=tx_end module=db status=rollback");
            }
            Err(err)
        }
    }
}
