//! Transaction Context
//!
//! Tracks which transactions are open on the current thread.
//!
//! # Implementation
//!
//! We use a thread-local stack of open transactions, one entry per engine.
//! When a transaction starts we push an entry; while it is open the engine
//! appends an undo record for every mutation it performs. When the
//! transaction finishes we pop the entry and hand its undo log back to the
//! caller, which either drops it (commit) or replays it (rollback).
//!
//! An engine has at most one entry on a thread's stack. Nested
//! `Transaction::run` calls for the same engine join the open transaction.

use std::cell::RefCell;

use super::UndoOp;

thread_local! {
    static TX_STACK: RefCell<Vec<TxEntry>> = RefCell::new(Vec::new());
}

/// An open transaction on this thread.
#[derive(Debug)]
struct TxEntry {
    /// Instance ID of the engine the transaction belongs to.
    db: u64,
    /// Undo records, oldest first.
    undo: Vec<UndoOp>,
}

/// Guard that pops the transaction entry when dropped.
///
/// This keeps the stack consistent even if the transaction body panics. The
/// undo log of a panicking transaction is discarded.
pub(crate) struct TxScope {
    db: u64,
    finished: bool,
}

impl TxScope {
    /// Open a transaction for the engine with the given instance ID.
    pub fn enter(db: u64) -> Self {
        TX_STACK.with(|stack| {
            stack.borrow_mut().push(TxEntry {
                db,
                undo: Vec::new(),
            });
        });
        Self {
            db,
            finished: false,
        }
    }

    /// Close the transaction and return its undo log.
    pub fn finish(mut self) -> Vec<UndoOp> {
        self.finished = true;
        pop_entry(self.db).map(|e| e.undo).unwrap_or_default()
    }
}

impl Drop for TxScope {
    fn drop(&mut self) {
        if !self.finished {
            pop_entry(self.db);
        }
    }
}

fn pop_entry(db: u64) -> Option<TxEntry> {
    TX_STACK.with(|stack| {
        let popped = stack.borrow_mut().pop();

        // Transactions close in the order they opened.
        if let Some(entry) = &popped {
            debug_assert_eq!(
                entry.db, db,
                "transaction mismatch: expected engine {}, got {}",
                db, entry.db
            );
        }
        popped
    })
}

/// Whether any transaction is open on this thread.
pub(crate) fn is_active() -> bool {
    TX_STACK.with(|stack| !stack.borrow().is_empty())
}

/// Whether a transaction for the given engine is open on this thread.
pub(crate) fn is_active_for(db: u64) -> bool {
    TX_STACK.with(|stack| stack.borrow().iter().any(|e| e.db == db))
}

/// Number of open transactions on this thread.
pub(crate) fn depth() -> usize {
    TX_STACK.with(|stack| stack.borrow().len())
}

/// Append an undo record to the engine's open transaction, if any.
///
/// Mutations made outside a transaction are not recorded.
pub(crate) fn record(db: u64, op: UndoOp) {
    TX_STACK.with(|stack| {
        if let Some(entry) = stack.borrow_mut().iter_mut().rev().find(|e| e.db == db) {
            entry.undo.push(op);
        }
    });
}
