//! Ordered transactional key-value store contract used by the namespace.
//!
//! A [`KvEngine`] hands out read and write transactions. Writes are buffered
//! and applied atomically by [`WriteTxn::commit`], which fails with
//! `TransactionCode::CONFLICT` when a key read through [`ReadTxn::get`] or a
//! range read through [`ReadTxn::scan`] changed after the transaction began.

mod range;
mod txn;

pub use range::{KeyRange, RangePage, prefix_end};
pub use txn::{KvEngine, ReadTxn, WriteTxn};
