//! # Trip Settle
//!
//! Balance ledger and settlement planner for shared trip expenses.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: Money is held at 4 decimal places via `rust_decimal`
//! - **Zero-sum balances**: shares add up to each expense exactly, so `owed` values sum to zero
//! - **All-or-nothing events**: a rejected expense leaves every balance untouched
//! - **Recorded shares**: reversals replay the shares stored at posting time
//! - **Deterministic settlement**: greedy largest-creditor/largest-debtor matching,
//!   at most `N - 1` payments
//!
//! ## Example
//!
//! ```
//! use std::str::FromStr;
//! use trip_settle::{Expense, Money, Trip};
//!
//! let mut trip = Trip::new("Lisbon");
//! trip.add_participant(1, "Alice").unwrap();
//! trip.add_participant(2, "Bob").unwrap();
//! trip.post_expense(Expense::equal(1, "Dinner", Money::from_str("100").unwrap(), 1, &[1, 2]))
//!     .unwrap();
//!
//! let plan = trip.settle();
//! assert_eq!(plan.lines(), vec!["Bob owes Alice: $50.00".to_string()]);
//! ```

pub mod error;
pub mod expense;
pub mod ledger;
pub mod money;
pub mod participant;
pub mod precision;
pub mod settlement;
pub mod trip;

pub use error::{LedgerError, Result, ValidationError};
pub use expense::{EventRecord, Expense, ExpenseId, MemberSpec, Share, SplitMethod, TripEvent};
pub use ledger::Ledger;
pub use money::Money;
pub use participant::{total_owed, Participant, ParticipantId};
pub use precision::Precision;
pub use settlement::{summarize_count, Settlement, SettlementSolver, SettlementTransaction};
pub use trip::Trip;
