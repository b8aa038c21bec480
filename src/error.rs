//! Error types for the trip ledger.

use crate::expense::ExpenseId;
use crate::participant::ParticipantId;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// A malformed expense, rejected before any balance is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Expense cost is zero or negative
    #[error("Expense {expense} has non-positive amount {amount}")]
    NonPositiveAmount { expense: ExpenseId, amount: String },

    /// Nobody shares the expense
    #[error("Expense {expense} has no participants")]
    EmptyMembership { expense: ExpenseId },

    /// Payer or member id is not part of the trip
    #[error("Expense {expense} references unknown participant {participant}")]
    UnknownParticipant {
        expense: ExpenseId,
        participant: ParticipantId,
    },

    /// A share below zero
    #[error("Expense {expense} assigns negative share {share} to participant {participant}")]
    NegativeShare {
        expense: ExpenseId,
        participant: ParticipantId,
        share: String,
    },

    /// Shares do not add up to the expense amount
    #[error("Expense {expense} shares sum to {shares} but amount is {amount}")]
    SharesMismatch {
        expense: ExpenseId,
        amount: String,
        shares: String,
    },

    /// A posted expense carries no recorded shares
    #[error("Expense {expense} has no recorded shares")]
    MissingShares { expense: ExpenseId },

    /// The payer is absent from the recorded shares
    #[error("Expense {expense} does not record a share for payer {payer}")]
    PayerNotInShares {
        expense: ExpenseId,
        payer: ParticipantId,
    },
}

/// Errors that can occur while maintaining a trip.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Rejected expense
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Participant {0} already exists")]
    DuplicateParticipant(ParticipantId),

    #[error("Expense {0} already posted")]
    DuplicateExpense(ExpenseId),

    #[error("Expense {0} not found")]
    UnknownExpense(ExpenseId),

    #[error("Participant {0} not found")]
    UnknownParticipant(ParticipantId),

    /// Removal of a participant still referenced by a posted expense
    #[error("Participant {participant} is referenced by expense {expense}")]
    ParticipantReferenced {
        participant: ParticipantId,
        expense: ExpenseId,
    },

    /// Balances do not sum to zero within tolerance
    #[error("Balances are not zero-sum: off by {sum}")]
    Imbalanced { sum: String },

    /// Bad rounding/tolerance configuration
    #[error("Invalid precision: {0}")]
    InvalidPrecision(String),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: trip-settle <events.csv> [--plan]")]
    MissingArgument,
}
