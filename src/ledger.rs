//! Balance maintenance: applying and undoing expense postings.
//!
//! Both operations are pure. They validate the expense against the given
//! balance set first and return a new balance set; the input is never
//! modified, so a rejected expense leaves no partial deltas behind.

use crate::error::{Result, ValidationError};
use crate::expense::Expense;
use crate::money::Money;
use crate::participant::{Participant, ParticipantId};
use log::debug;

/// Applies expense events to participant balances.
///
/// Postings are exact at storage scale: an expense is only accepted when its
/// shares add up to its amount to the last unit, so the sum of all balances
/// stays exactly zero however many expenses are posted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ledger;

impl Ledger {
    /// Posts `expense` against `participants`.
    ///
    /// The payer's `amount_paid` grows by the full amount and their `owed`
    /// by the amount minus their own share; every other member's `owed`
    /// drops by their share. Participants outside the expense are untouched.
    pub fn post_expense(
        &self,
        expense: &Expense,
        participants: &[Participant],
    ) -> Result<Vec<Participant>> {
        self.validate(expense, participants)?;

        let updated = apply(expense, participants, |p, share, is_payer| {
            if is_payer {
                p.pay(expense.amount, share);
            } else {
                p.charge(share);
            }
        });

        debug!(
            "Posted expense {} ({}) paid by {} across {} members",
            expense.id,
            expense.amount,
            expense.payer,
            expense.shares.len()
        );
        Ok(updated)
    }

    /// Reverses a previously posted `expense`, using the shares stored on it.
    pub fn reverse_expense(
        &self,
        expense: &Expense,
        participants: &[Participant],
    ) -> Result<Vec<Participant>> {
        if expense.shares.is_empty() {
            return Err(ValidationError::MissingShares {
                expense: expense.id,
            }
            .into());
        }
        self.validate(expense, participants)?;

        let updated = apply(expense, participants, |p, share, is_payer| {
            if is_payer {
                p.unpay(expense.amount, share);
            } else {
                p.refund(share);
            }
        });

        debug!(
            "Reversed expense {} ({}) paid by {}",
            expense.id, expense.amount, expense.payer
        );
        Ok(updated)
    }

    /// Checks every precondition of posting (and reversing) `expense`.
    pub fn validate(&self, expense: &Expense, participants: &[Participant]) -> Result<()> {
        if !expense.amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount {
                expense: expense.id,
                amount: expense.amount.to_string(),
            }
            .into());
        }

        if expense.shares.is_empty() {
            return Err(ValidationError::EmptyMembership {
                expense: expense.id,
            }
            .into());
        }

        let known = |id: ParticipantId| participants.iter().any(|p| p.id == id);

        if !known(expense.payer) {
            return Err(ValidationError::UnknownParticipant {
                expense: expense.id,
                participant: expense.payer,
            }
            .into());
        }

        // the builders always record a payer share, zero for exact splits
        if expense.share_of(expense.payer).is_none() {
            return Err(ValidationError::PayerNotInShares {
                expense: expense.id,
                payer: expense.payer,
            }
            .into());
        }

        for share in &expense.shares {
            if !known(share.participant) {
                return Err(ValidationError::UnknownParticipant {
                    expense: expense.id,
                    participant: share.participant,
                }
                .into());
            }
            if share.amount.is_negative() {
                return Err(ValidationError::NegativeShare {
                    expense: expense.id,
                    participant: share.participant,
                    share: share.amount.to_string(),
                }
                .into());
            }
        }

        let shares = expense.shares_total();
        if shares != expense.amount {
            return Err(ValidationError::SharesMismatch {
                expense: expense.id,
                amount: expense.amount.to_string(),
                shares: shares.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Clones `participants` and runs `delta` once per member of `expense`.
fn apply<F>(expense: &Expense, participants: &[Participant], mut delta: F) -> Vec<Participant>
where
    F: FnMut(&mut Participant, Money, bool),
{
    let mut updated = participants.to_vec();
    for participant in updated.iter_mut() {
        if let Some(share) = expense.share_of(participant.id) {
            let is_payer = participant.id == expense.payer;
            delta(participant, share, is_payer);
        }
    }
    updated
}
