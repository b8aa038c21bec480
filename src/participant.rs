//! Trip participant and the balance operations applied to it.
//!
//! `owed > 0` means the group owes this participant; `owed < 0` means the
//! participant owes the group.

use crate::money::Money;
use serde::Serialize;

/// Participant identifier, unique within one trip.
pub type ParticipantId = u32;

/// One member of a trip together with their running balances.
///
/// # Invariants
///
/// - Across all participants of a trip, `owed` sums to zero within the
///   precision tolerance
/// - `amount_paid` only changes when this participant pays for an expense
///   (or in a simulated settlement)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,

    /// Display name.
    pub name: String,

    /// Total money physically contributed across every expense paid.
    pub amount_paid: Money,

    /// Net position against the group.
    pub owed: Money,
}

impl Participant {
    /// Creates a participant with zero balances.
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Participant {
            id,
            name: name.into(),
            amount_paid: Money::ZERO,
            owed: Money::ZERO,
        }
    }

    /// Records paying `amount` for an expense in which this participant's own
    /// share is `share`.
    pub fn pay(&mut self, amount: Money, share: Money) {
        self.amount_paid += amount;
        self.owed += amount - share;
    }

    /// Undoes [`Participant::pay`].
    pub fn unpay(&mut self, amount: Money, share: Money) {
        self.amount_paid -= amount;
        self.owed -= amount - share;
    }

    /// Charges this participant their share of someone else's expense.
    pub fn charge(&mut self, share: Money) {
        self.owed -= share;
    }

    /// Undoes [`Participant::charge`].
    pub fn refund(&mut self, share: Money) {
        self.owed += share;
    }
}

/// Sums `owed` across a balance set.
pub fn total_owed(participants: &[Participant]) -> Money {
    participants.iter().map(|p| p.owed).sum()
}
