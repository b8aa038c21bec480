//! Greedy settlement: who pays whom so that every balance reaches zero.
//!
//! Each step matches the participant owed the most against the participant
//! owing the most and zeroes at least one of them, so a trip of `N`
//! participants settles in at most `N - 1` payments. The loop is capped at
//! that bound; malformed input (balances not summing to zero) stops early
//! and leaves a residual instead of looping.
//!
//! Before matching, balances are rounded to the precision scale and the
//! rounding drift is handed back one unit at a time, so that well-formed
//! input settles without a leftover cent.
//!
//! The result is deterministic but not guaranteed to be the smallest
//! possible number of payments.

use crate::error::{LedgerError, Result};
use crate::money::Money;
use crate::participant::{total_owed, Participant, ParticipantId};
use crate::precision::Precision;
use log::{debug, warn};
use std::fmt;

/// One proposed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementTransaction {
    /// Paying participant (the debtor).
    pub from: ParticipantId,
    pub from_name: String,

    /// Receiving participant (the creditor).
    pub to: ParticipantId,
    pub to_name: String,

    pub amount: Money,
}

impl SettlementTransaction {
    /// Renders `"<debtor> owes <creditor>: $<amount>"` at `scale` decimals.
    pub fn describe(&self, scale: u32) -> String {
        format!(
            "{} owes {}: ${}",
            self.from_name,
            self.to_name,
            self.amount.format(scale)
        )
    }
}

impl fmt::Display for SettlementTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(Money::DISPLAY_SCALE))
    }
}

/// Renders a payment count for display.
pub fn summarize_count(count: usize) -> String {
    match count {
        0 => "Everyone is settled up".to_string(),
        1 => "1 payment to settle up".to_string(),
        n => format!("{} payments to settle up", n),
    }
}

/// Solver output: the ordered payments and the balances left after
/// replaying them.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub transactions: Vec<SettlementTransaction>,

    /// Working balances after the last step. All within epsilon of zero for
    /// well-formed input.
    pub residual: Vec<Participant>,

    precision: Precision,
}

impl Settlement {
    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    /// Total money changing hands.
    pub fn total_moved(&self) -> Money {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Returns `true` if every residual balance is within epsilon of zero.
    pub fn is_balanced(&self) -> bool {
        self.residual
            .iter()
            .all(|p| self.precision.is_settled(p.owed))
    }

    /// Human-readable payment count.
    pub fn summary(&self) -> String {
        summarize_count(self.count())
    }

    /// One rendered line per payment, in order.
    pub fn lines(&self) -> Vec<String> {
        self.transactions
            .iter()
            .map(|t| t.describe(self.precision.scale))
            .collect()
    }
}

/// Computes settlement plans from balance snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementSolver {
    precision: Precision,
}

impl SettlementSolver {
    pub fn new(precision: Precision) -> Self {
        SettlementSolver { precision }
    }

    /// Produces a best-effort settlement plan.
    ///
    /// Never fails. If the balances do not sum to zero the plan leaves a
    /// residual, a warning is logged, and [`Settlement::is_balanced`] returns
    /// `false`.
    pub fn settle(&self, participants: &[Participant]) -> Settlement {
        let sum = total_owed(participants);
        if !self.precision.is_settled(sum) {
            warn!(
                "Settling balances that sum to {} instead of zero",
                sum.format(Money::SCALE)
            );
        }

        let mut balances = self.quantized(participants);
        let mut transactions = Vec::new();
        let max_steps = participants.len().saturating_sub(1);

        for _ in 0..max_steps {
            match self.step(&balances) {
                Some((next, transaction)) => {
                    debug!(
                        "{} pays {} {}",
                        transaction.from, transaction.to, transaction.amount
                    );
                    balances = next;
                    transactions.push(transaction);
                }
                None => break,
            }
        }

        let settlement = Settlement {
            transactions,
            residual: balances,
            precision: self.precision,
        };
        if !settlement.is_balanced() {
            warn!(
                "Settlement left a residual of {} after {} payments",
                total_owed(&settlement.residual),
                settlement.count()
            );
        }
        settlement
    }

    /// Like [`SettlementSolver::settle`], but rejects balances whose sum is
    /// further than epsilon from zero.
    pub fn settle_checked(&self, participants: &[Participant]) -> Result<Settlement> {
        let sum = total_owed(participants);
        if !self.precision.is_settled(sum) {
            return Err(LedgerError::Imbalanced {
                sum: sum.format(Money::SCALE),
            });
        }
        Ok(self.settle(participants))
    }

    /// Runs one greedy matching step over `balances`, returning the next
    /// snapshot and the payment made, or `None` once nothing is left to
    /// match.
    pub fn step(
        &self,
        balances: &[Participant],
    ) -> Option<(Vec<Participant>, SettlementTransaction)> {
        let mut next = self.rounded(balances);
        if next.iter().all(|p| self.precision.is_settled(p.owed)) {
            return None;
        }

        let (creditor, debtor) = extremes(&next)?;
        let claim = next[creditor].owed;
        let epsilon = self.precision.epsilon;
        if claim <= epsilon || next[debtor].owed >= -epsilon {
            // one-sided balances: nobody left to pay or to be paid
            return None;
        }
        let debt = next[debtor].owed.abs();

        let transfer = if claim >= debt {
            next[creditor].owed = self.precision.round(claim - debt);
            next[debtor].owed = Money::ZERO;
            debt
        } else {
            next[debtor].owed = self.precision.round(next[debtor].owed + claim);
            next[creditor].owed = Money::ZERO;
            claim
        };

        next[debtor].amount_paid = self.precision.round(next[debtor].amount_paid + transfer);
        next[creditor].amount_paid = self.precision.round(next[creditor].amount_paid - transfer);

        let transaction = SettlementTransaction {
            from: next[debtor].id,
            from_name: next[debtor].name.clone(),
            to: next[creditor].id,
            to_name: next[creditor].name.clone(),
            amount: self.precision.round(transfer),
        };
        Some((next, transaction))
    }

    /// Rounds every balance to the policy scale. When the exact balances are
    /// zero-sum, the units gained or lost to rounding are then returned to the
    /// participants rounding moved furthest in that direction (first
    /// occurrence on ties), so the rounded sum equals the rounded exact sum.
    pub fn quantized(&self, participants: &[Participant]) -> Vec<Participant> {
        let mut balances = self.rounded(participants);
        let exact = total_owed(participants);
        if !self.precision.is_settled(exact) {
            return balances;
        }

        let target = self.precision.round(exact);
        let drift = total_owed(&balances) - target;
        if drift.is_zero() {
            return balances;
        }

        let unit = Money::unit(self.precision.scale);
        let step = if drift.is_positive() { -unit } else { unit };
        let shift = |idx: usize| balances[idx].owed - participants[idx].owed;

        let mut order: Vec<usize> = (0..balances.len()).collect();
        if drift.is_positive() {
            order.sort_by(|&a, &b| shift(b).cmp(&shift(a)));
        } else {
            order.sort_by(|&a, &b| shift(a).cmp(&shift(b)));
        }

        let mut remaining = drift;
        for idx in order.into_iter().cycle() {
            if remaining.is_zero() {
                break;
            }
            balances[idx].owed += step;
            remaining += step;
        }

        debug!("Returned {} of rounding drift", drift);
        balances
    }

    fn rounded(&self, balances: &[Participant]) -> Vec<Participant> {
        balances
            .iter()
            .map(|p| Participant {
                owed: self.precision.round(p.owed),
                ..p.clone()
            })
            .collect()
    }
}

/// Indices of the first maximum and the first minimum `owed`.
fn extremes(balances: &[Participant]) -> Option<(usize, usize)> {
    let first = balances.first()?;
    let (mut max_idx, mut max) = (0, first.owed);
    let (mut min_idx, mut min) = (0, first.owed);

    for (idx, p) in balances.iter().enumerate().skip(1) {
        if p.owed > max {
            max_idx = idx;
            max = p.owed;
        }
        if p.owed < min {
            min_idx = idx;
            min = p.owed;
        }
    }

    Some((max_idx, min_idx))
}
