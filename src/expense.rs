//! Expense model, split rules and the CSV event records that feed a trip.

use crate::money::Money;
use crate::participant::ParticipantId;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Expense identifier, unique within one trip.
pub type ExpenseId = u32;

/// The portion of one expense attributed to one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Share {
    pub participant: ParticipantId,
    pub amount: Money,
}

/// How an expense's cost was divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMethod {
    /// Every member owes `amount / count(members)`.
    Equal,

    /// Each member owes an explicit amount.
    Exact,

    /// Each member owes `amount * weight / sum(weights)`.
    Weighted,
}

/// A cost paid by one participant and shared by several.
///
/// Shares are computed once, when the expense is built, and reused verbatim
/// when the expense is reversed. The payer always has a share entry, even if
/// it is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Money,
    pub payer: ParticipantId,
    pub split: SplitMethod,
    pub shares: Vec<Share>,
}

impl Expense {
    /// Builds an equally split expense. The payer is added to `members` if
    /// missing; duplicate members count once. Shares always add up to
    /// exactly `amount`: the leftover 0.0001 units go to the first members.
    pub fn equal(
        id: ExpenseId,
        description: impl Into<String>,
        amount: Money,
        payer: ParticipantId,
        members: &[ParticipantId],
    ) -> Self {
        let mut ids: Vec<ParticipantId> = Vec::with_capacity(members.len() + 1);
        for &member in members {
            if !ids.contains(&member) {
                ids.push(member);
            }
        }
        if !ids.contains(&payer) {
            ids.push(payer);
        }

        let parts = amount.allocate(&vec![Decimal::ONE; ids.len()]);
        let shares = ids
            .into_iter()
            .zip(parts)
            .map(|(participant, amount)| Share {
                participant,
                amount,
            })
            .collect();

        Expense {
            id,
            description: description.into(),
            amount,
            payer,
            split: SplitMethod::Equal,
            shares,
        }
    }

    /// Builds an expense with explicit per-participant amounts. Repeated
    /// participants are merged. The caller is responsible for the amounts
    /// adding up to `amount`; posting rejects them otherwise.
    pub fn exact(
        id: ExpenseId,
        description: impl Into<String>,
        amount: Money,
        payer: ParticipantId,
        amounts: &[(ParticipantId, Money)],
    ) -> Self {
        let mut shares: Vec<Share> = Vec::with_capacity(amounts.len() + 1);
        for &(participant, share) in amounts {
            match shares.iter_mut().find(|s| s.participant == participant) {
                Some(existing) => existing.amount += share,
                None => shares.push(Share {
                    participant,
                    amount: share,
                }),
            }
        }
        if !shares.iter().any(|s| s.participant == payer) {
            shares.push(Share {
                participant: payer,
                amount: Money::ZERO,
            });
        }

        Expense {
            id,
            description: description.into(),
            amount,
            payer,
            split: SplitMethod::Exact,
            shares,
        }
    }

    /// Builds an expense split in proportion to `weights`. The payer gets a
    /// zero weight if absent.
    pub fn weighted(
        id: ExpenseId,
        description: impl Into<String>,
        amount: Money,
        payer: ParticipantId,
        weights: &[(ParticipantId, Decimal)],
    ) -> Self {
        let mut merged: Vec<(ParticipantId, Decimal)> = Vec::with_capacity(weights.len() + 1);
        for &(participant, weight) in weights {
            match merged.iter_mut().find(|(p, _)| *p == participant) {
                Some(existing) => existing.1 += weight,
                None => merged.push((participant, weight)),
            }
        }
        if !merged.iter().any(|(p, _)| *p == payer) {
            merged.push((payer, Decimal::ZERO));
        }

        let weights: Vec<Decimal> = merged.iter().map(|(_, w)| *w).collect();
        let shares = merged
            .into_iter()
            .zip(amount.allocate(&weights))
            .map(|((participant, _), amount)| Share {
                participant,
                amount,
            })
            .collect();

        Expense {
            id,
            description: description.into(),
            amount,
            payer,
            split: SplitMethod::Weighted,
            shares,
        }
    }

    /// The nominal per-person cost of an equal split, before leftover units
    /// are handed out.
    pub fn per_person(&self) -> Option<Money> {
        match self.split {
            SplitMethod::Equal if !self.shares.is_empty() => {
                Some(self.amount.split_evenly(self.shares.len()))
            }
            _ => None,
        }
    }

    /// Returns the recorded share of `participant`, if they are a member.
    pub fn share_of(&self, participant: ParticipantId) -> Option<Money> {
        self.shares
            .iter()
            .find(|s| s.participant == participant)
            .map(|s| s.amount)
    }

    /// Participants sharing the cost, payer included.
    pub fn members(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.shares.iter().map(|s| s.participant)
    }

    /// Returns `true` if `participant` paid for or shares this expense.
    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.payer == participant || self.share_of(participant).is_some()
    }

    /// Sum of all recorded shares.
    pub fn shares_total(&self) -> Money {
        self.shares.iter().map(|s| s.amount).sum()
    }
}

/// Raw event record as read from CSV.
///
/// Columns: `type,id,name,payer,amount,members`. Only `type` and `id` are
/// present on every row.
#[derive(Debug, Deserialize)]
pub struct EventRecord {
    /// Event type: join, leave, expense, reverse
    #[serde(rename = "type")]
    pub event_type: String,

    /// Participant ID for join/leave, expense ID otherwise
    pub id: u32,

    /// Participant name for join, description for expense
    pub name: Option<String>,

    /// Paying participant (expense only)
    pub payer: Option<u32>,

    /// Expense cost (expense only)
    pub amount: Option<String>,

    /// Split specification (expense only)
    pub members: Option<String>,
}

/// Who shares an expense, as written in the `members` column.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberSpec {
    /// Empty column: every current participant, equal split.
    Everyone,

    /// `1;2;3`
    Equal(Vec<ParticipantId>),

    /// `1=10.00;2=20.00`
    Exact(Vec<(ParticipantId, Money)>),

    /// `1*2;2*1`
    Weighted(Vec<(ParticipantId, Decimal)>),
}

impl MemberSpec {
    /// Parses the `members` column. Returns `None` on malformed or mixed
    /// entries.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw.map(str::trim).unwrap_or("");
        if raw.is_empty() {
            return Some(MemberSpec::Everyone);
        }

        let parts: Vec<&str> = raw
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.iter().all(|p| p.contains('=')) {
            let amounts = parts
                .iter()
                .map(|p| {
                    let (id, amount) = p.split_once('=')?;
                    Some((
                        id.trim().parse::<ParticipantId>().ok()?,
                        Money::from_str(amount).ok()?,
                    ))
                })
                .collect::<Option<Vec<_>>>()?;
            Some(MemberSpec::Exact(amounts))
        } else if parts.iter().all(|p| p.contains('*')) {
            let weights = parts
                .iter()
                .map(|p| {
                    let (id, weight) = p.split_once('*')?;
                    Some((
                        id.trim().parse::<ParticipantId>().ok()?,
                        Decimal::from_str(weight.trim()).ok()?,
                    ))
                })
                .collect::<Option<Vec<_>>>()?;
            Some(MemberSpec::Weighted(weights))
        } else {
            let ids = parts
                .iter()
                .map(|p| p.parse::<ParticipantId>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some(MemberSpec::Equal(ids))
        }
    }
}

/// A parsed event ready to be applied to a trip.
#[derive(Debug, Clone, PartialEq)]
pub enum TripEvent {
    /// A participant joins the trip.
    Join { id: ParticipantId, name: String },

    /// An unreferenced participant leaves the trip.
    Leave { id: ParticipantId },

    /// A new expense is posted.
    Expense {
        id: ExpenseId,
        description: String,
        payer: ParticipantId,
        amount: Money,
        members: MemberSpec,
    },

    /// A posted expense is reversed.
    Reverse { id: ExpenseId },
}

impl EventRecord {
    /// Parses the raw CSV record into a typed event.
    ///
    /// Returns `None` if the record is invalid (unknown type, missing payer
    /// or amount, malformed members, etc.).
    pub fn parse(&self) -> Option<TripEvent> {
        let event_type = self.event_type.trim().to_lowercase();

        match event_type.as_str() {
            "join" => {
                let name = self.name.as_deref().map(str::trim).unwrap_or("");
                if name.is_empty() {
                    return None;
                }
                Some(TripEvent::Join {
                    id: self.id,
                    name: name.to_string(),
                })
            }
            "leave" => Some(TripEvent::Leave { id: self.id }),
            "expense" => Some(TripEvent::Expense {
                id: self.id,
                description: self
                    .name
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or("")
                    .to_string(),
                payer: self.payer?,
                amount: self.parse_amount()?,
                members: MemberSpec::parse(self.members.as_deref())?,
            }),
            "reverse" => Some(TripEvent::Reverse { id: self.id }),
            _ => None,
        }
    }

    /// Parses the amount field into `Money`.
    fn parse_amount(&self) -> Option<Money> {
        let amount_str = self.amount.as_ref()?;
        let trimmed = amount_str.trim();
        if trimmed.is_empty() {
            return None;
        }
        Money::from_str(trimmed).ok()
    }
}
