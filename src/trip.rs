//! Trip container: participants, posted expenses and cached aggregates.
//!
//! Events are applied one at a time against the latest balances. Every
//! mutation goes through [`Ledger`], so a rejected event leaves the trip
//! exactly as it was.

use crate::error::{LedgerError, Result};
use crate::expense::{EventRecord, Expense, ExpenseId, MemberSpec, TripEvent};
use crate::ledger::Ledger;
use crate::money::Money;
use crate::participant::{Participant, ParticipantId};
use crate::precision::Precision;
use crate::settlement::{Settlement, SettlementSolver};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::io::{Read, Write};

/// A named group of participants sharing expenses.
///
/// # Output Ordering
///
/// Balances are written sorted by participant ID; settlement plans follow
/// join order.
#[derive(Debug, Clone)]
pub struct Trip {
    name: String,

    /// Participants in join order.
    participants: Vec<Participant>,

    /// Posted expenses in posting order.
    expenses: Vec<Expense>,

    /// Sum of all posted expense amounts.
    amount: Money,

    ledger: Ledger,
    solver: SettlementSolver,
}

impl Trip {
    /// Creates an empty trip with the default precision.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_precision(name, Precision::default())
    }

    pub fn with_precision(name: impl Into<String>, precision: Precision) -> Self {
        Trip {
            name: name.into(),
            participants: Vec::new(),
            expenses: Vec::new(),
            amount: Money::ZERO,
            ledger: Ledger,
            solver: SettlementSolver::new(precision),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    /// Cached sum of posted expense amounts. Informational only.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// `amount / count(participants)`, zero for an empty trip.
    pub fn per_person_average(&self) -> Money {
        self.amount.split_evenly(self.participants.len())
    }

    /// Adds a participant with zero balances. Earlier expenses are not
    /// redistributed.
    pub fn add_participant(&mut self, id: ParticipantId, name: impl Into<String>) -> Result<()> {
        if self.participant(id).is_some() {
            return Err(LedgerError::DuplicateParticipant(id));
        }
        let participant = Participant::new(id, name);
        debug!("Participant {} ({}) joined", id, participant.name);
        self.participants.push(participant);
        Ok(())
    }

    /// Removes a participant that no posted expense refers to.
    pub fn remove_participant(&mut self, id: ParticipantId) -> Result<Participant> {
        let idx = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(LedgerError::UnknownParticipant(id))?;

        if let Some(expense) = self.expenses.iter().find(|e| e.involves(id)) {
            return Err(LedgerError::ParticipantReferenced {
                participant: id,
                expense: expense.id,
            });
        }

        debug!("Participant {} left", id);
        Ok(self.participants.remove(idx))
    }

    /// Posts `expense` and appends it to the trip history.
    pub fn post_expense(&mut self, expense: Expense) -> Result<()> {
        if self.expense(expense.id).is_some() {
            return Err(LedgerError::DuplicateExpense(expense.id));
        }

        self.participants = self.ledger.post_expense(&expense, &self.participants)?;
        self.amount += expense.amount;
        self.expenses.push(expense);
        Ok(())
    }

    /// Reverses the posted expense `id` and drops it from the history.
    pub fn reverse_expense(&mut self, id: ExpenseId) -> Result<Expense> {
        let idx = self
            .expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or(LedgerError::UnknownExpense(id))?;

        self.participants = self
            .ledger
            .reverse_expense(&self.expenses[idx], &self.participants)?;
        let expense = self.expenses.remove(idx);
        self.amount -= expense.amount;
        Ok(expense)
    }

    /// Best-effort settlement plan for the current balances.
    pub fn settle(&self) -> Settlement {
        self.solver.settle(&self.participants)
    }

    /// Settlement plan that fails if balances are not zero-sum.
    pub fn settle_checked(&self) -> Result<Settlement> {
        self.solver.settle_checked(&self.participants)
    }

    /// Applies one parsed event.
    pub fn apply_event(&mut self, event: TripEvent) -> Result<()> {
        match event {
            TripEvent::Join { id, name } => self.add_participant(id, name),
            TripEvent::Leave { id } => self.remove_participant(id).map(|_| ()),
            TripEvent::Expense {
                id,
                description,
                payer,
                amount,
                members,
            } => {
                let expense = match members {
                    MemberSpec::Everyone => {
                        let everyone: Vec<ParticipantId> =
                            self.participants.iter().map(|p| p.id).collect();
                        Expense::equal(id, description, amount, payer, &everyone)
                    }
                    MemberSpec::Equal(ids) => Expense::equal(id, description, amount, payer, &ids),
                    MemberSpec::Exact(amounts) => {
                        Expense::exact(id, description, amount, payer, &amounts)
                    }
                    MemberSpec::Weighted(weights) => {
                        Expense::weighted(id, description, amount, payer, &weights)
                    }
                };
                self.post_expense(expense)
            }
            TripEvent::Reverse { id } => self.reverse_expense(id).map(|_| ()),
        }
    }

    /// Replays events from a CSV reader in order.
    ///
    /// Invalid or rejected rows are logged at warn level and skipped.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<EventRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => {
                    if let Some(event) = record.parse() {
                        if let Err(e) = self.apply_event(event) {
                            warn!("Row {}: {}", row_num, e);
                        }
                    } else {
                        warn!("Row {}: Failed to parse event record", row_num);
                    }
                }
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        Ok(())
    }

    /// Writes participant balances as CSV, sorted by participant ID.
    pub fn write_balances<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut participants: Vec<_> = self.participants.iter().collect();
        participants.sort_by_key(|p| p.id);

        if participants.is_empty() {
            csv_writer.write_record(["id", "name", "amount_paid", "owed"])?;
        }
        for participant in participants {
            csv_writer.serialize(participant)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the settlement plan, one payment per line, then the summary.
    pub fn write_plan<W: Write>(&self, mut writer: W) -> Result<()> {
        let settlement = self.settle();
        for line in settlement.lines() {
            writeln!(writer, "{}", line)?;
        }
        writeln!(writer, "{}", settlement.summary())?;
        writer.flush()?;
        Ok(())
    }
}
