//! Edge case tests for event replay, balance maintenance and settlement.

use std::io::Cursor;
use std::str::FromStr;
use trip_settle::{total_owed, Expense, LedgerError, Money, Participant, Trip, ValidationError};

fn run_csv(csv: &str) -> Trip {
    let mut trip = Trip::new("Edge");
    trip.process_csv(Cursor::new(csv)).unwrap();
    trip
}

fn balances_output(trip: &Trip) -> String {
    let mut output = Vec::new();
    trip.write_balances(&mut output).unwrap();
    String::from_utf8(output).unwrap()
}

fn get_line(output: &str, id: u32) -> Option<String> {
    output
        .lines()
        .skip(1) // Skip header
        .find(|line| line.starts_with(&format!("{},", id)))
        .map(|s| s.to_string())
}

fn parse_balance(line: &str) -> (String, String) {
    let parts: Vec<&str> = line.split(',').collect();
    (
        parts[2].to_string(), // amount_paid
        parts[3].to_string(), // owed
    )
}

fn money(s: &str) -> Money {
    Money::from_str(s).unwrap()
}

const HEADER: &str = "type,id,name,payer,amount,members";

// ==================== POSTING EDGE CASES ====================

#[test]
fn test_payer_not_listed_is_added() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Lunch,1,20,2", HEADER);

    let trip = run_csv(&csv);
    let output = balances_output(&trip);

    assert_eq!(
        parse_balance(&get_line(&output, 1).unwrap()),
        ("20.00".to_string(), "10.00".to_string())
    );
    assert_eq!(
        parse_balance(&get_line(&output, 2).unwrap()),
        ("0.00".to_string(), "-10.00".to_string())
    );
}

#[test]
fn test_payer_only_member() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Souvenir,1,25,1", HEADER);

    let trip = run_csv(&csv);
    let output = balances_output(&trip);

    // paying for yourself changes amount_paid but not owed
    assert_eq!(
        parse_balance(&get_line(&output, 1).unwrap()),
        ("25.00".to_string(), "0.00".to_string())
    );
    assert_eq!(trip.settle().count(), 0);
}

#[test]
fn test_repeated_members_count_once() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Taxi,1,30,1;2;2;2", HEADER);

    let trip = run_csv(&csv);
    assert_eq!(trip.participant(2).unwrap().owed, money("-15"));
}

#[test]
fn test_negative_amount_rejected() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Refund,1,-20,1;2", HEADER);

    let trip = run_csv(&csv);
    assert!(trip.expenses().is_empty());
    assert!(trip.participants().iter().all(|p| p.owed.is_zero()));
}

#[test]
fn test_unbalanced_exact_split_rejected() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Bar,1,30,1=10;2=10", HEADER);

    let trip = run_csv(&csv);
    assert!(trip.expenses().is_empty());
}

#[test]
fn test_exact_split_off_by_a_cent_rejected() {
    let mut csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,", HEADER);
    for id in 1..=3 {
        csv.push_str(&format!("\nexpense,{},Bar,1,30,1=10.00;2=19.99", id));
    }
    csv.push_str("\nexpense,4,Bar,1,30,1=10.00;2=20.00");

    let trip = run_csv(&csv);
    assert_eq!(trip.expenses().len(), 1);
    assert_eq!(trip.expenses()[0].id, 4);
    assert!(total_owed(trip.participants()).is_zero());
    assert_eq!(trip.participant(2).unwrap().owed, money("-20"));
}

#[test]
fn test_zero_weights_rejected() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Fuel,1,30,1*0;2*0", HEADER);

    let trip = run_csv(&csv);
    assert!(trip.expenses().is_empty());
}

#[test]
fn test_expense_before_anyone_joins() {
    let csv = format!("{}\nexpense,1,Early,1,30,\njoin,1,Alice,,,", HEADER);

    let trip = run_csv(&csv);
    assert!(trip.expenses().is_empty());
    assert_eq!(trip.participants().len(), 1);
}

#[test]
fn test_many_way_split_keeps_zero_sum() {
    let mut csv = HEADER.to_string();
    for id in 1..=7 {
        csv.push_str(&format!("\njoin,{},P{},,,", id, id));
    }
    csv.push_str("\nexpense,1,Villa,1,1000,");
    csv.push_str("\nexpense,2,Boat,3,333.33,2;3;5");
    csv.push_str("\nexpense,3,Snacks,7,10.01,");
    csv.push_str("\nexpense,4,Fuel,2,100,1*1;2*2;4*3;6*1");

    let trip = run_csv(&csv);
    assert_eq!(trip.expenses().len(), 4);
    assert!(total_owed(trip.participants()).is_zero());
    assert!(trip.settle_checked().unwrap().is_balanced());
}

#[test]
fn test_repeated_uneven_splits_keep_zero_sum() {
    let mut csv = HEADER.to_string();
    for id in 1..=12 {
        csv.push_str(&format!("\njoin,{},P{},,,", id, id));
    }
    for id in 1..=30 {
        csv.push_str(&format!("\nexpense,{},Villa,1,100,", id));
    }

    let trip = run_csv(&csv);
    assert_eq!(trip.expenses().len(), 30);
    assert!(total_owed(trip.participants()).is_zero());

    let settlement = trip.settle_checked().unwrap();
    assert_eq!(settlement.count(), 11);
    assert!(settlement.is_balanced());
}

// ==================== REVERSAL EDGE CASES ====================

#[test]
fn test_reverse_unknown_expense_ignored() {
    let csv = format!(
        "{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Dinner,1,100,\nreverse,99,,,,",
        HEADER
    );

    let trip = run_csv(&csv);
    assert_eq!(trip.expenses().len(), 1);
    assert_eq!(trip.participant(1).unwrap().owed, money("50"));
}

#[test]
fn test_double_reverse() {
    let csv = format!(
        "{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Dinner,1,100,\nreverse,1,,,,\nreverse,1,,,,",
        HEADER
    );

    let trip = run_csv(&csv);
    assert!(trip.participants().iter().all(|p| p.owed.is_zero()));
}

#[test]
fn test_reverse_then_repost_same_id() {
    let csv = format!(
        "{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Dinner,1,100,\nreverse,1,,,,\nexpense,1,Dinner,2,80,",
        HEADER
    );

    let trip = run_csv(&csv);
    assert_eq!(trip.participant(1).unwrap().owed, money("-40"));
    assert_eq!(trip.participant(2).unwrap().owed, money("40"));
    assert_eq!(trip.amount(), money("80"));
}

#[test]
fn test_reverse_after_late_join_uses_original_shares() {
    let csv = format!(
        "{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Dinner,1,90,\njoin,3,Carol,,,\nexpense,2,Lunch,3,30,\nreverse,1,,,,",
        HEADER
    );

    let trip = run_csv(&csv);
    assert_eq!(trip.participant(1).unwrap().owed, money("-10"));
    assert_eq!(trip.participant(2).unwrap().owed, money("-10"));
    assert_eq!(trip.participant(3).unwrap().owed, money("20"));
}

#[test]
fn test_reverse_out_of_order() {
    let csv = format!(
        "{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,A,1,10,\nexpense,2,B,2,50,\nexpense,3,C,1,30,\nreverse,2,,,,",
        HEADER
    );

    let trip = run_csv(&csv);
    assert_eq!(trip.participant(1).unwrap().owed, money("20"));
    assert_eq!(
        trip.expenses().iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![1, 3]
    );
}

// ==================== MEMBERSHIP EDGE CASES ====================

#[test]
fn test_leave_without_history() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nleave,2,,,,", HEADER);

    let trip = run_csv(&csv);
    assert_eq!(trip.participants().len(), 1);
}

#[test]
fn test_leave_with_history_refused() {
    let csv = format!(
        "{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Dinner,1,10,\nleave,2,,,,",
        HEADER
    );

    let trip = run_csv(&csv);
    assert_eq!(trip.participants().len(), 2);
}

#[test]
fn test_leave_after_reversal_allowed() {
    let csv = format!(
        "{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Dinner,1,10,\nreverse,1,,,,\nleave,2,,,,",
        HEADER
    );

    let trip = run_csv(&csv);
    assert_eq!(trip.participants().len(), 1);
}

#[test]
fn test_duplicate_join_ignored() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,1,Impostor,,,", HEADER);

    let trip = run_csv(&csv);
    assert_eq!(trip.participants().len(), 1);
    assert_eq!(trip.participant(1).unwrap().name, "Alice");
}

// ==================== LIBRARY ERRORS ====================

#[test]
fn test_post_error_names_the_problem() {
    let mut trip = Trip::new("Errors");
    trip.add_participant(1, "Alice").unwrap();

    let err = trip
        .post_expense(Expense::equal(7, "Ghost", money("10"), 1, &[5]))
        .unwrap_err();

    match err {
        LedgerError::Validation(ValidationError::UnknownParticipant {
            expense,
            participant,
        }) => {
            assert_eq!(expense, 7);
            assert_eq!(participant, 5);
        }
        other => panic!("Expected UnknownParticipant, got {:?}", other),
    }
}

#[test]
fn test_error_messages() {
    let err = LedgerError::from(ValidationError::EmptyMembership { expense: 3 });
    assert_eq!(err.to_string(), "Validation error: Expense 3 has no participants");

    let err = LedgerError::Imbalanced {
        sum: "5.0000".to_string(),
    };
    assert_eq!(err.to_string(), "Balances are not zero-sum: off by 5.0000");
}

// ==================== SETTLEMENT EDGE CASES ====================

#[test]
fn test_settle_reports_imbalance() {
    let mut a = Participant::new(1, "Alice");
    a.owed = money("100");
    let mut b = Participant::new(2, "Bob");
    b.owed = money("-40");

    let trip_plan = trip_settle::SettlementSolver::default().settle(&[a.clone(), b.clone()]);
    assert_eq!(trip_plan.count(), 1);
    assert!(!trip_plan.is_balanced());

    let err = trip_settle::SettlementSolver::default()
        .settle_checked(&[a, b])
        .unwrap_err();
    assert!(matches!(err, LedgerError::Imbalanced { .. }));
}

#[test]
fn test_settle_does_not_mutate_trip() {
    let csv = format!("{}\njoin,1,Alice,,,\njoin,2,Bob,,,\nexpense,1,Dinner,1,100,", HEADER);

    let trip = run_csv(&csv);
    let before = trip.participants().to_vec();
    let first = trip.settle();
    let second = trip.settle();

    assert_eq!(trip.participants(), before.as_slice());
    assert_eq!(first.transactions, second.transactions);
}

#[test]
fn test_chain_of_debts() {
    // Alice paid for Bob, Bob paid the same for Carol: Carol ends up paying Alice directly
    let csv = format!(
        "{}\njoin,1,Alice,,,\njoin,2,Bob,,,\njoin,3,Carol,,,\nexpense,1,Lunch,1,20,2=20\nexpense,2,Dinner,2,20,3=20",
        HEADER
    );

    let trip = run_csv(&csv);
    let plan = trip.settle();

    assert_eq!(plan.lines(), vec!["Carol owes Alice: $20.00".to_string()]);
}
