//! Balance derivation and settlement.
//!
//! Everything here is a pure function of its inputs. Stats are recomputed from
//! the full transaction set on every query and never stored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use ledgerbook_core::PersonId;

use crate::person::Person;
use crate::transaction::{Amount, Direction, NewTransaction, SETTLEMENT_DESCRIPTION, Transaction};

/// Per-person totals, in minor units.
///
/// `net` is credit minus debit: positive means the person owes the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonStats {
    pub person_id: PersonId,
    pub total_credit: i64,
    pub total_debit: i64,
    pub net: i64,
}

impl PersonStats {
    pub fn empty(person_id: PersonId) -> Self {
        Self {
            person_id,
            total_credit: 0,
            total_debit: 0,
            net: 0,
        }
    }

    fn record(&mut self, tx: &Transaction) {
        match tx.direction {
            Direction::Credit => self.total_credit += tx.amount.minor_units(),
            Direction::Debit => self.total_debit += tx.amount.minor_units(),
        }
        self.net = self.total_credit - self.total_debit;
    }

    pub fn is_settled(&self) -> bool {
        self.net == 0
    }
}

/// Totals across every person of one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrandTotals {
    pub total_credit: i64,
    pub total_debit: i64,
    pub net: i64,
}

impl GrandTotals {
    fn add(mut self, stats: &PersonStats) -> Self {
        self.total_credit += stats.total_credit;
        self.total_debit += stats.total_debit;
        self.net = self.total_credit - self.total_debit;
        self
    }
}

/// Stats for one person over an owner's transaction list.
///
/// Transactions for other people are skipped; no matching transactions yields zeros.
pub fn compute_stats(transactions: &[Transaction], person_id: PersonId) -> PersonStats {
    transactions
        .iter()
        .filter(|tx| tx.person_id == person_id)
        .fold(PersonStats::empty(person_id), |mut stats, tx| {
            stats.record(tx);
            stats
        })
}

/// Stats for every person, in the order of `people`, in a single pass over `transactions`.
pub fn compute_all_stats(people: &[Person], transactions: &[Transaction]) -> Vec<PersonStats> {
    let mut by_person: HashMap<PersonId, PersonStats> = people
        .iter()
        .map(|p| (p.id, PersonStats::empty(p.id)))
        .collect();

    for tx in transactions {
        if let Some(stats) = by_person.get_mut(&tx.person_id) {
            stats.record(tx);
        }
    }

    people
        .iter()
        .map(|p| by_person.get(&p.id).copied().unwrap_or_else(|| PersonStats::empty(p.id)))
        .collect()
}

/// Sum of credit and debit totals over `people`.
///
/// Transactions referencing a person outside `people` do not contribute.
pub fn compute_grand_totals(people: &[Person], transactions: &[Transaction]) -> GrandTotals {
    compute_all_stats(people, transactions)
        .iter()
        .fold(GrandTotals::default(), GrandTotals::add)
}

/// Build the transaction that brings `net` back to zero.
///
/// The settlement has the opposite polarity of the balance: a positive net
/// (credit-heavy) is cleared with a debit, a negative one with a credit.
/// Returns `None` when there is nothing to settle.
pub fn build_settlement(person_id: PersonId, net: i64) -> Option<NewTransaction> {
    let amount = Amount::of_balance(net)?;
    let direction = if net > 0 {
        Direction::Debit
    } else {
        Direction::Credit
    };

    Some(NewTransaction::new(
        person_id,
        amount,
        direction,
        Some(SETTLEMENT_DESCRIPTION),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use ledgerbook_core::{OwnerId, TransactionId};
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_person(owner_id: OwnerId, name: &str) -> Person {
        Person {
            id: PersonId::new(),
            owner_id,
            name: name.to_string(),
            created_at: test_time(),
        }
    }

    fn tx(owner_id: OwnerId, person_id: PersonId, amount: i64, direction: Direction) -> Transaction {
        let request = NewTransaction::new(person_id, Amount::new(amount).unwrap(), direction, None);
        Transaction::record(TransactionId::new(), owner_id, request, test_time())
    }

    fn apply(owner_id: OwnerId, request: NewTransaction) -> Transaction {
        Transaction::record(TransactionId::new(), owner_id, request, test_time())
    }

    #[test]
    fn person_without_transactions_has_zero_stats() {
        let owner = OwnerId::new();
        let alex = test_person(owner, "Alex");
        let other = test_person(owner, "Sam");
        let txs = vec![tx(owner, other.id, 500, Direction::Credit)];

        let stats = compute_stats(&txs, alex.id);
        assert_eq!(stats, PersonStats::empty(alex.id));
        assert!(stats.is_settled());
    }

    #[test]
    fn alex_scenario_settles_to_zero() {
        let owner = OwnerId::new();
        let alex = test_person(owner, "Alex");
        let mut txs = vec![
            tx(owner, alex.id, 200, Direction::Credit),
            tx(owner, alex.id, 50, Direction::Debit),
        ];

        let stats = compute_stats(&txs, alex.id);
        assert_eq!((stats.total_credit, stats.total_debit, stats.net), (200, 50, 150));

        let settlement = build_settlement(alex.id, stats.net).expect("non-zero net settles");
        assert_eq!(settlement.direction, Direction::Debit);
        assert_eq!(settlement.amount.minor_units(), 150);
        assert_eq!(settlement.description, SETTLEMENT_DESCRIPTION);

        txs.push(apply(owner, settlement));
        let stats = compute_stats(&txs, alex.id);
        assert_eq!((stats.total_credit, stats.total_debit, stats.net), (200, 200, 0));
        assert!(build_settlement(alex.id, stats.net).is_none());
    }

    #[test]
    fn negative_net_settles_with_credit() {
        let person_id = PersonId::new();
        let settlement = build_settlement(person_id, -75).unwrap();
        assert_eq!(settlement.person_id, person_id);
        assert_eq!(settlement.direction, Direction::Credit);
        assert_eq!(settlement.amount.minor_units(), 75);
        assert_eq!(settlement.description, "Full Settlement");
        assert_eq!(settlement.occurred_at, None);
    }

    #[test]
    fn zero_net_is_a_no_op() {
        assert_eq!(build_settlement(PersonId::new(), 0), None);
    }

    #[test]
    fn all_stats_follow_people_order() {
        let owner = OwnerId::new();
        let alex = test_person(owner, "Alex");
        let sam = test_person(owner, "Sam");
        let txs = vec![
            tx(owner, sam.id, 30, Direction::Debit),
            tx(owner, alex.id, 10, Direction::Credit),
        ];

        let stats = compute_all_stats(&[sam.clone(), alex.clone()], &txs);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].person_id, sam.id);
        assert_eq!(stats[0].net, -30);
        assert_eq!(stats[1].person_id, alex.id);
        assert_eq!(stats[1].net, 10);
    }

    #[test]
    fn grand_totals_skip_transactions_of_unknown_people() {
        let owner = OwnerId::new();
        let alex = test_person(owner, "Alex");
        let txs = vec![
            tx(owner, alex.id, 100, Direction::Credit),
            tx(owner, PersonId::new(), 999, Direction::Debit),
        ];

        let totals = compute_grand_totals(&[alex], &txs);
        assert_eq!(
            totals,
            GrandTotals {
                total_credit: 100,
                total_debit: 0,
                net: 100,
            }
        );
    }

    #[test]
    fn grand_totals_of_nobody_are_zero() {
        assert_eq!(compute_grand_totals(&[], &[]), GrandTotals::default());
    }

    fn ledger_strategy() -> impl Strategy<Value = (usize, Vec<(usize, i64, bool)>)> {
        (1usize..6).prop_flat_map(|people| {
            let entries = prop::collection::vec((0..people, 1i64..1_000_000i64, any::<bool>()), 0..40);
            (Just(people), entries)
        })
    }

    fn build_ledger(people: usize, entries: &[(usize, i64, bool)]) -> (Vec<Person>, Vec<Transaction>) {
        let owner = OwnerId::new();
        let people: Vec<Person> = (0..people).map(|i| test_person(owner, &format!("p{i}"))).collect();
        let txs = entries
            .iter()
            .map(|(idx, amount, is_credit)| {
                let direction = if *is_credit { Direction::Credit } else { Direction::Debit };
                tx(owner, people[*idx].id, *amount, direction)
            })
            .collect();
        (people, txs)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: net is always exactly credit minus debit.
        #[test]
        fn net_is_credit_minus_debit((people, entries) in ledger_strategy()) {
            let (people, txs) = build_ledger(people, &entries);
            for person in &people {
                let stats = compute_stats(&txs, person.id);
                prop_assert_eq!(stats.net, stats.total_credit - stats.total_debit);
            }
        }

        /// Property: grand totals equal the per-person sums, whatever the ordering.
        #[test]
        fn grand_totals_match_per_person_sums(
            (people, entries) in ledger_strategy(),
            rotate_by in 0usize..40,
        ) {
            let (mut people, mut txs) = build_ledger(people, &entries);

            let credit: i64 = people.iter().map(|p| compute_stats(&txs, p.id).total_credit).sum();
            let debit: i64 = people.iter().map(|p| compute_stats(&txs, p.id).total_debit).sum();
            let totals = compute_grand_totals(&people, &txs);
            prop_assert_eq!(totals.total_credit, credit);
            prop_assert_eq!(totals.total_debit, debit);
            prop_assert_eq!(totals.net, credit - debit);

            people.reverse();
            if !txs.is_empty() {
                let k = rotate_by % txs.len();
                txs.rotate_left(k);
            }
            prop_assert_eq!(compute_grand_totals(&people, &txs), totals);
        }

        /// Property: applying a settlement zeroes the balance; settling again is a no-op.
        #[test]
        fn settlement_zeroes_the_balance((people, entries) in ledger_strategy()) {
            let (people, mut txs) = build_ledger(people, &entries);
            let owner = people[0].owner_id;

            for person in &people {
                let net = compute_stats(&txs, person.id).net;
                if let Some(settlement) = build_settlement(person.id, net) {
                    prop_assert_eq!(settlement.amount.minor_units(), net.abs());
                    txs.push(apply(owner, settlement));
                } else {
                    prop_assert_eq!(net, 0);
                }

                let after = compute_stats(&txs, person.id);
                prop_assert_eq!(after.net, 0);
                prop_assert!(build_settlement(person.id, after.net).is_none());
            }
        }
    }
}
