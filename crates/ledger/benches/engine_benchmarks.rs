use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use ledgerbook_core::{OwnerId, PersonId, TransactionId};
use ledgerbook_ledger::{
    Amount, Direction, NewTransaction, Person, Transaction, compute_all_stats, compute_stats,
};

fn build_ledger(people: usize, per_person: usize) -> (Vec<Person>, Vec<Transaction>) {
    let owner_id = OwnerId::new();
    let now = Utc::now();

    let people: Vec<Person> = (0..people)
        .map(|i| Person {
            id: PersonId::new(),
            owner_id,
            name: format!("person-{i}"),
            created_at: now,
        })
        .collect();

    let mut txs = Vec::with_capacity(people.len() * per_person);
    for n in 0..per_person {
        for person in &people {
            let direction = if n % 3 == 0 {
                Direction::Debit
            } else {
                Direction::Credit
            };
            let amount = Amount::new(100 + n as i64).unwrap();
            let request = NewTransaction::new(person.id, amount, direction, None);
            txs.push(Transaction::record(TransactionId::new(), owner_id, request, now));
        }
    }

    (people, txs)
}

/// Naive multi-person path: re-filter the whole set once per person.
fn naive_all_stats(people: &[Person], txs: &[Transaction]) -> i64 {
    people.iter().map(|p| compute_stats(txs, p.id).net).sum()
}

fn bench_all_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_stats");

    for people in [10usize, 100, 500] {
        let (people_list, txs) = build_ledger(people, 20);
        group.throughput(Throughput::Elements(txs.len() as u64));

        group.bench_with_input(BenchmarkId::new("single_pass", people), &people, |b, _| {
            b.iter(|| compute_all_stats(black_box(&people_list), black_box(&txs)));
        });

        group.bench_with_input(BenchmarkId::new("per_person_filter", people), &people, |b, _| {
            b.iter(|| naive_all_stats(black_box(&people_list), black_box(&txs)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_all_stats);
criterion_main!(benches);
