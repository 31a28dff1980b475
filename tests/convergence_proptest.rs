//! Property-based convergence tests.
//!
//! Several replicas start from a shared baseline, edit concurrently, and then
//! exchange every operation. Delivery interleaves the replicas' streams at
//! random, preserving each replica's own order, and repeats operations at
//! random. Moves only target elements the moving replica created during the
//! concurrent phase, since concurrent edits of one element through a move are
//! order dependent. Site ids are congruent modulo the default allocation
//! boundary, so every site picks the same digits and only the site digit tells
//! their positions apart.

use std::sync::Arc;

use crdt_seq::replication::split_counter;
use crdt_seq::{AllocationStrategy, ExponentialStrategy, Operation, Outbox, Position, Sequence};
use proptest::prelude::*;

const SITES: [u32; 3] = [1, 11, 21];
const AUTHOR_SITE: u32 = 31;
const OBSERVER_SITE: u32 = 41;

#[derive(Clone, Debug)]
enum Edit {
    Insert { slot: usize, value: u8 },
    Delete { slot: usize },
    MoveOwn { pick: usize, slot: usize },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (any::<usize>(), b'a'..=b'z').prop_map(|(slot, value)| Edit::Insert { slot, value }),
        1 => any::<usize>().prop_map(|slot| Edit::Delete { slot }),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(pick, slot)| Edit::MoveOwn { pick, slot }),
    ]
}

fn script_strategy() -> impl Strategy<Value = Vec<Vec<Edit>>> {
    prop::collection::vec(prop::collection::vec(edit_strategy(), 0..12), SITES.len())
}

struct Replica {
    sequence: Sequence,
    outbox: Arc<Outbox>,
}

impl Replica {
    fn new(site: u32) -> Self {
        let outbox = Arc::new(Outbox::new(site));
        let sequence = Sequence::with_upstream(site, ExponentialStrategy::new(), outbox.clone());
        Replica { sequence, outbox }
    }

    fn run(&mut self, edit: &Edit) {
        let seq = &mut self.sequence;
        match edit {
            Edit::Insert { slot, value } => {
                let index = slot % (seq.size() + 1);
                seq.insert(index, (*value as char).to_string()).unwrap();
            }
            Edit::Delete { slot } => {
                if seq.size() > 0 {
                    seq.delete(slot % seq.size()).unwrap();
                }
            }
            Edit::MoveOwn { pick, slot } => {
                let site = seq.site();
                let own: Vec<usize> = seq
                    .identifiers()
                    .iter()
                    .enumerate()
                    .filter(|(_, id)| split_counter(id.counter).1 == site)
                    .map(|(index, _)| index)
                    .collect();
                if own.is_empty() {
                    return;
                }
                let from = own[pick % own.len()];
                let to = slot % (seq.size() + 1);
                seq.move_element(from, to).unwrap();
            }
        }
    }
}

/// Interleaves per-replica streams using `choices`, duplicating an operation
/// whenever the matching `repeat` flag is set.
fn interleave(streams: &[Vec<Operation>], choices: &[usize], repeats: &[bool]) -> Vec<Operation> {
    let mut cursors = vec![0usize; streams.len()];
    let mut out = Vec::new();
    let mut step = 0usize;

    loop {
        let live: Vec<usize> = (0..streams.len())
            .filter(|&i| cursors[i] < streams[i].len())
            .collect();
        if live.is_empty() {
            break;
        }
        let choice = choices.get(step).copied().unwrap_or(step);
        let stream = live[choice % live.len()];
        let op = streams[stream][cursors[stream]].clone();
        cursors[stream] += 1;

        if repeats.get(step).copied().unwrap_or(false) {
            out.push(op.clone());
        }
        out.push(op);
        step += 1;
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn replicas_converge_for_any_interleaving(
        baseline in prop::collection::vec(b'a'..=b'z', 0..6),
        scripts in script_strategy(),
        choices in prop::collection::vec(any::<usize>(), 0..64),
        repeats in prop::collection::vec(any::<bool>(), 0..64),
        reverse_choices in prop::collection::vec(any::<usize>(), 0..64),
    ) {
        // Shared baseline authored by an extra site
        let mut author = Replica::new(AUTHOR_SITE);
        for (i, value) in baseline.iter().enumerate() {
            author.sequence.insert(i, (*value as char).to_string()).unwrap();
        }
        let baseline_ops = author.outbox.drain();

        let mut replicas: Vec<Replica> = SITES.iter().copied().map(Replica::new).collect();
        for replica in replicas.iter_mut() {
            for op in &baseline_ops {
                replica.sequence.apply(op);
            }
            prop_assert_eq!(replica.sequence.content(), author.sequence.content());
        }

        // Concurrent phase: nobody sees anybody else's edits
        for (replica, script) in replicas.iter_mut().zip(&scripts) {
            for edit in script {
                replica.run(edit);
            }
        }
        let streams: Vec<Vec<Operation>> = replicas.iter().map(|r| r.outbox.drain()).collect();

        // Exchange with different interleavings per receiving replica
        let mut observers: Vec<Sequence> = Vec::new();
        for order in [&choices, &reverse_choices] {
            let mut observer = Sequence::with_site(OBSERVER_SITE);
            for op in &baseline_ops {
                observer.apply(op);
            }
            for op in interleave(&streams, order, &repeats) {
                observer.apply(&op);
            }
            observers.push(observer);
        }
        for (index, replica) in replicas.iter_mut().enumerate() {
            let foreign: Vec<Vec<Operation>> = streams
                .iter()
                .enumerate()
                .map(|(i, s)| if i == index { Vec::new() } else { s.clone() })
                .collect();
            for op in interleave(&foreign, &choices, &repeats) {
                replica.sequence.apply(&op);
            }
        }

        let expected = observers[0].content();
        prop_assert_eq!(observers[1].content(), expected.clone());
        prop_assert_eq!(observers[1].identifiers(), observers[0].identifiers());
        for replica in &replicas {
            prop_assert_eq!(replica.sequence.content(), expected.clone());
        }
    }

    #[test]
    fn allocation_stays_between_bounds(
        left in prop::collection::vec(0u64..40, 1..6),
        right in prop::collection::vec(0u64..40, 1..6),
        site in any::<u32>(),
    ) {
        // Bounds must be ordered and must not end in a zero digit
        prop_assume!(left.last() != Some(&0) && right.last() != Some(&0));
        let (left, right) = (Position::from_digits(left), Position::from_digits(right));
        prop_assume!(left < right);

        let strategy = ExponentialStrategy::new();
        let allocated = strategy.allocate(&left, &right, site);
        prop_assert!(allocated.is_some(), "no room between {} and {}", left, right);
        let allocated = allocated.unwrap();
        prop_assert!(left < allocated, "{} <= {}", allocated, left);
        prop_assert!(allocated < right, "{} >= {}", allocated, right);
        prop_assert_ne!(allocated.digits().last(), Some(&0));
    }

    #[test]
    fn allocation_terminates_for_arbitrary_bounds(
        left in prop::collection::vec(prop_oneof![0u64..3, any::<u64>()], 0..6),
        right in prop::collection::vec(prop_oneof![0u64..3, any::<u64>()], 0..6),
        site in any::<u32>(),
    ) {
        // Unordered, equal, empty and zero-terminated bounds included
        let (left, right) = (Position::from_digits(left), Position::from_digits(right));
        if let Some(allocated) = ExponentialStrategy::new().allocate(&left, &right, site) {
            prop_assert!(left < allocated && allocated < right);
        } else {
            let padded_left = right.digits().starts_with(left.digits())
                && right.digits()[left.depth()..].iter().all(|&digit| digit == 0);
            prop_assert!(left >= right || padded_left, "gave up between {} and {}", left, right);
        }
    }

    #[test]
    fn index_edits_match_a_vec_model(edits in prop::collection::vec(edit_strategy(), 0..40)) {
        let mut replica = Replica::new(1);
        let mut model: Vec<String> = Vec::new();

        for edit in &edits {
            let seq = &mut replica.sequence;
            match edit {
                Edit::Insert { slot, value } => {
                    let index = slot % (model.len() + 1);
                    let value = (*value as char).to_string();
                    seq.insert(index, value.clone()).unwrap();
                    model.insert(index, value);
                }
                Edit::Delete { slot } => {
                    if model.is_empty() {
                        prop_assert!(seq.delete(0).is_err());
                        continue;
                    }
                    let index = slot % model.len();
                    seq.delete(index).unwrap();
                    model.remove(index);
                }
                Edit::MoveOwn { pick, slot } => {
                    if model.is_empty() {
                        continue;
                    }
                    let from = pick % model.len();
                    let to = slot % model.len();
                    seq.move_element(from, to).unwrap();
                    let value = model.remove(from);
                    model.insert(to, value);
                }
            }
            prop_assert_eq!(seq.content(), model.clone());
        }
    }
}
