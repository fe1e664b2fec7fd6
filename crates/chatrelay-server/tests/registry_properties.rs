//! Property-based tests for ConnectionRegistry
//!
//! Random interleavings of add and remove are applied both to the registry and
//! to a plain ordered `Vec` model; after every step the two must agree.

use chatrelay_server::{ConnectionHandle, ConnectionRegistry, RegistryError};
use proptest::prelude::*;
use tokio::io::{DuplexStream, duplex};

/// Number of distinct connections an operation sequence draws from.
const POOL: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Add { slot: usize, nickname: String },
    Remove { slot: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..POOL, "[a-z]{1,4}").prop_map(|(slot, nickname)| Op::Add { slot, nickname }),
        (0..POOL).prop_map(|slot| Op::Remove { slot }),
    ]
}

fn pool(registry: &ConnectionRegistry) -> (Vec<ConnectionHandle>, Vec<DuplexStream>) {
    (0..POOL)
        .map(|_| {
            let (local, remote) = duplex(64);
            (ConnectionHandle::new(registry.next_id(), local), remote)
        })
        .unzip()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the registry always matches an ordered model of live entries
    #[test]
    fn prop_registry_matches_model(ops in prop::collection::vec(op(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        let registry = ConnectionRegistry::new();
        let (handles, _remotes) = pool(&registry);
        let mut model: Vec<(usize, String)> = Vec::new();

        for op in ops {
            match op {
                Op::Add { slot, nickname } => {
                    let result = registry.add(nickname.clone(), handles[slot].clone());
                    if model.iter().any(|(s, _)| *s == slot) {
                        prop_assert_eq!(
                            result,
                            Err(RegistryError::AlreadyRegistered(handles[slot].id()))
                        );
                    } else {
                        prop_assert_eq!(result, Ok(model.len() + 1));
                        model.push((slot, nickname));
                    }
                },
                Op::Remove { slot } => {
                    let removed = runtime.block_on(registry.remove(handles[slot].id()))?;
                    match model.iter().position(|(s, _)| *s == slot) {
                        Some(index) => {
                            let (_, nickname) = model.remove(index);
                            prop_assert_eq!(removed.map(|e| e.nickname), Some(nickname));
                        },
                        None => prop_assert!(removed.is_none()),
                    }
                },
            }

            prop_assert_eq!(registry.len()?, model.len());

            let snapshot = registry.snapshot()?;
            let ids: Vec<_> = snapshot.iter().map(|e| e.id()).collect();
            let expected: Vec<_> = model.iter().map(|(s, _)| handles[*s].id()).collect();
            prop_assert_eq!(ids, expected);
        }
    }

    /// Property: adding N distinct connections yields N entries, whatever the nicknames
    #[test]
    fn prop_count_equals_distinct_adds(nicknames in prop::collection::vec("[a-c]{0,2}", 0..POOL)) {
        let registry = ConnectionRegistry::new();
        let (handles, _remotes) = pool(&registry);

        for (handle, nickname) in handles.iter().zip(&nicknames) {
            registry.add(nickname.clone(), handle.clone())?;
        }

        prop_assert_eq!(registry.len()?, nicknames.len());
        prop_assert_eq!(registry.nicknames()?, nicknames);
    }
}
