use std::sync::Arc;
use std::thread;

use quarry::{
    evaluate, IndexingTarget, InstructionResult, MemoryStorage, StorageContext, StorageIndex,
};
use serde_json::json;

fn populate(storage: &MemoryStorage, count: usize) {
    for i in 0..count {
        storage.put(
            format!("/person/{i}"),
            "Person",
            "people",
            json!({"name": format!("p{i}"), "age": i, "active": i % 2 == 0}),
        );
    }
}

#[test]
fn evaluate_across_threads() {
    let storage = Arc::new(MemoryStorage::new());
    populate(&storage, 40);
    storage.refresh(&IndexingTarget::everything()).unwrap();

    let scripts = [
        "query { every 'Person' where { bool 'active' is true } }",
        "query { every 'Person' where { num 'age' is 7 } }",
        "query { every 'Person' where { str 'name' starts_with 'p1' } limit 5 }",
        "query { a 'Person' }",
    ];

    let mut handles = vec![];
    for script in scripts {
        let storage = Arc::clone(&storage);
        handles.push(thread::spawn(move || {
            let results =
                evaluate(script, StorageContext::new(storage.as_ref(), storage.as_ref()))
                    .unwrap();
            let InstructionResult::QueryPerformed(qp) = results.last().unwrap() else {
                panic!("expected query result");
            };
            qp.result_set.len()
        }));
    }

    let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(counts, vec![20, 1, 5, 1]);
}

#[test]
fn concurrent_evaluations_are_isolated() {
    let storage = Arc::new(MemoryStorage::new());
    populate(&storage, 100);
    storage.refresh(&IndexingTarget::everything()).unwrap();

    let mut handles = vec![];
    for _ in 0..8 {
        let storage = Arc::clone(&storage);
        handles.push(thread::spawn(move || {
            let mut counts = vec![];
            for _ in 0..20 {
                let results = evaluate(
                    "query { every 'Person' where { bool 'active' is true } }",
                    StorageContext::new(storage.as_ref(), storage.as_ref()),
                )
                .unwrap();
                let InstructionResult::QueryPerformed(qp) = results.last().unwrap() else {
                    panic!("expected query result");
                };
                counts.push(qp.result_set.len());
            }
            counts
        }));
    }

    for handle in handles {
        let counts = handle.join().unwrap();
        assert!(counts.iter().all(|&c| c == 50));
    }
}
