use quarry::{
    evaluate, EngineConfig, IndexingTarget, InstructionResult, MemoryStorage, ScriptEngine,
    ScriptError, StorageContext, StorageIndex,
};
use serde_json::json;

fn people() -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.put(
        "/person/1",
        "Person",
        "people",
        json!({"name": "John Silver", "age": 44, "active": true,
               "address": {"city": "Tarn", "zip": null}}),
    );
    storage.put(
        "/person/2",
        "Person",
        "people",
        json!({"name": "Jane Doe", "age": 31, "active": false,
               "address": {"city": "Ro"}}),
    );
    storage.put(
        "/person/3",
        "Person",
        "people",
        json!({"name": "John Doe", "age": 31.0, "active": true}),
    );
    storage.put("/crate/1", "Crate", "cargo", json!({"name": "winnow"}));
    storage
}

fn ctx(storage: &MemoryStorage) -> StorageContext<'_> {
    StorageContext::new(storage, storage)
}

fn query_result(results: &[InstructionResult]) -> &quarry::QueryPerformed {
    results
        .iter()
        .find_map(|r| match r {
            InstructionResult::QueryPerformed(qp) => Some(qp),
            InstructionResult::IndexingPerformed(_) => None,
        })
        .expect("no query result")
}

#[test]
fn end_to_end_query_with_condition_and_projection() {
    let storage = people();
    let results = evaluate(
        "query {
            every 'Person' from 'people'
            where { str 'name' contains 'John' and num 'age' is 44 }
            show 'name' as 'Name', 'address.city' as 'City'
         }",
        ctx(&storage),
    )
    .unwrap();

    let qp = query_result(&results);
    assert_eq!(qp.result_set.len(), 1);
    let row = &qp.result_set.rows()[0];
    assert_eq!(row.entry().uri(), "/person/1");
    assert_eq!(row.cell("name").unwrap().value(), "John Silver");
    assert_eq!(row.cell("address.city").unwrap().value(), "Tarn");
    let meta = qp.result_set.meta().unwrap();
    assert_eq!(meta.columns[0].title, "Name");
    assert_eq!(meta.columns[1].title, "City");
}

#[test]
fn numeric_equality_crosses_representations() {
    let storage = people();
    // /person/2 stores age 31, /person/3 stores 31.0
    let results = evaluate(
        "query { every 'Person' where { num 'age' is 31 } }",
        ctx(&storage),
    )
    .unwrap();
    assert_eq!(query_result(&results).result_set.len(), 2);
}

#[test]
fn null_matches_explicit_null_only() {
    let storage = people();
    let results = evaluate(
        "query { every 'Person' where { str 'address.zip' is null } }",
        ctx(&storage),
    )
    .unwrap();
    let entries = query_result(&results).result_set.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].uri(), "/person/1");
}

#[test]
fn is_empty_also_matches_missing_paths() {
    let storage = people();
    let results = evaluate(
        "query { every 'Person' where { str 'address.zip' is_empty } }",
        ctx(&storage),
    )
    .unwrap();
    // null zip, missing zip and missing address all count
    assert_eq!(query_result(&results).result_set.len(), 3);
}

#[test]
fn json_overlap_queries_nested_objects() {
    let storage = people();
    let results = evaluate(
        "query { every 'Person' where { json 'address' overlaps {'city': 'Tarn', 'country': 'X'} } }",
        ctx(&storage),
    )
    .unwrap();
    let entries = query_result(&results).result_set.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].uri(), "/person/1");
}

#[test]
fn limit_truncates_in_index_order() {
    let storage = people();
    let results = evaluate(
        "query { every 'Person' limit 2 }",
        ctx(&storage),
    )
    .unwrap();
    let entries = query_result(&results).result_set.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].uri(), "/person/1");
    assert_eq!(entries[1].uri(), "/person/2");
}

#[test]
fn schema_restriction_excludes_other_trees() {
    let storage = people();
    let results = evaluate("query { every 'Crate' from 'people' }", ctx(&storage)).unwrap();
    assert!(query_result(&results).result_set.is_empty());
}

#[test]
fn explicit_index_reports_entry_count() {
    let storage = people();
    let results = evaluate("index { types 'Person' }", ctx(&storage)).unwrap();
    assert_eq!(results.len(), 1);
    let InstructionResult::IndexingPerformed(ip) = &results[0] else {
        panic!("expected indexing result");
    };
    assert!(!ip.implicit);
    assert_eq!(ip.entries_found, 3);
    assert_eq!(ip.pretty_print, "index { types 'Person' }");
}

#[test]
fn impermissible_explicit_index_carries_pretty_print() {
    let storage = people();
    let engine = ScriptEngine::new(EngineConfig {
        allow_explicit_indexing: false,
        implicit_indexing: true,
    });
    let err = engine
        .evaluate("index { types 'Person' }", ctx(&storage))
        .unwrap_err();
    let ScriptError::Impermissible { cause, .. } = err else {
        panic!("expected impermissible error, got {err:?}");
    };
    assert_eq!(cause, "index { types 'Person' }");
}

#[test]
fn failed_script_applies_nothing() {
    let storage = people();
    let engine = ScriptEngine::new(EngineConfig {
        allow_explicit_indexing: false,
        implicit_indexing: false,
    });
    // the query would refresh nothing, and the index block is rejected
    let err = engine
        .evaluate(
            "index { types 'Person' }\nquery { every 'Person' }",
            ctx(&storage),
        )
        .unwrap_err();
    assert!(matches!(err, ScriptError::Impermissible { .. }));
    assert!(!storage.is_fresh(&IndexingTarget::everything()));
}

#[test]
fn implicit_refresh_targets_the_query() {
    let storage = people();
    let results = evaluate("query { every 'Person' from 'people' }", ctx(&storage)).unwrap();
    let InstructionResult::IndexingPerformed(ip) = &results[0] else {
        panic!("expected implicit indexing first");
    };
    assert!(ip.implicit);
    assert!(ip.types.contains("Person"));
    assert!(ip.schemas.contains("people"));
    assert_eq!(ip.entries_found, 3);
}

#[test]
fn queries_over_different_types_both_find_their_entries() {
    let storage = people();
    let results = evaluate(
        "query { every 'Person' }\nquery { every 'Crate' }",
        ctx(&storage),
    )
    .unwrap();
    let queries: Vec<_> = results
        .iter()
        .filter_map(|r| match r {
            InstructionResult::QueryPerformed(qp) => Some(qp),
            InstructionResult::IndexingPerformed(_) => None,
        })
        .collect();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].result_set.len(), 3);
    assert_eq!(queries[1].result_set.len(), 1);
    assert_eq!(queries[1].result_set.entries()[0].uri(), "/crate/1");
}

#[test]
fn targeted_index_keeps_entries_outside_the_target() {
    let storage = people();
    let results = evaluate(
        "index { }\nindex { types 'Person' }\nquery { every 'Crate' }",
        ctx(&storage),
    )
    .unwrap();
    let qp = query_result(&results);
    assert_eq!(qp.result_set.len(), 1);
    assert_eq!(qp.result_set.entries()[0].uri(), "/crate/1");
}

#[test]
fn malformed_source_reports_a_positioned_error() {
    let storage = people();
    let err = evaluate("query {\n  every\n}", ctx(&storage)).unwrap_err();
    let ScriptError::Compilation { line, column, .. } = err else {
        panic!("expected compilation error, got {err:?}");
    };
    assert!(line >= 1);
    assert!(column >= 1);
}

#[test]
fn empty_in_set_matches_nothing() {
    let storage = people();
    let results = evaluate(
        "query { every 'Person' where { str 'name' in () } }",
        ctx(&storage),
    )
    .unwrap();
    assert!(query_result(&results).result_set.is_empty());
}

#[test]
fn timings_are_recorded() {
    let storage = people();
    storage.refresh(&IndexingTarget::everything()).unwrap();
    let results = evaluate(
        "query { every 'Person' show 'name' }",
        ctx(&storage),
    )
    .unwrap();
    let qp = query_result(&results);
    // matching and projection are timed independently
    assert!(qp.time_taken < std::time::Duration::from_secs(60));
    assert!(qp.result_set.meta().unwrap().time_taken < std::time::Duration::from_secs(60));
}
