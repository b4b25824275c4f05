//! Endpoint store integration tests: directory scanning, fail-fast, partitioning.

use assert_fs::prelude::*;
use portico_core::{store, EndpointId, Protocol, Selector, StoreError};
use predicates::prelude::predicate;

// ---------------------------------------------------------------------------
// 1. Directory scanning
// ---------------------------------------------------------------------------

#[test]
fn load_keys_records_by_file_stem() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("shop.json")
        .write_str(r#"{"domain":"shop.example","url":"http://shop:8080"}"#)
        .expect("write");
    dir.child("git.yaml")
        .write_str("domain: git.example\nurl: git:22\nprotocol: tls\n")
        .expect("write");

    let collection = store::load(dir.path()).expect("load");
    assert_eq!(collection.len(), 2);

    let shop = collection.get(&EndpointId::from("shop")).expect("shop record");
    assert_eq!(shop.definition.domain, "shop.example");
    assert!(shop.source_path.ends_with("shop.json"));

    let git = collection.get(&EndpointId::from("git")).expect("git record");
    assert_eq!(git.definition.protocol, Protocol::Tls);
}

#[test]
fn unrelated_files_and_directories_are_ignored() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("README.md").write_str("# backends").expect("write");
    dir.child("notes.txt").write_str("not json").expect("write");
    dir.child("nested.json").create_dir_all().expect("mkdir");
    dir.child("a.json")
        .write_str(r#"{"domain":"a.com","url":"http://a"}"#)
        .expect("write");

    let collection = store::load(dir.path()).expect("load");
    let ids: Vec<_> = collection.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec!["a"]);
}

#[test]
fn empty_directory_yields_empty_collection() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let collection = store::load(dir.path()).expect("load");
    assert!(collection.is_empty());
}

#[test]
fn missing_directory_is_an_io_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let err = store::load(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("absent"));
}

// ---------------------------------------------------------------------------
// 2. Fail-fast validation
// ---------------------------------------------------------------------------

#[test]
fn one_invalid_file_fails_the_whole_load() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("good.json")
        .write_str(r#"{"domain":"good.com","url":"http://good"}"#)
        .expect("write");
    dir.child("bad.json")
        .write_str(r#"{"domain":"bad.com"}"#)
        .expect("write");

    let err = store::load(dir.path()).unwrap_err();
    let StoreError::Validation(validation) = err else {
        panic!("expected validation error");
    };
    assert!(validation.path.ends_with("bad.json"));
    assert_eq!(validation.reason, "url is a required field");
    dir.child("good.json").assert(predicate::path::exists());
}

#[test]
fn unsupported_protocol_names_the_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("legacy.json")
        .write_str(r#"{"domain":"l.com","url":"http://l","protocol":"http"}"#)
        .expect("write");

    let err = store::load(dir.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("legacy.json"), "got: {msg}");
    assert!(msg.contains("unsupported protocol 'http'"), "got: {msg}");
}

#[test]
fn same_id_in_two_formats_is_rejected() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("dup.json")
        .write_str(r#"{"domain":"d.com","url":"http://d"}"#)
        .expect("write");
    dir.child("dup.yaml")
        .write_str("domain: d.com\nurl: http://d\n")
        .expect("write");

    let err = store::load(dir.path()).unwrap_err();
    assert!(err.to_string().contains("duplicate endpoint id 'dup'"), "got: {err}");
}

// ---------------------------------------------------------------------------
// 3. Protocol partitioning
// ---------------------------------------------------------------------------

#[test]
fn protocol_selectors_partition_the_collection() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("a.json")
        .write_str(r#"{"domain":"a.com","url":"http://a"}"#)
        .expect("write");
    dir.child("b.json")
        .write_str(r#"{"domain":"b.com","url":"b:5432","protocol":"tls"}"#)
        .expect("write");
    dir.child("c.json")
        .write_str(r#"{"domain":"c.com","url":"http://c","protocol":"https"}"#)
        .expect("write");

    let collection = store::load(dir.path()).expect("load");
    let https: Vec<_> = collection
        .select(Selector::Protocol(Protocol::Https))
        .map(|r| r.id.clone())
        .collect();
    let tls: Vec<_> = collection
        .select(Selector::Protocol(Protocol::Tls))
        .map(|r| r.id.clone())
        .collect();

    assert!(https.iter().all(|id| !tls.contains(id)), "sets must be disjoint");
    let mut union: Vec<_> = https.into_iter().chain(tls).collect();
    union.sort();
    let all: Vec<_> = collection.iter().map(|r| r.id.clone()).collect();
    assert_eq!(union, all, "union must cover the collection");
}
