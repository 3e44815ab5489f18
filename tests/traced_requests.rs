//! End-to-end tests for the traced GET endpoint.

use std::collections::BTreeSet;

use traced_server::apm::{AttributeValue, TransactionCategory};
use traced_server::http::handler::{SEGMENT_NAME, TRANSACTION_NAME};

mod common;

#[tokio::test]
async fn get_foo_echoes_path() {
    let server = common::start_server().await;

    let res = common::client().get(server.url("/foo")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "Hello, world! You requested: /foo");
}

#[tokio::test]
async fn get_root_echoes_slash() {
    let server = common::start_server().await;

    let res = common::client().get(server.url("/")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Hello, world! You requested: /");
}

#[tokio::test]
async fn request_produces_one_transaction_with_one_segment() {
    let server = common::start_server().await;

    common::client().get(server.url("/foo")).send().await.unwrap();

    let records = server.reporter.records();
    assert_eq!(records.len(), 1);

    let txn = &records[0];
    assert_eq!(txn.name, TRANSACTION_NAME);
    assert_eq!(txn.category, TransactionCategory::Web);
    assert_eq!(txn.attributes.get("endpoint"), Some(&AttributeValue::from("/foo")));

    assert_eq!(txn.segments.len(), 1);
    let segment = &txn.segments[0];
    assert_eq!(segment.name, SEGMENT_NAME);
    assert_eq!(segment.attributes.get("method"), Some(&AttributeValue::from("GET")));
    assert_eq!(segment.attributes.get("path"), Some(&AttributeValue::from("/foo")));
    assert!(segment.end_offset() <= txn.duration);

    let stats = server.agent.stats();
    assert_eq!(stats.segments_started, 1);
    assert_eq!(stats.segments_finished, 1);
}

#[tokio::test]
async fn concurrent_requests_keep_their_own_attributes() {
    let server = common::start_server().await;
    let client = common::client();

    let mut tasks = Vec::new();
    for i in 0..25 {
        let client = client.clone();
        let url = server.url(&format!("/item/{i}"));
        tasks.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().text().await.unwrap()
        }));
    }
    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(
            task.await.unwrap(),
            format!("Hello, world! You requested: /item/{i}")
        );
    }

    let records = server.reporter.records();
    assert_eq!(records.len(), 25);

    let mut endpoints = BTreeSet::new();
    for txn in &records {
        let endpoint = txn.attributes.get("endpoint").unwrap().to_string();
        assert_eq!(txn.segments.len(), 1);
        assert_eq!(
            txn.segments[0].attributes.get("path").unwrap().to_string(),
            endpoint
        );
        endpoints.insert(endpoint);
    }
    let expected: BTreeSet<String> = (0..25).map(|i| format!("/item/{i}")).collect();
    assert_eq!(endpoints, expected);

    let stats = server.agent.stats();
    assert_eq!(stats.segments_started, 25);
    assert_eq!(stats.segments_finished, 25);
}

#[tokio::test]
async fn post_is_not_allowed() {
    let server = common::start_server().await;

    let res = common::client().post(server.url("/foo")).send().await.unwrap();

    assert_eq!(res.status(), 405);
    assert!(server.reporter.records().is_empty());
}
