//! End-to-end cache behavior through the HTTP surface, driven by a manual clock.

mod common;

use common::{numbered_pods, pod, start_server};
use serde_json::Value;

async fn total_for(client: &reqwest::Client, url: &str, user: &str) -> u64 {
    let body: Value = client
        .get(url)
        .header("X-User-ID", user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["total"].as_u64().unwrap()
}

#[tokio::test]
async fn snapshot_is_reused_until_ttl_expires() {
    let server = start_server(numbered_pods(3)).await;
    let client = reqwest::Client::new();
    let pods = server.url("/pods");

    assert_eq!(total_for(&client, &pods, "alice").await, 3);

    // Upstream changes are invisible while the snapshot is fresh
    server.source.replace(numbered_pods(5));
    server.clock.advance(time::Duration::seconds(59));
    assert_eq!(total_for(&client, &pods, "alice").await, 3);

    // At exactly the TTL the entry is stale and refreshed
    server.clock.advance(time::Duration::seconds(1));
    assert_eq!(total_for(&client, &pods, "alice").await, 5);

    server.stop().await;
}

#[tokio::test]
async fn users_have_independent_snapshots() {
    let server = start_server(numbered_pods(2)).await;
    let client = reqwest::Client::new();
    let pods = server.url("/pods");

    assert_eq!(total_for(&client, &pods, "alice").await, 2);

    server.source.replace(vec![pod("only", "default", "Running")]);

    // Bob has no entry yet, so he sees the new upstream state
    assert_eq!(total_for(&client, &pods, "bob").await, 1);
    // Alice keeps her fresh snapshot
    assert_eq!(total_for(&client, &pods, "alice").await, 2);

    server.stop().await;
}

#[tokio::test]
async fn list_and_search_share_the_same_snapshot() {
    let server = start_server(vec![pod("web-1", "prod", "Running")]).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/search?q=web"))
        .header("X-User-ID", "alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);

    server.source.replace(Vec::new());
    assert_eq!(total_for(&client, &server.url("/pods"), "alice").await, 1);

    server.stop().await;
}

#[tokio::test]
async fn cache_stats_reports_caller_entry() {
    let server = start_server(numbered_pods(4)).await;
    let client = reqwest::Client::new();

    let stats = |user: &'static str| {
        client
            .get(server.url("/cache/stats"))
            .header("X-User-ID", user)
            .send()
    };

    let body: Value = stats("alice").await.unwrap().json().await.unwrap();
    assert_eq!(body["ttl_secs"], 60);
    assert!(body["user"].is_null());

    assert_eq!(total_for(&client, &server.url("/pods"), "alice").await, 4);
    assert_eq!(total_for(&client, &server.url("/pods"), "alice").await, 4);
    server.clock.advance(time::Duration::seconds(61));

    let body: Value = stats("alice").await.unwrap().json().await.unwrap();
    assert_eq!(body["user"]["items"], 4);
    assert_eq!(body["user"]["age_secs"], 61);
    assert_eq!(body["user"]["stale"], true);
    assert!(body["user"]["fetched_at"].is_string());
    assert_eq!(body["stats"]["entries"], 1);
    assert_eq!(body["stats"]["misses"], 1);
    assert_eq!(body["stats"]["hits"], 1);
    assert_eq!(body["stats"]["refreshes"], 1);

    // Peeking never refreshes
    let body: Value = stats("alice").await.unwrap().json().await.unwrap();
    assert_eq!(body["stats"]["refreshes"], 1);

    // Another user's stats request does not reveal alice's entry
    let body: Value = stats("bob").await.unwrap().json().await.unwrap();
    assert!(body["user"].is_null());

    server.stop().await;
}

#[tokio::test]
async fn concurrent_users_each_get_an_entry() {
    let server = start_server(numbered_pods(7)).await;
    let client = reqwest::Client::new();
    let pods = server.url("/pods");

    let users: Vec<String> = (0..16).map(|i| format!("user-{i}")).collect();
    let totals =
        futures_util::future::join_all(users.iter().map(|u| total_for(&client, &pods, u))).await;
    assert!(totals.iter().all(|t| *t == 7));

    let body: Value = client
        .get(server.url("/cache/stats"))
        .header("X-User-ID", "user-0")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["stats"]["entries"], 16);
    assert_eq!(body["stats"]["refreshes"], 16);

    server.stop().await;
}
