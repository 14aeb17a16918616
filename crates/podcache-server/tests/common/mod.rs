#![allow(dead_code)]

use std::sync::Arc;

use podcache_core::{InventoryItem, ManualClock, StaticInventorySource};
use podcache_server::{AppConfig, ServerBuilder};
use tokio::task::JoinHandle;

pub struct TestServer {
    pub base: String,
    pub source: Arc<StaticInventorySource>,
    pub clock: Arc<ManualClock>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

pub fn pod(name: &str, namespace: &str, status: &str) -> InventoryItem {
    InventoryItem::new(name, namespace, status)
}

/// `pod-1` .. `pod-n` in namespace `default`, all Running.
pub fn numbered_pods(n: usize) -> Vec<InventoryItem> {
    (1..=n)
        .map(|i| pod(&format!("pod-{i}"), "default", "Running"))
        .collect()
}

pub async fn start_server(items: Vec<InventoryItem>) -> TestServer {
    start_server_with_config(items, AppConfig::default()).await
}

pub async fn start_server_with_config(items: Vec<InventoryItem>, cfg: AppConfig) -> TestServer {
    let source = Arc::new(StaticInventorySource::new(items));
    let clock = Arc::new(ManualClock::starting_now());

    let server = ServerBuilder::new()
        .with_config(cfg)
        .with_source(source.clone())
        .with_clock(clock.clone())
        .build()
        .await
        .expect("build server");

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = server
            .serve(listener, async move {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        base: format!("http://{addr}"),
        source,
        clock,
        shutdown: Some(tx),
        handle: Some(handle),
    }
}
