use bookstore::commands::{check_urls, seed};
use bookstore::server::{router, AppState};
use bookstore::store::MemoryStore;
use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// Starts the site on an ephemeral port in a background thread.
fn spawn_server() -> SocketAddr {
    let store = MemoryStore::new();
    seed(&store).unwrap();
    let state = AppState::new(Arc::new(store)).unwrap();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router(state)).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

#[test]
fn seeded_site_passes_the_url_check() {
    let addr = spawn_server();
    let checks = check_urls(&format!("http://{}", addr)).unwrap();

    let lines: Vec<String> = checks.iter().map(|c| c.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            format!("http://{}/ -> 200", addr),
            format!("http://{}/books/ -> 200", addr),
            format!("http://{}/books/1/ -> 200", addr),
            format!("http://{}/authors/1/ -> 200", addr),
        ]
    );
}
