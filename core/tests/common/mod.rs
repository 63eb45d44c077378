//! Shared fixtures: a live mock server on a random port and clients
//! pointed at it.

#![allow(dead_code)]

use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use mock_server::ServerOptions;
use sandbox_core::{ApiClient, Config};

/// Start the mock server on a random port in a background thread.
pub fn spawn_server(options: ServerOptions) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, options).await
        })
        .unwrap();
    });

    addr
}

/// An address nothing listens on.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Configuration with every service pointed at `addr`.
pub fn config_for(addr: SocketAddr) -> Config {
    let base = format!("http://{addr}");
    Config {
        api_base_url: base.clone(),
        jsonplaceholder_base_url: base.clone(),
        inventory_base_url: base,
        timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

/// Client whose retry delays are recorded instead of slept.
pub fn client_for(addr: SocketAddr) -> (ApiClient, Rc<RefCell<Vec<Duration>>>) {
    let slept = Rc::new(RefCell::new(Vec::new()));
    let clock = slept.clone();
    let client = ApiClient::new(config_for(addr))
        .with_sleeper(move |d: Duration| clock.borrow_mut().push(d));
    (client, slept)
}
