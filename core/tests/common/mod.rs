//! Shared setup for tests that talk to the mock server over real HTTP.

#![allow(dead_code)]

use std::net::SocketAddr;

use account_core::{AccountService, Attributes, Transport, TransportConfig};
use mock_server::Router;

/// Serve `router` on a random local port from a background thread.
pub fn spawn(router: Router) -> SocketAddr {
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
            mock_server::serve(listener, router).await
        })
        .unwrap();
    });

    addr
}

pub fn config_for(addr: SocketAddr) -> TransportConfig {
    TransportConfig::default()
        .with_base_url(format!("http://{addr}").parse().unwrap())
        .with_user_agent("account-core-tests")
}

pub fn service_for(addr: SocketAddr) -> AccountService {
    AccountService::new(Some(Transport::new(config_for(addr))))
}

pub fn reference_attributes() -> Attributes {
    Attributes {
        account_classification: Some("Personal".to_string()),
        account_number: Some("10000004".to_string()),
        bank_id: Some("400302".to_string()),
        bank_id_code: Some("GBDSC".to_string()),
        base_currency: Some("GBP".to_string()),
        bic: Some("NWBKGB42".to_string()),
        country: Some("GB".to_string()),
        customer_id: Some("234".to_string()),
        iban: Some("GB28NWBK40030212764204".to_string()),
        ..Attributes::default()
    }
}
