pub mod jwks;
pub mod llms;

use std::net::SocketAddr;
use std::time::Duration;

use config::Config;
use server::ServeConfig;
use tokio::net::TcpListener;
use tokio::time::timeout;

/// Test client for making HTTP requests to the test server
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    /// Create a new test client for the given base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Start a request with any method to the given path
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Start a POST request with a JSON body to the given path
    pub fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path).json(body)
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.request(reqwest::Method::GET, path).send().await.unwrap()
    }
}

/// Test server that manages the lifecycle of a server instance
pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with the given TOML configuration
    pub async fn start(config_toml: &str) -> Self {
        let config: Config = toml::from_str(config_toml).unwrap();

        // Find an available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let serve_config = ServeConfig {
            listen_address: address,
            config,
        };

        let (tx, mut rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            // Drop the listener so the server can bind to the address
            drop(listener);

            let _ = tx.send(server::serve(serve_config).await);
        });

        // Wait for the server to start up or fail
        tokio::time::sleep(Duration::from_millis(100)).await;

        if let Ok(Err(e)) = rx.try_recv() {
            eprintln!("Server failed to start: {e}");
            std::process::exit(1);
        }

        let client = TestClient::new(format!("http://{address}"));

        // Verify the server is actually running by making a simple request
        let mut retries = 10;
        while retries > 0 {
            if timeout(Duration::from_millis(100), client.get("/")).await.is_ok() {
                break;
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestServer {
            client,
            address,
            _handle: handle,
        }
    }
}

/// Run the server with the given configuration until it returns, expecting a startup failure.
pub async fn start_failure(config_toml: &str) -> anyhow::Error {
    let config: Config = toml::from_str(config_toml).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let serve = server::serve(ServeConfig {
        listen_address: address,
        config,
    });

    match timeout(Duration::from_secs(5), serve).await {
        Ok(Err(error)) => error,
        Ok(Ok(())) => unreachable!("server stopped without an error"),
        Err(_) => unreachable!("server started although it should have failed"),
    }
}
