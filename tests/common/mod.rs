use device_relay::config::{CommonConfig, FirebaseConfig, RelayConfig};
use device_relay::services::{MemoryDeviceStore, MockPushProvider};
use device_relay::startup::Application;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryDeviceStore>,
    pub push: Arc<MockPushProvider>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        // Use random port for testing (port 0)
        let config = RelayConfig {
            common: CommonConfig { port: 0 },
            firebase: FirebaseConfig {
                database_url: String::new(),
                credentials: None,
                enabled: false, // Use in-memory collaborators
            },
        };

        let store = Arc::new(MemoryDeviceStore::default());
        let push = Arc::new(MockPushProvider::default());

        let app = Application::build_with(config, store.clone(), push.clone())
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            store,
            push,
        }
    }
}
