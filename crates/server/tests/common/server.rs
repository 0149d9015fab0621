//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use unhash_core::{AppConfig, PaymentConfig, PriceCalculator};
use unhash_server::payment::{PrepaidLedger, PskChannel};
use unhash_server::{AppState, create_router};
use unhash_storage::{FilesystemStore, ObjectStore};

/// Account used for payment-enabled test servers.
#[allow(dead_code)]
pub const TEST_ACCOUNT: &str = "test.unhash";
/// Receiver secret used for payment-enabled test servers.
#[allow(dead_code)]
pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    data_root: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage and payments disabled.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let (temp_dir, data_root, storage) = temp_storage().await;
        let mut config = AppConfig::for_testing(&data_root);
        modifier(&mut config);

        let state = AppState::new(config, storage).expect("Failed to build app state");
        Self::from_state(state, data_root, temp_dir)
    }

    /// Create a test server with psk payments backed by a ledger the test
    /// can credit directly.
    ///
    /// Pricing is 1 unit per byte with a 1024 byte overhead unless the
    /// modifier changes it.
    pub async fn with_ledger<F>(modifier: F) -> (Self, Arc<PrepaidLedger>)
    where
        F: FnOnce(&mut AppConfig),
    {
        let (temp_dir, data_root, storage) = temp_storage().await;
        let mut config = AppConfig::for_testing(&data_root);
        // 250 USD/GB-month at 0.25 USD per currency unit and 1e6 units: 1 unit per byte
        config.pricing.usd_per_gb_month = "250".parse().unwrap();
        config.payment = PaymentConfig::Psk {
            account: TEST_ACCOUNT.to_string(),
            secret: TEST_SECRET.to_string(),
        };
        modifier(&mut config);

        let pricing = PriceCalculator::new(&config.pricing).expect("Invalid pricing");
        let ledger = Arc::new(PrepaidLedger::new());
        let channel = PskChannel::new(TEST_ACCOUNT, TEST_SECRET).expect("Invalid psk channel");
        let state = AppState::from_parts(
            config,
            storage,
            pricing,
            ledger.clone(),
            Some(Arc::new(channel)),
        );
        (Self::from_state(state, data_root, temp_dir), ledger)
    }

    /// Create a test server with an explicit price calculator.
    pub async fn with_pricing(pricing: PriceCalculator) -> Self {
        let (temp_dir, data_root, storage) = temp_storage().await;
        let config = AppConfig::for_testing(&data_root);
        let state = AppState::from_parts(
            config,
            storage,
            pricing,
            Arc::new(unhash_server::payment::FreeGate),
            None,
        );
        Self::from_state(state, data_root, temp_dir)
    }

    fn from_state(state: AppState, data_root: PathBuf, temp_dir: TempDir) -> Self {
        let router = create_router(state.clone());
        Self {
            router,
            state,
            data_root,
            _temp_dir: temp_dir,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Root of the object store.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Number of stored objects on disk.
    pub fn object_count(&self) -> usize {
        std::fs::read_dir(&self.data_root)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != ".staging")
            .filter(|entry| entry.path().is_dir())
            .map(|shard| std::fs::read_dir(shard.path()).unwrap().count())
            .sum()
    }

    /// Number of leftover staged uploads.
    pub fn staged_count(&self) -> usize {
        std::fs::read_dir(self.data_root.join(".staging"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

async fn temp_storage() -> (TempDir, PathBuf, Arc<dyn ObjectStore>) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let data_root = temp_dir.path().join("data");
    let storage: Arc<dyn ObjectStore> = Arc::new(
        FilesystemStore::new(&data_root)
            .await
            .expect("Failed to create storage backend"),
    );
    (temp_dir, data_root, storage)
}
