//! Common test setup functions.

use api::{router, AppState};
use axum::Router;
use axum_test::TestServer;
use clickhouse_client::{init_schema, truncate_records, ClickHouseClient, ClickHouseConfig};
use std::sync::Arc;
use utm_core::{AttributionRecord, Depth};

use crate::containers::TestContainers;
use crate::mocks::MockStore;

/// Test context with the real router over an in-memory store.
///
/// Handlers, extractors and the refresh coordinator run exactly as in
/// production; only the storage backend is swapped.
pub struct TestContext {
    pub store: Arc<MockStore>,
    pub state: AppState,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(MockStore::new(), Depth::default())
    }

    /// Start with records already stored.
    pub fn with_records(records: Vec<AttributionRecord>) -> Self {
        Self::with_store(MockStore::with_records(records), Depth::default())
    }

    pub fn with_store(store: MockStore, default_depth: Depth) -> Self {
        let store = Arc::new(store);
        let state = AppState::with_default_depth(store.clone(), default_depth);
        let router = router(state.clone());
        Self {
            store,
            state,
            router,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Set the mock store to fail (for error testing).
    pub fn set_store_failure(&self, should_fail: bool) {
        self.store.set_should_fail(should_fail);
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Test context backed by a real ClickHouse.
///
/// Requires Docker unless `UTM_TEST_CLICKHOUSE_URL` is set.
pub struct ClickHouseContext {
    pub containers: TestContainers,
    pub clickhouse: Arc<ClickHouseClient>,
    pub router: Router,
}

impl ClickHouseContext {
    pub async fn new() -> Self {
        let containers = TestContainers::start().await;

        let config = ClickHouseConfig {
            url: containers.clickhouse_url.clone(),
            database: containers.clickhouse_database.clone(),
            username: containers.clickhouse_username.clone(),
            password: containers.clickhouse_password.clone(),
            timeout_secs: 30,
        };
        let clickhouse = Arc::new(ClickHouseClient::new(config));

        init_schema(&clickhouse)
            .await
            .expect("Failed to initialize schema");
        truncate_records(&clickhouse)
            .await
            .expect("Failed to truncate records");
        clickhouse_client::check_connection(&clickhouse).await;

        let router = router(AppState::new(clickhouse.clone()));

        Self {
            containers,
            clickhouse,
            router,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }
}
