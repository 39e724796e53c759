//! ScyllaDB target store implementation.
//!
//! Only the direct DDL path goes through this client: keyspace and table
//! creation ahead of the storage bridge. Live replication never touches
//! this session; it flows through the source engine's bridge tables.

use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use tracing::{debug, info};

use crate::config::TargetConfig;
use crate::core::traits::TargetStore;
use crate::error::Result;

/// ScyllaDB session wrapper.
pub struct ScyllaStore {
    session: Session,
}

impl ScyllaStore {
    /// Connect to the target cluster.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut builder =
            SessionBuilder::new().known_node(format!("{}:{}", config.host, config.port));

        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.user(user, password);
        }

        let session = builder.build().await?;

        info!(
            "Connected to ScyllaDB target: {}:{}",
            config.host, config.port
        );

        Ok(Self { session })
    }

    /// Test the connection.
    pub async fn ping(&self) -> Result<()> {
        self.session
            .query_unpaged("SELECT release_version FROM system.local", ())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TargetStore for ScyllaStore {
    async fn execute_ddl(&self, cql: &str) -> Result<()> {
        debug!("CQL: {}", cql);
        self.session.query_unpaged(cql, ()).await?;
        Ok(())
    }
}
