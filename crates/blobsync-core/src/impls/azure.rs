//! StorageConnection - Azure Blob Storage のコンテナへのアクセス
//!
//! # 設計
//! - 1 実行につき 1 接続。エンドポイントテンプレート・環境・コンテナと、
//!   ちょうど 1 つの認証手段で構成する
//! - `client()` は呼び出しごとに新しいクライアントを作る（キャッシュしない）
//! - ダウンロードは呼び出しの中でクライアントを作って捨てる

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::ObjectStore;
use object_store::azure::{AzureConfigKey, MicrosoftAzureBuilder};

use super::credentials::{ConnectionString, StorageCredentials, TokenCredential};
use super::endpoint::{parse_account_endpoint, resolve_template};
use super::listing::{BlobListing, fetch_blob};
use crate::domain::{BlobRecord, Environment, SyncError};
use crate::ports::BlobSource;

/// A configured handle to one container in one environment.
#[derive(Debug, Clone)]
pub struct StorageConnection {
    endpoint_template: String,
    environment: Environment,
    container: String,
    credentials: StorageCredentials,
}

impl StorageConnection {
    pub fn builder(
        endpoint_template: impl Into<String>,
        environment: Environment,
        container: impl Into<String>,
    ) -> StorageConnectionBuilder {
        StorageConnectionBuilder {
            endpoint_template: endpoint_template.into(),
            environment,
            container: container.into(),
            connection_string: None,
            credential: None,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn credentials(&self) -> &StorageCredentials {
        &self.credentials
    }

    /// The endpoint template with the environment substituted in.
    pub fn resolved_endpoint(&self) -> Result<String, SyncError> {
        resolve_template(&self.endpoint_template, self.environment)
    }

    /// Build a fresh container client.
    pub fn client(&self) -> Result<Arc<dyn ObjectStore>, SyncError> {
        let builder = MicrosoftAzureBuilder::new().with_container_name(&self.container);

        let builder = match &self.credentials {
            StorageCredentials::ConnectionString(raw) => {
                tracing::debug!(container = %self.container, "building client from connection string");
                ConnectionString::parse(raw)?.configure(builder)
            }
            StorageCredentials::Token(credential) => {
                let endpoint = self.resolved_endpoint()?;
                tracing::debug!(container = %self.container, %endpoint, "building client from token credential");
                let account = parse_account_endpoint(&endpoint)?;
                let mut builder = builder.with_account(account.account);
                if let Some(custom) = account.custom_endpoint {
                    builder = builder.with_config(AzureConfigKey::Endpoint, custom);
                }
                credential.configure(builder)
            }
        };

        let store = builder.build().map_err(|source| SyncError::Store {
            context: format!("failed to build client for container '{}'", self.container),
            source,
        })?;
        Ok(Arc::new(store))
    }

    /// Lazily list blobs whose names start with `name_prefix`.
    pub fn list_blobs(&self, name_prefix: Option<&str>) -> Result<BlobListing, SyncError> {
        Ok(BlobListing::new(self.client()?, name_prefix))
    }
}

#[async_trait]
impl BlobSource for StorageConnection {
    async fn list_blob_records(
        &self,
        name_prefix: Option<&str>,
        exclude_prefix: Option<&str>,
    ) -> Result<Vec<BlobRecord>, SyncError> {
        let records = self.list_blobs(name_prefix)?.records(exclude_prefix).await?;
        tracing::debug!(
            container = %self.container,
            count = records.len(),
            "listed blobs"
        );
        Ok(records)
    }

    async fn download_blob(&self, blob_name: &str) -> Result<Bytes, SyncError> {
        let client = self.client()?;
        let bytes = fetch_blob(client.as_ref(), blob_name).await?;
        tracing::debug!(blob_name, bytes = bytes.len(), "downloaded blob");
        Ok(bytes)
    }
}

/// Collects the connection settings and checks that exactly one credential
/// mechanism was supplied.
#[derive(Debug)]
pub struct StorageConnectionBuilder {
    endpoint_template: String,
    environment: Environment,
    container: String,
    connection_string: Option<String>,
    credential: Option<TokenCredential>,
}

impl StorageConnectionBuilder {
    pub fn connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    pub fn credential(mut self, credential: impl Into<TokenCredential>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn build(self) -> Result<StorageConnection, SyncError> {
        let credentials = match (self.connection_string, self.credential) {
            (Some(connection_string), None) => StorageCredentials::ConnectionString(connection_string),
            (None, Some(credential)) => StorageCredentials::Token(credential),
            (None, None) => {
                return Err(SyncError::Credential(
                    "either a connection string or a token credential is required".to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(SyncError::Credential(
                    "supply a connection string or a token credential, not both".to_string(),
                ));
            }
        };

        Ok(StorageConnection {
            endpoint_template: self.endpoint_template,
            environment: self.environment,
            container: self.container,
            credentials,
        })
    }
}
