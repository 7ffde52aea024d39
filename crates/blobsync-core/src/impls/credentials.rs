//! Credentials - コンテナクライアントの 2 種類の認証手段
//!
//! # 手段
//! - **ConnectionString**: 自己完結した秘密情報（`AccountName=...;AccountKey=...`）
//! - **Token**: Azure AD 認証。client-id / secret / tenant の組、
//!   または任意の `object_store` Azure credential provider
//!
//! どちらを使うかは接続の構築時に 1 度だけ決まり、以降は `match` で分岐する。

use std::fmt;

use object_store::azure::{AzureConfigKey, AzureCredentialProvider, MicrosoftAzureBuilder};

use crate::domain::SyncError;

/// Exactly one credential mechanism per connection.
#[derive(Clone)]
pub enum StorageCredentials {
    ConnectionString(String),
    Token(TokenCredential),
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageCredentials::ConnectionString(_) => f.write_str("ConnectionString(<redacted>)"),
            StorageCredentials::Token(token) => f.debug_tuple("Token").field(token).finish(),
        }
    }
}

/// A token-issuing credential for Azure AD authentication.
#[derive(Debug, Clone)]
pub enum TokenCredential {
    ClientSecret(ClientSecretCredential),
    Provider(AzureCredentialProvider),
}

impl TokenCredential {
    pub(crate) fn configure(&self, builder: MicrosoftAzureBuilder) -> MicrosoftAzureBuilder {
        match self {
            TokenCredential::ClientSecret(secret) => builder.with_client_secret_authorization(
                &secret.client_id,
                &secret.client_secret,
                &secret.tenant_id,
            ),
            TokenCredential::Provider(provider) => builder.with_credentials(provider.clone()),
        }
    }
}

impl From<ClientSecretCredential> for TokenCredential {
    fn from(value: ClientSecretCredential) -> Self {
        TokenCredential::ClientSecret(value)
    }
}

/// Service principal credential: tenant id, client id and client secret.
#[derive(Clone)]
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, SyncError> {
        let client_secret = client_secret.into();
        if client_secret.trim().is_empty() {
            return Err(SyncError::Credential("client secret is empty".to_string()));
        }
        Ok(Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret,
        })
    }

    /// Read the secret from the environment variable `var`.
    ///
    /// Meant to be called once at startup; the credential is then passed
    /// down explicitly.
    pub fn from_env(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        var: &str,
    ) -> Result<Self, SyncError> {
        let secret = std::env::var(var).map_err(|e| {
            SyncError::Credential(format!("environment variable {var} is not usable: {e}"))
        })?;
        Self::new(tenant_id, client_id, secret)
    }
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Parsed form of an Azure storage connection string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub blob_endpoint: Option<String>,
    pub shared_access_signature: Option<String>,
    pub use_development_storage: bool,
    pub protocol: Option<String>,
    pub endpoint_suffix: Option<String>,
}

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

impl ConnectionString {
    /// Parse `Key=Value;Key=Value`. Keys are case-insensitive, values may
    /// themselves contain `=`.
    pub fn parse(raw: &str) -> Result<Self, SyncError> {
        let mut parsed = ConnectionString::default();

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                SyncError::Credential(format!("connection string segment without '=': '{segment}'"))
            })?;
            let value = value.trim().to_string();

            match key.trim().to_ascii_lowercase().as_str() {
                "accountname" => parsed.account_name = Some(value),
                "accountkey" => parsed.account_key = Some(value),
                "blobendpoint" => parsed.blob_endpoint = Some(value),
                "sharedaccesssignature" => parsed.shared_access_signature = Some(value),
                "usedevelopmentstorage" => {
                    parsed.use_development_storage = value.eq_ignore_ascii_case("true")
                }
                "defaultendpointsprotocol" => parsed.protocol = Some(value),
                "endpointsuffix" => parsed.endpoint_suffix = Some(value),
                other => tracing::debug!(key = other, "ignoring connection string key"),
            }
        }

        if parsed.account_name.is_none() && !parsed.use_development_storage {
            return Err(SyncError::Credential(
                "connection string has neither AccountName nor UseDevelopmentStorage".to_string(),
            ));
        }
        Ok(parsed)
    }

    /// The blob endpoint this string points at, when it is not the public
    /// cloud default.
    pub fn custom_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = &self.blob_endpoint {
            return Some(endpoint.trim_end_matches('/').to_string());
        }
        let suffix = self.endpoint_suffix.as_deref()?;
        if suffix == DEFAULT_ENDPOINT_SUFFIX {
            return None;
        }
        let account = self.account_name.as_deref()?;
        let protocol = self.protocol.as_deref().unwrap_or("https");
        Some(format!("{protocol}://{account}.blob.{suffix}"))
    }

    pub(crate) fn configure(&self, mut builder: MicrosoftAzureBuilder) -> MicrosoftAzureBuilder {
        if self.use_development_storage {
            builder = builder.with_use_emulator(true);
        }
        if let Some(account) = &self.account_name {
            builder = builder.with_account(account);
        }
        if let Some(key) = &self.account_key {
            builder = builder.with_access_key(key);
        }
        if let Some(sas) = &self.shared_access_signature {
            builder = builder.with_config(AzureConfigKey::SasKey, sas.trim_start_matches('?'));
        }
        if let Some(endpoint) = self.custom_endpoint() {
            builder = builder.with_config(AzureConfigKey::Endpoint, endpoint);
        }
        builder
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("account_key", &self.account_key.as_ref().map(|_| "<redacted>"))
            .field("blob_endpoint", &self.blob_endpoint)
            .field(
                "shared_access_signature",
                &self.shared_access_signature.as_ref().map(|_| "<redacted>"),
            )
            .field("use_development_storage", &self.use_development_storage)
            .finish()
    }
}
