//! Endpoint - 環境ごとのエンドポイント解決
//!
//! テンプレートは `{}` を環境名のプレースホルダとして持つ URL
//! （例: `https://stbillingcosts{}we.blob.core.windows.net/`）。
//! `{}` 以外の波括弧は不正なテンプレートとして扱う。

use url::Url;

use crate::domain::{Environment, SyncError};

const PUBLIC_BLOB_HOST_SUFFIX: &str = ".blob.core.windows.net";

/// Storage account addressed by a resolved endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEndpoint {
    pub account: String,
    /// Set when the host is not `<account>.blob.core.windows.net`.
    pub custom_endpoint: Option<String>,
}

/// Substitute `environment` into every `{}` of `template`.
pub fn resolve_template(template: &str, environment: Environment) -> Result<String, SyncError> {
    let parts: Vec<&str> = template.split("{}").collect();
    if parts.iter().any(|p| p.contains(['{', '}'])) {
        return Err(SyncError::Template {
            template: template.to_string(),
            reason: "only '{}' placeholders are supported".to_string(),
        });
    }
    Ok(parts.join(environment.as_str()))
}

/// 解決済みエンドポイントからアカウント名と（必要なら）エンドポイント上書きを取り出す
///
/// エミュレータ形式（`http://127.0.0.1:10000/devstoreaccount1`）はパスの
/// 先頭セグメントがアカウント名。userinfo / query / fragment は無視する。
pub fn parse_account_endpoint(endpoint: &str) -> Result<AccountEndpoint, SyncError> {
    let invalid = |reason: String| SyncError::Template {
        template: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(format!("invalid endpoint URL: {e}")))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("endpoint has no host".to_string()))?;

    if url.port().is_none()
        && let Some(account) = host.strip_suffix(PUBLIC_BLOB_HOST_SUFFIX)
    {
        return Ok(AccountEndpoint {
            account: account.to_string(),
            custom_endpoint: None,
        });
    }

    let account = url
        .path_segments()
        .and_then(|mut segments| segments.next())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| host.split('.').next().unwrap_or(host));

    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let custom_endpoint = format!(
        "{}://{}{}",
        url.scheme(),
        authority,
        url.path().trim_end_matches('/')
    );

    Ok(AccountEndpoint {
        account: account.to_string(),
        custom_endpoint: Some(custom_endpoint),
    })
}
