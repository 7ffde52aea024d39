//! Listing - 任意の `ObjectStore` クライアント上の一覧取得とダウンロード
//!
//! `StorageConnection` は呼び出しごとに Azure クライアントを作ってここに渡す。
//! テストでは代わりにインメモリのストアを渡す。

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt, future, stream};
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore};

use crate::domain::{BlobRecord, SyncError};

/// A lazy, finite listing of blob metadata under a name prefix.
///
/// The listing owns the client it was created with; pages are requested only
/// as the stream is polled.
pub struct BlobListing {
    client: Arc<dyn ObjectStore>,
    name_prefix: Option<String>,
}

impl BlobListing {
    pub fn new(client: Arc<dyn ObjectStore>, name_prefix: Option<&str>) -> Self {
        Self {
            client,
            name_prefix: name_prefix.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref()
    }

    /// Entries whose names start with the prefix, in store order.
    ///
    /// The remote listing is segment based, so it is issued at the last `/`
    /// of the prefix and narrowed to a plain string prefix here.
    pub fn stream(&self) -> BoxStream<'_, Result<ObjectMeta, SyncError>> {
        let list_root = match self
            .name_prefix
            .as_deref()
            .and_then(|p| p.rsplit_once('/'))
            .map(|(dir, _)| Path::parse(dir))
            .transpose()
        {
            Ok(root) => root,
            Err(e) => {
                let err = SyncError::Store {
                    context: "name prefix is not a valid object path".to_string(),
                    source: e.into(),
                };
                return stream::once(future::ready(Err(err))).boxed();
            }
        };
        let name_prefix = self.name_prefix.clone();

        self.client
            .list(list_root.as_ref())
            .map_err(|source| SyncError::Store {
                context: "listing blobs failed".to_string(),
                source,
            })
            .try_filter(move |meta| {
                let keep = name_prefix
                    .as_deref()
                    .is_none_or(|p| meta.location.as_ref().starts_with(p));
                future::ready(keep)
            })
            .boxed()
    }

    /// Drain the listing into records, dropping names under `exclude_prefix`.
    pub async fn records(&self, exclude_prefix: Option<&str>) -> Result<Vec<BlobRecord>, SyncError> {
        let exclude_prefix = exclude_prefix.filter(|p| !p.is_empty());
        let mut stream = self.stream();
        let mut records = Vec::new();

        while let Some(meta) = stream.try_next().await? {
            let blob_name = meta.location.as_ref();
            if exclude_prefix.is_some_and(|p| blob_name.starts_with(p)) {
                tracing::trace!(blob_name, "excluded by prefix");
                continue;
            }
            records.push(BlobRecord::new(
                blob_name,
                meta.last_modified,
                meta.size as u64,
            )?);
        }
        Ok(records)
    }
}

/// Read the whole blob. Missing blobs map to `NotFound`, rejected credentials
/// to `Auth`.
///
/// `blob_name` is taken verbatim, exactly as the listing reported it.
pub async fn fetch_blob(client: &dyn ObjectStore, blob_name: &str) -> Result<Bytes, SyncError> {
    let location = Path::parse(blob_name).map_err(|e| SyncError::Store {
        context: format!("blob name '{blob_name}' is not a valid object path"),
        source: e.into(),
    })?;
    let result = client
        .get(&location)
        .await
        .map_err(|e| SyncError::from_store(blob_name, e))?;
    result
        .bytes()
        .await
        .map_err(|e| SyncError::from_store(blob_name, e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use object_store::PutPayload;
    use object_store::memory::InMemory;

    pub(crate) async fn store_with(blobs: &[(&str, &'static str)]) -> Arc<dyn ObjectStore> {
        let store = InMemory::new();
        for (name, body) in blobs {
            store
                .put(&Path::parse(*name).unwrap(), PutPayload::from_static(body.as_bytes()))
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    fn names(records: &[BlobRecord]) -> Vec<&str> {
        let mut names: Vec<&str> = records.iter().map(|r| r.blob_name.as_str()).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn records_cover_every_blob_without_filters() {
        let store = store_with(&[
            ("2024/01/report.csv", "a\n1\n"),
            ("2024/02/report.csv", "a\n2\n"),
            ("archive/2023/report.csv", "a\n3\n"),
        ])
        .await;

        let records = BlobListing::new(store, None).records(None).await.unwrap();
        assert_eq!(
            names(&records),
            vec!["2024/01/report.csv", "2024/02/report.csv", "archive/2023/report.csv"]
        );
        let first = records.iter().find(|r| r.blob_name == "2024/01/report.csv").unwrap();
        assert_eq!(first.local_name, "01/report.csv");
        assert_eq!(first.size, 4);
    }

    #[tokio::test]
    async fn exclude_prefix_drops_matching_names_only() {
        let store = store_with(&[
            ("archive/2023/report.csv", "x"),
            ("2024/01/report.csv", "x"),
            ("archived/notes.csv", "x"),
            ("archive/2022/report.csv", "x"),
        ])
        .await;

        let records = BlobListing::new(store, None)
            .records(Some("archive/"))
            .await
            .unwrap();
        assert_eq!(names(&records), vec!["2024/01/report.csv", "archived/notes.csv"]);
        assert!(records.iter().all(|r| !r.blob_name.starts_with("archive/")));
    }

    #[tokio::test]
    async fn name_prefix_is_a_string_prefix() {
        let store = store_with(&[
            ("2024/01/report.csv", "x"),
            ("2024/02/report.csv", "x"),
            ("2024/10/report.csv", "x"),
            ("2025/01/report.csv", "x"),
        ])
        .await;

        let listing = BlobListing::new(store, Some("2024/0"));
        let records = listing.records(None).await.unwrap();
        assert_eq!(names(&records), vec!["2024/01/report.csv", "2024/02/report.csv"]);
    }

    #[tokio::test]
    async fn prefix_directory_with_reserved_characters_lists() {
        let store = store_with(&[("exports[eu]/a.csv", "x"), ("exports[eu]/b.csv", "x"), ("exports/c.csv", "x")]).await;

        let records = BlobListing::new(store, Some("exports[eu]/a"))
            .records(None)
            .await
            .unwrap();
        assert_eq!(names(&records), vec!["exports[eu]/a.csv"]);
    }

    #[tokio::test]
    async fn prefix_without_separator_lists_from_the_root() {
        let store = store_with(&[("costs/a.csv", "x"), ("costs-old/b.csv", "x"), ("other/c.csv", "x")]).await;

        let records = BlobListing::new(store, Some("costs"))
            .records(None)
            .await
            .unwrap();
        assert_eq!(names(&records), vec!["costs-old/b.csv", "costs/a.csv"]);
    }

    #[tokio::test]
    async fn malformed_name_aborts_the_listing() {
        let store = store_with(&[("2024/01/report.csv", "x"), ("noslash", "x")]).await;

        let err = BlobListing::new(store, None).records(None).await.unwrap_err();
        assert!(matches!(err, SyncError::MalformedName { ref blob_name } if blob_name == "noslash"));
    }

    #[tokio::test]
    async fn fetch_returns_content() {
        let store = store_with(&[("2024/01/report.csv", "a,b\n1,2\n")]).await;
        let bytes = fetch_blob(store.as_ref(), "2024/01/report.csv").await.unwrap();
        assert_eq!(&bytes[..], b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn listed_name_with_reserved_characters_downloads() {
        let store = store_with(&[("exports/cost[1]#a.csv", "a\n1\n")]).await;

        let records = BlobListing::new(store.clone(), None).records(None).await.unwrap();
        assert_eq!(names(&records), vec!["exports/cost[1]#a.csv"]);

        let bytes = fetch_blob(store.as_ref(), &records[0].blob_name).await.unwrap();
        assert_eq!(&bytes[..], b"a\n1\n");
    }

    #[tokio::test]
    async fn fetch_rejects_names_that_are_not_object_paths() {
        let store = store_with(&[]).await;
        let err = fetch_blob(store.as_ref(), "2024//report.csv").await.unwrap_err();
        assert!(matches!(err, SyncError::Store { .. }));
    }

    #[tokio::test]
    async fn fetch_missing_blob_is_not_found() {
        let store = store_with(&[]).await;
        let err = fetch_blob(store.as_ref(), "2024/01/gone.csv").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound { ref blob_name } if blob_name == "2024/01/gone.csv"));
    }
}
