//! SyncPipeline - ローカルディレクトリをリモートの blob 集合に追いつかせる
//!
//! # 1 回の実行の流れ
//! 1. blob を 1 回だけ一覧取得（prefix / 除外 prefix で絞り込み可）
//! 2. 名前を平坦化（`/` → `_`）してローカルのファイル名にする
//! 3. raw ディレクトリにそのファイルがあればスキップ
//! 4. なければダウンロード → CSV として解析 → processed ディレクトリへ書き出し
//!
//! blob は一覧の順に 1 件ずつ処理する。最初のエラーで実行は中断するが、
//! それまでに書いたファイルは残るので、再実行で残りから再開できる。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::status::SyncReport;
use crate::domain::{BlobRecord, BlobState, SyncError};
use crate::ports::{BlobSource, TableCodec};

/// Directories and listing filters for one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Presence of `<raw_dir>/<flattened name>` marks a blob as already synced.
    pub raw_dir: PathBuf,
    /// Converted files are written here.
    pub processed_dir: PathBuf,
    pub name_prefix: Option<String>,
    pub exclude_prefix: Option<String>,
}

impl SyncConfig {
    pub fn new(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
            name_prefix: None,
            exclude_prefix: None,
        }
    }

    /// Check and write in the same directory.
    pub fn single_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self::new(dir.clone(), dir)
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_prefix = Some(prefix.into());
        self
    }
}

pub struct SyncPipeline {
    source: Arc<dyn BlobSource>,
    codec: Arc<dyn TableCodec>,
    config: SyncConfig,
}

impl SyncPipeline {
    pub fn new(source: Arc<dyn BlobSource>, codec: Arc<dyn TableCodec>, config: SyncConfig) -> Self {
        Self {
            source,
            codec,
            config,
        }
    }

    /// Run one pass over the remote listing.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let records = self
            .source
            .list_blob_records(
                self.config.name_prefix.as_deref(),
                self.config.exclude_prefix.as_deref(),
            )
            .await?;
        let names: Vec<&str> = records.iter().map(|r| r.blob_name.as_str()).collect();
        tracing::info!(count = records.len(), blobs = ?names, "Downloading and exporting");

        let processed_dir = &self.config.processed_dir;
        tokio::fs::create_dir_all(processed_dir)
            .await
            .map_err(|e| SyncError::io(processed_dir, e))?;

        let mut report = SyncReport {
            discovered: records.len(),
            ..SyncReport::default()
        };
        for record in &records {
            let state = self.sync_one(record).await?;
            report.record(&record.blob_name, record.flattened_name(), state);
        }

        tracing::info!(
            discovered = report.discovered,
            skipped = report.skipped,
            converted = report.converted,
            "sync finished"
        );
        Ok(report)
    }

    async fn sync_one(&self, record: &BlobRecord) -> Result<BlobState, SyncError> {
        let file_name = record.flattened_name();
        let state = BlobState::Discovered;

        let raw_path = self.config.raw_dir.join(&file_name);
        if exists(&raw_path).await? {
            tracing::info!(blob = %record.local_name, "Skipping {file_name}; already exists");
            return Ok(advance(state, BlobState::Skipped));
        }

        let bytes = self.source.download_blob(&record.blob_name).await?;
        let state = advance(state, BlobState::Downloaded);

        let codec_error = |source| SyncError::Codec {
            blob_name: record.blob_name.clone(),
            source,
        };
        let table = self.codec.decode(&bytes).map_err(codec_error)?;
        let encoded = self.codec.encode(&table).map_err(codec_error)?;

        let processed_dir = &self.config.processed_dir;
        let out_path = processed_dir.join(&file_name);
        tokio::fs::write(&out_path, encoded)
            .await
            .map_err(|e| SyncError::io(&out_path, e))?;

        tracing::info!(
            blob = %record.local_name,
            rows = table.len(),
            "Exported {file_name} into {}",
            processed_dir.display()
        );
        Ok(advance(state, BlobState::Converted))
    }
}

fn advance(from: BlobState, to: BlobState) -> BlobState {
    debug_assert!(from.can_transition_to(to), "illegal transition {from:?} -> {to:?}");
    tracing::trace!(?from, ?to, "blob state");
    to
}

async fn exists(path: &Path) -> Result<bool, SyncError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| SyncError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::listing::tests::store_with;
    use crate::impls::{BlobListing, CsvCodec, fetch_blob};
    use async_trait::async_trait;
    use bytes::Bytes;
    use object_store::ObjectStore;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    /// In-memory container that records every download request.
    struct CountingSource {
        store: Arc<dyn ObjectStore>,
        downloads: Mutex<Vec<String>>,
    }

    impl CountingSource {
        async fn with(blobs: &[(&str, &'static str)]) -> Arc<Self> {
            Arc::new(Self {
                store: store_with(blobs).await,
                downloads: Mutex::new(Vec::new()),
            })
        }

        fn downloads(&self) -> Vec<String> {
            self.downloads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BlobSource for CountingSource {
        async fn list_blob_records(
            &self,
            name_prefix: Option<&str>,
            exclude_prefix: Option<&str>,
        ) -> Result<Vec<BlobRecord>, SyncError> {
            BlobListing::new(self.store.clone(), name_prefix)
                .records(exclude_prefix)
                .await
        }

        async fn download_blob(&self, blob_name: &str) -> Result<Bytes, SyncError> {
            self.downloads.lock().unwrap().push(blob_name.to_string());
            fetch_blob(self.store.as_ref(), blob_name).await
        }
    }

    fn pipeline(source: &Arc<CountingSource>, config: SyncConfig) -> SyncPipeline {
        SyncPipeline::new(source.clone(), Arc::new(CsvCodec::new()), config)
    }

    fn files_in(dir: &Path) -> BTreeSet<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    const JANUARY: &str = "date,cost\n2024-01-01,1.5\n";
    const FEBRUARY: &str = "date,cost\n2024-02-01,2.5\n2024-02-02,0.5\n";

    #[tokio::test]
    async fn exports_every_missing_blob_as_csv() {
        let raw = tempfile::tempdir().unwrap();
        let processed = tempfile::tempdir().unwrap();
        let source = CountingSource::with(&[
            ("2024/01/report.csv", JANUARY),
            ("2024/02/report.csv", FEBRUARY),
        ])
        .await;

        let report = pipeline(&source, SyncConfig::new(raw.path(), processed.path()))
            .sync()
            .await
            .unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.converted, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            files_in(processed.path()),
            BTreeSet::from(["2024_01_report.csv".to_string(), "2024_02_report.csv".to_string()])
        );

        let written = std::fs::read_to_string(processed.path().join("2024_02_report.csv")).unwrap();
        assert_eq!(written, ",date,cost\n0,2024-02-01,2.5\n1,2024-02-02,0.5\n");
    }

    #[tokio::test]
    async fn existing_raw_file_is_never_downloaded() {
        let raw = tempfile::tempdir().unwrap();
        let processed = tempfile::tempdir().unwrap();
        std::fs::write(raw.path().join("2024_01_report.csv"), "stale").unwrap();
        let source = CountingSource::with(&[
            ("2024/01/report.csv", JANUARY),
            ("2024/02/report.csv", FEBRUARY),
        ])
        .await;

        let report = pipeline(&source, SyncConfig::new(raw.path(), processed.path()))
            .sync()
            .await
            .unwrap();

        assert_eq!(source.downloads(), vec!["2024/02/report.csv".to_string()]);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.converted, 1);
        assert_eq!(report.exported().collect::<Vec<_>>(), vec!["2024_02_report.csv"]);
        // the existing file is not re-validated or touched
        assert_eq!(std::fs::read_to_string(raw.path().join("2024_01_report.csv")).unwrap(), "stale");
    }

    #[tokio::test]
    async fn second_run_downloads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::with(&[
            ("2024/01/report.csv", JANUARY),
            ("2024/02/report.csv", FEBRUARY),
        ])
        .await;
        let pipeline = pipeline(&source, SyncConfig::single_dir(dir.path()));

        pipeline.sync().await.unwrap();
        let after_first = files_in(dir.path());
        assert_eq!(source.downloads().len(), 2);

        let report = pipeline.sync().await.unwrap();
        assert_eq!(source.downloads().len(), 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(files_in(dir.path()), after_first);
    }

    #[tokio::test]
    async fn codec_failure_aborts_but_keeps_earlier_exports() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::with(&[
            ("a/first.csv", JANUARY),
            ("b/broken.csv", "x,y\n1,2,3\n"),
            ("c/never.csv", FEBRUARY),
        ])
        .await;

        let err = pipeline(&source, SyncConfig::single_dir(dir.path()))
            .sync()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Codec { ref blob_name, .. } if blob_name == "b/broken.csv"));
        assert_eq!(files_in(dir.path()), BTreeSet::from(["a_first.csv".to_string()]));
        assert_eq!(
            source.downloads(),
            vec!["a/first.csv".to_string(), "b/broken.csv".to_string()]
        );
    }

    #[tokio::test]
    async fn malformed_name_aborts_before_any_download() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::with(&[("2024/01/report.csv", JANUARY), ("noslash", JANUARY)]).await;

        let err = pipeline(&source, SyncConfig::single_dir(dir.path()))
            .sync()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::MalformedName { .. }));
        assert!(source.downloads().is_empty());
    }

    #[tokio::test]
    async fn filters_and_missing_processed_dir() {
        let raw = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let processed = root.path().join("data").join("processed");
        let source = CountingSource::with(&[
            ("2024/01/report.csv", JANUARY),
            ("2024/archive/old.csv", JANUARY),
            ("2023/12/report.csv", JANUARY),
        ])
        .await;

        let config = SyncConfig::new(raw.path(), &processed)
            .with_name_prefix("2024/")
            .with_exclude_prefix("2024/archive/");
        let report = pipeline(&source, config).sync().await.unwrap();

        assert_eq!(report.discovered, 1);
        assert_eq!(files_in(&processed), BTreeSet::from(["2024_01_report.csv".to_string()]));
    }

    #[tokio::test]
    async fn without_index_writes_input_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::with(&[("2024/02/report.csv", FEBRUARY)]).await;
        let pipeline = SyncPipeline::new(
            source.clone(),
            Arc::new(CsvCodec::without_index()),
            SyncConfig::single_dir(dir.path()),
        );

        pipeline.sync().await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("2024_02_report.csv")).unwrap();
        assert_eq!(written, FEBRUARY);
    }
}
