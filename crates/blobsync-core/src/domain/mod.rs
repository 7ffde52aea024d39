//! Domain - ドメインモデル（blob レコード、環境、状態、エラー）

pub mod blob;
pub mod environment;
pub mod errors;
pub mod state;

pub use self::blob::{BlobRecord, flattened_name, local_name};
pub use self::environment::{Environment, UnknownEnvironment};
pub use self::errors::{CodecError, SyncError};
pub use self::state::BlobState;
