//! ログ出力の初期化。
pub(crate) mod tracing;

pub use self::tracing::init as init_tracing;
