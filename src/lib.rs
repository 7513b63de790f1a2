use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod logging;
pub mod storage;

pub use config::{AppConfig, S3Config};
pub use core::{ReconcileReport, Reconciler, TransferService, WatchService, WatchState};
pub use db::{FileTracker, TrackedFile};
pub use error::{SyncError, SyncResult};
pub use storage::{RemoteObject, RemoteStore};

/// 应用状态：显式构造一次，传给所有需要的组件，不使用全局单例
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub store: Arc<dyn RemoteStore>,
    pub transfer: TransferService,
    pub watch_root: PathBuf,
}

impl AppState {
    pub async fn new(config: &AppConfig, config_dir: &std::path::Path) -> anyhow::Result<Self> {
        let watch_root = PathBuf::from(&config.watch_dir);
        if !watch_root.exists() {
            std::fs::create_dir_all(&watch_root)?;
        }

        let db_path = config
            .db_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir.join("bucketsync.db"));
        let db = Arc::new(db::open_pool(&db_path).await?);

        let store = storage::create_store(&config.s3).await?;
        let tracker = FileTracker::new(db.clone());
        let transfer = TransferService::new(store.clone(), tracker, watch_root.clone());

        Ok(Self {
            db,
            store,
            transfer,
            watch_root,
        })
    }

    /// 清理资源（进程退出前调用）
    pub async fn cleanup(&self) {
        tracing::debug!("关闭数据库连接池...");
        self.db.close().await;
        tracing::info!("资源清理完成");
    }
}

/// 平台相关的配置目录
pub mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
        } else {
            // Linux
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        }
    }
}
