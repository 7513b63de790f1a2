//! 文件跟踪库 - 唯一的持久化状态
//!
//! 单表 `files(object_key TEXT PRIMARY KEY, file_hash TEXT, modified_time REAL)`，
//! 记录每个对象键最后一次成功传输时的内容哈希与修改时间。
//! 每个操作从连接池独立取一条连接执行，主任务与事件分发任务并发访问
//! 时不会争用同一个连接；写入全部为按主键整行替换，不存在读改写竞争。

use crate::error::SyncResult;
use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 跟踪记录：某个对象键最后一次同步成功时的状态
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TrackedFile {
    pub object_key: String,
    pub file_hash: String,
    pub modified_time: f64,
}

/// 打开（或创建）跟踪库并确保表结构存在
pub async fn open_pool(db_path: &Path) -> Result<SqlitePool> {
    // SQLite 连接字符串格式: sqlite:path
    // Windows 路径需要转换反斜杠为正斜杠
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid database path"))?
        .replace('\\', "/");

    let db = SqlitePoolOptions::new()
        .max_connections(5) // SQLite 单文件，不需要太多连接
        .acquire_timeout(Duration::from_secs(30))
        .connect(&format!("sqlite:{}?mode=rwc", db_path_str))
        .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS files (
            object_key    TEXT PRIMARY KEY,
            file_hash     TEXT,
            modified_time REAL
        )"#,
    )
    .execute(&db)
    .await?;

    debug!("跟踪库已就绪: {:?}", db_path);
    Ok(db)
}

/// 文件跟踪器
///
/// 只有传输服务写入跟踪记录，对账引擎与事件分发只通过
/// `should_upload` 读取派生结论。
#[derive(Clone)]
pub struct FileTracker {
    db: Arc<SqlitePool>,
}

impl FileTracker {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// 查询对象键的跟踪记录
    pub async fn get(&self, object_key: &str) -> SyncResult<Option<TrackedFile>> {
        let row = sqlx::query_as::<_, TrackedFile>(
            "SELECT object_key, file_hash, modified_time FROM files WHERE object_key = ?",
        )
        .bind(object_key)
        .fetch_optional(&*self.db)
        .await?;

        Ok(row)
    }

    /// 插入或整行替换跟踪记录（幂等）
    pub async fn upsert(&self, object_key: &str, file_hash: &str, modified_time: f64) -> SyncResult<()> {
        sqlx::query(
            r#"INSERT INTO files (object_key, file_hash, modified_time)
               VALUES (?, ?, ?)
               ON CONFLICT(object_key) DO UPDATE SET
                   file_hash = excluded.file_hash,
                   modified_time = excluded.modified_time"#,
        )
        .bind(object_key)
        .bind(file_hash)
        .bind(modified_time)
        .execute(&*self.db)
        .await?;

        Ok(())
    }

    /// 删除跟踪记录（不存在时为空操作）
    pub async fn remove(&self, object_key: &str) -> SyncResult<()> {
        sqlx::query("DELETE FROM files WHERE object_key = ?")
            .bind(object_key)
            .execute(&*self.db)
            .await?;

        Ok(())
    }
}
