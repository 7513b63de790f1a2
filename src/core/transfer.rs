//! 传输服务 - 上传、下载、删除，成功后更新跟踪记录
//!
//! 跟踪记录只在对应的远程操作成功之后写入；远程操作失败时
//! 直接返回错误，跟踪库保持原状，等待后续事件或下次对账重试。

use crate::core::hasher;
use crate::db::FileTracker;
use crate::error::{SyncError, SyncResult};
use crate::storage::RemoteStore;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::{debug, info};

/// 从文件路径派生对象键（只取文件名，不含目录部分）
///
/// 不同子目录下的同名文件会映射到同一个对象键，当前按原样保留。
pub fn object_key(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

fn key_for(path: &Path) -> SyncResult<String> {
    object_key(path).ok_or_else(|| {
        SyncError::LocalIo(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("无法从路径派生对象键: {:?}", path),
        ))
    })
}

/// 传输服务
#[derive(Clone)]
pub struct TransferService {
    store: Arc<dyn RemoteStore>,
    tracker: FileTracker,
    watch_root: PathBuf,
}

impl TransferService {
    pub fn new(store: Arc<dyn RemoteStore>, tracker: FileTracker, watch_root: PathBuf) -> Self {
        Self {
            store,
            tracker,
            watch_root,
        }
    }

    /// 读取文件修改时间（Unix 秒，含小数部分）
    async fn local_mtime(&self, path: &Path) -> SyncResult<f64> {
        let meta = fs::metadata(path).await?;
        let mtime = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map_err(|e| {
                SyncError::LocalIo(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?
            .as_secs_f64();
        Ok(mtime)
    }

    /// 判断文件是否需要上传
    ///
    /// 规则：没有跟踪记录，或记录的修改时间严格小于当前文件修改时间。
    /// 只比较时间戳，已存的内容哈希不参与判断；时间相同即视为最新，
    /// 即使内容已变化。
    pub async fn should_upload(&self, path: &Path) -> SyncResult<bool> {
        let key = key_for(path)?;
        let mtime = self.local_mtime(path).await?;

        match self.tracker.get(&key).await? {
            None => Ok(true),
            Some(rec) => Ok(rec.modified_time < mtime),
        }
    }

    /// 上传文件到远程存储，成功后写入跟踪记录
    pub async fn upload(&self, path: &Path) -> SyncResult<()> {
        let key = key_for(path)?;
        let mtime = self.local_mtime(path).await?;
        let data = fs::read(path).await?;
        let file_hash = hasher::hash_bytes(&data);

        debug!("上传文件: {:?} -> {}/{}", path, self.store.name(), key);
        self.store
            .write(&key, data)
            .await
            .map_err(SyncError::Remote)?;

        self.tracker.upsert(&key, &file_hash, mtime).await?;
        info!("文件上传成功: {}", key);
        Ok(())
    }

    /// 从远程存储下载对象到监视目录，文件修改时间设为远程时间
    ///
    /// 设置修改时间使 `should_upload` 随后把该文件视为最新。
    pub async fn download(&self, key: &str, remote_mtime: f64) -> SyncResult<()> {
        let local_path = self.watch_root.join(key);
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        debug!("下载对象: {}/{} -> {:?}", self.store.name(), key, local_path);
        let data = self.store.read(key).await.map_err(SyncError::Remote)?;
        fs::write(&local_path, data).await?;

        filetime::set_file_mtime(&local_path, to_file_time(remote_mtime))?;

        // 对落盘后的内容计算哈希，再写跟踪记录
        let file_hash = hasher::hash_file(&local_path)?;
        self.tracker.upsert(key, &file_hash, remote_mtime).await?;
        info!("对象下载成功: {}", key);
        Ok(())
    }

    /// 删除：先删远程对象，成功后再删本地文件（若存在）与跟踪记录
    ///
    /// 远程删除失败时本地文件与跟踪记录原样保留，不会出现半删除状态。
    pub async fn delete(&self, path: &Path) -> SyncResult<()> {
        let key = key_for(path)?;

        debug!("删除对象: {}/{}", self.store.name(), key);
        self.store.delete(&key).await.map_err(SyncError::Remote)?;

        if fs::try_exists(path).await? {
            fs::remove_file(path).await?;
            debug!("本地文件已删除: {:?}", path);
        }

        self.tracker.remove(&key).await?;
        info!("文件删除成功: {}", key);
        Ok(())
    }
}

/// f64 Unix 秒转为 FileTime
fn to_file_time(mtime: f64) -> FileTime {
    let secs = mtime.trunc() as i64;
    let nanos = (mtime.fract() * 1_000_000_000.0) as u32;
    FileTime::from_unix_time(secs, nanos)
}
