//! 错误类型 - 区分远程操作失败与本地 IO 失败
//!
//! 同步过程中的错误不会终止进程：调用方记录日志后继续运行，
//! 失败的操作等待下一个匹配的文件事件或下一次启动对账时重试。

use thiserror::Error;

/// 同步操作错误
#[derive(Debug, Error)]
pub enum SyncError {
    /// 远程存储操作失败（列表/上传/下载/删除）
    #[error("远程存储操作失败: {0}")]
    Remote(anyhow::Error),

    /// 本地文件操作失败（文件缺失、权限不足等）
    #[error("本地文件操作失败: {0}")]
    LocalIo(#[from] std::io::Error),

    /// 状态库操作失败
    #[error("状态库操作失败: {0}")]
    Tracker(#[from] sqlx::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
