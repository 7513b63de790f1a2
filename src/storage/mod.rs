pub mod s3;

use anyhow::Result;
use async_trait::async_trait;

pub use s3::S3Store;

/// 非 IO 操作超时（秒）- list, delete 等
pub const OP_TIMEOUT_SECS: u64 = 60;
/// IO 操作超时（秒）- read, write 等
pub const IO_TIMEOUT_SECS: u64 = 300;

/// 远程对象信息（每次对账时重新列取，不持久化）
#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub key: String,
    /// 远程最后修改时间（Unix 秒，含小数部分）
    pub modified_time: f64,
}

/// 远程对象存储抽象接口
///
/// 桶的版本控制属于一次性外部配置，不在此契约内。
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 列出桶内所有对象及其最后修改时间（分页由实现内部处理）
    async fn list_objects(&self) -> Result<Vec<RemoteObject>>;

    /// 读取整个对象
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// 写入整个对象
    async fn write(&self, key: &str, data: Vec<u8>) -> Result<()>;

    /// 删除对象
    async fn delete(&self, key: &str) -> Result<()>;

    /// 获取存储名称（用于日志）
    fn name(&self) -> &str;
}

/// 根据配置创建远程存储实例
pub async fn create_store(
    config: &crate::config::S3Config,
) -> Result<std::sync::Arc<dyn RemoteStore>> {
    tracing::info!(
        "初始化S3存储: bucket={}, region={}",
        config.bucket,
        config.region
    );
    Ok(std::sync::Arc::new(S3Store::new(config).await?) as std::sync::Arc<dyn RemoteStore>)
}
