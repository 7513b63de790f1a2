use super::{RemoteObject, RemoteStore, IO_TIMEOUT_SECS, OP_TIMEOUT_SECS};
use crate::config::S3Config;
use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use opendal::{layers::TimeoutLayer, Metakey, Operator};
use std::time::Duration;

pub struct S3Store {
    operator: Operator,
    name: String,
}

impl S3Store {
    pub async fn new(config: &S3Config) -> Result<Self> {
        use opendal::services::S3;

        let mut builder = S3::default()
            .bucket(&config.bucket)
            .region(&config.region)
            .access_key_id(&config.access_key)
            .secret_access_key(&config.secret_key);

        if let Some(ref ep) = config.endpoint {
            builder = builder.endpoint(ep);
        }

        if let Some(ref p) = config.prefix {
            builder = builder.root(p);
        }

        // 添加超时层
        let operator = Operator::new(builder)?
            .layer(
                TimeoutLayer::default()
                    .with_timeout(Duration::from_secs(OP_TIMEOUT_SECS))
                    .with_io_timeout(Duration::from_secs(IO_TIMEOUT_SECS)),
            )
            .finish();

        let name = format!(
            "s3://{}{}",
            config.bucket,
            config
                .prefix
                .as_deref()
                .map(|p| format!("/{}", p))
                .unwrap_or_default()
        );

        Ok(Self { operator, name })
    }

    /// 远程时间戳转为 Unix 秒（保留亚秒部分）
    fn to_unix_secs(t: chrono::DateTime<chrono::Utc>) -> f64 {
        t.timestamp_micros() as f64 / 1_000_000.0
    }
}

#[async_trait]
impl RemoteStore for S3Store {
    async fn list_objects(&self) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();

        // 使用 lister_with 进行递归列表，分页由 opendal 内部完成
        let mut lister = self
            .operator
            .lister_with("")
            .recursive(true)
            .metakey(Metakey::ContentLength | Metakey::LastModified | Metakey::Mode)
            .await?;

        while let Some(entry) = lister.try_next().await? {
            let path_str = entry.path().to_string();

            // 跳过根目录
            if path_str.is_empty() || path_str == "/" {
                continue;
            }

            let meta = entry.metadata();
            if meta.is_dir() {
                continue;
            }

            objects.push(RemoteObject {
                key: path_str.trim_start_matches('/').to_string(),
                modified_time: meta.last_modified().map_or(0.0, Self::to_unix_secs),
            });
        }

        Ok(objects)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let data = self.operator.read(key).await?;
        Ok(data.to_vec())
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.operator.write(key, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // S3 删除不存在的对象不会报错
        self.operator.delete(key).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
