//! 应用配置模块

use crate::logging::LogConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// S3 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// 被监视并与桶保持一致的本地目录
    pub watch_dir: String,
    /// 跟踪库文件路径（缺省放在配置目录下）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    pub s3: S3Config,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 从配置文件加载
    pub fn load(config_file: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_file)
            .with_context(|| format!("读取配置文件失败: {:?}", config_file))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {:?}", config_file))?;
        Ok(config)
    }

    /// 保存配置（首次运行时生成模板用）
    pub fn save(&self, config_file: &Path) -> Result<()> {
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_file, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// 生成占位配置，供用户填写
    pub fn template() -> Self {
        Self {
            watch_dir: "/path/to/documents".to_string(),
            db_path: None,
            s3: S3Config {
                bucket: "your-bucket".to_string(),
                region: "us-east-1".to_string(),
                access_key: "KEY".to_string(),
                secret_key: "KEY".to_string(),
                endpoint: Some("https://s3.wasabisys.com".to_string()),
                prefix: None,
            },
            log: LogConfig::default(),
        }
    }
}
