//! 本地目录扫描 - 对账时重新计算，不持久化

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// 规范化路径分隔符（统一使用 /）
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// 递归扫描本地目录，返回相对路径集合（斜杠分隔，不含目录项）
pub async fn scan_local_tree(root: &Path) -> Result<HashSet<String>> {
    let base: PathBuf = root.to_path_buf();

    // 使用 spawn_blocking 避免阻塞 async runtime
    let files: HashSet<String> = tokio::task::spawn_blocking(move || {
        WalkDir::new(&base)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&base).ok()?.to_str()?;
                if relative.is_empty() {
                    return None;
                }
                Some(normalize_path(relative))
            })
            .collect()
    })
    .await?;

    info!("本地扫描完成: {} 个文件", files.len());
    Ok(files)
}
