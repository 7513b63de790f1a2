//! 启动对账 - 以远程存储为准，使本地目录与桶内容一致
//!
//! 仅在进程启动时执行一次，之后远程侧不再被轮询，所有影响远程的
//! 流量都来自本地文件事件。

use crate::core::scanner::scan_local_tree;
use crate::core::transfer::TransferService;
use crate::storage::RemoteStore;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 对账结果汇总
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// 远程有、本地无，已下载
    pub downloaded: u32,
    /// 本地有、远程无，已删除
    pub deleted: u32,
    /// 远程与本地同键，未做任何动作
    pub skipped: u32,
    /// 失败的单项操作数
    pub failed: u32,
    pub errors: Vec<String>,
}

/// 对账引擎
pub struct Reconciler {
    store: Arc<dyn RemoteStore>,
    transfer: TransferService,
    watch_root: PathBuf,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        transfer: TransferService,
        watch_root: PathBuf,
    ) -> Self {
        Self {
            store,
            transfer,
            watch_root,
        }
    }

    /// 执行一次完整对账
    ///
    /// 远程键在本地存在时直接跳过，不比较内容或时间戳；本地独有的
    /// 路径一律删除，包括从未上传过的文件。单项失败记录后继续。
    pub async fn run(&self) -> Result<ReconcileReport> {
        info!("开始对账: {} <-> {:?}", self.store.name(), self.watch_root);

        let objects = self.store.list_objects().await?;
        let mut local_only = scan_local_tree(&self.watch_root).await?;
        info!(
            "远程 {} 个对象, 本地 {} 个文件",
            objects.len(),
            local_only.len()
        );

        let mut report = ReconcileReport::default();

        for obj in objects {
            // 远程键在本地出现即视为已同步，从本地独有集合中移除
            if local_only.remove(&obj.key) {
                report.skipped += 1;
                continue;
            }

            match self.transfer.download(&obj.key, obj.modified_time).await {
                Ok(()) => report.downloaded += 1,
                Err(e) => {
                    warn!("下载失败: {} - {}", obj.key, e);
                    report.failed += 1;
                    report.errors.push(format!("{}: {}", obj.key, e));
                }
            }
        }

        // 剩余的本地独有文件全部删除（远程为准）
        for relative in local_only {
            let path = self.watch_root.join(&relative);
            match self.transfer.delete(&path).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!("删除失败: {} - {}", relative, e);
                    report.failed += 1;
                    report.errors.push(format!("{}: {}", relative, e));
                }
            }
        }

        info!(
            "对账完成: 下载 {}, 删除 {}, 跳过 {}, 失败 {}",
            report.downloaded, report.deleted, report.skipped, report.failed
        );
        Ok(report)
    }
}
