//! 文件事件监视 - 把 notify 的回调流转成串行的传输调用
//!
//! notify 在自己的线程里回调，事件经有界通道转入一个专用的分发任务，
//! 逐条处理，不合并、不去抖；每条事件的传输完成后才取下一条，
//! 因此同一个键的最终跟踪状态由最后处理的事件决定。

use crate::core::transfer::TransferService;
use anyhow::Result;
use notify::event::RemoveKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 监视服务状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    NotStarted,
    Running,
    Stopping,
    Stopped,
}

/// 文件系统事件（目录事件在入队前被过滤）
#[derive(Debug)]
enum FsEvent {
    Modified(PathBuf),
    Deleted(PathBuf),
}

/// 监视服务
pub struct WatchService {
    transfer: TransferService,
    root: PathBuf,
    state: Arc<Mutex<WatchState>>,
    watcher: Option<RecommendedWatcher>,
    task: Option<JoinHandle<()>>,
}

impl WatchService {
    pub fn new(transfer: TransferService, root: PathBuf) -> Self {
        Self {
            transfer,
            root,
            state: Arc::new(Mutex::new(WatchState::NotStarted)),
            watcher: None,
            task: None,
        }
    }

    pub fn state(&self) -> WatchState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: WatchState) {
        *self.state.lock().unwrap() = state;
    }

    /// 启动监视，须在启动对账完成之后调用
    pub fn start(&mut self) -> Result<()> {
        if self.state() != WatchState::NotStarted {
            anyhow::bail!("监视服务不支持重复启动");
        }

        let (tx, mut rx) = mpsc::channel::<FsEvent>(256);

        // notify 回调在其自有线程执行，blocking_send 桥接进 tokio
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => forward_event(&tx, event),
                Err(e) => error!("监视器错误: {}", e),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        let transfer = self.transfer.clone();
        let task = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                handle_event(&transfer, ev).await;
            }
        });

        self.watcher = Some(watcher);
        self.task = Some(task);
        self.set_state(WatchState::Running);
        info!("开始监视目录: {:?}", self.root);
        Ok(())
    }

    /// 停止监视：撤销 watcher、关闭通道、等待分发任务退出
    ///
    /// 正在进行的传输会被等到完成，不会强行中断。
    pub async fn stop(&mut self) {
        self.set_state(WatchState::Stopping);

        // drop watcher 即停止回调并关闭通道发送端
        self.watcher.take();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("分发任务异常退出: {}", e);
            }
        }

        self.set_state(WatchState::Stopped);
        info!("监视服务已停止");
    }
}

/// 把 notify 事件映射为待分发事件并入队
fn forward_event(tx: &mpsc::Sender<FsEvent>, event: notify::Event) {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => {
            for path in event.paths {
                let _ = tx.blocking_send(FsEvent::Modified(path));
            }
        }
        EventKind::Remove(kind) => {
            // 目录删除不产生对象键，直接忽略
            if kind == RemoveKind::Folder {
                return;
            }
            for path in event.paths {
                let _ = tx.blocking_send(FsEvent::Deleted(path));
            }
        }
        _ => {}
    }
}

/// 串行处理单条事件；任何错误只记录日志，监视循环继续运行
async fn handle_event(transfer: &TransferService, ev: FsEvent) {
    match ev {
        FsEvent::Modified(path) => {
            // 目录事件、以及已经输给后续删除事件的文件，直接忽略
            if !path.is_file() {
                debug!("文件不存在或为目录，跳过上传: {:?}", path);
                return;
            }

            match transfer.should_upload(&path).await {
                Ok(true) => {
                    if let Err(e) = transfer.upload(&path).await {
                        warn!("上传失败: {:?} - {}", path, e);
                    }
                }
                Ok(false) => debug!("文件已是最新: {:?}", path),
                Err(e) => warn!("检查文件状态失败: {:?} - {}", path, e),
            }
        }
        FsEvent::Deleted(path) => {
            if let Err(e) = transfer.delete(&path).await {
                warn!("删除失败: {:?} - {}", path, e);
            }
        }
    }
}
