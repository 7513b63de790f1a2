//! 测试辅助：内存版远程存储与测试环境搭建
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use bucketsync::db::{self, FileTracker};
use bucketsync::{RemoteObject, RemoteStore, TransferService};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// 内存版远程存储，支持按操作注入故障
#[derive(Default)]
pub struct MemStore {
    objects: Mutex<HashMap<String, (Vec<u8>, f64)>>,
    pub fail_list: AtomicBool,
    pub fail_read: AtomicBool,
    pub fail_write: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MemStore {
    pub fn insert(&self, key: &str, data: &[u8], modified_time: f64) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), modified_time));
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteStore for MemStore {
    async fn list_objects(&self) -> Result<Vec<RemoteObject>> {
        if self.fail_list.load(Ordering::SeqCst) {
            anyhow::bail!("simulated list failure");
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(key, (_, modified_time))| RemoteObject {
                key: key.clone(),
                modified_time: *modified_time,
            })
            .collect())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        if self.fail_read.load(Ordering::SeqCst) {
            anyhow::bail!("simulated read failure");
        }
        self.get(key)
            .ok_or_else(|| anyhow::anyhow!("object not found: {}", key))
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> Result<()> {
        if self.fail_write.load(Ordering::SeqCst) {
            anyhow::bail!("simulated write failure");
        }
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, now));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("simulated delete failure");
        }
        // 与 S3 一致：删除不存在的对象不报错
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "mem://test"
    }
}

/// 测试环境：临时监视目录 + 临时跟踪库 + 内存远程存储
pub struct TestEnv {
    pub dir: TempDir,
    pub root: PathBuf,
    pub store: Arc<MemStore>,
    pub tracker: FileTracker,
    pub transfer: TransferService,
}

pub async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("watch");
    std::fs::create_dir_all(&root).unwrap();

    let pool = db::open_pool(&dir.path().join("tracker.db")).await.unwrap();
    let tracker = FileTracker::new(Arc::new(pool));

    let store = Arc::new(MemStore::default());
    let transfer = TransferService::new(store.clone(), tracker.clone(), root.clone());

    TestEnv {
        dir,
        root,
        store,
        tracker,
        transfer,
    }
}

/// 写入本地文件并固定修改时间
pub fn write_with_mtime(path: &std::path::Path, data: &[u8], mtime_secs: i64) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, data).unwrap();
    filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(mtime_secs, 0)).unwrap();
}
