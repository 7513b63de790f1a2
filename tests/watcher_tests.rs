//! 监视服务：状态机与事件驱动的增量同步

mod common;

use bucketsync::{WatchService, WatchState};
use common::setup;
use std::time::Duration;

/// 轮询等待条件成立，最长约 10 秒
async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn state_machine_walks_through_lifecycle() {
    let env = setup().await;
    let mut watch = WatchService::new(env.transfer.clone(), env.root.clone());

    assert_eq!(watch.state(), WatchState::NotStarted);

    watch.start().unwrap();
    assert_eq!(watch.state(), WatchState::Running);

    watch.stop().await;
    assert_eq!(watch.state(), WatchState::Stopped);

    // 单次运行内不支持重启
    assert!(watch.start().is_err());
}

#[tokio::test]
async fn created_file_is_uploaded_and_removed_file_is_deleted() {
    let env = setup().await;
    let mut watch = WatchService::new(env.transfer.clone(), env.root.clone());
    watch.start().unwrap();

    let path = env.root.join("evt.txt");
    std::fs::write(&path, b"event payload").unwrap();

    let store = env.store.clone();
    assert!(
        wait_for(|| store.contains("evt.txt")).await,
        "文件创建后应被上传"
    );
    assert_eq!(env.store.get("evt.txt").unwrap(), b"event payload");
    assert!(env.tracker.get("evt.txt").await.unwrap().is_some());

    std::fs::remove_file(&path).unwrap();
    assert!(
        wait_for(|| !store.contains("evt.txt")).await,
        "文件删除后远程对象应被移除"
    );
    assert!(env.tracker.get("evt.txt").await.unwrap().is_none());

    watch.stop().await;
}
