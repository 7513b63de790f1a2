//! 传输服务行为：上传判定、幂等性、删除的原子性

mod common;

use common::{setup, write_with_mtime};
use std::sync::atomic::Ordering;

const T: i64 = 1_700_000_000;

#[tokio::test]
async fn should_upload_when_untracked() {
    let env = setup().await;
    let path = env.root.join("new.txt");
    write_with_mtime(&path, b"content", T);

    assert!(env.transfer.should_upload(&path).await.unwrap());
}

#[tokio::test]
async fn should_upload_when_tracked_mtime_is_older() {
    let env = setup().await;
    let path = env.root.join("stale.txt");
    write_with_mtime(&path, b"content", T);
    env.tracker
        .upsert("stale.txt", "hash", (T - 10) as f64)
        .await
        .unwrap();

    assert!(env.transfer.should_upload(&path).await.unwrap());
}

#[tokio::test]
async fn should_not_upload_on_exact_mtime_tie() {
    let env = setup().await;
    let path = env.root.join("tie.txt");
    write_with_mtime(&path, b"changed content, same mtime", T);
    env.tracker
        .upsert("tie.txt", "old-hash", T as f64)
        .await
        .unwrap();

    // 时间戳相同即视为最新，内容差异不参与判断
    assert!(!env.transfer.should_upload(&path).await.unwrap());
}

#[tokio::test]
async fn should_not_upload_when_tracked_mtime_is_newer() {
    let env = setup().await;
    let path = env.root.join("future.txt");
    write_with_mtime(&path, b"content", T);
    env.tracker
        .upsert("future.txt", "hash", (T + 10) as f64)
        .await
        .unwrap();

    assert!(!env.transfer.should_upload(&path).await.unwrap());
}

#[tokio::test]
async fn upload_twice_is_idempotent() {
    let env = setup().await;
    let path = env.root.join("doc.txt");
    write_with_mtime(&path, b"same content", T);

    env.transfer.upload(&path).await.unwrap();
    let first = env.tracker.get("doc.txt").await.unwrap().unwrap();

    env.transfer.upload(&path).await.unwrap();
    let second = env.tracker.get("doc.txt").await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(env.store.get("doc.txt").unwrap(), b"same content");
}

#[tokio::test]
async fn upload_records_key_hash_and_mtime() {
    let env = setup().await;
    let path = env.root.join("data.bin");
    write_with_mtime(&path, b"payload", T);

    env.transfer.upload(&path).await.unwrap();

    let rec = env.tracker.get("data.bin").await.unwrap().unwrap();
    assert_eq!(rec.object_key, "data.bin");
    assert_eq!(rec.file_hash, bucketsync::core::hash_bytes(b"payload"));
    assert_eq!(rec.modified_time, T as f64);
    assert_eq!(env.store.get("data.bin").unwrap(), b"payload");
}

#[tokio::test]
async fn failed_upload_leaves_tracker_untouched() {
    let env = setup().await;
    let path = env.root.join("fail.txt");
    write_with_mtime(&path, b"content", T);

    env.store.fail_write.store(true, Ordering::SeqCst);
    assert!(env.transfer.upload(&path).await.is_err());

    assert!(env.tracker.get("fail.txt").await.unwrap().is_none());
    assert!(!env.store.contains("fail.txt"));
}

#[tokio::test]
async fn download_sets_mtime_and_tracks_content() {
    let env = setup().await;
    env.store.insert("sub.txt", b"from remote", T as f64);

    env.transfer.download("sub.txt", T as f64).await.unwrap();

    let local = env.root.join("sub.txt");
    assert_eq!(std::fs::read(&local).unwrap(), b"from remote");

    let mtime = std::fs::metadata(&local)
        .unwrap()
        .modified()
        .unwrap()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    assert_eq!(mtime, T as u64);

    let rec = env.tracker.get("sub.txt").await.unwrap().unwrap();
    assert_eq!(rec.file_hash, bucketsync::core::hash_bytes(b"from remote"));
    assert_eq!(rec.modified_time, T as f64);

    // 下载后时间戳持平，不会被再次判定为需上传
    assert!(!env.transfer.should_upload(&local).await.unwrap());
}

#[tokio::test]
async fn delete_removes_remote_local_and_record() {
    let env = setup().await;
    let path = env.root.join("gone.txt");
    write_with_mtime(&path, b"content", T);
    env.transfer.upload(&path).await.unwrap();

    env.transfer.delete(&path).await.unwrap();

    assert!(!env.store.contains("gone.txt"));
    assert!(!path.exists());
    assert!(env.tracker.get("gone.txt").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_remote_delete_leaves_everything_in_place() {
    let env = setup().await;
    let path = env.root.join("keep.txt");
    write_with_mtime(&path, b"content", T);
    env.transfer.upload(&path).await.unwrap();
    let before = env.tracker.get("keep.txt").await.unwrap().unwrap();

    env.store.fail_delete.store(true, Ordering::SeqCst);
    assert!(env.transfer.delete(&path).await.is_err());

    // 本地文件与跟踪记录必须原封不动
    assert!(path.exists());
    assert_eq!(std::fs::read(&path).unwrap(), b"content");
    let after = env.tracker.get("keep.txt").await.unwrap().unwrap();
    assert_eq!(before, after);
    assert!(env.store.contains("keep.txt"));
}

#[tokio::test]
async fn delete_of_local_only_file_succeeds() {
    let env = setup().await;
    let path = env.root.join("never-uploaded.txt");
    write_with_mtime(&path, b"content", T);

    // 远程本就没有该键，删除视为成功，本地文件随之移除
    env.transfer.delete(&path).await.unwrap();
    assert!(!path.exists());
}
