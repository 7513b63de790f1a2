pub mod hasher;
pub mod reconcile;
pub mod scanner;
pub mod transfer;
pub mod watcher;

pub use hasher::{hash_bytes, hash_file};
pub use reconcile::{ReconcileReport, Reconciler};
pub use scanner::scan_local_tree;
pub use transfer::{object_key, TransferService};
pub use watcher::{WatchService, WatchState};
