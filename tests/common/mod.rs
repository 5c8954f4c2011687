#![allow(dead_code)]

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::DateTime;
use ftp_control::{
    port::{FtpClientPort, PortError, PortResult, TransferListener},
    protocol::{FileKind, FileRecord, Reply},
    ReplyReceiver,
};
use tokio::sync::Notify;

pub const BANNER: &str = "220 Welcome to the test server";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scripted port: records every call and can hold transfers until released or aborted
#[derive(Default)]
pub struct MockPort {
    calls: Mutex<Vec<String>>,
    logged_in: AtomicBool,
    hold_transfers: AtomicBool,
    release: Notify,
    abort: Notify,
}

impl MockPort {
    pub fn holding() -> Self {
        let port = Self::default();
        port.hold_transfers.store(true, Ordering::SeqCst);
        port
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn sample_files() -> Vec<FileRecord> {
    let modified = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    vec![
        FileRecord::new("readme.txt", FileKind::File, 1024, modified),
        FileRecord::new("pub", FileKind::Directory, 0, modified),
        FileRecord::link("latest", "pub/v2", modified),
    ]
}

#[async_trait]
impl FtpClientPort for MockPort {
    async fn connect(&self, host: &str, port: Option<u16>) -> PortResult<Vec<String>> {
        self.record(format!("connect {host}:{}", port.unwrap_or(21)));
        if host == "unreachable" {
            return Err(PortError::Io("connection refused".to_owned()));
        }
        Ok(vec![BANNER.to_owned()])
    }

    async fn disconnect(&self, force: bool) -> PortResult<()> {
        self.record(format!("disconnect {force}"));
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> PortResult<()> {
        self.record(format!("login {username}:{password}"));
        if username == "intruder" {
            return Err(PortError::Ftp {
                code: 530,
                message: "Login incorrect".to_owned(),
            });
        }
        self.logged_in.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> PortResult<()> {
        self.record("logout".to_owned());
        if !self.logged_in.swap(false, Ordering::SeqCst) {
            return Err(PortError::Ftp {
                code: 530,
                message: "Not logged in".to_owned(),
            });
        }
        Ok(())
    }

    async fn current_directory(&self) -> PortResult<String> {
        self.record("pwd".to_owned());
        Ok("/pub".to_owned())
    }

    async fn change_directory(&self, path: &str) -> PortResult<()> {
        self.record(format!("cd {path}"));
        Ok(())
    }

    async fn change_directory_up(&self) -> PortResult<()> {
        self.record("cdup".to_owned());
        Ok(())
    }

    async fn list(&self, file_spec: Option<&str>) -> PortResult<Vec<FileRecord>> {
        self.record(format!("list {}", file_spec.unwrap_or("")));
        Ok(sample_files())
    }

    async fn list_names(&self) -> PortResult<Vec<String>> {
        self.record("nlst".to_owned());
        Ok(sample_files().iter().map(|file| file.name().to_owned()).collect())
    }

    async fn download(
        &self,
        remote: &str,
        local: &Path,
        restart_at: u64,
        listener: &dyn TransferListener,
    ) -> PortResult<()> {
        self.record(format!("download {remote} {} {restart_at}", local.display()));
        if remote == "missing.txt" {
            return Err(PortError::FileNotFound(remote.to_owned()));
        }

        listener.started();
        listener.transferred(512);

        if self.hold_transfers.load(Ordering::SeqCst) {
            tokio::select! {
                _ = self.release.notified() => {}
                _ = self.abort.notified() => {
                    listener.aborted();
                    return Err(PortError::Aborted);
                }
            }
        }

        listener.transferred(512);
        listener.completed();
        Ok(())
    }

    async fn abort_current_transfer(&self, force: bool) -> PortResult<()> {
        self.record(format!("abort {force}"));
        self.abort.notify_one();
        Ok(())
    }
}

pub async fn next_reply(replies: &mut ReplyReceiver) -> Reply {
    tokio::time::timeout(Duration::from_secs(5), replies.recv())
        .await
        .expect("timed out waiting for a reply")
        .expect("reply channel closed")
}
