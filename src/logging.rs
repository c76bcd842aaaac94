//! 日志初始化
//!
//! 同时输出到终端和本次运行的日志文件 `transfer_log_<时间戳>.txt`

use anyhow::Context;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 本次运行的日志文件路径
pub fn log_file_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(format!(
        "transfer_log_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// 初始化 tracing，返回日志文件路径
///
/// 默认级别为 info，可通过 `RUST_LOG` 覆盖
pub fn init(dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("创建日志目录失败: {:?}", dir))?;

    let path = log_file_path(dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("创建日志文件失败: {:?}", path))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("初始化日志失败")?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        let path = log_file_path("/tmp/logs");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("transfer_log_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(path.parent().unwrap(), Path::new("/tmp/logs"));
    }
}
