//! 订阅缓存存储 (Subscription Cache Store)
//!
//! 以 URL 哈希为键的磁盘键值层，只存取原始字节，不感知文档格式。

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use crate::core::error::Result;

/// 缓存键长度 (十六进制字符数)
const KEY_WIDTH: usize = 16;

/// 磁盘缓存存储
///
/// 缓存目录在构造时注入，进程内不持有全局路径。
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 计算 URL 对应的缓存键：blake3 哈希的前 16 位十六进制
    pub fn cache_key(url: &str) -> String {
        let mut key = blake3::hash(url.as_bytes()).to_hex().to_string();
        key.truncate(KEY_WIDTH);
        key
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::cache_key(url)))
    }

    /// 写入订阅内容，覆盖同键旧值
    pub async fn save(&self, url: &str, data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(url);
        fs::write(&path, data).await?;
        debug!("Cached {} bytes for {} at {}", data.len(), url, path.display());
        Ok(())
    }

    /// 读取缓存内容；条目不存在返回 None 而非错误
    pub async fn load(&self, url: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.entry_path(url)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 清除单条缓存；传入 None 时清空全部条目
    pub async fn clear(&self, url: Option<&str>) -> Result<()> {
        match url {
            Some(url) => match fs::remove_file(self.entry_path(url)).await {
                Ok(()) => {
                    debug!("Cleared cache entry for {}", url);
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            None => {
                let mut entries = match fs::read_dir(&self.dir).await {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                    Err(e) => return Err(e.into()),
                };
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        fs::remove_file(&path).await?;
                    }
                }
                debug!("Cleared all cache entries in {}", self.dir.display());
                Ok(())
            }
        }
    }
}
