use async_trait::async_trait;
use dashmap::DashMap;
use kanshi_core::cache::error::CacheError;
use kanshi_core::cache::port::Cache;

/// # Summary
/// 进程内字节级 KV 存储，状态追踪表的默认后端。
///
/// # Invariants
/// - 读写经由 `DashMap` 分片锁完成，可在任意任务间共享。
/// - 没有过期与容量淘汰，进程重启即清空。
#[derive(Default)]
pub struct MemCache {
    entries: DashMap<String, Vec<u8>>,
}

impl MemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保存的键数量。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemCache {
    async fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    /// 返回值为存储内容的副本，调用方修改不影响缓存。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}
