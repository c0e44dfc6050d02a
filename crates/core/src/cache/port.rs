use crate::cache::error::CacheError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// # Summary
/// 业务无关的异步 KV 存储接口。状态追踪器通过它保存各标签页的状态表。
///
/// # Invariants
/// - 只处理原始字节，保证 Trait 对象安全，可以 `Arc<dyn Cache>` 注入。
#[async_trait]
pub trait Cache: Send + Sync {
    /// 写入原始字节，同名键直接覆盖。
    async fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// 读取原始字节，不存在时返回 `None`。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// 删除指定键，键不存在也视为成功。
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}

/// # Summary
/// 基于 JSON 的强类型读写扩展。
///
/// # Invariants
/// - 自动为所有实现 `Cache` 的类型 (包括 `dyn Cache`) 提供支持。
#[async_trait]
pub trait CacheExt: Cache {
    /// # Summary
    /// 存入强类型对象。
    ///
    /// # Logic
    /// 1. 使用 JSON 序列化对象。
    /// 2. 调用底层 `set_raw` 写入。
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialize(e.to_string()))?;
        self.set_raw(key, bytes).await
    }

    /// # Summary
    /// 取出强类型对象。
    ///
    /// # Returns
    /// 键不存在返回 `Ok(None)`，内容无法反序列化返回 `CacheError::Deserialize`。
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_raw(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Deserialize(e.to_string())),
            None => Ok(None),
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}
