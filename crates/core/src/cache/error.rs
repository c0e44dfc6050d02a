use thiserror::Error;

/// # Summary
/// 缓存域错误枚举，覆盖 KV 存储的序列化与底层故障。
///
/// # Invariants
/// - 刷新失败不属于缓存错误：刷新缓存吞掉上游错误并回退到旧条目。
#[derive(Error, Debug)]
pub enum CacheError {
    // 值序列化失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    // 值反序列化失败 (存储内容与期望类型不符)
    #[error("Deserialize error: {0}")]
    Deserialize(String),
    // 底层存储引擎故障
    #[error("Storage error: {0}")]
    Storage(String),
}
