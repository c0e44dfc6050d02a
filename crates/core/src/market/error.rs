use thiserror::Error;

/// # Summary
/// 行情数据域错误枚举。
///
/// # Invariants
/// - 单个市场的数据错误由快照构建器就地吸收，只有批量接口的错误会向上传播。
#[derive(Error, Debug)]
pub enum MarketError {
    // 传输层错误 (连接失败、超时等)
    #[error("Network error: {0}")]
    Network(String),
    // 上游返回非 2xx 状态码
    #[error("Upstream returned HTTP {status} for {endpoint}")]
    Http { endpoint: String, status: u16 },
    // 响应体无法解析为预期结构
    #[error("Parse error: {0}")]
    Parse(String),
    // 上游返回空结果
    #[error("Data not found")]
    NotFound,
}
