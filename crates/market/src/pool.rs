use futures::future::join_all;
use std::future::Future;

/// # Summary
/// 分批并发执行异步任务。
///
/// # Logic
/// 1. 按 `limit` 切分输入，批内任务并发执行。
/// 2. 上一批全部完成后才启动下一批。
/// 3. `limit` 为 0 时按 1 处理。
///
/// # Returns
/// 与输入顺序一致的结果列表。
pub async fn map_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let limit = limit.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut pending = items.into_iter().peekable();

    while pending.peek().is_some() {
        let batch: Vec<Fut> = pending.by_ref().take(limit).map(&f).collect();
        results.extend(join_all(batch).await);
    }
    results
}
