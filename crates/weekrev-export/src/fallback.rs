use futures_util::future::BoxFuture;

use crate::error::ExportError;

/// 一个转换策略：名称 + 惰性执行的异步闭包。
pub type StrategyFn<'a, T> =
    Box<dyn FnOnce() -> BoxFuture<'a, Result<T, ExportError>> + Send + 'a>;

/// 按固定顺序尝试策略链，首个成功者胜出。
///
/// 每个策略独立捕获自己的错误（warn 级日志），不影响后续策略；
/// 全部失败时返回 [`ExportError::AllStrategiesFailed`]，携带逐个策略的
/// 失败原因。
pub async fn run_with_fallbacks<'a, T>(
    target: &'static str,
    strategies: Vec<(&'static str, StrategyFn<'a, T>)>,
) -> Result<T, ExportError> {
    let mut failures = Vec::new();

    for (name, strategy) in strategies {
        match strategy().await {
            Ok(result) => {
                if !failures.is_empty() {
                    tracing::info!(
                        target_format = target,
                        strategy = name,
                        skipped = failures.len(),
                        "Conversion succeeded after fallback"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                tracing::warn!(
                    target_format = target,
                    strategy = name,
                    error = %e,
                    "Conversion strategy failed, trying next"
                );
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    Err(ExportError::AllStrategiesFailed {
        target,
        details: failures.join("; "),
    })
}
