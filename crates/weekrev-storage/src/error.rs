use weekrev_common::week::WeekError;

/// 持久层错误分类。
///
/// # Examples
///
/// ```rust
/// use weekrev_storage::error::StorageError;
///
/// let err = StorageError::NotFound {
///     entity: "review_report",
///     id: "42".to_string(),
/// };
/// assert!(err.to_string().contains("review_report"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 请求缺少必填字段或字段非法。
    #[error("Storage: validation failed: {0}")]
    Validation(String),

    /// 目标记录不存在。
    #[error("Storage: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// 唯一性冲突（如重名用户）。
    #[error("Storage: conflict: {0}")]
    Conflict(String),

    /// 报告已锁定，内容不可再修改。
    #[error("Storage: report {id} is locked")]
    Locked { id: String },

    /// 日期 / 周次计算失败。
    #[error("Storage: {0}")]
    Week(#[from] WeekError),

    /// 底层数据库错误。
    #[error("Storage: database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// JSON 列编解码失败。
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 报告文件镜像读写失败。
    #[error("Storage: file mirror error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
