/// 文档导出错误分类。
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// 单个转换策略失败（链内部使用，对外聚合为 `AllStrategiesFailed`）。
    #[error("Export: strategy '{strategy}' failed: {message}")]
    Strategy {
        strategy: &'static str,
        message: String,
    },

    /// 策略链全部失败。
    #[error("Export: all {target} conversion strategies failed: {details}")]
    AllStrategiesFailed {
        target: &'static str,
        details: String,
    },

    /// 临时文件 / 输出读写失败。
    #[error("Export: IO error: {0}")]
    Io(#[from] std::io::Error),

    /// zip 打包失败。
    #[error("Export: zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
