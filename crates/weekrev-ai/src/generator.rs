use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// LLM 调用失败分类。
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// 单个端点请求失败（网络、超时或非 2xx 响应）。
    #[error("LLM request to '{endpoint}' failed: {message}")]
    RequestFailed { endpoint: String, message: String },

    /// 响应可以解析但没有任何内容。
    #[error("LLM endpoint '{endpoint}' returned an empty response")]
    EmptyResponse { endpoint: String },

    /// 主备端点都已尝试且失败。
    #[error("all LLM endpoints failed; primary: {primary}; backup: {backup}")]
    AllEndpointsFailed { primary: String, backup: String },
}

/// 流式生成的内容分片序列。
pub type ChunkStream = BoxStream<'static, Result<String, LlmError>>;

/// 一次生成调用的输入。
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// system 角色指令
    pub system: String,
    /// user 角色正文（由 [`crate::prompt`] 构建）
    pub prompt: String,
}

/// 报告文本生成器（支持多端点 / 多提供商扩展）。
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// 端点标识（primary / backup / 提供商名）
    fn provider(&self) -> &str;

    /// 模型名称
    fn model_name(&self) -> &str;

    /// 阻塞式生成：返回完整文本。
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;

    /// 流式生成：返回增量内容分片流。
    ///
    /// 返回的流被丢弃时，底层 HTTP 请求一并取消；下游客户端断开即
    /// 终止上游调用。
    async fn generate_stream(&self, request: &GenerationRequest) -> Result<ChunkStream, LlmError>;
}
