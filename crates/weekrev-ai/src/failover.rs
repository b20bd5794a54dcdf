use async_trait::async_trait;

use crate::generator::{ChunkStream, GenerationRequest, LlmError, ReportGenerator};
use crate::providers::openai_compat::OpenAiCompatProvider;

/// 主备端点的一次性故障转移。
///
/// 端点选择是 **按请求** 的：先调主端点，失败且配置了备端点时改调备端点
/// 一次，再失败则报 [`LlmError::AllEndpointsFailed`]。没有跨请求的可变
/// 选择状态，一个请求的失败不会把其他并发请求重定向到备端点，下一个
/// 请求总是从主端点开始。
pub struct FailoverGenerator {
    primary: OpenAiCompatProvider,
    backup: Option<OpenAiCompatProvider>,
}

impl FailoverGenerator {
    pub fn new(primary: OpenAiCompatProvider, backup: Option<OpenAiCompatProvider>) -> Self {
        Self { primary, backup }
    }
}

#[async_trait]
impl ReportGenerator for FailoverGenerator {
    fn provider(&self) -> &str {
        self.primary.provider()
    }

    fn model_name(&self) -> &str {
        self.primary.model_name()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let primary_err = match self.primary.generate(request).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        let Some(backup) = &self.backup else {
            return Err(primary_err);
        };

        tracing::warn!(
            error = %primary_err,
            backup = %backup.provider(),
            "Primary LLM endpoint failed, retrying on backup"
        );
        match backup.generate(request).await {
            Ok(text) => Ok(text),
            Err(backup_err) => Err(LlmError::AllEndpointsFailed {
                primary: primary_err.to_string(),
                backup: backup_err.to_string(),
            }),
        }
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<ChunkStream, LlmError> {
        // 故障转移只覆盖"建立流"这一步；流开始后的中途失败无法换端点
        // （响应已经开始输出），以 Err 分片形式向下游传递。
        let primary_err = match self.primary.generate_stream(request).await {
            Ok(stream) => return Ok(stream),
            Err(e) => e,
        };

        let Some(backup) = &self.backup else {
            return Err(primary_err);
        };

        tracing::warn!(
            error = %primary_err,
            backup = %backup.provider(),
            "Primary LLM endpoint failed to open stream, retrying on backup"
        );
        match backup.generate_stream(request).await {
            Ok(stream) => Ok(stream),
            Err(backup_err) => Err(LlmError::AllEndpointsFailed {
                primary: primary_err.to_string(),
                backup: backup_err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::openai_compat::EndpointConfig;

    fn provider(name: &str, url: &str) -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(EndpointConfig::new(name, url, "glm-4", "test-key"))
            .expect("provider should build")
    }

    const OK_BODY: &str = r#"{"id":"1","object":"chat.completion","created":0,"model":"glm-4",
        "choices":[{"index":0,"message":{"role":"assistant","content":"备用端点内容"},"finish_reason":"stop"}],
        "usage":null}"#;

    fn request() -> GenerationRequest {
        GenerationRequest {
            system: String::new(),
            prompt: "生成".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failover_to_backup_on_primary_error() {
        let mut primary = mockito::Server::new_async().await;
        let mut backup = mockito::Server::new_async().await;
        let _p = primary
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("primary down")
            .create_async()
            .await;
        let _b = backup
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .create_async()
            .await;

        let generator = FailoverGenerator::new(
            provider("primary", &primary.url()),
            Some(provider("backup", &backup.url())),
        );

        let out = generator.generate(&request()).await.expect("backup should answer");
        assert_eq!(out, "备用端点内容");
    }

    #[tokio::test]
    async fn test_both_endpoints_failing_reports_all_failed() {
        let mut primary = mockito::Server::new_async().await;
        let mut backup = mockito::Server::new_async().await;
        let _p = primary
            .mock("POST", "/chat/completions")
            .with_status(500)
            .create_async()
            .await;
        let _b = backup
            .mock("POST", "/chat/completions")
            .with_status(503)
            .create_async()
            .await;

        let generator = FailoverGenerator::new(
            provider("primary", &primary.url()),
            Some(provider("backup", &backup.url())),
        );

        let err = generator
            .generate(&request())
            .await
            .expect_err("both endpoints down must fail");
        assert!(matches!(err, LlmError::AllEndpointsFailed { .. }));
    }

    #[tokio::test]
    async fn test_no_backup_surfaces_primary_error() {
        let mut primary = mockito::Server::new_async().await;
        let _p = primary
            .mock("POST", "/chat/completions")
            .with_status(500)
            .create_async()
            .await;

        let generator = FailoverGenerator::new(provider("primary", &primary.url()), None);
        let err = generator
            .generate(&request())
            .await
            .expect_err("no backup must surface primary error");
        assert!(matches!(err, LlmError::RequestFailed { .. }));
    }

    #[tokio::test]
    async fn test_next_request_starts_at_primary_again() {
        let mut primary = mockito::Server::new_async().await;
        let mut backup = mockito::Server::new_async().await;
        // 两次请求都必须先打主端点：共享的"用备用"标志会让第二次跳过主端点
        let p_fail = primary
            .mock("POST", "/chat/completions")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;
        let backup_mock = backup
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .expect(2)
            .create_async()
            .await;

        let generator = FailoverGenerator::new(
            provider("primary", &primary.url()),
            Some(provider("backup", &backup.url())),
        );

        generator.generate(&request()).await.expect("first call should succeed via backup");
        generator.generate(&request()).await.expect("second call should succeed via backup");

        p_fail.assert_async().await;
        backup_mock.assert_async().await;
    }
}
