use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

use crate::generator::{ChunkStream, GenerationRequest, LlmError, ReportGenerator};
use crate::models::{ChatMessage, ChatRequest, ChatResponse, ChatStreamChunk};

/// 单个聊天补全端点的配置。
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// 端点标识（primary / backup）
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

impl EndpointConfig {
    pub fn new(name: &str, base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout_secs: 120,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// OpenAI 兼容的聊天补全 Provider。
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    cfg: EndpointConfig,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(cfg: EndpointConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| LlmError::RequestFailed {
                endpoint: cfg.name.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { cfg, client })
    }

    fn chat_request(&self, request: &GenerationRequest, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.cfg.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
            top_p: None,
            stream: stream.then_some(true),
        }
    }

    async fn post_chat(
        &self,
        request: &GenerationRequest,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let req = self.chat_request(request, stream);

        tracing::debug!(
            endpoint = %self.cfg.name,
            model = %self.cfg.model,
            prompt_length = request.prompt.len(),
            stream,
            "Calling chat completion API"
        );

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.cfg.base_url))
            .header("Authorization", format!("Bearer {}", self.cfg.api_key))
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                endpoint: self.cfg.name.clone(),
                message: format!("request failed: {e}"),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(
                endpoint = %self.cfg.name,
                status = %status,
                body = %body,
                "Chat completion API request failed"
            );
            return Err(LlmError::RequestFailed {
                endpoint: self.cfg.name.clone(),
                message: format!("HTTP {status}: {body}"),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl ReportGenerator for OpenAiCompatProvider {
    fn provider(&self) -> &str {
        &self.cfg.name
    }

    fn model_name(&self) -> &str {
        &self.cfg.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let resp = self.post_chat(request, false).await?;

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| LlmError::RequestFailed {
            endpoint: self.cfg.name.clone(),
            message: format!("failed to parse response: {e}"),
        })?;

        tracing::debug!(
            endpoint = %self.cfg.name,
            usage = ?chat_resp.usage,
            "Chat completion response received"
        );

        chat_resp
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::EmptyResponse {
                endpoint: self.cfg.name.clone(),
            })
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<ChunkStream, LlmError> {
        let resp = self.post_chat(request, true).await?;
        let endpoint = self.cfg.name.clone();

        let stream = try_stream! {
            let mut bytes = resp.bytes_stream();
            let mut buffer = String::new();
            let mut done = false;

            while !done {
                let Some(chunk) = bytes.next().await else {
                    break;
                };
                let chunk = chunk.map_err(|e| LlmError::RequestFailed {
                    endpoint: endpoint.clone(),
                    message: format!("stream read failed: {e}"),
                })?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // SSE 帧以换行分隔；保留最后一段未完成的行
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    let Some(payload) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let payload = payload.trim();
                    if payload.is_empty() {
                        continue;
                    }
                    if payload == "[DONE]" {
                        done = true;
                        break;
                    }

                    match serde_json::from_str::<ChatStreamChunk>(payload) {
                        Ok(frame) => {
                            if let Some(content) = frame
                                .choices
                                .first()
                                .and_then(|c| c.delta.content.clone())
                            {
                                if !content.is_empty() {
                                    yield content;
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                endpoint = %endpoint,
                                error = %e,
                                "Skipping unparseable stream frame"
                            );
                        }
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}
