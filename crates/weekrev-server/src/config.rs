use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// 数据库连接 URL；缺省为数据目录下的 SQLite 文件
    #[serde(default)]
    pub db_url: Option<String>,
    /// 报告语言（zh-CN | en），影响 prompt 模板与导出文档
    #[serde(default = "default_locale")]
    pub locale: String,

    /// CORS 允许的 origins 列表，为空时允许所有来源（开发模式）
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            db_url: None,
            locale: default_locale(),
            cors_allowed_origins: Vec::new(),
            llm: LlmConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// 聊天补全端点（主用 / 备用各一份）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmEndpoint {
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub primary: Option<LlmEndpoint>,
    #[serde(default)]
    pub backup: Option<LlmEndpoint>,
    /// 单次 LLM 调用超时（秒）
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            primary: None,
            backup: None,
            timeout_secs: default_llm_timeout_secs(),
            max_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_chromium_bin")]
    pub chromium_bin: String,
    #[serde(default = "default_wkhtmltopdf_bin")]
    pub wkhtmltopdf_bin: String,
    /// 单个转换子进程超时（秒）
    #[serde(default = "default_export_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chromium_bin: default_chromium_bin(),
            wkhtmltopdf_bin: default_wkhtmltopdf_bin(),
            timeout_secs: default_export_timeout_secs(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_locale() -> String {
    "zh-CN".to_string()
}

fn default_llm_model() -> String {
    "glm-4".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_chromium_bin() -> String {
    "chromium".to_string()
}

fn default_wkhtmltopdf_bin() -> String {
    "wkhtmltopdf".to_string()
}

fn default_export_timeout_secs() -> u64 {
    30
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 连接参数与密钥允许用环境变量覆盖配置文件。
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WEEKREV_DB_URL") {
            self.db_url = Some(v);
        }
        if let Ok(v) = std::env::var("WEEKREV_HTTP_PORT") {
            if let Ok(port) = v.parse() {
                self.http_port = port;
            }
        }
        if let Ok(v) = std::env::var("WEEKREV_LLM_API_KEY") {
            if let Some(primary) = &mut self.llm.primary {
                primary.api_key = v;
            }
        }
        if let Ok(v) = std::env::var("WEEKREV_LLM_BACKUP_API_KEY") {
            if let Some(backup) = &mut self.llm.backup {
                backup.api_key = v;
            }
        }
    }

    /// 实际使用的数据库连接 URL。
    pub fn resolved_db_url(&self) -> String {
        self.db_url.clone().unwrap_or_else(|| {
            format!("sqlite://{}/weekrev.db?mode=rwc", self.data_dir.trim_end_matches('/'))
        })
    }
}
