//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SEGUROS__*` 覆盖（双下划线表示嵌套，如 `SEGUROS__LIVE__API_KEY=...`）。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Webhook 默认地址（n8n 报价流程）
pub const DEFAULT_WEBHOOK_URL: &str =
    "https://n8n.afdelgadoisc.com/webhook/9f0f3f03-5bf9-4596-a222-77ae6281fb7e";

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub live: LiveSection,
    pub tools: ToolsSection,
    pub page: PageSection,
}

/// [live] 段：远端实时模型会话参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveSection {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    /// 模型音频采样率（Hz）
    pub sample_rate: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub voice_name: String,
    pub language_code: String,
    pub response_modality: String,
    pub deepgram_api_key: Option<String>,
    pub safety: SafetySection,
}

impl Default for LiveSection {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent".to_string(),
            model: "models/gemini-2.0-flash-exp".to_string(),
            sample_rate: 27000,
            temperature: 1.8,
            top_p: 0.95,
            top_k: 65,
            voice_name: "Aoede".to_string(),
            language_code: "es-US".to_string(),
            response_modality: "audio".to_string(),
            deepgram_api_key: None,
            safety: SafetySection::default(),
        }
    }
}

impl LiveSection {
    /// WebSocket 地址；未配置 api_key 时为 None
    pub fn websocket_url(&self) -> Option<String> {
        let key = self.api_key.as_deref().filter(|k| !k.is_empty())?;
        Some(format!("{}?key={}", self.endpoint, key))
    }

    /// 采样参数为 0 或非正数时回退到默认值
    pub fn effective_temperature(&self) -> f32 {
        positive_or(self.temperature, LiveSection::default().temperature)
    }

    pub fn effective_top_p(&self) -> f32 {
        positive_or(self.top_p, LiveSection::default().top_p)
    }

    pub fn effective_top_k(&self) -> u32 {
        if self.top_k == 0 {
            LiveSection::default().top_k
        } else {
            self.top_k
        }
    }

    pub fn effective_sample_rate(&self) -> u32 {
        if self.sample_rate == 0 {
            LiveSection::default().sample_rate
        } else {
            self.sample_rate
        }
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

/// [live.safety] 段：各类别的拦截等级（0..=3），未设置时为 UNSPECIFIED
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SafetySection {
    pub harassment: Option<u8>,
    pub dangerous_content: Option<u8>,
    pub sexually_explicit: Option<u8>,
    pub hate_speech: Option<u8>,
    pub civic_integrity: Option<u8>,
}

impl SafetySection {
    /// (类别, 阈值) 列表，顺序固定
    pub fn settings(&self) -> Vec<(HarmCategory, SafetyThreshold)> {
        vec![
            (HarmCategory::Harassment, SafetyThreshold::from_level(self.harassment)),
            (HarmCategory::DangerousContent, SafetyThreshold::from_level(self.dangerous_content)),
            (HarmCategory::SexuallyExplicit, SafetyThreshold::from_level(self.sexually_explicit)),
            (HarmCategory::HateSpeech, SafetyThreshold::from_level(self.hate_speech)),
            (HarmCategory::CivicIntegrity, SafetyThreshold::from_level(self.civic_integrity)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_CIVIC_INTEGRITY")]
    CivicIntegrity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
    HarmBlockThresholdUnspecified,
}

impl SafetyThreshold {
    pub fn from_level(level: Option<u8>) -> Self {
        match level {
            Some(0) => SafetyThreshold::BlockNone,
            Some(1) => SafetyThreshold::BlockOnlyHigh,
            Some(2) => SafetyThreshold::BlockMediumAndAbove,
            Some(3) => SafetyThreshold::BlockLowAndAbove,
            _ => SafetyThreshold::HarmBlockThresholdUnspecified,
        }
    }
}

/// [tools] 段：报价 Webhook
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub webhook_url: String,
    /// 单次提交的客户端超时（秒）；不设置则不超时
    pub webhook_timeout_secs: Option<u64>,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            webhook_timeout_secs: None,
        }
    }
}
/// [page] 段：页面 HTML 文件路径，供命令行使用
/// [page] 段：页面快照（JSON）路径，供命令行使用
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageSection {
    pub snapshot: Option<PathBuf>,
}

/// 从 config 目录加载配置，环境变量 SEGUROS__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SEGUROS__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SEGUROS")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
