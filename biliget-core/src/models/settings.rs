use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub encoder: EncoderSettings,
    #[serde(default)]
    pub proxy: ProxySettings,
}

/// Session credential and browser-identity headers sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub cookie: String,
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_api_base")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_intermediate_ext")]
    pub intermediate_ext: String,
    #[serde(default = "default_output_ext")]
    pub output_ext: String,
    #[serde(default)]
    pub mode: PipelineMode,
    #[serde(default)]
    pub policy: Option<ConcurrencyPolicy>,
    #[serde(default)]
    pub audio_selection: AudioSelection,
    #[serde(default)]
    pub disambiguate_names: bool,
    #[serde(default)]
    pub cleanup_partial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    #[serde(default = "default_encoder_program")]
    pub program: String,
    #[serde(default = "default_quality_args")]
    pub quality_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxySettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_proxy_type")]
    pub proxy_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_proxy_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Download to disk first, then hand the file path to the encoder.
    #[default]
    Buffered,
    /// Feed the network stream straight into the encoder's stdin.
    Piped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    Sequential,
    Concurrent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioSelection {
    #[default]
    First,
    HighestBandwidth,
}

impl PipelineMode {
    pub fn default_policy(self) -> ConcurrencyPolicy {
        match self {
            PipelineMode::Buffered => ConcurrencyPolicy::Sequential,
            PipelineMode::Piped => ConcurrencyPolicy::Concurrent,
        }
    }
}

impl DownloadSettings {
    pub fn effective_policy(&self) -> ConcurrencyPolicy {
        self.policy.unwrap_or_else(|| self.mode.default_policy())
    }
}

impl FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buffered" | "file" => Ok(Self::Buffered),
            "piped" | "pipe" => Ok(Self::Piped),
            other => Err(format!("unknown pipeline mode '{}'", other)),
        }
    }
}

impl FromStr for ConcurrencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(format!("unknown concurrency policy '{}'", other)),
        }
    }
}

impl FromStr for AudioSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "first" => Ok(Self::First),
            "highest-bandwidth" => Ok(Self::HighestBandwidth),
            other => Err(format!("unknown audio selection '{}'", other)),
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Buffered => write!(f, "buffered"),
            PipelineMode::Piped => write!(f, "piped"),
        }
    }
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyPolicy::Sequential => write!(f, "sequential"),
            ConcurrencyPolicy::Concurrent => write!(f, "concurrent"),
        }
    }
}

fn default_headers() -> BTreeMap<String, String> {
    [
        ("accept", "application/json, text/plain, */*"),
        ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6"),
        ("cache-control", "no-cache"),
        ("dnt", "1"),
        ("origin", "https://www.bilibili.com"),
        ("pragma", "no-cache"),
        ("referer", "https://www.bilibili.com/"),
        (
            "sec-ch-ua",
            "\"Chromium\";v=\"128\", \"Not;A=Brand\";v=\"24\", \"Microsoft Edge\";v=\"128\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"Windows\""),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-site"),
        (
            "user-agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36 Edg/128.0.0.0",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_api_base() -> String {
    "https://api.bilibili.com".into()
}

fn default_output_root() -> PathBuf {
    PathBuf::from("./download")
}

fn default_intermediate_ext() -> String {
    "m4s".into()
}

fn default_output_ext() -> String {
    "mp3".into()
}

fn default_encoder_program() -> String {
    "ffmpeg".into()
}

fn default_quality_args() -> Vec<String> {
    vec!["-q:a".into(), "0".into()]
}

fn default_proxy_type() -> String {
    "http".into()
}

fn default_proxy_port() -> u16 {
    8080
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            cookie: String::new(),
            headers: default_headers(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            intermediate_ext: default_intermediate_ext(),
            output_ext: default_output_ext(),
            mode: PipelineMode::default(),
            policy: None,
            audio_selection: AudioSelection::default(),
            disambiguate_names: false,
            cleanup_partial: false,
        }
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            program: default_encoder_program(),
            quality_args: default_quality_args(),
        }
    }
}
