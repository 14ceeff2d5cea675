//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::Period;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 外部数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 行情接口（Yahoo chart API），后接 /{symbol}
    #[serde(default = "default_market_data_url")]
    pub market_data_url: String,
    /// 新闻 RSS 搜索接口
    #[serde(default = "default_news_feed_url")]
    pub news_feed_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 分析参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// 默认行情回看区间
    #[serde(default)]
    pub default_period: Period,
    /// 每次参与分析的新闻条数上限
    #[serde(default = "default_news_limit")]
    pub news_limit: usize,
    /// 新闻相关度阈值，低于此值的新闻不参与情感汇总
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
    /// 外部数据缓存时长（秒），0 表示不缓存
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_market_data_url() -> String { "https://query1.finance.yahoo.com/v8/finance/chart".to_string() }
fn default_news_feed_url() -> String { "https://news.google.com/rss/search".to_string() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_news_limit() -> usize { 10 }
fn default_relevance_threshold() -> f64 { 0.4 }
fn default_cache_ttl() -> u64 { 300 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            market_data_url: default_market_data_url(),
            news_feed_url: default_news_feed_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_period: Period::default(),
            news_limit: default_news_limit(),
            relevance_threshold: default_relevance_threshold(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
            providers: ProviderConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

/// 加载过程中产生的一条日志
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNote {
    pub level: log::Level,
    pub message: String,
}

impl ConfigNote {
    fn info(message: String) -> Self {
        Self { level: log::Level::Info, message }
    }

    fn warn(message: String) -> Self {
        Self { level: log::Level::Warn, message }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 环境变量 API_KEY 会覆盖文件中的 api_key。
    /// 加载时日志系统尚未初始化，过程信息随结果返回，由调用方输出。
    pub fn load() -> (Self, Vec<ConfigNote>) {
        Self::load_from(&["config.json", "config/config.json"], std::env::var("API_KEY").ok())
    }

    /// 按顺序尝试给定路径，第一个解析成功的生效
    pub fn load_from<P: AsRef<Path>>(paths: &[P], api_key_override: Option<String>) -> (Self, Vec<ConfigNote>) {
        let mut notes = Vec::new();

        let mut config = None;
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(c) => {
                    notes.push(ConfigNote::info(format!("从 {} 加载配置成功", path.display())));
                    config = Some(c);
                    break;
                }
                Err(e) => {
                    notes.push(ConfigNote::warn(format!("加载配置文件 {} 失败: {}", path.display(), e)));
                }
            }
        }

        let mut config = config.unwrap_or_else(|| {
            notes.push(ConfigNote::info("使用默认配置".to_string()));
            Self::default()
        });

        if let Some(key) = api_key_override {
            config.api.api_key = key;
        }
        if config.api.api_key.trim().is_empty() {
            notes.push(ConfigNote::warn("未设置 API Key，接口认证已关闭".to_string()));
        }

        (config, notes)
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "server": { "port": 9090 }, "analysis": { "news_limit": 3 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.analysis.news_limit, 3);
        assert_eq!(config.analysis.relevance_threshold, 0.4);
        assert_eq!(config.analysis.default_period, Period::ThreeMonths);
        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
    }

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("stock-mood-{}-{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_malformed_file_reported_and_next_path_used() {
        let broken = temp_file("broken.json", "{ \"server\": ");
        let good = temp_file("good.json", r#"{ "api": { "api_key": "k" }, "server": { "port": 7000 } }"#);

        let (config, notes) = AppConfig::load_from(&[&broken, &good], None);
        for note in &notes {
            println!("  [{}] {}", note.level, note.message);
        }
        assert_eq!(config.server.port, 7000);
        assert_eq!(notes[0].level, log::Level::Warn);
        assert!(notes[0].message.contains("失败"));
        assert!(notes.iter().all(|n| !n.message.contains("API Key")));

        let _ = fs::remove_file(broken);
        let _ = fs::remove_file(good);
    }

    #[test]
    fn test_missing_key_warns_and_env_overrides() {
        let broken = temp_file("only-broken.json", "not json");
        let (config, notes) = AppConfig::load_from(&[&broken], None);
        assert_eq!(config.server.port, 8080);
        assert!(notes.iter().any(|n| n.level == log::Level::Warn && n.message.contains("失败")));
        assert!(notes.iter().any(|n| n.level == log::Level::Warn && n.message.contains("API Key")));

        let (config, notes) = AppConfig::load_from(&[&broken], Some("from-env".to_string()));
        assert_eq!(config.api.api_key, "from-env");
        assert!(notes.iter().all(|n| !n.message.contains("API Key")));
        let _ = fs::remove_file(broken);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(config.api.api_key.is_empty());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.analysis.cache_ttl_secs, 300);
    }
}
