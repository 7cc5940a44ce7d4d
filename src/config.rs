use crate::error::ConfigError;
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 项目密钥所在的环境变量
pub const PROJECT_KEY_ENV: &str = "DETA_PROJECT_KEY";

/// 客户端配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 项目密钥，格式 `<project_id>_<secret>`
    pub project_key: String,
    /// Base（键值存储）服务地址
    pub base_host: String,
    /// Drive（文件存储）服务地址
    pub drive_host: String,
    /// 同一客户端所有扇出共享的最大并发请求数，0 表示不限制
    pub max_concurrency: usize,
    /// 批量写入时每个请求携带的最大条目数
    pub put_chunk_size: usize,
    /// 分片上传阈值及单个分片大小（字节）
    pub upload_part_size: usize,
    /// 单个请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_key: String::new(),
            base_host: "https://database.deta.sh/v1".to_string(),
            drive_host: "https://drive.deta.sh/v1".to_string(),
            max_concurrency: 32,
            put_chunk_size: 25,
            upload_part_size: 10 * 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// 使用给定的项目密钥创建默认配置
    pub fn with_project_key(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            ..Self::default()
        }
    }

    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        let config = Self {
            project_key: std::env::var(PROJECT_KEY_ENV).unwrap_or(default.project_key),
            base_host: std::env::var("DETA_BASE_HOST").unwrap_or(default.base_host),
            drive_host: std::env::var("DETA_DRIVE_HOST").unwrap_or(default.drive_host),
            max_concurrency: env_parse("DETA_MAX_CONCURRENCY", "usize")?
                .unwrap_or(default.max_concurrency),
            put_chunk_size: env_parse("DETA_PUT_CHUNK_SIZE", "usize")?
                .unwrap_or(default.put_chunk_size),
            upload_part_size: env_parse("DETA_UPLOAD_PART_SIZE", "usize")?
                .unwrap_or(default.upload_part_size),
            request_timeout_secs: env_parse("DETA_REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.request_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验取值：服务地址必须是可拼接路径的 URL，分片大小必须大于 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_host("base_host", &self.base_host)?;
        check_host("drive_host", &self.drive_host)?;

        if self.upload_part_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload_part_size".to_string(),
                value: "0".to_string(),
                message: "分片大小必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 从 TOML 文件加载配置
    pub async fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;

        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 从 TOML 字符串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn check_host(field: &str, host: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        field: field.to_string(),
        value: host.to_string(),
        message,
    };

    let url = Url::parse(host).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("地址不能拼接路径".to_string()));
    }
    Ok(())
}

/// 项目凭据
///
/// 构造后不可变，所有并发任务共享同一份。
#[derive(Clone)]
pub struct ProjectKey {
    key: String,
    project_id: String,
}

impl ProjectKey {
    /// 解析 `<project_id>_<secret>` 形式的项目密钥
    ///
    /// 必须恰好包含一个 `_` 分隔符，且两侧都不为空。
    pub fn parse(key: &str) -> Result<Self, ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::MissingProjectKey {
                var_name: PROJECT_KEY_ENV.to_string(),
            });
        }

        let fragments: Vec<&str> = key.split('_').collect();
        match fragments.as_slice() {
            [project_id, secret] if !project_id.is_empty() && !secret.is_empty() => Ok(Self {
                key: key.to_string(),
                project_id: project_id.to_string(),
            }),
            _ => Err(ConfigError::MalformedProjectKey),
        }
    }

    /// 完整密钥，用于 `X-API-Key` 请求头
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 项目 ID
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl fmt::Debug for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectKey")
            .field("project_id", &self.project_id)
            .field("key", &"***")
            .finish()
    }
}
