use thiserror::Error;

/// 客户端错误类型
#[derive(Debug, Error)]
pub enum DetaError {
    /// 配置错误（构造客户端时立即返回）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 传输层错误，没有拿到任何响应
    #[error("传输错误 ({endpoint}): {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// 拿到了响应，但状态码表示失败
    #[error("远端返回错误响应 ({endpoint}): status={status}, message={message}")]
    Remote {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// JSON 编解码失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 分片上传中有分片失败，上传会话未完成
    #[error("分片上传失败 (文件: {name}, upload_id: {upload_id}): 失败分片 {failed_parts:?}")]
    PartUpload {
        name: String,
        upload_id: String,
        failed_parts: Vec<usize>,
    },

    /// 并发任务异常退出（panic 或被运行时取消）
    #[error("并发任务 #{index} 异常退出: {message}")]
    TaskJoin { index: usize, message: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 没有提供项目密钥
    #[error("未提供项目密钥，请设置环境变量 {var_name}")]
    MissingProjectKey { var_name: String },

    /// 项目密钥格式错误，期望 `<project_id>_<secret>`
    #[error("项目密钥格式错误，期望格式为 id_key")]
    MalformedProjectKey,

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置项取值不合法
    #[error("配置项 {field} 取值无效 '{value}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 传输层错误
#[derive(Debug, Error)]
pub enum TransportError {
    /// reqwest 返回的网络/协议错误
    #[error("HTTP请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 其他连接失败
    #[error("连接失败: {0}")]
    Connection(String),
}

// ========== 便捷构造函数 ==========

impl DetaError {
    /// 创建传输错误
    pub fn transport(endpoint: impl Into<String>, source: TransportError) -> Self {
        DetaError::Transport {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// 创建远端错误
    pub fn remote(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        DetaError::Remote {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// 是否为传输层错误（没有拿到响应）
    pub fn is_transport(&self) -> bool {
        matches!(self, DetaError::Transport { .. })
    }
}

// ========== Result 类型别名 ==========

/// 客户端结果类型
pub type Result<T> = std::result::Result<T, DetaError>;
