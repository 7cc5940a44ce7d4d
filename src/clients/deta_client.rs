//! Deta 客户端
//!
//! 构造时校验项目密钥，之后只读地在所有 Base / Drive 间共享

use std::sync::Arc;
use tracing::debug;

use crate::config::{Config, ProjectKey};
use crate::error::{DetaError, Result};
use crate::infrastructure::{HttpTransport, Transport};
use crate::services::{Base, Drive, ServiceContext};

/// Deta 客户端
#[derive(Clone, Debug)]
pub struct Deta {
    ctx: Arc<ServiceContext>,
}

impl Deta {
    /// 创建新的客户端，使用基于 reqwest 的传输
    ///
    /// 项目密钥格式错误或配置取值无效时立即返回配置错误。
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let project_key = ProjectKey::parse(&config.project_key)?;
        let transport = HttpTransport::new(&config)
            .map_err(|e| DetaError::transport("构建 HTTP 客户端", e))?;
        Ok(Self::build(config, project_key, Arc::new(transport)))
    }

    /// 从环境变量创建客户端（`DETA_PROJECT_KEY` 等）
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// 使用自定义传输创建客户端
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let project_key = ProjectKey::parse(&config.project_key)?;
        Ok(Self::build(config, project_key, transport))
    }

    fn build(config: Config, project_key: ProjectKey, transport: Arc<dyn Transport>) -> Self {
        debug!(
            "创建 Deta 客户端: 项目 {}, 最大并发 {}",
            project_key.project_id(),
            config.max_concurrency
        );
        Self {
            ctx: Arc::new(ServiceContext::new(config, project_key, transport)),
        }
    }

    /// 项目 ID
    pub fn project_id(&self) -> &str {
        self.ctx.project_id()
    }

    /// 获取 Base 集合
    pub fn base(&self, name: impl Into<String>) -> Base {
        Base::new(name, Arc::clone(&self.ctx))
    }

    /// 获取 Drive
    pub fn drive(&self, name: impl Into<String>) -> Drive {
        Drive::new(name, Arc::clone(&self.ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_malformed_key_fails_at_construction() {
        let result = Deta::new(Config::with_project_key("missing-separator"));
        assert!(matches!(
            result,
            Err(DetaError::Config(ConfigError::MalformedProjectKey))
        ));
    }

    #[test]
    fn test_zero_part_size_fails_at_construction() {
        let config = Config {
            upload_part_size: 0,
            ..Config::with_project_key("proj123_secret")
        };

        assert!(matches!(
            Deta::new(config),
            Err(DetaError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_project_id_from_key() {
        let deta = Deta::new(Config::with_project_key("proj123_secret")).unwrap();
        assert_eq!(deta.project_id(), "proj123");
        assert_eq!(deta.base("users").name(), "users");
        assert_eq!(deta.drive("photos").name(), "photos");
    }
}
