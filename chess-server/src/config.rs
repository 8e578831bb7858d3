//! 服务端配置
//!
//! JSON 文件存放监听地址、端口、缓冲区大小和停机口令摘要。
//! 文件缺失时写回默认配置，便于运维直接编辑。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use protocol::DEFAULT_BUFFER_SIZE;

/// 默认配置文件名（与可执行文件同目录）
pub const DEFAULT_CONFIG_PATH: &str = "server_config.json";

/// 默认停机口令 `admin` 的 SHA-256 摘要
const DEFAULT_SERVER_HASH: &str = "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918";

/// 服务端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub ip_addr: String,
    /// 监听端口
    pub port: u16,
    /// 单次请求读缓冲区上限（字节）
    pub buffer_size: usize,
    /// 停机口令的 SHA-256 十六进制摘要
    pub server_hash: String,
}

impl ServerConfig {
    /// 完整的监听地址
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.ip_addr, self.port)
    }

    /// 从文件加载配置
    ///
    /// 文件不存在时返回默认配置并写回，解析失败视为错误。
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            config
                .save(path)
                .with_context(|| format!("无法写入默认配置: {:?}", path))?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {:?}", path))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, content).with_context(|| format!("写入配置文件失败: {:?}", path))?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip_addr: "127.0.0.1".to_string(),
            port: 8888,
            buffer_size: DEFAULT_BUFFER_SIZE,
            server_hash: DEFAULT_SERVER_HASH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr(), "127.0.0.1:8888");
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        // 默认口令 admin 的摘要
        assert_eq!(
            config.server_hash,
            crate::matches::sha256_hex("admin")
        );
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server_config.json");

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config, ServerConfig::default());

        // 默认配置已写回，可供编辑
        assert!(path.exists());
        let reloaded = ServerConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server_config.json");

        let config = ServerConfig {
            ip_addr: "0.0.0.0".to_string(),
            port: 2000,
            buffer_size: 4096,
            server_hash: crate::matches::sha256_hex("hunter2"),
        };
        config.save(&path).unwrap();

        let loaded = ServerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server_config.json");
        fs::write(&path, "not json at all").unwrap();

        assert!(ServerConfig::load(&path).is_err());
    }
}
