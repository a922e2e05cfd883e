use crate::door::Mode;
use crate::table::Pacing;
use anyhow::Context;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// 运行配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 服务监听地址
    pub bind: SocketAddr,

    /// 选门后主持人揭示前的延迟（毫秒）
    pub reveal_delay_ms: u64,

    /// 打开“重来”门后开始新一轮前的延迟（毫秒）
    pub retry_delay_ms: u64,

    /// 新游戏默认是否启用“重来”门
    pub retry_enabled: bool,

    /// 断线会话保留时长（毫秒），过期后无法继续
    pub session_ttl_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new([0, 0, 0, 0].into(), 7654),
            reveal_delay_ms: 800,
            retry_delay_ms: 2000,
            retry_enabled: true,
            session_ttl_ms: 30 * 60 * 1000,
        }
    }
}

impl Config {
    /// 默认配置叠加 `MONTYHALL_*` 环境变量
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_with(&lookup, "MONTYHALL_BIND", &mut config.bind)?;
        override_with(&lookup, "MONTYHALL_REVEAL_DELAY_MS", &mut config.reveal_delay_ms)?;
        override_with(&lookup, "MONTYHALL_RETRY_DELAY_MS", &mut config.retry_delay_ms)?;
        override_with(&lookup, "MONTYHALL_RETRY_MODE", &mut config.retry_enabled)?;
        override_with(&lookup, "MONTYHALL_SESSION_TTL_MS", &mut config.session_ttl_ms)?;
        Ok(config)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            reveal_delay: Duration::from_millis(self.reveal_delay_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::new(self.retry_enabled)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_millis(self.session_ttl_ms)
    }
}

fn override_with<F, T>(lookup: &F, key: &str, target: &mut T) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}"))?;
    }
    Ok(())
}
