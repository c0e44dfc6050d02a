use config::{Config, ConfigError, Environment, File};
use kanshi_core::config::AppConfig;

/// 默认配置文件名 (不带扩展名，按 `kanshi.toml` 等格式查找)
const CONFIG_FILE: &str = "kanshi";

/// 环境变量前缀，层级分隔符为 `__`，例如 `KANSHI__REFRESH__TTL_SECS=60`
const ENV_PREFIX: &str = "KANSHI";

/// # Summary
/// 按层级合并配置：内置默认值 ← 可选配置文件 ← 环境变量。
///
/// # Arguments
/// * `file`: 配置文件路径 (不存在时忽略)。
/// * `env`: 环境变量来源。
pub fn build(file: &str, env: Environment) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(File::with_name(file).required(false))
        .add_source(env)
        .build()?
        .try_deserialize()
}

/// 从进程环境加载配置，`KANSHI_CONFIG` 可覆盖配置文件路径。
pub fn load() -> Result<AppConfig, ConfigError> {
    let file = std::env::var("KANSHI_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
    build(&file, env_source())
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
