use clap::Parser;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::str::FromStr;

use handle_errors::Error;

/// 질문과 계정을 어디에 저장할지.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Postgres,
    Rest,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "postgres" => Ok(Backend::Postgres),
            "rest" => Ok(Backend::Rest),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// 명령줄 인자. 주어진 값만 설정 파일과 환경 변수를 덮어쓴다.
#[derive(Parser, Debug, Default, Clone)]
#[clap(author, version, about)]
pub struct Args {
    /// 로그 수준: error, warn, info, debug, trace
    #[clap(long)]
    pub log_level: Option<String>,
    #[clap(long)]
    pub port: Option<u16>,
    /// memory, postgres, rest
    #[clap(long)]
    pub backend: Option<Backend>,
    #[clap(long)]
    pub db_host: Option<String>,
    #[clap(long)]
    pub db_port: Option<u16>,
    #[clap(long)]
    pub db_name: Option<String>,
    #[clap(long)]
    pub rest_url: Option<String>,
    /// 메모리 저장소에 예시 질문을 채운다.
    #[clap(long)]
    pub seed_fixtures: Option<bool>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub port: u16,
    pub backend: Backend,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub rest_url: Option<String>,
    pub rest_api_key: Option<String>,
    pub rest_max_retries: u32,
    pub paseto_key: String,
    pub seed_fixtures: bool,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("port", 3030_i64)?
        .set_default("backend", "memory")?
        .set_default("db_host", "localhost")?
        .set_default("db_port", 5432_i64)?
        .set_default("db_name", "travanah")?
        .set_default("db_user", "postgres")?
        .set_default("db_password", "")?
        .set_default("rest_max_retries", 3_i64)?
        .set_default("seed_fixtures", true)
}

impl Config {
    /// `.env` → `setup.toml` → `TRAVANAH_*` 환경 변수 → 명령줄 인자 순으로 덮어쓴다.
    pub fn new() -> Result<Config, Error> {
        Config::load(Args::parse())
    }

    pub fn load(args: Args) -> Result<Config, Error> {
        dotenv::dotenv().ok();

        let config = defaults()
            .and_then(|builder| {
                builder
                    .add_source(File::with_name("setup").required(false))
                    .add_source(Environment::with_prefix("TRAVANAH"))
                    .build()
            })
            .and_then(|config| config.try_deserialize::<Config>())
            .map_err(Error::ConfigError)?;

        Ok(config.with_args(args))
    }

    fn with_args(mut self, args: Args) -> Self {
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(backend) = args.backend {
            self.backend = backend;
        }
        if let Some(db_host) = args.db_host {
            self.db_host = db_host;
        }
        if let Some(db_port) = args.db_port {
            self.db_port = db_port;
        }
        if let Some(db_name) = args.db_name {
            self.db_name = db_name;
        }
        if let Some(rest_url) = args.rest_url {
            self.rest_url = Some(rest_url);
        }
        if let Some(seed_fixtures) = args.seed_fixtures {
            self.seed_fixtures = seed_fixtures;
        }
        self
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }

    /// `RUST_LOG` 가 없을 때 쓰는 필터.
    pub fn log_filter(&self) -> String {
        format!(
            "handle_errors={level},travanah={level},warp={level}",
            level = self.log_level
        )
    }
}
