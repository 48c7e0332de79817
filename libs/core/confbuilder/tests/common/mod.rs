//! Shared fixtures for the builder integration tests.
#![allow(dead_code)]

use confbuilder::{EnvConfig, Level};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::{Validate, ValidationError};

fn validate_environment(environment: &str) -> Result<(), ValidationError> {
    match environment {
        "development" | "staging" | "production" => Ok(()),
        _ => Err(ValidationError::new("oneof")),
    }
}

fn validate_non_empty_items(items: &[String]) -> Result<(), ValidationError> {
    if items.iter().any(String::is_empty) {
        return Err(ValidationError::new("empty_item"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, EnvConfig)]
pub struct DatabaseConfig {
    #[tag(env = "HOST")]
    #[validate(length(min = 1))]
    pub host: String,

    #[tag(env = "PORT")]
    #[validate(range(min = 1, max = 65535))]
    pub port: i32,

    #[tag(env = "USERNAME")]
    #[validate(length(min = 3))]
    pub username: String,

    #[tag(env = "PASSWORD")]
    #[validate(length(min = 8))]
    pub password: String,

    #[tag(env = "SSL")]
    pub ssl: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, EnvConfig)]
pub struct ServerConfig {
    #[tag(env = "NAME")]
    #[validate(length(min = 3, max = 20))]
    pub name: String,

    #[tag(env = "TIMEOUT")]
    pub timeout: Duration,

    #[tag(env = "WORKERS")]
    #[validate(range(min = 1, max = 100))]
    pub workers: u32,
}

/// Covers every supported leaf kind, nesting, untagged and private fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, EnvConfig)]
pub struct TestConfig {
    #[tag(env = "APP_NAME")]
    #[validate(length(min = 3, max = 50))]
    pub app_name: String,

    #[tag(env = "ENVIRONMENT")]
    #[validate(custom(function = "validate_environment"))]
    pub environment: String,

    #[tag(env = "PORT")]
    #[validate(range(min = 1, max = 65535))]
    pub port: i32,

    #[tag(env = "MAX_CONNS")]
    #[validate(range(min = 1, max = 10000))]
    pub max_conns: u32,

    #[tag(env = "LOAD_FACTOR")]
    #[validate(range(min = 0.1, max = 10.0))]
    pub load_factor: f64,

    #[tag(env = "PRECISION")]
    #[validate(range(min = 0.01, max = 1.0))]
    pub precision: f32,

    #[tag(env = "ENABLED")]
    pub enabled: bool,

    #[tag(env = "DEBUG_MODE")]
    pub debug_mode: bool,

    #[tag(env = "LOG_LEVEL")]
    pub log_level: Level,

    #[tag(env = "TIMEOUT")]
    pub timeout: Duration,

    #[tag(env = "GRACE_PERIOD")]
    pub grace_period: Duration,

    #[tag(env = "TAGS")]
    #[validate(length(min = 1), custom(function = "validate_non_empty_items"))]
    pub tags: Vec<String>,

    #[tag(env = "ALLOWED_IPS")]
    pub allowed_ips: Vec<String>,

    #[tag(env = "DB")]
    #[validate(nested)]
    pub database: DatabaseConfig,

    #[tag(env = "SERVER")]
    #[validate(nested)]
    pub server: ServerConfig,

    pub internal_id: String,

    #[tag(env = "UNEXPORTED")]
    unexported: String,
}

impl TestConfig {
    pub fn unexported(&self) -> &str {
        &self.unexported
    }
}

pub fn test_config() -> TestConfig {
    TestConfig {
        app_name: "test-app".to_string(),
        environment: "development".to_string(),
        port: 8080,
        max_conns: 100,
        load_factor: 1.0,
        precision: 0.5,
        enabled: true,
        debug_mode: false,
        log_level: Level::INFO,
        timeout: Duration::from_secs(30),
        grace_period: Duration::from_secs(5),
        tags: vec!["default".to_string()],
        allowed_ips: vec!["127.0.0.1".to_string()],
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            username: "testuser".to_string(),
            password: "testpass123".to_string(),
            ssl: false,
        },
        server: ServerConfig {
            name: "server01".to_string(),
            timeout: Duration::from_secs(10),
            workers: 5,
        },
        internal_id: "internal-123".to_string(),
        unexported: "unexported-value".to_string(),
    }
}

pub fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
    vars.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
