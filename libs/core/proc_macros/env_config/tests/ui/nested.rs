use confbuilder::{EnvConfig, Level};

#[derive(EnvConfig)]
pub struct Logging {
    #[tag(env = "LEVEL")]
    pub level: Level,
}

#[derive(EnvConfig)]
pub struct Inner {
    #[tag(env = "NAME", k8s = "SERVICE_NAME")]
    pub name: String,
    #[tag(env = "LOG")]
    pub logging: Logging,
}

#[derive(EnvConfig)]
pub struct Outer {
    #[tag(env = "INNER")]
    pub inner: Inner,
    pub flattened: Logging,
}

fn main() {
    let keys = confbuilder::env_keys::<Outer>("APP_", "env");
    let keys: Vec<_> = keys.iter().map(|k| k.key.as_str()).collect();
    assert_eq!(keys, ["APP_INNER_NAME", "APP_INNER_LOG_LEVEL", "APP_LEVEL"]);
}
