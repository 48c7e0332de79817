use confbuilder::EnvConfig;

#[derive(EnvConfig)]
pub struct ServerConfig {
    #[tag(env = "HOST")]
    pub host: String,
    #[tag(env = "PORT")]
    pub port: u16,
    #[tag(env = "TIMEOUT")]
    pub timeout: std::time::Duration,
    #[tag(env = "ORIGINS")]
    pub origins: Vec<String>,
    pub untagged: bool,
    #[allow(dead_code)]
    secret: String,
}

fn main() {
    assert_eq!(<ServerConfig as confbuilder::EnvConfig>::env_fields().len(), 5);
}
