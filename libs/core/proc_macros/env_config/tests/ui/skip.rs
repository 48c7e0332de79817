use confbuilder::EnvConfig;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(EnvConfig)]
pub struct Service {
    #[tag(env = "NAME")]
    pub name: String,
    #[tag(env = "RETRIES")]
    pub retries: Option<u32>,
    pub fallback: Option<String>,
    #[tag(skip)]
    pub labels: HashMap<String, String>,
    #[tag(skip)]
    pub listen: Option<SocketAddr>,
    #[tag(skip)]
    pub data_dir: PathBuf,
}

fn main() {
    let keys = confbuilder::env_keys::<Service>("SVC_", "env");
    let keys: Vec<_> = keys.iter().map(|k| k.key.as_str()).collect();
    assert_eq!(keys, ["SVC_NAME", "SVC_RETRIES"]);
}
