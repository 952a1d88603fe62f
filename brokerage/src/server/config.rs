use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub listen_port: u16,
    #[serde(default = "default_health_port")]
    pub health_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: default_port(),
            health_port: default_health_port(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_health_port() -> u16 {
    8080
}
