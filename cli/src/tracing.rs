use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TracingConfig {
    #[serde(default)]
    pub jaeger_enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            jaeger_enabled: false,
            host: default_host(),
            port: default_port(),
            service_name: default_service_name(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6831
}

fn default_service_name() -> String {
    "papertrade-dev".to_string()
}

pub fn init_tracer(config: TracingConfig) -> anyhow::Result<()> {
    let telemetry = if config.jaeger_enabled {
        let tracing_endpoint = format!("{}:{}", config.host, config.port);
        println!("Sending traces to {tracing_endpoint}");
        opentelemetry::global::set_text_map_propagator(
            opentelemetry::sdk::propagation::TraceContextPropagator::new(),
        );
        let tracer = opentelemetry_jaeger::new_agent_pipeline()
            .with_endpoint(tracing_endpoint)
            .with_service_name(config.service_name)
            .install_batch(opentelemetry::runtime::Tokio)?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let fmt_layer = if config.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(telemetry)
        .try_init()?;

    Ok(())
}
