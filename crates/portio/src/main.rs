pub mod config;

use config::PortFileConfig;
use config_rs::{Config, File};
use portio_core::PortMap;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portio=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() != 2 {
        warn!("only one parameter, the config file, is expected.");
        warn!("got {}", args.join(","));
    } else if let Some(cfg_name) = args.get(1).map(|o| o.as_str()) {
        let config_res = Config::builder()
            .add_source(File::with_name(cfg_name))
            .build()
            .and_then(|config| config.try_deserialize::<PortFileConfig>());

        match config_res {
            Ok(config) => {
                info!("portio starting up!");
                if let Some(ref name) = config.metadata.name {
                    info!("name: {name}")
                }
                if let Some(ref descrip) = config.metadata.description {
                    info!("description: {descrip}")
                }
                match config.build() {
                    Ok(mut ports) => report(&mut ports),
                    Err(err) => error!("portio exited with an error: {:?}", err),
                }
            }
            Err(err) => {
                error!("Failed to parse config: {:?}", err);
            }
        }
    }
}

///Log the current value of every configured port.
fn report(ports: &mut PortMap) {
    let labels: Vec<String> = ports.labels().map(str::to_owned).collect();
    for label in labels {
        match ports.get_float(&label) {
            Ok(value) => info!("{}: {}", label, value),
            Err(_) => match ports.get_bool(&label) {
                Ok(value) => info!("{}: {}", label, value),
                Err(err) => error!("{}: {:?}", label, err),
            },
        }
    }
}
