mod command;

use std::{process, sync::Arc};

use command::Command;
use log::{error, info};
use region_store::{
    gen::producer_from_config, sched::generate_region, Config, Region, RegionCache, RegionPos,
};

const DEFAULT_CONFIG: &str = "region.toml";
const USAGE: &str = "usage: region-store [--config <path>] <generate|info> <region x> <region z>";

fn run(config: Config, command: &Command) -> Result<(), String> {
    let pos = RegionPos::new(command.arg(0)?, command.arg(1)?);

    match command.name() {
        "generate" => {
            let producer = producer_from_config(&config.generator);
            let cache = Arc::new(RegionCache::new(config.store));
            let (stored, written) =
                generate_region(cache, Arc::from(producer), pos, config.generator.threads)
                    .map_err(|e| e.to_string())?;
            info!("Generated {} chunks, wrote {} region files", stored, written);
            Ok(())
        }
        "info" => {
            let region = Region::load(pos, &config.store).map_err(|e| e.to_string())?;
            println!("region:    {}.{}", pos.x, pos.z);
            println!("source:    {:?}", region.source());
            println!(
                "chunks:    {} of {}",
                region.allocated_chunks(),
                region.layout().region_size * region.layout().region_size
            );
            println!("bytes:     {}", region.as_bytes().len());
            Ok(())
        }
        other => Err(format!("Unknown command {}", other)),
    }
}

fn main() {
    pretty_env_logger::init();

    let mut args = std::env::args().skip(1).collect::<Vec<String>>();
    let mut config_path = DEFAULT_CONFIG.to_string();
    if args.first().map(String::as_str) == Some("--config") && args.len() > 1 {
        config_path = args.remove(1);
        args.remove(0);
    }

    let command = match Command::parse(&args) {
        Some(command) => command,
        None => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(config, &command) {
        error!("{}", e);
        eprintln!("{}", USAGE);
        process::exit(1);
    }
}
