use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use muniview::cache::Cache;
use muniview::config::AppConfig;

#[derive(StructOpt)]
#[structopt(name = "muniview", about = "Watch SF Muni vehicles move around a map")]
enum Command {
    /// Run the live map: load layers, poll vehicle locations, and rewrite
    /// the SVG after every update. Type a route tag on stdin to filter,
    /// or a blank line to go back to all routes.
    Watch {
        #[structopt(flatten)]
        opts: Opts,
    },
    /// Load layers, fetch vehicle locations once, write the SVG, and exit
    Snapshot {
        #[structopt(flatten)]
        opts: Opts,
    },
    /// Print the routes the agency serves
    Routes {
        /// Path to a JSON config file overriding the defaults
        #[structopt(long)]
        config: Option<String>,
    },
    /// Empty the layer cache
    ClearCache {
        /// Path to a JSON config file overriding the defaults
        #[structopt(long)]
        config: Option<String>,
    },
}

#[derive(StructOpt)]
struct Opts {
    /// Path to a JSON config file overriding the defaults
    #[structopt(long)]
    config: Option<String>,
    /// Where layer GeoJSON lives: a directory or an http(s) base URL
    #[structopt(long)]
    source: Option<String>,
    /// Only show vehicles on this route tag
    #[structopt(long)]
    route: Option<String>,
    /// The SVG file to (re)write
    #[structopt(long, default_value = "muniview.svg")]
    out: PathBuf,
}

impl Opts {
    fn resolve(self) -> Result<(AppConfig, Option<String>, PathBuf)> {
        let mut cfg = AppConfig::load(self.config)?;
        if let Some(source) = self.source {
            cfg.layer_source = source;
        }
        Ok((cfg, self.route, self.out))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    muniview::logger::setup();

    match Command::from_args() {
        Command::Watch { opts } => {
            let (cfg, route, out) = opts.resolve()?;
            muniview::app::run(cfg, route, out).await
        }
        Command::Snapshot { opts } => {
            let (cfg, route, out) = opts.resolve()?;
            muniview::app::snapshot(cfg, route, out).await
        }
        Command::Routes { config } => muniview::app::print_routes(AppConfig::load(config)?).await,
        Command::ClearCache { config } => {
            let cfg = AppConfig::load(config)?;
            Cache::new(cfg.cache_dir.as_str()).clear()?;
            println!("Cleared {}", cfg.cache_dir);
            Ok(())
        }
    }
}
