use std::path::PathBuf;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, watch};

use mapgeom::LayerGeometry;

use crate::cache::Cache;
use crate::config::AppConfig;
use crate::feed::{self, FeedClient, FeedVehicle, Vehicle};
use crate::layers::LayerSource;
use crate::poller;
use crate::render::MapRenderer;
use crate::routes::RouteRegistry;

/// Everything the main loop reacts to.
pub enum Event {
    /// A geographic layer's raw GeoJSON arrived.
    Layer {
        name: String,
        raw: Vec<u8>,
        from_cache: bool,
    },
    /// A poll of vehicle locations succeeded, fetched under `filter`.
    Vehicles {
        vehicles: Vec<FeedVehicle>,
        filter: Option<String>,
    },
    /// The route list (tag to title pairs) resolved.
    Routes { pairs: Vec<(String, String)> },
    /// The user picked a route to watch (None means all routes).
    Select { route: Option<String> },
}

/// All mutable state, owned by the single event-loop task. Fetch tasks only
/// hand results over the channel, so nothing here needs a lock.
pub struct App {
    pub cfg: AppConfig,
    pub cache: Cache,
    pub source: LayerSource,
    pub renderer: MapRenderer,
    pub registry: RouteRegistry,
    pub selection: Option<String>,
    /// The SVG file rewritten after every applied update. None skips writing.
    pub out: Option<PathBuf>,
    // Vehicles that arrived before the scale layer, kept with the filter they
    // were fetched under.
    held_vehicles: Option<(Vec<Vehicle>, Option<String>)>,
    tx: mpsc::UnboundedSender<Event>,
    select_tx: watch::Sender<Option<String>>,
}

impl App {
    pub fn new(
        cfg: AppConfig,
        route: Option<String>,
    ) -> (
        App,
        mpsc::UnboundedReceiver<Event>,
        watch::Receiver<Option<String>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (select_tx, select_rx) = watch::channel(route.clone());
        let app = App {
            cache: Cache::new(cfg.cache_dir.as_str()),
            source: LayerSource::new(&cfg.layer_source),
            renderer: MapRenderer::new(&cfg),
            registry: RouteRegistry::new(),
            selection: route,
            out: None,
            held_vehicles: None,
            tx,
            select_tx,
            cfg,
        };
        (app, rx, select_rx)
    }

    /// Starts resolution of every configured geographic layer: cache hits
    /// feed the loop directly, misses spawn fetches. The vehicle layer is the
    /// poller's job instead.
    pub fn start_layers(&mut self) {
        for name in self.cfg.layers.clone() {
            if name == self.cfg.vehicle_layer {
                continue;
            }
            if let Some(raw) = self.cache.get(&name) {
                info!("Loaded {} from the cache", name);
                let _ = self.tx.send(Event::Layer {
                    name,
                    raw,
                    from_cache: true,
                });
            } else {
                self.spawn_layer_fetch(name);
            }
        }
    }

    /// Spawns the vehicle poller and the one-time route list fetch.
    pub fn start_feed(&self, select_rx: watch::Receiver<Option<String>>) {
        if !self.cfg.layers.contains(&self.cfg.vehicle_layer) {
            info!("No vehicle layer configured; showing a static map");
            return;
        }
        let client = FeedClient::new(&self.cfg);
        tokio::spawn(poller::poll_vehicles(
            client.clone(),
            self.cfg.poll_interval(),
            self.cfg.backoff_cap,
            select_rx,
            self.tx.clone(),
        ));
        tokio::spawn(poller::fetch_route_list(
            client,
            self.cache.clone(),
            self.tx.clone(),
        ));
    }

    /// Reads route selections from stdin: one tag per line, a blank line for
    /// all routes.
    fn start_stdin(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let trimmed = line.trim();
                let route = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                };
                if tx.send(Event::Select { route }).is_err() {
                    return;
                }
            }
        });
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Layer {
                name,
                raw,
                from_cache,
            } => self.handle_layer(name, raw, from_cache),
            Event::Vehicles { vehicles, filter } => self.handle_vehicles(vehicles, filter),
            Event::Routes { pairs } => {
                self.registry.set_titles(pairs);
                self.write_svg();
            }
            Event::Select { route } => {
                if route == self.selection {
                    return;
                }
                match &route {
                    Some(tag) => info!("Watching route {}", self.registry.display_name(tag)),
                    None => info!("Watching all routes"),
                }
                self.selection = route.clone();
                // Wakes the poller for an immediate refetch under the new filter.
                let _ = self.select_tx.send(route);
            }
        }
    }

    fn handle_layer(&mut self, name: String, raw: Vec<u8>, from_cache: bool) {
        let geometry = match LayerGeometry::parse(&raw) {
            Ok(geometry) => geometry,
            Err(err) => {
                if from_cache {
                    // A bad cache entry shouldn't lose the layer; go back to
                    // the source.
                    warn!("The cached copy of {} is corrupt ({}); refetching", name, err);
                    self.spawn_layer_fetch(name);
                } else {
                    warn!("Layer {} isn't usable GeoJSON: {}", name, err);
                }
                return;
            }
        };
        if !from_cache && self.cfg.cacheable(&name) {
            if let Err(err) = self.cache.put(&name, &raw) {
                warn!("Couldn't cache {}: {}", name, err);
            }
        }
        let had_projection = self.renderer.has_projection();
        self.renderer.add_layer(&name, geometry);
        if !had_projection && self.renderer.has_projection() {
            if let Some((vehicles, filter)) = self.held_vehicles.take() {
                self.apply_vehicles(vehicles, filter);
            }
        }
        self.write_svg();
    }

    fn handle_vehicles(&mut self, vehicles: Vec<FeedVehicle>, filter: Option<String>) {
        if filter != self.selection {
            // This response raced a selection change; a refetch under the new
            // filter is already on the way.
            debug!("Discarding a vehicle response for stale filter {:?}", filter);
            return;
        }
        let vehicles = feed::keep_vehicles(vehicles, &self.cfg.dropped_routes);
        let new_routes = self
            .registry
            .observe(vehicles.iter().map(|v| v.route.clone()));
        if new_routes {
            let tags: Vec<String> = self
                .registry
                .options()
                .into_iter()
                .filter_map(|(tag, _)| tag)
                .collect();
            info!("Routes on the map: {}", tags.join(", "));
        }
        self.apply_vehicles(vehicles, filter);
    }

    fn apply_vehicles(&mut self, vehicles: Vec<Vehicle>, filter: Option<String>) {
        // A held set can still lose a race against a later selection.
        if filter != self.selection {
            return;
        }
        match self.renderer.apply_vehicles(&vehicles, &mut self.registry) {
            Some(stats) => {
                info!(
                    "{} vehicles on the map ({} new, {} moved, {} gone)",
                    self.renderer.scene.markers().map(|m| m.len()).unwrap_or(0),
                    stats.added,
                    stats.moved,
                    stats.removed
                );
                self.write_svg();
            }
            None => {
                debug!(
                    "Holding {} vehicles until the scale layer lands",
                    vehicles.len()
                );
                self.held_vehicles = Some((vehicles, filter));
            }
        }
    }

    fn spawn_layer_fetch(&self, name: String) {
        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match source.fetch(&name).await {
                Ok(raw) => {
                    let _ = tx.send(Event::Layer {
                        name,
                        raw,
                        from_cache: false,
                    });
                }
                Err(err) => {
                    // Not fatal; the map just won't have this layer.
                    warn!("Couldn't load {}: {}", source.describe(&name), err);
                }
            }
        });
    }

    fn write_svg(&mut self) {
        let out = match &self.out {
            Some(out) => out.clone(),
            None => return,
        };
        let legend = self.registry.legend();
        let svg = self.renderer.scene.to_svg(&legend);
        if let Err(err) = fs_err::write(&out, svg) {
            warn!("Couldn't write {}: {}", out.display(), err);
        }
    }
}

/// The live loop: resolve layers, poll vehicles, rewrite the SVG after every
/// applied update, and take route selections on stdin.
pub async fn run(cfg: AppConfig, route: Option<String>, out: PathBuf) -> Result<()> {
    let (mut app, mut rx, select_rx) = App::new(cfg, route);
    app.out = Some(out);
    println!("Type a route tag to filter vehicles, or a blank line for all routes.");
    app.start_layers();
    app.start_feed(select_rx);
    app.start_stdin();
    while let Some(event) = rx.recv().await {
        app.handle(event);
    }
    Ok(())
}

/// One cycle: resolve layers, fetch vehicle locations once, write the SVG,
/// and exit.
pub async fn snapshot(cfg: AppConfig, route: Option<String>, out: PathBuf) -> Result<()> {
    let (mut app, mut rx, _select_rx) = App::new(cfg, route.clone());
    app.out = Some(out.clone());

    for name in app.cfg.layers.clone() {
        if name == app.cfg.vehicle_layer {
            continue;
        }
        let mut resolved = None;
        if let Some(raw) = app.cache.get(&name) {
            if LayerGeometry::parse(&raw).is_ok() {
                resolved = Some((raw, true));
            } else {
                warn!("The cached copy of {} is corrupt; refetching", name);
            }
        }
        if resolved.is_none() {
            match app.source.fetch(&name).await {
                Ok(raw) => resolved = Some((raw, false)),
                Err(err) => warn!("Couldn't load {}: {}", app.source.describe(&name), err),
            }
        }
        if let Some((raw, from_cache)) = resolved {
            app.handle(Event::Layer {
                name,
                raw,
                from_cache,
            });
        }
    }
    if !app.renderer.has_projection() {
        anyhow::bail!(
            "the scale layer {} never loaded, so nothing can render",
            app.cfg.scale_layer
        );
    }

    let client = FeedClient::new(&app.cfg);
    poller::fetch_route_list(client.clone(), app.cache.clone(), app.tx.clone()).await;
    let vehicles = client.vehicle_locations(route.as_deref()).await?;
    let _ = app.tx.send(Event::Vehicles {
        vehicles,
        filter: route,
    });
    while let Ok(event) = rx.try_recv() {
        app.handle(event);
    }

    let count = app.renderer.scene.markers().map(|m| m.len()).unwrap_or(0);
    println!("Wrote {} with {} vehicles", out.display(), count);
    Ok(())
}

/// Prints the route list, resolved the way the app resolves it (cache
/// first).
pub async fn print_routes(cfg: AppConfig) -> Result<()> {
    let cache = Cache::new(cfg.cache_dir.as_str());
    let client = FeedClient::new(&cfg);
    let pairs = match cache
        .get("routes")
        .and_then(|raw| feed::parse_route_list(&raw).ok())
    {
        Some(pairs) => pairs,
        None => {
            let raw = client.fetch_route_list().await?;
            let pairs = feed::parse_route_list(&raw)?;
            if let Err(err) = cache.put("routes", &raw) {
                warn!("Couldn't cache the route list: {}", err);
            }
            pairs
        }
    };
    for (tag, title) in pairs {
        println!("{:<8} {}", tag, title);
    }
    Ok(())
}
