use anyhow::{Context, Result};
use catalog_cache::apis::HttpCatalogClient;
use catalog_cache::cache::{CacheSnapshot, CatalogCache};
use catalog_cache::config::CatalogConfig;
use catalog_cache::constants::DEFAULT_PRELOAD;
use catalog_cache::image::{HttpImageProbe, ImageResolver, ImageState};
use catalog_cache::logging;
use catalog_cache::types::{CatalogSource, Entity};
use catalog_cache::view::{
    project, CumulativeWindow, DisplayState, FilterState, Pager, QueryStringStore, SortDirection,
    SortKey,
};
use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Browse a remote catalog through an incremental client-side cache")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Case-insensitive match on name, category or id
    #[arg(long)]
    search: Option<String>,
    /// Sort key: id, name or metric
    #[arg(long)]
    sort: Option<String>,
    /// Sort direction: asc or desc
    #[arg(long)]
    order: Option<String>,
    /// Saved browse state as a query string, e.g. "search=pika&sortBy=metric"
    #[arg(long)]
    query: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed-page view: load up front, then page through the projection
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
        /// 1-based page; out-of-range pages clamp
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        page_size: Option<usize>,
        /// Entities to load before projecting
        #[arg(long, default_value_t = DEFAULT_PRELOAD)]
        preload: usize,
    },
    /// Cumulative view: grow batch by batch, printing the window each time
    Stream {
        #[command(flatten)]
        filters: FilterArgs,
        /// Stop after this many acquisition cycles
        #[arg(long, default_value_t = 3)]
        batches: usize,
    },
    /// Detail view for a single entity
    Show {
        id: u32,
        /// Resolve the first loadable image candidate
        #[arg(long)]
        probe_image: bool,
    },
}

fn filter_state(filters: &FilterArgs) -> Result<FilterState<QueryStringStore>> {
    let store = filters
        .query
        .as_deref()
        .map(QueryStringStore::parse)
        .unwrap_or_default();
    let mut state = FilterState::new(store);
    if let Some(search) = &filters.search {
        state.set_search(search);
    }
    if let Some(sort) = &filters.sort {
        state.set_sort_key(sort.parse::<SortKey>()?);
    }
    if let Some(order) = &filters.order {
        state.set_sort_direction(order.parse::<SortDirection>()?);
    }
    Ok(state)
}

fn print_entity_row(entity: &Entity) {
    println!(
        "  #{:<5} {:<18} {:<20} {:>5}",
        entity.id,
        entity.name,
        entity.categories.join("/"),
        entity.metric
    );
}

fn print_display_state(state: DisplayState, snapshot: &CacheSnapshot) {
    match state {
        DisplayState::Loading => println!("⏳ Loading catalog..."),
        DisplayState::Failed(kind) => {
            println!(
                "❌ Failed to load catalog data ({}). Run the command again to retry.",
                kind.as_str()
            )
        }
        DisplayState::NoData => println!("🗄️  No catalog data available"),
        DisplayState::NoResults => println!(
            "🔍 No entries match the current filters ({} loaded). Try adjusting the search.",
            snapshot.total_loaded()
        ),
        DisplayState::Ready => {}
    }
}

async fn browse(
    cache: &CatalogCache,
    filters: FilterArgs,
    page: Option<usize>,
    page_size: usize,
    preload: usize,
) -> Result<()> {
    let mut state = filter_state(&filters)?;
    if let Some(page) = page {
        state.go_to_page(page);
    }
    let criteria = state.criteria();
    let pager = Pager::new(page_size)?;

    if let Err(e) = cache.ensure_loaded(preload).await {
        error!("Loading catalog failed: {}", e);
    }

    let snapshot = cache.snapshot();
    let projection = project(&snapshot.entities, &criteria);
    let display = DisplayState::derive(&snapshot, projection.len());
    if display != DisplayState::Ready {
        print_display_state(display, &snapshot);
        return Ok(());
    }

    let window = pager.window(&projection, state.page());
    println!(
        "📖 Page {}/{} ({} matching of {} loaded, sorted by {} {})",
        window.current_page,
        window.total_pages,
        window.total_items,
        snapshot.total_loaded(),
        criteria.sort_key,
        criteria.sort_direction
    );
    for entity in window.items {
        print_entity_row(entity);
    }
    if pager.needs_controls(projection.len()) {
        state.go_to_page(window.current_page);
        println!("   state: ?{}", state.store().to_query_string());
    }
    Ok(())
}

async fn stream(cache: &CatalogCache, filters: FilterArgs, batches: usize) -> Result<()> {
    let criteria = filter_state(&filters)?.criteria();
    let mut shown: HashSet<u32> = HashSet::new();

    match cache.load_more().await {
        Ok(outcome) => info!("Initial cycle: {:?}", outcome),
        Err(e) => error!("Initial cycle failed: {}", e),
    }

    for _ in 0..batches {
        let snapshot = cache.snapshot();
        let projection = project(&snapshot.entities, &criteria);
        let display = DisplayState::derive(&snapshot, projection.len());
        if display != DisplayState::Ready {
            print_display_state(display, &snapshot);
        }

        let window = CumulativeWindow::new(&projection, snapshot.total_loaded(), snapshot.has_more);
        // New arrivals can sort anywhere in the window, so track by id
        for entity in window.items {
            if shown.insert(entity.id) {
                print_entity_row(entity);
            }
        }
        println!(
            "── {} shown, {} loaded, more available: {}",
            shown.len(),
            window.total_loaded,
            window.has_more
        );

        if !window.has_more {
            break;
        }
        // An empty window has nothing to consume, so the prefetch trigger never fires
        let next = if window.items.is_empty() {
            cache.load_more().await.map(Some)
        } else {
            cache.prefetch_if_needed(window.items.len(), window.items.len()).await
        };
        match next {
            Ok(outcome) => info!("Next cycle: {:?}", outcome),
            Err(e) => {
                println!("❌ Loading more failed: {}. Run again to retry.", e);
                break;
            }
        }
    }
    Ok(())
}

async fn show(
    cache: &CatalogCache,
    config: &CatalogConfig,
    id: u32,
    probe_image: bool,
) -> Result<()> {
    let entity = cache
        .entity(id)
        .await
        .with_context(|| format!("failed to load entry #{}", id))?;
    println!("🔎 #{} {}", entity.id, entity.name);
    println!("   categories: {}", entity.categories.join(", "));
    println!("   metric:     {}", entity.metric);
    println!("   images:");
    for candidate in &entity.image_refs {
        println!("     - {}", candidate);
    }
    if probe_image {
        let resolver = ImageResolver::new(HttpImageProbe::default(), config.image_timeout());
        match resolver.resolve(&entity.image_refs).await {
            ImageState::Loaded(url) => println!("   image:      {}", url),
            ImageState::Unavailable => println!("   image:      unavailable"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CatalogConfig::load_from(path)?,
        None => CatalogConfig::load()?,
    };
    info!("Using catalog at {}/{}", config.api_base_url, config.collection);

    let source: Arc<dyn CatalogSource> = Arc::new(HttpCatalogClient::new(&config)?);
    let cache = CatalogCache::from_config(source, &config)?;

    match cli.command {
        Commands::Browse {
            filters,
            page,
            page_size,
            preload,
        } => {
            let page_size = page_size.unwrap_or(config.page_size);
            browse(&cache, filters, page, page_size, preload).await?;
        }
        Commands::Stream { filters, batches } => {
            stream(&cache, filters, batches).await?;
        }
        Commands::Show { id, probe_image } => {
            show(&cache, &config, id, probe_image).await?;
        }
    }
    Ok(())
}
