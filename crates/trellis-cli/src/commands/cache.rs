use anyhow::Result;
use colored::Colorize;
use trellis_router::{RouteRequest, Router, RouterConfig};

pub fn info(config: &RouterConfig) -> Result<()> {
    let router = Router::new(config.clone())?;
    // Warm the cache so counts reflect the current tree, not an empty
    // just-constructed snapshot.
    if config.use_cache {
        if let Some(request) = RouteRequest::parse("GET", "/") {
            let _ = router.resolve(&request)?;
        }
    }

    let info = router.cache_info();
    println!("{}", "Route cache".green().bold());
    println!();
    println!("Enabled:      {}", if info.enabled { "yes" } else { "no" });
    println!("File:         {}", info.cache_file.display());
    println!(
        "Exists:       {}",
        if info.file_exists { "yes" } else { "no" }
    );
    println!("Size:         {} bytes", info.file_size);
    match info.last_update {
        Some(ts) => println!("Last update:  {}", ts.to_rfc3339()),
        None => println!("Last update:  never"),
    }
    println!();
    println!(
        "Prefixes: {}  Handlers: {}  Dynamic dirs: {}",
        info.route_counts.prefixes.to_string().cyan(),
        info.route_counts.handlers.to_string().cyan(),
        info.route_counts.dynamic_dirs.to_string().cyan()
    );

    Ok(())
}

pub fn clear(config: &RouterConfig) -> Result<()> {
    let router = Router::new(config.clone())?;
    let path = router.cache_info().cache_file;
    router.clear_cache();
    println!(
        "{} {}",
        "Cleared route cache at".green(),
        path.display().to_string().cyan()
    );
    Ok(())
}
