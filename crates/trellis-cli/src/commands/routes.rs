use anyhow::Result;
use colored::Colorize;
use trellis_router::{Router, RouterConfig};

pub fn execute(config: &RouterConfig, json: bool) -> Result<()> {
    let router = Router::new(config.clone())?;
    let routes = router.list_routes();

    if json {
        println!("{}", serde_json::to_string_pretty(&routes)?);
        return Ok(());
    }

    if routes.is_empty() {
        println!(
            "No routes found under {}",
            router.routes_dir().display().to_string().cyan()
        );
        return Ok(());
    }

    println!(
        "{} route(s) under {}",
        routes.len().to_string().green().bold(),
        router.routes_dir().display().to_string().cyan()
    );
    println!();
    for route in routes {
        println!("  {route}");
    }

    Ok(())
}
