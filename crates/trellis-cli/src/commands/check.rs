use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use trellis_router::segment::{
    classify_stem, dynamic_param_name, parse_handler_filename, SegmentPattern,
};
use trellis_router::{Router, RouterConfig};
use walkdir::WalkDir;

/// Walks the whole tree and reports every problem, instead of stopping at
/// the first one the way an index build does.
pub fn execute(config: &RouterConfig) -> Result<()> {
    let router = Router::new(config.clone())?;
    let root = router.routes_dir();
    let mut problems: Vec<String> = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let Some(name) = entry.file_name().to_str() else {
            problems.push(format!(
                "{}: file name is not valid UTF-8",
                entry.path().display()
            ));
            continue;
        };

        if entry.file_type().is_dir() {
            check_dir_name(entry.path(), name, &mut problems);
            check_dynamic_children(entry.path(), &mut problems);
        } else if entry.file_type().is_file() {
            check_file_name(entry.path(), name, &mut problems);
        }
    }

    if problems.is_empty() {
        println!(
            "{} no problems found under {}",
            "OK".green().bold(),
            root.display()
        );
        return Ok(());
    }

    println!(
        "{} problem(s) under {}",
        problems.len().to_string().red().bold(),
        root.display().to_string().cyan()
    );
    println!();
    for problem in &problems {
        println!("  {} {problem}", "✗".red());
    }
    std::process::exit(1);
}

fn check_dir_name(path: &Path, name: &str, problems: &mut Vec<String>) {
    if name.starts_with('[') && dynamic_param_name(name).is_none() {
        problems.push(format!(
            "{}: malformed dynamic directory name, expected [name] with \
             alphanumeric or underscore characters",
            path.display()
        ));
    }
}

fn check_dynamic_children(dir: &Path, problems: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        problems.push(format!("{}: directory is unreadable", dir.display()));
        return;
    };

    let mut dynamic: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| dynamic_param_name(name).is_some())
        .collect();
    dynamic.sort();

    if dynamic.len() > 1 {
        problems.push(format!(
            "{}: multiple dynamic directories ({}), resolution would be ambiguous",
            dir.display(),
            dynamic.join(", ")
        ));
    }
}

fn check_file_name(path: &Path, name: &str, problems: &mut Vec<String>) {
    let Some(parsed) = parse_handler_filename(name) else {
        return;
    };
    if parsed.stem.contains('[') {
        if let SegmentPattern::Static(_) = classify_stem(&parsed.stem) {
            problems.push(format!(
                "{}: bracket syntax in the name never matches dynamically, \
                 the file only serves its literal name",
                path.display()
            ));
        }
    }
}
