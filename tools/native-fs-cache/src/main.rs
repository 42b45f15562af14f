use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use native_fs_cache::filesystem::BA_SYMLINK;
use native_fs_cache::{
    CacheStats, FsConfig, FsFactory, FsLinkResolver, LocalFileSystem, RealDirectoryQuery,
};

/// Environment variable naming the directory `list` uses when no path is given
const ROOT_ENV: &str = "NATIVE_FS_ROOT";

#[derive(Parser, Debug)]
#[command(name = "fs-cache-probe")]
#[command(about = "Inspect files through the native metadata cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output and print cache statistics
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a directory with the metadata of each child
    List {
        /// Directory to list (defaults to $NATIVE_FS_ROOT or the home directory)
        path: Option<PathBuf>,
    },

    /// Show metadata for one or more paths
    Stat {
        /// Paths to inspect, all resolved within one cache epoch
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let current_dir = std::env::current_dir()
        .context("Failed to get current directory")?;
    Ok(current_dir.join(path))
}

fn default_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var(ROOT_ENV) {
        return Ok(PathBuf::from(root));
    }
    dirs::home_dir().context("Failed to get home directory")
}

fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

fn print_stats(stats: CacheStats) {
    println!();
    println!("Cache statistics:");
    println!("  Native calls: {}", stats.native_calls);
    println!("  Hits: {}", stats.hits);
    println!("  Misses: {}", stats.misses);
}

fn list_command(fs: &mut impl LocalFileSystem, path: Option<PathBuf>) -> Result<()> {
    let dir = match path {
        Some(path) => absolute(&path)?,
        None => default_root()?,
    };
    log::info!("Listing directory: {}", dir.display());

    if !fs.exists(&dir) {
        anyhow::bail!("Path does not exist: {}", dir.display());
    }
    if !fs.is_directory(&dir) {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let mut names = fs.list(&dir);
    names.sort();

    for name in names {
        let child = dir.join(&name);
        let kind = if fs.boolean_attributes(&child, BA_SYMLINK) != 0 {
            'l'
        } else if fs.is_directory(&child) {
            'd'
        } else {
            '-'
        };
        let readonly = if fs.is_writable(&child) { '-' } else { 'r' };
        println!(
            "{}{} {:>12} {} {}",
            kind,
            readonly,
            fs.length(&child),
            format_timestamp(fs.timestamp(&child)),
            name
        );
    }

    Ok(())
}

fn stat_command(fs: &mut impl LocalFileSystem, paths: Vec<PathBuf>) -> Result<()> {
    for path in paths {
        let path = absolute(&path)?;
        let exists = fs.exists(&path);

        println!("{}", path.display());
        println!("  exists: {}", exists);
        if !exists {
            continue;
        }
        println!("  directory: {}", fs.is_directory(&path));
        println!("  writable: {}", fs.is_writable(&path));
        println!("  length: {}", fs.length(&path));
        println!("  modified: {}", format_timestamp(fs.timestamp(&path)));
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let log_level = if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .target(env_logger::Target::Stderr)
        .init();

    let config = FsConfig::from_env();
    log::debug!("Configuration: {:?}", config);

    let factory = FsFactory::new(RealDirectoryQuery::with_config(&config), FsLinkResolver::new())
        .with_case_sensitivity(config.case_sensitivity);
    let mut worker = factory.worker();
    let fs = worker
        .acquire()
        .context("Native filesystem backend is disabled (check NATIVE_FS_ENABLED)")?;

    match cli.command {
        Commands::List { path } => list_command(fs, path)?,
        Commands::Stat { paths } => stat_command(fs, paths)?,
    }

    if cli.verbose {
        print_stats(fs.stats());
    }

    Ok(())
}
