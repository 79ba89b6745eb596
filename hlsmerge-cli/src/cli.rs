use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    author = "hua0512 <https://github.com/hua0512>",
    version,
    about = "Download, decrypt and merge an HLS media playlist into one file",
    long_about = "Downloads every segment of an HLS media playlist with a pool of workers,\n\
                  decrypts AES-128 segments and concatenates them into a single file.\n\
                  \n\
                  The playlist can be fetched from a URL or read from a local file. When\n\
                  both are given, the file is parsed and the URL is used to resolve\n\
                  relative segment and key URIs.",
    group(ArgGroup::new("source").required(true).multiple(true).args(["url", "file"]))
)]
pub struct CliArgs {
    /// Playlist URL
    #[arg(short, long, help = "URL of the media playlist (.m3u8)")]
    pub url: Option<String>,

    /// Local playlist file
    #[arg(
        short,
        long,
        help = "Path to a local media playlist; relative URIs are resolved against --url"
    )]
    pub file: Option<PathBuf>,

    /// Output file
    #[arg(
        short,
        long,
        help = "Output file path (default: total_<first segment file name>)"
    )]
    pub output: Option<PathBuf>,

    /// Number of workers
    #[arg(
        short = 'n',
        long,
        default_value = "10",
        help = "Number of segments downloaded concurrently"
    )]
    pub threads: usize,

    /// Attempts per request
    #[arg(
        short,
        long,
        default_value = "3",
        help = "Attempts per segment or key request before the run fails"
    )]
    pub retries: u32,

    /// Per-attempt timeout in seconds
    #[arg(
        short,
        long,
        default_value = "30",
        help = "Timeout in seconds for a single request attempt"
    )]
    pub timeout: u64,

    #[arg(
        long,
        default_value = "500",
        help = "Base delay in milliseconds between attempts, doubled after each failure"
    )]
    pub retry_delay_ms: u64,

    /// Proxy URL (e.g., "http://proxy.example.com:8080")
    #[arg(
        short,
        long,
        help = "Proxy server URL (http, https or socks5 scheme)"
    )]
    pub proxy: Option<String>,

    /// Proxy username
    #[arg(long, help = "Username for proxy authentication")]
    pub proxy_user: Option<String>,

    /// Proxy password
    #[arg(long, help = "Password for proxy authentication")]
    pub proxy_pass: Option<String>,

    /// Disable all proxy settings
    #[arg(
        long,
        conflicts_with = "proxy",
        help = "Disable all proxy settings (including system proxy)"
    )]
    pub no_proxy: bool,

    /// Custom HTTP headers for every request
    #[arg(
        long = "header",
        short = 'H',
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Staging directory for downloaded segments
    #[arg(
        long,
        help = "Directory holding downloaded segments (default: output path without extension)"
    )]
    pub staging_dir: Option<PathBuf>,

    /// Resume from a segment index
    #[arg(
        long = "start",
        default_value = "0",
        help = "Skip segments before this index; files already staged are still merged"
    )]
    pub start: usize,

    #[arg(long, help = "Keep the staging directory after a successful merge")]
    pub keep_segments: bool,

    #[arg(long, help = "Hide progress bars")]
    pub no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}
