use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hlsmerge_engine::hls::ProgressSink;
use hlsmerge_engine::{
    DownloaderConfig, HlsConfig, HlsMerger, MergeSummary, PlaylistSource, ProxyConfig,
};
use tracing::{info, warn};
use url::Url;

use crate::cli::CliArgs;
use crate::error::AppError;
use crate::utils::{default_output_path, default_staging_dir, format_bytes, parse_headers};

/// Proxy from the command line, `None` when no explicit proxy is set.
pub fn proxy_config(args: &CliArgs) -> Option<ProxyConfig> {
    if args.no_proxy {
        info!("All proxy settings disabled (--no-proxy flag)");
        return None;
    }
    let proxy_url = args.proxy.as_ref()?;

    let mut proxy = ProxyConfig::new(proxy_url.clone());
    match (&args.proxy_user, &args.proxy_pass) {
        (Some(username), Some(password)) => {
            proxy = proxy.with_auth(username.clone(), password.clone());
        }
        (None, None) => {}
        _ => warn!("Proxy authentication needs both --proxy-user and --proxy-pass, ignoring"),
    }

    info!(
        proxy_url = %proxy.normalized_url(),
        has_auth = proxy.auth.is_some(),
        "Using explicit proxy configuration"
    );
    Some(proxy)
}

/// Engine configuration built from the command line.
pub fn hls_config(args: &CliArgs) -> HlsConfig {
    let download_config = {
        let builder = DownloaderConfig::builder().with_headers(parse_headers(&args.headers));
        let builder = match proxy_config(args) {
            Some(proxy) => builder.with_proxy(proxy),
            None => builder.with_system_proxy(!args.no_proxy),
        };
        builder.build()
    };

    HlsConfig::builder()
        .with_base_config(download_config)
        .download_concurrency(args.threads)
        .max_attempts(args.retries)
        .request_timeout(Duration::from_secs(args.timeout))
        .retry_delay_base(Duration::from_millis(args.retry_delay_ms))
        .start_offset(args.start)
        .keep_staging(args.keep_segments)
        .build()
}

/// Where the playlist is read from.
pub fn playlist_source(args: &CliArgs) -> Result<PlaylistSource, AppError> {
    let url = args
        .url
        .as_deref()
        .map(|raw| {
            Url::parse(raw).map_err(|e| AppError::InvalidInput(format!("Invalid URL '{raw}': {e}")))
        })
        .transpose()?;

    match (&args.file, url) {
        (Some(path), base_url) => Ok(PlaylistSource::File {
            path: path.clone(),
            base_url,
        }),
        (None, Some(url)) => Ok(PlaylistSource::Url(url)),
        (None, None) => Err(AppError::InvalidInput(
            "Either --url or --file is required".to_string(),
        )),
    }
}

/// Loads the playlist, downloads every segment and writes the merged file.
pub async fn process(
    args: &CliArgs,
    progress: Arc<dyn ProgressSink>,
) -> Result<MergeSummary, AppError> {
    let source = playlist_source(args)?;
    let merger = HlsMerger::new(hls_config(args))?.with_progress(progress);

    let playlist = merger.load_playlist(&source).await?;
    if playlist.is_live {
        warn!(
            segments = playlist.len(),
            "Playlist has no end tag, only the segments listed right now are downloaded"
        );
    }
    let first_uri = playlist
        .segments
        .first()
        .map(|segment| segment.uri.as_str())
        .ok_or_else(|| AppError::InvalidInput("Playlist contains no segments".to_string()))?;

    let output_path: PathBuf = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(first_uri)?,
    };
    let staging_dir = args
        .staging_dir
        .clone()
        .unwrap_or_else(|| default_staging_dir(&output_path));

    info!(
        segments = playlist.len(),
        output = %output_path.display(),
        staging_dir = %staging_dir.display(),
        "Merging playlist"
    );

    let summary = merger.merge(&playlist, &staging_dir, &output_path).await?;
    info!(
        segments = summary.segments_downloaded,
        files = summary.files_combined,
        size = %format_bytes(summary.bytes_written),
        elapsed = ?summary.elapsed,
        "Merged into {}",
        summary.output_path.display()
    );
    Ok(summary)
}
