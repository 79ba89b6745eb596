// HLS Playlist: loads a media playlist and turns it into absolute segment descriptors.

use std::collections::HashSet;
use std::path::PathBuf;

use m3u8_rs::{Key, KeyMethod, MediaPlaylist, Playlist, parse_playlist_res};
use tracing::{debug, info};
use url::Url;

use crate::hls::HlsMergeError;
use crate::hls::fetcher::ByteFetcher;
use crate::hls::segment::{KeyRef, Segment};

/// Where the playlist comes from.
#[derive(Debug, Clone)]
pub enum PlaylistSource {
    /// Remote playlist, also the base for relative URIs.
    Url(Url),
    /// Local playlist file. Relative URIs inside need `base_url`.
    File {
        path: PathBuf,
        base_url: Option<Url>,
    },
}

impl PlaylistSource {
    pub fn base_url(&self) -> Option<&Url> {
        match self {
            PlaylistSource::Url(url) => Some(url),
            PlaylistSource::File { base_url, .. } => base_url.as_ref(),
        }
    }
}

/// Segments of one media playlist with every URI made absolute.
#[derive(Debug, Clone, Default)]
pub struct SegmentPlaylist {
    pub segments: Vec<Segment>,
    pub global_key: Option<KeyRef>,
    /// No end tag: the segment list is a snapshot of a growing stream
    pub is_live: bool,
}

impl SegmentPlaylist {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Fetches or reads the playlist and parses it.
pub async fn load_playlist(
    source: &PlaylistSource,
    fetcher: &dyn ByteFetcher,
) -> Result<SegmentPlaylist, HlsMergeError> {
    let raw = match source {
        PlaylistSource::Url(url) => fetcher.get(url.as_str()).await.map_err(|e| {
            HlsMergeError::PlaylistError(format!("Failed to download playlist {url}: {e}"))
        })?,
        PlaylistSource::File { path, .. } => tokio::fs::read(path)
            .await
            .map_err(|e| {
                HlsMergeError::PlaylistError(format!(
                    "Failed to read playlist {}: {e}",
                    path.display()
                ))
            })?
            .into(),
    };
    debug!(bytes = raw.len(), "Playlist loaded");

    let playlist = parse_media_playlist(&raw, source.base_url())?;
    info!(
        segments = playlist.len(),
        encrypted = playlist.global_key.is_some()
            || playlist.segments.iter().any(|s| s.key.is_some()),
        "Parsed media playlist"
    );
    Ok(playlist)
}

/// Parses a media playlist. Master playlists are rejected.
pub fn parse_media_playlist(
    raw: &[u8],
    base_url: Option<&Url>,
) -> Result<SegmentPlaylist, HlsMergeError> {
    match parse_playlist_res(raw) {
        Ok(Playlist::MediaPlaylist(playlist)) => {
            from_media_playlist(playlist, base_url, &clear_key_positions(raw))
        }
        Ok(Playlist::MasterPlaylist(_)) => Err(HlsMergeError::PlaylistError(
            "Master playlists are not supported, pass a media playlist URL".to_string(),
        )),
        Err(e) => Err(HlsMergeError::PlaylistError(format!(
            "Failed to parse playlist: {e:?}"
        ))),
    }
}

/// Absolute form of a playlist URI.
pub fn resolve_uri(base_url: Option<&Url>, uri: &str) -> Result<String, HlsMergeError> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(uri.to_string());
    }

    let base = base_url.ok_or_else(|| {
        HlsMergeError::PlaylistError(format!(
            "Relative URI '{uri}' needs a playlist URL to resolve against"
        ))
    })?;
    base.join(uri).map(|u| u.to_string()).map_err(|e| {
        HlsMergeError::PlaylistError(format!("Could not join base URL {base} with URI {uri}: {e}"))
    })
}

fn key_ref(key: &Key, base_url: Option<&Url>) -> Result<Option<KeyRef>, HlsMergeError> {
    match &key.method {
        KeyMethod::None => Ok(None),
        KeyMethod::AES128 => {
            let uri = key.uri.as_deref().filter(|u| !u.is_empty()).ok_or_else(|| {
                HlsMergeError::PlaylistError("AES-128 key without URI".to_string())
            })?;
            Ok(Some(KeyRef {
                uri: resolve_uri(base_url, uri)?,
                iv: key.iv.clone(),
            }))
        }
        other => Err(HlsMergeError::PlaylistError(format!(
            "Unsupported encryption method: {other:?}"
        ))),
    }
}

/// Indices of segments preceded by `#EXT-X-KEY:METHOD=NONE`.
///
/// m3u8-rs drops a `METHOD=NONE` key without an IV, so the tag is located
/// in the raw manifest instead.
fn clear_key_positions(raw: &[u8]) -> HashSet<usize> {
    let mut positions = HashSet::new();
    let mut pending_clear = false;
    let mut index = 0;
    for line in String::from_utf8_lossy(raw).lines() {
        let line = line.trim();
        if let Some(attributes) = line.strip_prefix("#EXT-X-KEY:") {
            pending_clear = attributes
                .split(',')
                .any(|attr| attr.trim().eq_ignore_ascii_case("METHOD=NONE"));
        } else if !line.is_empty() && !line.starts_with('#') {
            if pending_clear {
                positions.insert(index);
            }
            pending_clear = false;
            index += 1;
        }
    }
    positions
}

fn from_media_playlist(
    playlist: MediaPlaylist,
    base_url: Option<&Url>,
    cleared: &HashSet<usize>,
) -> Result<SegmentPlaylist, HlsMergeError> {
    let is_live = !playlist.end_list;

    // A key tag applies to every following segment until the next key tag
    let mut current_key: Option<KeyRef> = None;
    let mut segments = Vec::with_capacity(playlist.segments.len());
    for (index, media_segment) in playlist.segments.iter().enumerate() {
        if let Some(key) = &media_segment.key {
            current_key = key_ref(key, base_url)?;
        } else if cleared.contains(&index) {
            current_key = None;
        }
        let uri = resolve_uri(base_url, &media_segment.uri)?;
        segments.push(Segment {
            index,
            uri,
            key: current_key.clone(),
        });
    }

    // One key for the whole playlist becomes the global key
    let shared_key = segments.first().and_then(|s| s.key.clone());
    let global_key = match shared_key {
        Some(key) if segments.iter().all(|s| s.key.as_ref() == Some(&key)) => {
            for segment in &mut segments {
                segment.key = None;
            }
            Some(key)
        }
        _ => None,
    };

    Ok(SegmentPlaylist {
        segments,
        global_key,
        is_live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://cdn.example.com/vod/index.m3u8").unwrap()
    }

    const CLEAR: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:10.0,
seg0.ts
#EXTINF:10.0,
https://other.example.com/seg1.ts
#EXTINF:10.0,
/abs/seg2.ts
#EXT-X-ENDLIST
";

    #[test]
    fn test_relative_uris_are_resolved() {
        let playlist = parse_media_playlist(CLEAR.as_bytes(), Some(&base())).unwrap();

        let uris: Vec<_> = playlist.segments.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "https://cdn.example.com/vod/seg0.ts",
                "https://other.example.com/seg1.ts",
                "https://cdn.example.com/abs/seg2.ts",
            ]
        );
        assert_eq!(
            playlist.segments.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(playlist.global_key.is_none());
        assert!(!playlist.is_live);
    }

    #[test]
    fn test_relative_uri_without_base_fails() {
        let err = parse_media_playlist(CLEAR.as_bytes(), None).unwrap_err();
        assert!(matches!(err, HlsMergeError::PlaylistError(_)));
    }

    #[test]
    fn test_single_key_becomes_global() {
        let raw = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\"
#EXTINF:10.0,
seg0.ts
#EXTINF:10.0,
seg1.ts
#EXT-X-ENDLIST
";
        let playlist = parse_media_playlist(raw.as_bytes(), Some(&base())).unwrap();

        assert_eq!(
            playlist.global_key,
            Some(KeyRef::new("https://cdn.example.com/vod/key.bin"))
        );
        assert!(playlist.segments.iter().all(|s| s.key.is_none()));
    }

    #[test]
    fn test_key_rotation_stays_per_segment() {
        let raw = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXT-X-KEY:METHOD=AES-128,URI=\"k1.bin\",IV=0x00000000000000000000000000000001
#EXTINF:10.0,
seg0.ts
#EXTINF:10.0,
seg1.ts
#EXT-X-KEY:METHOD=NONE
#EXTINF:10.0,
seg2.ts
#EXT-X-KEY:METHOD=AES-128,URI=\"k2.bin\"
#EXTINF:10.0,
seg3.ts
#EXT-X-ENDLIST
";
        let playlist = parse_media_playlist(raw.as_bytes(), Some(&base())).unwrap();

        assert!(playlist.global_key.is_none());
        let k1 = KeyRef::new("https://cdn.example.com/vod/k1.bin")
            .with_iv("0x00000000000000000000000000000001");
        assert_eq!(playlist.segments[0].key.as_ref(), Some(&k1));
        assert_eq!(playlist.segments[1].key.as_ref(), Some(&k1));
        assert_eq!(playlist.segments[2].key, None);
        assert_eq!(
            playlist.segments[3].key,
            Some(KeyRef::new("https://cdn.example.com/vod/k2.bin"))
        );
    }

    #[test]
    fn test_clear_key_positions() {
        let raw = "#EXTM3U
#EXT-X-KEY:METHOD=AES-128,URI=\"k1.bin\"
#EXTINF:10.0,
seg0.ts
#EXT-X-KEY:METHOD=NONE
#EXTINF:10.0,
seg1.ts
#EXTINF:10.0,
seg2.ts
#EXT-X-KEY:METHOD=AES-128,URI=\"k2.bin\"
#EXT-X-KEY:METHOD=NONE
#EXTINF:10.0,
seg3.ts
";
        let positions = clear_key_positions(raw.as_bytes());
        assert_eq!(positions, HashSet::from([1, 3]));
    }

    #[test]
    fn test_clear_segments_after_method_none_have_no_key() {
        let raw = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXT-X-KEY:METHOD=AES-128,URI=\"k1.bin\"
#EXTINF:10.0,
seg0.ts
#EXT-X-KEY:METHOD=NONE
#EXTINF:10.0,
seg1.ts
#EXTINF:10.0,
seg2.ts
#EXT-X-ENDLIST
";
        let playlist = parse_media_playlist(raw.as_bytes(), Some(&base())).unwrap();

        assert!(playlist.global_key.is_none());
        assert_eq!(
            playlist.segments[0].key,
            Some(KeyRef::new("https://cdn.example.com/vod/k1.bin"))
        );
        assert_eq!(playlist.segments[1].key, None);
        assert_eq!(playlist.segments[2].key, None);
    }

    #[test]
    fn test_master_playlist_is_rejected() {
        let raw = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1280000
low/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2560000
high/index.m3u8
";
        let err = parse_media_playlist(raw.as_bytes(), Some(&base())).unwrap_err();
        assert!(matches!(err, HlsMergeError::PlaylistError(_)));
    }

    #[test]
    fn test_sample_aes_is_rejected() {
        let raw = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXT-X-KEY:METHOD=SAMPLE-AES,URI=\"key.bin\"
#EXTINF:10.0,
seg0.ts
#EXT-X-ENDLIST
";
        assert!(parse_media_playlist(raw.as_bytes(), Some(&base())).is_err());
    }

    #[test]
    fn test_missing_end_list_is_live() {
        let raw = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXTINF:10.0,
https://cdn.example.com/seg0.ts
";
        let playlist = parse_media_playlist(raw.as_bytes(), None).unwrap();
        assert!(playlist.is_live);
        assert_eq!(playlist.len(), 1);
    }

    #[tokio::test]
    async fn test_load_from_file_uses_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.m3u8");
        std::fs::write(&path, CLEAR).unwrap();

        struct NoNetwork;
        #[async_trait::async_trait]
        impl ByteFetcher for NoNetwork {
            async fn get(&self, uri: &str) -> Result<bytes::Bytes, crate::hls::error::FetchError> {
                Err(crate::hls::error::FetchError::Status(reqwest::StatusCode::NOT_FOUND))
            }
        }

        let source = PlaylistSource::File {
            path,
            base_url: Some(base()),
        };
        let playlist = load_playlist(&source, &NoNetwork).await.unwrap();
        assert_eq!(playlist.segments[0].uri, "https://cdn.example.com/vod/seg0.ts");
    }
}
