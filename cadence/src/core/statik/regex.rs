use std::sync::LazyLock;

use regex::Regex;

pub static YOUTUBE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\d_-]{11,12}$").expect("regex is valid"));

pub static YOUTUBE_VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:https?:)?//)?(?:(?:www|m|music)\.)?(youtube\.com|youtu\.be)(/(?:[\w\-]+\?v=|shorts/|embed/|live/|v/)?)([\w\-]+)(\S+)?$",
    )
    .expect("regex is valid")
});

pub static YOUTUBE_PLAYLIST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:https?:)?//)?(?:(?:www|m|music)\.)?(youtube\.com|youtu\.be)/(?:(playlist|watch))?(.*)?((\?|&)list=)(PL|UU|LL|RD|OL)[a-zA-Z\d_-]{10,}(&.*)?$",
    )
    .expect("regex is valid")
});

/// Matches a `list=` query parameter, including its leading separator.
pub static LIST_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]list=[^&]*").expect("regex is valid"));

/// Matches a Spotify track link, with or without a regional `intl-xx/` segment.
pub static SPOTIFY_TRACK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"spotify\.com/(?:intl-[a-zA-Z_-]+/)?track/").expect("regex is valid")
});

pub static SPOTIFY_TRACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"spotify\.com/(?:intl-[a-zA-Z_-]+/)?track/([a-zA-Z0-9]+)").expect("regex is valid")
});
