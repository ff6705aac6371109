pub mod connection {
    use std::time::Duration;

    /// How long a dropped voice link may take to start signalling again on its own.
    pub const RECOVER_SIGNALLING_TIMEOUT: Duration = Duration::from_secs(5);
    /// How long a dropped voice link may take to start connecting again on its own.
    pub const RECOVER_CONNECTING_TIMEOUT: Duration = Duration::from_secs(5);
    pub const READY_TIMEOUT: Duration = Duration::from_secs(10);
    pub const GET_LAVALINK_CONNECTION_INFO_TIMEOUT: Duration = Duration::from_millis(2_000);
}

pub mod misc {
    use std::time::Duration;

    pub const DEFAULT_COMMAND_PREFIX: &str = "!";
    pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);
    pub const EVENT_CHANNEL_CAPACITY: usize = 0xFF;
    pub const QUEUE_LIST_LIMIT: usize = 10;
    pub const TRACK_REF_DISPLAY_LIMIT: usize = 80;
}

pub mod text {
    pub const QUEUE_EMPTY: &str = "The queue is empty; there's nothing to skip to.";
    pub const NOTHING_PLAYING: &str = "Nothing is playing right now.";
    pub const PLAY_ERROR: &str = "Error playing the track";
}

pub mod exit_code {
    /// A harmless notice, confirming something the user might have meant to do
    pub const NOTICE: &str = "❕";
    /// A harmless warning
    pub const WARNING: &str = "❗";
    /// Invalid command usage, implying unmet conditions
    pub const INVALID: &str = "❌";
    /// Other known errors
    pub const KNOWN_ERROR: &str = "‼️";
}

pub mod provider {
    pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
    pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
    pub const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
    pub const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

    /// Client-credentials tokens live for an hour; refresh well before that.
    pub const SPOTIFY_TOKEN_TTL: std::time::Duration = std::time::Duration::from_secs(50 * 60);
}

pub mod roulette {
    use std::time::Duration;

    pub const DEFAULT_TIMER: Duration = Duration::from_secs(30);
    pub const MAX_TIMER: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_PLAYERS: usize = 10;
    pub const MAX_PLAYERS: usize = 30;
    pub const MIN_PLAYERS: usize = 2;
    pub const JOIN_EMOJI: &str = "🎲";
    pub const ATTACHMENT_NAME: &str = "roulette.gif";
    pub const EMBED_COLOUR: u32 = 0x82_6b_d6;
}

pub mod minigame {
    pub const DEFAULT_APPLICATION_ID: u64 = 995_698_729_225_027_694;
    pub const DEFAULT_IGNORED_GUILDS: &[u64] = &[489_424_959_270_158_356];
}
