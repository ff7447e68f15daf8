use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "v-";
const WIDTH: usize = 3;

/// Sequential video identifier rendered as `v-NNN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VideoId(u32);

impl VideoId {
    pub const FIRST: VideoId = VideoId(1);

    /// The identifier following the current maximum, or `v-001` for an empty table.
    pub fn after(current_max: Option<VideoId>) -> VideoId {
        match current_max {
            Some(VideoId(n)) => VideoId(n.saturating_add(1)),
            None => Self::FIRST,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("'{0}' is not a video id of the form v-NNN")]
pub struct InvalidVideoId(pub String);

impl FromStr for VideoId {
    type Err = InvalidVideoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(PREFIX)
            .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| InvalidVideoId(s.to_string()))?;

        digits
            .parse::<u32>()
            .map(VideoId)
            .map_err(|_| InvalidVideoId(s.to_string()))
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:0width$}", PREFIX, self.0, width = WIDTH)
    }
}
