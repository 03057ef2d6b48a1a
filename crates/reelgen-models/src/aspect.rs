//! Output aspect ratios supported by the stitcher.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target aspect ratio for the stitched output.
///
/// The stitcher only understands these two formats, so the model is a
/// closed enum rather than a free width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 9:16 portrait for Shorts/Reels/TikTok
    #[default]
    Portrait,
    /// 16:9 landscape
    Landscape,
}

#[derive(Debug, Error)]
#[error("invalid aspect ratio: {0} (expected 9:16 or 16:9)")]
pub struct AspectRatioParseError(String);

impl AspectRatio {
    /// The `W:H` form passed to the stitcher's `--format` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
        }
    }

    /// Output resolution in pixels.
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            AspectRatio::Portrait => (1080, 1920),
            AspectRatio::Landscape => (1920, 1080),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "9:16" | "portrait" => Ok(AspectRatio::Portrait),
            "16:9" | "landscape" => Ok(AspectRatio::Landscape),
            other => Err(AspectRatioParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stitcher_format_strings() {
        assert_eq!(AspectRatio::Portrait.as_str(), "9:16");
        assert_eq!(AspectRatio::Landscape.as_str(), "16:9");
    }

    #[test]
    fn test_resolution() {
        assert_eq!(AspectRatio::Portrait.resolution(), (1080, 1920));
        assert_eq!(AspectRatio::Landscape.resolution(), (1920, 1080));
    }

    #[test]
    fn test_parse() {
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!("landscape".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert!("4:3".parse::<AspectRatio>().is_err());
    }
}
