//! Output formats for the image stage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Aspect ratio requested for a rendered visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    #[serde(rename = "SQUARE_1_1")]
    Square1x1,
    #[serde(rename = "PORTRAIT_4_5")]
    Portrait4x5,
    #[serde(rename = "LANDSCAPE_16_9")]
    Landscape16x9,
}

/// Formats fanned out after every successful generation.
pub const DEFAULT_IMAGE_FORMATS: [ImageFormat; 3] = [
    ImageFormat::Square1x1,
    ImageFormat::Portrait4x5,
    ImageFormat::Landscape16x9,
];

/// Pixel size sent to the image backend for a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: i32,
    pub height: i32,
}

impl ImageSize {
    /// `WIDTHxHEIGHT`, the form image APIs accept.
    pub fn as_param(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = DEFAULT_IMAGE_FORMATS;

    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Square1x1 => "SQUARE_1_1",
            ImageFormat::Portrait4x5 => "PORTRAIT_4_5",
            ImageFormat::Landscape16x9 => "LANDSCAPE_16_9",
        }
    }

    /// Closest size image backends accept for this aspect ratio.
    ///
    /// 4:5 has no exact match and maps to 1024x1536.
    pub fn size(self) -> ImageSize {
        match self {
            ImageFormat::Square1x1 => ImageSize { width: 1024, height: 1024 },
            ImageFormat::Portrait4x5 => ImageSize { width: 1024, height: 1536 },
            ImageFormat::Landscape16x9 => ImageSize { width: 1536, height: 1024 },
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| CoreError::Validation(format!("Unknown image format '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_backend_options() {
        assert_eq!(ImageFormat::Square1x1.size().as_param(), "1024x1024");
        assert_eq!(ImageFormat::Portrait4x5.size().as_param(), "1024x1536");
        assert_eq!(ImageFormat::Landscape16x9.size().as_param(), "1536x1024");
    }

    #[test]
    fn serde_names_match_as_str() {
        for f in ImageFormat::ALL {
            let json = serde_json::to_value(f).unwrap();
            assert_eq!(json, serde_json::Value::String(f.as_str().to_string()));
            assert_eq!(f.as_str().parse::<ImageFormat>().unwrap(), f);
        }
    }
}
