//! Types for representing image resolutions.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Context};

/// Resolution (`width x height`) of an image, window, or camera.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// 1080p resolution: `1920x1080`
    pub const RES_1080P: Self = Self {
        width: 1920,
        height: 1080,
    };

    /// 720p resolution: `1280x720`
    pub const RES_720P: Self = Self {
        width: 1280,
        height: 720,
    };

    /// 480p resolution: `640x480`
    pub const RES_480P: Self = Self {
        width: 640,
        height: 480,
    };

    /// Creates a new [`Resolution`] of `width x height`.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the width of this [`Resolution`].
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of this [`Resolution`].
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn num_pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses resolutions written as `WIDTHxHEIGHT`, like `1280x720`.
impl FromStr for Resolution {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("expected `WIDTHxHEIGHT`, got `{s}`"))?;
        let width = width.trim().parse().context("invalid width")?;
        let height = height.trim().parse().context("invalid height")?;
        if width == 0 || height == 0 {
            return Err(anyhow!("resolution `{s}` is empty"));
        }
        Ok(Self { width, height })
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Resolution::RES_1080P.to_string(), "1920x1080");
        assert_eq!(format!("{:?}", Resolution::new(3, 2)), "3x2");
    }

    #[test]
    fn parse() {
        assert_eq!("640x480".parse::<Resolution>().unwrap(), Resolution::RES_480P);
        assert_eq!("1280X720".parse::<Resolution>().unwrap(), Resolution::RES_720P);
        assert!("1280".parse::<Resolution>().is_err());
        assert!("-1x5".parse::<Resolution>().is_err());
        assert!("0x480".parse::<Resolution>().is_err());
        assert!("640x".parse::<Resolution>().is_err());
    }

    #[test]
    fn num_pixels() {
        assert_eq!(Resolution::RES_720P.num_pixels(), 1280 * 720);
        assert_eq!(Resolution::new(u32::MAX, 2).num_pixels(), u64::from(u32::MAX) * 2);
    }
}
