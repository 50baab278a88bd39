//! Command-line arguments and the explorer configuration built from them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;

/// Shader sources shipped with the crate.
pub const BUNDLED_SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/glsl");

#[derive(Parser, Debug)]
#[command(
    name = "wythoff-explorer",
    about = "Real-time Wythoff construction explorer"
)]
pub struct Cli {
    /// Window size in physical pixels, e.g. 800x480.
    #[arg(long, default_value = "800x480")]
    pub size: WindowSize,

    /// Supersampling factor passed to the shaders as `AA`.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i32).range(1..))]
    pub aa: i32,

    /// Multiplier applied to wall-clock seconds before they reach `iTime`.
    #[arg(long, default_value_t = 20.0)]
    pub speed: f32,

    /// Cap the redraw rate. Without it frames are drawn as fast as possible.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Wait for vertical sync when presenting.
    #[arg(long)]
    pub vsync: bool,

    /// Directory holding wythoff.vert, common.frag, BufferA.frag, BufferB.frag and main.frag.
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,

    /// Font texture bound as `iTexture` [default: <shader dir>/../textures/font.png].
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Where Enter writes the captured frame.
    #[arg(long, default_value = "screenshot.png")]
    pub screenshot: PathBuf,

    /// Log filter in env_logger syntax (overrides RUST_LOG).
    #[arg(long)]
    pub log: Option<String>,
}

/// Window dimensions parsed from `WxH`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WindowSizeError {
    input: String,
    reason: &'static str,
}

impl fmt::Display for WindowSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid size {:?}: {}", self.input, self.reason)
    }
}

impl std::error::Error for WindowSizeError {}

impl FromStr for WindowSize {
    type Err = WindowSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| WindowSizeError {
            input: s.to_string(),
            reason,
        };

        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| err("expected WIDTHxHEIGHT"))?;

        let width: u32 = w.trim().parse().map_err(|_| err("width is not a number"))?;
        let height: u32 = h.trim().parse().map_err(|_| err("height is not a number"))?;

        if width == 0 || height == 0 {
            return Err(err("dimensions must be non-zero"));
        }

        Ok(Self { width, height })
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resolved settings for one explorer run.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub size: WindowSize,
    pub aa: i32,
    pub speed: f32,
    pub fps: Option<u32>,
    pub vsync: bool,
    pub shader_dir: PathBuf,
    pub font: PathBuf,
    pub screenshot: PathBuf,
}

impl From<Cli> for ExplorerConfig {
    fn from(cli: Cli) -> Self {
        let shader_dir = cli
            .shader_dir
            .unwrap_or_else(|| PathBuf::from(BUNDLED_SHADER_DIR));
        let font = cli.font.unwrap_or_else(|| default_font_path(&shader_dir));

        Self {
            size: cli.size,
            aa: cli.aa,
            speed: cli.speed,
            fps: cli.fps,
            vsync: cli.vsync,
            shader_dir,
            font,
            screenshot: cli.screenshot,
        }
    }
}

fn default_font_path(shader_dir: &Path) -> PathBuf {
    shader_dir
        .parent()
        .unwrap_or(shader_dir)
        .join("textures")
        .join("font.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(
            "800x480".parse::<WindowSize>().unwrap(),
            WindowSize { width: 800, height: 480 }
        );
        assert_eq!(
            " 1920X1080 ".parse::<WindowSize>().unwrap(),
            WindowSize { width: 1920, height: 1080 }
        );
        assert_eq!("640 x 360".parse::<WindowSize>().unwrap().height, 360);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!("800".parse::<WindowSize>().is_err());
        assert!("800x".parse::<WindowSize>().is_err());
        assert!("ax480".parse::<WindowSize>().is_err());
        assert!("0x480".parse::<WindowSize>().is_err());
        assert!("800x-1".parse::<WindowSize>().is_err());

        let err = "800*480".parse::<WindowSize>().unwrap_err();
        assert!(err.to_string().contains("800*480"));
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["wythoff-explorer"]).unwrap();
        assert_eq!(cli.size, WindowSize { width: 800, height: 480 });
        assert_eq!(cli.aa, 1);
        assert_eq!(cli.speed, 20.0);
        assert_eq!(cli.fps, None);
        assert!(!cli.vsync);
        assert_eq!(cli.screenshot, PathBuf::from("screenshot.png"));

        let config = ExplorerConfig::from(cli);
        assert_eq!(config.shader_dir, PathBuf::from(BUNDLED_SHADER_DIR));
        assert!(config.font.ends_with("textures/font.png"));
    }

    #[test]
    fn explicit_flags() {
        let cli = Cli::try_parse_from([
            "wythoff-explorer",
            "--size",
            "1024x768",
            "--aa",
            "3",
            "--fps",
            "30",
            "--vsync",
            "--shader-dir",
            "/tmp/shaders",
        ])
        .unwrap();
        assert_eq!(cli.aa, 3);
        assert_eq!(cli.fps, Some(30));
        assert!(cli.vsync);

        let config = ExplorerConfig::from(cli);
        assert_eq!(config.font, PathBuf::from("/tmp/textures/font.png"));
    }

    #[test]
    fn aa_must_be_positive() {
        assert!(Cli::try_parse_from(["wythoff-explorer", "--aa", "0"]).is_err());
        assert!(Cli::try_parse_from(["wythoff-explorer", "--size", "12"]).is_err());
    }
}
