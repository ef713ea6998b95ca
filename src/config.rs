use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_MODEL: &str = "assets/models/octahedron.stl";

/// Command line parameters.
#[derive(Debug, Parser)]
#[clap(name = "sceneplay", about)]
pub struct Args {
    #[clap(long, default_value = DEFAULT_MODEL)]
    /// STL model loaded in the background and placed next to the scene.
    pub model: PathBuf,

    #[clap(long)]
    /// TTF/OTF font for panel labels. Defaults to the first system font found.
    pub font: Option<PathBuf>,

    #[clap(long, default_value_t = 1280)]
    /// Initial window width.
    pub width: u32,

    #[clap(long, default_value_t = 720)]
    /// Initial window height.
    pub height: u32,

    #[clap(long)]
    /// Seeds the jitter generator for a reproducible run.
    pub seed: Option<u64>,

    #[clap(long)]
    /// Keeps the jitter plane and hovered markers near where they started.
    pub limit_drift: bool,

    #[clap(long, short = 'v')]
    /// Logs this crate at debug level.
    pub verbose: bool,
}

/// Configuration for the app window and scene.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub model_path: PathBuf,
    pub font_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub limit_drift: bool,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "sceneplay".to_string(),
            width: 1280,
            height: 720,
            model_path: PathBuf::from(DEFAULT_MODEL),
            font_path: None,
            seed: None,
            limit_drift: false,
            verbose: false,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn model(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn limit_drift(mut self, limit: bool) -> Self {
        self.limit_drift = limit;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        Self {
            model_path: args.model,
            font_path: args.font,
            seed: args.seed,
            limit_drift: args.limit_drift,
            verbose: args.verbose,
            ..Self::default()
        }
        .size(args.width, args.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_builder() {
        let args = Args::parse_from(["sceneplay"]);
        assert_eq!(AppConfig::from(args), AppConfig::new());
    }

    #[test]
    fn flags_reach_the_config() {
        let args = Args::parse_from([
            "sceneplay",
            "--model",
            "teapot.stl",
            "--font",
            "mono.ttf",
            "--width",
            "640",
            "--height",
            "480",
            "--seed",
            "7",
            "--limit-drift",
            "-v",
        ]);
        let config = AppConfig::from(args);

        assert_eq!(
            config,
            AppConfig::new()
                .model("teapot.stl")
                .font("mono.ttf")
                .size(640, 480)
                .seed(7)
                .limit_drift(true)
                .verbose(true)
        );
    }

    #[test]
    fn rejects_non_numeric_seed() {
        assert!(Args::try_parse_from(["sceneplay", "--seed", "abc"]).is_err());
    }
}
