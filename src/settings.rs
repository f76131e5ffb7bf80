use clap::Parser;
use std::path::PathBuf;
use trackview_lib::LoaderConfig;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Trackview - load, repair and compare a directory of GPS recordings
pub struct Settings {
    /// Directory with .gpx and .tcx files to load
    #[clap(value_name = "DIR")]
    pub directory: PathBuf,

    /// Worker threads parsing files in parallel (default: number of CPUs)
    #[clap(short, long)]
    pub workers: Option<usize>,

    /// Write every repaired collection as GPX into this directory
    #[clap(short, long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Report the point of every track closest to this distance (meters)
    #[clap(long, value_name = "METERS")]
    pub marker_distance: Option<f64>,

    /// Report the point of every track closest to this elapsed time (seconds)
    #[clap(long, value_name = "SECONDS")]
    pub marker_time: Option<f64>,
}

impl Settings {
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn loader_config(&self) -> LoaderConfig {
        match self.workers {
            Some(workers) => LoaderConfig { workers },
            None => LoaderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let settings = Settings::try_parse_from(["trackview", "/data/tracks"]).unwrap();
        assert_eq!(settings.directory, PathBuf::from("/data/tracks"));
        assert!(settings.export_dir.is_none());
        assert_eq!(settings.loader_config(), LoaderConfig::default());
    }

    #[test]
    fn test_parse_all_options() {
        let settings = Settings::try_parse_from([
            "trackview",
            "tracks",
            "--workers",
            "2",
            "--export-dir",
            "out",
            "--marker-distance",
            "1500",
            "--marker-time",
            "90.5",
        ])
        .unwrap();

        assert_eq!(settings.loader_config().workers, 2);
        assert_eq!(settings.export_dir, Some(PathBuf::from("out")));
        assert_eq!(settings.marker_distance, Some(1500.0));
        assert_eq!(settings.marker_time, Some(90.5));
    }

    #[test]
    fn test_directory_is_required() {
        assert!(Settings::try_parse_from(["trackview"]).is_err());
    }
}
