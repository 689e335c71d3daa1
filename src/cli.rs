mod correlate;
mod graph;

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};

pub use self::{
    correlate::{CorrelateArgs, correlate},
    graph::{GraphArgs, graph},
};
use crate::{
    api::{OpenMeteo, open_meteo},
    core::granularity::Granularity,
    prelude::*,
};

const HELP_TEMPLATE: &str = "\
{about-with-newline}
USAGE:
    {usage}

ARGUMENTS:
{positionals}

OPTIONS:
{options}

EXAMPLES:
{after-help}";

const TOP_LEVEL_HELP_TEMPLATE: &str = "\
{about-with-newline}
USAGE:
    {usage}

ARGUMENTS:
{subcommands}

OPTIONS:
{options}

EXAMPLES:
{after-help}";

const TOP_LEVEL_EXAMPLES: &str = "\
    # Graph the only export found in input/
    hydrograph graph

    # Daily totals with a text export, without opening the graph
    hydrograph graph --daily --text --nodisplay

    # Temperature correlation of a specific export
    hydrograph correlate input/bchydro.com-consumption-XXXXXXXX0385-2026-02-07-154641.csv";

const GRAPH_EXAMPLES: &str = "\
    # Auto-detect the CSV file (if only one exists in input/)
    hydrograph graph

    # Process a specific file
    hydrograph graph input/bchydro.com-consumption-XXXXXXXX0385-2026-02-07-154641.csv

    # Weekly totals, without displaying the graph
    hydrograph graph --weekly --nodisplay

    # Display help
    hydrograph graph --help";

const CORRELATE_EXAMPLES: &str = "\
    # Analyze at least three months of consumption
    hydrograph correlate input/bchydro.com-consumption-XXXXXXXX0385-2026-02-07-154641.csv

    # Analyze without opening the graph
    hydrograph correlate --nodisplay input/bchydro.com-consumption-XXXXXXXX0385-2026-02-07-154641.csv";

#[derive(Parser)]
#[command(
    name = "hydrograph",
    author,
    version,
    about = "BC Hydro Electricity Consumption Analyzer",
    help_template = TOP_LEVEL_HELP_TEMPLATE,
    after_help = TOP_LEVEL_EXAMPLES,
)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Consumption graph with the temperature overlay.
    #[command(name = "graph", help_template = HELP_TEMPLATE, after_help = GRAPH_EXAMPLES)]
    Graph(Box<GraphArgs>),

    /// Correlation between the outdoor temperature and the daily consumption.
    #[command(name = "correlate", help_template = HELP_TEMPLATE, after_help = CORRELATE_EXAMPLES)]
    Correlate(Box<CorrelateArgs>),
}

/// Rewrite the single-dash help spellings into `--help`.
pub fn normalize_help_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| if arg == "-help" || arg == "-?" { OsString::from("--help") } else { arg })
        .collect()
}

#[derive(Copy, Clone, Parser)]
#[group(id = "aggregation", multiple = false)]
pub struct AggregationArgs {
    /// Aggregate into daily totals.
    #[clap(long)]
    daily: bool,

    /// Aggregate into weekly totals, weeks start on Monday.
    #[clap(long)]
    weekly: bool,

    /// Aggregate into monthly totals, incomplete months are dropped.
    #[clap(long)]
    monthly: bool,
}

impl AggregationArgs {
    /// Requested aggregation target, if any.
    pub const fn target(self) -> Option<Granularity> {
        if self.daily {
            Some(Granularity::Daily)
        } else if self.weekly {
            Some(Granularity::Weekly)
        } else if self.monthly {
            Some(Granularity::Monthly)
        } else {
            None
        }
    }
}

#[derive(Copy, Clone, Parser)]
pub struct DisplayArgs {
    /// Display the graph after creation (default).
    #[clap(long, overrides_with = "nodisplay")]
    display: bool,

    /// Do not display the graph after creation.
    #[clap(long, overrides_with = "display")]
    nodisplay: bool,
}

impl DisplayArgs {
    pub const fn is_enabled(self) -> bool {
        self.display || !self.nodisplay
    }
}

#[derive(Parser)]
pub struct DirectoryArgs {
    /// Directory searched for `bchydro.com-consumption-*.csv` when no file is specified.
    #[clap(long, env = "INPUT_DIR", default_value = "input")]
    pub input_dir: PathBuf,

    /// Directory for the graphs and text exports.
    #[clap(long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,
}

impl DirectoryArgs {
    /// Output file named after the input file: `<output-dir>/<stem><suffix>.<extension>`.
    pub fn output_path(&self, input: &Path, suffix: &str, extension: &str) -> Result<PathBuf> {
        let stem = input
            .file_stem()
            .with_context(|| format!("`{}` has no file name", input.display()))?;
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("failed to create `{}`", self.output_dir.display()))?;
        let mut name = stem.to_os_string();
        name.push(suffix);
        name.push(".");
        name.push(extension);
        Ok(self.output_dir.join(name))
    }
}

#[derive(Parser)]
pub struct WeatherArgs {
    /// Latitude of the weather location.
    #[clap(long, env = "WEATHER_LATITUDE", default_value = "49.7833", allow_negative_numbers = true)]
    latitude: f64,

    /// Longitude of the weather location.
    #[clap(
        long,
        env = "WEATHER_LONGITUDE",
        default_value = "-123.1333",
        allow_negative_numbers = true
    )]
    longitude: f64,

    /// Timezone of the consumption timestamps.
    #[clap(long, env = "WEATHER_TIMEZONE", default_value = "America/Vancouver")]
    timezone: String,

    /// Open-Meteo historical weather API endpoint.
    #[clap(long = "weather-api-url", env = "WEATHER_API_URL", default_value = open_meteo::DEFAULT_URL)]
    url: String,

    /// Weather request timeout.
    #[clap(long = "weather-timeout", env = "WEATHER_TIMEOUT", default_value = "30s")]
    timeout: humantime::Duration,
}

impl WeatherArgs {
    pub fn api(&self) -> OpenMeteo {
        OpenMeteo::builder()
            .url(&self.url)
            .latitude(self.latitude)
            .longitude(self.longitude)
            .timezone(&self.timezone)
            .timeout(self.timeout.into())
            .build()
    }
}

#[derive(Parser)]
pub struct ChartArgs {
    /// TrueType font for the chart text, a well-known system font is used by default.
    #[clap(long = "chart-font", env = "CHART_FONT")]
    pub font: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(normalize_help_flags(args.iter().map(OsString::from)))
    }

    #[test]
    fn test_normalize_help_flags() {
        let args = normalize_help_flags(["hydrograph", "graph", "-?", "-help", "--daily"].map(OsString::from));
        assert_eq!(args, ["hydrograph", "graph", "--help", "--help", "--daily"]);
    }

    #[test]
    fn test_help_spellings() {
        for flag in ["-?", "-help", "--help", "-h"] {
            let error = parse(&["hydrograph", "graph", flag]).err().unwrap();
            assert_eq!(error.kind(), clap::error::ErrorKind::DisplayHelp, "{flag}");
        }
    }

    #[test]
    fn test_help_sections() {
        let error = parse(&["hydrograph", "graph", "-?"]).err().unwrap();
        let help = error.to_string();
        for section in ["USAGE:", "ARGUMENTS:", "OPTIONS:", "EXAMPLES:"] {
            assert!(help.contains(section), "missing {section} in:\n{help}");
        }
    }

    #[test]
    fn test_graph_defaults() -> Result {
        let Command::Graph(args) = parse(&["hydrograph", "graph"])?.command else {
            bail!("expected the graph command");
        };
        assert_eq!(args.aggregation.target(), None);
        assert!(args.display.is_enabled());
        assert!(!args.text);
        assert!(args.file.is_none());
        Ok(())
    }

    #[test]
    fn test_aggregation_flags() -> Result {
        let Command::Graph(args) = parse(&["hydrograph", "graph", "--weekly", "data.csv"])?.command
        else {
            bail!("expected the graph command");
        };
        assert_eq!(args.aggregation.target(), Some(Granularity::Weekly));
        assert_eq!(args.file.as_deref(), Some(Path::new("data.csv")));
        Ok(())
    }

    #[test]
    fn test_conflicting_aggregation_flags() {
        assert!(parse(&["hydrograph", "graph", "--daily", "--monthly"]).is_err());
    }

    #[test]
    fn test_last_display_flag_wins() -> Result {
        let Command::Graph(args) =
            parse(&["hydrograph", "graph", "--nodisplay", "--display"])?.command
        else {
            bail!("expected the graph command");
        };
        assert!(args.display.is_enabled());

        let Command::Graph(args) =
            parse(&["hydrograph", "graph", "--display", "--nodisplay"])?.command
        else {
            bail!("expected the graph command");
        };
        assert!(!args.display.is_enabled());
        Ok(())
    }

    #[test]
    fn test_correlate_requires_file() {
        assert!(parse(&["hydrograph", "correlate"]).is_err());
    }

    #[test]
    fn test_output_path_keeps_dotted_stem() -> Result {
        let directory = tempfile::tempdir()?;
        let args = DirectoryArgs {
            input_dir: PathBuf::from("input"),
            output_dir: directory.path().join("output"),
        };
        let path = args.output_path(
            Path::new("input/bchydro.com-consumption-0385.csv"),
            "_correlation",
            "png",
        )?;
        assert_eq!(
            path,
            directory.path().join("output").join("bchydro.com-consumption-0385_correlation.png"),
        );
        assert!(directory.path().join("output").is_dir());
        Ok(())
    }
}
