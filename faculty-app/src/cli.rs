use clap::{Parser, ValueEnum};
use faculty_config::{FacultyConfig, FacultyConfigLoader};
use faculty_sink::OutputFormat;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

/// Crawl a faculty directory into a profile table and a graduate-year table.
#[derive(Parser, Debug, Clone)]
#[command(name = "faculty-crawler", version)]
pub struct Args {
    /// YAML config file; `./faculty.yaml` and the user config file are read when omitted
    #[arg(long, short, env = "FACULTY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory entry page
    #[arg(long)]
    pub url: Option<String>,

    /// WebDriver endpoint (chromedriver, geckodriver)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Run the browser without a window
    #[arg(long, conflicts_with = "headed")]
    pub headless: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory the output tables are written to
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

impl Args {
    pub fn loader(&self) -> FacultyConfigLoader {
        match &self.config {
            Some(path) => FacultyConfigLoader::new().with_file(path),
            None => FacultyConfigLoader::new().with_default_files(),
        }
    }

    /// Flags win over every config source.
    pub fn apply(&self, config: &mut FacultyConfig) {
        if let Some(url) = &self.url {
            config.directory_url = url.clone();
        }
        if let Some(endpoint) = &self.webdriver_url {
            config.browser.webdriver_url = endpoint.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "faculty-crawler",
            "--url",
            "https://faculty.example.edu/",
            "--headed",
            "--output-dir",
            "out",
            "--format",
            "jsonl",
        ])
        .unwrap();

        let mut config = FacultyConfig::default();
        args.apply(&mut config);

        assert_eq!(config.directory_url, "https://faculty.example.edu/");
        assert!(!config.browser.headless);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.format, OutputFormat::Jsonl);
    }

    #[test]
    fn no_flags_keep_config() {
        let args = Args::try_parse_from(["faculty-crawler"]).unwrap();
        let mut config = FacultyConfig::default();
        args.apply(&mut config);
        assert_eq!(config, FacultyConfig::default());
    }

    #[test]
    fn headless_and_headed_conflict() {
        assert!(Args::try_parse_from(["faculty-crawler", "--headless", "--headed"]).is_err());
    }
}
