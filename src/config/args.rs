//! Command-line argument parsing
//!
//! The service takes only a handful of flags, so they are matched by hand:
//! - `-c path` / `--config path` / `--config=path`: configuration file
//! - `--sample-config`: print a TOML file with every default and exit

use super::DEFAULT_CONFIG_PATH;

/// Parsed command-line options
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliArgs {
    pub config_path: Option<String>,
    pub print_sample_config: bool,
    /// Arguments that were not recognized, kept for the startup warning
    pub unknown: Vec<String>,
}

impl CliArgs {
    /// Parse `std::env::args()`-style input (program name at index 0)
    ///
    /// # Examples
    /// ```
    /// use tabletrail::config::args::CliArgs;
    /// let args = vec!["tabletrail".to_string(), "-c".to_string(), "prod.toml".to_string()];
    /// assert_eq!(CliArgs::parse(&args).config_path.as_deref(), Some("prod.toml"));
    /// ```
    pub fn parse(args: &[String]) -> Self {
        let mut parsed = CliArgs::default();
        let mut iter = args.iter().skip(1);

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-c" | "--config" => match iter.next() {
                    Some(path) => parsed.config_path = Some(path.clone()),
                    None => parsed.unknown.push(arg.clone()),
                },
                "--sample-config" => parsed.print_sample_config = true,
                other => {
                    if let Some(path) = other
                        .strip_prefix("--config=")
                        .or_else(|| other.strip_prefix("-c="))
                    {
                        parsed.config_path = Some(path.to_string());
                    } else {
                        parsed.unknown.push(other.to_string());
                    }
                }
            }
        }

        parsed
    }

    /// Config file to load, falling back to `config.toml`
    pub fn config_path_or_default(&self) -> &str {
        self.config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH)
    }
}
