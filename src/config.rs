use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::machine::DisassemblyWindow;

pub const DEFAULT_CATALOG: &str = "programs/catalog.json";

/// runtime settings; defaults overridden from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// catalog JSON; program files are resolved next to it
    pub catalog: PathBuf,
    pub frame_rate: u32,
    /// instructions shown before/after the program counter
    pub window_before: u16,
    pub window_after: u16,
    /// how long a key stays down when the terminal won't say it was released;
    /// longer than the usual delay before key repeat starts
    pub key_hold_frames: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            catalog: PathBuf::from(DEFAULT_CATALOG),
            frame_rate: 60,
            window_before: 4,
            window_after: 8,
            key_hold_frames: 30,
        }
    }
}

impl Config {
    /// Usage: chip8-view [catalog.json] [--fps N] [--before N] [--after N] [--hold N]
    pub fn from_args(args: &[String]) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        let mut catalog_seen = false;
        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--fps" => config.frame_rate = positive(arg, args.next())?,
                "--before" => config.window_before = parse_value(arg, args.next())?,
                "--after" => config.window_after = parse_value(arg, args.next())?,
                "--hold" => config.key_hold_frames = positive(arg, args.next())?,
                flag if flag.starts_with("--") => {
                    return Err(ConfigError::UnknownOption(flag.to_string()))
                }
                path if !catalog_seen => {
                    config.catalog = PathBuf::from(path);
                    catalog_seen = true;
                }
                extra => return Err(ConfigError::UnknownOption(extra.to_string())),
            }
        }
        Ok(config)
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    pub fn window(&self) -> DisassemblyWindow {
        DisassemblyWindow {
            before: self.window_before,
            after: self.window_after,
        }
    }
}

fn parse_value<T: FromStr>(flag: &str, value: Option<&String>) -> Result<T, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingValue(flag.to_string()))?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}

fn positive(flag: &str, value: Option<&String>) -> Result<u32, ConfigError> {
    match parse_value(flag, value)? {
        0 => Err(ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: "0".to_string(),
        }),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() -> Result<(), ConfigError> {
        let config = Config::from_args(&[])?;
        assert_eq!(config, Config::default());
        assert_eq!(config.catalog, PathBuf::from("programs/catalog.json"));
        assert_eq!(
            config.window(),
            DisassemblyWindow {
                before: 4,
                after: 8
            }
        );
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<(), ConfigError> {
        let config = Config::from_args(&args(&[
            "roms/list.json",
            "--fps",
            "30",
            "--before",
            "2",
            "--after",
            "3",
            "--hold",
            "10",
        ]))?;
        assert_eq!(config.catalog, PathBuf::from("roms/list.json"));
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.window_before, 2);
        assert_eq!(config.window_after, 3);
        assert_eq!(config.key_hold_frames, 10);
        Ok(())
    }

    #[test]
    fn test_frame_duration() {
        let config = Config {
            frame_rate: 50,
            ..Config::default()
        };
        assert_eq!(config.frame_duration(), Duration::from_millis(20));
    }

    #[test]
    fn test_zero_frame_rate_is_one_fps() {
        let config = Config {
            frame_rate: 0,
            ..Config::default()
        };
        assert_eq!(config.frame_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_bad_values() {
        assert_eq!(
            Config::from_args(&args(&["--fps", "0"])),
            Err(ConfigError::InvalidValue {
                flag: "--fps".to_string(),
                value: "0".to_string()
            })
        );
        assert_eq!(
            Config::from_args(&args(&["--before", "many"])),
            Err(ConfigError::InvalidValue {
                flag: "--before".to_string(),
                value: "many".to_string()
            })
        );
        assert_eq!(
            Config::from_args(&args(&["--after"])),
            Err(ConfigError::MissingValue("--after".to_string()))
        );
        assert_eq!(
            Config::from_args(&args(&["--scale", "3"])),
            Err(ConfigError::UnknownOption("--scale".to_string()))
        );
        assert_eq!(
            Config::from_args(&args(&["a.json", "b.json"])),
            Err(ConfigError::UnknownOption("b.json".to_string()))
        );
    }
}
