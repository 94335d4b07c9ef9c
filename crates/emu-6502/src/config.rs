//! Runner configuration, parsed from the command line.

use std::fmt;
use std::io;
use std::path::PathBuf;

use mos_6502::DecimalMode;

/// What the runner prints while executing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    /// Summary only.
    #[default]
    None,
    /// One nestest-style line per instruction.
    Log,
    /// One line per bus cycle.
    Cycles,
    /// One JSON object per instruction with its bus cycles.
    Json,
}

/// When a run stops, checked at instruction boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLimit {
    Instructions(u64),
    Cycles(u64),
}

impl RunLimit {
    #[must_use]
    pub const fn reached(self, instructions: u64, cycles: u64) -> bool {
        match self {
            Self::Instructions(limit) => instructions >= limit,
            Self::Cycles(limit) => cycles >= limit,
        }
    }
}

impl Default for RunLimit {
    fn default() -> Self {
        Self::Instructions(100_000)
    }
}

/// Machine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Raw binary image.
    pub image: PathBuf,
    /// Where the image is copied in memory.
    pub load_address: u16,
    /// Written to $FFFC/$FFFD after loading, if set.
    pub reset_vector: Option<u16>,
    pub limit: RunLimit,
    pub trace: TraceFormat,
    pub decimal: DecimalMode,
}

#[derive(Debug)]
pub enum ConfigError {
    /// `--help` was given.
    Help,
    UnknownFlag(String),
    MissingValue(&'static str),
    BadNumber { flag: &'static str, value: String },
    BadChoice { flag: &'static str, value: String },
    MissingImage,
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => write!(f, "help requested"),
            Self::UnknownFlag(flag) => write!(f, "unknown argument: {flag}"),
            Self::MissingValue(flag) => write!(f, "{flag} needs a value"),
            Self::BadNumber { flag, value } => write!(f, "{flag}: not a number: {value}"),
            Self::BadChoice { flag, value } => write!(f, "{flag}: unknown choice: {value}"),
            Self::MissingImage => write!(f, "no image given (use --image <file>)"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parse `$C000`, `0xC000` or decimal.
fn parse_number(flag: &'static str, value: &str) -> Result<u64, ConfigError> {
    let parsed = if let Some(hex) = value.strip_prefix('$') {
        u64::from_str_radix(hex, 16)
    } else if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.map_err(|_| ConfigError::BadNumber {
        flag,
        value: value.to_string(),
    })
}

fn parse_address(flag: &'static str, value: &str) -> Result<u16, ConfigError> {
    let number = parse_number(flag, value)?;
    u16::try_from(number).map_err(|_| ConfigError::BadNumber {
        flag,
        value: value.to_string(),
    })
}

impl MachineConfig {
    /// Parse arguments, not including the program name.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut image = None;
        let mut load_address = 0;
        let mut reset_vector = None;
        let mut limit = RunLimit::default();
        let mut trace = TraceFormat::default();
        let mut decimal = DecimalMode::default();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let flag: &'static str = match arg.as_str() {
                "--image" => "--image",
                "--load" => "--load",
                "--reset" => "--reset",
                "--instructions" => "--instructions",
                "--cycles" => "--cycles",
                "--trace" => "--trace",
                "--decimal" => "--decimal",
                "--help" | "-h" => return Err(ConfigError::Help),
                _ => return Err(ConfigError::UnknownFlag(arg)),
            };
            let value = args.next().ok_or(ConfigError::MissingValue(flag))?;

            match flag {
                "--image" => image = Some(PathBuf::from(value)),
                "--load" => load_address = parse_address(flag, &value)?,
                "--reset" => reset_vector = Some(parse_address(flag, &value)?),
                "--instructions" => limit = RunLimit::Instructions(parse_number(flag, &value)?),
                "--cycles" => limit = RunLimit::Cycles(parse_number(flag, &value)?),
                "--trace" => {
                    trace = match value.as_str() {
                        "none" => TraceFormat::None,
                        "log" => TraceFormat::Log,
                        "cycles" => TraceFormat::Cycles,
                        "json" => TraceFormat::Json,
                        _ => return Err(ConfigError::BadChoice { flag, value }),
                    };
                }
                _ => {
                    decimal = match value.as_str() {
                        "nmos" => DecimalMode::Nmos,
                        "off" => DecimalMode::Disabled,
                        _ => return Err(ConfigError::BadChoice { flag, value }),
                    };
                }
            }
        }

        Ok(Self {
            image: image.ok_or(ConfigError::MissingImage)?,
            load_address,
            reset_vector,
            limit,
            trace,
            decimal,
        })
    }

    /// Read the image file.
    pub fn load_image(&self) -> Result<Vec<u8>, ConfigError> {
        std::fs::read(&self.image).map_err(|source| ConfigError::Io {
            path: self.image.clone(),
            source,
        })
    }
}
