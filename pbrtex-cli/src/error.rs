//! CLI error types.

use std::fmt;

use pbrtex::config::ConfigError;
use pbrtex::logging::LoggingError;
use pbrtex::CompileError;

/// Errors reported by the command line. Every one exits with code 1.
#[derive(Debug)]
pub enum CliError {
    /// clap could not parse the arguments.
    Arguments(String),
    MissingInput,
    MissingOutput,
    /// Not exactly one material flag.
    MaterialFlags,
    /// Not exactly one quality flag.
    QualityFlags,
    /// A cube map without all of its extra outputs.
    CubeMapArguments,
    /// A cube-map size outside `1..=65535`.
    InvalidOutputSize,
    /// Cube-map outputs given for a flat material.
    CubeMapOnlyArguments,
    Config(ConfigError),
    Logging(LoggingError),
    Compile(CompileError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Texture compiler error. ")?;
        match self {
            CliError::Arguments(reason) => {
                write!(f, "Failed to parse command line arguments: {}", reason)
            }
            CliError::MissingInput => write!(f, "Input file is not specified."),
            CliError::MissingOutput => write!(f, "Output file is not specified."),
            CliError::MaterialFlags => write!(f, "Invalid number of flags, one is required."),
            CliError::QualityFlags => write!(
                f,
                "Either --development, --production or --no-compression command line argument must be set."
            ),
            CliError::CubeMapArguments => write!(
                f,
                "Cube map requires --output-size, --irradiance, --irradiance-size, --prefilter, --prefilter-size command line arguments to be set."
            ),
            CliError::InvalidOutputSize => write!(f, "Invalid output size."),
            CliError::CubeMapOnlyArguments => write!(
                f,
                "Command line arguments --output-size, --irradiance, --irradiance-size, --prefilter, --prefilter-size are required only for cube map textures."
            ),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Compile(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<CompileError> for CliError {
    fn from(e: CompileError) -> Self {
        CliError::Compile(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_prefix() {
        assert_eq!(
            CliError::MissingInput.to_string(),
            "Texture compiler error. Input file is not specified."
        );
        assert_eq!(
            CliError::MaterialFlags.to_string(),
            "Texture compiler error. Invalid number of flags, one is required."
        );
        assert_eq!(
            CliError::InvalidOutputSize.to_string(),
            "Texture compiler error. Invalid output size."
        );
    }

    #[test]
    fn test_compile_error_is_wrapped() {
        let err: CliError = CompileError::size(3, 4, "image size is not power of two").into();
        assert_eq!(
            err.to_string(),
            "Texture compiler error. Invalid texture size 3×4: image size is not power of two"
        );
    }
}
