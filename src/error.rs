use std::path::PathBuf;

pub type DialResult<T> = Result<T, DialError>;

#[derive(thiserror::Error, Debug)]
pub enum DialError {
    #[error("precondition violated: background radius {0} is outside (0, 0.5]")]
    RadiusOutOfRange(f64),

    #[error("precondition violated: background center ({0}, {1}) is outside [0, 1)")]
    CenterOutOfRange(f64, f64),

    #[error("precondition violated: angle {0} is outside [0, 360]")]
    AngleOutOfRange(i32),

    #[error("precondition violated: output size must be at least 1 pixel")]
    InvalidSize,

    #[error("failed to open image '{}'", path.display())]
    ImageOpen {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to save image '{}'", path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read font '{}'", path.display())]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a usable outline font", path.display())]
    FontParse { path: PathBuf },

    #[error("dial description error: {0}")]
    Description(String),

    #[error("preview window error: {0}")]
    Preview(String),
}

impl DialError {
    pub fn description(msg: impl Into<String>) -> Self {
        Self::Description(msg.into())
    }

    pub fn preview(msg: impl Into<String>) -> Self {
        Self::Preview(msg.into())
    }

    /// True for errors raised by argument validation rather than I/O.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::RadiusOutOfRange(_)
                | Self::CenterOutOfRange(..)
                | Self::AngleOutOfRange(_)
                | Self::InvalidSize
        )
    }
}
