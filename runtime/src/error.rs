use std::fmt;

/// A `FrameSource` could not produce a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError(pub String);

/// A `GeometryEngine` computation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError(pub String);

/// The component was started with unusable inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoShapes,
    EmptyShape(String),
    DuplicateShape(String),
    InvalidViewport { width: f64, height: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CartogramError {
    InvalidConfiguration(ConfigError),
    /// The component task has stopped.
    Closed,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame source failed: {}", self.0)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geometry engine failed: {}", self.0)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoShapes => f.write_str("no region shapes were provided"),
            ConfigError::EmptyShape(id) => write!(f, "region shape {id} has no rings"),
            ConfigError::DuplicateShape(id) => write!(f, "region shape {id} appears twice"),
            ConfigError::InvalidViewport { width, height } => {
                write!(f, "viewport {width}x{height} is not drawable")
            }
        }
    }
}

impl fmt::Display for CartogramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartogramError::InvalidConfiguration(e) => write!(f, "invalid configuration: {e}"),
            CartogramError::Closed => f.write_str("cartogram component has stopped"),
        }
    }
}

impl std::error::Error for SourceError {}
impl std::error::Error for EngineError {}
impl std::error::Error for ConfigError {}

impl std::error::Error for CartogramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CartogramError::InvalidConfiguration(e) => Some(e),
            CartogramError::Closed => None,
        }
    }
}

impl From<ConfigError> for CartogramError {
    fn from(value: ConfigError) -> Self {
        CartogramError::InvalidConfiguration(value)
    }
}
