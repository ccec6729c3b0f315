pub mod animation;
pub mod component;
pub mod config;
pub mod contracts;
pub mod error;
pub mod events;
pub mod opacity;
pub mod scheduler;
pub mod sequencer;
pub mod state;
pub mod time_model;

#[cfg(test)]
mod testing;

pub use animation::{AnimationDriver, Scene, StyledRegion};
pub use component::{CartogramComponent, CartogramHandle, Collaborators};
pub use config::CartogramConfig;
pub use contracts::{FrameSource, GeometryEngine, GeometryRequest, RenderSink, Transition};
pub use error::{CartogramError, ConfigError, EngineError, SourceError};
pub use events::CartogramEvent;
pub use opacity::{LandOpacity, RegionOpacity};
pub use scheduler::{Phase, RedrawRequest, RedrawScheduler};
pub use sequencer::FrameSequencer;
pub use state::{ComponentStatus, CountersSnapshot};
