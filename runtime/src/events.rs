use std::time::Duration;

use cartogram_shared::{ColorScale, RegionKey, SizeMode, SizeScale, Timestamp, Viewport};
use serde::{Deserialize, Serialize};

/// Everything the host can tell a running cartogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartogramEvent {
    /// The time slider or playback moved.
    TimeChanged { timestamp: Timestamp },
    /// Playback started or stopped.
    PlaybackChanged { playing: bool },
    /// Pause between playback steps.
    DelayChanged { delay: Duration },
    /// Size extent as fractions; radii are extent times 100.
    SizeExtentChanged { extent: (f64, f64) },
    /// Switch between indicator-sized and geographic areas.
    SizeModeChanged { mode: SizeMode },
    /// New indicator scales; redraws geometry and colours.
    ScalesChanged { size: SizeScale, color: ColorScale },
    /// Palette or colour scale type changed; colours only.
    ColorScaleChanged { color: ColorScale },
    /// Lock sizes relative to another timestamp, or release the lock.
    LockChanged { lock: Option<Timestamp> },
    /// The drawing surface changed size.
    Resize { viewport: Viewport },
    /// Regions under the pointer.
    HighlightChanged { keys: Vec<RegionKey> },
    /// Regions the user picked; an empty list clears the selection.
    SelectChanged { keys: Vec<RegionKey> },
    /// Land opacity for regular and dimmed-by-selection regions.
    OpacityChanged { regular: f32, select_dim: f32 },
}
