//! Watch dial face rendering.
//!
//! A [`WatchDial`] collects a background disk plus tick and numeral styles keyed
//! by angle (degrees clockwise from 12 o'clock, `0..=360`). [`WatchDial::render`]
//! composites the disk, tick and numeral layers into one RGBA image.
//!
//! ```no_run
//! use watch_dial::{Color, WatchDial};
//!
//! # fn main() -> watch_dial::DialResult<()> {
//! let mut dial = WatchDial::new();
//! dial.set_background_solid(Color::BLACK);
//! dial.add_tick_vector((0..360).step_by(6), 0.03, 0.005, Color::WHITE)?;
//! dial.add_tick_vector((0..360).step_by(30), 0.08, 0.015, Color::WHITE)?;
//! dial.add_numeral_vector(
//!     (0..360).step_by(30),
//!     "fonts/DejaVuSans.ttf",
//!     0.04,
//!     Color::WHITE,
//!     0.2,
//!     watch_dial::NumeralValue::from_fn(|angle| match (angle + 90) / 30 {
//!         0 => "12".to_string(),
//!         hour => hour.to_string(),
//!     }),
//! )?;
//! let image = dial.render(1000, Some(std::path::Path::new("dial.png")))?;
//! assert_eq!(image.dimensions(), (1000, 1000));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod description;
pub mod error;
pub mod preview;
pub mod raster;
pub mod render;
pub mod text;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use config::{
    Background, Color, ImageBackground, ImageNumeral, ImageTick, NumeralStyle, NumeralValue,
    TickStyle, VectorNumeral, VectorTick, WatchDial,
};
pub use description::DialDescription;
pub use error::{DialError, DialResult};
pub use render::NUMERAL_VERTICAL_DIVISOR;
