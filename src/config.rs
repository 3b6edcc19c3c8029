use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bon::Builder;

use crate::error::{DialError, DialResult};

// ============================================================================
// COLOR
// ============================================================================

/// RGBA color for dial elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const TRANSPARENT: Color = Color::new(0x00, 0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((r, g, b, a): (u8, u8, u8, u8)) -> Self {
        Self::new(r, g, b, a)
    }
}

// ============================================================================
// BACKGROUND
// ============================================================================

/// Disk underneath ticks and numerals. Only one kind is active at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Solid(Color),
    Image(ImageBackground),
}

/// Circular region cut out of a source image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBackground {
    pub path: PathBuf,
    /// Circle center as a fraction of the source width and height.
    pub center: (f64, f64),
    /// Circle radius as a fraction of the source's shorter side.
    pub radius: f64,
}

impl ImageBackground {
    pub fn validate(&self) -> DialResult<()> {
        if !(self.radius > 0.0 && self.radius <= 0.5) {
            return Err(DialError::RadiusOutOfRange(self.radius));
        }
        let (cx, cy) = self.center;
        let in_unit = |v: f64| (0.0..1.0).contains(&v);
        if !(in_unit(cx) && in_unit(cy)) {
            return Err(DialError::CenterOutOfRange(cx, cy));
        }
        Ok(())
    }
}

// ============================================================================
// TICKS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TickStyle {
    Vector(VectorTick),
    Image(ImageTick),
}

/// Radial line running inward from the rim.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct VectorTick {
    /// Fraction of the dial radius.
    pub length: f64,
    /// Line width as a fraction of the dial radius.
    pub width: f64,
    #[builder(default = Color::WHITE)]
    pub color: Color,
}

/// Bitmap tick, rotated to follow the rim.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ImageTick {
    #[builder(into)]
    pub path: PathBuf,
    /// Tick height as a fraction of the output size.
    pub scale: f64,
}

impl From<VectorTick> for TickStyle {
    fn from(tick: VectorTick) -> Self {
        TickStyle::Vector(tick)
    }
}

impl From<ImageTick> for TickStyle {
    fn from(tick: ImageTick) -> Self {
        TickStyle::Image(tick)
    }
}

// ============================================================================
// NUMERALS
// ============================================================================

/// Text drawn for a vector numeral: fixed, or computed from the drawing angle.
#[derive(Clone)]
pub enum NumeralValue {
    Literal(String),
    Computed(Arc<dyn Fn(i32) -> String + Send + Sync>),
}

impl NumeralValue {
    pub fn literal(value: impl fmt::Display) -> Self {
        NumeralValue::Literal(value.to_string())
    }

    /// `f` receives the screen-space drawing angle, i.e. the registered angle minus 90.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(i32) -> String + Send + Sync + 'static,
    {
        NumeralValue::Computed(Arc::new(f))
    }

    pub fn resolve(&self, angle: i32) -> String {
        match self {
            NumeralValue::Literal(text) => text.clone(),
            NumeralValue::Computed(f) => f(angle),
        }
    }
}

impl fmt::Debug for NumeralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumeralValue::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            NumeralValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl PartialEq for NumeralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NumeralValue::Literal(a), NumeralValue::Literal(b)) => a == b,
            (NumeralValue::Computed(a), NumeralValue::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for NumeralValue {
    fn from(value: &str) -> Self {
        NumeralValue::Literal(value.to_string())
    }
}

impl From<String> for NumeralValue {
    fn from(value: String) -> Self {
        NumeralValue::Literal(value)
    }
}

impl From<i32> for NumeralValue {
    fn from(value: i32) -> Self {
        NumeralValue::literal(value)
    }
}

impl From<i64> for NumeralValue {
    fn from(value: i64) -> Self {
        NumeralValue::literal(value)
    }
}

/// Floats keep their fractional part: `2.0` renders as "2.0".
impl From<f64> for NumeralValue {
    fn from(value: f64) -> Self {
        NumeralValue::Literal(format!("{value:?}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumeralStyle {
    Vector(VectorNumeral),
    Image(ImageNumeral),
}

/// Text numeral scaled so its width matches `size * output_size`.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct VectorNumeral {
    #[builder(into)]
    pub font: PathBuf,
    /// Target text width as a fraction of the output size.
    pub size: f64,
    #[builder(default = Color::WHITE)]
    pub color: Color,
    /// Distance from the rim as a fraction of the dial radius.
    pub distance: f64,
    #[builder(into)]
    pub value: NumeralValue,
}

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ImageNumeral {
    #[builder(into)]
    pub path: PathBuf,
    /// Side length as a fraction of the output size.
    pub scale: f64,
    pub distance: f64,
}

impl From<VectorNumeral> for NumeralStyle {
    fn from(numeral: VectorNumeral) -> Self {
        NumeralStyle::Vector(numeral)
    }
}

impl From<ImageNumeral> for NumeralStyle {
    fn from(numeral: ImageNumeral) -> Self {
        NumeralStyle::Image(numeral)
    }
}

// ============================================================================
// DIAL MODEL
// ============================================================================

pub const MIN_ANGLE: i32 = 0;
pub const MAX_ANGLE: i32 = 360;

/// Declarative description of a dial face: a background plus per-angle tick
/// and numeral styles. Angles are degrees clockwise from 12 o'clock.
#[derive(Debug, Clone, Default)]
pub struct WatchDial {
    background: Option<Background>,
    ticks: BTreeMap<i32, TickStyle>,
    numerals: BTreeMap<i32, NumeralStyle>,
}

impl WatchDial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn ticks(&self) -> &BTreeMap<i32, TickStyle> {
        &self.ticks
    }

    pub fn numerals(&self) -> &BTreeMap<i32, NumeralStyle> {
        &self.numerals
    }

    pub fn set_background(&mut self, background: Background) -> DialResult<()> {
        if let Background::Image(ref image) = background {
            image.validate()?;
        }
        self.background = Some(background);
        Ok(())
    }

    pub fn set_background_solid(&mut self, color: impl Into<Color>) {
        self.background = Some(Background::Solid(color.into()));
    }

    pub fn set_background_image(
        &mut self,
        path: impl Into<PathBuf>,
        center: (f64, f64),
        radius: f64,
    ) -> DialResult<()> {
        self.set_background(Background::Image(ImageBackground {
            path: path.into(),
            center,
            radius,
        }))
    }

    /// Registers `style` at every angle, replacing earlier entries. Nothing is
    /// written unless all angles are valid.
    pub fn add_ticks(
        &mut self,
        angles: impl IntoIterator<Item = i32>,
        style: impl Into<TickStyle>,
    ) -> DialResult<()> {
        let angles = checked_angles(angles)?;
        let style = style.into();
        for angle in angles {
            self.ticks.insert(angle, style.clone());
        }
        Ok(())
    }

    pub fn add_tick_vector(
        &mut self,
        angles: impl IntoIterator<Item = i32>,
        length: f64,
        width: f64,
        color: impl Into<Color>,
    ) -> DialResult<()> {
        let tick = VectorTick {
            length,
            width,
            color: color.into(),
        };
        self.add_ticks(angles, tick)
    }

    pub fn add_tick_image(
        &mut self,
        angles: impl IntoIterator<Item = i32>,
        scale: f64,
        path: impl Into<PathBuf>,
    ) -> DialResult<()> {
        let tick = ImageTick {
            path: path.into(),
            scale,
        };
        self.add_ticks(angles, tick)
    }

    /// Numeral counterpart of [`WatchDial::add_ticks`].
    pub fn add_numerals(
        &mut self,
        angles: impl IntoIterator<Item = i32>,
        style: impl Into<NumeralStyle>,
    ) -> DialResult<()> {
        let angles = checked_angles(angles)?;
        let style = style.into();
        for angle in angles {
            self.numerals.insert(angle, style.clone());
        }
        Ok(())
    }

    pub fn add_numeral_vector(
        &mut self,
        angles: impl IntoIterator<Item = i32>,
        font: impl Into<PathBuf>,
        size: f64,
        color: impl Into<Color>,
        distance: f64,
        value: impl Into<NumeralValue>,
    ) -> DialResult<()> {
        let numeral = VectorNumeral {
            font: font.into(),
            size,
            color: color.into(),
            distance,
            value: value.into(),
        };
        self.add_numerals(angles, numeral)
    }

    pub fn add_numeral_image(
        &mut self,
        angles: impl IntoIterator<Item = i32>,
        scale: f64,
        distance: f64,
        path: impl Into<PathBuf>,
    ) -> DialResult<()> {
        let numeral = ImageNumeral {
            path: path.into(),
            scale,
            distance,
        };
        self.add_numerals(angles, numeral)
    }
}

fn checked_angles(angles: impl IntoIterator<Item = i32>) -> DialResult<Vec<i32>> {
    let angles: Vec<i32> = angles.into_iter().collect();
    match angles
        .iter()
        .find(|a| !(MIN_ANGLE..=MAX_ANGLE).contains(*a))
    {
        Some(&bad) => Err(DialError::AngleOutOfRange(bad)),
        None => Ok(angles),
    }
}
