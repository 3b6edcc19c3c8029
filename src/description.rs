//! JSON dial descriptions.
//!
//! A description is applied to a fresh [`WatchDial`] entry by entry, in
//! document order, through the same setters a Rust caller would use.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{
    Background, Color, ImageBackground, ImageNumeral, ImageTick, NumeralStyle, NumeralValue,
    TickStyle, VectorNumeral, VectorTick, WatchDial, MAX_ANGLE,
};
use crate::error::{DialError, DialResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialDescription {
    #[serde(default)]
    pub background: Option<BackgroundDef>,
    #[serde(default)]
    pub ticks: Vec<TickEntry>,
    #[serde(default)]
    pub numerals: Vec<NumeralEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundDef {
    Solid { color: ColorDef },
    Image { path: PathBuf, center: (f64, f64), radius: f64 },
}

/// `[r, g, b]` or `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ColorDef {
    Rgb([u8; 3]),
    Rgba([u8; 4]),
}

impl From<ColorDef> for Color {
    fn from(def: ColorDef) -> Self {
        match def {
            ColorDef::Rgb([r, g, b]) => Color::rgb(r, g, b),
            ColorDef::Rgba([r, g, b, a]) => Color::new(r, g, b, a),
        }
    }
}

/// Explicit list, or every `every` degrees starting at `offset`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnglesDef {
    List(Vec<i32>),
    Every {
        every: u32,
        #[serde(default)]
        offset: i32,
    },
}

impl AnglesDef {
    pub fn expand(&self) -> DialResult<Vec<i32>> {
        match self {
            AnglesDef::List(angles) => Ok(angles.clone()),
            AnglesDef::Every { every, offset } => {
                if *every == 0 {
                    return Err(DialError::description("angle step `every` must be at least 1"));
                }
                Ok((*offset..=MAX_ANGLE.max(*offset))
                    .step_by(*every as usize)
                    .collect())
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickEntry {
    pub angles: AnglesDef,
    #[serde(flatten)]
    pub style: TickDef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickDef {
    Vector {
        length: f64,
        width: f64,
        color: ColorDef,
    },
    Image {
        path: PathBuf,
        scale: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct NumeralEntry {
    pub angles: AnglesDef,
    #[serde(flatten)]
    pub style: NumeralDef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumeralDef {
    Vector {
        font: PathBuf,
        size: f64,
        color: ColorDef,
        distance: f64,
        value: ValueDef,
    },
    Image {
        path: PathBuf,
        scale: f64,
        distance: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueDef {
    Text(String),
    Integer(i64),
    Float(f64),
    Template { template: ValueTemplate },
}

/// Numeral text derived from the position on the dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTemplate {
    /// 12, 1, 2, … 11 for every 30 degrees.
    Hour,
    /// 0..59 for every 6 degrees.
    Minute,
    /// The registered angle itself.
    Degree,
}

impl ValueTemplate {
    /// `screen_angle` is the drawing angle passed to computed numeral values.
    pub fn format(self, screen_angle: i32) -> String {
        let degree = screen_angle + 90;
        match self {
            ValueTemplate::Hour => match degree / 30 {
                0 => "12".to_string(),
                hour => hour.to_string(),
            },
            ValueTemplate::Minute => (degree / 6).to_string(),
            ValueTemplate::Degree => degree.to_string(),
        }
    }
}

impl From<ValueDef> for NumeralValue {
    fn from(def: ValueDef) -> Self {
        match def {
            ValueDef::Text(text) => NumeralValue::Literal(text),
            ValueDef::Integer(n) => NumeralValue::literal(n),
            ValueDef::Float(x) => NumeralValue::from(x),
            ValueDef::Template { template } => NumeralValue::from_fn(move |a| template.format(a)),
        }
    }
}

impl DialDescription {
    pub fn from_json(json: &str) -> DialResult<Self> {
        serde_json::from_str(json).map_err(|e| DialError::description(e.to_string()))
    }

    pub fn load(path: &Path) -> DialResult<Self> {
        let file = File::open(path).map_err(|e| {
            DialError::description(format!("open '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| DialError::description(format!("parse '{}': {e}", path.display())))
    }

    /// Builds the dial, resolving relative paths against `base_dir`.
    pub fn build(&self, base_dir: &Path) -> DialResult<WatchDial> {
        let mut dial = WatchDial::new();
        match &self.background {
            Some(BackgroundDef::Solid { color }) => dial.set_background_solid(*color),
            Some(BackgroundDef::Image {
                path,
                center,
                radius,
            }) => dial.set_background(Background::Image(ImageBackground {
                path: resolve(base_dir, path),
                center: *center,
                radius: *radius,
            }))?,
            None => {}
        }

        for entry in &self.ticks {
            let style = match &entry.style {
                TickDef::Vector {
                    length,
                    width,
                    color,
                } => TickStyle::Vector(VectorTick {
                    length: *length,
                    width: *width,
                    color: (*color).into(),
                }),
                TickDef::Image { path, scale } => TickStyle::Image(ImageTick {
                    path: resolve(base_dir, path),
                    scale: *scale,
                }),
            };
            dial.add_ticks(entry.angles.expand()?, style)?;
        }

        for entry in &self.numerals {
            let style = match &entry.style {
                NumeralDef::Vector {
                    font,
                    size,
                    color,
                    distance,
                    value,
                } => NumeralStyle::Vector(VectorNumeral {
                    font: resolve(base_dir, font),
                    size: *size,
                    color: (*color).into(),
                    distance: *distance,
                    value: value.clone().into(),
                }),
                NumeralDef::Image {
                    path,
                    scale,
                    distance,
                } => NumeralStyle::Image(ImageNumeral {
                    path: resolve(base_dir, path),
                    scale: *scale,
                    distance: *distance,
                }),
            };
            dial.add_numerals(entry.angles.expand()?, style)?;
        }

        tracing::debug!(
            ticks = dial.ticks().len(),
            numerals = dial.numerals().len(),
            "dial description applied"
        );
        Ok(dial)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_description() {
        let json = r#"{
            "background": { "solid": { "color": [0, 0, 0] } },
            "ticks": [
                { "angles": { "every": 6 }, "vector": { "length": 0.03, "width": 0.005, "color": [255, 255, 255] } },
                { "angles": [0, 90, 180, 270], "image": { "path": "tick.png", "scale": 0.02 } }
            ],
            "numerals": [
                { "angles": { "every": 30 }, "vector": { "font": "font.ttf", "size": 0.04,
                  "color": [255, 255, 255, 128], "distance": 0.15, "value": { "template": "hour" } } },
                { "angles": [45], "image": { "path": "/abs/n.png", "scale": 0.1, "distance": 0.2 } }
            ]
        }"#;
        let dial = DialDescription::from_json(json)
            .unwrap()
            .build(Path::new("/dials"))
            .unwrap();

        assert_eq!(dial.background(), Some(&Background::Solid(Color::BLACK)));
        // 0, 6, .., 360
        assert_eq!(dial.ticks().len(), 61);
        assert_eq!(
            dial.ticks()[&90],
            TickStyle::Image(ImageTick {
                path: PathBuf::from("/dials/tick.png"),
                scale: 0.02
            })
        );
        assert!(matches!(dial.ticks()[&6], TickStyle::Vector(_)));

        let NumeralStyle::Vector(twelve) = &dial.numerals()[&0] else {
            panic!("expected vector numeral");
        };
        assert_eq!(twelve.font, PathBuf::from("/dials/font.ttf"));
        assert_eq!(twelve.color, Color::new(255, 255, 255, 128));
        assert_eq!(twelve.value.resolve(-90), "12");
        assert!(matches!(
            &dial.numerals()[&45],
            NumeralStyle::Image(n) if n.path == Path::new("/abs/n.png")
        ));
    }

    #[test]
    fn literal_values_keep_their_text() {
        for (json, expected) in [
            (r#""IV""#, "IV"),
            ("7", "7"),
            ("2.5", "2.5"),
            ("2.0", "2.0"),
        ] {
            let def: ValueDef = serde_json::from_str(json).unwrap();
            assert_eq!(NumeralValue::from(def).resolve(0), expected);
        }
    }

    #[test]
    fn templates_follow_the_dial() {
        assert_eq!(ValueTemplate::Hour.format(-90), "12");
        assert_eq!(ValueTemplate::Hour.format(0), "3");
        assert_eq!(ValueTemplate::Hour.format(240), "11");
        assert_eq!(ValueTemplate::Minute.format(-90 + 180), "30");
        assert_eq!(ValueTemplate::Degree.format(-45), "45");
    }

    #[test]
    fn offset_steps_stop_at_full_turn() {
        let angles = AnglesDef::Every {
            every: 90,
            offset: 45,
        };
        assert_eq!(angles.expand().unwrap(), [45, 135, 225, 315]);
        let zero = AnglesDef::Every {
            every: 0,
            offset: 0,
        };
        assert!(zero.expand().is_err());
    }

    #[test]
    fn invalid_entries_surface_as_preconditions() {
        let json = r#"{ "ticks": [ { "angles": [10, 400], "image": { "path": "t.png", "scale": 0.1 } } ] }"#;
        let err = DialDescription::from_json(json)
            .unwrap()
            .build(Path::new("."))
            .unwrap_err();
        assert!(matches!(err, DialError::AngleOutOfRange(400)));

        let json = r#"{ "background": { "image": { "path": "bg.png", "center": [0.5, 0.5], "radius": 0.9 } } }"#;
        let err = DialDescription::from_json(json)
            .unwrap()
            .build(Path::new("."))
            .unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn malformed_json_is_a_description_error() {
        let err = DialDescription::from_json(r#"{ "ticks": 3 }"#).unwrap_err();
        assert!(matches!(err, DialError::Description(_)));
        let err = DialDescription::from_json(r#"{ "hands": [] }"#).unwrap_err();
        assert!(matches!(err, DialError::Description(_)));
    }
}
