//! Video layouts: named regions placed on a composition's canvas.
//!
//! # Design
//! A `VideoLayout` is built once per outgoing request from a resolution
//! string, filled with regions, and handed to a parameter object. The
//! remote service silently ignores a layout that does not fit the
//! composition's resolution, so the layout remembers the parsed dimensions
//! and `try_add_*` checks every region's geometry against them locally.
//!
//! Responses echo the layout as a bare JSON object of region name to
//! properties, without a resolution. `VideoLayout::from_response` rebuilds a
//! layout from that object through the `FIELDS` table, one setter per wire
//! name.
//!
//! All numeric bounds live in `LIMITS`.

use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Numeric bounds enforced by the remote service on layouts.
#[derive(Debug, Clone)]
pub struct LayoutLimits {
    /// Allowed width and height of a composition, in pixels.
    pub dimension: RangeInclusive<i64>,
    /// Maximum `width * height` of a composition.
    pub max_area: i64,
    /// Resolution the service assumes when a request does not name one.
    pub default_resolution: &'static str,
    /// Smallest width or height of a region.
    pub region_min_size: i64,
    pub z_pos: RangeInclusive<i64>,
    /// Allowed `max_columns` and `max_rows`.
    pub grid: RangeInclusive<i64>,
    pub cell_index: RangeInclusive<i64>,
}

pub const LIMITS: LayoutLimits = LayoutLimits {
    dimension: 16..=1280,
    max_area: 921_600,
    default_resolution: "640x480",
    region_min_size: 16,
    z_pos: -99..=99,
    grid: 1..=1000,
    cell_index: 0..=999_999,
};

/// How a region's grid cells are reused once occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reuse {
    /// Used cells are never reused.
    #[serde(rename = "none")]
    Never,
    /// A cell is reused only once the source it contains ends.
    #[serde(rename = "show_oldest")]
    ShowOldest,
    /// A cell is reused even if its source has not ended.
    #[serde(rename = "show_newest")]
    ShowNewest,
}

impl Reuse {
    pub fn as_str(self) -> &'static str {
        match self {
            Reuse::Never => "none",
            Reuse::ShowOldest => "show_oldest",
            Reuse::ShowNewest => "show_newest",
        }
    }
}

impl fmt::Display for Reuse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reuse {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Reuse::Never),
            "show_oldest" => Ok(Reuse::ShowOldest),
            "show_newest" => Ok(Reuse::ShowNewest),
            other => Err(ApiError::validation(format!(
                "reuse must be one of none, show_oldest, show_newest (got {other:?})"
            ))),
        }
    }
}

/// Placement attributes of one region. Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProperties {
    /// X offset of the upper left corner relative to the canvas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_pos: Option<u16>,
    /// Y offset of the upper left corner relative to the canvas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_pos: Option<u16>,
    /// Stacking order; higher values are drawn on top.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_pos: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_columns: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u16>,
    /// Grid cells (row-major, starting at 0) that never receive a source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells_excluded: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reuse: Option<Reuse>,
    /// Track names, track SIDs, participant SIDs or wildcard patterns such as
    /// `student*`. Must not be empty.
    #[serde(default)]
    pub video_sources: Vec<String>,
    /// Sources removed from the `video_sources` match set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub video_sources_excluded: Vec<String>,
}

impl RegionProperties {
    pub fn with_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            video_sources: sources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub properties: RegionProperties,
}

impl Region {
    pub fn new(name: impl Into<String>, properties: RegionProperties) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoLayout {
    resolution: String,
    resolution_width: u16,
    resolution_height: u16,
    regions: Vec<Region>,
}

impl VideoLayout {
    /// Create an empty layout for a composition of `resolution`
    /// (`"<width>x<height>"`).
    pub fn new(resolution: &str) -> Result<Self, ApiError> {
        let (width, height) = parse_resolution(resolution)?;
        Ok(Self {
            resolution: resolution.to_string(),
            resolution_width: width,
            resolution_height: height,
            regions: Vec::new(),
        })
    }

    /// Rebuild a layout from the `video_layout` object of a decoded response.
    ///
    /// The response does not carry a resolution, so the result has an empty
    /// resolution and no geometry validation takes place. Unknown property
    /// keys are skipped.
    pub fn from_response(layout: &Map<String, Value>) -> Result<Self, ApiError> {
        let mut regions = Vec::with_capacity(layout.len());
        for (name, value) in layout {
            let object = value.as_object().ok_or_else(|| {
                ApiError::decoding(format!("region {name:?}: expected an object"))
            })?;
            let mut properties = RegionProperties::default();
            for (key, field) in object {
                let Some((_, set)) = FIELDS.iter().find(|(wire, _)| wire == key) else {
                    continue;
                };
                set(&mut properties, field).map_err(|msg| {
                    ApiError::decoding(format!("region {name:?}, field {key}: {msg}"))
                })?;
            }
            regions.push(Region::new(name.clone(), properties));
        }
        Ok(Self {
            regions,
            ..Self::default()
        })
    }

    pub fn resolution(&self) -> &str {
        &self.resolution
    }

    pub fn resolution_width(&self) -> u16 {
        self.resolution_width
    }

    pub fn resolution_height(&self) -> u16 {
        self.resolution_height
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Append a region without geometry checks.
    pub fn add_region(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub fn add_regions<I>(&mut self, regions: I)
    where
        I: IntoIterator<Item = Region>,
    {
        self.regions.extend(regions);
    }

    /// Validate `region` against this layout's resolution, then append it.
    pub fn try_add_region(&mut self, region: Region) -> Result<(), ApiError> {
        self.try_add_regions([region])
    }

    /// Validate every region, then append them all. If any region fails,
    /// the layout is left untouched.
    pub fn try_add_regions<I>(&mut self, regions: I) -> Result<(), ApiError>
    where
        I: IntoIterator<Item = Region>,
    {
        let batch: Vec<Region> = regions.into_iter().collect();
        let mut names: HashSet<&str> = self.regions.iter().map(|r| r.name.as_str()).collect();
        for region in &batch {
            self.check_region(region)?;
            if !names.insert(region.name.as_str()) {
                return Err(ApiError::validation(format!(
                    "region {:?}: name is already used in this layout",
                    region.name
                )));
            }
        }
        self.regions.extend(batch);
        Ok(())
    }

    fn check_region(&self, region: &Region) -> Result<(), ApiError> {
        let name = region.name.as_str();
        if name.is_empty() {
            return Err(ApiError::validation("region name must not be empty"));
        }
        let props = &region.properties;
        let fail = |what: String| ApiError::validation(format!("region {name:?}: {what}"));

        if let Some(z) = props.z_pos {
            if !LIMITS.z_pos.contains(&i64::from(z)) {
                return Err(fail(format!("z_pos {z} outside {:?}", LIMITS.z_pos)));
            }
        }

        if let Some(width) = props.width {
            let bounds = self.size_bounds(self.resolution_width, props.x_pos);
            if !bounds.contains(&i64::from(width)) {
                return Err(fail(format!("width {width} outside {bounds:?}")));
            }
        }

        if let Some(height) = props.height {
            let bounds = self.size_bounds(self.resolution_height, props.y_pos);
            if !bounds.contains(&i64::from(height)) {
                return Err(fail(format!("height {height} outside {bounds:?}")));
            }
        }

        for (field, value) in [("max_columns", props.max_columns), ("max_rows", props.max_rows)] {
            if let Some(v) = value {
                if !LIMITS.grid.contains(&i64::from(v)) {
                    return Err(fail(format!("{field} {v} outside {:?}", LIMITS.grid)));
                }
            }
        }

        if let Some(cell) = props
            .cells_excluded
            .iter()
            .find(|c| !LIMITS.cell_index.contains(&i64::from(**c)))
        {
            return Err(fail(format!(
                "cells_excluded entry {cell} outside {:?}",
                LIMITS.cell_index
            )));
        }

        if props.video_sources.is_empty() {
            return Err(fail("video_sources must list at least one source".to_string()));
        }
        Ok(())
    }

    /// `[min region size, canvas extent - offset]`. Empty when the offset
    /// leaves less than the minimum size.
    fn size_bounds(&self, extent: u16, offset: Option<u16>) -> RangeInclusive<i64> {
        let upper = i64::from(extent) - i64::from(offset.unwrap_or(0));
        LIMITS.region_min_size..=upper
    }
}

/// Parse and bound-check `"<width>x<height>"`.
pub fn parse_resolution(resolution: &str) -> Result<(u16, u16), ApiError> {
    let invalid = || ApiError::validation(format!("invalid resolution {resolution:?}"));
    let (w, h) = resolution.split_once('x').ok_or_else(invalid)?;
    let parse = |s: &str| -> Option<i64> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };
    let (width, height) = match (parse(w), parse(h)) {
        (Some(width), Some(height)) => (width, height),
        _ => return Err(invalid()),
    };
    if !LIMITS.dimension.contains(&width) || !LIMITS.dimension.contains(&height) {
        return Err(invalid());
    }
    if width * height > LIMITS.max_area {
        return Err(invalid());
    }
    let width = u16::try_from(width).map_err(|_| invalid())?;
    let height = u16::try_from(height).map_err(|_| invalid())?;
    Ok((width, height))
}

type Setter = fn(&mut RegionProperties, &Value) -> Result<(), String>;

/// Wire name to setter, one entry per `RegionProperties` field.
static FIELDS: &[(&str, Setter)] = &[
    ("x_pos", |p, v| integer(v).map(|n| p.x_pos = Some(n))),
    ("y_pos", |p, v| integer(v).map(|n| p.y_pos = Some(n))),
    ("z_pos", |p, v| integer(v).map(|n| p.z_pos = Some(n))),
    ("width", |p, v| integer(v).map(|n| p.width = Some(n))),
    ("height", |p, v| integer(v).map(|n| p.height = Some(n))),
    ("max_columns", |p, v| integer(v).map(|n| p.max_columns = Some(n))),
    ("max_rows", |p, v| integer(v).map(|n| p.max_rows = Some(n))),
    ("cells_excluded", |p, v| list(v, integer).map(|l| p.cells_excluded = l)),
    ("reuse", |p, v| {
        let s = string(v)?;
        let reuse = s.parse::<Reuse>().map_err(|e| e.to_string())?;
        p.reuse = Some(reuse);
        Ok(())
    }),
    ("video_sources", |p, v| list(v, string).map(|l| p.video_sources = l)),
    ("video_sources_excluded", |p, v| {
        list(v, string).map(|l| p.video_sources_excluded = l)
    }),
];

fn integer<T: TryFrom<i64>>(value: &Value) -> Result<T, String> {
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    };
    let n = n.ok_or_else(|| format!("expected an integer, got {value}"))?;
    T::try_from(n).map_err(|_| format!("{n} is out of range"))
}

fn string(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("expected a string, got {value}"))
}

fn list<T>(value: &Value, item: fn(&Value) -> Result<T, String>) -> Result<Vec<T>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("expected an array, got {value}"))?
        .iter()
        .map(item)
        .collect()
}
