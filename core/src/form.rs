//! `application/x-www-form-urlencoded` payloads and the parameter encoder.
//!
//! # Design
//! The remote service takes every write as a flat form and every filtered
//! read as a query string, so both are modelled as one ordered list of
//! string pairs. List parameters repeat their key once per element. The one
//! structured parameter, the video layout, travels as a JSON document in the
//! reserved `VideoLayout` field and is added only by `encode_params`, never
//! by a parameter type's own field list.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::layout::VideoLayout;

/// Form field carrying the JSON-encoded layout.
pub const VIDEO_LAYOUT_FIELD: &str = "VideoLayout";

/// Characters left as-is by form encoding, matching the WHATWG
/// urlencoded serializer.
const FORM_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// A request parameter object that can be flattened into a form.
pub trait FormParams {
    /// Append every declared field that is present, under its wire name.
    fn append_to(&self, form: &mut Form);

    /// Layout to send in the `VideoLayout` field, if the request has one.
    fn video_layout(&self) -> Option<&VideoLayout> {
        None
    }
}

/// Ordered key/value pairs of a form body or query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pairs: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.pairs.push((key.to_string(), value.into()));
    }

    /// Push `value` if present; absent values produce no field at all.
    pub fn push_opt<T: fmt::Display>(&mut self, key: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push(key, value.to_string());
        }
    }

    /// Push one pair per element.
    pub fn push_all<I, T>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        for value in values {
            self.push(key, value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, FORM_SAFE),
                    utf8_percent_encode(v, FORM_SAFE)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Parse an urlencoded body. `+` decodes to a space.
    pub fn parse(body: &str) -> Result<Self, ApiError> {
        let mut form = Self::new();
        for pair in body.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            form.pairs.push((decode_component(k)?, decode_component(v)?));
        }
        Ok(form)
    }
}

fn decode_component(raw: &str) -> Result<String, ApiError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ApiError::decoding(format!("form component {raw:?}: {e}")))
}

/// Flatten `params` into a form, adding the layout JSON under
/// `VideoLayout` when one is attached.
pub fn encode_params<P: FormParams + ?Sized>(params: &P) -> Result<Form, ApiError> {
    let layout = params.video_layout().map(layout_json).transpose()?;
    let mut form = Form::new();
    params.append_to(&mut form);
    if let Some(layout) = layout {
        form.push(VIDEO_LAYOUT_FIELD, layout);
    }
    Ok(form)
}

/// Render `layout` as `{"<region name>": {<properties>}, ...}`.
pub fn layout_json(layout: &VideoLayout) -> Result<String, ApiError> {
    let mut regions = Map::new();
    for region in layout.regions() {
        if region.name.is_empty() {
            return Err(ApiError::validation("every layout region needs a name"));
        }
        let properties = serde_json::to_value(&region.properties)
            .map_err(|e| ApiError::encoding(format!("region {:?}: {e}", region.name)))?;
        regions.insert(region.name.clone(), properties);
    }
    serde_json::to_string(&Value::Object(regions)).map_err(|e| ApiError::encoding(e.to_string()))
}
