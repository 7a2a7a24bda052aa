//! Catalog Models
//!
//! Product records served by the remote catalog.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, ExternalId};

/// Width applied to catalog thumbnails by the image CDN
pub const THUMBNAIL_WIDTH: u32 = 320;

/// Physical unit of a product's dimensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeUnit {
    Centimeter,
    Meter,
}

impl SizeUnit {
    /// Parses the catalog's unit flag; anything but "Centimeter" means meters
    pub fn from_flag(flag: &str) -> Self {
        if flag == "Centimeter" {
            SizeUnit::Centimeter
        } else {
            SizeUnit::Meter
        }
    }

    /// Short display suffix
    pub fn suffix(&self) -> &'static str {
        match self {
            SizeUnit::Centimeter => "cm",
            SizeUnit::Meter => "m",
        }
    }
}

/// Product dimension as sent by the catalog: a number or a numeric string
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Number(f64),
    Text(String),
}

impl Dimension {
    /// Numeric value, reading the leading number of a string like "100" or "100cm"
    pub fn value(&self) -> CoreResult<f64> {
        let value = match self {
            Dimension::Number(n) => *n,
            Dimension::Text(text) => parse_leading_number(text).ok_or_else(|| {
                CoreError::CatalogError(format!("Dimension is not numeric: {:?}", text))
            })?,
        };

        if !value.is_finite() || value <= 0.0 {
            return Err(CoreError::CatalogError(format!(
                "Dimension must be positive, got {}",
                value
            )));
        }
        Ok(value)
    }

    fn display(&self) -> String {
        match self {
            Dimension::Number(n) => n.to_string(),
            Dimension::Text(text) => text.clone(),
        }
    }
}

fn parse_leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// External product record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ExternalId,
    pub name: String,
    /// Primary product image
    #[serde(default)]
    pub image1: String,
    pub max_width: Dimension,
    pub max_height: Dimension,
    /// Unit flag, "Centimeter" or anything else for meters
    #[serde(default)]
    pub size: String,
}

impl Product {
    /// Unit of the product dimensions
    pub fn unit(&self) -> SizeUnit {
        SizeUnit::from_flag(&self.size)
    }

    /// Width and height as numbers
    pub fn dimensions(&self) -> CoreResult<(f64, f64)> {
        Ok((self.max_width.value()?, self.max_height.value()?))
    }

    /// Display label such as "100cm × 50cm"
    pub fn dimensions_label(&self) -> String {
        let unit = self.unit().suffix();
        format!(
            "{}{unit} × {}{unit}",
            self.max_width.display(),
            self.max_height.display()
        )
    }

    /// Resized thumbnail URL of the primary image
    pub fn thumbnail_url(&self) -> String {
        format!("{}?tr=w-{}", self.image1, THUMBNAIL_WIDTH)
    }
}
