use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::AtmError;

/// How the hidden part of an article is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OffsetType {
    Words,
    Paragraphs,
}

impl OffsetType {
    /// Value understood by the remote API.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Paragraphs => "elements",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Paragraphs => "paragraphs",
        }
    }
}

impl FromStr for OffsetType {
    type Err = AtmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "words" => Ok(Self::Words),
            "paragraphs" => Ok(Self::Paragraphs),
            other => Err(AtmError::InvalidInput(format!("unknown offset type '{other}'"))),
        }
    }
}

impl fmt::Display for OffsetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for OffsetType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// What a pledged payment threshold counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PledgedType {
    Transactions,
    PledgedCurrency,
}

impl PledgedType {
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Transactions => "count",
            Self::PledgedCurrency => "amount",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::PledgedCurrency => "pledged currency",
        }
    }
}

impl FromStr for PledgedType {
    type Err = AtmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "transactions" => Ok(Self::Transactions),
            "pledged currency" => Ok(Self::PledgedCurrency),
            other => Err(AtmError::InvalidInput(format!("unknown pledged type '{other}'"))),
        }
    }
}

impl fmt::Display for PledgedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PledgedType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// Identifiers returned after a property is created or updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyBuild {
    #[serde(rename = "BuildPath")]
    pub build_path: String,
    #[serde(rename = "Id")]
    pub id: String,
}

/// Input for property registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProperty {
    pub name: String,
    pub website: String,
    pub support_email: String,
    pub country: String,
}

/// Paywall, pricing and ad settings pushed as a property's `ConfigDefaults`.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyConfig {
    /// CSS selector of the article container.
    pub container: String,
    /// CSS selector of the elements to hide.
    pub selector: String,
    pub price: f64,
    /// Video URL offered by the related-video callback.
    pub ads_video: String,
    pub content_offset: u32,
    pub content_lock: String,
    pub revenue_method: String,
    pub payment_pledged: u32,
    pub offset_type: OffsetType,
    pub currency: String,
    pub pledged_type: PledgedType,
    /// Script source forwarded verbatim as the target modal `targetCb`.
    pub target_cb_js: String,
    /// Script source forwarded verbatim as the target modal `toggleCb`.
    pub toggle_cb_js: String,
}

/// Parameters of a content retrieval call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentQuery {
    pub content_id: String,
    pub property_id: String,
    pub scramble_strategy: String,
    pub offset_type: OffsetType,
    pub offset_element_selector: String,
    pub offset: u32,
}

/// Theme config lookup; at least one member must be set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThemeQuery {
    pub id: Option<String>,
    pub theme: Option<String>,
}

impl ThemeQuery {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            theme: None,
        }
    }

    pub fn by_theme(theme: impl Into<String>) -> Self {
        Self {
            id: None,
            theme: Some(theme.into()),
        }
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }
}
