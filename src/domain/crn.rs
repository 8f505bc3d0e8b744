// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Resource Name (CRN) Value Object
//!
//! A CRN is a colon-delimited global resource identifier:
//!
//! ```text
//! crn:v1:bluemix:public:kms:us-south:a/0123abcd:e6a1b2c3-...:key:9f8e7d6c-...
//!  0   1    2      3     4     5        6            7        8       9
//!                              │                     │
//!                        region (len - 5)      guid (len - 3)
//! ```
//!
//! GUID and region are located by offset from the END of the segment list,
//! so instance CRNs (which end in `::`) and key CRNs resolve the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// CRN parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CrnError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier `{identifier}` has {found} segments, at least {required} are required")]
    TooFewSegments {
        identifier: String,
        found: usize,
        required: usize,
    },
}

/// Colon-delimited resource identifier with at least five segments
///
/// # Examples
///
/// ```rust
/// use search_cluster_infrastructure::domain::Crn;
///
/// let crn = Crn::parse("crn:v1:bluemix:public:kms:us-south:a/acct:guid-1::").unwrap();
/// assert_eq!(crn.guid(), "guid-1");
/// assert_eq!(crn.region(), "us-south");
///
/// assert!(Crn::parse("a:b:c").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crn(String);

impl Crn {
    /// Field delimiter
    pub const DELIMITER: char = ':';

    /// Offset of the GUID counted from the end
    pub const GUID_OFFSET: usize = 3;

    /// Offset of the region counted from the end
    pub const REGION_OFFSET: usize = 5;

    /// Fewest segments that still carry both offsets
    pub const MIN_SEGMENTS: usize = Self::REGION_OFFSET;

    pub fn parse(identifier: impl Into<String>) -> Result<Self, CrnError> {
        let identifier = identifier.into();

        if identifier.is_empty() {
            return Err(CrnError::Empty);
        }

        let found = identifier.split(Self::DELIMITER).count();
        if found < Self::MIN_SEGMENTS {
            return Err(CrnError::TooFewSegments {
                identifier,
                found,
                required: Self::MIN_SEGMENTS,
            });
        }

        Ok(Self(identifier))
    }

    fn segments(&self) -> Vec<&str> {
        self.0.split(Self::DELIMITER).collect()
    }

    fn from_end(&self, offset: usize) -> &str {
        let segments = self.segments();
        // parse() guarantees len >= MIN_SEGMENTS >= offset
        segments[segments.len() - offset]
    }

    /// Service instance GUID (third segment from the end)
    pub fn guid(&self) -> &str {
        self.from_end(Self::GUID_OFFSET)
    }

    /// Region (fifth segment from the end)
    pub fn region(&self) -> &str {
        self.from_end(Self::REGION_OFFSET)
    }

    /// Resource type (second segment from the end), `None` when blank
    pub fn resource_type(&self) -> Option<&str> {
        Some(self.from_end(2)).filter(|s| !s.is_empty())
    }

    /// Service name of a full `crn:v1:...` identifier
    pub fn service_name(&self) -> Option<&str> {
        let segments = self.segments();
        if segments.first() != Some(&"crn") {
            return None;
        }
        segments.get(4).copied().filter(|s| !s.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Crn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Crn {
    type Error = CrnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Crn> for String {
    fn from(crn: Crn) -> Self {
        crn.0
    }
}
