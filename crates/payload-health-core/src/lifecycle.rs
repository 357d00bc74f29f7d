//! Supported minor range from product life-cycle data.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{HealthError, HealthResult, MinorRange};

/// Version type the life-cycle API uses for unsupported releases.
pub const END_OF_LIFE: &str = "End of life";

/// Top-level life-cycle API response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLifeCycleResponse {
    #[serde(default)]
    pub data: Vec<ProductLifeCycle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLifeCycle {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<ProductLifeCycleVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLifeCycleVersion {
    /// `4.<minor>`
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Oldest and newest supported minor of the single product in `response`.
///
/// End-of-life versions and names that are not `4.<int>` are skipped. `source`
/// only labels errors.
pub fn supported_range(response: &ProductLifeCycleResponse, source: &str) -> HealthResult<MinorRange> {
    let [product] = response.data.as_slice() else {
        return Err(HealthError::decode(
            source,
            format!(
                "life-cycle data contains {} products, but should only contain 1",
                response.data.len()
            ),
        ));
    };

    let mut bounds: Option<(u32, u32)> = None;
    for version in &product.versions {
        if version.kind == END_OF_LIFE {
            continue;
        }
        let Some((major, minor)) = version.name.split_once('.') else {
            debug!(version = %version.name, "expected one period when parsing a minor version");
            continue;
        };
        if major != "4" {
            debug!(version = %version.name, "expected major version 4");
            continue;
        }
        let minor: u32 = match minor.parse() {
            Ok(m) => m,
            Err(e) => {
                debug!(version = %version.name, "expected integer minor version: {}", e);
                continue;
            }
        };
        bounds = Some(match bounds {
            None => (minor, minor),
            Some((lo, hi)) => (lo.min(minor), hi.max(minor)),
        });
    }

    let (oldest, newest) = bounds.ok_or_else(|| {
        HealthError::decode(
            source,
            format!("life-cycle data contains no supported releases for {}", product.name),
        )
    })?;
    MinorRange::new(oldest, newest)
}
