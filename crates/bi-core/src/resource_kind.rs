use crate::{CoreError, CoreResult};

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Kinds of platform resources the engine knows about.
///
/// Ordering follows the dependency direction: a dashboard embeds charts, a chart
/// reads one dataset, a dataset lives in one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Dashboard,
    Chart,
    Dataset,
    Database,
}

impl ResourceKind {
    /// Order in which deletions are issued.
    pub const DELETE_ORDER: [ResourceKind; 4] = [
        ResourceKind::Dashboard,
        ResourceKind::Chart,
        ResourceKind::Dataset,
        ResourceKind::Database,
    ];

    /// Kinds reachable from a dashboard selection.
    pub const CASCADE_KINDS: [ResourceKind; 3] = [
        ResourceKind::Chart,
        ResourceKind::Dataset,
        ResourceKind::Database,
    ];

    /// API path segment (`/api/v1/<kind>/`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Chart => "chart",
            Self::Dataset => "dataset",
            Self::Database => "database",
        }
    }

    /// Directory name inside an export bundle
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboards",
            Self::Chart => "charts",
            Self::Dataset => "datasets",
            Self::Database => "databases",
        }
    }

    /// Heading used in operator output
    pub fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboards",
            Self::Chart => "Charts",
            Self::Dataset => "Datasets",
            Self::Database => "Databases",
        }
    }

    /// Fields holding the display name, most specific first.
    pub fn name_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Dashboard => &["dashboard_title", "title"],
            Self::Chart => &["slice_name", "name"],
            Self::Dataset => &["table_name", "name"],
            Self::Database => &["database_name", "name"],
        }
    }

    /// The kind one level up the cascade; dashboards have none.
    pub fn broader(&self) -> Option<ResourceKind> {
        match self {
            Self::Dashboard => None,
            Self::Chart => Some(Self::Dashboard),
            Self::Dataset => Some(Self::Chart),
            Self::Database => Some(Self::Dataset),
        }
    }

    /// Classify a bundle path that already had its root directory removed.
    pub fn from_bundle_path(relative: &str) -> Option<ResourceKind> {
        Self::DELETE_ORDER.into_iter().find(|kind| {
            relative
                .strip_prefix(kind.plural())
                .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "dashboard" => Ok(Self::Dashboard),
            "chart" => Ok(Self::Chart),
            "dataset" => Ok(Self::Dataset),
            "database" => Ok(Self::Database),
            _ => Err(CoreError::InvalidResourceKind {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
