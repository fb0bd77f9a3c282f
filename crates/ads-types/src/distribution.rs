use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Visibility tier of a record.
///
/// Encoded on the wire as its numeric level. Peers sometimes send the level
/// as a string (`"1"`), which is accepted on input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "DistributionRepr", into = "u8")]
pub enum Distribution {
    /// Visible to the owning organization only.
    OrgOnly = 0,
    /// Visible to the local community.
    #[default]
    Community = 1,
    /// Visible to connected communities.
    ConnectedCommunities = 2,
    /// Visible to all communities.
    AllCommunities = 3,
    /// Scoped to a sharing group (`sharing_group_id` must be set).
    SharingGroup = 4,
}

impl Distribution {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Levels 1..=3: visible to anyone in the community, no group lookup needed.
    pub fn is_community_wide(&self) -> bool {
        matches!(
            self,
            Self::Community | Self::ConnectedCommunities | Self::AllCommunities
        )
    }

    pub fn is_sharing_group(&self) -> bool {
        matches!(self, Self::SharingGroup)
    }

    /// One-notch downgrade applied to pulled records:
    /// connected communities becomes community, community becomes org only.
    pub fn downgraded(self) -> Self {
        match self {
            Self::Community => Self::OrgOnly,
            Self::ConnectedCommunities => Self::Community,
            other => other,
        }
    }

    /// Outbound narrowing applied when pushing to a non-internal peer.
    pub fn narrowed(self) -> Self {
        match self {
            Self::ConnectedCommunities => Self::Community,
            other => other,
        }
    }
}

impl TryFrom<u8> for Distribution {
    type Error = TypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::OrgOnly),
            1 => Ok(Self::Community),
            2 => Ok(Self::ConnectedCommunities),
            3 => Ok(Self::AllCommunities),
            4 => Ok(Self::SharingGroup),
            other => Err(TypeError::InvalidDistribution(other.to_string())),
        }
    }
}

impl From<Distribution> for u8 {
    fn from(value: Distribution) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DistributionRepr {
    Level(u8),
    Text(String),
}

impl TryFrom<DistributionRepr> for Distribution {
    type Error = TypeError;

    fn try_from(value: DistributionRepr) -> Result<Self, Self::Error> {
        match value {
            DistributionRepr::Level(level) => Self::try_from(level),
            DistributionRepr::Text(text) => text
                .trim()
                .parse::<u8>()
                .map_err(|_| TypeError::InvalidDistribution(text.clone()))
                .and_then(Self::try_from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_downgrade_moves_one_notch() {
        assert_eq!(Distribution::ConnectedCommunities.downgraded(), Distribution::Community);
        assert_eq!(Distribution::Community.downgraded(), Distribution::OrgOnly);
        assert_eq!(Distribution::OrgOnly.downgraded(), Distribution::OrgOnly);
        assert_eq!(Distribution::AllCommunities.downgraded(), Distribution::AllCommunities);
        assert_eq!(Distribution::SharingGroup.downgraded(), Distribution::SharingGroup);
    }

    #[test]
    fn push_narrowing_only_touches_connected() {
        assert_eq!(Distribution::ConnectedCommunities.narrowed(), Distribution::Community);
        assert_eq!(Distribution::Community.narrowed(), Distribution::Community);
        assert_eq!(Distribution::SharingGroup.narrowed(), Distribution::SharingGroup);
    }

    #[test]
    fn community_wide_levels() {
        assert!(!Distribution::OrgOnly.is_community_wide());
        assert!(Distribution::AllCommunities.is_community_wide());
        assert!(!Distribution::SharingGroup.is_community_wide());
    }

    #[test]
    fn accepts_numeric_and_string_levels() {
        let d: Distribution = serde_json::from_str("2").unwrap();
        assert_eq!(d, Distribution::ConnectedCommunities);
        let d: Distribution = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(d, Distribution::SharingGroup);
        assert!(serde_json::from_str::<Distribution>("7").is_err());
        assert!(serde_json::from_str::<Distribution>("\"x\"").is_err());
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&Distribution::OrgOnly).unwrap(), "0");
    }
}
