//! Repository visibility tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Visibility tier of a repository.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "repository_access", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Anyone, including anonymous callers.
    #[default]
    Public,
    /// Only the owner.
    Private,
    /// The owner and the members of the allow-list.
    #[serde(rename = "private-group")]
    #[sqlx(rename = "private-group")]
    PrivateGroup,
}

impl Access {
    /// Return the tier as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::PrivateGroup => "private-group",
        }
    }

    /// Whether the allow-list is meaningful for this tier.
    pub fn uses_allow_list(&self) -> bool {
        matches!(self, Self::PrivateGroup)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Access {
    type Err = devhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "private-group" => Ok(Self::PrivateGroup),
            _ => Err(devhub_core::AppError::bad_request(format!(
                "Invalid access '{s}'. Expected one of: public, private, private-group"
            ))),
        }
    }
}

/// The access-relevant projection of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RepositoryAccess {
    /// Owner of the repository.
    pub owner_id: Uuid,
    /// Visibility tier.
    pub access: Access,
    /// Allow-list for the group tier.
    pub custom_access: Vec<Uuid>,
}

impl RepositoryAccess {
    /// Decide whether `principal` may read the repository.
    ///
    /// `private` is strictly owner-only; the allow-list only applies to
    /// `private-group`.
    pub fn admits(&self, principal: Option<Uuid>) -> bool {
        match (self.access, principal) {
            (Access::Public, _) => true,
            (_, None) => false,
            (Access::Private, Some(user)) => user == self.owner_id,
            (Access::PrivateGroup, Some(user)) => {
                user == self.owner_id || self.custom_access.contains(&user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(owner: Uuid, members: Vec<Uuid>) -> RepositoryAccess {
        RepositoryAccess {
            owner_id: owner,
            access: Access::PrivateGroup,
            custom_access: members,
        }
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("private-group".parse::<Access>().unwrap(), Access::PrivateGroup);
        assert_eq!(Access::PrivateGroup.to_string(), "private-group");
        assert!("secret".parse::<Access>().is_err());
    }

    #[test]
    fn test_serde_uses_hyphenated_group_tier() {
        let json = serde_json::to_string(&Access::PrivateGroup).unwrap();
        assert_eq!(json, "\"private-group\"");
        let back: Access = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(back, Access::Private);
    }

    #[test]
    fn test_group_tier_admits_owner_and_members_only() {
        let (owner, u1, u2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let access = group(owner, vec![u1]);

        assert!(access.admits(Some(owner)));
        assert!(access.admits(Some(u1)));
        assert!(!access.admits(Some(u2)));
        assert!(!access.admits(None));
    }

    #[test]
    fn test_private_ignores_allow_list() {
        let (owner, member) = (Uuid::new_v4(), Uuid::new_v4());
        let access = RepositoryAccess {
            owner_id: owner,
            access: Access::Private,
            custom_access: vec![member],
        };

        assert!(access.admits(Some(owner)));
        assert!(!access.admits(Some(member)));
    }

    #[test]
    fn test_public_admits_anonymous() {
        let access = RepositoryAccess {
            owner_id: Uuid::new_v4(),
            access: Access::Public,
            custom_access: Vec::new(),
        };
        assert!(access.admits(None));
    }
}
