use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Capability tag checked by the authorization stage.
///
/// Wire form is `<resource>:<action>` (e.g. `"user:read"`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "user:read")]
    UserRead,
    #[serde(rename = "user:write")]
    UserWrite,
    #[serde(rename = "user:delete")]
    UserDelete,
    #[serde(rename = "admin:read")]
    AdminRead,
    #[serde(rename = "admin:write")]
    AdminWrite,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::UserRead,
        Permission::UserWrite,
        Permission::UserDelete,
        Permission::AdminRead,
        Permission::AdminWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UserRead => "user:read",
            Permission::UserWrite => "user:write",
            Permission::UserDelete => "user:delete",
            Permission::AdminRead => "admin:read",
            Permission::AdminWrite => "admin:write",
        }
    }

    /// Resource half of the tag (`"user"` for `user:read`).
    pub fn category(&self) -> &'static str {
        self.as_str().split(':').next().unwrap_or_default()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
            assert_eq!(
                serde_json::to_string(&p).unwrap(),
                format!("\"{}\"", p.as_str())
            );
        }
    }

    #[test]
    fn category_is_the_resource_prefix() {
        assert_eq!(Permission::UserDelete.category(), "user");
        assert_eq!(Permission::AdminWrite.category(), "admin");
    }

    #[test]
    fn rejects_unknown_tags() {
        assert!("*".parse::<Permission>().is_err());
        assert!("user.read".parse::<Permission>().is_err());
    }
}
