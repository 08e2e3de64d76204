use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roles that own an inbox and submit leave applications.
///
/// Admins act on the store but hold no inbox or submitter list of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

/// Error for role strings arriving over the HTTP surface.
#[derive(Debug, thiserror::Error)]
#[error("unknown role '{0}', expected 'teacher' or 'student'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_labels_round_trip() {
        for role in [Role::Teacher, Role::Student] {
            assert_eq!(role.label().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }
}
