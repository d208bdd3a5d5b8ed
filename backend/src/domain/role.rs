//! Role data model.
//!
//! Roles are named permission groupings attached to users. Names are unique
//! across the store and compared case-sensitively.

use std::fmt;

/// Name of the role held by kitchen staff.
pub const CHEF_ROLE: &str = "chef";
/// Name of the role held by visitors.
pub const GUEST_ROLE: &str = "guest";

const CHEF_DESCRIPTION: &str = "Chef in the kitchen.";
const GUEST_DESCRIPTION: &str = "Visitor.";

/// Maximum allowed length for a role name.
pub const ROLE_NAME_MAX: usize = 80;
/// Maximum allowed length for a role description.
pub const ROLE_DESCRIPTION_MAX: usize = 255;

/// Validation errors returned by role constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleValidationError {
    EmptyName,
    NameHasSurroundingWhitespace,
    NameTooLong { max: usize },
    DescriptionTooLong { max: usize },
}

impl fmt::Display for RoleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "role name must not be empty"),
            Self::NameHasSurroundingWhitespace => {
                write!(f, "role name must not start or end with whitespace")
            }
            Self::NameTooLong { max } => write!(f, "role name must be at most {max} characters"),
            Self::DescriptionTooLong { max } => {
                write!(f, "role description must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for RoleValidationError {}

/// Store-assigned role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleId(i32);

impl RoleId {
    /// Wrap a raw identifier read from storage.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw identifier for storage adapters.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique role name.
///
/// ## Invariants
/// - non-empty, at most [`ROLE_NAME_MAX`] characters;
/// - no leading or trailing whitespace, so lookups stay exact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleName(String);

impl RoleName {
    /// Validate and construct a [`RoleName`].
    pub fn new(name: impl Into<String>) -> Result<Self, RoleValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RoleValidationError::EmptyName);
        }
        if name.trim() != name {
            return Err(RoleValidationError::NameHasSurroundingWhitespace);
        }
        if name.chars().count() > ROLE_NAME_MAX {
            return Err(RoleValidationError::NameTooLong { max: ROLE_NAME_MAX });
        }
        Ok(Self(name))
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    name: RoleName,
    description: String,
}

impl Role {
    /// Assemble a role from its stored parts.
    pub fn new(id: RoleId, name: RoleName, description: impl Into<String>) -> Self {
        Self {
            id,
            name,
            description: description.into(),
        }
    }

    pub fn id(&self) -> RoleId {
        self.id
    }

    pub fn name(&self) -> &RoleName {
        &self.name
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }
}

/// A role waiting to be written by the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    name: RoleName,
    description: String,
}

impl NewRole {
    /// Validate raw inputs into a pending role.
    pub fn try_new(name: &str, description: &str) -> Result<Self, RoleValidationError> {
        let name = RoleName::new(name)?;
        if description.chars().count() > ROLE_DESCRIPTION_MAX {
            return Err(RoleValidationError::DescriptionTooLong {
                max: ROLE_DESCRIPTION_MAX,
            });
        }
        Ok(Self {
            name,
            description: description.to_owned(),
        })
    }

    /// The `chef` baseline role.
    pub fn chef() -> Self {
        Self::baseline(CHEF_ROLE, CHEF_DESCRIPTION)
    }

    /// The `guest` baseline role.
    pub fn guest() -> Self {
        Self::baseline(GUEST_ROLE, GUEST_DESCRIPTION)
    }

    fn baseline(name: &str, description: &str) -> Self {
        Self {
            name: RoleName(name.to_owned()),
            description: description.to_owned(),
        }
    }

    pub fn name(&self) -> &RoleName {
        &self.name
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Attach the store-assigned id once the role is written.
    pub fn into_role(self, id: RoleId) -> Role {
        Role::new(id, self.name, self.description)
    }
}

/// Roles that must exist before the service accepts traffic.
pub fn baseline_roles() -> [NewRole; 2] {
    [NewRole::chef(), NewRole::guest()]
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", RoleValidationError::EmptyName)]
    #[case("   ", RoleValidationError::EmptyName)]
    #[case(" chef", RoleValidationError::NameHasSurroundingWhitespace)]
    #[case("guest\n", RoleValidationError::NameHasSurroundingWhitespace)]
    fn invalid_role_names(#[case] raw: &str, #[case] expected: RoleValidationError) {
        let err = RoleName::new(raw).expect_err("invalid role name must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn role_name_length_is_capped() {
        let long = "r".repeat(ROLE_NAME_MAX + 1);
        let err = RoleName::new(long).expect_err("overlong name must fail");
        assert_eq!(err, RoleValidationError::NameTooLong { max: ROLE_NAME_MAX });
        assert!(RoleName::new("r".repeat(ROLE_NAME_MAX)).is_ok());
    }

    #[rstest]
    fn role_names_are_case_sensitive() {
        let lower = RoleName::new("guest").expect("valid name");
        let upper = RoleName::new("Guest").expect("valid name");
        assert_ne!(lower, upper);
    }

    #[rstest]
    fn description_length_is_capped() {
        let long = "d".repeat(ROLE_DESCRIPTION_MAX + 1);
        let err = NewRole::try_new("baker", &long).expect_err("overlong description");
        assert_eq!(
            err,
            RoleValidationError::DescriptionTooLong {
                max: ROLE_DESCRIPTION_MAX
            }
        );
    }

    #[rstest]
    fn baseline_roles_are_chef_then_guest() {
        let [chef, guest] = baseline_roles();
        assert_eq!(chef.name().as_str(), CHEF_ROLE);
        assert_eq!(chef.description(), "Chef in the kitchen.");
        assert_eq!(guest.name().as_str(), GUEST_ROLE);
        assert_eq!(guest.description(), "Visitor.");
    }

    #[rstest]
    fn into_role_keeps_name_and_description() {
        let role = NewRole::try_new("baker", "Bakes bread.")
            .expect("valid role")
            .into_role(RoleId::new(7));
        assert_eq!(role.id(), RoleId::new(7));
        assert_eq!(role.name().as_str(), "baker");
        assert_eq!(role.description(), "Bakes bread.");
    }
}
