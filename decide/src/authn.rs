use crate::*;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Voter,
}

/// An authenticated caller, as vouched for by whatever sits in front of the service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn admin(name: &str) -> Self {
        Actor {
            name: name.to_owned(),
            role: Role::Admin,
        }
    }

    pub fn voter(name: &str) -> Self {
        Actor {
            name: name.to_owned(),
            role: Role::Voter,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `PermissionDenied` unless this actor is an admin.
    pub fn require_admin(&self, operation: &str) -> Result<(), Error> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!(
                "{} requires an administrator, {} is not one",
                operation, self.name
            )))
        }
    }
}
