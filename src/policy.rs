//! Access policy: which requester tier may use which class of endpoint.
//!
//! The whole policy is the single table in [`decide`]. Handlers name their
//! [`EndpointClass`] and go through `Requester::authorize`, which consults
//! the table once per request.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    /// Account creation and login.
    Register,
    /// Password-reset request and confirm.
    PasswordReset,
    /// Read-only listing of public resources.
    PublicRead,
    /// Create, update, delete of public resources.
    PublicWrite,
    QuizAuthoring,
    /// Listing, editing and deleting other accounts.
    UserAdmin,
    /// The requester's own profile, bookmarks and results.
    PrivateData,
}

impl EndpointClass {
    pub const ALL: [EndpointClass; 7] = [
        EndpointClass::Register,
        EndpointClass::PasswordReset,
        EndpointClass::PublicRead,
        EndpointClass::PublicWrite,
        EndpointClass::QuizAuthoring,
        EndpointClass::UserAdmin,
        EndpointClass::PrivateData,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Anonymous,
    Member,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Allowed, but only over rows owned by the requester.
    Scoped,
    Deny,
}

/// Row filter handed to the data-access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Any,
    Owner(Uuid),
}

impl Scope {
    /// The owner id to filter on, or `None` for unrestricted access.
    pub fn owner(&self) -> Option<Uuid> {
        match self {
            Scope::Any => None,
            Scope::Owner(id) => Some(*id),
        }
    }
}

pub const fn decide(class: EndpointClass, tier: Tier) -> Decision {
    use Decision::{Allow, Deny, Scoped};

    //                                          Anonymous Member  Admin
    #[rustfmt::skip]
    let row = match class {
        EndpointClass::Register =>             [Allow,    Allow,  Allow],
        EndpointClass::PasswordReset =>        [Allow,    Allow,  Allow],
        EndpointClass::PublicRead =>           [Allow,    Allow,  Allow],
        EndpointClass::PublicWrite =>          [Deny,     Scoped, Allow],
        EndpointClass::QuizAuthoring =>        [Deny,     Deny,   Allow],
        EndpointClass::UserAdmin =>            [Deny,     Deny,   Allow],
        EndpointClass::PrivateData =>          [Deny,     Scoped, Allow],
    };

    match tier {
        Tier::Anonymous => row[0],
        Tier::Member => row[1],
        Tier::Admin => row[2],
    }
}
