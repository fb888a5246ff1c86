//! Keystone password-grant request and token response.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Whether the facade currently holds a token it believes to be valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    /// No token, or the last one was rejected.
    Unauthenticated,
    /// Holding a token from a successful `authorize()`.
    Authenticated,
}

/// Body of `POST /v3/auth/tokens` for the password method.
#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    auth: Auth<'a>,
}

#[derive(Debug, Serialize)]
struct Auth<'a> {
    identity: Identity<'a>,
    scope: Scope<'a>,
}

#[derive(Debug, Serialize)]
struct Identity<'a> {
    methods: [&'static str; 1],
    password: PasswordMethod<'a>,
}

#[derive(Debug, Serialize)]
struct PasswordMethod<'a> {
    user: User<'a>,
}

#[derive(Debug, Serialize)]
struct User<'a> {
    name: &'a str,
    password: &'a str,
    domain: IdRef<'a>,
}

/// A `{"id": ...}` reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdRef<'a> {
    /// Referenced id.
    pub id: &'a str,
}

/// Authorization scope of the requested token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scope<'a> {
    /// Scoped to one project.
    Project {
        /// The project the token is scoped to.
        project: IdRef<'a>,
    },
    /// Serialized as the string `"unscoped"`.
    Unscoped(&'static str),
}

impl<'a> Scope<'a> {
    /// Project scope when `project_id` is set, unscoped otherwise.
    pub fn for_project(project_id: Option<&'a str>) -> Self {
        match project_id {
            Some(id) => Scope::Project {
                project: IdRef { id },
            },
            None => Scope::Unscoped("unscoped"),
        }
    }
}

impl<'a> AuthRequest<'a> {
    /// Password grant for a user of `domain_id`.
    pub fn password(username: &'a str, password: &'a str, domain_id: &'a str, project_id: Option<&'a str>) -> Self {
        Self {
            auth: Auth {
                identity: Identity {
                    methods: ["password"],
                    password: PasswordMethod {
                        user: User {
                            name: username,
                            password,
                            domain: IdRef { id: domain_id },
                        },
                    },
                },
                scope: Scope::for_project(project_id),
            },
        }
    }

    /// Scope the request asks for.
    pub fn scope(&self) -> &Scope<'a> {
        &self.auth.scope
    }
}

/// The parts of `POST /v3/auth/tokens` this crate consumes.
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    /// The token object.
    #[serde(default)]
    pub token: TokenBody,
}

/// The `token` object.
#[derive(Debug, Default, Deserialize)]
pub struct TokenBody {
    /// Services the token may reach.
    #[serde(default)]
    pub catalog: Catalog,
    /// Expiry timestamp as sent by keystone.
    #[serde(default)]
    pub expires_at: Option<String>,
}
