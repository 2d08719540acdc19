//! The per-request gate decision.

use tracing::{debug, error};

use brokle_core::config::{AuthConfig, RoutesConfig};
use brokle_core::types::Role;

use crate::jwt::{Claims, JwtVerifier};

use super::routes::{RouteClass, RouteTable};

/// Header carrying the verified subject ID downstream.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the verified email downstream.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the verified organization ID downstream.
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";
/// Header carrying the verified role downstream.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// All identity headers the gate owns. Inbound copies are always stripped.
pub const IDENTITY_HEADERS: [&str; 4] = [
    USER_ID_HEADER,
    USER_EMAIL_HEADER,
    ORGANIZATION_ID_HEADER,
    USER_ROLE_HEADER,
];

/// Identity established from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Subject ID.
    pub user_id: String,
    /// Email.
    pub email: String,
    /// Organization ID.
    pub organization_id: String,
    /// Role in the organization.
    pub role: Role,
}

impl Identity {
    /// Header name/value pairs to attach to the forwarded request.
    pub fn headers(&self) -> [(&'static str, String); 4] {
        [
            (USER_ID_HEADER, self.user_id.clone()),
            (USER_EMAIL_HEADER, self.email.clone()),
            (ORGANIZATION_ID_HEADER, self.organization_id.clone()),
            (USER_ROLE_HEADER, self.role.as_str().to_string()),
        ]
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            organization_id: claims.organization_id,
            role: claims.role,
        }
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Forward the request unmodified.
    PassThrough,
    /// Forward the request with the identity headers attached.
    Authenticated(Identity),
    /// Answer with a redirect to `location`.
    Redirect {
        /// Target path, including any query string.
        location: String,
    },
}

/// The edge authentication gate.
///
/// Immutable after construction. A gate without a verifier (missing or bad
/// key configuration) treats every token as invalid.
#[derive(Debug, Clone)]
pub struct Gate {
    routes: RouteTable,
    verifier: Option<JwtVerifier>,
    sign_in_path: String,
    landing_path: String,
    redirect_param: String,
}

impl Gate {
    /// Creates a gate from route configuration and an optional verifier.
    pub fn new(routes: &RoutesConfig, verifier: Option<JwtVerifier>) -> Self {
        Self {
            routes: RouteTable::from_config(routes),
            verifier,
            sign_in_path: routes.sign_in_path.clone(),
            landing_path: routes.landing_path.clone(),
            redirect_param: routes.redirect_param.clone(),
        }
    }

    /// Creates a gate from configuration. A verifier that cannot be built is
    /// logged and the gate fails closed.
    pub fn from_config(routes: &RoutesConfig, auth: &AuthConfig) -> Self {
        let verifier = match JwtVerifier::from_config(auth) {
            Ok(v) => Some(v),
            Err(e) => {
                error!(error = %e, "Token verifier unavailable; every protected request will be redirected");
                None
            }
        };
        Self::new(routes, verifier)
    }

    /// Whether a verification key was loaded.
    pub fn has_verifier(&self) -> bool {
        self.verifier.is_some()
    }

    /// Classifies a path.
    pub fn classify(&self, path: &str) -> RouteClass {
        self.routes.classify(path)
    }

    /// Verifies a token, mapping every failure to `None`.
    pub fn authenticate(&self, token: Option<&str>) -> Option<Identity> {
        let token = token?;
        let verifier = self.verifier.as_ref()?;
        match verifier.verify(token) {
            Ok(claims) => Some(Identity::from(claims)),
            Err(e) => {
                debug!(reason = %e.message, "Token rejected");
                None
            }
        }
    }

    /// Decides what happens to a request for `path` carrying `token`.
    pub fn decide(&self, path: &str, token: Option<&str>) -> GateDecision {
        let class = self.routes.classify(path);

        let decision = match class {
            RouteClass::Public => GateDecision::PassThrough,
            RouteClass::AuthOnly => match self.authenticate(token) {
                Some(_) => GateDecision::Redirect {
                    location: self.landing_path.clone(),
                },
                None => GateDecision::PassThrough,
            },
            RouteClass::Protected => match self.authenticate(token) {
                Some(identity) => GateDecision::Authenticated(identity),
                None => GateDecision::Redirect {
                    location: self.sign_in_location(path),
                },
            },
        };

        debug!(
            path,
            route = class.as_str(),
            outcome = decision_label(&decision),
            "Gate decision"
        );

        decision
    }

    /// Sign-in URL that returns the visitor to `path` afterwards.
    pub fn sign_in_location(&self, path: &str) -> String {
        format!(
            "{}?{}={}",
            self.sign_in_path,
            self.redirect_param,
            urlencoding::encode(path)
        )
    }
}

fn decision_label(decision: &GateDecision) -> &'static str {
    match decision {
        GateDecision::PassThrough => "pass",
        GateDecision::Authenticated(_) => "authenticated",
        GateDecision::Redirect { .. } => "redirect",
    }
}
