//! Role-based access decisions.
//!
//! Rules, first match wins:
//! 0. exempt path → allow
//! 1. no role → deny
//! 2. admin prefix and not Admin → deny
//! 3. Admin → allow
//! 4. Viewer → allow iff namespace is absent or `public`
//! 5. anything else → deny
//!
//! The engine is pure: it sees the identity, the request path, and the
//! resolved namespace, nothing else.

use std::collections::{HashMap, HashSet};

use netmon_core::{Identity, Role};

use crate::config::RbacConfig;

/// The only namespace a Viewer may name explicitly.
pub const PUBLIC_NAMESPACE: &str = "public";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    Exempt,
    Admin,
    ViewerPublic,
    MissingRole,
    AdminOnly,
    NamespaceRestricted,
    InsufficientPermissions,
}

impl DecisionReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Exempt => "path is exempt from role checks",
            Self::Admin => "admin access",
            Self::ViewerPublic => "viewer access to public resources",
            Self::MissingRole => "user role not available",
            Self::AdminOnly => "only Admin users can access administrative functions",
            Self::NamespaceRestricted => "viewers can only access the \"public\" namespace",
            Self::InsufficientPermissions => "insufficient permissions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allow: bool,
    pub reason: DecisionReason,
}

impl Decision {
    fn allow(reason: DecisionReason) -> Self {
        Self { allow: true, reason }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allow: false,
            reason,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RbacPolicy {
    exempt_paths: HashSet<String>,
    admin_prefix: String,
}

impl RbacPolicy {
    pub fn new(config: &RbacConfig) -> Self {
        Self {
            exempt_paths: config.exempt_paths.iter().cloned().collect(),
            admin_prefix: config.admin_prefix.clone(),
        }
    }

    pub fn authorize(&self, identity: &Identity, path: &str, namespace: Option<&str>) -> Decision {
        if self.exempt_paths.contains(path) {
            return Decision::allow(DecisionReason::Exempt);
        }

        let Some(role) = &identity.role else {
            return Decision::deny(DecisionReason::MissingRole);
        };

        if path.starts_with(&self.admin_prefix) && *role != Role::Admin {
            return Decision::deny(DecisionReason::AdminOnly);
        }

        match role {
            Role::Admin => Decision::allow(DecisionReason::Admin),
            Role::Viewer => match namespace {
                None | Some(PUBLIC_NAMESPACE) => Decision::allow(DecisionReason::ViewerPublic),
                Some(_) => Decision::deny(DecisionReason::NamespaceRestricted),
            },
            Role::Other(_) => Decision::deny(DecisionReason::InsufficientPermissions),
        }
    }
}

impl Default for RbacPolicy {
    fn default() -> Self {
        Self::new(&RbacConfig::default())
    }
}

/// Pick the request's namespace: path parameter, then JSON body field, then
/// query parameter. Empty values are skipped.
///
/// A body `namespace` that is not a string still counts, rendered as JSON.
/// A repeated query key resolves to its first non-public value, so mixing
/// `public` with anything else is never read as public.
pub fn resolve_namespace(
    path_params: &HashMap<String, String>,
    body: Option<&serde_json::Value>,
    query: &[(String, String)],
) -> Option<String> {
    let from_path = path_params.get("namespace").cloned();
    let from_body = body
        .and_then(|b| b.get("namespace"))
        .and_then(|v| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });
    let mut query_values = query
        .iter()
        .filter(|(k, v)| k == "namespace" && !v.is_empty())
        .map(|(_, v)| v.as_str());
    let from_query = query_values
        .clone()
        .find(|v| *v != PUBLIC_NAMESPACE)
        .or_else(|| query_values.next())
        .map(str::to_string);

    [from_path, from_body, from_query]
        .into_iter()
        .flatten()
        .find(|ns| !ns.is_empty())
}
