use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::{AllowedRoles, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequirement {
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub allowed_roles: AllowedRoles,
}

impl RouteRequirement {
    pub fn public() -> Self {
        Self { requires_auth: false, allowed_roles: AllowedRoles::Any }
    }

    /// Any signed-in role.
    pub fn authenticated() -> Self {
        Self { requires_auth: true, allowed_roles: AllowedRoles::Any }
    }

    pub fn roles<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self { requires_auth: true, allowed_roles: AllowedRoles::only(roles) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RouteEntry {
    path: String,
    #[serde(flatten)]
    requirement: RouteRequirement,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RouteTableFile {
    #[serde(default)]
    routes: Vec<RouteEntry>,
    #[serde(default)]
    fallback: Option<RouteRequirement>,
}

/// Static path → requirement mapping supplied by the application shell.
///
/// Patterns are either exact (`/teach`) or prefixes (`/teach/*`, which also matches
/// `/teach`). Exact entries win over prefixes and the longest prefix wins among
/// prefixes. Paths nothing matches get the fallback, which defaults to
/// "any signed-in user".
#[derive(Debug, Clone)]
pub struct RouteTable {
    exact: HashMap<String, RouteRequirement>,
    // kept sorted by descending prefix length
    prefixes: Vec<(String, RouteRequirement)>,
    fallback: RouteRequirement,
}

impl Default for RouteTable {
    fn default() -> Self { Self::new() }
}

impl RouteTable {
    pub fn new() -> Self {
        Self { exact: HashMap::new(), prefixes: Vec::new(), fallback: RouteRequirement::authenticated() }
    }

    pub fn with_fallback(mut self, fallback: RouteRequirement) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallback(&self) -> &RouteRequirement { &self.fallback }

    pub fn len(&self) -> usize { self.exact.len() + self.prefixes.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn insert(&mut self, pattern: &str, requirement: RouteRequirement) -> Result<(), ConfigError> {
        validate(pattern, &requirement)?;
        let canonical = |p: &str| normalize_path(p).ok_or_else(|| ConfigError::route(pattern, "cannot be canonicalised"));
        if let Some(prefix) = pattern.strip_suffix("/*") {
            let prefix = canonical(prefix)?;
            self.prefixes.retain(|(p, _)| p != &prefix);
            self.prefixes.push((prefix, requirement));
            self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        } else {
            self.exact.insert(canonical(pattern)?, requirement);
        }
        Ok(())
    }

    pub fn route(mut self, pattern: &str, requirement: RouteRequirement) -> Result<Self, ConfigError> {
        self.insert(pattern, requirement)?;
        Ok(self)
    }

    /// Requirement for a requested path, matched on its canonical form (see
    /// [`normalize_path`]). Paths that cannot be canonicalised get the fallback.
    pub fn lookup(&self, path: &str) -> &RouteRequirement {
        let Some(path) = normalize_path(path) else {
            return &self.fallback;
        };
        if let Some(r) = self.exact.get(&path) {
            return r;
        }
        for (prefix, r) in &self.prefixes {
            if prefix == "/" || path == *prefix || path.strip_prefix(prefix.as_str()).is_some_and(|rest| rest.starts_with('/')) {
                return r;
            }
        }
        &self.fallback
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: RouteTableFile = serde_json::from_str(text)?;
        let mut table = RouteTable::new();
        if let Some(fb) = file.fallback {
            table.fallback = fb;
        }
        for entry in file.routes {
            table.insert(&entry.path, entry.requirement)?;
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_json(&text)
    }

    /// The course marketplace's own routes.
    pub fn marketplace() -> Self {
        let mut t = RouteTable::new();
        let entries: [(&str, RouteRequirement); 13] = [
            ("/", RouteRequirement::public()),
            ("/courses", RouteRequirement::public()),
            ("/courses/*", RouteRequirement::public()),
            ("/login", RouteRequirement::public()),
            ("/register", RouteRequirement::public()),
            ("/unauthorized", RouteRequirement::public()),
            ("/dashboard/*", RouteRequirement::authenticated()),
            ("/profile", RouteRequirement::authenticated()),
            ("/checkout/*", RouteRequirement::authenticated()),
            ("/learn/*", RouteRequirement::roles([Role::Student])),
            ("/teach/*", RouteRequirement::roles([Role::Teacher, Role::Admin])),
            ("/admin/*", RouteRequirement::roles([Role::Admin])),
            ("/admin/login", RouteRequirement::public()),
        ];
        for (pattern, req) in entries {
            // static patterns above are all valid
            if let Err(e) = t.insert(pattern, req) {
                tracing::error!(target: "coursegate::gate", "built-in route rejected: {}", e);
            }
        }
        t
    }
}

fn validate(pattern: &str, requirement: &RouteRequirement) -> Result<(), ConfigError> {
    if pattern.trim().is_empty() {
        return Err(ConfigError::route(pattern, "empty pattern"));
    }
    if !pattern.starts_with('/') {
        return Err(ConfigError::route(pattern, "must start with '/'"));
    }
    if pattern.contains('*') && !pattern.ends_with("/*") {
        return Err(ConfigError::route(pattern, "wildcard only allowed as trailing '/*'"));
    }
    if pattern.matches('*').count() > 1 {
        return Err(ConfigError::route(pattern, "at most one wildcard"));
    }
    if !requirement.requires_auth && !requirement.allowed_roles.is_any() {
        return Err(ConfigError::route(pattern, "role restriction on a route that does not require auth"));
    }
    Ok(())
}

/// Canonical form used on both sides of a lookup: query and fragment dropped,
/// percent-escapes decoded, backslashes read as `/`, empty and `.` segments removed, `..`
/// resolved, segments lower-cased. Empty becomes "/". `None` when the path climbs
/// above the root or decodes to control characters.
pub fn normalize_path(path: &str) -> Option<String> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let decoded = urlencoding::decode(path[..end].trim()).ok()?;
    if decoded.chars().any(|c| c.is_control()) {
        return None;
    }
    let mut segments: Vec<String> = Vec::new();
    for seg in decoded.split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s.to_lowercase()),
        }
    }
    Some(format!("/{}", segments.join("/")))
}
