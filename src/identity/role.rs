use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed set of marketplace roles. Role strings coming from the profile API are
/// mapped through [`Role::parse`]; anything else never becomes a `Role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    /// Case-insensitive, whitespace-tolerant parse. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Landing page after login when no return path was carried.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Student => "/learn",
            Role::Teacher => "/teach",
            Role::Admin => "/admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role restriction of a route. `Only` is an OR over its members; an empty set admits nobody.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedRoles {
    #[default]
    Any,
    Only(BTreeSet<Role>),
}

impl AllowedRoles {
    pub fn only<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        AllowedRoles::Only(roles.into_iter().collect())
    }

    pub fn is_any(&self) -> bool { matches!(self, AllowedRoles::Any) }

    /// A missing role never matches a restricted set.
    pub fn admits(&self, role: Option<Role>) -> bool {
        match self {
            AllowedRoles::Any => true,
            AllowedRoles::Only(set) => role.map(|r| set.contains(&r)).unwrap_or(false),
        }
    }
}

// Wire form: the string "any", or a list of role names. Unknown names in a route
// table are a configuration error, not a silently dropped entry.
impl Serialize for AllowedRoles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AllowedRoles::Any => serializer.serialize_str("any"),
            AllowedRoles::Only(set) => serializer.collect_seq(set.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for AllowedRoles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Keyword(String),
            List(Vec<String>),
        }
        match Wire::deserialize(deserializer)? {
            Wire::Keyword(k) if k.trim().eq_ignore_ascii_case("any") => Ok(AllowedRoles::Any),
            Wire::Keyword(k) => Role::parse(&k)
                .map(|r| AllowedRoles::only([r]))
                .ok_or_else(|| serde::de::Error::custom(format!("unknown role '{}'", k))),
            Wire::List(names) => {
                let mut set = BTreeSet::new();
                for n in names {
                    let r = Role::parse(&n)
                        .ok_or_else(|| serde::de::Error::custom(format!("unknown role '{}'", n)))?;
                    set.insert(r);
                }
                Ok(AllowedRoles::Only(set))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_closed_and_case_insensitive() {
        assert_eq!(Role::parse("student"), Some(Role::Student));
        assert_eq!(Role::parse(" Teacher "), Some(Role::Teacher));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn restricted_set_is_or_and_fails_closed() {
        let staff = AllowedRoles::only([Role::Teacher, Role::Admin]);
        assert!(staff.admits(Some(Role::Teacher)));
        assert!(staff.admits(Some(Role::Admin)));
        assert!(!staff.admits(Some(Role::Student)));
        assert!(!staff.admits(None));
        assert!(AllowedRoles::Any.admits(None));
        assert!(!AllowedRoles::Only(BTreeSet::new()).admits(Some(Role::Admin)));
    }

    #[test]
    fn wire_forms() {
        let any: AllowedRoles = serde_json::from_str("\"any\"").unwrap();
        assert!(any.is_any());
        let one: AllowedRoles = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(one, AllowedRoles::only([Role::Admin]));
        let list: AllowedRoles = serde_json::from_str("[\"teacher\",\"Admin\"]").unwrap();
        assert_eq!(list, AllowedRoles::only([Role::Teacher, Role::Admin]));
        assert!(serde_json::from_str::<AllowedRoles>("[\"teacher\",\"owner\"]").is_err());
        assert_eq!(serde_json::to_string(&list).unwrap(), "[\"teacher\",\"admin\"]");
    }
}
