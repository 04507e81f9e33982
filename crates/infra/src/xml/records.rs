//! Decoding of OData feed entries into domain records

use std::collections::HashMap;
use std::str::FromStr;

use sprest_domain::{BasePermissions, Result, RoleDefinition, SpError, User};

use super::parse_properties;

struct Entry<'a>(&'a HashMap<String, String>);

impl Entry<'_> {
    fn text(&self, key: &str) -> Result<String> {
        self.0
            .get(key)
            .cloned()
            .ok_or_else(|| SpError::parse(format!("d:{key}"), "element not found"))
    }

    fn number<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.text(key)?;
        raw.trim()
            .parse()
            .map_err(|_| SpError::parse(format!("d:{key}"), format!("expected a number, got {raw:?}")))
    }

    fn flag(&self, key: &str) -> Result<bool> {
        let raw = self.text(key)?;
        match raw.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(SpError::parse(format!("d:{key}"), format!("expected a boolean, got {other:?}"))),
        }
    }
}

fn role_definition(entry: &Entry<'_>) -> Result<RoleDefinition> {
    Ok(RoleDefinition {
        base_permissions: BasePermissions { high: entry.number("High")?, low: entry.number("Low")? },
        description: entry.text("Description")?,
        hidden: entry.flag("Hidden")?,
        id: entry.number("Id")?,
        name: entry.text("Name")?,
        order: entry.number("Order")?,
        role_type_kind: entry.number("RoleTypeKind")?,
    })
}

fn user(entry: &Entry<'_>) -> Result<User> {
    Ok(User {
        id: entry.number("Id")?,
        is_hidden_in_ui: entry.flag("IsHiddenInUI")?,
        login_name: entry.text("LoginName")?,
        title: entry.text("Title")?,
        principal_type: entry.number("PrincipalType")?,
        email: entry.text("Email")?,
        is_site_admin: entry.flag("IsSiteAdmin")?,
    })
}

/// Decode a `_api/web/roledefinitions` feed, one record per entry.
pub fn role_definitions_from_feed(xml: &str) -> Result<Vec<RoleDefinition>> {
    parse_properties(xml)?.iter().map(|props| role_definition(&Entry(props))).collect()
}

/// Decode a `_api/web/siteusers` feed, one record per entry.
pub fn users_from_feed(xml: &str) -> Result<Vec<User>> {
    parse_properties(xml)?.iter().map(|props| user(&Entry(props))).collect()
}
