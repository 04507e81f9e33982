//! Site user types

use serde::{Deserialize, Serialize};

/// A principal registered on the site (`_api/web/siteusers`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub is_hidden_in_ui: bool,
    pub login_name: String,
    pub title: String,
    /// 1 = user, 2 = distribution list, 4 = security group, 8 = SharePoint
    /// group
    pub principal_type: i32,
    /// Empty when the service reports a null address
    pub email: String,
    pub is_site_admin: bool,
}
