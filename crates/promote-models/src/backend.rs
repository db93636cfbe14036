//! Hosted backend instances as listed by the directory service.

use serde::{Deserialize, Serialize};

/// Path appended to a backend's base address to reach its admin API.
const ADMIN_PATH: &str = "/admin";

/// Connection metadata for one hosted backend instance.
///
/// Field names follow the directory service's wire format (`uid`, `url`,
/// `jwtToken`, ...) through serde renames. The descriptive fields are
/// passed through unmodified.
///
/// A descriptor is only valid for the directory session that produced it;
/// `admin_token` in particular must not be cached across runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Stable identifier, unique across all instances.
    #[serde(rename = "uid")]
    pub id: String,
    /// Human-chosen label used for lookup.
    pub name: String,
    /// Base address of the backend.
    #[serde(rename = "url")]
    pub admin_url: String,
    /// Bearer credential scoped to this backend, if the backend requires one.
    #[serde(rename = "jwtToken", default, skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
    /// Owning account.
    #[serde(default)]
    pub owner: Option<String>,
    /// Hosting zone (e.g. `us-west-2`).
    #[serde(default)]
    pub zone: Option<String>,
    /// Deployment mode as reported by the directory.
    #[serde(rename = "deploymentMode", default)]
    pub mode: Option<String>,
    /// Deployment type as reported by the directory.
    #[serde(rename = "deploymentType", default)]
    pub deployment_type: Option<String>,
}

impl BackendDescriptor {
    /// Address of the per-backend administrative endpoint.
    ///
    /// The directory may return a bare host (`blue-surf.cloud.example.io`);
    /// in that case `https://` is assumed.
    ///
    /// # Examples
    ///
    /// ```
    /// use promote_models::BackendDescriptor;
    ///
    /// let backend = BackendDescriptor {
    ///     id: "0x1".into(),
    ///     name: "prod".into(),
    ///     admin_url: "blue-surf.cloud.example.io/".into(),
    ///     admin_token: None,
    ///     owner: None,
    ///     zone: None,
    ///     mode: None,
    ///     deployment_type: None,
    /// };
    /// assert_eq!(backend.admin_endpoint(), "https://blue-surf.cloud.example.io/admin");
    /// ```
    pub fn admin_endpoint(&self) -> String {
        admin_endpoint(&self.admin_url)
    }
}

/// Build `<base>/admin` from a backend base address.
pub fn admin_endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}{ADMIN_PATH}")
    } else {
        format!("https://{base}{ADMIN_PATH}")
    }
}
