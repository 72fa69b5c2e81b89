/// Where configuration lives in the hosted repository namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Path of the admin repository.
    pub admin_repo: String,
    /// Namespace holding one config repository per organization.
    pub org_namespace: String,
    /// Namespace holding one config repository per user.
    pub user_namespace: String,
    /// Branch whose head is the current committed configuration.
    pub branch: String,
    /// Config file at the root of admin and organization repositories.
    pub config_file: String,
    /// Directory of `*.pub` files at the root of user repositories.
    pub keys_dir: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            admin_repo: "admin".into(),
            org_namespace: "orgs".into(),
            user_namespace: "users".into(),
            branch: "refs/heads/main".into(),
            config_file: "config.toml".into(),
            keys_dir: "keys".into(),
        }
    }
}

impl Layout {
    /// Repository path of an organization's config repository.
    pub fn org_repo(&self, org: &str) -> String {
        format!("{}/{org}", self.org_namespace)
    }

    /// Repository path of a user's config repository.
    pub fn user_repo(&self, user: &str) -> String {
        format!("{}/{user}", self.user_namespace)
    }

    /// Names that may not be used for users or organizations.
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.admin_repo || name == self.org_namespace || name == self.user_namespace
    }
}
