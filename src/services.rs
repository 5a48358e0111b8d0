//! Service catalog: descriptors from `config.json`, sections and groups

use crate::config::Environment;
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// A monitored service as listed in the dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub key: String,
    pub label: String,
    /// Icon / log directory type, e.g. `api` or `web`.
    #[serde(rename = "type")]
    pub kind: String,
    pub env: String,
    #[serde(default)]
    pub meta: ServiceMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMeta {
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ServiceDescriptor {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.meta.tags.iter().any(|t| t == tag)
    }

    pub fn runs_in(&self, env: Environment) -> bool {
        self.env.eq_ignore_ascii_case(env.as_str())
    }

    /// Path of this service's report, relative to the source root.
    pub fn log_path(&self, env: Environment) -> String {
        format!("logs/{}/{}/{}_report.log", env.as_str(), self.kind, self.key)
    }
}

/// Dashboard section a service is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Web,
    Api,
}

impl Section {
    /// Sections in render order.
    pub const ALL: [Section; 2] = [Section::Web, Section::Api];

    pub fn tag(&self) -> &'static str {
        match self {
            Section::Web => "web",
            Section::Api => "api",
        }
    }

    pub fn title(&self) -> String {
        self.tag().to_uppercase()
    }
}

/// Logical group api services are folded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Auth,
    Accounts,
    Links,
    Transfers,
}

impl GroupKind {
    /// Groups in render order.
    pub const ALL: [GroupKind; 4] = [
        GroupKind::Auth,
        GroupKind::Accounts,
        GroupKind::Links,
        GroupKind::Transfers,
    ];

    /// First matching tag wins; untagged services land in transfers.
    pub fn for_service(service: &ServiceDescriptor) -> Self {
        if service.has_tag("auth") {
            GroupKind::Auth
        } else if service.has_tag("accounts") {
            GroupKind::Accounts
        } else if service.has_tag("links") {
            GroupKind::Links
        } else {
            GroupKind::Transfers
        }
    }

    /// Static row metadata for the group.
    pub fn descriptor(&self) -> GroupDescriptor {
        let (key, label) = match self {
            GroupKind::Auth => ("authGroup", "Auth"),
            GroupKind::Accounts => ("accountsGroup", "Accounts"),
            GroupKind::Links => ("linksGroup", "Links"),
            GroupKind::Transfers => ("transfersGroup", "Transfers"),
        };

        GroupDescriptor {
            key: key.to_string(),
            label: label.to_string(),
            kind: "api".to_string(),
            up_time: None,
        }
    }
}

/// Row metadata of a group; configuration, never derived from logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Fixed uptime text for the group row, `--%` when unset.
    pub up_time: Option<String>,
}

/// Ordered list of configured services.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceCatalog {
    services: Vec<ServiceDescriptor>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    /// Parse the JSON array served as `config.json`.
    pub fn from_json(text: &str) -> Result<Self> {
        let services: Vec<ServiceDescriptor> = serde_json::from_str(text)?;
        Ok(Self::new(services))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Whether any service, in any environment, is tagged for `section`.
    pub fn has_section(&self, section: Section) -> bool {
        self.services.iter().any(|s| s.has_tag(section.tag()))
    }

    /// Services of a section that run in `env`, in configured order.
    pub fn section(&self, section: Section, env: Environment) -> Vec<&ServiceDescriptor> {
        self.services
            .iter()
            .filter(|s| s.has_tag(section.tag()) && s.runs_in(env))
            .collect()
    }

    /// Api services split into groups, every group present, members in configured order.
    pub fn groups(&self, env: Environment) -> Vec<(GroupKind, Vec<&ServiceDescriptor>)> {
        let api = self.section(Section::Api, env);

        GroupKind::ALL
            .iter()
            .map(|kind| {
                let members = api
                    .iter()
                    .copied()
                    .filter(|s| GroupKind::for_service(s) == *kind)
                    .collect();
                (*kind, members)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"[
        {"key": "portal", "label": "Portal", "type": "web", "env": "production", "meta": {"tags": ["web"]}},
        {"key": "login", "label": "Login", "type": "api", "env": "production", "meta": {"tags": ["api", "auth"]}},
        {"key": "balances", "label": "Balances", "type": "api", "env": "production", "meta": {"tags": ["api", "accounts"]}},
        {"key": "payout", "label": "Payout", "type": "api", "env": "production", "meta": {"tags": ["api"]}},
        {"key": "token", "label": "Token", "type": "api", "env": "production", "meta": {"tags": ["api", "auth", "links"]}},
        {"key": "sandbox-login", "label": "Login", "type": "api", "env": "sandbox", "meta": {"tags": ["api", "auth"]}},
        {"key": "untagged", "label": "Untagged", "type": "api", "env": "production"}
    ]"#;

    #[test]
    fn test_catalog_from_json() {
        let catalog = ServiceCatalog::from_json(CONFIG).unwrap();
        assert_eq!(catalog.len(), 7);

        let login = &catalog.services()[1];
        assert_eq!(login.kind, "api");
        assert!(login.has_tag("auth"));
        assert!(catalog.services()[6].meta.tags.is_empty());
    }

    #[test]
    fn test_invalid_catalog() {
        assert!(ServiceCatalog::from_json("{not json").is_err());
        assert!(ServiceCatalog::from_json(r#"[{"key": "x"}]"#).is_err());
    }

    #[test]
    fn test_sections_filter_by_env() {
        let catalog = ServiceCatalog::from_json(CONFIG).unwrap();

        let web: Vec<_> = catalog
            .section(Section::Web, Environment::Production)
            .into_iter()
            .map(|s| s.key.as_str())
            .collect();
        assert_eq!(web, vec!["portal"]);

        let sandbox: Vec<_> = catalog
            .section(Section::Api, Environment::Sandbox)
            .into_iter()
            .map(|s| s.key.as_str())
            .collect();
        assert_eq!(sandbox, vec!["sandbox-login"]);
    }

    #[test]
    fn test_has_section_ignores_env() {
        let catalog = ServiceCatalog::from_json(CONFIG).unwrap();
        assert!(catalog.has_section(Section::Web));
        assert!(catalog.section(Section::Web, Environment::Sandbox).is_empty());

        let api_only = ServiceCatalog::new(vec![catalog.services()[1].clone()]);
        assert!(!api_only.has_section(Section::Web));
        assert!(api_only.has_section(Section::Api));
    }

    #[test]
    fn test_groups_by_first_matching_tag() {
        let catalog = ServiceCatalog::from_json(CONFIG).unwrap();
        let groups = catalog.groups(Environment::Production);

        let keys = |kind: GroupKind| -> Vec<&str> {
            groups
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, members)| members.iter().map(|s| s.key.as_str()).collect())
                .unwrap()
        };

        assert_eq!(groups.len(), 4);
        assert_eq!(keys(GroupKind::Auth), vec!["login", "token"]);
        assert_eq!(keys(GroupKind::Accounts), vec!["balances"]);
        assert!(keys(GroupKind::Links).is_empty());
        assert_eq!(keys(GroupKind::Transfers), vec!["payout"]);
    }

    #[test]
    fn test_log_path() {
        let catalog = ServiceCatalog::from_json(CONFIG).unwrap();
        assert_eq!(
            catalog.services()[1].log_path(Environment::LiveTest),
            "logs/live-test/api/login_report.log"
        );
    }

    #[test]
    fn test_group_descriptor() {
        let descriptor = GroupKind::Transfers.descriptor();
        assert_eq!(descriptor.key, "transfersGroup");
        assert_eq!(descriptor.label, "Transfers");
        assert_eq!(descriptor.kind, "api");
        assert!(descriptor.up_time.is_none());
    }
}
