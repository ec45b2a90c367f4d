//! Choosing which LDAP groups a sync covers
use crate::{interfaces::LdapGroupLister, Error, GroupClient, Result};
use async_trait::async_trait;
use kube::ResourceExt;
use origin_core::{
    annotations::{LDAP_HOST_LABEL, LDAP_UID},
    Group,
};
use std::sync::Arc;

/// A fixed list of LDAP group UIDs
#[derive(Clone, Debug)]
pub struct LdapWhitelistGroupLister {
    uids: Vec<String>,
}

impl LdapWhitelistGroupLister {
    /// List exactly `uids`
    pub fn new(uids: Vec<String>) -> Self {
        Self { uids }
    }
}

#[async_trait]
impl LdapGroupLister for LdapWhitelistGroupLister {
    async fn list_group_uids(&self) -> Result<Vec<String>> {
        Ok(self.uids.clone())
    }
}

/// The LDAP UID an OpenShift group was synced from, checking it came from `host`
fn synced_uid(group: &Group, host: &str) -> Result<String> {
    let conflict = |reason: String| Error::GroupConflict {
        group: group.name_any(),
        reason,
    };
    if group.labels().get(LDAP_HOST_LABEL).map(String::as_str) != Some(host) {
        return Err(conflict(format!("group was not synchronized from {host}")));
    }
    group
        .annotations()
        .get(LDAP_UID)
        .cloned()
        .ok_or_else(|| conflict(format!("group has no {LDAP_UID} annotation")))
}

/// The LDAP UIDs behind a list of OpenShift groups
pub struct OpenShiftWhitelistGroupLister {
    names: Vec<String>,
    client: Arc<dyn GroupClient>,
    host: String,
}

impl OpenShiftWhitelistGroupLister {
    /// List the UIDs behind the groups called `names`, all synced from `host`
    pub fn new(names: Vec<String>, client: Arc<dyn GroupClient>, host: &str) -> Self {
        Self {
            names,
            client,
            host: host.to_owned(),
        }
    }
}

#[async_trait]
impl LdapGroupLister for OpenShiftWhitelistGroupLister {
    async fn list_group_uids(&self) -> Result<Vec<String>> {
        let mut uids = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let group = self
                .client
                .get(name)
                .await?
                .ok_or_else(|| Error::GroupNotFound(name.clone()))?;
            uids.push(synced_uid(&group, &self.host)?);
        }
        Ok(uids)
    }
}

/// The LDAP UIDs behind every OpenShift group synced from a host
pub struct AllOpenShiftGroupLister {
    host: String,
    client: Arc<dyn GroupClient>,
}

impl AllOpenShiftGroupLister {
    /// List the UIDs of groups labelled with `host`
    pub fn new(host: &str, client: Arc<dyn GroupClient>) -> Self {
        Self {
            host: host.to_owned(),
            client,
        }
    }
}

#[async_trait]
impl LdapGroupLister for AllOpenShiftGroupLister {
    async fn list_group_uids(&self) -> Result<Vec<String>> {
        let selector = format!("{LDAP_HOST_LABEL}={}", self.host);
        self.client
            .list(&selector)
            .await?
            .iter()
            .map(|group| synced_uid(group, &self.host))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;

    /// Groups held in memory, recording every write
    #[derive(Default)]
    pub(crate) struct FakeGroups {
        pub(crate) groups: Mutex<BTreeMap<String, Group>>,
        pub(crate) writes: Mutex<Vec<String>>,
    }

    impl FakeGroups {
        pub(crate) fn with(groups: Vec<Group>) -> Arc<Self> {
            let fake = Self::default();
            for group in groups {
                fake.groups.lock().insert(group.name_any(), group);
            }
            Arc::new(fake)
        }
    }

    #[async_trait]
    impl GroupClient for FakeGroups {
        async fn get(&self, name: &str) -> Result<Option<Group>> {
            Ok(self.groups.lock().get(name).cloned())
        }

        async fn list(&self, label_selector: &str) -> Result<Vec<Group>> {
            let (key, value) = label_selector.split_once('=').unwrap_or((label_selector, ""));
            Ok(self
                .groups
                .lock()
                .values()
                .filter(|g| g.labels().get(key).map(String::as_str) == Some(value))
                .cloned()
                .collect())
        }

        async fn create(&self, group: &Group) -> Result<Group> {
            let mut created = group.clone();
            created.metadata.resource_version = Some("1".into());
            self.writes.lock().push(format!("create {}", group.name_any()));
            self.groups.lock().insert(group.name_any(), created.clone());
            Ok(created)
        }

        async fn update(&self, group: &Group) -> Result<Group> {
            self.writes.lock().push(format!("update {}", group.name_any()));
            self.groups.lock().insert(group.name_any(), group.clone());
            Ok(group.clone())
        }
    }

    pub(crate) fn synced_group(name: &str, host: &str, uid: &str) -> Group {
        let mut group = Group::new(name);
        group.labels_mut().insert(LDAP_HOST_LABEL.into(), host.into());
        group.annotations_mut().insert(LDAP_UID.into(), uid.into());
        group.metadata.resource_version = Some("5".into());
        group
    }

    #[tokio::test]
    async fn whitelist_of_ldap_uids_is_returned_as_is() {
        let lister = LdapWhitelistGroupLister::new(vec!["a".into(), "b".into()]);
        assert_eq!(lister.list_group_uids().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn openshift_whitelist_resolves_uids() {
        let client = FakeGroups::with(vec![
            synced_group("admins", "ldap.example.com", "cn=admins"),
            synced_group("foreign", "other.example.com", "cn=foreign"),
        ]);
        let lister = OpenShiftWhitelistGroupLister::new(vec!["admins".into()], client.clone(), "ldap.example.com");
        assert_eq!(lister.list_group_uids().await.unwrap(), vec!["cn=admins"]);

        let foreign = OpenShiftWhitelistGroupLister::new(vec!["foreign".into()], client.clone(), "ldap.example.com");
        assert_eq!(
            foreign.list_group_uids().await.unwrap_err().to_string(),
            r#"group "foreign": group was not synchronized from ldap.example.com"#
        );

        let missing = OpenShiftWhitelistGroupLister::new(vec!["nope".into()], client, "ldap.example.com");
        assert!(matches!(missing.list_group_uids().await, Err(Error::GroupNotFound(_))));
    }

    #[tokio::test]
    async fn all_openshift_groups_of_a_host() {
        let client = FakeGroups::with(vec![
            synced_group("admins", "ldap.example.com", "cn=admins"),
            synced_group("devs", "ldap.example.com", "cn=devs"),
            synced_group("foreign", "other.example.com", "cn=foreign"),
            Group::new("local"),
        ]);
        let lister = AllOpenShiftGroupLister::new("ldap.example.com", client);
        assert_eq!(lister.list_group_uids().await.unwrap(), vec!["cn=admins", "cn=devs"]);
    }
}
