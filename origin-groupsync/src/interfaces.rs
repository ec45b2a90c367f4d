//! The strategies a group sync is assembled from
use crate::{Entry, Result};
use async_trait::async_trait;
use kube::{
    api::{ListParams, PostParams},
    Api, ResourceExt,
};
use origin_core::Group;

/// Picks the LDAP groups to sync
#[async_trait]
pub trait LdapGroupLister: Send + Sync {
    /// UIDs of the LDAP groups to sync
    async fn list_group_uids(&self) -> Result<Vec<String>>;
}

/// Resolves the members of an LDAP group
#[async_trait]
pub trait LdapMemberExtractor: Send + Sync {
    /// User entries of the members of the group with `uid`
    async fn extract_members(&self, uid: &str) -> Result<Vec<Entry>>;
}

/// Looks up LDAP group entries
#[async_trait]
pub trait LdapGroupGetter: Send + Sync {
    /// The entry of the group with `uid`
    async fn group_entry_for(&self, uid: &str) -> Result<Entry>;
}

/// Names the OpenShift group an LDAP group is synced into
#[async_trait]
pub trait LdapGroupNameMapper: Send + Sync {
    /// OpenShift group name for the LDAP group with `uid`
    async fn group_name_for(&self, uid: &str) -> Result<String>;
}

/// Names the OpenShift user an LDAP user entry stands for
pub trait LdapUserNameMapper: Send + Sync {
    /// OpenShift user name for `entry`
    fn user_name_for(&self, entry: &Entry) -> Result<String>;
}

/// Reads and writes OpenShift groups
#[async_trait]
pub trait GroupClient: Send + Sync {
    /// The group called `name`, if it exists
    async fn get(&self, name: &str) -> Result<Option<Group>>;
    /// Groups matching a label selector
    async fn list(&self, label_selector: &str) -> Result<Vec<Group>>;
    /// Create a group
    async fn create(&self, group: &Group) -> Result<Group>;
    /// Replace an existing group
    async fn update(&self, group: &Group) -> Result<Group>;
}

#[async_trait]
impl GroupClient for Api<Group> {
    async fn get(&self, name: &str) -> Result<Option<Group>> {
        Ok(self.get_opt(name).await?)
    }

    async fn list(&self, label_selector: &str) -> Result<Vec<Group>> {
        let lp = ListParams::default().labels(label_selector);
        Ok(Api::list(self, &lp).await?.items)
    }

    async fn create(&self, group: &Group) -> Result<Group> {
        Ok(Api::create(self, &PostParams::default(), group).await?)
    }

    async fn update(&self, group: &Group) -> Result<Group> {
        Ok(self.replace(&group.name_any(), &PostParams::default(), group).await?)
    }
}
