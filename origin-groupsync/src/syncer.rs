//! Driving a group sync
use crate::{
    interfaces::{LdapGroupLister, LdapGroupNameMapper, LdapMemberExtractor, LdapUserNameMapper},
    Error, GroupClient, Result,
};
use chrono::{SecondsFormat, Utc};
use kube::ResourceExt;
use origin_core::{
    annotations::{LDAP_HOST_LABEL, LDAP_SYNC_TIME, LDAP_UID, LDAP_URL},
    Group,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Mirrors LDAP groups into OpenShift groups.
///
/// Groups are processed independently: a failure is recorded and the sync moves on to the next
/// group. An existing OpenShift group is only touched when it was synced from the same LDAP
/// host and UID before.
pub struct LdapGroupSyncer {
    /// Picks the LDAP groups to sync
    pub group_lister: Arc<dyn LdapGroupLister>,
    /// Resolves group members
    pub group_member_extractor: Arc<dyn LdapMemberExtractor>,
    /// Names users
    pub user_name_mapper: Arc<dyn LdapUserNameMapper>,
    /// Names groups
    pub group_name_mapper: Arc<dyn LdapGroupNameMapper>,
    /// Reads and writes OpenShift groups
    pub group_client: Arc<dyn GroupClient>,
    /// LDAP server as `host:port`
    pub host: String,
}

impl LdapGroupSyncer {
    /// Sync every listed group, returning the groups written and every failure
    pub async fn sync(&self) -> (Vec<Group>, Vec<Error>) {
        self.sync_groups(true).await
    }

    /// The groups a sync would write, without writing them
    pub async fn resulting_groups(&self) -> (Vec<Group>, Vec<Error>) {
        self.sync_groups(false).await
    }

    fn host_name(&self) -> &str {
        self.host.rsplit_once(':').map_or(self.host.as_str(), |(name, _)| name)
    }

    async fn sync_groups(&self, write: bool) -> (Vec<Group>, Vec<Error>) {
        let uids = match self.group_lister.list_group_uids().await {
            Ok(uids) => uids,
            Err(err) => return (Vec::new(), vec![err]),
        };
        let mut groups = Vec::with_capacity(uids.len());
        let mut errors = Vec::new();
        for uid in uids {
            match self.sync_group(&uid, write).await {
                Ok(group) => groups.push(group),
                Err(err) => {
                    warn!(%uid, %err, "could not sync group");
                    errors.push(err);
                }
            }
        }
        info!(synced = groups.len(), failed = errors.len(), write, "group sync finished");
        (groups, errors)
    }

    #[instrument(skip(self))]
    async fn sync_group(&self, uid: &str, write: bool) -> Result<Group> {
        let members = self.group_member_extractor.extract_members(uid).await?;
        let users = members
            .iter()
            .map(|member| self.user_name_mapper.user_name_for(member))
            .collect::<Result<Vec<_>>>()?;
        let name = self.group_name_mapper.group_name_for(uid).await?;
        let group = self.make_openshift_group(uid, &name, users).await?;
        if !write {
            return Ok(group);
        }
        let written = if group.metadata.resource_version.is_some() {
            self.group_client.update(&group).await?
        } else {
            self.group_client.create(&group).await?
        };
        debug!(group = %name, users = written.users.len(), "synced group");
        Ok(written)
    }

    /// The OpenShift group `name` with its users set to `users`
    async fn make_openshift_group(&self, uid: &str, name: &str, users: Vec<String>) -> Result<Group> {
        let host = self.host_name();
        let mut group = match self.group_client.get(name).await? {
            Some(existing) => {
                let conflict = |reason: String| Error::GroupConflict {
                    group: name.to_owned(),
                    reason,
                };
                if existing.labels().get(LDAP_HOST_LABEL).map(String::as_str) != Some(host) {
                    return Err(conflict(format!(
                        "group already exists and was not synchronized from {host}"
                    )));
                }
                match existing.annotations().get(LDAP_UID) {
                    Some(synced) if synced == uid => {}
                    other => {
                        return Err(conflict(format!(
                            "group was synchronized from LDAP group {:?}, not {uid:?}",
                            other.map_or("", String::as_str)
                        )))
                    }
                }
                existing.with_type_meta()
            }
            None => Group::new(name),
        };

        group.users = users;
        let annotations = group.annotations_mut();
        annotations.insert(LDAP_URL.to_owned(), self.host.clone());
        annotations.insert(LDAP_UID.to_owned(), uid.to_owned());
        annotations.insert(
            LDAP_SYNC_TIME.to_owned(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        group.labels_mut().insert(LDAP_HOST_LABEL.to_owned(), host.to_owned());
        Ok(group)
    }
}
