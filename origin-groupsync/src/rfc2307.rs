//! Groups and users laid out as in RFC 2307: group entries list their members' UIDs or DNs
use crate::{
    interfaces::{LdapGroupGetter, LdapGroupLister, LdapMemberExtractor},
    Entry, Error, LdapQueryOnAttribute, Result, Searcher,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Directory access for an RFC 2307 schema.
///
/// Entries are cached by UID for the lifetime of the interface, so a sync reads each group and
/// user at most once.
pub struct LdapInterface {
    searcher: Arc<dyn Searcher>,
    group_query: LdapQueryOnAttribute,
    group_name_attributes: Vec<String>,
    group_membership_attributes: Vec<String>,
    user_query: LdapQueryOnAttribute,
    user_name_attributes: Vec<String>,
    cached_groups: Mutex<HashMap<String, Entry>>,
    cached_users: Mutex<HashMap<String, Entry>>,
}

impl LdapInterface {
    /// An interface searching through `searcher`
    pub fn new(
        searcher: Arc<dyn Searcher>,
        group_query: LdapQueryOnAttribute,
        group_name_attributes: Vec<String>,
        group_membership_attributes: Vec<String>,
        user_query: LdapQueryOnAttribute,
        user_name_attributes: Vec<String>,
    ) -> Self {
        Self {
            searcher,
            group_query,
            group_name_attributes,
            group_membership_attributes,
            user_query,
            user_name_attributes,
            cached_groups: Mutex::default(),
            cached_users: Mutex::default(),
        }
    }

    fn group_attributes(&self) -> Vec<String> {
        requested_attributes(
            &self.group_query,
            self.group_name_attributes
                .iter()
                .chain(&self.group_membership_attributes),
        )
    }

    fn user_attributes(&self) -> Vec<String> {
        requested_attributes(&self.user_query, self.user_name_attributes.iter())
    }

    /// The entry of the user with `uid`
    pub async fn user_entry_for(&self, uid: &str) -> Result<Entry> {
        let cached = self.cached_users.lock().get(uid).cloned();
        if let Some(entry) = cached {
            return Ok(entry);
        }
        let request = self.user_query.for_uid(uid, &self.user_attributes())?;
        let entry = exactly_one(self.searcher.search(&request).await?, &self.user_query, uid)?;
        self.cached_users.lock().insert(uid.to_owned(), entry.clone());
        Ok(entry)
    }
}

fn requested_attributes<'a>(query: &'a LdapQueryOnAttribute, others: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut attributes: Vec<String> = Vec::new();
    let uid = (!query.is_dn()).then_some(&query.query_attribute);
    for attribute in uid.into_iter().chain(others) {
        if !attribute.eq_ignore_ascii_case("dn")
            && !attributes.iter().any(|a| a.eq_ignore_ascii_case(attribute))
        {
            attributes.push(attribute.clone());
        }
    }
    attributes
}

fn uid_of(entry: &Entry, query: &LdapQueryOnAttribute) -> Option<String> {
    entry
        .first_value(std::slice::from_ref(&query.query_attribute))
        .map(str::to_owned)
}

fn exactly_one(mut entries: Vec<Entry>, query: &LdapQueryOnAttribute, uid: &str) -> Result<Entry> {
    match entries.len() {
        1 => Ok(entries.remove(0)),
        0 => Err(Error::EntryNotFound {
            attribute: query.query_attribute.clone(),
            uid: uid.to_owned(),
        }),
        count => Err(Error::MultipleEntries {
            attribute: query.query_attribute.clone(),
            uid: uid.to_owned(),
            count,
        }),
    }
}

#[async_trait]
impl LdapGroupLister for LdapInterface {
    async fn list_group_uids(&self) -> Result<Vec<String>> {
        let request = self.group_query.all(&self.group_attributes());
        let entries = self.searcher.search(&request).await?;
        let mut uids = Vec::with_capacity(entries.len());
        let mut cache = self.cached_groups.lock();
        for entry in entries {
            let uid = uid_of(&entry, &self.group_query).ok_or_else(|| Error::MissingAttribute {
                dn: entry.dn.clone(),
                attributes: vec![self.group_query.query_attribute.clone()],
            })?;
            cache.insert(uid.clone(), entry);
            uids.push(uid);
        }
        debug!(count = uids.len(), "listed LDAP groups");
        Ok(uids)
    }
}

#[async_trait]
impl LdapGroupGetter for LdapInterface {
    async fn group_entry_for(&self, uid: &str) -> Result<Entry> {
        let cached = self.cached_groups.lock().get(uid).cloned();
        if let Some(entry) = cached {
            return Ok(entry);
        }
        let request = self.group_query.for_uid(uid, &self.group_attributes())?;
        let entry = exactly_one(self.searcher.search(&request).await?, &self.group_query, uid)?;
        self.cached_groups.lock().insert(uid.to_owned(), entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl LdapMemberExtractor for LdapInterface {
    async fn extract_members(&self, uid: &str) -> Result<Vec<Entry>> {
        let group = self.group_entry_for(uid).await?;
        let mut members = Vec::new();
        for attribute in &self.group_membership_attributes {
            for member in group.values(attribute) {
                members.push(self.user_entry_for(member).await?);
            }
        }
        Ok(members)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::SearchRequest;
    use origin_config::types::{LdapQuery, Scope};

    /// A directory of fixed entries that answers the filters this crate builds
    pub(crate) struct FakeDirectory {
        pub(crate) entries: Vec<Entry>,
        pub(crate) searches: Mutex<Vec<SearchRequest>>,
    }

    impl FakeDirectory {
        pub(crate) fn new(entries: Vec<Entry>) -> Arc<Self> {
            Arc::new(Self {
                entries,
                searches: Mutex::default(),
            })
        }
    }

    // understands "(objectClass=X)" and "(&(objectClass=X)(attr=value))"
    fn matches(entry: &Entry, request: &SearchRequest) -> bool {
        if request.scope == Scope::Base {
            return entry.dn == request.base_dn;
        }
        if !entry.dn.ends_with(&request.base_dn) {
            return false;
        }
        let terms: Vec<&str> = request
            .filter
            .trim_start_matches("(&")
            .split(['(', ')'])
            .filter(|t| !t.is_empty())
            .collect();
        terms.iter().all(|term| {
            term.split_once('=')
                .is_some_and(|(attr, value)| entry.values(attr).iter().any(|v| v == value))
        })
    }

    #[async_trait]
    impl Searcher for FakeDirectory {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<Entry>> {
            self.searches.lock().push(request.clone());
            Ok(self
                .entries
                .iter()
                .filter(|e| matches(e, request))
                .cloned()
                .collect())
        }
    }

    pub(crate) fn directory() -> Vec<Entry> {
        vec![
            Entry::new("cn=admins,ou=groups,dc=example,dc=com")
                .with_attribute("objectClass", &["groupOfNames"])
                .with_attribute("cn", &["admins"])
                .with_attribute("member", &["alice", "bob"]),
            Entry::new("cn=empty,ou=groups,dc=example,dc=com")
                .with_attribute("objectClass", &["groupOfNames"])
                .with_attribute("cn", &["empty"]),
            Entry::new("uid=alice,ou=users,dc=example,dc=com")
                .with_attribute("objectClass", &["inetOrgPerson"])
                .with_attribute("uid", &["alice"])
                .with_attribute("mail", &["alice@example.com"]),
            Entry::new("uid=bob,ou=users,dc=example,dc=com")
                .with_attribute("objectClass", &["inetOrgPerson"])
                .with_attribute("uid", &["bob"])
                .with_attribute("mail", &["bob@example.com"]),
        ]
    }

    pub(crate) fn interface(searcher: Arc<dyn Searcher>) -> LdapInterface {
        let groups = LdapQuery {
            base_dn: "ou=groups,dc=example,dc=com".into(),
            filter: "(objectClass=groupOfNames)".into(),
            ..LdapQuery::default()
        };
        let users = LdapQuery {
            base_dn: "ou=users,dc=example,dc=com".into(),
            filter: "(objectClass=inetOrgPerson)".into(),
            ..LdapQuery::default()
        };
        LdapInterface::new(
            searcher,
            LdapQueryOnAttribute::new(&groups, "cn").unwrap(),
            vec!["cn".into()],
            vec!["member".into()],
            LdapQueryOnAttribute::new(&users, "uid").unwrap(),
            vec!["mail".into()],
        )
    }

    #[tokio::test]
    async fn lists_groups_and_caches_them() {
        let dir = FakeDirectory::new(directory());
        let ldap = interface(dir.clone());
        assert_eq!(ldap.list_group_uids().await.unwrap(), vec!["admins", "empty"]);
        assert_eq!(dir.searches.lock()[0].attributes, vec!["cn", "member"]);

        let entry = ldap.group_entry_for("admins").await.unwrap();
        assert_eq!(entry.dn, "cn=admins,ou=groups,dc=example,dc=com");
        assert_eq!(dir.searches.lock().len(), 1);
    }

    #[tokio::test]
    async fn members_resolve_to_user_entries() {
        let dir = FakeDirectory::new(directory());
        let ldap = interface(dir.clone());
        let members = ldap.extract_members("admins").await.unwrap();
        let dns: Vec<_> = members.iter().map(|m| m.dn.as_str()).collect();
        assert_eq!(dns, ["uid=alice,ou=users,dc=example,dc=com", "uid=bob,ou=users,dc=example,dc=com"]);
        assert_eq!(
            dir.searches.lock()[1].filter,
            "(&(objectClass=inetOrgPerson)(uid=alice))"
        );

        // second lookup is served from the cache
        ldap.extract_members("admins").await.unwrap();
        assert_eq!(dir.searches.lock().len(), 3);

        assert!(ldap.extract_members("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_and_ambiguous_uids_fail() {
        let mut entries = directory();
        entries.push(
            Entry::new("uid=bob2,ou=users,dc=example,dc=com")
                .with_attribute("objectClass", &["inetOrgPerson"])
                .with_attribute("uid", &["bob"]),
        );
        let ldap = interface(FakeDirectory::new(entries));
        assert!(matches!(
            ldap.group_entry_for("nobody").await,
            Err(Error::EntryNotFound { .. })
        ));
        assert!(matches!(
            ldap.user_entry_for("bob").await,
            Err(Error::MultipleEntries { count: 2, .. })
        ));
    }

    #[test]
    fn requested_attributes_lead_with_the_uid_and_skip_dn() {
        let query = LdapQuery {
            base_dn: "ou=groups,dc=example,dc=com".into(),
            ..LdapQuery::default()
        };
        let by_cn = LdapQueryOnAttribute::new(&query, "cn").unwrap();
        let others: Vec<String> = vec!["CN".into(), "dn".into(), "member".into(), "Member".into()];
        assert_eq!(requested_attributes(&by_cn, others.iter()), vec!["cn", "member"]);

        let by_dn = LdapQueryOnAttribute::new(&query, "dn").unwrap();
        assert_eq!(requested_attributes(&by_dn, others.iter()), vec!["CN", "member"]);
    }
}
