//! Turning LDAP entries into OpenShift user and group names
use crate::{
    interfaces::{LdapGroupGetter, LdapGroupNameMapper, LdapUserNameMapper},
    Entry, Error, Result,
};
use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Arc};

/// Names users after the first of several entry attributes that has a value
#[derive(Clone, Debug)]
pub struct UserNameMapper {
    attributes: Vec<String>,
}

impl UserNameMapper {
    /// Try `attributes` in order; `dn` means the entry's DN
    pub fn new(attributes: Vec<String>) -> Self {
        Self { attributes }
    }
}

impl LdapUserNameMapper for UserNameMapper {
    fn user_name_for(&self, entry: &Entry) -> Result<String> {
        entry
            .first_value(&self.attributes)
            .map(str::to_owned)
            .ok_or_else(|| Error::MissingAttribute {
                dn: entry.dn.clone(),
                attributes: self.attributes.clone(),
            })
    }
}

/// Names groups through an explicit LDAP UID to OpenShift name table
#[derive(Clone, Debug)]
pub struct UserDefinedGroupNameMapper {
    mapping: BTreeMap<String, String>,
}

impl UserDefinedGroupNameMapper {
    /// Map with `mapping`
    pub fn new(mapping: BTreeMap<String, String>) -> Self {
        Self { mapping }
    }
}

#[async_trait]
impl LdapGroupNameMapper for UserDefinedGroupNameMapper {
    async fn group_name_for(&self, uid: &str) -> Result<String> {
        self.mapping
            .get(uid)
            .cloned()
            .ok_or_else(|| Error::UnmappedGroup(uid.to_owned()))
    }
}

/// Names groups after the first of several attributes of their LDAP entry
pub struct EntryAttributeGroupNameMapper {
    attributes: Vec<String>,
    getter: Arc<dyn LdapGroupGetter>,
}

impl EntryAttributeGroupNameMapper {
    /// Look entries up through `getter` and try `attributes` in order
    pub fn new(attributes: Vec<String>, getter: Arc<dyn LdapGroupGetter>) -> Self {
        Self { attributes, getter }
    }
}

#[async_trait]
impl LdapGroupNameMapper for EntryAttributeGroupNameMapper {
    async fn group_name_for(&self, uid: &str) -> Result<String> {
        let entry = self.getter.group_entry_for(uid).await?;
        entry
            .first_value(&self.attributes)
            .map(str::to_owned)
            .ok_or_else(|| Error::MissingAttribute {
                dn: entry.dn.clone(),
                attributes: self.attributes.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc2307::tests::{directory, interface, FakeDirectory};

    #[test]
    fn user_names_come_from_the_first_attribute_with_a_value() {
        let mapper = UserNameMapper::new(vec!["displayName".into(), "mail".into()]);
        let alice = Entry::new("uid=alice").with_attribute("mail", &["alice@example.com"]);
        assert_eq!(mapper.user_name_for(&alice).unwrap(), "alice@example.com");

        let err = mapper.user_name_for(&Entry::new("uid=nobody")).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"no value for any of the attributes ["displayName", "mail"] on entry "uid=nobody""#
        );
    }

    #[tokio::test]
    async fn user_defined_mapping() {
        let mapper = UserDefinedGroupNameMapper::new(BTreeMap::from([("admins".into(), "cluster-admins".into())]));
        assert_eq!(mapper.group_name_for("admins").await.unwrap(), "cluster-admins");
        assert!(matches!(
            mapper.group_name_for("other").await,
            Err(Error::UnmappedGroup(uid)) if uid == "other"
        ));
    }

    #[tokio::test]
    async fn entry_attribute_mapping() {
        let ldap = Arc::new(interface(FakeDirectory::new(directory())));
        let mapper = EntryAttributeGroupNameMapper::new(vec!["cn".into()], ldap);
        assert_eq!(mapper.group_name_for("admins").await.unwrap(), "admins");
        assert!(mapper.group_name_for("missing").await.is_err());
    }
}
