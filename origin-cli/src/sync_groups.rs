//! `oc adm sync-groups`: mirror LDAP groups into OpenShift groups
use crate::{util::resolve_resource, Error, Result};
use origin_config::{load::read_ldap_sync_config, validation::validate_ldap_sync_config, LdapSyncConfig};
use origin_core::{Aggregate, Group};
use origin_groupsync::{
    listers::{AllOpenShiftGroupLister, LdapWhitelistGroupLister, OpenShiftWhitelistGroupLister},
    mappers::{EntryAttributeGroupNameMapper, UserDefinedGroupNameMapper, UserNameMapper},
    rfc2307::LdapInterface,
    GroupClient, LdapClientConfig, LdapGroupLister, LdapGroupNameMapper, LdapGroupSyncer,
    LdapQueryOnAttribute, Searcher,
};
use serde_json::json;
use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tracing::info;

/// Where the list of groups to sync comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// Group UIDs found on the LDAP server
    Ldap,
    /// OpenShift groups synced from LDAP before
    OpenShift,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ldap => "LDAP",
            Self::OpenShift => "OpenShift",
        })
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LDAP" => Ok(Self::Ldap),
            "OpenShift" => Ok(Self::OpenShift),
            other => Err(format!("sync source must be one of [LDAP OpenShift], not {other:?}")),
        }
    }
}

/// Which groups of the source are synced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Every group of the source
    All,
    /// Only the whitelisted groups
    Whitelist,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "All",
            Self::Whitelist => "Whitelist",
        })
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" => Ok(Self::All),
            "Whitelist" => Ok(Self::Whitelist),
            other => Err(format!("sync scope must be one of [All Whitelist], not {other:?}")),
        }
    }
}

/// How groups are printed when not confirmed
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML documents
    #[default]
    Yaml,
    /// Indented JSON
    Json,
}

/// Command line of `sync-groups`
#[derive(clap::Args, Clone, Debug, Default)]
pub struct SyncGroupsArgs {
    /// OpenShift groups to sync, as `name` or `groups/name`
    pub groups: Vec<String>,
    /// Path to a file listing group names or LDAP group UIDs, one per line
    #[arg(long)]
    pub whitelist: Option<PathBuf>,
    /// Path to the LDAP sync config
    #[arg(long = "sync-config")]
    pub sync_config: PathBuf,
    /// Sync only OpenShift groups that were synced from this LDAP server before
    #[arg(long)]
    pub existing: bool,
    /// Write the groups to OpenShift instead of printing them
    #[arg(long)]
    pub confirm: bool,
    /// Format of the printed groups
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

/// A fully resolved sync-groups invocation
#[derive(Clone, Debug)]
pub struct SyncGroupsOptions {
    /// Where group UIDs come from
    pub source: Source,
    /// Which groups are synced
    pub scope: Scope,
    /// The sync config file
    pub config_source: PathBuf,
    /// The decoded sync config
    pub config: LdapSyncConfig,
    /// The whitelist file, if any
    pub whitelist_source: Option<PathBuf>,
    /// Group names or LDAP UIDs to sync
    pub whitelist_contents: Vec<String>,
    /// Write the result
    pub confirm: bool,
    /// Printing format for unconfirmed runs
    pub output: OutputFormat,
}

/// Trimmed, non-blank lines of a whitelist file
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_owned(),
        source,
    })?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

fn aggregate<E>(errors: Vec<E>) -> Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    Aggregate::new(errors).map_or(Ok(()), |agg| Err(Error::Aggregate(agg)))
}

impl SyncGroupsOptions {
    /// Resolve the command line: pick source and scope, read the whitelist and the config
    pub fn complete(args: &SyncGroupsArgs) -> Result<Self> {
        let source = if args.existing {
            Source::OpenShift
        } else {
            Source::Ldap
        };
        let scope = if args.groups.is_empty() {
            Scope::All
        } else {
            Scope::Whitelist
        };

        let mut whitelist_contents = Vec::new();
        for arg in &args.groups {
            let (resource, name) = resolve_resource("groups", arg)?;
            if resource != "groups" {
                return Err(Error::NotAGroup(arg.clone()));
            }
            whitelist_contents.push(name);
        }
        if let Some(path) = &args.whitelist {
            whitelist_contents.extend(read_lines(path)?);
        }

        let config = read_ldap_sync_config(&args.sync_config)?;
        Ok(Self {
            source,
            scope,
            config_source: args.sync_config.clone(),
            config,
            whitelist_source: args.whitelist.clone(),
            whitelist_contents,
            confirm: args.confirm,
            output: args.output,
        })
    }

    /// Check the options are consistent and the config is valid
    pub fn validate(&self) -> Result<()> {
        if self.scope == Scope::Whitelist && self.whitelist_contents.is_empty() {
            return Err(Error::EmptyWhitelist(self.scope));
        }
        match validate_ldap_sync_config(&self.config).into_aggregate() {
            Some(errs) => Err(Error::InvalidSyncConfig(errs)),
            None => Ok(()),
        }
    }

    /// Connection settings for the configured LDAP server
    pub fn client_config(&self) -> Result<LdapClientConfig> {
        let c = &self.config;
        LdapClientConfig::new(&c.url, &c.bind_dn, &c.bind_password, &c.ca, c.insecure)
            .map_err(Error::LdapClientConfig)
    }

    /// Assemble the syncer for the configured schema, scope and source
    pub fn syncer(&self, searcher: Arc<dyn Searcher>, groups: Arc<dyn GroupClient>) -> Result<LdapGroupSyncer> {
        let client_config = self.client_config()?;
        let rfc2307 = self.config.rfc2307.as_ref().ok_or(Error::InvalidSchema)?;

        let group_query = LdapQueryOnAttribute::new(&rfc2307.all_groups_query, &rfc2307.group_uid_attribute)?;
        let user_query = LdapQueryOnAttribute::new(&rfc2307.all_users_query, &rfc2307.user_uid_attribute)?;
        let ldap = Arc::new(LdapInterface::new(
            searcher,
            group_query,
            rfc2307.group_name_attributes.clone(),
            rfc2307.group_membership_attributes.clone(),
            user_query,
            rfc2307.user_name_attributes.clone(),
        ));

        let group_name_mapper: Arc<dyn LdapGroupNameMapper> = if !self.config.group_uid_name_mapping.is_empty() {
            Arc::new(UserDefinedGroupNameMapper::new(
                self.config.group_uid_name_mapping.clone(),
            ))
        } else if !rfc2307.group_name_attributes.is_empty() {
            Arc::new(EntryAttributeGroupNameMapper::new(
                rfc2307.group_name_attributes.clone(),
                ldap.clone(),
            ))
        } else {
            return Err(Error::NoGroupNameMapper);
        };

        let host_name = client_config.host_name();
        let group_lister: Arc<dyn LdapGroupLister> = match (self.scope, self.source) {
            (Scope::Whitelist, Source::Ldap) => {
                Arc::new(LdapWhitelistGroupLister::new(self.whitelist_contents.clone()))
            }
            (Scope::Whitelist, Source::OpenShift) => Arc::new(OpenShiftWhitelistGroupLister::new(
                self.whitelist_contents.clone(),
                groups.clone(),
                host_name,
            )),
            (Scope::All, Source::Ldap) => ldap.clone(),
            (Scope::All, Source::OpenShift) => Arc::new(AllOpenShiftGroupLister::new(host_name, groups.clone())),
        };

        Ok(LdapGroupSyncer {
            group_lister,
            group_member_extractor: ldap,
            user_name_mapper: Arc::new(UserNameMapper::new(rfc2307.user_name_attributes.clone())),
            group_name_mapper,
            group_client: groups,
            host: client_config.host.clone(),
        })
    }

    /// Sync, or print what a sync would write.
    ///
    /// Failures for individual groups do not stop the run; they are returned together as
    /// [`Error::Aggregate`].
    pub async fn run<W: Write>(
        &self,
        searcher: Arc<dyn Searcher>,
        groups: Arc<dyn GroupClient>,
        out: &mut W,
    ) -> Result<()> {
        let syncer = self.syncer(searcher, groups)?;
        info!(source = %self.source, scope = %self.scope, confirm = self.confirm, "syncing groups");
        if self.confirm {
            let (_, errors) = syncer.sync().await;
            return aggregate(errors);
        }
        let (groups, errors) = syncer.resulting_groups().await;
        print_list(&groups, self.output, out)?;
        aggregate(errors)
    }
}

/// Print `groups` as a `v1` `List`
pub fn print_list<W: Write>(groups: &[Group], format: OutputFormat, out: &mut W) -> Result<()> {
    let list = json!({
        "apiVersion": "v1",
        "kind": "List",
        "metadata": {},
        "items": groups,
    });
    let res = match format {
        OutputFormat::Yaml => serde_yaml::to_writer(&mut *out, &list).map_err(|e| e.to_string()),
        OutputFormat::Json => serde_json::to_writer_pretty(&mut *out, &list)
            .map_err(|e| e.to_string())
            .and_then(|()| writeln!(out).map_err(|e| e.to_string())),
    };
    res.map_err(Error::Output)
}
