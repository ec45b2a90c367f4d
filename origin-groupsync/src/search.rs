//! Running directory searches
use crate::{ldif, Entry, Error, LdapClientConfig, Result, SearchRequest};
use async_trait::async_trait;
use std::{io::Write, path::Path};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

/// Runs a search against a directory
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Entries matching `request`; none when the base DN does not exist
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Entry>>;
}

/// `ldapsearch` result code for a base DN that does not exist
const NO_SUCH_OBJECT: i32 = 32;

/// A [`Searcher`] that runs the OpenLDAP `ldapsearch` tool
#[derive(Clone, Debug)]
pub struct LdapSearch {
    config: LdapClientConfig,
    program: String,
}

impl LdapSearch {
    /// Search the server described by `config` with `ldapsearch` from `PATH`
    pub fn new(config: LdapClientConfig) -> Self {
        Self {
            config,
            program: "ldapsearch".to_owned(),
        }
    }

    /// Use another executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The command line for `request`.
    ///
    /// The bind password is read by the tool from `password_file` and never appears on the
    /// command line.
    pub fn args(&self, request: &SearchRequest, password_file: Option<&Path>) -> Vec<String> {
        let mut args: Vec<String> = ["-LLL", "-x", "-o", "ldif-wrap=no", "-H"]
            .into_iter()
            .map(String::from)
            .collect();
        args.push(self.config.url());
        if self.config.start_tls() {
            args.push("-ZZ".into());
        }
        if !self.config.bind_dn.is_empty() {
            args.extend(["-D".into(), self.config.bind_dn.clone()]);
            if let Some(path) = password_file {
                args.extend(["-y".into(), path.display().to_string()]);
            }
        }
        args.extend([
            "-b".into(),
            request.base_dn.clone(),
            "-s".into(),
            request.scope.to_string(),
            "-a".into(),
            request.deref_aliases.to_string(),
            "-l".into(),
            request.timeout.to_string(),
            request.filter.clone(),
        ]);
        args.extend(request.attributes.iter().cloned());
        args
    }

    /// A private file holding the bind password, for simple binds
    fn password_file(&self) -> Result<Option<NamedTempFile>> {
        if self.config.bind_dn.is_empty() {
            return Ok(None);
        }
        // created 0600; the tool reads the whole file, so no trailing newline
        let mut file = tempfile::Builder::new()
            .prefix("ldapsearch-")
            .tempfile()
            .map_err(Error::PasswordFile)?;
        file.write_all(self.config.bind_password.as_bytes())
            .and_then(|()| file.flush())
            .map_err(Error::PasswordFile)?;
        Ok(Some(file))
    }
}

#[async_trait]
impl Searcher for LdapSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Entry>> {
        debug!(base = %request.base_dn, filter = %request.filter, "searching");
        let password_file = self.password_file()?;
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(request, password_file.as_ref().map(NamedTempFile::path)))
            .kill_on_drop(true);
        if !self.config.ca.is_empty() {
            cmd.env("LDAPTLS_CACERT", &self.config.ca);
        }
        let out = cmd.output().await.map_err(|source| Error::SpawnSearch {
            program: self.program.clone(),
            source,
        })?;
        drop(password_file);
        match out.status.code() {
            Some(0) => ldif::parse(&String::from_utf8_lossy(&out.stdout)),
            Some(NO_SUCH_OBJECT) => Ok(Vec::new()),
            _ => Err(Error::Search {
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use origin_config::types::{DerefAliases, Scope};

    fn request() -> SearchRequest {
        SearchRequest {
            base_dn: "ou=groups,dc=example,dc=com".into(),
            scope: Scope::WholeSubtree,
            deref_aliases: DerefAliases::FindingBase,
            timeout: 0,
            filter: "(objectClass=groupOfNames)".into(),
            attributes: vec!["cn".into(), "member".into()],
        }
    }

    #[test]
    fn args_with_bind_and_start_tls() {
        let config = LdapClientConfig::new("ldap://ldap.example.com", "cn=admin", "secret", "", false).unwrap();
        let args = LdapSearch::new(config).args(&request(), Some(Path::new("/tmp/ldapsearch-pw")));
        assert_eq!(
            args,
            [
                "-LLL", "-x", "-o", "ldif-wrap=no", "-H", "ldap://ldap.example.com:389", "-ZZ",
                "-D", "cn=admin", "-y", "/tmp/ldapsearch-pw", "-b", "ou=groups,dc=example,dc=com",
                "-s", "sub", "-a", "find", "-l", "0", "(objectClass=groupOfNames)", "cn", "member",
            ]
        );
        assert!(!args.iter().any(|a| a.contains("secret")));
        assert!(!args.contains(&"-w".to_owned()));
    }

    #[test]
    fn args_anonymous_ldaps() {
        let config = LdapClientConfig::new("ldaps://ldap.example.com", "", "", "", false).unwrap();
        let searcher = LdapSearch::new(config);
        assert!(searcher.password_file().unwrap().is_none());
        let args = searcher.args(&request(), None);
        assert!(!args.contains(&"-ZZ".to_owned()));
        assert!(!args.contains(&"-y".to_owned()));
        assert!(!args.contains(&"-D".to_owned()));
        assert_eq!(args[5], "ldaps://ldap.example.com:636");
    }

    #[cfg(unix)]
    fn script(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_the_tool_and_parses_its_output() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(
            &dir,
            "ldapsearch",
            "printf 'dn: cn=admins,dc=example,dc=com\\ncn: admins\\nca: %s\\n' \"$LDAPTLS_CACERT\"",
        );
        let config = LdapClientConfig::new("ldaps://ldap.example.com", "", "", "/etc/ca.crt", false).unwrap();
        let searcher = LdapSearch::new(config).with_program(program);
        let entries = searcher.search(&request()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].values("cn"), ["admins"]);
        assert_eq!(entries[0].values("ca"), ["/etc/ca.crt"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let config = LdapClientConfig::new("ldap://ldap.example.com", "", "", "", true).unwrap();

        let missing_base = LdapSearch::new(config.clone()).with_program(script(&dir, "missing-base", "exit 32"));
        assert!(missing_base.search(&request()).await.unwrap().is_empty());

        let failing = LdapSearch::new(config).with_program(script(&dir, "bad-bind", "echo 'invalid credentials' >&2; exit 49"));
        let err = failing.search(&request()).await.unwrap_err();
        assert!(err.to_string().ends_with(": invalid credentials"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn bind_password_is_passed_in_a_private_file() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let program = script(
            &dir,
            "ldapsearch",
            r#"argv="$*"
while [ $# -gt 0 ]; do
  if [ "$1" = "-y" ]; then pwfile="$2"; fi
  shift
done
printf 'dn: cn=admins,dc=example,dc=com\nargv: %s\npwfile: %s\npassword: %s\n' "$argv" "$pwfile" "$(cat "$pwfile")""#,
        );
        let config = LdapClientConfig::new("ldap://ldap.example.com", "cn=admin", "hunter2", "", true).unwrap();
        let searcher = LdapSearch::new(config).with_program(program);

        let file = searcher.password_file().unwrap().unwrap();
        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "hunter2");
        drop(file);

        let entries = searcher.search(&request()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].values("argv")[0].contains("hunter2"));
        assert_eq!(entries[0].values("password"), ["hunter2"]);
        let pwfile = &entries[0].values("pwfile")[0];
        assert!(!Path::new(pwfile).exists(), "password file {pwfile} left behind");
    }
}
