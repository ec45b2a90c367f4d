//! Directory entries and the LDIF text `ldapsearch` prints them as
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine};

/// One directory entry
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    /// Distinguished name
    pub dn: String,
    /// Attribute names and values, in the order they were returned
    pub attributes: Vec<(String, Vec<String>)>,
}

impl Entry {
    /// An entry without attributes
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Add values for an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: &str, values: &[&str]) -> Self {
        for value in values {
            self.push(name, (*value).to_owned());
        }
        self
    }

    fn push(&mut self, name: &str, value: String) {
        match self
            .attributes
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, values)) => values.push(value),
            None => self.attributes.push((name.to_owned(), vec![value])),
        }
    }

    /// Values of an attribute; names compare case-insensitively
    pub fn values(&self, name: &str) -> &[String] {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map_or(&[][..], |(_, values)| values.as_slice())
    }

    /// The first non-empty value among `names`, tried in order; `dn` is the entry's DN
    pub fn first_value(&self, names: &[String]) -> Option<&str> {
        names.iter().find_map(|name| {
            if name.eq_ignore_ascii_case("dn") {
                Some(self.dn.as_str()).filter(|dn| !dn.is_empty())
            } else {
                self.values(name)
                    .iter()
                    .map(String::as_str)
                    .find(|v| !v.is_empty())
            }
        })
    }
}

/// Join folded lines and drop comments
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut in_comment = false;
    for raw in text.lines() {
        if let Some(rest) = raw.strip_prefix(' ') {
            match lines.last_mut() {
                _ if in_comment => {}
                Some(last) if !last.is_empty() => last.push_str(rest),
                _ => lines.push(rest.to_owned()),
            }
            continue;
        }
        in_comment = raw.starts_with('#');
        if !in_comment {
            lines.push(raw.to_owned());
        }
    }
    lines
}

fn parse_line(line: &str) -> Result<(&str, String)> {
    let (name, rest) = line
        .split_once(':')
        .ok_or_else(|| Error::Ldif(format!("missing ':' in line {line:?}")))?;
    if let Some(encoded) = rest.strip_prefix(':') {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Ldif(format!("invalid base64 value of {name}: {e}")))?;
        return Ok((name, String::from_utf8_lossy(&bytes).into_owned()));
    }
    if rest.starts_with('<') {
        return Err(Error::Ldif(format!("URL values are not supported ({name})")));
    }
    Ok((name, rest.trim_start_matches(' ').to_owned()))
}

/// Parse LDIF content records separated by blank lines
pub fn parse(text: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut current: Option<Entry> = None;
    for line in unfold(text) {
        if line.is_empty() {
            entries.extend(current.take());
            continue;
        }
        let (name, value) = parse_line(&line)?;
        match current.as_mut() {
            Some(entry) => entry.push(name, value),
            None if name.eq_ignore_ascii_case("dn") => current = Some(Entry::new(value)),
            None if name.eq_ignore_ascii_case("version") => {}
            None => return Err(Error::Ldif(format!("record does not start with dn: {line:?}"))),
        }
    }
    entries.extend(current);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_with_folding_and_base64() {
        let ldif = "\
# extended LDIF
version: 1

dn: cn=admins,ou=groups,dc=example,dc=com
cn: admins
member: cn=alice,ou=users,
 dc=example,dc=com
member: cn=bob,ou=users,dc=example,dc=com
description:: w6lxdWlwZQ==

# a comment
#  folded into the comment
dn:: Y249w6l2ZSxvdT11c2VycyxkYz1leGFtcGxlLGRjPWNvbQ==
mail: eve@example.com
";
        let entries = parse(ldif).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].dn, "cn=admins,ou=groups,dc=example,dc=com");
        assert_eq!(
            entries[0].values("MEMBER"),
            ["cn=alice,ou=users,dc=example,dc=com", "cn=bob,ou=users,dc=example,dc=com"]
        );
        assert_eq!(entries[0].values("description"), ["équipe"]);
        assert_eq!(entries[1].dn, "cn=éve,ou=users,dc=example,dc=com");
        assert_eq!(entries[1].values("mail"), ["eve@example.com"]);
        assert!(entries[1].values("cn").is_empty());
    }

    #[test]
    fn empty_output_has_no_entries() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse("cn: orphan\n").is_err());
        assert!(parse("dn: cn=x\nno colon here\n").is_err());
        assert!(parse("dn: cn=x\njpegPhoto:< file:///tmp/x\n").is_err());
    }

    #[test]
    fn first_value_tries_names_in_order() {
        let entry = Entry::new("cn=alice,dc=example,dc=com")
            .with_attribute("mail", &[""])
            .with_attribute("uid", &["alice"]);
        let names = |n: &[&str]| n.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>();
        assert_eq!(entry.first_value(&names(&["mail", "uid"])), Some("alice"));
        assert_eq!(entry.first_value(&names(&["dn", "uid"])), Some("cn=alice,dc=example,dc=com"));
        assert_eq!(entry.first_value(&names(&["cn"])), None);
    }
}
