//! Name and object metadata validation
use crate::field::{Error, ErrorList, Path};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

const DNS1123_LABEL_MAX_LENGTH: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
const LABEL_VALUE_MAX_LENGTH: usize = 63;
const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * 1024;

/// Validates an object name; `prefix` is true when validating a `generateName` prefix.
///
/// Returns a list of human readable reasons, empty when the name is acceptable.
pub type ValidateNameFunc = fn(name: &str, prefix: bool) -> Vec<String>;

fn is_lower_alnum(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_dns1123_label_format(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    let last = value.chars().last().unwrap_or(first);
    is_lower_alnum(first) && is_lower_alnum(last) && value.chars().all(|c| is_lower_alnum(c) || c == '-')
}

/// Checks `value` is a DNS-1123 label, e.g. `my-name`
pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        errs.push(format!("must be no more than {DNS1123_LABEL_MAX_LENGTH} characters"));
    }
    if !is_dns1123_label_format(value) {
        errs.push(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character"
                .to_owned(),
        );
    }
    errs
}

/// Checks `value` is a DNS-1123 subdomain, e.g. `example.com`
pub fn is_dns1123_subdomain(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        errs.push(format!("must be no more than {DNS1123_SUBDOMAIN_MAX_LENGTH} characters"));
    }
    if !value.split('.').all(is_dns1123_label_format) {
        errs.push(
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, \
             '-' or '.', and must start and end with an alphanumeric character"
                .to_owned(),
        );
    }
    errs
}

fn is_name_part_format(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    let last = value.chars().last().unwrap_or(first);
    first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Checks `value` is a qualified name with an optional DNS subdomain prefix, e.g. `example.com/my-name`
pub fn is_qualified_name(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    let name = match value.split_once('/') {
        None => value,
        Some((prefix, name)) => {
            if prefix.is_empty() {
                errs.push("prefix part must be non-empty".to_owned());
            } else {
                errs.extend(is_dns1123_subdomain(prefix).into_iter().map(|e| format!("prefix part {e}")));
            }
            name
        }
    };
    if name.is_empty() {
        errs.push("name part must be non-empty".to_owned());
    } else if name.len() > QUALIFIED_NAME_MAX_LENGTH {
        errs.push(format!("name part must be no more than {QUALIFIED_NAME_MAX_LENGTH} characters"));
    }
    if !name.is_empty() && !is_name_part_format(name) {
        errs.push(
            "name part must consist of alphanumeric characters, '-', '_' or '.', \
             and must start and end with an alphanumeric character"
                .to_owned(),
        );
    }
    errs
}

/// Checks `value` may be used as a label value; the empty string is allowed
pub fn is_valid_label_value(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        errs.push(format!("must be no more than {LABEL_VALUE_MAX_LENGTH} characters"));
    }
    if !value.is_empty() && !is_name_part_format(value) {
        errs.push(
            "a valid label must be an empty string or consist of alphanumeric characters, '-', '_' or '.', \
             and must start and end with an alphanumeric character"
                .to_owned(),
        );
    }
    errs
}

fn mask_trailing_dash(name: &str) -> String {
    match name.strip_suffix('-') {
        Some(stripped) if !stripped.is_empty() => format!("{stripped}a"),
        _ => name.to_owned(),
    }
}

/// Name validator accepting DNS-1123 subdomains
pub fn name_is_dns_subdomain(name: &str, prefix: bool) -> Vec<String> {
    if prefix {
        is_dns1123_subdomain(&mask_trailing_dash(name))
    } else {
        is_dns1123_subdomain(name)
    }
}

/// Name validator accepting DNS-1123 labels; used for namespaces
pub fn name_is_dns_label(name: &str, prefix: bool) -> Vec<String> {
    if prefix {
        is_dns1123_label(&mask_trailing_dash(name))
    } else {
        is_dns1123_label(name)
    }
}

/// Validate label keys and values
pub fn validate_labels(labels: &BTreeMap<String, String>, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    for (k, v) in labels {
        for msg in is_qualified_name(k) {
            errs.push(Error::invalid(path, k.as_str(), msg));
        }
        for msg in is_valid_label_value(v) {
            errs.push(Error::invalid(path.key(k), v.as_str(), msg));
        }
    }
    errs
}

/// Validate annotation keys and the total annotation size
pub fn validate_annotations(annotations: &BTreeMap<String, String>, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    let mut total = 0usize;
    for (k, v) in annotations {
        for msg in is_qualified_name(&k.to_lowercase()) {
            errs.push(Error::invalid(path, k.as_str(), msg));
        }
        total += k.len() + v.len();
    }
    if total > TOTAL_ANNOTATION_SIZE_LIMIT {
        errs.push(Error::too_long(path, TOTAL_ANNOTATION_SIZE_LIMIT));
    }
    errs
}

fn validate_meta_contents(meta: &ObjectMeta, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    if let Some(labels) = &meta.labels {
        errs.extend(validate_labels(labels, &path.child("labels")));
    }
    if let Some(annotations) = &meta.annotations {
        errs.extend(validate_annotations(annotations, &path.child("annotations")));
    }
    if let Some(generation) = meta.generation {
        if generation < 0 {
            errs.push(Error::invalid(
                path.child("generation"),
                generation.to_string(),
                "must be greater than or equal to 0",
            ));
        }
    }
    errs
}

/// Validate the metadata of an object being created.
///
/// `namespaced` selects whether the namespace is required or forbidden, and `name_fn`
/// decides which names are acceptable for the kind.
pub fn validate_object_meta(
    meta: &ObjectMeta,
    namespaced: bool,
    name_fn: ValidateNameFunc,
    path: &Path,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let generate_name = meta.generate_name.as_deref().unwrap_or_default();
    if !generate_name.is_empty() {
        for msg in name_fn(generate_name, true) {
            errs.push(Error::invalid(path.child("generateName"), generate_name, msg));
        }
    }
    match meta.name.as_deref().unwrap_or_default() {
        "" => {
            if generate_name.is_empty() {
                errs.push(Error::required(path.child("name"), "name or generateName is required"));
            }
        }
        name => {
            for msg in name_fn(name, false) {
                errs.push(Error::invalid(path.child("name"), name, msg));
            }
        }
    }

    let namespace = meta.namespace.as_deref().unwrap_or_default();
    if namespaced {
        if namespace.is_empty() {
            errs.push(Error::required(path.child("namespace"), ""));
        } else {
            for msg in name_is_dns_label(namespace, false) {
                errs.push(Error::invalid(path.child("namespace"), namespace, msg));
            }
        }
    } else if !namespace.is_empty() {
        errs.push(Error::forbidden(path.child("namespace"), "not allowed on this type"));
    }

    errs.extend(validate_meta_contents(meta, path));
    errs
}

fn validate_immutable<T: PartialEq>(
    new: &Option<T>,
    old: &Option<T>,
    show: impl Fn(&T) -> String,
    path: Path,
    errs: &mut ErrorList,
) {
    if new != old {
        let shown = new.as_ref().map(show).unwrap_or_default();
        errs.push(Error::invalid(path, shown, "field is immutable"));
    }
}

/// Validate the metadata of an object being updated against its previous metadata
pub fn validate_object_meta_update(new: &ObjectMeta, old: &ObjectMeta, path: &Path) -> ErrorList {
    let mut errs = validate_meta_contents(new, path);
    validate_immutable(&new.name, &old.name, String::clone, path.child("name"), &mut errs);
    validate_immutable(
        &new.namespace,
        &old.namespace,
        String::clone,
        path.child("namespace"),
        &mut errs,
    );
    validate_immutable(&new.uid, &old.uid, String::clone, path.child("uid"), &mut errs);
    validate_immutable(
        &new.creation_timestamp,
        &old.creation_timestamp,
        |t| format!("{:?}", t.0),
        path.child("creationTimestamp"),
        &mut errs,
    );
    errs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ErrorType;

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.into()),
            ..ObjectMeta::default()
        }
    }

    #[test]
    fn dns_labels() {
        assert!(is_dns1123_label("openshift-infra").is_empty());
        assert!(is_dns1123_label("a").is_empty());
        assert!(!is_dns1123_label("").is_empty());
        assert!(!is_dns1123_label("-leading").is_empty());
        assert!(!is_dns1123_label("Upper").is_empty());
        assert!(!is_dns1123_label("has.dot").is_empty());
        assert!(!is_dns1123_label(&"a".repeat(64)).is_empty());
    }

    #[test]
    fn dns_subdomains() {
        assert!(is_dns1123_subdomain("config.openshift.io").is_empty());
        assert!(!is_dns1123_subdomain("double..dot").is_empty());
        assert!(!is_dns1123_subdomain("trailing.").is_empty());
    }

    #[test]
    fn qualified_names_and_label_values() {
        assert!(is_qualified_name("openshift.io/ldap.host").is_empty());
        assert!(is_qualified_name("app").is_empty());
        assert!(!is_qualified_name("/app").is_empty());
        assert!(!is_qualified_name("example.com/").is_empty());
        assert!(!is_qualified_name("bad key").is_empty());
        assert!(is_valid_label_value("").is_empty());
        assert!(is_valid_label_value("ldap.example.com_389").is_empty());
        assert!(!is_valid_label_value("ldap.example.com:389").is_empty());
    }

    #[test]
    fn object_meta_requires_name_or_generate_name() {
        let errs = validate_object_meta(&ObjectMeta::default(), false, name_is_dns_subdomain, &Path::new("metadata"));
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.type_, ErrorType::Required);
        assert_eq!(err.field, "metadata.name");

        let generated = ObjectMeta {
            generate_name: Some("builder-token-".into()),
            namespace: Some("ns".into()),
            ..ObjectMeta::default()
        };
        assert!(validate_object_meta(&generated, true, name_is_dns_subdomain, &Path::new("metadata")).is_empty());
    }

    #[test]
    fn object_meta_scopes_namespaces() {
        let mut m = meta("cluster");
        m.namespace = Some("default".into());
        let errs = validate_object_meta(&m, false, name_is_dns_subdomain, &Path::new("metadata"));
        assert_eq!(errs.iter().next().unwrap().type_, ErrorType::Forbidden);

        let errs = validate_object_meta(&meta("x"), true, name_is_dns_subdomain, &Path::new("metadata"));
        assert_eq!(errs.iter().next().unwrap().field, "metadata.namespace");
    }

    #[test]
    fn object_meta_checks_labels() {
        let mut m = meta("cluster");
        m.labels = Some([("app".to_string(), "not valid!".to_string())].into());
        let errs = validate_object_meta(&m, false, name_is_dns_subdomain, &Path::new("metadata"));
        assert_eq!(errs.iter().next().unwrap().field, "metadata.labels[app]");
    }

    #[test]
    fn update_rejects_renames() {
        let errs = validate_object_meta_update(&meta("new"), &meta("cluster"), &Path::new("metadata"));
        assert_eq!(errs.len(), 1);
        assert_eq!(
            errs.to_string(),
            "metadata.name: Invalid value: \"new\": field is immutable"
        );
        assert!(validate_object_meta_update(&meta("cluster"), &meta("cluster"), &Path::new("metadata")).is_empty());
    }
}
