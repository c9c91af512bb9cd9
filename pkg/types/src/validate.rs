use anyhow::{Result, bail};

/// Maximum length of a DNS-1123 subdomain.
const DNS1123_SUBDOMAIN_MAX_LEN: usize = 253;

/// Validate a Kubernetes-style resource name.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > 63 {
        bail!("name '{}' exceeds 63 characters (got {})", name, name.len());
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

/// Validate a DNS-1123 subdomain such as an ExternalName target.
/// Rules: max 253 chars, dot-separated labels of `[a-z0-9-]`,
/// each starting and ending with an alphanumeric character.
pub fn validate_dns1123_subdomain(value: &str) -> Result<()> {
    if value.is_empty() {
        bail!("subdomain must not be empty");
    }
    if value.len() > DNS1123_SUBDOMAIN_MAX_LEN {
        bail!(
            "subdomain '{}' exceeds {} characters (got {})",
            value,
            DNS1123_SUBDOMAIN_MAX_LEN,
            value.len()
        );
    }
    for label in value.split('.') {
        let valid_edge = |c: Option<char>| {
            c.map(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                .unwrap_or(false)
        };
        if !valid_edge(label.chars().next()) || !valid_edge(label.chars().last()) {
            bail!(
                "subdomain '{}' must consist of labels that start and end with [a-z0-9]",
                value
            );
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            bail!(
                "subdomain '{}' must contain only lowercase letters, digits, '-' and '.'",
                value
            );
        }
    }
    Ok(())
}

/// Split a `namespace/name` key.
/// The namespace must be a valid name, the name a DNS-1123 subdomain.
pub fn parse_name_ns(key: &str) -> Result<(String, String)> {
    let (ns, name) = match key.split('/').collect::<Vec<_>>().as_slice() {
        [ns, name] if !ns.is_empty() && !name.is_empty() => (ns.to_string(), name.to_string()),
        _ => bail!("invalid format (namespace/name) found in '{}'", key),
    };
    validate_name(&ns)
        .map_err(|e| anyhow::anyhow!("invalid namespace in '{}': {}", key, e))?;
    validate_dns1123_subdomain(&name)
        .map_err(|e| anyhow::anyhow!("invalid name in '{}': {}", key, e))?;
    Ok((ns, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("nginx").is_ok());
        assert!(validate_name("my-app").is_ok());
        assert!(validate_name("app-123").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name("a-b-c-d").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("My-App").is_err());
        assert!(validate_name("my_app").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name("special!char").is_err());
        assert!(validate_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn valid_subdomains() {
        assert!(validate_dns1123_subdomain("example.com").is_ok());
        assert!(validate_dns1123_subdomain("my-db.prod.svc.cluster.local").is_ok());
        assert!(validate_dns1123_subdomain("a").is_ok());
        assert!(validate_dns1123_subdomain("10.0.0.1").is_ok());
    }

    #[test]
    fn invalid_subdomains() {
        assert!(validate_dns1123_subdomain("").is_err());
        assert!(validate_dns1123_subdomain("Example.com").is_err());
        assert!(validate_dns1123_subdomain("foo..bar").is_err());
        assert!(validate_dns1123_subdomain("-foo.bar").is_err());
        assert!(validate_dns1123_subdomain("foo_bar.com").is_err());
        assert!(validate_dns1123_subdomain(&"a".repeat(254)).is_err());
    }

    #[test]
    fn name_ns_keys() {
        assert_eq!(
            parse_name_ns("ingress/tcp-services").unwrap(),
            ("ingress".to_string(), "tcp-services".to_string())
        );
        assert!(parse_name_ns("tcp-services").is_err());
        assert!(parse_name_ns("a/b/c").is_err());
        assert!(parse_name_ns("/name").is_err());
    }

    #[test]
    fn name_ns_keys_validate_both_halves() {
        assert_eq!(
            parse_name_ns("ingress/tls.example.com").unwrap(),
            ("ingress".to_string(), "tls.example.com".to_string())
        );
        assert!(parse_name_ns("Ingress/tcp-services").is_err());
        assert!(parse_name_ns("my.ns/tcp-services").is_err());
        assert!(parse_name_ns("ingress/TCP_services").is_err());
        assert!(parse_name_ns("-ingress/tcp-services").is_err());
    }
}
