use argent_dns_domain::config::dns::DnsConfig;
use argent_dns_domain::{Config, GroupName};

#[test]
fn test_config_default_values() {
    let config = DnsConfig::default();

    assert_eq!(config.upstream_timeout_ms, 2000);
    assert!(config.upstream_servers.is_empty());
    assert_eq!(config.groups.len(), 1);
    assert_eq!(config.groups[0].name, "default");
    assert_eq!(config.bootstrap.servers.len(), 4);
    assert_eq!(config.bootstrap.timeout_ms, 2000);
}

#[test]
fn test_default_config_validates() {
    let config = Config::default();
    assert!(config.validate().is_ok(), "{:?}", config.validate().err());
}

#[test]
fn test_flat_upstream_servers_promoted_to_default_group() {
    let toml_str = r#"
        upstream_servers = ["8.8.8.8:53", "1.1.1.1:53"]
    "#;

    let config: DnsConfig = toml::from_str(toml_str).unwrap();
    let groups = config.upstream_groups().unwrap();

    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.name == GroupName::Default));
    assert_eq!(groups[0].address.as_ref(), "8.8.8.8:53");
}

#[test]
fn test_groups_deserialize_with_match_rules() {
    let toml_str = r#"
        [[groups]]
        name = "default"
        address = "https://unfiltered.adguard-dns.com/dns-query"

        [[groups]]
        name = "office"
        address = "192.168.1.2:53"

        [[groups.match]]
        client = "10.0.0.0/8"
        question_domain = "Corp.Example.COM"

        [[groups.match]]
        question_domain = "internal.example.com"
    "#;

    let config: DnsConfig = toml::from_str(toml_str).unwrap();
    let groups = config.upstream_groups().unwrap();

    assert_eq!(groups.len(), 2);

    let office = &groups[1];
    assert_eq!(office.name, GroupName::parse("office"));
    assert_eq!(office.match_criteria.len(), 2);
    assert_eq!(
        office.match_criteria[0].client,
        Some("10.0.0.0/8".parse().unwrap())
    );
    // Normalization of the domain happens at table construction, not here.
    assert_eq!(
        office.match_criteria[0].question_domain.as_deref(),
        Some("Corp.Example.COM")
    );
    assert!(office.match_criteria[1].client.is_none());
}

#[test]
fn test_invalid_client_prefix_is_annotated() {
    let toml_str = r#"
        [[groups]]
        name = "office"
        address = "192.168.1.2:53"

        [[groups.match]]
        client = "not-a-cidr"
    "#;

    let config: DnsConfig = toml::from_str(toml_str).unwrap();
    let err = config.upstream_groups().unwrap_err().to_string();

    assert!(err.contains("office"), "missing group name: {}", err);
    assert!(err.contains("index 0"), "missing index: {}", err);
}

#[test]
fn test_validate_requires_default_group() {
    let toml_str = r#"
        [[groups]]
        name = "office"
        address = "192.168.1.2:53"

        [[groups.match]]
        client = "10.0.0.0/8"
    "#;

    let config: DnsConfig = toml::from_str(toml_str).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_criteria_on_reserved_group() {
    let toml_str = r#"
        [[groups]]
        name = "default"
        address = "8.8.8.8:53"

        [[groups.match]]
        client = "10.0.0.0/8"
    "#;

    let config: DnsConfig = toml::from_str(toml_str).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_bind_retry_interval() {
    let toml_str = r#"
        [server.bind_retry]
        enabled = true
        interval_ms = 0
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_deserialization_ignores_unknown_fields() {
    let toml_str = r#"
        cache_enabled = true
        dnssec_enabled = false
    "#;

    let config: Result<DnsConfig, _> = toml::from_str(toml_str);
    assert!(
        config.is_ok(),
        "Config with unrelated fields should still deserialize: {:?}",
        config.err()
    );
}
