use regex::Regex;
use std::net::Ipv4Addr;
use std::str::FromStr;

// Names end up inside a fully-qualified name of at most 255 bytes, 63 of which
// belong to the zone.
const MAX_NAME_LEN: usize = 255 - 63;
const MAX_DOMAIN_LEN: usize = 63;
const MAX_IPV4_LEN: usize = 15;

/// Server friendly name: alphanumerics and `-`.
pub fn valid_name(name: &str) -> bool {
    name.len() < MAX_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Domain as it appears in operator requests: alphanumerics, `-` and `.`.
pub fn valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() < MAX_DOMAIN_LEN
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Dotted-quad IPv4 only.
pub fn valid_ip(ip: &str) -> bool {
    ip.len() <= MAX_IPV4_LEN
        && ip.chars().all(|c| c.is_ascii_digit() || c == '.')
        && Ipv4Addr::from_str(ip).is_ok()
}

/// Zone apex from configuration, e.g. `example.com`.
pub fn validate_zone_apex(zone: &str) -> bool {
    if zone.is_empty() || zone.len() > 253 {
        return false;
    }

    let re = Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*\.?$")
        .expect("zone pattern is valid");
    re.is_match(zone)
}
