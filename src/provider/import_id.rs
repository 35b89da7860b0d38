//! Parsing of composite import identifiers such as `"networkId,vlanId"`.

use super::Diagnostics;

/// Splits `id` on commas into exactly `N` non-empty, trimmed parts.
///
/// `fields` names the parts and is only used to build the error message.
pub fn parse_import_id<const N: usize>(
    id: &str,
    fields: [&str; N],
) -> Result<[String; N], Diagnostics> {
    let parts: Vec<&str> = id.split(',').map(str::trim).collect();

    if parts.len() != N || parts.iter().any(|p| p.is_empty()) {
        return Err(Diagnostics::error(
            "Unexpected Import Identifier",
            format!(
                "Expected import identifier with format: {}. Got: {:?}",
                fields.join(","),
                id
            ),
        ));
    }

    Ok(std::array::from_fn(|i| parts[i].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_parts() {
        let [network_id, vlan_id] =
            parse_import_id("N_1234, 10", ["network_id", "vlan_id"]).unwrap();

        assert_eq!(network_id, "N_1234");
        assert_eq!(vlan_id, "10");
    }

    #[test]
    fn test_parse_single_part() {
        let [network_id] = parse_import_id("L_5678", ["network_id"]).unwrap();
        assert_eq!(network_id, "L_5678");
    }

    #[test]
    fn test_wrong_number_of_parts() {
        let err = parse_import_id("N_1234", ["network_id", "vlan_id"]).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("network_id,vlan_id"));
        assert!(message.contains(r#""N_1234""#));

        assert!(parse_import_id("a,b,c", ["network_id", "vlan_id"]).is_err());
        assert!(parse_import_id("a,b", ["network_id"]).is_err());
    }

    #[test]
    fn test_empty_parts_rejected() {
        assert!(parse_import_id("N_1234,", ["network_id", "vlan_id"]).is_err());
        assert!(parse_import_id(" ,10", ["network_id", "vlan_id"]).is_err());
        assert!(parse_import_id("", ["network_id"]).is_err());
    }
}
