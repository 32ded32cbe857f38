//! Profile loading from YAML and JSON documents
//!
//! YAML is parsed with yaml-rust2 and converted to `serde_json::Value`, so a
//! single set of serde derives covers both formats. Loading never validates;
//! resolution does.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::profile::IngestionProfile;
use crate::{Error, Result};

const YAML: &str = "yaml";
const JSON: &str = "json";
const ROOT_PATH: &str = "$";

impl IngestionProfile {
    /// Load a profile from a YAML document
    ///
    /// Multi-document input is rejected; use [`load_profiles`] for that.
    pub fn from_yaml(input: &str) -> Result<Self> {
        let mut docs = parse_documents(input)?;
        match docs.len() {
            0 => Err(Error::config_for_format(YAML, "profile document is empty")),
            1 => decode(docs.remove(0), YAML),
            n => Err(Error::config_for_format(
                YAML,
                format!("expected a single profile document, found {n}"),
            )),
        }
    }

    /// Load a profile from a JSON document
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| Error::config_for_format(JSON, e.to_string()))
    }
}

/// Load every profile from a multi-document YAML stream
///
/// Documents separated by `---` each describe one gateway deployment. Empty
/// documents are skipped.
pub fn load_profiles(input: &str) -> Result<Vec<IngestionProfile>> {
    parse_documents(input)?
        .into_iter()
        .filter(|doc| !doc.is_null())
        .map(|doc| decode(doc, YAML))
        .collect()
}

fn decode<T: DeserializeOwned>(value: Value, format: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::config_for_format(format, e.to_string()))
}

fn parse_documents(input: &str) -> Result<Vec<Value>> {
    let docs =
        YamlLoader::load_from_str(input).map_err(|e| Error::config_for_format(YAML, e.to_string()))?;
    docs.into_iter().map(|doc| to_json(doc, ROOT_PATH)).collect()
}

fn node_error(path: &str, msg: impl std::fmt::Display) -> Error {
    Error::config_for_format(YAML, format!("{path}: {msg}"))
}

/// Convert one YAML node, tracking its location for error messages
///
/// Profile fields are all string-keyed, so mappings only accept string keys.
fn to_json(node: Yaml, path: &str) -> Result<Value> {
    let value = match node {
        Yaml::Null => Value::Null,
        Yaml::Boolean(b) => Value::Bool(b),
        Yaml::Integer(i) => Value::Number(i.into()),
        Yaml::Real(text) => {
            let parsed = text
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| node_error(path, format!("'{text}' is not a finite number")))?;
            Value::Number(parsed)
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| to_json(item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Hash(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, item) in entries {
                let Yaml::String(key) = key else {
                    return Err(node_error(path, "mapping keys must be strings"));
                };
                let item = to_json(item, &format!("{path}.{key}"))?;
                object.insert(key, item);
            }
            Value::Object(object)
        }
        Yaml::Alias(_) => return Err(node_error(path, "aliases are not supported")),
        Yaml::BadValue => return Err(node_error(path, "malformed value")),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{BackendVariant, ListenerPorts, SinkTarget, Tier};

    #[test]
    fn story_minimal_yaml_profile_gets_defaults() {
        let yaml = r#"
tier: small
sinkTarget: streamService
"#;
        let profile = IngestionProfile::from_yaml(yaml).unwrap();
        assert_eq!(profile.tier, Tier::Small);
        assert_eq!(profile.backend_variant, BackendVariant::ContainerProxyAgent);
        assert_eq!(profile.sink_target, SinkTarget::StreamService);
        assert_eq!(profile.endpoint_path, "/collect");
        assert_eq!(profile.listener_ports, ListenerPorts::default());
    }

    #[test]
    fn story_full_yaml_profile() {
        let yaml = r#"
tier: large
backendVariant: serverlessProxyAgent
sinkTarget: messageBroker
tlsCertificateRef: cert-1
endpointPath: /ingest
useAlternateArchitecture: true
streamAckEnabled: true
listenerPorts:
  http: 8080
"#;
        let profile = IngestionProfile::from_yaml(yaml).unwrap();
        assert_eq!(profile.tier, Tier::Large);
        assert_eq!(profile.backend_variant, BackendVariant::ServerlessProxyAgent);
        assert_eq!(profile.tls_certificate_ref.as_deref(), Some("cert-1"));
        assert_eq!(profile.endpoint_path, "/ingest");
        assert!(profile.use_alternate_architecture);
        assert!(profile.stream_ack_enabled);
        assert!(!profile.attach_shared_storage);
        assert_eq!(profile.listener_ports.http, 8080);
        assert_eq!(profile.listener_ports.https, 443);
    }

    #[test]
    fn story_loading_does_not_validate() {
        let yaml = r#"
tier: xsmall
backendVariant: functionReceiver
sinkTarget: none
"#;
        let profile = IngestionProfile::from_yaml(yaml).unwrap();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn story_unknown_tier_is_a_config_error() {
        let err = IngestionProfile::from_yaml("tier: huge\nsinkTarget: none").unwrap_err();
        match err {
            Error::Config { format, message } => {
                assert_eq!(format.as_deref(), Some("yaml"));
                assert!(message.contains("huge"));
            }
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn story_empty_and_multi_document_rejected() {
        assert!(IngestionProfile::from_yaml("").is_err());
        let yaml = "tier: small\nsinkTarget: none\n---\ntier: large\nsinkTarget: none\n";
        let err = IngestionProfile::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn story_load_profiles_reads_every_document() {
        let yaml = r#"
tier: small
sinkTarget: streamService
---
tier: medium
backendVariant: functionReceiver
sinkTarget: messageBroker
"#;
        let profiles = load_profiles(yaml).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].tier, Tier::Small);
        assert_eq!(profiles[1].backend_variant, BackendVariant::FunctionReceiver);
    }

    #[test]
    fn story_non_string_key_reports_its_location() {
        let yaml = "tier: small\nsinkTarget: none\nlistenerPorts:\n  1: 8080\n";
        let err = IngestionProfile::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("$.listenerPorts"), "{err}");
        assert!(err.to_string().contains("mapping keys must be strings"));
    }

    #[test]
    fn story_invalid_yaml_is_a_config_error() {
        assert!(matches!(
            IngestionProfile::from_yaml("not: valid: yaml: {{"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn story_json_profile() {
        let json = r#"{"tier":"medium","backendVariant":"containerProxyOnly","sinkTarget":"none"}"#;
        let profile = IngestionProfile::from_json(json).unwrap();
        assert_eq!(profile.tier, Tier::Medium);
        assert_eq!(profile.backend_variant, BackendVariant::ContainerProxyOnly);

        let json = r#"{"tier":"large","backendVariant":"containerServer","sinkTarget":"messageBroker"}"#;
        let profile = IngestionProfile::from_json(json).unwrap();
        assert_eq!(profile.backend_variant, BackendVariant::ContainerServer);

        let err = IngestionProfile::from_json("{").unwrap_err();
        assert!(matches!(err, Error::Config { format: Some(ref f), .. } if f == "json"));
    }
}
