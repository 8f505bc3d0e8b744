// Copyright (c) 2025 - Cowboy AI, Inc.
//! Encryption Key Resolution Rules
//!
//! Pure functions deciding key family, backup key and whether the key-read
//! authorization has to be created with a cross-account credential. The
//! async resolver that may provision a key lives in [`crate::service::kms`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::crn::{Crn, CrnError};

/// Key management service family of a key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyServiceFamily {
    Kms,
    HsCrypto,
    Unrecognized,
    None,
}

impl KeyServiceFamily {
    /// IAM service name to target with a key-read authorization
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Self::Kms => Some("kms"),
            Self::HsCrypto => Some("hs-crypto"),
            Self::Unrecognized | Self::None => None,
        }
    }
}

impl fmt::Display for KeyServiceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Kms => "kms",
            Self::HsCrypto => "hs-crypto",
            Self::Unrecognized => "unrecognized",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Classify a key identifier by case-sensitive substring, `kms` checked first
pub fn classify_key_family(key: Option<&str>) -> KeyServiceFamily {
    match key {
        None => KeyServiceFamily::None,
        Some(key) if key.contains("kms") => KeyServiceFamily::Kms,
        Some(key) if key.contains("hs-crypto") => KeyServiceFamily::HsCrypto,
        Some(_) => KeyServiceFamily::Unrecognized,
    }
}

/// Resolve the backup encryption key
///
/// - default backup key requested → `None`
/// - explicit backup key → that key
/// - otherwise → the primary key, which may itself be `None`
pub fn resolve_backup_key(
    use_default_backup_key: bool,
    backup_key: Option<&str>,
    primary_key: Option<&str>,
) -> Option<String> {
    if use_default_backup_key {
        return None;
    }
    backup_key.or(primary_key).map(str::to_string)
}

/// The key-read authorization needs the cross-account credential
pub fn requires_cross_account_policy(
    skip_authorization_policy: bool,
    cross_account_api_key: Option<&str>,
) -> bool {
    !skip_authorization_policy && cross_account_api_key.is_some()
}

/// Key management instance located from its CRN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmsInstance {
    pub crn: Crn,
    pub guid: String,
    pub region: String,
}

impl KmsInstance {
    pub fn from_crn(identifier: &str) -> Result<Self, CrnError> {
        let crn = Crn::parse(identifier)?;
        Ok(Self {
            guid: crn.guid().to_string(),
            region: crn.region().to_string(),
            crn,
        })
    }

    /// IAM service name of the instance, falling back to the key family
    pub fn service_name(&self, family: KeyServiceFamily) -> String {
        self.crn
            .service_name()
            .map(str::to_string)
            .or_else(|| family.service_name().map(str::to_string))
            .unwrap_or_else(|| "kms".to_string())
    }
}

/// Resolved encryption plan; computed once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionPlan {
    pub primary_key_crn: Option<String>,
    pub backup_key_crn: Option<String>,
    pub key_service_family: KeyServiceFamily,
    pub requires_cross_account_policy: bool,
    pub kms_instance: Option<KmsInstance>,
}

impl EncryptionPlan {
    /// Plan for a cluster using provider-owned encryption
    pub fn disabled() -> Self {
        Self {
            primary_key_crn: None,
            backup_key_crn: None,
            key_service_family: KeyServiceFamily::None,
            requires_cross_account_policy: false,
            kms_instance: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None => KeyServiceFamily::None ; "absent")]
    #[test_case(Some("crn:v1:bluemix:public:kms:us-south:a/x:g:key:k") => KeyServiceFamily::Kms ; "kms")]
    #[test_case(Some("crn:v1:bluemix:public:hs-crypto:us-south:a/x:g:key:k") => KeyServiceFamily::HsCrypto ; "hs crypto")]
    #[test_case(Some("crn:v1:bluemix:public:KMS:us-south:a/x:g:key:k") => KeyServiceFamily::Unrecognized ; "case sensitive")]
    #[test_case(Some("hs-crypto-kms") => KeyServiceFamily::Kms ; "kms checked first")]
    #[test_case(Some("") => KeyServiceFamily::Unrecognized ; "empty string")]
    fn test_classify_key_family(key: Option<&str>) -> KeyServiceFamily {
        classify_key_family(key)
    }

    #[test_case(true, Some("backup"), Some("primary") => None ; "default wins over explicit")]
    #[test_case(true, None, Some("primary") => None ; "default wins over primary")]
    #[test_case(false, Some("backup"), Some("primary") => Some("backup".to_string()) ; "explicit backup")]
    #[test_case(false, None, Some("primary") => Some("primary".to_string()) ; "falls back to primary")]
    #[test_case(false, None, None => None ; "no keys resolves to none")]
    fn test_resolve_backup_key(
        use_default: bool,
        backup: Option<&str>,
        primary: Option<&str>,
    ) -> Option<String> {
        resolve_backup_key(use_default, backup, primary)
    }

    #[test]
    fn test_cross_account_policy() {
        assert!(requires_cross_account_policy(false, Some("api-key")));
        assert!(!requires_cross_account_policy(true, Some("api-key")));
        assert!(!requires_cross_account_policy(false, None));
    }

    #[test]
    fn test_kms_instance_from_crn() {
        let instance =
            KmsInstance::from_crn("crn:v1:bluemix:public:hs-crypto:eu-gb:a/acct:inst-guid::").unwrap();
        assert_eq!(instance.guid, "inst-guid");
        assert_eq!(instance.region, "eu-gb");
        assert_eq!(instance.service_name(KeyServiceFamily::Kms), "hs-crypto");

        assert!(KmsInstance::from_crn("short:crn").is_err());
    }
}
