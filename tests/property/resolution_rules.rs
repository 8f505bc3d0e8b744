// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Resolution Rules
//!
//! Topology totality, key family classification, backup key resolution and
//! CRN offset extraction.

use proptest::prelude::*;
use search_cluster_infrastructure::domain::crn::Crn;
use search_cluster_infrastructure::domain::encryption::{
    classify_key_family, resolve_backup_key, KeyServiceFamily,
};
use search_cluster_infrastructure::domain::topology::{
    select_topology, ClusterTopology, MemberSizing, MULTITENANT_FLAVOR,
};

// ============================================================================
// Strategies
// ============================================================================

fn sizing() -> impl Strategy<Value = MemberSizing> {
    (1u32..16, 1024u64..131072, 1024u64..4_194_304, 0u32..64).prop_map(
        |(member_count, memory_mb, disk_mb, cpu_count)| MemberSizing {
            member_count,
            memory_mb,
            disk_mb,
            cpu_count,
        },
    )
}

fn host_flavor() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(MULTITENANT_FLAVOR.to_string())),
        "[a-z0-9.]{0,20}".prop_map(Some),
    ]
}

/// Colon-free segment, possibly empty
fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9/_-]{0,12}"
}

fn key_identifier() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-zA-Z:/-]{0,40}")
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: every input yields exactly one group variant, chosen by flavor
    #[test]
    fn prop_topology_selection_is_total(flavor in host_flavor(), sizing in sizing()) {
        let topology = select_topology(flavor.as_deref(), &sizing);

        match (flavor.as_deref(), &topology) {
            (None, ClusterTopology::ClassicSized { memory_mb, disk_mb, cpu_count, .. }) => {
                prop_assert_eq!(*memory_mb, sizing.memory_mb);
                prop_assert_eq!(*disk_mb, sizing.disk_mb);
                prop_assert_eq!(*cpu_count, sizing.cpu_count);
            }
            (Some(MULTITENANT_FLAVOR), ClusterTopology::MultitenantFlavor { flavor_id, memory_mb, .. }) => {
                prop_assert_eq!(flavor_id.as_str(), MULTITENANT_FLAVOR);
                prop_assert_eq!(*memory_mb, sizing.memory_mb);
            }
            (Some(requested), ClusterTopology::FixedFlavor { flavor_id, disk_mb, .. }) => {
                prop_assert_ne!(requested, MULTITENANT_FLAVOR);
                prop_assert_eq!(flavor_id.as_str(), requested);
                prop_assert_eq!(*disk_mb, sizing.disk_mb);
            }
            (requested, other) => {
                prop_assert!(false, "flavor {:?} selected {:?}", requested, other);
            }
        }
        prop_assert_eq!(topology.member_count(), sizing.member_count);
    }

    /// Property: classification is a case-sensitive substring match, kms first
    #[test]
    fn prop_key_family_classification(key in key_identifier()) {
        let expected = match key.as_deref() {
            None => KeyServiceFamily::None,
            Some(k) if k.contains("kms") => KeyServiceFamily::Kms,
            Some(k) if k.contains("hs-crypto") => KeyServiceFamily::HsCrypto,
            Some(_) => KeyServiceFamily::Unrecognized,
        };
        prop_assert_eq!(classify_key_family(key.as_deref()), expected);
    }

    /// Property: embedding the marker anywhere selects its family
    #[test]
    fn prop_marker_anywhere_classifies(prefix in "[A-Z]{0,8}", suffix in "[A-Z]{0,8}") {
        let kms = format!("{}kms{}", prefix, suffix);
        let hpcs = format!("{}hs-crypto{}", prefix, suffix);
        prop_assert_eq!(classify_key_family(Some(kms.as_str())), KeyServiceFamily::Kms);
        prop_assert_eq!(classify_key_family(Some(hpcs.as_str())), KeyServiceFamily::HsCrypto);
        prop_assert_eq!(
            classify_key_family(Some(format!("{}{}", prefix, suffix).as_str())),
            KeyServiceFamily::Unrecognized
        );
    }

    /// Property: the default backup key wins over everything
    #[test]
    fn prop_default_backup_key_is_none(backup in key_identifier(), primary in key_identifier()) {
        prop_assert_eq!(resolve_backup_key(true, backup.as_deref(), primary.as_deref()), None);
    }

    /// Property: explicit backup key, else primary key (which may be none)
    #[test]
    fn prop_backup_key_falls_back_to_primary(backup in key_identifier(), primary in key_identifier()) {
        let resolved = resolve_backup_key(false, backup.as_deref(), primary.as_deref());
        let expected = backup.clone().or(primary.clone());
        prop_assert_eq!(resolved, expected);
    }

    /// Property: guid and region sit at offsets -3 and -5 for any identifier with 5+ segments
    #[test]
    fn prop_crn_offsets(segments in prop::collection::vec(segment(), 5..12)) {
        let identifier = segments.join(":");
        let crn = Crn::parse(identifier.as_str()).unwrap();

        prop_assert_eq!(crn.guid(), segments[segments.len() - 3].as_str());
        prop_assert_eq!(crn.region(), segments[segments.len() - 5].as_str());
    }

    /// Property: fewer than five segments never parse
    #[test]
    fn prop_short_identifiers_rejected(segments in prop::collection::vec(segment(), 1..5)) {
        let identifier = segments.join(":");
        prop_assert!(Crn::parse(identifier.as_str()).is_err());
    }
}

// ============================================================================
// Flagged behavior
// ============================================================================

/// With no default, no explicit backup and no primary key, the backup key
/// silently resolves to none. Kept as-is; this test pins it.
#[test]
fn test_backup_key_without_any_key_resolves_to_none() {
    assert_eq!(resolve_backup_key(false, None, None), None);
}
