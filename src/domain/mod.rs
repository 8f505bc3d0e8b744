// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Domain Models
//!
//! Pure rules and value objects behind a search cluster deployment. Nothing
//! in this module performs I/O; async resolution and execution live in
//! [`crate::service`] and [`crate::graph`].
//!
//! # Value Objects
//!
//! - [`Crn`] - colon-delimited resource identifier with offset accessors
//! - [`ClusterTopology`] - exactly one member group shape
//! - [`EncryptionPlan`] - resolved primary/backup keys and key family
//! - [`CredentialBundle`] - ordered credential name to role mapping
//! - [`ResourceAddress`] / [`ResourceKind`] - graph vocabulary
//!
//! # Rules
//!
//! - [`invariants`] - the validation gate
//! - [`encryption`] - key family, backup fallback, cross-account policy
//! - [`topology`] - group shape selection
//! - [`credentials`] - connection and admin credential harvesting
//! - [`resource`] - replace versus update

pub mod credentials;
pub mod crn;
pub mod encryption;
pub mod invariants;
pub mod resource;
pub mod topology;

pub use credentials::{
    AdminCredentials, ConnectionInfo, CredentialBundle, CredentialRole, Endpoint, HarvestError,
    UserCredentials,
};
pub use crn::{Crn, CrnError};
pub use encryption::{EncryptionPlan, KeyServiceFamily, KmsInstance};
pub use invariants::{ConfigurationError, ConfigurationErrors, ValidationResult};
pub use resource::{ChangeAction, ResolvedAttributes, ResourceAddress, ResourceKind};
pub use topology::{AutoScalingPolicy, ClusterTopology, MemberSizing};
