// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Properties that must hold for every input of the pure resolution rules.

mod configuration_gate;
mod resolution_rules;
