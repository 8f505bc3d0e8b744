// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify properties of the validation
//! gate, topology selection, key classification and identifier parsing.

mod property;
