//! Shared helpers for the deployment orchestrator's integration tests
