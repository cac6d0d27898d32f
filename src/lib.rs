//! Workspace root crate; exists to anchor the cargo-husky git hooks.
