//! # Gatehouse (Pre-Authentication Admission Gate)
//!
//! `gatehouse` sits in front of the sign-in surface and decides, before any
//! credential is read, whether a request may reach the login form. Four
//! checks run in a fixed order:
//!
//! 1. **Transport policy:** tenants that require HTTPS reject plaintext
//!    requests outright.
//! 2. **Lockout:** source addresses with too many recent failed logins are
//!    turned away with `429` and the block is recorded once.
//! 3. **Login key:** when the tenant gates sign-in behind a shared key,
//!    requests without the right key are quietly diverted to the portal.
//! 4. **Cookie attributes:** the session cookie for the upcoming login is
//!    resolved with a fail-safe `Secure` default.
//!
//! ## Database
//!
//! `PostgreSQL` holds the single tenant settings row and the `auth_events`
//! audit trail the lockout counters read. Events use **`UUIDv7`** primary
//! keys, time-ordered so trailing-window scans stay cheap; the bootstrap
//! schema lives in `sql/schema.sql`.
//!
//! The gate fails closed: when settings or the audit store cannot be
//! reached, admission is denied rather than defaulted.

pub mod cli;
pub mod gatehouse;

#[cfg(test)]
mod tests {
    use anyhow::{ensure, Context, Result};
    use std::fs;
    use std::path::{Path, PathBuf};

    // Normalize SQL to avoid brittle formatting checks in schema tests.
    fn canonicalize_sql(sql: &str) -> String {
        sql.chars()
            .filter(|ch| !ch.is_whitespace())
            .map(|ch| ch.to_ascii_lowercase())
            .collect()
    }

    fn canonical_sql(path: &Path) -> Result<String> {
        let sql = fs::read_to_string(path)
            .with_context(|| format!("Failed to read SQL file at {}", path.display()))?;
        Ok(canonicalize_sql(&sql))
    }

    fn assert_contains(path: &Path, canonical: &str, needle: &str) -> Result<()> {
        ensure!(
            canonical.contains(needle),
            "Expected {needle} is missing in {}",
            path.display()
        );
        Ok(())
    }

    fn assert_not_contains(path: &Path, canonical: &str, needle: &str) -> Result<()> {
        ensure!(
            !canonical.contains(needle),
            "Unexpected content {needle} found in {}",
            path.display()
        );
        Ok(())
    }

    fn schema_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sql/schema.sql")
    }

    #[test]
    fn schema_pins_settings_to_a_single_row() -> Result<()> {
        let path = schema_path();
        let canonical = canonical_sql(&path)?;
        assert_contains(&path, &canonical, "idsmallintprimarykeydefault1check(id=1)")
    }

    #[test]
    fn schema_keeps_https_only_nullable() -> Result<()> {
        // The cookie layer treats NULL as "never configured" and falls back
        // to Secure; a NOT NULL column would erase that distinction.
        let path = schema_path();
        let canonical = canonical_sql(&path)?;
        assert_contains(&path, &canonical, "https_onlyboolean,")?;
        assert_not_contains(&path, &canonical, "https_onlybooleannotnull")
    }

    #[test]
    fn schema_indexes_the_lockout_scan() -> Result<()> {
        let path = schema_path();
        let canonical = canonical_sql(&path)?;
        assert_contains(
            &path,
            &canonical,
            "onauth_events(source_address,kind,action,occurred_at)",
        )
    }

    #[test]
    fn schema_seeds_the_settings_row_idempotently() -> Result<()> {
        let path = schema_path();
        let canonical = canonical_sql(&path)?;
        assert_contains(
            &path,
            &canonical,
            "values(1,'gatehouse')onconflict(id)donothing",
        )
    }

    #[test]
    fn schema_default_remember_me_expiry_is_thirty_days() -> Result<()> {
        let path = schema_path();
        let canonical = canonical_sql(&path)?;
        assert_contains(
            &path,
            &canonical,
            "remember_me_expiry_secondsbigintnotnulldefault2592000",
        )
    }
}
