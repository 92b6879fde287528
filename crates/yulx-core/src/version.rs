use crate::errors::{Error, Result};
use semver::{Version, VersionReq};

/// Check a `pragma solc`/`pragma yulc` constraint against a configured
/// compiler version.
pub fn satisfies(version: &str, requirement: &str) -> Result<bool> {
    let version = Version::parse(version.trim_start_matches('v'))
        .map_err(|e| Error::Version(format!("bad version {:?}: {}", version, e)))?;
    let req = VersionReq::parse(requirement)
        .map_err(|e| Error::Version(format!("bad constraint {:?}: {}", requirement, e)))?;
    Ok(req.matches(&version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_and_exact_constraints() {
        assert!(satisfies("0.8.24", "^0.8").unwrap());
        assert!(satisfies("0.8.24", ">=0.8.20, <0.9").unwrap());
        assert!(!satisfies("0.7.6", "^0.8").unwrap());
        assert!(satisfies("1.2.3", "1.2.3").unwrap());
    }

    #[test]
    fn malformed_inputs_error() {
        assert!(satisfies("not-a-version", "^1").is_err());
        assert!(satisfies("1.0.0", "{}").is_err());
    }
}
