//! Hard-fork names and their ordinals; `EVM_VERSION` resolves to the active
//! ordinal at transform time.

pub const FORKS: &[(&str, u64)] = &[
    ("homestead", 201603),
    ("tangerineWhistle", 201610),
    ("spuriousDragon", 201611),
    ("byzantium", 201710),
    ("constantinople", 201902),
    ("petersburg", 201903),
    ("istanbul", 201912),
    ("berlin", 202104),
    ("london", 202108),
    ("paris", 202209),
    ("shanghai", 202304),
    ("cancun", 300000),
];

pub fn ordinal(name: &str) -> Option<u64> {
    FORKS.iter().find(|(n, _)| *n == name).map(|(_, o)| *o)
}

pub fn latest() -> u64 {
    FORKS.last().map(|(_, o)| *o).unwrap_or(0)
}

/// `mcopy` ships with cancun; below that it lowers to a helper.
pub fn has_mcopy(ord: u64) -> bool {
    ord >= 300000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup() {
        assert_eq!(ordinal("shanghai"), Some(202304));
        assert_eq!(ordinal("cancun"), Some(300000));
        assert_eq!(ordinal("frontier"), None);
        assert_eq!(latest(), 300000);
    }

    #[test]
    fn mcopy_gate() {
        assert!(!has_mcopy(ordinal("shanghai").unwrap()));
        assert!(has_mcopy(ordinal("cancun").unwrap()));
    }
}
