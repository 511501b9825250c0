use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

/// Name of the throwaway branch a merge is staged on.
///
/// Built from a prefix, a UTC timestamp and a random token so that two runs
/// started in the same second still get distinct branches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemporaryBranchName(String);

impl TemporaryBranchName {
    pub fn generate(prefix: &str) -> Self {
        let token = rand::rng().random_range(0..0x100_0000u32);
        Self::from_parts(prefix, Utc::now(), token)
    }

    pub fn from_parts(prefix: &str, at: DateTime<Utc>, token: u32) -> Self {
        Self(format!(
            "{}_{}_{:06x}",
            prefix.trim_end_matches(['_', '-', '/']),
            at.format("%Y%m%dT%H%M%SZ"),
            token & 0xff_ffff
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TemporaryBranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TemporaryBranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
