//! Group key read from the environment on every scan.

use blockbot_app::ports::GroupKeySource;
use blockbot_domain::filter::GroupKey;

use crate::config::GROUP_VAR;

/// Reads `BLOCKBOT_GROUP` each time a scan asks, falling back to the
/// configured group when the variable is unset.
pub struct EnvGroupKey {
    fallback: Option<GroupKey>,
}

impl EnvGroupKey {
    #[must_use]
    pub fn new(fallback: Option<GroupKey>) -> Self {
        Self { fallback }
    }
}

impl GroupKeySource for EnvGroupKey {
    fn group_key(&self) -> Option<GroupKey> {
        match std::env::var(GROUP_VAR) {
            Ok(value) => GroupKey::new(&value),
            Err(_) => self.fallback.clone(),
        }
    }
}
