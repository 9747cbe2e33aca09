//! Group key port: the per-session classroom group setting.

use blockbot_domain::filter::GroupKey;

/// Supplies the current group key. Read once at the start of every scan,
/// so changes take effect on the next scan.
pub trait GroupKeySource: Send + Sync + 'static {
    fn group_key(&self) -> Option<GroupKey>;
}

/// A fixed key (or none), for tests and single-device setups.
impl GroupKeySource for Option<GroupKey> {
    fn group_key(&self) -> Option<GroupKey> {
        self.clone()
    }
}

impl<T: GroupKeySource> GroupKeySource for std::sync::Arc<T> {
    fn group_key(&self) -> Option<GroupKey> {
        (**self).group_key()
    }
}
