//! Authorization seam for family management.
//!
//! Mutations ask the [`Authorizer`] whether the caller may manage the
//! family before touching the database. The engine ships [`AllowAll`] for
//! single-user/local use; an embedding application supplies its own
//! implementation backed by its account model.

/// Decides whether the current caller may manage a family.
pub trait Authorizer {
    /// Returns `true` if relationship and member mutations on `family_id`
    /// are allowed.
    fn can_manage_family(&self, family_id: &str) -> bool;
}

/// Permits everything. The default for local, single-user deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn can_manage_family(&self, _family_id: &str) -> bool {
        true
    }
}
