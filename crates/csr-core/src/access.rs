//! Access control: authorize a decoded request against the privilege its
//! command requires.
//!
//! The real credential backend (smack/cynara) is an external collaborator
//! out of scope for this core. [`PrivilegeResolver`] is the seam it
//! would plug into; [`StaticPrivilegeResolver`] is a config-driven stand-in
//! so the dispatcher has something to authorize against without that
//! backend.

use std::collections::HashSet;

use crate::error::{CsrError, Result};

/// A privilege a request can be authorized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    /// `antivirus.scan`
    Scan,
    /// `antivirus.admin`
    Admin,
}

/// Which socket endpoint a connection arrived on. Purely a binding/logging
/// concern: every endpoint accepts every command, so the privilege a
/// request requires is derived from the *command* it carries, never from
/// which socket it arrived over. See [`Privilege`] and the dispatcher's
/// per-command authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Content,
    Web,
    Admin,
}

/// Credentials retrieved from a connected peer (C2 `SO_PEERCRED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerCredentials {
    pub uid: u32,
    pub gid: u32,
    pub pid: i32,
}

/// Resolves a peer's held privileges. The production credential backend
/// (smack/cynara) is out of scope; this is the seam it plugs into (design
/// note "Global state").
pub trait PrivilegeResolver: Send + Sync {
    fn privileges_for(&self, creds: &PeerCredentials) -> HashSet<Privilege>;
}

/// Config-driven resolver: a fixed set of admin uids get both privileges,
/// everyone else gets `Scan` only. Stands in for the real credential
/// backend until one is wired in.
#[derive(Debug, Clone, Default)]
pub struct StaticPrivilegeResolver {
    admin_uids: HashSet<u32>,
}

impl StaticPrivilegeResolver {
    pub fn new(admin_uids: impl IntoIterator<Item = u32>) -> Self {
        Self { admin_uids: admin_uids.into_iter().collect() }
    }
}

impl PrivilegeResolver for StaticPrivilegeResolver {
    fn privileges_for(&self, creds: &PeerCredentials) -> HashSet<Privilege> {
        let mut privileges = HashSet::new();
        privileges.insert(Privilege::Scan);
        if creds.uid == 0 || self.admin_uids.contains(&creds.uid) {
            privileges.insert(Privilege::Admin);
        }
        privileges
    }
}

/// Authorizes a request against an explicitly supplied required privilege.
/// Passed to the dispatcher as an explicit collaborator, not an implicit
/// singleton (design note "Global state").
pub struct AccessControl<R: PrivilegeResolver> {
    resolver: R,
}

impl<R: PrivilegeResolver> AccessControl<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn authorize(&self, creds: &PeerCredentials, required: Privilege) -> Result<()> {
        if self.resolver.privileges_for(creds).contains(&required) {
            Ok(())
        } else {
            Err(CsrError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(uid: u32) -> PeerCredentials {
        PeerCredentials { uid, gid: uid, pid: 1234 }
    }

    #[test]
    fn root_holds_admin_and_scan() {
        let ac = AccessControl::new(StaticPrivilegeResolver::default());
        assert!(ac.authorize(&creds(0), Privilege::Scan).is_ok());
        assert!(ac.authorize(&creds(0), Privilege::Admin).is_ok());
    }

    #[test]
    fn unprivileged_uid_cannot_reach_admin_privilege() {
        let ac = AccessControl::new(StaticPrivilegeResolver::default());
        assert!(ac.authorize(&creds(1000), Privilege::Scan).is_ok());
        let err = ac.authorize(&creds(1000), Privilege::Admin).unwrap_err();
        assert!(matches!(err, CsrError::PermissionDenied));
    }

    #[test]
    fn configured_admin_uid_reaches_admin_privilege() {
        let ac = AccessControl::new(StaticPrivilegeResolver::new([1500]));
        assert!(ac.authorize(&creds(1500), Privilege::Admin).is_ok());
        assert!(ac.authorize(&creds(1501), Privilege::Admin).is_err());
    }
}
