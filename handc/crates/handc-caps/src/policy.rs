//! The four-level supervision policy.
//!
//! For every level the three sets partition the capability universe:
//! level 1 allows only `compute`, level 4 denies nothing but gates the
//! dangerous capabilities behind explicit approval.

use handc_ir::Capability;

/// A capability policy: three disjoint sets whose union is the
/// capability universe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapPolicy {
    allowed_without_approval: Vec<Capability>,
    allowed_with_approval: Vec<Capability>,
}

impl CapPolicy {
    fn new(without: &[Capability], with: &[Capability]) -> Self {
        Self {
            allowed_without_approval: without.to_vec(),
            allowed_with_approval: with.to_vec(),
        }
    }

    pub fn is_denied(&self, cap: Capability) -> bool {
        !self.allowed_without_approval.contains(&cap)
            && !self.allowed_with_approval.contains(&cap)
    }

    pub fn needs_approval(&self, cap: Capability) -> bool {
        self.allowed_with_approval.contains(&cap)
    }

    /// The denied set, derived from the two allowed sets.
    pub fn denied(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|&c| self.is_denied(c))
            .collect()
    }
}

/// The policy for a supervision level, or `None` outside 1..4.
pub fn policy(level: u8) -> Option<CapPolicy> {
    use Capability::*;
    Some(match level {
        1 => CapPolicy::new(&[Compute], &[]),
        2 => CapPolicy::new(&[Compute, IoWrite], &[IoRead]),
        3 => CapPolicy::new(&[Compute, IoRead, IoWrite], &[FsRead, FsWrite, Net]),
        4 => CapPolicy::new(
            &[Compute, IoRead, IoWrite, FsRead],
            &[FsWrite, Net, Env, Crypto],
        ),
        _ => return None,
    })
}
