//! The collaborator a listener hands each applied snapshot to. Validating
//! and acting on policy bodies is out of scope here; this trait is the seam
//! where that logic plugs in.

use policy_protocol::ValidatingPolicy;

pub trait PolicyProcessor: Send + Sync {
    /// Apply the full current set of policies. Called once per snapshot
    /// that differs from the last one applied, including rollbacks to an
    /// earlier version.
    fn apply(
        &self,
        version: u64,
        policies: &[ValidatingPolicy],
    ) -> impl std::future::Future<Output = Result<(), String>> + Send;
}

/// A processor that does nothing, for listeners run purely to keep a
/// remote sender apprised of liveness.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProcessor;

impl PolicyProcessor for NoopProcessor {
    async fn apply(&self, _version: u64, _policies: &[ValidatingPolicy]) -> Result<(), String> {
        Ok(())
    }
}
