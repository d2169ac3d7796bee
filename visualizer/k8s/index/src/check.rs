use crate::{CommunicationIndex, Error, Result};
use netpol_visualizer_core::{
    check::{Check, Side},
    view::CheckResponse,
    Direction, ResourceId,
};
use tracing::{debug, trace};

impl CommunicationIndex {
    /// Determines whether `source` may send traffic to `target`.
    ///
    /// The source's egress and the target's ingress are evaluated
    /// independently; an ungoverned direction permits everything. The flow is
    /// allowed only if both sides permit it.
    pub fn check(&self, source: &ResourceId, target: &ResourceId) -> Result<Check> {
        let (Some(src), Some(dst)) = (self.record(source), self.record(target)) else {
            return Err(Error::UnknownResource {
                from: source.to_string(),
                to: target.to_string(),
            });
        };

        let egress = Side::from_grants(
            src.is_governed(Direction::Egress),
            src.grants_to(Direction::Egress, target),
        );
        let ingress = Side::from_grants(
            dst.is_governed(Direction::Ingress),
            dst.grants_to(Direction::Ingress, source),
        );
        trace!(%source, %target, ?egress, ?ingress);

        Ok(Check::new(
            egress,
            ingress,
            src.egress_policies.clone(),
            dst.ingress_policies.clone(),
        ))
    }

    /// Like [`CommunicationIndex::check`], rendered for display. Unknown
    /// workloads produce a denied response rather than an error.
    pub fn check_response(&self, source: &ResourceId, target: &ResourceId) -> CheckResponse {
        match self.check(source, target) {
            Ok(check) => CheckResponse::from(&check),
            Err(error) => {
                debug!(%error);
                CheckResponse::not_found()
            }
        }
    }
}
