use std::net::IpAddr;
use std::sync::Arc;

use tracing::debug;

use crate::ports::{UpstreamHandle, UpstreamRouter};

/// Picks the ordered upstream list for an incoming query. The precedence is
/// the router's: most specific client entry with a domain match, then that
/// entry's catch-all, then the default catch-all.
pub struct SelectUpstreamsUseCase {
    router: Arc<dyn UpstreamRouter>,
}

impl SelectUpstreamsUseCase {
    pub fn new(router: Arc<dyn UpstreamRouter>) -> Self {
        Self { router }
    }

    pub fn execute(&self, client: IpAddr, question: &str) -> Vec<Arc<dyn UpstreamHandle>> {
        let upstreams = self.router.route(client, question);
        debug!(
            %client,
            question,
            candidates = upstreams.len(),
            "Selected upstreams"
        );
        upstreams
    }

    pub fn execute_private(&self) -> Vec<Arc<dyn UpstreamHandle>> {
        self.router.route_private()
    }
}
