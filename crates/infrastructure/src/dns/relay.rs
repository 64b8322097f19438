use std::net::IpAddr;
use std::sync::Arc;

use argent_dns_application::SelectUpstreamsUseCase;
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use tracing::{debug, warn};

/// The thin dispatch collaborator: parses only the question name of an
/// incoming query, selects the upstream order for the client, and relays the
/// raw bytes to the first upstream that answers.
pub struct DnsRelay {
    select: Arc<SelectUpstreamsUseCase>,
}

impl DnsRelay {
    pub fn new(select: Arc<SelectUpstreamsUseCase>) -> Self {
        Self { select }
    }

    pub async fn handle_query(&self, query: &[u8], client: IpAddr) -> Option<Vec<u8>> {
        let message = match Message::from_vec(query) {
            Ok(message) => message,
            Err(e) => {
                warn!(%client, error = %e, "Dropping unparseable query");
                return None;
            }
        };

        let Some(question) = message.queries().first().map(|q| q.name().to_utf8()) else {
            return Self::error_response(&message, ResponseCode::FormErr);
        };

        let upstreams = self.select.execute(client, &question);
        if upstreams.is_empty() {
            warn!(%client, question, "No upstreams for query");
            return Self::error_response(&message, ResponseCode::ServFail);
        }

        for upstream in upstreams {
            match upstream.exchange(query).await {
                Ok(response) => {
                    debug!(%client, question, upstream = upstream.address(), "Relayed query");
                    return Some(response);
                }
                Err(e) => {
                    warn!(upstream = upstream.address(), error = %e, "Upstream exchange failed, trying next");
                }
            }
        }

        Self::error_response(&message, ResponseCode::ServFail)
    }

    fn error_response(request: &Message, code: ResponseCode) -> Option<Vec<u8>> {
        let mut response = Message::new(request.id(), MessageType::Response, request.op_code());
        response.set_response_code(code);
        response.set_recursion_desired(request.recursion_desired());
        response.set_recursion_available(true);
        for query in request.queries() {
            response.add_query(query.clone());
        }

        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        response.emit(&mut encoder).ok()?;
        Some(buf)
    }
}
