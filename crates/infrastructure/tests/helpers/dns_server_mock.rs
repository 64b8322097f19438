#![allow(dead_code)]
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// How the mock answers queries.
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Answer A queries with this address, AAAA with an empty answer section.
    Answer(Ipv4Addr),
    ServFail,
    /// Never respond, forcing the client to time out.
    Ignore,
}

/// A one-socket DNS server for exercising the bootstrap resolvers.
pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(behavior: MockBehavior) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let queries = Arc::new(AtomicUsize::new(0));

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let counter = Arc::clone(&queries);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { break };
                        counter.fetch_add(1, Ordering::SeqCst);

                        if matches!(behavior, MockBehavior::Ignore) {
                            continue;
                        }
                        if let Some(response) = Self::build_response(&buf[..len], behavior) {
                            let _ = socket.send_to(&response, peer).await;
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn build_response(query: &[u8], behavior: MockBehavior) -> Option<Vec<u8>> {
        let request = Message::from_vec(query).ok()?;
        let question = request.queries().first()?.clone();

        let mut response = Message::new(request.id(), MessageType::Response, request.op_code());
        response.set_recursion_desired(request.recursion_desired());
        response.set_recursion_available(true);
        response.add_query(question.clone());

        match behavior {
            MockBehavior::Answer(ip) if question.query_type() == RecordType::A => {
                response.add_answer(Record::from_rdata(
                    question.name().clone(),
                    60,
                    RData::A(A(ip)),
                ));
            }
            MockBehavior::Answer(_) => {}
            MockBehavior::ServFail => {
                response.set_response_code(ResponseCode::ServFail);
            }
            MockBehavior::Ignore => unreachable!("handled before building"),
        }

        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        response.emit(&mut encoder).ok()?;
        Some(buf)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
