mod helpers;

use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use argent_dns_application::SelectUpstreamsUseCase;
use argent_dns_infrastructure::dns::{build_routing_table, DnsRelay, UpstreamPool};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};

use helpers::builders::{default_group, routing_options};
use helpers::dns_server_mock::{MockBehavior, MockDnsServer};

fn build_query(domain: &str) -> Vec<u8> {
    let mut query = Query::new();
    query.set_name(Name::from_str(domain).unwrap());
    query.set_query_type(RecordType::A);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(0x1234, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).unwrap();
    buf
}

fn relay_for(upstream_address: &str) -> DnsRelay {
    let groups = vec![default_group(upstream_address)];
    let mut pool = UpstreamPool::new();
    let (table, result) = build_routing_table(&groups, &mut pool, &routing_options());
    assert!(result.is_ok());

    DnsRelay::new(Arc::new(SelectUpstreamsUseCase::new(Arc::new(table))))
}

#[tokio::test]
async fn test_relay_forwards_to_routed_upstream() {
    let upstream = MockDnsServer::start(MockBehavior::Answer("93.184.216.34".parse().unwrap()))
        .await
        .unwrap();

    let relay = relay_for(&upstream.addr().to_string());

    let client: IpAddr = "192.0.2.7".parse().unwrap();
    let response = relay
        .handle_query(&build_query("example.com."), client)
        .await
        .expect("relay must produce a response");

    let message = Message::from_vec(&response).unwrap();
    assert_eq!(message.id(), 0x1234);
    assert_eq!(message.response_code(), ResponseCode::NoError);

    let answers: Vec<IpAddr> = message
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            _ => None,
        })
        .collect();
    assert_eq!(answers, vec!["93.184.216.34".parse::<IpAddr>().unwrap()]);
}

#[tokio::test]
async fn test_relay_answers_servfail_when_unroutable() {
    let groups = Vec::new();
    let mut pool = UpstreamPool::new();
    let (table, _) = build_routing_table(&groups, &mut pool, &routing_options());
    let relay = DnsRelay::new(Arc::new(SelectUpstreamsUseCase::new(Arc::new(table))));

    let client: IpAddr = "192.0.2.7".parse().unwrap();
    let response = relay
        .handle_query(&build_query("example.com."), client)
        .await
        .expect("an error response is still a response");

    let message = Message::from_vec(&response).unwrap();
    assert_eq!(message.response_code(), ResponseCode::ServFail);
    assert_eq!(message.message_type(), MessageType::Response);
}

#[tokio::test]
async fn test_relay_drops_garbage() {
    let relay = relay_for("192.0.2.1:53");

    let client: IpAddr = "192.0.2.7".parse().unwrap();
    assert!(relay.handle_query(&[0xff, 0x00, 0x01], client).await.is_none());
}
