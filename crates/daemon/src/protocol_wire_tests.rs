// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{Request, Response};

#[tokio::test]
async fn message_round_trips_through_a_duplex_pipe() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let data = encode(&Request::Ping).unwrap();
    write_message(&mut client, &data).await.unwrap();

    let request = read_request(&mut server, DEFAULT_TIMEOUT).await.unwrap();
    assert_eq!(request, Request::Ping);

    write_response(&mut server, &Response::empty(), DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let bytes = read_message(&mut client).await.unwrap();
    let response: Response = decode(&bytes).unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected() {
    let (mut client, mut server) = tokio::io::duplex(64);
    let len = (MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes();
    tokio::io::AsyncWriteExt::write_all(&mut client, &len)
        .await
        .unwrap();

    let err = read_message(&mut server).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn closed_connection_reads_as_connection_closed() {
    let (client, mut server) = tokio::io::duplex(64);
    drop(client);

    let err = read_message(&mut server).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}
