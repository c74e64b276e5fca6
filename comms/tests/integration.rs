use comms::{Channel, Deserialize, Frame, Message, MessageKind, SERVER_RANK, Serialize};
use tokio::io;

#[test]
fn serialize_deserialize() {
    let payload = [0.25, 0.5, 0.75];
    let frame = Frame::new(2, MessageKind::ParameterUpdate, &payload);

    let mut buf = Vec::new();
    let tail = frame.serialize(&mut buf).unwrap();
    buf.extend_from_slice(tail);

    let msg = Message::deserialize(&buf).unwrap();
    assert_eq!(msg, Message::new(2, MessageKind::ParameterUpdate, payload.to_vec()));
}

#[tokio::test]
async fn send_recv() -> io::Result<()> {
    const SIZE: usize = 128;

    let (one, two) = io::duplex(SIZE);
    let (one_rx, one_tx) = io::split(one);
    let (_, mut tx) = comms::channel(one_rx, one_tx);

    let (two_rx, two_tx) = io::split(two);
    let (mut rx, _) = comms::channel(two_rx, two_tx);

    // Larger than the duplex buffer, so the reader must drain while the writer writes.
    let payload: Vec<f32> = (0..64).map(|i| i as f32).collect();
    let frame = Frame::new(SERVER_RANK, MessageKind::ParameterUpdate, &payload);

    let (sent, received) = tokio::join!(tx.send(&frame), rx.recv::<Message>());
    sent?;

    let msg = received?;
    assert_eq!(msg.sender(), SERVER_RANK);
    assert_eq!(msg.payload(), payload);
    Ok(())
}

#[tokio::test]
async fn local_cluster_request_reply() -> io::Result<()> {
    let (mut server, mut clients) = comms::local_cluster(2)?;
    let client = &mut clients[0];

    client.send(MessageKind::ParameterRequest, &[], SERVER_RANK).await?;
    let request = server.recv(None).await?;
    assert_eq!(request.kind(), MessageKind::ParameterRequest);

    server
        .send(MessageKind::ParameterUpdate, &[1.0, 2.0], request.sender())
        .await?;

    let reply = client.recv(Some(SERVER_RANK)).await?;
    assert_eq!(reply.sender(), SERVER_RANK);
    assert_eq!(reply.into_payload(), vec![1.0, 2.0]);
    Ok(())
}
