use crate::unit::common::*;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_send_request_resolves_to_metadata() {
    init_logger();
    let (driver, state) = string_producer();

    let request = ProducerSendRequest::new("orders")
        .key("o-1".to_string())
        .partition(2)
        .value("created".to_string());
    let metadata = driver.send(request.into()).unwrap().await.unwrap();

    assert_eq!(
        metadata,
        RecordMetadata {
            topic: "orders".to_string(),
            partition: 2,
            offset: 0
        }
    );
    let sent = state.sent.lock().unwrap();
    assert_eq!(sent[0].key, Some(b"o-1".to_vec()));
    assert_eq!(sent[0].payload, Some(b"created".to_vec()));
}

#[tokio::test]
async fn test_send_returns_before_delivery() {
    let (driver, state) = string_producer();

    let handles: Vec<DeliveryHandle> = (0..3)
        .map(|i| driver.send_to("t", None, Some(format!("v{}", i))).unwrap())
        .collect();
    // every record reached the client before any handle was awaited
    assert_eq!(state.sent.lock().unwrap().len(), 3);

    let offsets: Vec<i64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|result| result.unwrap().offset)
        .collect();
    assert_eq!(offsets, vec![0, 1, 2]);
}

#[test]
fn test_delivery_handle_wait_blocks_until_acknowledged() {
    let (driver, _state) = string_producer();
    let metadata = driver
        .send_to("t", Some("k".to_string()), Some("v".to_string()))
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(metadata.topic, "t");
}

#[test]
fn test_send_to_matches_request_policy() {
    let (driver, state) = string_producer();

    driver.send_to("t", Some("k".to_string()), Some("v".to_string())).unwrap();
    driver.send_to("t", None, Some("v".to_string())).unwrap();

    let sent = state.sent.lock().unwrap();
    assert_eq!(
        sent[0],
        ProducerRecord::with_key("t", Some(b"k".to_vec()), Some(b"v".to_vec()))
    );
    assert_eq!(sent[1], ProducerRecord::new("t", Some(b"v".to_vec())));
}

#[test]
fn test_native_record_passes_through_unchanged() {
    let (driver, state) = string_producer();
    let mut record = ProducerRecord::with_partition("t", 5, None, Some(vec![0xde, 0xad]));
    record.headers = Some(Headers::new().insert("raw", [1u8, 2, 3]));

    driver.send(SendInput::Record(record.clone())).unwrap();

    assert_eq!(state.sent.lock().unwrap()[0], record);
}

#[test]
fn test_missing_topic_is_rejected_before_send() {
    let (driver, state) = string_producer();
    let request: ProducerSendRequest<String, String> = ProducerSendRequest {
        value: Some("v".to_string()),
        ..Default::default()
    };

    let err = driver.send(request.into()).unwrap_err();

    assert!(matches!(err, DriverError::MissingTopic));
    assert!(state.sent.lock().unwrap().is_empty());
}

#[test]
fn test_absent_value_is_sent_as_absent_payload() {
    let (driver, state) = string_producer();
    driver.send_to("t", Some("k".to_string()), None).unwrap();
    assert_eq!(state.sent.lock().unwrap()[0].payload, None);
}

#[test]
fn test_flush_reaches_client() {
    let (driver, state) = string_producer();
    driver.flush().unwrap();
    assert_eq!(state.flushes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_close_closes_client_and_codecs_once() {
    let (client, state) = MockProducer::new();
    let key_codec = CountingSerializer::default();
    let value_codec = CountingSerializer::default();
    let driver: BrokerProducerDriver<String, String> =
        BrokerProducerDriver::new(Box::new(client), key_codec.clone(), value_codec.clone());

    driver.close(Some(Duration::from_secs(2))).unwrap();
    driver.close(None).unwrap();

    assert_eq!(*state.closes.lock().unwrap(), vec![Some(Duration::from_secs(2))]);
    assert_eq!(key_codec.closed.load(Ordering::SeqCst), 1);
    assert_eq!(value_codec.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_send_after_close_fails() {
    let (driver, state) = string_producer();
    driver.close(None).unwrap();

    let err = driver.send_to("t", None, Some("late".to_string())).unwrap_err();

    assert!(matches!(err, DriverError::ProducerClosed));
    assert!(state.sent.lock().unwrap().is_empty());
}
