//! Integration tests for the protocol engine.
//!
//! The engine is driven exactly the way the gateway drives it: a session
//! handle backed by a channel we hold the other end of, and gateway events
//! for inbound frames. No real socket involved.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use remote_core::{
    ConnectionEvent, CoreConfig, DeviceHandler, DriverHandle, Entity, Integration,
};
use remote_proto::messages::{SetDriverUserDataRequest, SetupDriverRequest};
use remote_proto::{
    DeviceState, DriverMetadata, DriverSetupState, InboundEvent, InboundFrame, OutboundFrame,
    RequestMessage, SetupEventType,
};
use ws_gateway::{GatewayEvent, SessionHandle};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn metadata() -> DriverMetadata {
    DriverMetadata {
        driver_id: "test_driver".into(),
        name: [("en".to_string(), "Test Driver".to_string())].into(),
        version: "0.3.0".into(),
        icon: None,
        description: None,
        setup_data_schema: None,
        release_date: None,
    }
}

/// Device handler that records callbacks and reports a configurable
/// connection outcome.
#[derive(Default)]
struct RecordingHandler {
    setups: Mutex<Vec<Value>>,
    user_data: Mutex<Vec<SetDriverUserDataRequest>>,
    connection_events: Mutex<Vec<ConnectionEvent>>,
    connect_outcome: Option<DeviceState>,
}

#[async_trait::async_trait]
impl DeviceHandler for RecordingHandler {
    async fn setup(&self, _driver: DriverHandle, request: SetupDriverRequest) {
        self.setups.lock().unwrap().push(request.setup_data);
    }

    async fn connection_event(&self, driver: DriverHandle, event: ConnectionEvent) {
        self.connection_events.lock().unwrap().push(event);
        if event == ConnectionEvent::Connect {
            if let Some(state) = self.connect_outcome {
                driver.set_device_state(state).unwrap();
            }
        }
    }

    async fn user_data(&self, _driver: DriverHandle, request: SetDriverUserDataRequest) {
        self.user_data.lock().unwrap().push(request);
    }
}

/// Entity that records commands and answers with a fixed result code.
struct Recorder {
    id: &'static str,
    entity_type: &'static str,
    result_code: u16,
    commands: Mutex<Vec<String>>,
}

impl Recorder {
    fn new(id: &'static str, entity_type: &'static str, result_code: u16) -> Arc<Self> {
        Arc::new(Self {
            id,
            entity_type,
            result_code,
            commands: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl Entity for Recorder {
    fn entity_id(&self) -> &str {
        self.id
    }
    fn entity_type(&self) -> &str {
        self.entity_type
    }
    fn attributes(&self) -> Value {
        json!({"state": "ON"})
    }
    async fn handle_command(&self, cmd_id: &str, _params: Option<&Value>) -> Option<u16> {
        self.commands.lock().unwrap().push(cmd_id.to_string());
        Some(self.result_code)
    }
}

/// Entity with no command handling at all.
struct Passive {
    id: &'static str,
}

#[async_trait::async_trait]
impl Entity for Passive {
    fn entity_id(&self) -> &str {
        self.id
    }
    fn entity_type(&self) -> &str {
        "sensor"
    }
    fn attributes(&self) -> Value {
        json!({"value": 21.5})
    }
}

struct Engine {
    handle: DriverHandle,
    session_id: Uuid,
    outbound: mpsc::Receiver<OutboundFrame>,
}

impl Engine {
    fn start(handler: Arc<dyn DeviceHandler>, config: CoreConfig) -> Self {
        let (handle, _task) = Integration::spawn(metadata(), handler, config);
        let (tx, outbound) = mpsc::channel(64);
        let session_id = Uuid::new_v4();
        let session = SessionHandle::new(session_id, tx);
        handle
            .gateway_event(GatewayEvent::SessionOpened(session))
            .unwrap();
        Self {
            handle,
            session_id,
            outbound,
        }
    }

    fn request(&self, id: u32, msg: &str, msg_data: Value) {
        self.handle
            .gateway_event(GatewayEvent::Frame {
                session_id: self.session_id,
                frame: InboundFrame::Request(RequestMessage {
                    id,
                    msg: msg.to_string(),
                    msg_data,
                }),
            })
            .unwrap();
    }

    fn event(&self, msg: &str) {
        self.handle
            .gateway_event(GatewayEvent::Frame {
                session_id: self.session_id,
                frame: InboundFrame::Event(InboundEvent {
                    msg: msg.to_string(),
                    msg_data: Value::Null,
                }),
            })
            .unwrap();
    }

    async fn next_frame(&mut self) -> Value {
        let frame = timeout(RECV_TIMEOUT, self.outbound.recv())
            .await
            .expect("timeout waiting for outbound frame")
            .expect("outbound channel closed");
        serde_json::from_str(&remote_proto::encode(&frame).unwrap()).unwrap()
    }

    async fn expect_silence(&mut self) {
        let result = timeout(Duration::from_millis(200), self.outbound.recv()).await;
        assert!(result.is_err(), "expected no outbound frame, got {result:?}");
    }
}

fn quick_config() -> CoreConfig {
    CoreConfig {
        device_id: Some("device-1".into()),
        connect_announce_delay: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn driver_version_request_scenario() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());

    engine.request(1, "get_driver_version", Value::Null);

    let resp = engine.next_frame().await;
    assert_eq!(resp["kind"], "resp");
    assert_eq!(resp["req_id"], 1);
    assert_eq!(resp["msg"], "driver_version");
    assert_eq!(resp["code"], 200);
    assert_eq!(resp["msg_data"]["name"], "Test Driver");
    assert_eq!(resp["msg_data"]["version"]["driver"], "0.3.0");
    assert!(resp["msg_data"]["version"]["api"].is_string());
}

#[tokio::test]
async fn driver_metadata_returned_verbatim() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());

    engine.request(2, "get_driver_metadata", Value::Null);

    let resp = engine.next_frame().await;
    assert_eq!(resp["msg"], "driver_metadata");
    assert_eq!(resp["msg_data"]["driver_id"], "test_driver");
    assert_eq!(resp["msg_data"]["name"]["en"], "Test Driver");
}

#[tokio::test]
async fn get_device_state_answers_with_event_not_response() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());

    engine.request(3, "get_device_state", Value::Null);

    let frame = engine.next_frame().await;
    assert_eq!(frame["kind"], "event");
    assert_eq!(frame["msg"], "device_state");
    assert_eq!(frame["msg_data"]["state"], "DISCONNECTED");
    assert_eq!(frame["msg_data"]["device_id"], "device-1");
    engine.expect_silence().await;
}

#[tokio::test]
async fn available_entities_filtering_and_wire_shapes() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());
    engine.handle.add_entity(Recorder::new("l1", "light", 200)).unwrap();
    engine.handle.add_entity(Arc::new(Passive { id: "s1" })).unwrap();
    let _ = engine.next_frame().await; // entity_available l1
    let _ = engine.next_frame().await; // entity_available s1

    engine.request(4, "get_available_entities", Value::Null);
    let resp = engine.next_frame().await;
    assert_eq!(resp["msg"], "available_entities");
    assert!(resp["msg_data"].get("filter").is_none());
    assert_eq!(resp["msg_data"]["available_entities"].as_array().unwrap().len(), 2);

    engine.request(
        5,
        "get_available_entities",
        json!({"filter": {"entity_type": "light"}}),
    );
    let resp = engine.next_frame().await;
    assert_eq!(resp["msg_data"]["filter"]["entity_type"], "light");
    let entities = resp["msg_data"]["available_entities"].as_array().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0]["entity_id"], "l1");
}

#[tokio::test]
async fn subscribe_all_is_a_snapshot_not_a_wildcard() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());
    let early = Recorder::new("early", "light", 200);
    engine.handle.add_entity(early.clone()).unwrap();
    let _ = engine.next_frame().await; // entity_available

    engine.request(6, "subscribe_events", Value::Null);
    let resp = engine.next_frame().await;
    assert_eq!(resp["code"], 200);

    // Registered after the subscribe-all call: not covered.
    let late = Recorder::new("late", "light", 200);
    engine.handle.add_entity(late.clone()).unwrap();
    let _ = engine.next_frame().await; // entity_available

    engine.handle.send_entity_change_event(late).unwrap();
    engine.expect_silence().await;

    engine.handle.send_entity_change_event(early).unwrap();
    let change = engine.next_frame().await;
    assert_eq!(change["msg"], "entity_change");
    assert_eq!(change["msg_data"]["entity_id"], "early");
}

#[tokio::test]
async fn unsubscribe_with_list_leaves_other_subscriptions() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());
    let a = Recorder::new("a", "light", 200);
    let b = Recorder::new("b", "light", 200);
    engine.handle.add_entity(a.clone()).unwrap();
    engine.handle.add_entity(b.clone()).unwrap();
    let _ = engine.next_frame().await;
    let _ = engine.next_frame().await;

    engine.request(7, "subscribe_events", Value::Null);
    let _ = engine.next_frame().await;

    engine.request(8, "unsubscribe_events", json!({"entity_ids": ["a"]}));
    let _ = engine.next_frame().await;

    engine.handle.send_entity_change_event(a).unwrap();
    engine.expect_silence().await;

    engine.handle.send_entity_change_event(b).unwrap();
    let change = engine.next_frame().await;
    assert_eq!(change["msg_data"]["entity_id"], "b");
}

#[tokio::test]
async fn no_subscription_means_no_entity_change_events() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());
    let entity = Recorder::new("lonely", "light", 200);
    engine.handle.add_entity(entity.clone()).unwrap();
    let _ = engine.next_frame().await; // entity_available

    engine.handle.send_entity_change_event(entity).unwrap();
    engine.expect_silence().await;
}

#[tokio::test]
async fn standby_suppresses_events_but_not_responses() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());
    let entity = Recorder::new("e", "light", 200);
    engine.handle.add_entity(entity.clone()).unwrap();
    let _ = engine.next_frame().await;
    engine.request(9, "subscribe_events", Value::Null);
    let _ = engine.next_frame().await;

    engine.event("enter_standby");
    engine.handle.send_entity_change_event(entity.clone()).unwrap();
    engine.expect_silence().await;

    // Responses still flow while in standby.
    engine.request(10, "get_driver_version", Value::Null);
    let resp = engine.next_frame().await;
    assert_eq!(resp["kind"], "resp");
    assert_eq!(resp["req_id"], 10);

    engine.event("exit_standby");
    engine.handle.send_entity_change_event(entity).unwrap();
    let change = engine.next_frame().await;
    assert_eq!(change["msg"], "entity_change");
}

#[tokio::test]
async fn entity_command_result_codes() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());
    // Handler result code 500 must not leak into the response.
    let failing = Recorder::new("noisy", "light", 500);
    engine.handle.add_entity(failing.clone()).unwrap();
    engine.handle.add_entity(Arc::new(Passive { id: "mute" })).unwrap();
    let _ = engine.next_frame().await;
    let _ = engine.next_frame().await;

    engine.request(11, "entity_command", json!({"entity_id": "ghost", "cmd_id": "on"}));
    let resp = engine.next_frame().await;
    assert_eq!(resp["code"], 404);

    engine.request(12, "entity_command", json!({"entity_id": "mute", "cmd_id": "on"}));
    let resp = engine.next_frame().await;
    assert_eq!(resp["code"], 404);

    engine.request(13, "entity_command", json!({"entity_id": "noisy", "cmd_id": "on"}));
    let resp = engine.next_frame().await;
    assert_eq!(resp["code"], 200);
    assert_eq!(failing.commands.lock().unwrap().as_slice(), &["on".to_string()]);
}

#[tokio::test]
async fn get_entity_states_is_a_snapshot() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());
    engine.handle.add_entity(Arc::new(Passive { id: "s1" })).unwrap();
    let _ = engine.next_frame().await;

    engine.request(14, "get_entity_states", Value::Null);
    let resp = engine.next_frame().await;
    assert_eq!(resp["msg"], "entity_states");
    let states = resp["msg_data"].as_array().unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0]["entity_id"], "s1");
    assert_eq!(states[0]["entity_type"], "sensor");
    assert_eq!(states[0]["attributes"]["value"], 21.5);
}

#[tokio::test]
async fn connect_flow_announces_connecting_then_collaborator_outcome() {
    let handler = Arc::new(RecordingHandler {
        connect_outcome: Some(DeviceState::Connected),
        ..Default::default()
    });
    let mut engine = Engine::start(handler.clone(), quick_config());

    engine.event("connect");

    let connecting = engine.next_frame().await;
    assert_eq!(connecting["msg"], "device_state");
    assert_eq!(connecting["msg_data"]["state"], "CONNECTING");

    let connected = engine.next_frame().await;
    assert_eq!(connected["msg_data"]["state"], "CONNECTED");
    assert_eq!(
        handler.connection_events.lock().unwrap().as_slice(),
        &[ConnectionEvent::Connect]
    );

    // Connected already: a second connect is a no-op that re-announces.
    engine.event("connect");
    let announced = engine.next_frame().await;
    assert_eq!(announced["msg_data"]["state"], "CONNECTED");
    assert_eq!(handler.connection_events.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn disconnect_only_acted_on_when_connected() {
    let handler = Arc::new(RecordingHandler::default());
    let mut engine = Engine::start(handler.clone(), quick_config());

    // Disconnected: nothing should reach the collaborator.
    engine.event("disconnect");
    engine.expect_silence().await;
    assert!(handler.connection_events.lock().unwrap().is_empty());

    engine.handle.set_device_state(DeviceState::Connected).unwrap();
    let _ = engine.next_frame().await;

    engine.event("disconnect");
    timeout(RECV_TIMEOUT, async {
        loop {
            if !handler.connection_events.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("collaborator never saw the disconnect");
    assert_eq!(
        handler.connection_events.lock().unwrap().as_slice(),
        &[ConnectionEvent::Disconnect]
    );
}

#[tokio::test]
async fn require_user_action_forces_wait_user_action_state() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());

    engine
        .handle
        .set_driver_setup_state(
            SetupEventType::Setup,
            DriverSetupState::Ok,
            None,
            Some(json!({"input": {"fields": []}})),
        )
        .unwrap();

    let change = engine.next_frame().await;
    assert_eq!(change["msg"], "driver_setup_change");
    assert_eq!(change["msg_data"]["state"], "WAIT_USER_ACTION");
    assert!(change["msg_data"].get("require_user_action").is_some());
}

#[tokio::test]
async fn setup_driver_answers_immediately_and_runs_callback_async() {
    let handler = Arc::new(RecordingHandler::default());
    let mut engine = Engine::start(handler.clone(), quick_config());

    engine.request(15, "setup_driver", json!({"setup_data": {"host": "10.0.0.2"}}));
    let resp = engine.next_frame().await;
    assert_eq!(resp["code"], 200);

    timeout(RECV_TIMEOUT, async {
        loop {
            if !handler.setups.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("setup callback never ran");
    assert_eq!(handler.setups.lock().unwrap()[0]["host"], "10.0.0.2");
}

#[tokio::test]
async fn abort_suppresses_setup_changes_until_new_setup_request() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());

    engine.event("abort_driver_setup");
    engine
        .handle
        .set_driver_setup_state(SetupEventType::Stop, DriverSetupState::Ok, None, None)
        .unwrap();
    engine.expect_silence().await;

    // A fresh setup request re-arms the relay.
    engine.request(16, "setup_driver", json!({"setup_data": {}}));
    let _ = engine.next_frame().await; // the 200 result
    engine
        .handle
        .set_driver_setup_state(SetupEventType::Start, DriverSetupState::Setup, None, None)
        .unwrap();
    let change = engine.next_frame().await;
    assert_eq!(change["msg"], "driver_setup_change");
    assert_eq!(change["msg_data"]["state"], "SETUP");
}

#[tokio::test]
async fn removed_entity_loses_its_subscription() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());
    let entity = Recorder::new("r1", "light", 200);
    engine.handle.add_entity(entity.clone()).unwrap();
    let available = engine.next_frame().await;
    assert_eq!(available["msg"], "entity_available");

    engine.request(17, "subscribe_events", Value::Null);
    let _ = engine.next_frame().await;

    engine.handle.remove_entity_by_id("r1").unwrap();
    let removed = engine.next_frame().await;
    assert_eq!(removed["msg"], "entity_removed");
    assert_eq!(removed["msg_data"]["entity_id"], "r1");

    // Re-registering does not resurrect the old subscription.
    engine.handle.add_entity(entity.clone()).unwrap();
    let _ = engine.next_frame().await;
    engine.handle.send_entity_change_event(entity).unwrap();
    engine.expect_silence().await;
}

#[tokio::test]
async fn set_driver_user_data_is_fire_and_forget() {
    let handler = Arc::new(RecordingHandler::default());
    let mut engine = Engine::start(handler.clone(), quick_config());

    engine.request(18, "set_driver_user_data", json!({"input_values": {"pin": "1234"}}));
    let resp = engine.next_frame().await;
    assert_eq!(resp["code"], 200);

    timeout(RECV_TIMEOUT, async {
        loop {
            if !handler.user_data.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("user_data callback never ran");
    let recorded = handler.user_data.lock().unwrap();
    assert_eq!(
        recorded[0].input_values.as_ref().unwrap()["pin"],
        json!("1234")
    );
}

#[tokio::test]
async fn unknown_request_gets_no_response() {
    let mut engine = Engine::start(Arc::new(RecordingHandler::default()), quick_config());

    engine.request(19, "warp_core_eject", Value::Null);
    engine.expect_silence().await;

    // The engine is still alive afterwards.
    engine.request(20, "get_driver_version", Value::Null);
    let resp = engine.next_frame().await;
    assert_eq!(resp["req_id"], 20);
}
