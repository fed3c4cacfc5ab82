//! Request dispatch.
//!
//! Maps an inbound request's `msg` discriminator to a handler against the
//! engine state and queues the response, when the operation has one.
//! Unknown discriminators are logged and produce no response at all.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use remote_proto::messages::{
    request, response, AvailableEntitiesRequest, AvailableEntitiesResponse, DriverVersionInfo,
    EntityCommandRequest, EntityFilter, SetDriverUserDataRequest, SetupDriverRequest,
    SubscribeEventsRequest, VersionBlock, API_VERSION,
};
use remote_proto::{RequestMessage, ResponseMessage};

use crate::integration::{to_payload, Integration};

impl Integration {
    pub(crate) async fn handle_request(&mut self, req: RequestMessage) {
        debug!(id = req.id, msg = %req.msg, "request received");

        let response = match req.msg.as_str() {
            request::AUTH => Some(ResponseMessage::authentication(req.id)),
            request::GET_DRIVER_VERSION => Some(self.driver_version(&req)),
            request::GET_DRIVER_METADATA => Some(ResponseMessage::new(
                req.id,
                response::DRIVER_METADATA,
                200,
                to_payload(&self.metadata),
            )),
            request::GET_DEVICE_STATE => {
                // Answered with a device_state event, deliberately not a resp
                // envelope.
                self.announce_device_state();
                None
            }
            request::GET_AVAILABLE_ENTITIES => Some(self.available_entities(&req)),
            request::SUBSCRIBE_EVENTS => Some(self.subscribe_events(&req)),
            request::UNSUBSCRIBE_EVENTS => Some(self.unsubscribe_events(&req)),
            request::GET_ENTITY_STATES => Some(ResponseMessage::new(
                req.id,
                response::ENTITY_STATES,
                200,
                to_payload(&self.catalog.states()),
            )),
            request::ENTITY_COMMAND => Some(self.entity_command(&req).await),
            request::SETUP_DRIVER => Some(self.setup_driver(&req)),
            request::SET_DRIVER_USER_DATA => Some(self.set_driver_user_data(&req)),
            other => {
                warn!(msg = other, "unknown request, no response sent");
                None
            }
        };

        if let Some(response) = response {
            self.send_response(response);
        }
    }

    fn driver_version(&self, req: &RequestMessage) -> ResponseMessage {
        let info = DriverVersionInfo {
            name: self.metadata.display_name().to_string(),
            version: VersionBlock {
                api: API_VERSION.to_string(),
                driver: self.metadata.version.clone(),
            },
        };
        ResponseMessage::new(req.id, response::DRIVER_VERSION, 200, to_payload(&info))
    }

    fn available_entities(&mut self, req: &RequestMessage) -> ResponseMessage {
        let Some(parsed) = parse_request::<AvailableEntitiesRequest>(req) else {
            return ResponseMessage::bad_request(req.id);
        };
        let entity_type = parsed.filter.as_ref().and_then(|f| f.entity_type.clone());

        // The response echoes the filter only when one was given; the two
        // shapes are distinct on the wire.
        let payload = AvailableEntitiesResponse {
            filter: entity_type.clone().map(|t| EntityFilter {
                entity_type: Some(t),
            }),
            available_entities: self.catalog.descriptions(entity_type.as_deref()),
        };
        ResponseMessage::new(
            req.id,
            response::AVAILABLE_ENTITIES,
            200,
            to_payload(&payload),
        )
    }

    fn subscribe_events(&mut self, req: &RequestMessage) -> ResponseMessage {
        let Some(parsed) = parse_request::<SubscribeEventsRequest>(req) else {
            return ResponseMessage::bad_request(req.id);
        };
        let catalog_ids: Vec<String> = self.catalog.ids().map(str::to_string).collect();
        self.subscriptions.apply_subscribe(
            catalog_ids.iter().map(String::as_str),
            parsed.entity_ids.as_deref(),
        );
        ResponseMessage::ok(req.id)
    }

    fn unsubscribe_events(&mut self, req: &RequestMessage) -> ResponseMessage {
        let Some(parsed) = parse_request::<SubscribeEventsRequest>(req) else {
            return ResponseMessage::bad_request(req.id);
        };
        self.subscriptions
            .apply_unsubscribe(parsed.entity_ids.as_deref());
        ResponseMessage::ok(req.id)
    }

    async fn entity_command(&mut self, req: &RequestMessage) -> ResponseMessage {
        // Unlike the other payloads there is no usable default here: a
        // command without an entity id is a bad request outright.
        let parsed: EntityCommandRequest = match serde_json::from_value(req.msg_data.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(id = req.id, error = %err, "bad entity_command payload");
                return ResponseMessage::bad_request(req.id);
            }
        };
        let Some(entity) = self.catalog.get(&parsed.entity_id).cloned() else {
            warn!(entity = %parsed.entity_id, "entity_command for unknown entity");
            return ResponseMessage::not_found(req.id);
        };

        match entity
            .handle_command(&parsed.cmd_id, parsed.params.as_ref())
            .await
        {
            // The handler's own result code is logged, not surfaced: the
            // response reports only that the entity exists and was invoked.
            Some(code) => {
                debug!(entity = %parsed.entity_id, cmd = %parsed.cmd_id, code, "entity command dispatched");
                ResponseMessage::ok(req.id)
            }
            None => {
                warn!(entity = %parsed.entity_id, cmd = %parsed.cmd_id, "entity handles no commands");
                ResponseMessage::not_found(req.id)
            }
        }
    }

    fn setup_driver(&mut self, req: &RequestMessage) -> ResponseMessage {
        let Some(parsed) = parse_request::<SetupDriverRequest>(req) else {
            return ResponseMessage::bad_request(req.id);
        };

        // A fresh setup request re-arms the relay after an abort.
        self.setup.arm();

        // Fire-and-forget: the real outcome arrives later through
        // driver_setup_change events, never through this response.
        let handler = self.handler.clone();
        let driver = self.handle.clone();
        tokio::spawn(async move {
            handler.setup(driver, parsed).await;
        });

        ResponseMessage::ok(req.id)
    }

    fn set_driver_user_data(&mut self, req: &RequestMessage) -> ResponseMessage {
        let Some(parsed) = parse_request::<SetDriverUserDataRequest>(req) else {
            return ResponseMessage::bad_request(req.id);
        };

        let handler = self.handler.clone();
        let driver = self.handle.clone();
        tokio::spawn(async move {
            handler.user_data(driver, parsed).await;
        });

        ResponseMessage::ok(req.id)
    }
}

/// Parse a request payload, treating an absent payload as default.
///
/// Returns `None` (the caller answers 400) when a payload is present but
/// does not match the expected shape.
fn parse_request<T: DeserializeOwned + Default>(req: &RequestMessage) -> Option<T> {
    if req.msg_data.is_null() {
        return Some(T::default());
    }
    match serde_json::from_value(req.msg_data.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(id = req.id, msg = %req.msg, error = %err, "bad request payload");
            None
        }
    }
}
