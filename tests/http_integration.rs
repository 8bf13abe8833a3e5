// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the HTTP transport and device proxies using wiremock.

use std::sync::Arc;

use petsafe_lib::transport::{HttpConfig, HttpTransport, Transport};
use petsafe_lib::{Error, Feeder, FoodLevel, Litterbox, PetSafeClient, RemoteError, SyncPolicy};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(mock_server: &MockServer) -> HttpTransport {
    HttpConfig::new("test-token")
        .with_base_url(mock_server.uri())
        .into_transport()
        .unwrap()
}

fn client(mock_server: &MockServer) -> PetSafeClient<HttpTransport> {
    PetSafeClient::new(transport(mock_server))
}

fn feeder_doc() -> Value {
    json!({
        "id": 4242,
        "thing_name": "feeder-1",
        "battery_voltage": "29100",
        "is_batteries_installed": true,
        "food_sensor_current": 1,
        "is_food_low": 0,
        "settings": {
            "child_lock": false,
            "friendly_name": "Kitchen",
            "paused": false,
            "pet_type": "cat",
            "slow_feed": true
        }
    })
}

fn litterbox_doc() -> Value {
    json!({
        "thingName": "lb-1",
        "friendlyName": "Hallway",
        "rakeCount": 3
    })
}

fn feeder(mock_server: &MockServer) -> Feeder<HttpTransport> {
    Feeder::new(Arc::new(transport(mock_server)), feeder_doc()).unwrap()
}

fn litterbox(mock_server: &MockServer) -> Litterbox<HttpTransport> {
    Litterbox::new(Arc::new(transport(mock_server)), litterbox_doc()).unwrap()
}

// ============================================================================
// HttpTransport Tests
// ============================================================================

mod http_transport {
    use super::*;

    #[tokio::test]
    async fn sends_authorization_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders"))
            .and(header("Authorization", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let feeders = client(&mock_server).feeders().await.unwrap();
        assert!(feeders.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_returned_not_raised() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let response = transport(&mock_server)
            .get("smart-feed/feeders")
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(response.body(), "boom");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn posts_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({ "a": 1 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = transport(&mock_server)
            .post("echo", &json!({ "a": 1 }))
            .await
            .unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.json().unwrap(), json!({ "ok": true }));
    }
}

// ============================================================================
// Discovery Tests
// ============================================================================

mod discovery {
    use super::*;

    #[tokio::test]
    async fn lists_feeders() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                feeder_doc(),
                { "thing_name": "feeder-2", "settings": {} }
            ])))
            .mount(&mock_server)
            .await;

        let feeders = client(&mock_server).feeders().await.unwrap();

        assert_eq!(feeders.len(), 2);
        assert_eq!(feeders[0].api_path(), "smart-feed/feeders/feeder-1/");
        assert_eq!(feeders[1].api_name(), "feeder-2");
    }

    #[tokio::test]
    async fn lists_litterboxes_from_data_wrapper() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/scoopfree/product/product"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": [litterbox_doc()] })),
            )
            .mount(&mock_server)
            .await;

        let litterboxes = client(&mock_server).litterboxes().await.unwrap();

        assert_eq!(litterboxes.len(), 1);
        assert_eq!(litterboxes[0].api_path(), "scoopfree/product/product/lb-1/");
        assert_eq!(litterboxes[0].friendly_name().unwrap(), "Hallway");
    }

    #[tokio::test]
    async fn litterbox_listing_without_data_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/scoopfree/product/product"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([litterbox_doc()])))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server).litterboxes().await;
        assert!(matches!(
            result,
            Err(Error::Remote(RemoteError::UnexpectedShape(_)))
        ));
    }

    #[tokio::test]
    async fn unauthorized_listing_surfaces_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired token"))
            .mount(&mock_server)
            .await;

        match client(&mock_server).feeders().await {
            Err(Error::Remote(RemoteError::Status { status, body })) => {
                assert_eq!(status, 401);
                assert_eq!(body, "expired token");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}

// ============================================================================
// Feeder Tests
// ============================================================================

mod feeder_commands {
    use super::*;

    #[tokio::test]
    async fn refresh_replaces_snapshot() {
        let mock_server = MockServer::start().await;

        let fresh = json!({ "thing_name": "feeder-1", "settings": { "slow_feed": false } });
        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fresh.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        feeder.refresh().await.unwrap();

        assert_eq!(feeder.snapshot().clone().into_value(), fresh);
        assert!(feeder.snapshot().get(&["battery_voltage"]).is_none());
    }

    #[tokio::test]
    async fn refresh_failure_keeps_snapshot() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        let before = feeder.to_json();

        let err = feeder.refresh().await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteError::Status { status: 502, .. })));
        assert_eq!(feeder.to_json(), before);
    }

    #[tokio::test]
    async fn apply_setting_merges_key_without_refresh() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/smart-feed/feeders/feeder-1/settings/child_lock"))
            .and(body_json(json!({ "value": true })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        feeder.set_child_lock(true).await.unwrap();

        assert!(feeder.child_lock().unwrap());
        assert!(feeder.slow_feed().unwrap());
        assert_eq!(feeder.friendly_name().unwrap(), "Kitchen");
    }

    #[tokio::test]
    async fn apply_setting_full_refresh() {
        let mock_server = MockServer::start().await;

        let mut fresh = feeder_doc();
        fresh["settings"]["friendly_name"] = json!("Pantry");

        Mock::given(method("PUT"))
            .and(path("/smart-feed/feeders/feeder-1/settings/friendly_name"))
            .and(body_json(json!({ "value": "Pantry" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fresh.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        feeder
            .apply_setting("friendly_name", "Pantry", SyncPolicy::FullRefresh)
            .await
            .unwrap();

        assert_eq!(feeder.snapshot().clone().into_value(), fresh);
    }

    #[tokio::test]
    async fn rejected_setting_keeps_snapshot() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/smart-feed/feeders/feeder-1/settings/pet_type"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad pet"))
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        let before = feeder.to_json();

        let err = feeder.set_pet_type("dragon").await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteError::Status { status: 400, .. })));
        assert_eq!(feeder.to_json(), before);
        assert_eq!(feeder.pet_type().unwrap(), "cat");
    }

    #[tokio::test]
    async fn feed_defaults_to_current_slow_feed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/smart-feed/feeders/feeder-1/meals"))
            .and(body_json(json!({ "amount": 1, "slow_feed": true })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        feeder.feed(1, None, SyncPolicy::NoSync).await.unwrap();
    }

    #[tokio::test]
    async fn prime_ignores_slow_feed_setting() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/smart-feed/feeders/feeder-1/meals"))
            .and(body_json(json!({ "amount": 5, "slow_feed": false })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feeder_doc()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        assert!(feeder.slow_feed().unwrap());
        feeder.prime(SyncPolicy::FullRefresh).await.unwrap();
    }

    #[tokio::test]
    async fn repeat_feed_uses_newest_completed_meal() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/messages"))
            .and(query_param("days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "message_type": "FOOD_LOW" },
                { "message_type": "FEED_DONE", "amount": 3 },
                { "message_type": "FEED_DONE", "amount": 2 }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/smart-feed/feeders/feeder-1/meals"))
            .and(body_json(json!({ "amount": 3, "slow_feed": true })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feeder_doc()))
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        assert_eq!(feeder.repeat_feed(SyncPolicy::FullRefresh).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn repeat_feed_without_history_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "message_type": "FOOD_LOW" },
                { "message_type": "WIFI_RECONNECTED" }
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        assert_eq!(feeder.repeat_feed(SyncPolicy::FullRefresh).await.unwrap(), None);
    }

    #[tokio::test]
    async fn schedule_feed_returns_created_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/smart-feed/feeders/feeder-1/schedules"))
            .and(body_json(json!({ "time": "07:30", "amount": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 123_456 })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        let created = feeder
            .schedule_feed("07:30", 2, SyncPolicy::NoSync)
            .await
            .unwrap();

        assert_eq!(created["id"], 123_456);
    }

    #[tokio::test]
    async fn schedule_feed_with_empty_body_still_refreshes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/smart-feed/feeders/feeder-1/schedules"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;
        let fresh = json!({ "thing_name": "feeder-1", "settings": { "paused": false } });
        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fresh.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        let result = feeder
            .schedule_feed("07:00", 1, SyncPolicy::FullRefresh)
            .await;

        assert!(matches!(
            result,
            Err(Error::Remote(RemoteError::MalformedBody(_)))
        ));
        assert_eq!(feeder.snapshot().clone().into_value(), fresh);
    }

    #[tokio::test]
    async fn modify_and_delete_schedules() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/smart-feed/feeders/feeder-1/schedules/123456"))
            .and(body_json(json!({ "time": "18:00", "amount": 4 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/smart-feed/feeders/feeder-1/schedules/123456"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/smart-feed/feeders/feeder-1/schedules"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        feeder
            .modify_schedule("123456", "18:00", 4, SyncPolicy::NoSync)
            .await
            .unwrap();
        feeder
            .delete_schedule("123456", SyncPolicy::NoSync)
            .await
            .unwrap();
        feeder
            .delete_all_schedules(SyncPolicy::NoSync)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pause_schedules_merges_paused() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/smart-feed/feeders/feeder-1/settings/paused"))
            .and(body_json(json!({ "value": true })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut feeder = feeder(&mock_server);
        feeder
            .pause_schedules(true, SyncPolicy::MergeKey)
            .await
            .unwrap();

        assert!(feeder.paused().unwrap());
    }

    #[tokio::test]
    async fn read_only_requests_return_body_verbatim() {
        let mock_server = MockServer::start().await;

        let schedules = json!([{ "id": 1, "time": "08:00", "amount": 2 }]);
        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/schedules"))
            .respond_with(ResponseTemplate::new(200).set_body_json(schedules.clone()))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/smart-feed/feeders/feeder-1/messages"))
            .and(query_param("days", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let feeder = feeder(&mock_server);
        let before = feeder.to_json();

        assert_eq!(feeder.get_schedules().await.unwrap(), schedules);
        assert_eq!(feeder.get_messages_since(2).await.unwrap(), json!([]));
        assert_eq!(feeder.to_json(), before);
    }

    #[tokio::test]
    async fn derived_accessors() {
        let mock_server = MockServer::start().await;
        let feeder = feeder(&mock_server);

        assert_eq!(feeder.id().unwrap(), "4242");
        assert_eq!(feeder.battery_level().unwrap(), 100);
        assert!((feeder.battery_voltage().unwrap() - 6.394).abs() < 1e-9);
        assert_eq!(feeder.food_low_status().unwrap(), FoodLevel::Full);
        assert_eq!(feeder.food_sensor_current().unwrap(), 1);
    }
}

// ============================================================================
// Litterbox Tests
// ============================================================================

mod litterbox_commands {
    use super::*;

    #[tokio::test]
    async fn rake_returns_refreshed_data() {
        let mock_server = MockServer::start().await;

        let inner = json!({ "thingName": "lb-1", "friendlyName": "Hallway", "rakeCount": 4 });
        Mock::given(method("POST"))
            .and(path("/scoopfree/product/product/lb-1/rake-now"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/scoopfree/product/product/lb-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": inner })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut litterbox = litterbox(&mock_server);
        let data = litterbox.rake(SyncPolicy::FullRefresh).await.unwrap();

        assert_eq!(data, Some(inner));
        assert_eq!(litterbox.api_path(), "scoopfree/product/product/lb-1/");
        assert_eq!(litterbox.friendly_name().unwrap(), "Hallway");
    }

    #[tokio::test]
    async fn rake_without_refresh_returns_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/scoopfree/product/product/lb-1/rake-now"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut litterbox = litterbox(&mock_server);
        assert_eq!(litterbox.rake(SyncPolicy::NoSync).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejected_rake_keeps_snapshot() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/scoopfree/product/product/lb-1/rake-now"))
            .respond_with(ResponseTemplate::new(503).set_body_string("offline"))
            .mount(&mock_server)
            .await;

        let mut litterbox = litterbox(&mock_server);
        let before = litterbox.to_json();

        let err = litterbox.rake(SyncPolicy::FullRefresh).await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteError::Status { status: 503, .. })));
        assert_eq!(litterbox.to_json(), before);
    }

    #[tokio::test]
    async fn shadow_updates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/scoopfree/product/product/lb-1/shadow"))
            .and(body_json(json!({ "rakeCount": 0 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/scoopfree/product/product/lb-1/shadow"))
            .and(body_json(json!({ "rakeDelayTime": 20 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/scoopfree/product/product/lb-1/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "rakeCount": 0 } })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut litterbox = litterbox(&mock_server);

        let data = litterbox
            .reset_rake_count(0, SyncPolicy::FullRefresh)
            .await
            .unwrap();
        assert_eq!(data, Some(json!({ "rakeCount": 0 })));

        let data = litterbox
            .set_rake_delay(20, SyncPolicy::NoSync)
            .await
            .unwrap();
        assert_eq!(data, None);
    }

    #[tokio::test]
    async fn apply_setting_merges_top_level() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/scoopfree/product/product/lb-1/settings"))
            .and(body_json(json!({ "friendlyName": "Upstairs" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut litterbox = litterbox(&mock_server);
        litterbox.set_friendly_name("Upstairs").await.unwrap();

        assert_eq!(litterbox.friendly_name().unwrap(), "Upstairs");
        assert_eq!(litterbox.snapshot().get(&["rakeCount"]), Some(&json!(3)));
    }

    #[tokio::test]
    async fn get_activity_verbatim() {
        let mock_server = MockServer::start().await;

        let activity = json!({ "data": [{ "type": "RAKE_FINISHED" }] });
        Mock::given(method("GET"))
            .and(path("/scoopfree/product/product/lb-1/activity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(activity.clone()))
            .mount(&mock_server)
            .await;

        let litterbox = litterbox(&mock_server);
        assert_eq!(litterbox.get_activity().await.unwrap(), activity);
    }
}
