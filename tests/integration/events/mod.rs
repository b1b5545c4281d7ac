//! Registration and payment review integration tests
//!
//! Covers the events domain endpoints end to end:
//! - POST /v1/events (admin)
//! - POST /v1/events/{event_id}/register
//! - POST /v1/events/{event_id}/participation/payment
//! - POST /v1/events/{event_id}/participation/cancel
//! - POST /v1/admin/participations/{participation_id}/{verify,reject,send-confirmation}

use axum::http::{Method, StatusCode};
use serde_json::json;
use serial_test::serial;

use crate::common::{field, TestApp};

fn amount(participation: &serde_json::Value) -> f64 {
    participation["amount"]
        .as_str()
        .and_then(|a| a.parse().ok())
        .or_else(|| participation["amount"].as_f64())
        .unwrap_or_default()
}

mod test_events {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_participant_cannot_create_event() {
        let app = TestApp::new().await.unwrap();
        let ada = app.participant("Ada");

        let (status, json) = app
            .call(
                Method::POST,
                "/v1/events",
                Some(&ada),
                Some(json!({ "slug": "not-allowed", "name": "Nope", "fee": "0" })),
            )
            .await
            .unwrap();

        assert_eq!(status, StatusCode::FORBIDDEN, "{json}");
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_duplicate_slug_is_conflict() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();

        let (status, _) = app
            .call(
                Method::POST,
                "/v1/events",
                Some(&admin),
                Some(json!({ "slug": field(&event, "slug"), "name": "Again", "fee": "0" })),
            )
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CONFLICT);
    }
}

mod test_registration {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_free_event_registration_and_confirmation() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let participation = app.register(&ada, event_id).await.unwrap();
        assert_eq!(participation["status"], "REGISTERED");
        assert_eq!(participation["email"], ada.email.as_str());

        // A second registration for the same event is refused
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/register"),
                Some(&ada),
                Some(json!({ "full_name": "Ada" })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        // Free events take no payment
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/participation/payment"),
                Some(&ada),
                Some(json!({ "transaction_id": "UPI-123456", "screenshot_key": "proofs/a.png" })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, json) = app
            .call(
                Method::POST,
                &format!(
                    "/v1/admin/participations/{}/verify",
                    field(&participation, "id")
                ),
                Some(&admin),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["participation"]["status"], "CONFIRMED");

        assert!(app
            .email
            .latest_of_type(&ada.email, "payment_confirmed")
            .is_some());

        let (status, json) = app
            .call(Method::GET, "/v1/participations", Some(&ada), None)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_closed_registration_is_conflict() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app
            .create_event(&admin, json!({ "registration_open": false }))
            .await
            .unwrap();

        let ada = app.participant("Ada");
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/events/{}/register", field(&event, "id")),
                Some(&ada),
                Some(json!({ "full_name": "Ada" })),
            )
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_cancelled_registration_cannot_reregister() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        app.register(&ada, event_id).await.unwrap();

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/participation/cancel"),
                Some(&ada),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "CANCELLED");

        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/register"),
                Some(&ada),
                Some(json!({ "full_name": "Ada" })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);
    }
}

mod test_payment_review {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_reject_then_resubmit_then_verify() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app
            .create_event(&admin, json!({ "fee": "250.00" }))
            .await
            .unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let participation = app.register(&ada, event_id).await.unwrap();
        assert_eq!(participation["status"], "PENDING_PAYMENT");
        let participation_id = field(&participation, "id").to_string();

        let submit = |reference: &'static str| {
            json!({ "transaction_id": reference, "screenshot_key": "proofs/ada.png" })
        };

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/participation/payment"),
                Some(&ada),
                Some(submit("UPI-0001")),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "PAYMENT_SUBMITTED");
        assert_eq!(amount(&json["data"]), 250.0);
        assert!(json["data"]["payment_proof_url"].is_string());

        // A reason is mandatory
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/admin/participations/{participation_id}/reject"),
                Some(&admin),
                Some(json!({ "reason": "" })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/admin/participations/{participation_id}/reject"),
                Some(&admin),
                Some(json!({ "reason": "Screenshot is unreadable" })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "PENDING_PAYMENT");
        assert_eq!(json["data"]["rejection_reason"], "Screenshot is unreadable");
        assert!(app
            .email
            .latest_of_type(&ada.email, "payment_rejected")
            .is_some());

        app.call(
            Method::POST,
            &format!("/v1/events/{event_id}/participation/payment"),
            Some(&ada),
            Some(submit("UPI-0002")),
        )
        .await
        .unwrap();

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/admin/participations/{participation_id}/verify"),
                Some(&admin),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["participation"]["status"], "CONFIRMED");
        assert_eq!(
            json["data"]["participation"]["verified_by"],
            admin.id.to_string()
        );

        // Verified payments cannot be verified twice
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/admin/participations/{participation_id}/verify"),
                Some(&admin),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/admin/participations/{participation_id}/send-confirmation"),
                Some(&admin),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);

        let (status, json) = app
            .call(
                Method::GET,
                &format!("/v1/admin/events/{event_id}/participations?status=CONFIRMED"),
                Some(&admin),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["total"], 1);
    }
}
