//! Team formation integration tests
//!
//! Covers team creation, direct joins, join requests by code, leadership
//! transfer, member removal and team-mode payment coverage.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use serial_test::serial;

use crate::common::{field, TestApp, TestUser};

async fn respond(app: &TestApp, leader: &TestUser, request_id: &str, approve: bool) -> StatusCode {
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/v1/join-requests/{request_id}/respond"),
            Some(leader),
            Some(json!({ "approve": approve })),
        )
        .await
        .unwrap();
    status
}

async fn request_join(app: &TestApp, user: &TestUser, team_id: &str) -> (StatusCode, Value) {
    app.call(
        Method::POST,
        &format!("/v1/teams/{team_id}/join-requests"),
        Some(user),
        Some(json!({})),
    )
    .await
    .unwrap()
}

async fn create_team(app: &TestApp, leader: &TestUser, event_id: &str, body: Value) -> Value {
    let (status, json) = app
        .call(
            Method::POST,
            &format!("/v1/events/{event_id}/teams"),
            Some(leader),
            Some(body),
        )
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"].clone()
}

async fn join(app: &TestApp, user: &TestUser, team_id: &str) -> (StatusCode, Value) {
    app.call(
        Method::POST,
        &format!("/v1/teams/{team_id}/join"),
        Some(user),
        None,
    )
    .await
    .unwrap()
}

mod test_team_payment {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_leader_payment_covers_members() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app
            .create_event(
                &admin,
                json!({ "fee": "100", "payment_mode": "team", "max_team_size": 3 }),
            )
            .await
            .unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let bob = app.participant("Bob");
        let cy = app.participant("Cy");
        let dee = app.participant("Dee");
        app.register(&ada, event_id).await.unwrap();
        let bob_participation = app.register(&bob, event_id).await.unwrap();
        app.register(&cy, event_id).await.unwrap();
        app.register(&dee, event_id).await.unwrap();

        let team = create_team(&app, &ada, event_id, json!({ "name": "Engines" })).await;
        let team_id = field(&team, "id");
        assert_eq!(team["max_members"], 3);
        assert!(team["code"].is_string());

        let (status, json) = join(&app, &bob, team_id).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");

        // Members do not pay for themselves in team mode
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/participation/payment"),
                Some(&bob),
                Some(json!({ "transaction_id": "UPI-BOB-1", "screenshot_key": "proofs/bob.png" })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/participation/payment"),
                Some(&ada),
                Some(json!({ "transaction_id": "UPI-ADA-1", "screenshot_key": "proofs/ada.png" })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        let leader_participation_id = field(&json["data"], "id").to_string();

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/admin/participations/{leader_participation_id}/verify"),
                Some(&admin),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(
            json["data"]["covered_member_ids"],
            json!([field(&bob_participation, "id")])
        );
        assert!(app.email.latest_of_type(&bob.email, "payment_confirmed").is_some());

        // A newcomer joining a paid-up team is covered on arrival
        let (status, json) = join(&app, &cy, team_id).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["data"]["covered_status"], "CONFIRMED");

        // Leader plus two members fills a team of three
        let (status, _) = join(&app, &dee, team_id).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}

mod test_join_requests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_private_team_request_by_code_and_leadership_handover() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let bob = app.participant("Bob");
        app.register(&ada, event_id).await.unwrap();
        let bob_participation = app.register(&bob, event_id).await.unwrap();

        let team = create_team(
            &app,
            &ada,
            event_id,
            json!({ "name": "Night Owls", "code": "owls42", "visibility": "private" }),
        )
        .await;
        let team_id = field(&team, "id").to_string();
        assert_eq!(team["code"], "OWLS42");

        // Private teams stay out of the listing and refuse direct joins
        let (status, json) = app
            .call(
                Method::GET,
                &format!("/v1/events/{event_id}/teams"),
                Some(&bob),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"], json!([]));

        let (status, _) = join(&app, &bob, &team_id).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/join-requests"),
                Some(&bob),
                Some(json!({ "code": "OWLS42", "message": "I write Rust" })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["data"]["status"], "PENDING");
        let request_id = field(&json["data"], "id").to_string();

        let notice = app
            .email
            .latest_of_type(&ada.email, "join_request_received")
            .expect("leader should be notified");
        assert_eq!(notice.team_id().map(|id| id.to_string()), Some(team_id.clone()));

        // Only the leader decides
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/join-requests/{request_id}/respond"),
                Some(&bob),
                Some(json!({ "approve": true })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/join-requests/{request_id}/respond"),
                Some(&ada),
                Some(json!({ "approve": true })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "APPROVED");
        assert!(app
            .email
            .latest_of_type(&bob.email, "join_request_approved")
            .is_some());

        let (status, json) = app
            .call(
                Method::GET,
                &format!("/v1/events/{event_id}/teams/mine"),
                Some(&bob),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["role"], "member");
        assert_eq!(json["data"]["team"]["code"], "OWLS42");

        // The leader cannot walk away from a team with members
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/teams/{team_id}/leave"),
                Some(&ada),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/teams/{team_id}/transfer"),
                Some(&ada),
                Some(json!({ "participation_id": field(&bob_participation, "id") })),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["leader_id"], bob_participation["id"]);

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/teams/{team_id}/leave"),
                Some(&ada),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/teams/{team_id}/leave"),
                Some(&bob),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["message"], "Team deleted");

        let (status, json) = app
            .call(
                Method::GET,
                &format!("/v1/events/{event_id}/teams/mine"),
                Some(&bob),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_withdrawn_request_disappears_from_my_requests() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let bob = app.participant("Bob");
        app.register(&ada, event_id).await.unwrap();
        app.register(&bob, event_id).await.unwrap();

        let team = create_team(&app, &ada, event_id, json!({ "name": "Pathfinders" })).await;

        let (status, json) = app
            .call(
                Method::POST,
                &format!("/v1/teams/{}/join-requests", field(&team, "id")),
                Some(&bob),
                Some(json!({})),
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let request_id = field(&json["data"], "id").to_string();

        let mine = format!("/v1/events/{event_id}/join-requests/mine");
        let (_, json) = app.call(Method::GET, &mine, Some(&bob), None).await.unwrap();
        assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

        let (status, _) = app
            .call(
                Method::DELETE,
                &format!("/v1/join-requests/{request_id}"),
                Some(&bob),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);

        let (_, json) = app.call(Method::GET, &mine, Some(&bob), None).await.unwrap();
        assert_eq!(json["data"], json!([]));
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_rejected_requester_stays_out() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let cy = app.participant("Cy");
        app.register(&ada, event_id).await.unwrap();
        app.register(&cy, event_id).await.unwrap();

        let team = create_team(&app, &ada, event_id, json!({ "name": "Gatekeepers" })).await;
        let team_id = field(&team, "id");

        let (status, json) = request_join(&app, &cy, team_id).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let request_id = field(&json["data"], "id").to_string();
        assert_eq!(respond(&app, &ada, &request_id, false).await, StatusCode::OK);

        // A decided request cannot be decided again
        assert_eq!(respond(&app, &ada, &request_id, true).await, StatusCode::CONFLICT);

        let (status, _) = request_join(&app, &cy, team_id).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Nor can the requester walk in through the public door
        let (status, json) = join(&app, &cy, team_id).await;
        assert_eq!(status, StatusCode::CONFLICT, "{json}");

        let (_, json) = app
            .call(
                Method::GET,
                &format!("/v1/events/{event_id}/teams/mine"),
                Some(&cy),
                None,
            )
            .await
            .unwrap();
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_full_team_refuses_requests_and_approvals() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app
            .create_event(&admin, json!({ "max_team_size": 2 }))
            .await
            .unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let bob = app.participant("Bob");
        let cy = app.participant("Cy");
        app.register(&ada, event_id).await.unwrap();
        app.register(&bob, event_id).await.unwrap();
        app.register(&cy, event_id).await.unwrap();

        let team = create_team(&app, &ada, event_id, json!({ "name": "Pair Programmers" })).await;
        let team_id = field(&team, "id");

        // Both ask while there is still a free slot
        let (status, json) = request_join(&app, &bob, team_id).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let bob_request = field(&json["data"], "id").to_string();
        let (status, json) = request_join(&app, &cy, team_id).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let cy_request = field(&json["data"], "id").to_string();

        assert_eq!(respond(&app, &ada, &bob_request, true).await, StatusCode::OK);

        // Leader plus one member fills a team of two
        assert_eq!(respond(&app, &ada, &cy_request, true).await, StatusCode::CONFLICT);

        let dee = app.participant("Dee");
        app.register(&dee, event_id).await.unwrap();
        let (status, _) = request_join(&app, &dee, team_id).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}

mod test_membership {
    use super::*;
    use regdesk_events::{lock_participation_tx, lock_team_row_tx};
    use std::time::Duration;
    use uuid::Uuid;

    async fn count(app: &TestApp, query: &str, id: Uuid) -> i64 {
        sqlx::query_scalar(query)
            .bind(id)
            .fetch_one(&app.pool)
            .await
            .unwrap()
    }

    async fn remove(
        app: &TestApp,
        leader: &TestUser,
        team_id: &str,
        participation_id: &str,
    ) -> StatusCode {
        let (status, _) = app
            .call(
                Method::DELETE,
                &format!("/v1/teams/{team_id}/members/{participation_id}"),
                Some(leader),
                None,
            )
            .await
            .unwrap();
        status
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_remove_member_deletes_participation_and_account() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let bob = app.participant("Bob");
        app.register(&ada, event_id).await.unwrap();
        let bob_participation = app.register(&bob, event_id).await.unwrap();
        let bob_participation_id = field(&bob_participation, "id").to_string();

        let team = create_team(&app, &ada, event_id, json!({ "name": "Tidy Crew" })).await;
        let team_id = field(&team, "id");
        let (status, json) = join(&app, &bob, team_id).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");

        // Members cannot remove each other
        assert_eq!(
            remove(&app, &bob, team_id, &bob_participation_id).await,
            StatusCode::FORBIDDEN
        );

        assert_eq!(
            remove(&app, &ada, team_id, &bob_participation_id).await,
            StatusCode::OK
        );

        let participation_uuid = Uuid::parse_str(&bob_participation_id).unwrap();
        let remaining = count(
            &app,
            "SELECT COUNT(*) FROM participations WHERE id = $1",
            participation_uuid,
        )
        .await;
        assert_eq!(remaining, 0);
        assert_eq!(count(&app, "SELECT COUNT(*) FROM users WHERE id = $1", bob.id).await, 0);

        assert_eq!(
            remove(&app, &ada, team_id, &bob_participation_id).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_remove_member_keeps_account_with_other_registration() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let other_event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let bob = app.participant("Bob");
        app.register(&ada, event_id).await.unwrap();
        let bob_participation = app.register(&bob, event_id).await.unwrap();
        app.register(&bob, field(&other_event, "id")).await.unwrap();

        let team = create_team(&app, &ada, event_id, json!({ "name": "Tidy Crew" })).await;
        let team_id = field(&team, "id");
        join(&app, &bob, team_id).await;

        assert_eq!(
            remove(&app, &ada, team_id, field(&bob_participation, "id")).await,
            StatusCode::OK
        );

        assert_eq!(count(&app, "SELECT COUNT(*) FROM users WHERE id = $1", bob.id).await, 1);
        let remaining = count(
            &app,
            "SELECT COUNT(*) FROM participations WHERE user_id = $1",
            bob.id,
        )
        .await;
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_leader_with_members_cannot_leave_or_delete() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let bob = app.participant("Bob");
        app.register(&ada, event_id).await.unwrap();
        app.register(&bob, event_id).await.unwrap();

        let team = create_team(&app, &ada, event_id, json!({ "name": "Anchors" })).await;
        let team_id = field(&team, "id");
        join(&app, &bob, team_id).await;

        let (status, _) = app
            .call(Method::POST, &format!("/v1/teams/{team_id}/leave"), Some(&ada), None)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .call(Method::DELETE, &format!("/v1/teams/{team_id}"), Some(&ada), None)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .call(
                Method::POST,
                &format!("/v1/events/{event_id}/participation/cancel"),
                Some(&ada),
                None,
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CONFLICT);

        // Once the member leaves the leader can delete the team
        let (status, _) = app
            .call(Method::POST, &format!("/v1/teams/{team_id}/leave"), Some(&bob), None)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .call(Method::DELETE, &format!("/v1/teams/{team_id}"), Some(&ada), None)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_leader_cancel_waits_behind_team_lock() {
        let app = TestApp::new().await.unwrap();
        let admin = app.admin();
        let event = app.create_event(&admin, json!({})).await.unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let ada_participation = app.register(&ada, event_id).await.unwrap();
        let ada_participation_id = Uuid::parse_str(field(&ada_participation, "id")).unwrap();
        let team = create_team(&app, &ada, event_id, json!({ "name": "Solo Act" })).await;
        let team_id = Uuid::parse_str(field(&team, "id")).unwrap();

        // Hold the locks the way a team workflow does: team row, then the leader
        let mut tx = app.pool.begin().await.unwrap();
        assert!(lock_team_row_tx(&mut tx, team_id).await.unwrap().is_some());

        let cancel_path = format!("/v1/events/{event_id}/participation/cancel");
        let cancel = app.call(
            Method::POST,
            &cancel_path,
            Some(&ada),
            None,
        );
        let team_workflow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let leader = lock_participation_tx(&mut tx, ada_participation_id).await;
            tx.commit().await.unwrap();
            leader
        };

        let (cancelled, leader) = tokio::join!(cancel, team_workflow);

        assert!(leader.unwrap().is_some());
        let (status, json) = cancelled.unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"], "CANCELLED");
        assert_eq!(count(&app, "SELECT COUNT(*) FROM teams WHERE id = $1", team_id).await, 0);
    }

    #[tokio::test]
    #[ignore] // Requires TEST_DATABASE_URL
    #[serial]
    async fn test_joins_fit_in_a_single_connection_pool() {
        let app = TestApp::with_pool_size(1).await.unwrap();
        let admin = app.admin();
        let event = app
            .create_event(&admin, json!({ "fee": "40", "payment_mode": "team" }))
            .await
            .unwrap();
        let event_id = field(&event, "id");

        let ada = app.participant("Ada");
        let bob = app.participant("Bob");
        let cy = app.participant("Cy");
        app.register(&ada, event_id).await.unwrap();
        app.register(&bob, event_id).await.unwrap();
        app.register(&cy, event_id).await.unwrap();

        let team = create_team(&app, &ada, event_id, json!({ "name": "Narrow Pipe" })).await;
        let team_id = field(&team, "id");

        let (status, json) = join(&app, &bob, team_id).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");

        let (status, json) = request_join(&app, &cy, team_id).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let request_id = field(&json["data"], "id").to_string();
        assert_eq!(respond(&app, &ada, &request_id, true).await, StatusCode::OK);
    }
}
