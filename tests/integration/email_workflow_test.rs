//! Notification workflow tests
//!
//! Exercise the notifications a registration sends through its lifecycle
//! against the in-memory mock, without a database.

use regdesk_email::{EmailService, MockEmailService};
use uuid::Uuid;

#[test_log::test(tokio::test)]
async fn test_registration_notification_sequence() {
    let email = MockEmailService::new();
    let participation_id = Uuid::new_v4();
    let team_id = Uuid::new_v4();

    email
        .send_payment_rejected(
            "ada@regdesk.test",
            "Ada",
            "Integration Hackathon",
            participation_id,
            "Screenshot is unreadable",
        )
        .await
        .unwrap();
    email
        .send_payment_confirmed(
            "ada@regdesk.test",
            "Ada",
            "Integration Hackathon",
            participation_id,
        )
        .await
        .unwrap();
    email
        .send_join_request_received(
            "ada@regdesk.test",
            "Night Owls",
            team_id,
            "Bob",
            Some("I write Rust"),
        )
        .await
        .unwrap();
    email
        .send_join_request_decided("bob@regdesk.test", "Bob", "Night Owls", team_id, false)
        .await
        .unwrap();

    assert_eq!(email.email_count(), 4);
    assert_eq!(email.get_emails_for_recipient("ada@regdesk.test").len(), 3);

    let rejected = email
        .latest_of_type("ada@regdesk.test", "payment_rejected")
        .unwrap();
    assert!(rejected.message.body_text.contains("Screenshot is unreadable"));
    assert!(rejected
        .message
        .body_text
        .contains(&participation_id.to_string()));

    let confirmed = email
        .latest_of_type("ada@regdesk.test", "payment_confirmed")
        .unwrap();
    assert_eq!(confirmed.message.subject, "Registration confirmed: Integration Hackathon");
    assert!(confirmed.message.body_html.is_some());

    let received = email
        .latest_of_type("ada@regdesk.test", "join_request_received")
        .unwrap();
    assert_eq!(received.team_id(), Some(team_id));
    assert!(received.message.body_text.contains("I write Rust"));

    let declined = email
        .latest_of_type("bob@regdesk.test", "join_request_rejected")
        .unwrap();
    assert!(declined.message.subject.contains("declined"));
}

#[test_log::test(tokio::test)]
async fn test_failing_delivery_surfaces_error() {
    let email = MockEmailService::new_failing();

    let result = email
        .send_payment_confirmed("ada@regdesk.test", "Ada", "Hack", Uuid::new_v4())
        .await;

    assert!(result.is_err());
    assert_eq!(email.email_count(), 0);
}
