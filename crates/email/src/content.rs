//! Shared email content
//!
//! Body generators for every notification, used by both the SES and mock
//! services through the `EmailService` default methods.

pub fn payment_confirmed_text(recipient_name: &str, event_name: &str, link: &str) -> String {
    format!(
        "Hi {},\n\n\
        Your payment for {} has been verified and your registration is confirmed.\n\n\
        You can review your registration here:\n\
        {}\n\n\
        See you at the event!\n\
        The Regdesk Team",
        recipient_name, event_name, link
    )
}

pub fn payment_confirmed_html(recipient_name: &str, event_name: &str, link: &str) -> String {
    format!(
        r#"
            <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #1a7f37;">Registration confirmed</h2>

                    <p>Hi {recipient_name},</p>

                    <p>Your payment for <strong>{event_name}</strong> has been verified and your registration is confirmed.</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{link}"
                           style="background-color: #1a7f37; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block; font-weight: bold;">
                            View Registration
                        </a>
                    </div>

                    <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">

                    <p style="color: #666; font-size: 12px;">See you at the event! The Regdesk Team</p>
                </div>
            </body>
            </html>
            "#,
        recipient_name = recipient_name,
        event_name = event_name,
        link = link
    )
}

pub fn payment_rejected_text(
    recipient_name: &str,
    event_name: &str,
    reason: &str,
    link: &str,
) -> String {
    format!(
        "Hi {},\n\n\
        We could not verify your payment for {}.\n\n\
        Reason: {}\n\n\
        Please submit a new payment proof here:\n\
        {}\n\n\
        Thanks,\n\
        The Regdesk Team",
        recipient_name, event_name, reason, link
    )
}

pub fn join_request_received_text(
    team_name: &str,
    requester_name: &str,
    request_message: Option<&str>,
    link: &str,
) -> String {
    let note = match request_message {
        Some(m) if !m.trim().is_empty() => format!("Their message:\n\"{}\"\n\n", m.trim()),
        _ => String::new(),
    };

    format!(
        "Hi there!\n\n\
        {} has asked to join your team '{}'.\n\n\
        {}\
        Review pending requests here:\n\
        {}\n\n\
        Thanks,\n\
        The Regdesk Team",
        requester_name, team_name, note, link
    )
}

pub fn join_request_decided_text(requester_name: &str, team_name: &str, approved: bool) -> String {
    let outcome = if approved {
        format!("Good news! You are now a member of '{}'.", team_name)
    } else {
        format!(
            "Your request to join '{}' was declined. Contact the team leader if you think this is a mistake.",
            team_name
        )
    };

    format!(
        "Hi {},\n\n\
        {}\n\n\
        Thanks,\n\
        The Regdesk Team",
        requester_name, outcome
    )
}
