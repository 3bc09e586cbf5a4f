use chrono::{DateTime, Utc};

/// Workspace invitation email. Returns `(text, html)`.
pub fn workspace_invitation(
    inviter_name: &str,
    workspace_name: &str,
    role: &str,
    accept_link: &str,
    expires_at: &DateTime<Utc>,
) -> (String, String) {
    let expires = expires_at.format("%Y-%m-%d %H:%M");

    let text = format!(
        r#"Hi,

{} has invited you to join the workspace "{}" as {}.

Accept the invitation and set your password here:

{}

This link will expire at {} UTC.

If you weren't expecting this invitation, you can safely ignore this email.

The Workhub Team
"#,
        inviter_name, workspace_name, role, accept_link, expires
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .button {{ display: inline-block; padding: 12px 24px; background-color: #4f46e5; color: white; text-decoration: none; border-radius: 4px; margin: 20px 0; }}
        .footer {{ margin-top: 30px; padding-top: 20px; border-top: 1px solid #ddd; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>You're invited to {}</h2>
        <p><strong>{}</strong> has invited you to join <strong>{}</strong> as <strong>{}</strong>.</p>
        <a href="{}" class="button">Accept Invitation</a>
        <p>Or copy and paste this link into your browser:</p>
        <p style="word-break: break-all; color: #666;">{}</p>
        <p>This link will expire at <strong>{} UTC</strong>.</p>
        <div class="footer">
            <p>If you weren't expecting this invitation, you can safely ignore this email.</p>
        </div>
    </div>
</body>
</html>"#,
        escape(workspace_name),
        escape(inviter_name),
        escape(workspace_name),
        role,
        accept_link,
        accept_link,
        expires
    );

    (text, html)
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
