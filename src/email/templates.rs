pub fn render_password_reset(reset_url: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Reset your password</h2>
    <p>A password reset was requested for your CareerPath account.</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #2563eb; color: white; text-decoration: none; border-radius: 4px;">Choose a new password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in {ttl_minutes} minutes and can be used once. If you didn't request this, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_password_reset_text(reset_url: &str, ttl_minutes: i64) -> String {
    format!(
        "A password reset was requested for your CareerPath account.\n\n\
         Choose a new password: {reset_url}\n\n\
         This link expires in {ttl_minutes} minutes and can be used once. \
         If you didn't request this, you can ignore it.\n"
    )
}
