//! Fixed HTML email template.
//!
//! Every outbound email uses the same shell: logo block, title, message
//! body with preserved line breaks, optional call-to-action button, and a
//! footer linking to the portal's notification settings.

/// Render the HTML body for an email notification.
pub fn render_email(
    title: &str,
    body: &str,
    action_url: Option<&str>,
    portal_base_url: &str,
) -> String {
    let title_html = escape_html(title);
    let body_html = escape_html(body).replace('\n', "<br>\n");

    let action_html = match action_url {
        Some(url) => format!(
            "<p style=\"margin:24px 0\"><a href=\"{}\" \
             style=\"background:#1a5632;color:#ffffff;padding:12px 24px;\
             border-radius:4px;text-decoration:none\">View in portal</a></p>\n",
            escape_html(url)
        ),
        None => String::new(),
    };

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <body style=\"font-family:Arial,sans-serif;color:#333333;margin:0\">\n\
         <div style=\"max-width:600px;margin:0 auto;padding:24px\">\n\
         <div style=\"padding-bottom:16px;border-bottom:2px solid #1a5632\">\n\
         <img src=\"{portal_base_url}/assets/logo.png\" alt=\"CertHub\" height=\"40\">\n\
         </div>\n\
         <h2 style=\"color:#1a5632\">{title_html}</h2>\n\
         <p>{body_html}</p>\n\
         {action_html}\
         <hr style=\"border:none;border-top:1px solid #dddddd;margin-top:32px\">\n\
         <p style=\"font-size:12px;color:#888888\">\
         You are receiving this because of your organization's membership. \
         <a href=\"{portal_base_url}/settings/notifications\">Manage notification preferences</a>\
         </p>\n\
         </div>\n\
         </body>\n\
         </html>\n"
    )
}

/// Minimal HTML escaping for interpolated text.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
