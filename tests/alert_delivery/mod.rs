mod admin_alerts;
mod recipient_preferences;
