mod support;

use openvision_assist::domain::relay::{GeoPosition, RelayEvent};
use openvision_assist::domain::settings::Settings;
use openvision_assist::domain::stream::DisplayEvent;
use support::{harness, settle};

fn madrid() -> Option<GeoPosition> {
    Some(GeoPosition::new(40.416775, -3.70379))
}

#[tokio::test]
async fn toggle_boxes_by_voice_hides_the_overlay() {
    let h = harness(Vec::new(), None);
    h.assistant.toggle_voice_commands();

    assert_eq!(h.assistant.handle_command("  Please TOGGLE boxes ").as_deref(), Some("toggle boxes"));

    assert!(!h.assistant.status().await.show_boxes);
    assert!(h.display.events().contains(&DisplayEvent::ClearBoxes));
    assert_eq!(h.engine.last().as_deref(), Some("Bounding boxes hidden"));
    assert_eq!(h.display.vibrations(), vec![vec![50], vec![50]]);
}

#[tokio::test]
async fn unknown_phrases_do_nothing() {
    let h = harness(Vec::new(), None);
    h.assistant.toggle_voice_commands();
    assert_eq!(h.assistant.handle_command("what time is it"), None);
    assert_eq!(h.engine.texts(), vec!["Voice commands activated".to_string()]);
}

#[tokio::test]
async fn voice_commands_are_ignored_until_activated() {
    let h = harness(Vec::new(), None);
    assert!(!h.assistant.status().await.listening);
    assert_eq!(h.assistant.handle_command("battery"), None);
    assert!(h.engine.texts().is_empty());

    assert!(h.assistant.toggle_voice_commands());
    assert_eq!(h.engine.last().as_deref(), Some("Voice commands activated"));
    assert!(h.assistant.status().await.listening);
    assert_eq!(h.assistant.handle_command("battery").as_deref(), Some("battery"));

    assert!(!h.assistant.toggle_voice_commands());
    assert_eq!(h.engine.last().as_deref(), Some("Voice commands deactivated"));
    assert_eq!(h.assistant.handle_command("battery"), None);
    assert_eq!(h.display.vibrations().len(), 3);
}

#[tokio::test]
async fn high_contrast_is_persisted_and_pushed_to_the_display() {
    let h = harness(Vec::new(), None);

    assert!(h.assistant.toggle_high_contrast());

    assert!(h.store.saved.lock().unwrap().as_ref().unwrap().high_contrast);
    assert_eq!(
        h.display.events().last(),
        Some(&DisplayEvent::Theme { high_contrast: true })
    );
    assert_eq!(h.engine.last().as_deref(), Some("High contrast mode enabled"));
}

#[tokio::test]
async fn saved_settings_reach_every_service() {
    let h = harness(Vec::new(), None);
    let mut settings = Settings::default();
    settings.haptic_feedback = false;
    settings.detection_threshold = 5.0;
    settings.speech.language = "es-ES".into();

    assert!(h.assistant.save_settings(settings.clone()));

    assert_eq!(h.store.saved.lock().unwrap().as_ref(), Some(&settings));
    assert_eq!(h.assistant.speech().settings().language, "es-ES");
    let spoken = h.engine.spoken.lock().unwrap().last().cloned().unwrap();
    assert_eq!(spoken.text, "Settings saved");
    assert_eq!(spoken.language, "es-ES");

    let before = h.display.vibrations().len();
    h.assistant.toggle_speech();
    assert_eq!(h.display.vibrations().len(), before);
}

#[tokio::test]
async fn battery_command_reports_the_level() {
    let h = harness(Vec::new(), None);
    h.assistant.toggle_voice_commands();
    h.assistant.handle_command("battery");
    assert_eq!(h.engine.last().as_deref(), Some("Battery at 55% and charging"));
}

#[tokio::test]
async fn location_command_speaks_the_coordinates() {
    let h = harness(Vec::new(), madrid());
    h.assistant.toggle_voice_commands();

    h.assistant.handle_command("where is my location");
    settle().await;

    assert_eq!(
        h.engine.last().as_deref(),
        Some("Your current location is 40.416775, -3.703790")
    );
}

#[tokio::test]
async fn emergency_share_publishes_location_then_alert() {
    let h = harness(Vec::new(), madrid());

    h.assistant.emergency();
    assert!(h.assistant.status().await.emergency_active);
    assert_eq!(h.engine.last().as_deref(), Some("Emergency assistance activated"));

    let message = h.assistant.share_emergency_location().await;
    assert_eq!(message, "Location shared successfully");

    let events = h.relay.events.lock().unwrap().clone();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], RelayEvent::LocationUpdate { .. }));
    assert!(matches!(events[1], RelayEvent::EmergencyAlert { .. }));
}

#[tokio::test]
async fn location_follows_the_user_after_tracking_starts() {
    let h = harness(Vec::new(), madrid());
    assert_eq!(
        h.assistant.location_status().await,
        "Your current location is 40.416775, -3.703790"
    );

    h.gps.move_to(Some(GeoPosition::new(41.385064, 2.173404)));
    assert_eq!(h.assistant.status().await.location, "41.385064, 2.173404");
    assert_eq!(
        h.assistant.location_status().await,
        "Your current location is 41.385064, 2.173404"
    );

    h.gps.move_to(Some(GeoPosition::new(39.469907, -0.376288)));
    h.assistant.share_emergency_location().await;

    let events = h.relay.events.lock().unwrap().clone();
    assert!(matches!(events[0], RelayEvent::LocationUpdate { latitude, .. } if latitude == 39.469907));
    assert!(matches!(&events[1], RelayEvent::EmergencyAlert { location, .. } if location.latitude == 39.469907));
}

#[tokio::test]
async fn emergency_without_position_sends_nothing() {
    let h = harness(Vec::new(), None);

    let message = h.assistant.share_emergency_location().await;

    assert_eq!(message, "Location unavailable");
    assert!(h.relay.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn calling_a_contact_returns_its_tel_uri() {
    let h = harness(Vec::new(), None);

    assert_eq!(h.assistant.call_contact(0).unwrap(), "tel:911");
    assert_eq!(h.engine.last().as_deref(), Some("Calling Emergency Services"));
    assert!(h.assistant.call_contact(5).is_err());
}
