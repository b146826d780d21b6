//! Integration tests for loading routine documents from disk.

use std::io::Write;

use stretchroom_core::{
    load_routine, CoreError, CueSequencer, MediaType, PlaybackEngine, ValidationError,
};

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn loads_toml_routine_and_plays_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "evening.toml",
        r##"
name = "Evening"
color = "#E67E22"

[[stretches]]
name = "Hamstring"
duration_seconds = 45
order = 2

[[stretches]]
name = "Neck roll"
duration_seconds = 20
order = 1
media_url = "https://example.com/neck.mp4"
media_type = "video"
"##,
    );

    let routine = load_routine(&path).unwrap();
    assert_eq!(routine.color, "#E67E22");
    assert_eq!(routine.total_seconds(), 65);
    assert!(routine.stretches.iter().all(|s| !s.id.is_empty()));
    assert_eq!(routine.stretches[1].media_type, Some(MediaType::Video));

    let mut engine = PlaybackEngine::new(&routine.stretches, CueSequencer::silent());
    engine.play(false);
    assert_eq!(engine.current_stretch().unwrap().name, "Neck roll");
    assert_eq!(engine.seconds_remaining(), 20);
}

#[test]
fn loads_exported_json_routine() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "morning.json",
        r##"{
            "id": "r-1",
            "name": "Morning",
            "color": "#4A90D9",
            "order": 0,
            "stretches": [
                {"id": "a", "name": "Side bend", "durationSeconds": 30, "mediaUrl": null,
                 "mediaType": null, "switchSides": true, "order": 0}
            ]
        }"##,
    );

    let routine = load_routine(&path).unwrap();
    assert_eq!(routine.id, "r-1");
    assert!(routine.stretches[0].switch_sides);
    assert_eq!(routine.stretches[0].id, "a");
}

#[test]
fn rejects_invalid_routines() {
    let dir = tempfile::tempdir().unwrap();
    let zero = write_file(
        &dir,
        "zero.json",
        r#"{"name": "Bad", "stretches": [{"name": "Calf", "duration_seconds": 0}]}"#,
    );
    assert!(matches!(
        load_routine(&zero),
        Err(CoreError::Validation(ValidationError::InvalidValue { .. }))
    ));

    let yaml = write_file(&dir, "routine.yaml", "name: nope");
    assert!(matches!(
        load_routine(&yaml),
        Err(CoreError::Validation(ValidationError::UnsupportedFormat(_)))
    ));

    let broken = write_file(&dir, "broken.json", "{");
    assert!(matches!(load_routine(&broken), Err(CoreError::Json(_))));

    assert!(matches!(
        load_routine(&dir.path().join("missing.toml")),
        Err(CoreError::Io(_))
    ));
}
