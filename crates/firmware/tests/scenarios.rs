//! End-to-end playback scenarios over mock drivers.
// Integration test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

mod common;

use common::{Player, Storage, World};
use firmware::{PlayerConfig, SystemOutbox, SystemState};
use platform::mocks::{DisplayEvent, MockStream};
use platform::KeyCode;

const ALBUM: [&str; 3] = ["a.flac", "b.flac", "c.flac"];

fn short_stream() -> MockStream {
    MockStream::stereo(44_100, 3)
}

#[test]
fn media_is_scanned_on_attach() {
    let world = World::new(&ALBUM, short_stream());
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let mut player = Player::new(&world, &outbox, &mut storage, &PlayerConfig::default());

    assert_eq!(player.state(), SystemState::WaitingForMedia);
    player.settle();
    assert_eq!(player.state(), SystemState::Stopped);
    assert_eq!(player.system.catalog().track_count(), 3);
    assert_eq!(world.display.printed(), ["USB connection was detected."]);
}

#[test]
fn track_end_advances_to_the_next_track() {
    let world = World::new(&ALBUM, short_stream());
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let config = PlayerConfig::default().with_repeat(false);
    let mut player = Player::new(&world, &outbox, &mut storage, &config);
    player.settle();

    player.press(KeyCode::PlayPause);
    assert!(player.run_until(|p| world.opened().len() == 2 && p.state() == SystemState::Playing));
    assert_eq!(world.opened(), ["a.flac", "b.flac"]);
    assert_eq!(player.system.cursor().track(), 1);
    assert_eq!(world.codec.log().closes, 1);
    assert!(world.dac.log().writes > 0);
    assert!(world.showed_playing(1));
    assert!(world.showed_playing(2));
}

#[test]
fn album_end_without_repeat_stops_on_the_first_track() {
    let world = World::new(&ALBUM, short_stream());
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let config = PlayerConfig::default().with_repeat(false);
    let mut player = Player::new(&world, &outbox, &mut storage, &config);
    player.settle();

    player.press(KeyCode::PlayPause);
    player.settle();

    assert_eq!(player.state(), SystemState::Stopped);
    assert_eq!(world.opened(), ALBUM);
    assert_eq!(player.system.cursor().track(), 0);
    assert_eq!(player.system.open_track(), None);
    assert!(!world.codec.is_open());
    assert_eq!(world.volume.open_handles(), 0);
}

#[test]
fn repeat_reopens_a_single_track() {
    let world = World::new(&["only.flac"], short_stream());
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let config = PlayerConfig::default().with_repeat(true);
    let mut player = Player::new(&world, &outbox, &mut storage, &config);
    player.settle();

    player.press(KeyCode::PlayPause);
    assert!(player.run_until(|p| world.opened().len() == 2 && p.state() == SystemState::Playing));
    assert_eq!(world.opened(), ["only.flac", "only.flac"]);
    assert_eq!(player.system.cursor().track(), 0);
    // The first handle went back to the volume before the second was opened.
    assert_eq!(world.volume.open_handles(), 1);
}

#[test]
fn stop_before_the_open_answer_plays_nothing() {
    let world = World::new(&ALBUM, short_stream());
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let mut player = Player::new(&world, &outbox, &mut storage, &PlayerConfig::default());
    player.settle();

    player.press(KeyCode::PlayPause);
    player.press(KeyCode::Stop);
    player.settle();

    assert_eq!(player.state(), SystemState::Stopped);
    assert_eq!(world.opened(), ["a.flac"]);
    assert_eq!(world.codec.log().closes, 1);
    assert!(!world.codec.is_open());
    assert_eq!(world.volume.open_handles(), 0);
    assert_eq!(world.dac.log().writes, 0);
    assert_eq!(world.converter.log().writes, 0);
    assert!(!world.showed_playing(1));
}

#[test]
fn stale_open_is_closed_and_the_selected_track_plays() {
    let world = World::new(&ALBUM, short_stream());
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let config = PlayerConfig::default().with_repeat(false);
    let mut player = Player::new(&world, &outbox, &mut storage, &config);
    player.settle();

    player.press(KeyCode::PlayPause);
    player.press(KeyCode::Next);
    player.press(KeyCode::Next);
    assert!(player.run_until(|p| p.state() == SystemState::Playing));

    assert_eq!(world.opened(), ["a.flac", "c.flac"]);
    assert_eq!(player.system.open_track(), Some(2));
    assert!(!world.showed_playing(1));
    assert!(!world
        .display
        .events()
        .iter()
        .any(|e| matches!(e, DisplayEvent::PlayInfo { track_no: 1, .. })));
    // The stale handle is gone; only the playing track's remains.
    assert_eq!(world.volume.open_handles(), 1);
}

#[test]
fn next_while_playing_switches_tracks() {
    let world = World::new(&ALBUM, MockStream::stereo(48_000, 40));
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let mut player = Player::new(&world, &outbox, &mut storage, &PlayerConfig::default());
    player.settle();

    player.press(KeyCode::PlayPause);
    assert!(player.run_until(|_| world.dac.log().writes >= 4));
    assert_eq!(player.state(), SystemState::Playing);

    player.press(KeyCode::Next);
    assert!(player.run_until(|p| world.opened().len() == 2 && p.state() == SystemState::Playing));
    assert_eq!(world.opened(), ["a.flac", "b.flac"]);
    assert_eq!(world.volume.open_handles(), 1);
}

#[test]
fn unreadable_track_is_skipped_on_the_next_press() {
    let world = World::new(&ALBUM, short_stream());
    world.volume.make_unreadable("a.flac");
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let mut player = Player::new(&world, &outbox, &mut storage, &PlayerConfig::default());
    player.settle();

    player.press(KeyCode::PlayPause);
    player.settle();
    assert_eq!(player.state(), SystemState::Stopped);
    assert!(world.display.printed().iter().any(|s| s == "Could not play this file."));
    assert_eq!(player.system.cursor().track(), 1);

    player.press(KeyCode::PlayPause);
    assert!(player.run_until(|p| p.state() == SystemState::Playing));
    assert_eq!(world.opened(), ["b.flac"]);
}

#[test]
fn unplugging_while_playing_waits_for_media() {
    let world = World::new(&ALBUM, MockStream::stereo(48_000, 40));
    let outbox = SystemOutbox::new(&world.system_mail);
    let mut storage = Storage::new();
    let mut player = Player::new(&world, &outbox, &mut storage, &PlayerConfig::default());
    player.settle();

    player.press(KeyCode::PlayPause);
    assert!(player.run_until(|_| world.dac.log().writes >= 2));

    world.volume.set_present(false);
    assert!(player.run_until(|p| p.state() == SystemState::WaitingForMedia));
    player.settle();
    assert!(!world.codec.is_open());
    assert_eq!(world.volume.open_handles(), 0);

    world.volume.set_present(true);
    player.settle();
    assert_eq!(player.state(), SystemState::Stopped);
}
