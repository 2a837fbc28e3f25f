//! Playback session state machine, driven through a recording audio node.

mod common;

use assert_matches::assert_matches;
use common::fixtures::*;
use common::mocks::{Probe, REPORTED_POSITION, recording_node, unreachable_node};
use lavabot::commands::music::audio_sources::{SearchResult, SearchSource, Track};
use lavabot::commands::music::utils::filters::FilterPreset;
use lavabot::commands::music::utils::music_manager::MusicError;
use lavabot::commands::music::utils::session::{
    AutoplayMode, HISTORY_LIMIT, PlayOutcome, PlaybackState, Session,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

async fn joined(catalog: Vec<(String, SearchResult)>) -> (Session, Probe) {
    common::init();
    let (node, probe) = recording_node(catalog);
    let session = Session::join(Arc::new(node), guild(), Some(voice()), &music_config())
        .await
        .unwrap();
    (session, probe)
}

/// A session already playing `first`, with `rest` waiting in the queue
async fn playing(first: Track, rest: Vec<Track>) -> (Session, Probe) {
    let mut catalog = vec![found(&first.title, first.clone())];
    catalog.extend(rest.iter().map(|track| found(&track.title, track.clone())));

    let (mut session, probe) = joined(catalog).await;
    session.request_play(&first.title, home()).await.unwrap();
    for track in &rest {
        session.request_play(&track.title, home()).await.unwrap();
    }
    (session, probe)
}

fn queued_titles(session: &Session) -> Vec<String> {
    session
        .queue()
        .peek_all()
        .into_iter()
        .map(|track| track.title)
        .collect()
}

#[tokio::test]
async fn join_requires_a_voice_channel() {
    let (node, probe) = recording_node(vec![]);
    let result = Session::join(Arc::new(node), guild(), None, &music_config()).await;

    assert_matches!(result, Err(MusicError::NotInVoiceChannel));
    assert_eq!(probe.connects(), 0);
}

#[tokio::test]
async fn refused_join_is_reported() {
    let result = Session::join(
        Arc::new(unreachable_node()),
        guild(),
        Some(voice()),
        &music_config(),
    )
    .await;

    assert_matches!(result, Err(MusicError::JoinFailed(reason)) if reason.contains("refused"));
}

#[tokio::test]
async fn join_connects_with_default_volume() {
    let (session, probe) = joined(vec![]).await;

    assert_eq!(session.state(), PlaybackState::Connected);
    assert_eq!(session.volume(), 30);
    assert_eq!(probe.volumes(), vec![30]);
    assert_eq!(session.home_channel(), None);
    assert!(session.is_idle());
}

#[tokio::test]
async fn first_play_starts_immediately_and_sets_home() {
    let (mut session, probe) = joined(vec![found("lofi beats", track("Lofi"))]).await;

    let outcome = session.request_play("lofi beats", home()).await.unwrap();

    assert_eq!(outcome, PlayOutcome::Started(track("Lofi")));
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(session.current(), Some(&track("Lofi")));
    assert_eq!(session.home_channel(), Some(home()));
    assert_eq!(probe.played_titles(), vec!["Lofi"]);
    assert!(session.queue().is_empty());
}

#[tokio::test]
async fn plain_queries_search_the_default_source() {
    let (mut session, probe) = joined(vec![found("lofi beats", track("Lofi"))]).await;
    session.request_play("lofi beats", home()).await.unwrap();

    let searches = probe.searches.lock().unwrap().clone();
    assert_eq!(
        searches,
        vec![("lofi beats".to_string(), SearchSource::SoundCloud)]
    );
}

#[tokio::test]
async fn later_plays_are_queued_with_their_position() {
    let (mut session, _) = playing(track("One"), vec![]).await;

    let outcome = session.request_play("One", home()).await.unwrap();

    assert_eq!(
        outcome,
        PlayOutcome::Queued {
            track: track("One"),
            position: 1,
        }
    );
    assert_eq!(queued_titles(&session), vec!["One"]);
    assert_eq!(session.state(), PlaybackState::Playing);
}

#[tokio::test]
async fn requests_from_another_channel_are_rejected_untouched() {
    let (mut session, probe) = playing(track("One"), vec![track("Two")]).await;
    let searches_before = probe.searched().len();

    let result = session.request_play("Two", other_channel()).await;

    assert_matches!(result, Err(MusicError::WrongChannel(channel)) if channel == home());
    assert_eq!(queued_titles(&session), vec!["Two"]);
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(probe.searched().len(), searches_before);
}

#[tokio::test]
async fn empty_search_leaves_session_unchanged() {
    let (mut session, probe) = joined(vec![]).await;

    let result = session.request_play("nothing matches this", home()).await;

    assert_matches!(result, Err(MusicError::NoTracksFound));
    assert_eq!(session.state(), PlaybackState::Connected);
    assert_eq!(session.home_channel(), None);
    assert!(probe.played_titles().is_empty());
}

#[tokio::test]
async fn over_budget_request_is_rejected_and_queue_kept() {
    let catalog = vec![
        found("opener", track("Opener")),
        found("long", track_ms("Long", 5_000_000)),
        found("longer", track_ms("Longer", 3_000_000)),
    ];
    let (mut session, _) = joined(catalog).await;
    session.request_play("opener", home()).await.unwrap();
    session.request_play("long", home()).await.unwrap();

    let result = session.request_play("longer", home()).await;

    assert_matches!(
        result,
        Err(MusicError::QueueBudgetExceeded { limit }) if limit == Duration::from_millis(7_200_000)
    );
    assert_eq!(queued_titles(&session), vec!["Long"]);
    assert_eq!(
        session.queue().total_duration(),
        Duration::from_millis(5_000_000)
    );
}

#[tokio::test]
async fn playlist_is_queued_and_first_track_started() {
    let playlist = SearchResult::Playlist {
        name: "Chill Mix".to_string(),
        tracks: vec![track("A"), track("B"), track("C")],
    };
    let url = "https://soundcloud.com/someone/sets/chill-mix";
    let (mut session, probe) = joined(vec![(url.to_string(), playlist)]).await;

    let outcome = session.request_play(url, home()).await.unwrap();

    assert_eq!(
        outcome,
        PlayOutcome::PlaylistQueued {
            name: "Chill Mix".to_string(),
            count: 3,
            started: Some(track("A")),
        }
    );
    assert_eq!(queued_titles(&session), vec!["B", "C"]);
    assert_eq!(probe.played_titles(), vec!["A"]);
    assert_eq!(probe.searches.lock().unwrap()[0].1, SearchSource::Direct);
}

#[tokio::test]
async fn skip_needs_something_playing() {
    let (mut session, _) = joined(vec![]).await;
    assert_matches!(session.skip().await, Err(MusicError::NothingPlaying));
}

#[tokio::test]
async fn skip_advances_to_the_next_track() {
    let (mut session, probe) = playing(track("One"), vec![track("Two")]).await;

    let skipped = session.skip().await.unwrap();

    assert_eq!(skipped, track("One"));
    assert_eq!(session.current(), Some(&track("Two")));
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(session.history(), vec![track("One")]);
    assert_eq!(probe.played_titles(), vec!["One", "Two"]);
}

#[tokio::test]
async fn skipping_the_last_track_stops_the_player() {
    let (mut session, probe) = playing(track("Only"), vec![]).await;

    session.skip().await.unwrap();

    assert_eq!(session.state(), PlaybackState::Connected);
    assert_eq!(session.current(), None);
    assert_eq!(probe.stops(), 1);
    assert!(session.is_idle());
}

#[tokio::test]
async fn toggle_alternates_between_paused_and_playing() {
    let (mut session, probe) = playing(track("One"), vec![]).await;

    assert_eq!(
        session.toggle_pause_resume().await.unwrap(),
        PlaybackState::Paused
    );
    assert_eq!(
        session.toggle_pause_resume().await.unwrap(),
        PlaybackState::Playing
    );
    assert_eq!(probe.paused(), vec![true, false]);
}

#[tokio::test]
async fn toggle_with_nothing_playing_is_an_error() {
    let (mut session, probe) = joined(vec![]).await;

    assert_matches!(
        session.toggle_pause_resume().await,
        Err(MusicError::NothingPlaying)
    );
    assert!(probe.paused().is_empty());
}

#[tokio::test]
async fn skipping_while_paused_with_empty_queue_unpauses() {
    let (mut session, probe) = playing(track("One"), vec![]).await;
    session.toggle_pause_resume().await.unwrap();

    session.skip().await.unwrap();

    assert_eq!(session.state(), PlaybackState::Connected);
    assert_eq!(probe.paused(), vec![true, false]);
}

#[rstest]
#[case(0)]
#[case(55)]
#[case(100)]
#[tokio::test]
async fn volume_within_range_is_applied(#[case] volume: i64) {
    let (mut session, probe) = joined(vec![]).await;

    assert_eq!(session.set_volume(volume).await.unwrap(), volume as u16);
    assert_eq!(session.volume(), volume as u16);
    assert_eq!(probe.volumes(), vec![30, volume as u16]);
}

#[rstest]
#[case(-1)]
#[case(101)]
#[case(i64::MAX)]
#[tokio::test]
async fn volume_out_of_range_is_rejected(#[case] volume: i64) {
    let (mut session, probe) = joined(vec![]).await;

    assert_matches!(
        session.set_volume(volume).await,
        Err(MusicError::InvalidVolume(rejected)) if rejected == volume
    );
    assert_eq!(session.volume(), 30);
    assert_eq!(probe.volumes(), vec![30]);
}

#[tokio::test]
async fn filters_are_applied_and_reset_reports_normal() {
    let (mut session, probe) = joined(vec![]).await;

    assert_eq!(
        session.set_filter(FilterPreset::Nightcore).await.unwrap(),
        FilterPreset::Nightcore
    );
    assert_eq!(session.filter(), FilterPreset::Nightcore);
    assert_eq!(
        session.set_filter(FilterPreset::Reset).await.unwrap(),
        FilterPreset::Normal
    );
    assert_eq!(
        probe.filters(),
        vec![FilterPreset::Nightcore, FilterPreset::Reset]
    );
}

#[tokio::test]
async fn seek_is_bounded_by_the_track_length() {
    let (mut session, probe) = playing(track("One"), vec![]).await;

    assert_matches!(
        session.seek(Duration::from_secs(181)).await,
        Err(MusicError::SeekOutOfRange { requested, length })
            if requested == Duration::from_secs(181) && length == Duration::from_secs(180)
    );
    assert_eq!(session.seek(Duration::from_secs(90)).await.unwrap(), track("One"));
    assert_eq!(probe.seeks(), vec![Duration::from_secs(90)]);
}

#[tokio::test]
async fn seek_and_position_need_a_playing_track() {
    let (mut session, _) = joined(vec![]).await;

    assert_matches!(
        session.seek(Duration::ZERO).await,
        Err(MusicError::NothingPlaying)
    );
    assert_matches!(session.position().await, Err(MusicError::NothingPlaying));
}

#[tokio::test]
async fn position_comes_from_the_node() {
    let (session, _) = playing(track("One"), vec![]).await;
    assert_eq!(session.position().await.unwrap(), REPORTED_POSITION);
}

#[tokio::test]
async fn natural_end_advances_the_queue() {
    let (mut session, probe) = playing(track("One"), vec![track("Two")]).await;

    session.on_track_ended(track("One"), true).await.unwrap();

    assert_eq!(session.current(), Some(&track("Two")));
    assert_eq!(probe.played_titles(), vec!["One", "Two"]);

    session.on_track_ended(track("Two"), true).await.unwrap();

    assert_eq!(session.state(), PlaybackState::Connected);
    assert_eq!(session.history(), vec![track("One"), track("Two")]);
}

#[tokio::test]
async fn replaced_or_stale_track_end_changes_nothing() {
    let (mut session, probe) = playing(track("One"), vec![track("Two")]).await;

    session.on_track_ended(track("One"), false).await.unwrap();
    session.on_track_ended(track("Elsewhere"), true).await.unwrap();

    assert_eq!(session.current(), Some(&track("One")));
    assert_eq!(queued_titles(&session), vec!["Two"]);
    assert_eq!(probe.played_titles(), vec!["One"]);
}

#[tokio::test]
async fn autoplay_disabled_stops_after_each_track() {
    let (mut session, probe) = playing(track("One"), vec![track("Two")]).await;
    session.set_autoplay(AutoplayMode::Disabled).unwrap();

    session.on_track_ended(track("One"), true).await.unwrap();

    assert_eq!(session.state(), PlaybackState::Connected);
    assert_eq!(session.current(), None);
    assert_eq!(queued_titles(&session), vec!["Two"]);
    assert_eq!(probe.played_titles(), vec!["One"]);
}

#[tokio::test]
async fn autoplay_enabled_recommends_an_unplayed_track_by_the_same_artist() {
    let first = by("Nujabes", "Aruarian Dance");
    let earlier = by("Nujabes", "Feather");
    let fresh = by("Nujabes", "Luv(sic)");
    let catalog = vec![
        found("Feather", earlier.clone()),
        found("Aruarian Dance", first.clone()),
        (
            "Nujabes".to_string(),
            SearchResult::Search(vec![first.clone(), earlier.clone(), fresh.clone()]),
        ),
    ];
    let (mut session, probe) = joined(catalog).await;
    session.request_play("Feather", home()).await.unwrap();
    session.request_play("Aruarian Dance", home()).await.unwrap();
    session.on_track_ended(earlier.clone(), true).await.unwrap();
    session.set_autoplay(AutoplayMode::Enabled).unwrap();

    session.on_track_ended(first.clone(), true).await.unwrap();

    assert_eq!(session.current(), Some(&fresh));
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(
        probe.played_titles(),
        vec!["Feather", "Aruarian Dance", "Luv(sic)"]
    );
}

#[tokio::test]
async fn autoplay_enabled_without_recommendation_goes_quiet() {
    let (mut session, _) = playing(track("One"), vec![]).await;
    session.set_autoplay(AutoplayMode::Enabled).unwrap();

    session.on_track_ended(track("One"), true).await.unwrap();

    assert_eq!(session.state(), PlaybackState::Connected);
    assert!(session.is_idle());
}

#[tokio::test]
async fn history_keeps_only_the_most_recent_tracks() {
    let titles: Vec<String> = (1..=11).map(|n| format!("T{}", n)).collect();
    let tracks: Vec<Track> = titles.iter().map(|title| track(title)).collect();
    let (mut session, _) = playing(tracks[0].clone(), tracks[1..].to_vec()).await;

    for finished in &tracks {
        session.on_track_ended(finished.clone(), true).await.unwrap();
    }

    let history: Vec<String> = session.history().into_iter().map(|t| t.title).collect();
    assert_eq!(history.len(), HISTORY_LIMIT);
    assert_eq!(history, titles[1..].to_vec());
}

#[tokio::test]
async fn track_start_events_confirm_the_current_track() {
    let (mut session, _) = playing(track("One"), vec![track("Two")]).await;

    assert_eq!(session.on_track_started(track("One")), Some(track("One")));
    // A start for something already replaced is stale
    assert_eq!(session.on_track_started(track("Zero")), None);
    assert_eq!(session.current(), Some(&track("One")));
}

#[tokio::test]
async fn late_start_after_skipping_the_last_track_is_ignored() {
    let catalog = vec![found("one", track("One")), found("two", track("Two"))];
    let (mut session, probe) = joined(catalog).await;
    session.request_play("one", home()).await.unwrap();
    session.skip().await.unwrap();

    // The node reports the start and the stop of the skipped track afterwards
    assert_eq!(session.on_track_started(track("One")), None);
    session.on_track_ended(track("One"), false).await.unwrap();

    assert_eq!(session.state(), PlaybackState::Connected);
    assert_eq!(session.current(), None);
    assert!(session.is_idle());
    assert_eq!(session.history(), vec![track("One")]);

    let outcome = session.request_play("two", home()).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Started(track("Two")));
    assert_eq!(probe.played_titles(), vec!["One", "Two"]);
}

#[tokio::test]
async fn disconnect_tears_everything_down() {
    let (mut session, probe) = playing(track("One"), vec![track("Two")]).await;

    session.disconnect().await.unwrap();

    assert_eq!(session.state(), PlaybackState::Idle);
    assert_eq!(session.current(), None);
    assert!(session.queue().is_empty());
    assert!(session.history().is_empty());
    assert_eq!(session.home_channel(), None);
    assert_eq!(probe.disconnects(), 1);
}

#[tokio::test]
async fn late_events_after_disconnect_are_ignored() {
    let (mut session, probe) = playing(track("One"), vec![track("Two")]).await;
    session.disconnect().await.unwrap();

    assert_eq!(session.on_track_started(track("Two")), None);
    session.on_track_ended(track("One"), true).await.unwrap();

    assert_eq!(session.state(), PlaybackState::Idle);
    assert_eq!(session.current(), None);
    assert_eq!(probe.played_titles(), vec!["One"]);
    assert_matches!(
        session.request_play("Two", home()).await,
        Err(MusicError::NoActiveSession)
    );
    assert_matches!(session.disconnect().await, Err(MusicError::NoActiveSession));
    assert_eq!(probe.disconnects(), 1);
}

#[tokio::test]
async fn inactivity_plays_filler_only_when_idle() {
    let (mut session, probe) = joined(vec![]).await;
    let rain = track("Rain");

    assert!(session.on_inactivity_elapsed(rain.clone()).await.unwrap());
    assert_eq!(session.state(), PlaybackState::Connected);
    assert_eq!(session.filler(), Some(&rain));
    assert!(!session.is_idle());

    // Filler already running
    assert!(!session.on_inactivity_elapsed(rain.clone()).await.unwrap());
    assert_eq!(probe.played_titles(), vec!["Rain"]);
}

#[tokio::test]
async fn inactivity_while_playing_does_nothing() {
    let (mut session, probe) = playing(track("One"), vec![]).await;

    assert!(!session.on_inactivity_elapsed(track("Rain")).await.unwrap());
    assert_eq!(probe.played_titles(), vec!["One"]);
    assert_eq!(session.filler(), None);
}

#[tokio::test]
async fn filler_is_refused_while_music_plays() {
    let (mut session, _) = playing(track("One"), vec![]).await;
    assert_matches!(
        session.play_filler(track("Ding")).await,
        Err(MusicError::PlayerBusy)
    );
}

#[tokio::test]
async fn filler_stays_out_of_history_and_state() {
    let (mut session, probe) = joined(vec![found("song", track("Song"))]).await;
    session.play_filler(track("Ding")).await.unwrap();

    assert_eq!(session.on_track_started(track("Ding")), None);
    assert_eq!(session.state(), PlaybackState::Connected);

    session.on_track_ended(track("Ding"), true).await.unwrap();

    assert_eq!(session.filler(), None);
    assert!(session.history().is_empty());
    assert!(session.is_idle());
    assert_eq!(probe.played_titles(), vec!["Ding"]);
}

#[tokio::test]
async fn play_request_replaces_a_running_filler() {
    let (mut session, probe) = joined(vec![found("song", track("Song"))]).await;
    session.play_filler(track("Ding")).await.unwrap();

    let outcome = session.request_play("song", home()).await.unwrap();

    assert_eq!(outcome, PlayOutcome::Started(track("Song")));
    assert_eq!(session.filler(), None);
    assert_eq!(probe.played_titles(), vec!["Ding", "Song"]);

    // The replaced filler reporting its end must not disturb the song
    session.on_track_ended(track("Ding"), false).await.unwrap();
    assert_eq!(session.current(), Some(&track("Song")));
    assert!(session.history().is_empty());
}
