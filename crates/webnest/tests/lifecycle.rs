//! Lifecycle contract, exercised through the public surface only.

#![cfg(not(any(windows, target_os = "android")))]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use webnest::{
    BackendKind, Config, Engine, Error, LifecycleState, Size, SizeHint, Visibility, WebView,
};

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_full_lifecycle_walk() {
    let view = Arc::new(
        WebView::new(Config {
            title: "Walk".into(),
            url: "https://example.com/".into(),
            ..Config::default()
        })
        .unwrap(),
    );
    assert_eq!(view.state(), LifecycleState::Created);
    assert_eq!(view.backend_kind(), BackendKind::Headless);
    assert!(view.window() != 0);

    let runner = {
        let view = Arc::clone(&view);
        thread::spawn(move || view.run().unwrap())
    };
    {
        let view = Arc::clone(&view);
        wait_until(move || view.state() == LifecycleState::Running);
    }

    let sleeper = {
        let view = Arc::clone(&view);
        thread::spawn(move || view.hibernate().unwrap())
    };
    {
        let view = Arc::clone(&view);
        wait_until(move || view.state() == LifecycleState::Hibernated);
    }

    let second_runner = {
        let view = Arc::clone(&view);
        thread::spawn(move || view.run().unwrap())
    };
    {
        let view = Arc::clone(&view);
        wait_until(move || view.state() == LifecycleState::Running);
    }

    view.destroy().unwrap();
    runner.join().unwrap();
    sleeper.join().unwrap();
    second_runner.join().unwrap();
    assert_eq!(view.state(), LifecycleState::Destroyed);
    assert_eq!(view.window(), 0);
}

#[test]
fn test_drop_without_destroy_tears_down() {
    let view = WebView::new(Config {
        title: "Dropped".into(),
        ..Config::default()
    })
    .unwrap();
    // Drop runs the same teardown destroy would.
    drop(view);
}

#[test]
fn test_post_destroy_surface_is_silent() {
    let view = WebView::new(Config::default()).unwrap();
    view.destroy().unwrap();

    view.set_title("late").unwrap();
    view.set_url("https://late.example/").unwrap();
    view.set_size(Size::new(320, 240), SizeHint::Fixed).unwrap();
    view.set_visibility(Visibility::Minimized).unwrap();
    view.terminate().unwrap();
    view.hibernate().unwrap();
    view.run().unwrap();
    view.destroy().unwrap();
    assert_eq!(view.state(), LifecycleState::Destroyed);
}

#[test]
fn test_platform_without_engine_refuses_explicit_engines() {
    for engine in [Engine::Chromium, Engine::Legacy] {
        match WebView::new(Config {
            engine,
            ..Config::default()
        }) {
            Err(Error::Unsupported(name)) => assert_eq!(name, engine.as_str()),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("construction should have been refused"),
        }
    }
}

#[test]
fn test_defaults_resolve_before_construction() {
    let view = WebView::new(Config::default()).unwrap();
    let config = view.config();
    assert!(!config.title.is_empty());
    assert_eq!(config.size, Size::new(600, 600));
    assert!(config.storage_path.ends_with(&config.title));
    assert_eq!(config.engine, Engine::Auto);
    view.destroy().unwrap();
}
