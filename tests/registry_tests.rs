//! Integration tests for the streamer registry and the backend contract

mod mocks;

use mocks::MockBackend;
use simcast::{Frame, StreamSpec, StreamerBackend, StreamerManager, StreamingConfig};

#[test]
fn test_fan_out_to_multiple_backends_per_camera() {
    let (a, a_state) = MockBackend::new();
    let (b, b_state) = MockBackend::new();

    let mut manager = StreamerManager::new();
    manager.register("cam0", Box::new(a));
    manager.register("cam0", Box::new(b));

    manager.initialize_camera("cam0", 320, 240, 30);
    assert_eq!(manager.initialized_count("cam0"), 2);

    let frame = Frame::black("cam0", 320, 240);
    manager.send_frame("cam0", &frame);

    assert_eq!(a_state.lock().frame_lens, vec![320 * 240 * 3]);
    assert_eq!(b_state.lock().frame_lens, vec![320 * 240 * 3]);
}

#[test]
fn test_failed_initialize_leaves_backend_inactive() {
    let (failing, failing_state) = MockBackend::failing();
    let (healthy, healthy_state) = MockBackend::new();

    let mut manager = StreamerManager::new();
    manager.register("cam0", Box::new(failing));
    manager.register("cam0", Box::new(healthy));

    // A failed backend never aborts initialization of its siblings.
    manager.initialize_camera("cam0", 640, 480, 25);
    assert_eq!(manager.initialized_count("cam0"), 1);
    assert_eq!(failing_state.lock().init_calls, 1);
    assert_eq!(healthy_state.lock().geometry, Some((640, 480, 25)));

    // Frames only reach the initialized backend.
    let frame = Frame::black("cam0", 640, 480);
    manager.send_frame("cam0", &frame);
    assert!(failing_state.lock().frame_lens.is_empty());
    assert_eq!(healthy_state.lock().frame_lens.len(), 1);
}

#[test]
fn test_send_frame_before_initialize_is_noop() {
    let (backend, state) = MockBackend::new();
    let mut backend: Box<dyn StreamerBackend> = Box::new(backend);

    let frame = Frame::black("cam0", 64, 64);
    backend.send_frame(&frame);
    assert!(state.lock().frame_lens.is_empty());

    // Same after stop
    backend.initialize(64, 64, 30).unwrap();
    backend.stop();
    backend.send_frame(&frame);
    assert!(state.lock().frame_lens.is_empty());
}

#[test]
fn test_double_stop_is_idempotent() {
    let (backend, state) = MockBackend::new();
    let mut manager = StreamerManager::new();
    manager.register("cam0", Box::new(backend));
    manager.initialize_camera("cam0", 64, 64, 30);

    manager.stop();
    assert!(manager.is_empty());
    assert_eq!(state.lock().stop_calls, 1);
    assert!(!state.lock().initialized);

    // Registry stop is idempotent; backends are gone after the first call.
    manager.stop();
    assert!(manager.is_empty());
    assert_eq!(state.lock().stop_calls, 1);
}

#[test]
fn test_send_frame_for_unregistered_camera_is_noop() {
    let (backend, state) = MockBackend::new();
    let mut manager = StreamerManager::new();
    manager.register("cam0", Box::new(backend));
    manager.initialize_camera("cam0", 64, 64, 30);

    let frame = Frame::black("other", 64, 64);
    manager.send_frame("other", &frame);
    assert!(state.lock().frame_lens.is_empty());
}

#[test]
fn test_unknown_backend_kind_skipped_but_valid_entries_built() {
    let mut bogus = StreamSpec::for_camera("cam0");
    bogus.backend = "rtmp_v9".to_string();

    let config = StreamingConfig {
        enabled: true,
        streams: vec![bogus, StreamSpec::for_camera("cam1")],
    };
    let manager = StreamerManager::from_config(&config);

    assert_eq!(manager.get_cameras(), vec!["cam1".to_string()]);
    assert_eq!(manager.backend_count(), 1);
}

#[test]
fn test_every_accepted_frame_has_exact_byte_length() {
    let (backend, state) = MockBackend::new();
    let mut manager = StreamerManager::new();
    manager.register("cam0", Box::new(backend));
    manager.initialize_camera("cam0", 320, 240, 30);

    for _ in 0..5 {
        let frame = Frame::black("cam0", 320, 240);
        manager.send_frame("cam0", &frame);
    }

    let state = state.lock();
    assert_eq!(state.frame_lens.len(), 5);
    assert!(state.frame_lens.iter().all(|&len| len == 320 * 240 * 3));
}
