#[cfg(test)]
mod tests {
    use crate::app::{AppPorts, CompanionApp};
    use companion_core::playback::PlaybackHandle;
    use companion_core::ports::*;
    use companion_types::config::CompanionConfig;
    use companion_types::journal::JournalStatus;
    use companion_types::keys::{self, CONFIG_KEY, USER_KEY};
    use companion_types::message::*;
    use companion_types::turn::*;
    use companion_types::user::*;
    use companion_types::wiki::WikiEntry;
    use companion_types::{CompanionError, JournalError, Result};
    use companion_ui::state::AppView;
    use async_trait::async_trait;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    // ─── Mocks ───────────────────────────────────────────────

    #[derive(Default)]
    struct MockStorage {
        data: RefCell<HashMap<String, String>>,
    }

    impl MockStorage {
        fn raw(&self, key: &str) -> Option<String> {
            self.data.borrow().get(key).cloned()
        }
    }

    impl StoragePort for MockStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.data.borrow().get(key).cloned())
        }
        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.data.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }
        fn delete(&self, key: &str) -> Result<()> {
            self.data.borrow_mut().remove(key);
            Ok(())
        }
        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    struct ManualClock(Cell<i64>);

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            // Every reading moves time forward a little
            let now = self.0.get();
            self.0.set(now + 7);
            now
        }
    }

    #[derive(Default)]
    struct MockAi {
        wiki_calls: RefCell<Vec<(String, String)>>,
    }

    #[async_trait(?Send)]
    impl CompanionAiPort for MockAi {
        async fn send_conversation_turn(&self, req: TurnRequest) -> Result<TurnReply> {
            Ok(TurnReply {
                text: format!("I hear you about {}", req.text),
                grounding_links: Vec::new(),
            })
        }

        async fn synthesize_speech(&self, _text: &str) -> Result<Vec<u8>> {
            Ok(vec![1, 2, 3])
        }

        async fn summarize_session(
            &self,
            history: &[Message],
            _language: Language,
        ) -> Result<AnalysisResult> {
            Ok(AnalysisResult {
                themes: vec!["stress".to_string()],
                feedback: format!("{} messages", history.len()),
                ..AnalysisResult::default()
            })
        }

        async fn generate_wiki_entry(
            &self,
            id: &str,
            label: &str,
            _language: Language,
        ) -> Result<WikiEntry> {
            self.wiki_calls
                .borrow_mut()
                .push((id.to_string(), label.to_string()));
            Ok(WikiEntry {
                id: id.to_string(),
                label: label.to_string(),
                short_description: format!("About {}", label),
                biological_why: "Stress hormones.".to_string(),
                what_it_feels_like: String::new(),
                gentle_reframes: Vec::new(),
                triggers: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct MockSync {
        calls: RefCell<Vec<(String, usize)>>,
    }

    #[async_trait(?Send)]
    impl SyncPort for MockSync {
        async fn background_sync(&self, user_id: &str, history: &[Message]) -> Result<SyncOutcome> {
            self.calls
                .borrow_mut()
                .push((user_id.to_string(), history.len()));
            let first = history.iter().find(|m| m.is_user()).map(|m| m.text.clone());
            Ok(SyncOutcome {
                suggested_title: first.map(|t| format!("About {}", t)),
            })
        }
    }

    struct FakeHandle {
        stopped: Rc<Cell<u32>>,
    }

    impl PlaybackHandle for FakeHandle {
        fn stop(&mut self) {
            self.stopped.set(self.stopped.get() + 1);
        }
    }

    fn player(stops: &Rc<Cell<u32>>) -> impl FnOnce(Vec<u8>) -> Result<Box<dyn PlaybackHandle>> {
        let stopped = stops.clone();
        move |pcm| {
            assert_eq!(pcm, vec![1, 2, 3]);
            let handle: Box<dyn PlaybackHandle> = Box::new(FakeHandle { stopped });
            Ok(handle)
        }
    }

    fn block_on<F: std::future::Future<Output = T>, T>(f: F) -> T {
        use std::sync::Arc;
        use std::task::{Context, Poll, Wake, Waker};

        struct NoopWaker;
        impl Wake for NoopWaker {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(val) => return val,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    struct Harness {
        storage: Rc<MockStorage>,
        ai: Rc<MockAi>,
        sync: Rc<MockSync>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                storage: Rc::new(MockStorage::default()),
                ai: Rc::new(MockAi::default()),
                sync: Rc::new(MockSync::default()),
            }
        }

        fn app(&self) -> CompanionApp {
            self.app_with(CompanionConfig::default())
        }

        fn app_with(&self, config: CompanionConfig) -> CompanionApp {
            let ports = AppPorts {
                storage: self.storage.clone(),
                clock: Rc::new(ManualClock(Cell::new(1_700_000_000_000))),
                ai: self.ai.clone(),
                sync: Some(self.sync.clone() as Rc<dyn SyncPort>),
                location: None,
            };
            CompanionApp::new(ports, config)
        }
    }

    fn profile(id: &str, save_history: bool) -> UserProfile {
        UserProfile::new(id, "Chidi", Language::En).with_preferences(Preferences {
            save_history,
            has_seen_tour: false,
        })
    }

    fn last_model_id(app: &CompanionApp) -> String {
        app.messages()
            .iter()
            .rev()
            .find(|m| m.role == Role::Model)
            .map(|m| m.id.clone())
            .unwrap()
    }

    // ─── Identity & Navigation Tests ─────────────────────────

    #[test]
    fn test_fresh_start_is_onboarding() {
        let h = Harness::new();
        let app = h.app();
        let ui = app.tick();
        assert_eq!(ui.view, AppView::Onboarding);
        assert!(!app.navigate(AppView::History));
        assert!(app.current_user().is_none());
        assert!(!block_on(app.send_message("hello", None)));
    }

    #[test]
    fn test_login_with_defaults_routes_to_chat() {
        let h = Harness::new();
        let app = h.app();
        let incoming: UserProfile = serde_json::from_str(
            r#"{"id":"u1","name":"Chidi","language":"en","preferences":{"saveHistory":false}}"#,
        )
        .unwrap();
        app.login(incoming);

        let ui = app.tick();
        assert_eq!(ui.view, AppView::Chat);
        assert!(ui.signed_in);

        let stored: serde_json::Value = serde_json::from_str(&h.storage.raw(USER_KEY).unwrap()).unwrap();
        assert_eq!(stored["preferences"]["saveHistory"], false);
        assert_eq!(stored["preferences"]["hasSeenTour"], false);
    }

    #[test]
    fn test_restored_user_starts_in_chat() {
        let h = Harness::new();
        h.app().login(profile("u1", true));

        let app = h.app();
        assert_eq!(app.tick().view, AppView::Chat);
        assert_eq!(app.current_user().unwrap().id, "u1");
        assert_eq!(app.messages().len(), 1);
    }

    #[test]
    fn test_logout_returns_to_onboarding() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        app.navigate(AppView::Settings);
        app.logout();
        assert_eq!(app.tick().view, AppView::Onboarding);
        assert!(h.storage.raw(USER_KEY).is_none());
    }

    #[test]
    fn test_language_change_reseeds_fresh_chat() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        assert!(app.set_language(Language::Ig));
        assert_eq!(app.messages()[0].text, Language::Ig.privacy_notice());
        assert_eq!(app.current_user().unwrap().language, Language::Ig);
    }

    #[test]
    fn test_preferences_toggle() {
        let h = Harness::new();
        let app = h.app();
        assert!(!app.update_preferences(|p| p.has_seen_tour = true));
        app.login(profile("u1", true));
        assert!(app.update_preferences(|p| p.has_seen_tour = true));
        assert!(app.current_user().unwrap().preferences.has_seen_tour);
    }

    // ─── Session Tests ───────────────────────────────────────

    #[test]
    fn test_conversation_is_saved_and_titled() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));

        assert!(block_on(app.send_message("exams", None)));
        let messages = app.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text, "I hear you about exams");

        let sessions = app.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title.as_deref(), Some("About exams"));
        // Both saves of the turn collapse into one sync call
        assert_eq!(*h.sync.calls.borrow(), vec![("u1".to_string(), 3)]);

        let stored = h.storage.raw(&keys::sessions_key(Some("u1"))).unwrap();
        assert!(stored.contains("About exams"));
        assert!(!app.tick().busy);
    }

    #[test]
    fn test_titles_land_on_their_own_sessions() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));

        block_on(app.send_message("exams", None));
        let first = app.active_session_id().unwrap();
        app.new_chat();
        block_on(app.send_message("sleep", None));
        let second = app.active_session_id().unwrap();
        assert_ne!(first, second);

        let sessions = app.sessions();
        let title_of = |id: &str| {
            sessions
                .iter()
                .find(|s| s.id == id)
                .and_then(|s| s.title.clone())
        };
        assert_eq!(title_of(&first).as_deref(), Some("About exams"));
        assert_eq!(title_of(&second).as_deref(), Some("About sleep"));
    }

    #[test]
    fn test_sync_disabled_sends_nothing() {
        let h = Harness::new();
        let mut config = CompanionConfig::default();
        config.sync.enabled = false;
        let app = h.app_with(config);
        app.login(profile("u1", true));

        block_on(app.send_message("hello", None));
        assert!(h.sync.calls.borrow().is_empty());
        assert!(app.sessions()[0].title.is_none());
        assert_eq!(block_on(app.flush_syncs()), 0);
    }

    #[test]
    fn test_history_off_saves_nothing() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", false));

        block_on(app.send_message("one", None));
        block_on(app.send_message("two", None));
        assert_eq!(app.messages().len(), 5);
        assert!(app.sessions().is_empty());
        assert!(h.storage.raw(&keys::sessions_key(Some("u1"))).is_none());
        assert!(h.sync.calls.borrow().is_empty());
    }

    #[test]
    fn test_users_never_see_each_other() {
        let h = Harness::new();
        let app = h.app();

        app.login(profile("alice", true));
        block_on(app.send_message("alice secret", None));
        let alice_sessions = app.sessions();
        app.logout();
        assert!(app.sessions().is_empty());

        app.login(profile("bob", true));
        assert!(app.sessions().is_empty());
        assert!(app.active_session_id().is_none());
        assert_eq!(app.messages().len(), 1);
        block_on(app.send_message("bob stuff", None));
        assert!(app.sessions().iter().all(|s| s.preview != "alice secret"));
        app.logout();

        app.login(profile("alice", true));
        assert_eq!(app.sessions(), alice_sessions);
        assert!(app.active_session_id().is_none());
    }

    #[test]
    fn test_select_session_shows_its_messages() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));

        block_on(app.send_message("first", None));
        let first = app.active_session_id().unwrap();
        app.new_chat();
        block_on(app.send_message("second", None));

        app.navigate(AppView::History);
        assert!(app.select_session(&first));
        assert_eq!(app.tick().view, AppView::Chat);
        let texts: Vec<String> = app.messages().into_iter().map(|m| m.text).collect();
        assert!(texts.contains(&"first".to_string()));
        assert!(!texts.contains(&"second".to_string()));
        assert!(!app.select_session("missing"));
    }

    #[test]
    fn test_delete_only_session_starts_fresh() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));

        block_on(app.send_message("hello", None));
        let deleted = app.active_session_id().unwrap();
        assert!(app.delete_session(&deleted));
        assert!(app.active_session_id().is_none());
        assert!(app.sessions().is_empty());
        assert_eq!(app.messages().len(), 1);

        block_on(app.send_message("again", None));
        assert_ne!(app.active_session_id().unwrap(), deleted);
    }

    #[test]
    fn test_delete_shown_session_falls_back() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));

        block_on(app.send_message("older", None));
        app.new_chat();
        block_on(app.send_message("newer", None));
        let newer = app.active_session_id().unwrap();
        app.new_chat();
        block_on(app.send_message("newest", None));
        let newest = app.active_session_id().unwrap();

        assert!(app.delete_session(&newest));
        assert_eq!(app.active_session_id(), Some(newer));
        assert!(app.messages().iter().any(|m| m.text == "newer"));
    }

    #[test]
    fn test_feedback_is_persisted() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        block_on(app.send_message("hi", None));

        let model_id = last_model_id(&app);
        assert!(block_on(app.set_feedback(&model_id, Feedback::Down)));
        let stored = h.storage.raw(&keys::sessions_key(Some("u1"))).unwrap();
        assert!(stored.contains("\"feedback\":\"down\""));
    }

    #[test]
    fn test_feedback_is_synced_right_away() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        block_on(app.send_message("hi", None));
        assert_eq!(h.sync.calls.borrow().len(), 1);

        let model_id = last_model_id(&app);
        block_on(app.set_feedback(&model_id, Feedback::Up));
        assert_eq!(h.sync.calls.borrow().len(), 2);

        assert!(!block_on(app.set_feedback("missing", Feedback::Up)));
        assert_eq!(h.sync.calls.borrow().len(), 2);
    }

    #[test]
    fn test_turning_history_on_saves_current_chat() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", false));
        block_on(app.send_message("hello", None));
        assert!(app.sessions().is_empty());

        assert!(app.update_preferences(|p| p.save_history = true));
        let sessions = app.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].messages.len(), 3);
        assert!(h.storage.raw(&keys::sessions_key(Some("u1"))).is_some());
        assert_eq!(app.active_session_id(), Some(sessions[0].id.clone()));
        assert_eq!(app.tick().session_count, 1);

        assert_eq!(block_on(app.flush_syncs()), 1);
        assert_eq!(app.sessions()[0].title.as_deref(), Some("About hello"));

        // Leaving and coming back finds the conversation
        app.new_chat();
        assert!(app.select_session(&sessions[0].id));
        assert_eq!(app.messages().len(), 3);
    }

    #[test]
    fn test_profile_update_with_history_on_saves() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", false));
        block_on(app.send_message("hello", None));

        let mut updated = app.current_user().unwrap();
        updated.preferences.save_history = true;
        app.update_user(updated);
        assert_eq!(app.sessions().len(), 1);
    }

    #[test]
    fn test_unrelated_preference_change_saves_nothing() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", false));
        block_on(app.send_message("hello", None));

        app.update_preferences(|p| p.has_seen_tour = true);
        app.update_preferences(|p| p.save_history = false);
        assert!(app.sessions().is_empty());
        assert!(h.storage.raw(&keys::sessions_key(Some("u1"))).is_none());
    }

    #[test]
    fn test_session_count_follows_saves() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));

        block_on(app.send_message("first", None));
        assert_eq!(app.tick().session_count, 1);
        block_on(app.send_message("more", None));
        assert_eq!(app.tick().session_count, 1);

        app.new_chat();
        block_on(app.send_message("second", None));
        assert_eq!(app.tick().session_count, 2);

        let id = app.active_session_id().unwrap();
        app.delete_session(&id);
        assert_eq!(app.tick().session_count, app.sessions().len());
    }

    // ─── Chat Tests ──────────────────────────────────────────

    #[test]
    fn test_emergency_opens_overlay() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));

        block_on(app.send_message("I want to end it all", None));
        let ui = app.tick();
        assert!(ui.show_emergency);
        assert!(app.messages()[1].is_emergency);

        app.dismiss_emergency();
        assert!(!app.tick().show_emergency);
    }

    #[test]
    fn test_analyze_needs_a_conversation() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        assert!(block_on(app.analyze()).is_none());

        block_on(app.send_message("work stress", None));
        let result = block_on(app.analyze()).unwrap();
        assert_eq!(result.themes, vec!["stress".to_string()]);
        assert_eq!(result.feedback, "3 messages");
    }

    // ─── Speech Tests ────────────────────────────────────────

    #[test]
    fn test_speak_toggles_and_supersedes() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        block_on(app.send_message("one", None));
        let first = last_model_id(&app);
        block_on(app.send_message("two", None));
        let second = last_model_id(&app);

        let first_stops = Rc::new(Cell::new(0));
        assert!(block_on(app.speak(&first, player(&first_stops))).unwrap());
        assert_eq!(app.tick().speaking.as_deref(), Some(first.as_str()));

        let second_stops = Rc::new(Cell::new(0));
        assert!(block_on(app.speak(&second, player(&second_stops))).unwrap());
        assert_eq!(first_stops.get(), 1);
        assert_eq!(app.tick().speaking.as_deref(), Some(second.as_str()));

        // Tapping the playing message stops it
        let unused = Rc::new(Cell::new(0));
        assert!(!block_on(app.speak(&second, player(&unused))).unwrap());
        assert_eq!(second_stops.get(), 1);
        assert!(app.tick().speaking.is_none());
    }

    #[test]
    fn test_speech_finished_releases_slot() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        block_on(app.send_message("hi", None));
        let id = last_model_id(&app);

        let stops = Rc::new(Cell::new(0));
        block_on(app.speak(&id, player(&stops))).unwrap();
        app.speech_finished(&id);
        assert!(app.tick().speaking.is_none());

        // Next tap plays again instead of toggling off
        assert!(block_on(app.speak(&id, player(&stops))).unwrap());
    }

    #[test]
    fn test_player_failure_is_reported() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        block_on(app.send_message("hi", None));
        let id = last_model_id(&app);

        let failing = |_pcm: Vec<u8>| -> Result<Box<dyn PlaybackHandle>> {
            Err(CompanionError::JsInterop("no audio".to_string()))
        };
        assert!(block_on(app.speak(&id, failing)).is_err());
        assert!(app.tick().speaking.is_none());
        assert!(!block_on(app.speak("missing", player(&Rc::new(Cell::new(0))))).unwrap());
    }

    #[test]
    fn test_switching_chat_stops_speech() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        block_on(app.send_message("hi", None));
        let id = last_model_id(&app);

        let stops = Rc::new(Cell::new(0));
        block_on(app.speak(&id, player(&stops))).unwrap();
        app.new_chat();
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn test_player_may_call_back_into_app() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        block_on(app.send_message("hi", None));
        let id = last_model_id(&app);

        let stops = Rc::new(Cell::new(0));
        let stopped = stops.clone();
        let inner = app.clone();
        let started = block_on(app.speak(&id, move |_pcm| {
            assert!(inner.tick().speaking.is_none());
            let handle: Box<dyn PlaybackHandle> = Box::new(FakeHandle { stopped });
            Ok(handle)
        }))
        .unwrap();
        assert!(started);
        assert_eq!(app.tick().speaking.as_deref(), Some(id.as_str()));
        assert_eq!(stops.get(), 0);
    }

    #[test]
    fn test_playback_ending_while_starting() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        block_on(app.send_message("hi", None));
        let id = last_model_id(&app);

        let stops = Rc::new(Cell::new(0));
        let stopped = stops.clone();
        let inner = app.clone();
        let finished_id = id.clone();
        let started = block_on(app.speak(&id, move |_pcm| {
            inner.speech_finished(&finished_id);
            let handle: Box<dyn PlaybackHandle> = Box::new(FakeHandle { stopped });
            Ok(handle)
        }))
        .unwrap();
        assert!(!started);
        assert_eq!(stops.get(), 1);
        assert!(app.tick().speaking.is_none());
    }

    // ─── Psycho-wiki Tests ───────────────────────────────────

    #[test]
    fn test_wiki_cards_for_message_text() {
        let h = Harness::new();
        let app = h.app();
        let labels: Vec<String> = app
            .wiki_matches("I feel like a fraud at work")
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec!["Imposter Syndrome".to_string()]);
        assert!(app.wiki_matches("hello").is_empty());
    }

    #[test]
    fn test_builtin_wiki_card_needs_no_model() {
        let h = Harness::new();
        let app = h.app();
        let entry = block_on(app.open_wiki("bremi-wiki://burnout", None)).unwrap();
        assert_eq!(entry.label, "Burnout");
        assert!(h.ai.wiki_calls.borrow().is_empty());
    }

    #[test]
    fn test_unknown_wiki_card_generated_once() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));

        let first = block_on(app.open_wiki("bremi-wiki://bremi_grief_cycle", None)).unwrap();
        assert_eq!(first.id, "bremi_grief_cycle");
        assert_eq!(first.label, "grief cycle");
        let again = block_on(app.open_wiki("bremi_grief_cycle", Some("Grief"))).unwrap();
        assert_eq!(again, first);
        assert_eq!(
            *h.ai.wiki_calls.borrow(),
            vec![("bremi_grief_cycle".to_string(), "grief cycle".to_string())]
        );
    }

    #[test]
    fn test_wiki_card_can_be_spoken() {
        let h = Harness::new();
        let app = h.app();
        block_on(app.open_wiki("rumination", None)).unwrap();

        let speech_id = CompanionApp::wiki_speech_id("rumination");
        let stops = Rc::new(Cell::new(0));
        assert!(block_on(app.speak(&speech_id, player(&stops))).unwrap());
        assert_eq!(app.tick().speaking, Some(speech_id));
    }

    // ─── Journal Tests ───────────────────────────────────────

    #[test]
    fn test_journal_locks_on_logout() {
        let h = Harness::new();
        let app = h.app();
        app.login(profile("u1", true));
        app.set_journal_pin("1234", "1234").unwrap();
        app.add_journal_entry("grateful today").unwrap();

        app.logout();
        assert_eq!(app.journal_status(), JournalStatus::Locked);
        assert_eq!(app.journal_entries(), Err(JournalError::Locked));

        app.unlock_journal("1234").unwrap();
        assert_eq!(app.journal_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_journal_reset_after_failures() {
        let h = Harness::new();
        let app = h.app();
        app.set_journal_pin("1234", "1234").unwrap();
        app.add_journal_entry("secret").unwrap();
        app.lock_journal();

        for _ in 0..5 {
            assert!(app.unlock_journal("0000").is_err());
        }
        assert!(app.journal_can_reset());
        app.reset_journal();

        assert_eq!(app.journal_status(), JournalStatus::NeedsPin);
        assert!(h.storage.raw(keys::JOURNAL_PIN_KEY).is_none());
        assert!(h.storage.raw(keys::JOURNAL_ENTRIES_KEY).is_none());
    }

    #[test]
    fn test_journal_entry_edits() {
        let h = Harness::new();
        let app = h.app();
        app.set_journal_pin("9876", "9876").unwrap();
        let entry = app.add_journal_entry("draft").unwrap().unwrap();
        assert!(app.edit_journal_entry(&entry.id, "final").unwrap());
        assert_eq!(app.journal_entries().unwrap()[0].text, "final");
        app.delete_journal_entry(&entry.id).unwrap();
        assert!(app.journal_entries().unwrap().is_empty());
    }

    // ─── Config Tests ────────────────────────────────────────

    #[test]
    fn test_config_round_trip() {
        let h = Harness::new();
        let app = h.app();
        let mut config = app.config();
        config.chat.preview_chars = 30;
        config.ai.api_key = "key".to_string();
        app.save_config(config);

        let restored = CompanionApp::load_config(h.storage.as_ref());
        assert_eq!(restored.chat.preview_chars, 30);
        assert_eq!(restored.ai.api_key, "key");
        assert_eq!(app.config().chat.preview_chars, 30);
    }

    #[test]
    fn test_unreadable_config_uses_defaults() {
        let h = Harness::new();
        h.storage.set(CONFIG_KEY, "{oops").unwrap();
        let config = CompanionApp::load_config(h.storage.as_ref());
        assert_eq!(config.journal.max_pin_attempts, 5);
        assert_eq!(config.ai.history_window, 10);
    }
}
