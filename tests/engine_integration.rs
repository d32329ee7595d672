//! Integration tests for the answer engine
//!
//! Drives index -> ask -> conversation through the public API with scripted
//! provider clients.

mod common;

use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

use common::{blocked, engine, install, sample_profile, ScriptedClient};
use profilerag::index::MetadataFilter;
use profilerag::{Config, DocumentInput, ErrorKind, ProfileInput, ProviderKind, SourceKind};

#[tokio::test]
async fn test_go_question_cites_go_skill() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    let gemini = install(
        &registry,
        ScriptedClient::new(ProviderKind::Gemini, "The candidate builds Go microservices [1]."),
    )
    .await;

    let stats = assert_ok!(engine.index(sample_profile("cand-go")).await);
    assert_eq!(stats.documents, 5);

    let result = assert_ok!(
        engine
            .ask("cand-go", "Does this candidate know Go?", Some("gemini"), true)
            .await
    );

    assert_eq!(result.provider, ProviderKind::Gemini);
    assert_eq!(result.model, "scripted-model");
    assert!(result.answer.contains("Go"));

    let evidence = result.evidence.as_ref().unwrap();
    assert_eq!(evidence.len(), 1);
    assert_eq!(evidence[0].label(), "Go");

    // Every retrieved document is scored, best first
    assert_eq!(result.similarity_scores.len(), 5);
    assert!(result
        .similarity_scores
        .windows(2)
        .all(|pair| pair[0] >= pair[1]));
    assert!(result.similarity_scores[0] > 0.0);

    let prompt = &gemini.prompts()[0];
    assert!(prompt.contains("CANDIDATE PROFILE SUMMARY:"));
    assert!(prompt.contains("[1] (skill) Go (confidence: 0.85)"));
    assert!(!prompt.contains("PREVIOUS CONVERSATION"));
}

#[tokio::test]
async fn test_three_document_profile_ranks_go_first() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    install(&registry, ScriptedClient::new(ProviderKind::Gemini, "Yes, Go concurrency [1].")).await;

    let profile = ProfileInput::new(
        "cand-3",
        vec![
            DocumentInput::new("Python data analysis", SourceKind::Skill, "Python"),
            DocumentInput::new("Go concurrency patterns", SourceKind::Skill, "Go"),
            DocumentInput::new("JavaScript web development", SourceKind::Skill, "JavaScript"),
        ],
    );
    assert_ok!(engine.index(profile).await);

    let result = assert_ok!(
        engine
            .ask("cand-3", "Does this candidate know Go?", Some("gemini"), true)
            .await
    );
    let evidence = result.evidence.as_ref().unwrap();
    assert_eq!(evidence[0].text, "Go concurrency patterns");
    assert_eq!(result.similarity_scores.len(), 3);
    assert!(result.similarity_scores[0] > result.similarity_scores[1]);
}

#[tokio::test]
async fn test_filter_restricts_evidence_to_repositories() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    let gemini = install(&registry, ScriptedClient::new(ProviderKind::Gemini, "The rate limiter [1].")).await;
    assert_ok!(engine.index(sample_profile("cand")).await);

    let filter = MetadataFilter::new().source_kinds(&[SourceKind::Repository]);
    let result = assert_ok!(
        engine
            .ask_filtered("cand", "Does this candidate know Go?", None, true, Some(&filter))
            .await
    );

    assert_eq!(result.similarity_scores.len(), 1);
    assert_eq!(result.evidence.as_ref().unwrap()[0].label(), "ratelimit");
    assert!(!gemini.prompts()[0].contains("(skill) Go"));
}

#[tokio::test]
async fn test_default_provider_from_config() {
    let mut config = Config::default();
    config.providers.default = "anthropic".to_string();
    let (engine, registry) = engine(&config);
    let claude = install(&registry, ScriptedClient::new(ProviderKind::Anthropic, "Yes [2].")).await;

    assert_ok!(engine.index(sample_profile("cand")).await);
    let result = assert_ok!(engine.ask("cand", "Python?", None, true).await);

    assert_eq!(result.provider, ProviderKind::Anthropic);
    assert_eq!(claude.calls(), 1);
}

#[tokio::test]
async fn test_provider_switch_starts_fresh_conversation() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    install(&registry, ScriptedClient::new(ProviderKind::Gemini, "Gemini says yes [1].")).await;
    let openai = install(&registry, ScriptedClient::new(ProviderKind::OpenAi, "OpenAI says yes [1].")).await;

    assert_ok!(engine.index(sample_profile("cand")).await);
    assert_ok!(engine.ask("cand", "Go experience?", Some("gemini"), true).await);
    assert_ok!(engine.ask("cand", "Python experience?", Some("gemini"), true).await);
    assert_eq!(engine.stats("cand").await.unwrap().conversation_turns, 2);

    assert_ok!(engine.ask("cand", "React experience?", Some("gpt"), true).await);

    let stats = engine.stats("cand").await.unwrap();
    assert_eq!(stats.conversation_turns, 1);
    assert_eq!(stats.active_provider, Some(ProviderKind::OpenAi));
    // Gemini's turns never reach the new provider
    assert!(!openai.prompts()[0].contains("PREVIOUS CONVERSATION"));
}

#[tokio::test]
async fn test_conversation_window_keeps_last_three_turns() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    let gemini = install(&registry, ScriptedClient::new(ProviderKind::Gemini, "Noted [1].")).await;
    assert_ok!(engine.index(sample_profile("cand")).await);

    let questions = [
        "Alpha question about Go?",
        "Bravo question about Python?",
        "Charlie question about React?",
        "Delta question about payments?",
        "Echo question about Kubernetes?",
    ];
    for question in questions {
        assert_ok!(engine.ask("cand", question, None, true).await);
    }

    assert_eq!(engine.stats("cand").await.unwrap().conversation_turns, 3);

    let last_prompt = gemini.prompts().pop().unwrap();
    assert!(!last_prompt.contains("EMPLOYER: Alpha question"));
    assert!(last_prompt.contains("EMPLOYER: Bravo question"));
    assert!(last_prompt.contains("EMPLOYER: Delta question"));
}

#[tokio::test]
async fn test_ask_before_index_is_index_empty() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    let gemini = install(&registry, ScriptedClient::new(ProviderKind::Gemini, "unused")).await;

    let err = assert_err!(engine.ask("nobody", "Go?", None, true).await);
    assert_eq!(err.kind(), ErrorKind::IndexEmpty);
    assert!(err.kind().is_precondition());
    assert!(err.to_string().contains("nobody"));
    assert_eq!(gemini.calls(), 0);
}

#[tokio::test]
async fn test_blank_profile_has_no_indexable_data() {
    let config = Config::default();
    let (engine, _registry) = engine(&config);
    let profile = ProfileInput::new(
        "blank",
        vec![
            DocumentInput::new("   ", SourceKind::Skill, "Nothing"),
            DocumentInput::new("", SourceKind::CvChunk, "CV"),
        ],
    );

    let err = assert_err!(engine.index(profile).await);
    assert_eq!(err.kind(), ErrorKind::NoIndexableData);
    assert!(engine.profiles().await.is_empty());
}

#[tokio::test]
async fn test_reindex_is_idempotent_and_keeps_conversation() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    install(&registry, ScriptedClient::new(ProviderKind::Gemini, "Yes [1] [2].")).await;

    assert_ok!(engine.index(sample_profile("cand")).await);
    let first = assert_ok!(engine.ask("cand", "Go services?", None, true).await);

    let stats = assert_ok!(engine.index(sample_profile("cand")).await);
    assert_eq!(stats.documents, 5);
    let second = assert_ok!(engine.ask("cand", "Go services?", None, true).await);

    let ids = |r: &profilerag::QueryResult| -> Vec<String> {
        r.evidence.as_ref().unwrap().iter().map(|d| d.id.clone()).collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.similarity_scores, second.similarity_scores);
    assert_eq!(engine.stats("cand").await.unwrap().conversation_turns, 2);
}

#[tokio::test]
async fn test_deadline_leaves_conversation_untouched() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    install(
        &registry,
        ScriptedClient::new(ProviderKind::Gemini, "too late").with_delay(Duration::from_secs(5)),
    )
    .await;
    assert_ok!(engine.index(sample_profile("cand")).await);

    let err = assert_err!(
        engine
            .ask_with_deadline("cand", "Go?", None, true, None, Duration::from_millis(50))
            .await
    );

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().contains("cand"));
    assert_eq!(engine.stats("cand").await.unwrap().conversation_turns, 0);
}

#[tokio::test]
async fn test_provider_error_keeps_root_and_conversation() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    install(
        &registry,
        ScriptedClient::new(ProviderKind::Gemini, "Fine [1].").with_reply(Err(blocked(ProviderKind::Gemini))),
    )
    .await;
    assert_ok!(engine.index(sample_profile("cand")).await);

    let err = assert_err!(engine.ask("cand", "Go?", None, true).await);
    assert_eq!(err.kind(), ErrorKind::ContentBlocked);
    assert!(err.root_message().contains("SAFETY"));
    assert!(err.report().contains("Go?"));
    assert_eq!(engine.stats("cand").await.unwrap().conversation_turns, 0);

    // The next ask goes through untouched
    assert_ok!(engine.ask("cand", "Go?", None, true).await);
    assert_eq!(engine.stats("cand").await.unwrap().conversation_turns, 1);
}

#[tokio::test]
async fn test_hidden_evidence_keeps_scores() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    install(&registry, ScriptedClient::new(ProviderKind::Gemini, "Yes [1].")).await;
    assert_ok!(engine.index(sample_profile("cand")).await);

    let result = assert_ok!(engine.ask("cand", "Go?", None, false).await);
    assert!(result.evidence.is_none());
    assert_eq!(result.evidence_len(), 0);
    assert!(!result.similarity_scores.is_empty());

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("evidence").is_none());
    assert_eq!(json["provider"], "gemini");
}

#[tokio::test]
async fn test_unknown_provider_is_rejected() {
    let config = Config::default();
    let (engine, _registry) = engine(&config);
    assert_ok!(engine.index(sample_profile("cand")).await);

    let err = assert_err!(engine.ask("cand", "Go?", Some("llama"), true).await);
    assert_eq!(err.kind(), ErrorKind::UnknownProvider);
    assert!(err.root_message().contains("gemini, openai, anthropic"));
}

#[tokio::test]
async fn test_missing_credential_fails_fast() {
    let config = Config::default();
    let (engine, _registry) = engine(&config);
    assert_ok!(engine.index(sample_profile("cand")).await);

    let err = assert_err!(
        engine
            .ask_with_deadline("cand", "Go?", Some("anthropic"), true, None, Duration::from_secs(1))
            .await
    );
    assert_eq!(err.kind(), ErrorKind::MissingCredential);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_sessions_run_independently() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    install(&registry, ScriptedClient::new(ProviderKind::Gemini, "Yes [1].")).await;

    assert_ok!(engine.index(sample_profile("alice")).await);
    assert_ok!(engine.index(sample_profile("bob")).await);

    let (a, b) = tokio::join!(
        engine.ask("alice", "Go?", None, true),
        engine.ask("bob", "Python?", None, true),
    );
    assert_ok!(a);
    assert_ok!(b);

    assert_eq!(engine.profiles().await, vec!["alice".to_string(), "bob".to_string()]);
    assert_eq!(engine.stats("alice").await.unwrap().conversation_turns, 1);
    assert_eq!(engine.stats("bob").await.unwrap().conversation_turns, 1);

    let alice_id = engine.stats("alice").await.unwrap().session_id;
    let bob_id = engine.stats("bob").await.unwrap().session_id;
    assert_ne!(alice_id, bob_id);
}

#[tokio::test]
async fn test_drop_profile_and_reset() {
    let config = Config::default();
    let (engine, registry) = engine(&config);
    install(&registry, ScriptedClient::new(ProviderKind::Gemini, "Yes [1].")).await;
    assert_ok!(engine.index(sample_profile("cand")).await);
    assert_ok!(engine.ask("cand", "Go?", None, true).await);

    assert_ok!(engine.reset_conversation("cand").await);
    assert_eq!(engine.stats("cand").await.unwrap().conversation_turns, 0);

    assert!(engine.drop_profile("cand").await);
    assert!(!engine.drop_profile("cand").await);
    let err = assert_err!(engine.ask("cand", "Go?", None, true).await);
    assert_eq!(err.kind(), ErrorKind::IndexEmpty);
}
