//! Contract tests for structured generation payloads.

use studium_core::{Message, Mindmap, PodcastScript, PodcastType, Quiz};
use studium_engine::structured::generate_structured;
use studium_inference::MockGenerationBackend;

fn quiz_json(option_count: usize) -> String {
    let options: Vec<String> = (0..option_count).map(|i| format!("\"option {}\"", i)).collect();
    format!(
        r#"{{"title": "Cell Biology", "questions": [{{"question": "What produces ATP?", "options": [{}], "correct_answer_index": 1, "explanation": "Mitochondria."}}]}}"#,
        options.join(", ")
    )
}

#[tokio::test]
async fn quiz_with_wrong_option_count_is_retried_until_valid() {
    let backend = MockGenerationBackend::new(vec![quiz_json(3), quiz_json(4)]);

    let quiz: Quiz = generate_structured(&backend, &[Message::user("quiz")], |q: &Quiz| {
        q.validate()
    })
    .await
    .unwrap();

    assert_eq!(quiz.questions.len(), 1);
    assert_eq!(quiz.questions[0].options.len(), 4);
    assert_eq!(backend.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn quiz_that_never_validates_becomes_generation_error() {
    let backend = MockGenerationBackend::single(quiz_json(5));

    let result: Result<Quiz, _> =
        generate_structured(&backend, &[Message::user("quiz")], |q: &Quiz| q.validate()).await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Generation error"));
    // 1 initial + 2 retries.
    assert_eq!(backend.calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn cyclic_mindmap_is_rejected_then_regenerated() {
    let cyclic = r#"{"nodes": [{"id": "a", "label": "A", "type": "input"},
                               {"id": "b", "label": "B", "type": "default"}],
                     "edges": [{"source": "a", "target": "b", "label": null},
                               {"source": "b", "target": "a", "label": null}]}"#;
    let acyclic = r#"{"nodes": [{"id": "a", "label": "A", "type": "input"},
                                {"id": "b", "label": "B", "type": "output"}],
                      "edges": [{"source": "a", "target": "b", "label": "leads to"}]}"#;
    let backend = MockGenerationBackend::new(vec![cyclic.to_string(), acyclic.to_string()]);

    let map: Mindmap = generate_structured(&backend, &[Message::user("map")], |m: &Mindmap| {
        m.validate()
    })
    .await
    .unwrap();

    assert_eq!(map.edges.len(), 1);
}

#[tokio::test]
async fn duo_script_with_one_speaker_is_rejected() {
    let solo = r#"{"topic": "Cells", "script": [
        {"speaker": "Alex", "voice": "af_bella", "text": "Welcome back!"},
        {"speaker": "Alex", "voice": "af_bella", "text": "Today: cells."}]}"#;
    let backend = MockGenerationBackend::single(solo.to_string());

    let result: Result<PodcastScript, _> =
        generate_structured(&backend, &[Message::user("script")], |s: &PodcastScript| {
            s.validate(PodcastType::Duo)
        })
        .await;

    assert!(result.is_err());
}
