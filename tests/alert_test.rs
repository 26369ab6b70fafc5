mod common;

use std::sync::Arc;

use common::{benign_scores, RecordingNotifier};
use niasafe::alerts::{AlertEvaluator, AlertThresholds, SeverityLevel, Threshold, ALERT_MESSAGE};
use niasafe::store::{CommentStore, NewFlaggedComment, SqliteCommentStore};
use niasafe::{Category, SeverityScores};

async fn evaluate(scores: SeverityScores) -> (bool, Vec<(String, SeverityLevel)>, bool) {
    let store = Arc::new(SqliteCommentStore::open_in_memory().unwrap());
    let notifier = Arc::new(RecordingNotifier::default());
    let evaluator = AlertEvaluator::new(store.clone(), notifier.clone(), AlertThresholds::default());

    let id = store.insert(NewFlaggedComment::from_scores("comment", scores)).await.unwrap();
    let triggered = evaluator.evaluate(&id, &scores).await.unwrap();
    let flagged = store.get(&id).await.unwrap().unwrap().alert_triggered;
    (triggered, notifier.sent(), flagged)
}

#[tokio::test]
async fn test_threat_only() {
    let (triggered, sent, flagged) = evaluate(benign_scores().with(Category::Threat, 0.85)).await;
    assert!(triggered);
    assert!(flagged);
    assert_eq!(sent, vec![(ALERT_MESSAGE.to_string(), SeverityLevel::Single(Category::Threat))]);
}

#[tokio::test]
async fn test_severe_toxic_only() {
    let (triggered, sent, flagged) = evaluate(benign_scores().with(Category::SevereToxic, 0.75)).await;
    assert!(triggered);
    assert!(flagged);
    assert_eq!(sent[0].1, SeverityLevel::Single(Category::SevereToxic));
    assert_eq!(sent[0].1.to_string(), "severe_toxic");
}

#[tokio::test]
async fn test_both_categories_report_multiple() {
    let scores = benign_scores()
        .with(Category::Threat, 0.9)
        .with(Category::SevereToxic, 0.9);
    let (triggered, sent, flagged) = evaluate(scores).await;
    assert!(triggered);
    assert!(flagged);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, SeverityLevel::Multiple);
    assert_eq!(sent[0].1.to_string(), "multiple");
}

#[tokio::test]
async fn test_thresholds_are_strict() {
    let scores = benign_scores()
        .with(Category::Threat, 0.8)
        .with(Category::SevereToxic, 0.7);
    let (triggered, sent, flagged) = evaluate(scores).await;
    assert!(!triggered);
    assert!(!flagged);
    assert!(sent.is_empty());
}

#[tokio::test]
async fn test_other_categories_never_alert_by_default() {
    let scores = SeverityScores::from_array([0.99, 0.1, 0.99, 0.1, 0.99, 0.99]);
    let (triggered, sent, _) = evaluate(scores).await;
    assert!(!triggered);
    assert!(sent.is_empty());
}

#[test]
fn test_custom_thresholds_reject_duplicates() {
    let result = AlertThresholds::new(vec![
        Threshold { category: Category::Insult, threshold: 0.5 },
        Threshold { category: Category::Insult, threshold: 0.6 },
    ]);
    assert!(result.is_err());

    let thresholds = AlertThresholds::new(vec![Threshold { category: Category::Insult, threshold: 0.5 }]).unwrap();
    let scores = benign_scores().with(Category::Insult, 0.51).with(Category::Threat, 0.99);
    assert_eq!(thresholds.exceeded(&scores), vec![Category::Insult]);
}
