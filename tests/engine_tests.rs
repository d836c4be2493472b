mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use skinmatch_api::{
    error::AppError,
    models::{AlgorithmTier, GuestProfile, SafetyFlag, SafetyStatus, SkinType},
    services::{EngineSettings, OntologyService},
};
use tokio_util::sync::CancellationToken;

use common::*;

#[tokio::test]
async fn test_fragrance_free_ranks_above_unknown_at_equal_match() {
    let label = "Water, Salicylic Acid, Niacinamide";
    let repository = FakeRepository::with_products(vec![
        with_fragrance_flag(product(1, label), SafetyFlag::Unknown),
        with_fragrance_flag(product(2, label), SafetyFlag::True),
        with_fragrance_flag(product(3, label), SafetyFlag::False),
        product(4, "Water, Glycerin"),
    ]);
    let engine = engine(Arc::new(skincare_graph()), Arc::new(repository));

    let response = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.metadata.algorithm_type, AlgorithmTier::SemanticReasoning);
    assert_eq!(response.metadata.fallback_path, vec![AlgorithmTier::SemanticReasoning]);

    let ids: Vec<i64> = response
        .recommendations
        .iter()
        .map(|r| r.candidate.product.id)
        .collect();
    assert_eq!(ids, vec![2, 1]);
    assert!(
        response.recommendations[0].candidate.final_score
            > response.recommendations[1].candidate.final_score
    );
}

#[tokio::test]
async fn test_zero_graph_rows_fall_back_but_still_recommend() {
    let repository = FakeRepository::with_products(vec![
        product(1, "Water, Centella Asiatica, Panthenol"),
        product(2, "Water, Glycerin"),
    ]);
    let graph = Arc::new(skincare_graph());
    let engine = engine(graph.clone(), Arc::new(repository));
    let profile = GuestProfile::new(SkinType::Sensitive, ["redness"], Vec::<String>::new());

    let response = engine
        .recommend(&profile, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!response.metadata.algorithm_type.is_primary());
    assert_eq!(response.metadata.algorithm_type, AlgorithmTier::DatabaseBasicFallback);
    assert_eq!(response.recommendations.len(), 2);
    // Centella matches the built-in guidance for sensitive skin
    assert_eq!(response.recommendations[0].candidate.product.id, 1);
    // One recommendation query per ontology tier, no interaction queries
    assert_eq!(graph.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_documented_conflict_needs_caution() {
    let repository = FakeRepository::with_products(vec![product(
        1,
        "Water, Retinol, Vitamin C, Niacinamide",
    )]);
    let engine = engine(Arc::new(skincare_graph()), Arc::new(repository));
    let profile = GuestProfile::new(SkinType::Normal, ["aging"], Vec::<String>::new());

    let response = engine
        .recommend(&profile, &CancellationToken::new())
        .await
        .unwrap();

    let analysis = &response.recommendations[0].candidate.safety_analysis;
    assert_eq!(analysis.overall_safety_status, SafetyStatus::CautionNeeded);
    assert!(analysis.conflicts_detected >= 1);
    assert!(response.recommendations[0]
        .explanation
        .contains("potentially conflicting"));
}

#[tokio::test]
async fn test_documented_synergy_is_excellent() {
    let repository = FakeRepository::with_products(vec![product(
        1,
        "Aqua, Sodium Hyaluronate, Niacinamide",
    )]);
    let engine = engine(Arc::new(skincare_graph()), Arc::new(repository));
    let profile = GuestProfile::new(SkinType::Dry, ["dryness"], Vec::<String>::new());

    let response = engine
        .recommend(&profile, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.metadata.algorithm_type, AlgorithmTier::SemanticReasoning);
    let analysis = &response.recommendations[0].candidate.safety_analysis;
    assert_eq!(analysis.conflicts_detected, 0);
    assert_eq!(analysis.synergies_found, 1);
    assert_eq!(analysis.overall_safety_status, SafetyStatus::Excellent);
}

#[tokio::test]
async fn test_repository_failing_everywhere_is_terminal() {
    let repository = Arc::new(FakeRepository::failing());
    let engine = engine(Arc::new(skincare_graph()), repository.clone());

    let result = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await;

    assert_eq!(result.unwrap_err(), AppError::Unavailable);
    // Semantic tier, then straight to emergency
    assert_eq!(repository.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_both_sources_down_is_terminal() {
    let engine = engine(
        Arc::new(FakeGraph::unreachable()),
        Arc::new(FakeRepository::failing()),
    );
    let result = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await;
    assert_eq!(result.unwrap_err(), AppError::Unavailable);
}

#[tokio::test]
async fn test_unreachable_graph_uses_database_tier() {
    let repository = FakeRepository::with_products(vec![
        product(1, "Water, Salicylic Acid"),
        product(2, "Water, Glycerin"),
    ]);
    let engine = engine(Arc::new(FakeGraph::unreachable()), Arc::new(repository));

    let response = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        response.metadata.fallback_path,
        vec![
            AlgorithmTier::SemanticReasoning,
            AlgorithmTier::DatabaseBasicFallback,
        ]
    );
    assert_eq!(response.recommendations[0].candidate.product.id, 1);
}

#[tokio::test]
async fn test_failed_graph_is_queried_once() {
    let graph = Arc::new(FakeGraph::unreachable());
    let repository = FakeRepository::with_products(vec![product(1, "Water, Salicylic Acid")]);
    let engine = engine(graph.clone(), Arc::new(repository));

    engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(graph.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_admissible_product_found_beyond_a_page_of_excluded_ones() {
    let label = "Water, Salicylic Acid, Niacinamide";
    let mut products: Vec<_> = (1..=500)
        .map(|id| with_fragrance_flag(product(id, label), SafetyFlag::False))
        .collect();
    products.push(with_fragrance_flag(product(501, label), SafetyFlag::True));
    let engine = engine(
        Arc::new(skincare_graph()),
        Arc::new(FakeRepository::with_products(products)),
    );

    let response = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.metadata.algorithm_type, AlgorithmTier::SemanticReasoning);
    let ids: Vec<i64> = response
        .recommendations
        .iter()
        .map(|r| r.candidate.product.id)
        .collect();
    assert_eq!(ids, vec![501]);
}

#[tokio::test]
async fn test_small_pages_still_rank_the_whole_catalog() {
    let label = "Water, Salicylic Acid, Niacinamide";
    let products = (1..=20)
        .map(|id| {
            let flag = if id % 2 == 0 { SafetyFlag::True } else { SafetyFlag::False };
            with_fragrance_flag(product(id, label), flag)
        })
        .collect();
    let repository = Arc::new(FakeRepository::with_products(products));
    let settings = EngineSettings {
        catalog_page_size: 3,
        ..EngineSettings::default()
    };
    let engine = engine_with(Arc::new(skincare_graph()), repository.clone(), &settings);

    let response = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<i64> = response
        .recommendations
        .iter()
        .map(|r| r.candidate.product.id)
        .collect();
    assert_eq!(ids, vec![2, 4, 6, 8, 10, 12, 14, 16, 18, 20]);
    // 10 admissible rows in pages of 3, the last one short
    assert_eq!(repository.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_products_without_ingredients_reach_emergency_tier() {
    let repository = FakeRepository::with_products(vec![
        product(1, ""),
        with_fragrance_flag(product(2, ""), SafetyFlag::False),
    ]);
    let engine = engine(Arc::new(skincare_graph()), Arc::new(repository));

    let response = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.metadata.algorithm_type, AlgorithmTier::EmergencyFallback);
    let ids: Vec<i64> = response
        .recommendations
        .iter()
        .map(|r| r.candidate.product.id)
        .collect();
    assert_eq!(ids, vec![1]);
}

#[tokio::test]
async fn test_never_more_than_twelve_and_scores_bounded() {
    let products = (1..=30)
        .map(|id| product(id, "Water, Niacinamide, Salicylic Acid, Glycerin"))
        .collect();
    let engine = engine(
        Arc::new(skincare_graph()),
        Arc::new(FakeRepository::with_products(products)),
    );

    let response = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.recommendations.len(), 12);
    assert!(response
        .recommendations
        .iter()
        .all(|r| r.candidate.final_score <= 100));
    // Equal scores fall back to ascending id
    let ids: Vec<i64> = response
        .recommendations
        .iter()
        .map(|r| r.candidate.product.id)
        .collect();
    assert_eq!(ids, (1..=12).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_identical_inputs_give_identical_output() {
    let products = vec![
        product(5, "Water, Niacinamide"),
        product(3, "Water, Salicylic Acid, Niacinamide"),
        with_fragrance_flag(product(8, "Niacinamide, Retinol, Vitamin C"), SafetyFlag::True),
        product(1, "Water, Zinc PCA"),
    ];
    let engine = engine(
        Arc::new(skincare_graph()),
        Arc::new(FakeRepository::with_products(products)),
    );

    let first = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();
    let second = engine
        .recommend(&oily_acne_fragrance(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.recommendations, second.recommendations);
    assert_eq!(first.explanation, second.explanation);
}

#[tokio::test]
async fn test_cancelled_request_touches_nothing() {
    let graph = Arc::new(skincare_graph());
    let repository = Arc::new(FakeRepository::with_products(vec![product(1, "Niacinamide")]));
    let engine = engine(graph.clone(), repository.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = engine.recommend(&oily_acne_fragrance(), &cancel).await;
    assert_eq!(result.unwrap_err(), AppError::Cancelled);
    assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
    assert_eq!(repository.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_conflicts_found_in_either_direction() {
    let ontology = OntologyService::new(
        Arc::new(skincare_graph()),
        "http://example.org/skin#".to_string(),
        Duration::from_secs(5),
    );
    let cancel = CancellationToken::new();

    for names in [["Retinol", "Vitamin C"], ["Vitamin C", "Retinol"]] {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let outcome = ontology.get_ingredient_conflicts(&names, &cancel).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.count, 1);
    }
}
