//! Integration tests for Slice 4 - Seeds, PRNG & Slot Selection
//!
//! Tests the path: content seed → derive_seed → Lcg / FamilySelector

use emblem::core::{content_seed, derive_seed, stable_hash, ExpressionBuilder, FamilySelector, Lcg};
use emblem::types::{Dynamics, Intent, MeaningMeta, MeaningModel, SlotLayout, Texture};
use emblem::HASH_ALGORITHM;
use chrono::Utc;

/// Pinned reference values; a change here breaks every stored seed
#[test]
fn test_hash_reference_values() {
    assert_eq!(HASH_ALGORITHM, "h31-utf16-v1");
    assert_eq!(stable_hash(""), 0);
    assert_eq!(stable_hash("a"), 97);
    assert_eq!(stable_hash("ab"), 3105);
    assert_eq!(stable_hash("hello"), 99_162_322);
    assert_eq!(derive_seed("a", "b"), content_seed("a:b"));
}

/// seed(hash(T), g) twice → same string and same first 1,000 draws
#[test]
fn test_seed_and_prng_determinism() {
    let texts = ["", "a", "The quick brown fox", "ĳsvogel en œuvre", "🜂 emoji and 中文"];
    for text in texts {
        let base = content_seed(text).key;
        for tag in ["backdrop", "frame", "mark", ""] {
            let first = derive_seed(&base, tag);
            let second = derive_seed(&base, tag);
            assert_eq!(first, second);
            assert!(first.unit() >= 0.0 && first.unit() < 1.0);

            let mut a = Lcg::from_key(&first.key);
            let mut b = Lcg::from_key(&second.key);
            for _ in 0..1000 {
                assert_eq!(a.next_u32(), b.next_u32());
            }
        }
    }
}

/// LCG sequence from a known state
#[test]
fn test_lcg_reference_sequence() {
    let mut rng = Lcg::new(0);
    assert_eq!(rng.next_u32(), 1_013_904_223);
    assert_eq!(rng.next_u32(), 1_196_435_762);
    let draws: Vec<f64> = Lcg::new(42).take(100).map(|v| v as f64 / 4_294_967_296.0).collect();
    assert!(draws.iter().all(|d| (0.0..1.0).contains(d)));
}

fn sample_models(rng: &mut Lcg) -> (MeaningModel, emblem::types::ExpressionModel) {
    let mm = MeaningModel {
        intent: Intent {
            analytical: rng.next_f64(),
            contemplative: rng.next_f64(),
            ritual: rng.next_f64(),
            contested: rng.next_f64(),
        },
        texture: Texture {
            structural_complexity: rng.next_f64(),
            historical_depth: rng.next_f64(),
            personal_intimacy: rng.next_f64(),
            cyclicality: rng.next_f64(),
        },
        dynamics: Dynamics {
            velocity: rng.next_f64(),
            entropy: rng.next_f64(),
            polarity: rng.next_f64(),
        },
        meta: MeaningMeta {
            seed: rng.next_u32().to_string(),
            length_words: 10,
            timestamp: Utc::now(),
        },
    };
    let em = ExpressionBuilder::new().build(&mm);
    (mm, em)
}

/// Three selected families are pairwise distinct for 10,000 base seeds
#[test]
fn test_non_collision_ten_thousand_seeds() {
    let selector = FamilySelector::new(SlotLayout::standard());
    let mut rng = Lcg::new(0x5eed);
    let texts = ["", "short", "a considerably longer text that spans all three slot slices evenly"];

    for i in 0..10_000 {
        let (mm, em) = sample_models(&mut rng);
        let base = content_seed(&rng.next_u32().to_string()).key;
        let selection = selector.select(&base, texts[i % texts.len()], &mm, &em);
        let families = selection.families();
        assert_eq!(families.len(), 3);
        assert_ne!(families[0], families[1], "seed {}", base);
        assert_ne!(families[1], families[2], "seed {}", base);
        assert_ne!(families[0], families[2], "seed {}", base);
    }
}

/// Same inputs → same three families and seeds
#[test]
fn test_selection_reproducible() {
    let mut rng = Lcg::new(1);
    let (mm, em) = sample_models(&mut rng);
    let selector = FamilySelector::default();
    let a = selector.select("k9x", "some source text", &mm, &em);
    let b = FamilySelector::default().select("k9x", "some source text", &mm, &em);
    assert_eq!(a, b);

    let roles: Vec<&str> = a.assignments.iter().map(|s| s.role.as_str()).collect();
    assert_eq!(roles, vec!["backdrop", "frame", "mark"]);
}

/// Families always come from the slot's own pool
#[test]
fn test_families_drawn_from_pools() {
    let layout = SlotLayout::standard();
    let selector = FamilySelector::new(layout.clone());
    let mut rng = Lcg::new(77);
    for _ in 0..200 {
        let (mm, em) = sample_models(&mut rng);
        let selection = selector.select(&mm.meta.seed, "pool check", &mm, &em);
        for (slot, assignment) in layout.slots().iter().zip(&selection.assignments) {
            assert!(slot.pool.contains(&assignment.family));
            assert!(!assignment.forced);
        }
    }
}
