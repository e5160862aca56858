//! Mana payment fixtures
//!
//! One test per `.cost` file under `tests/fixtures/costs/`. A fixture names
//! a cost, the pool it is paid from, the expected outcome (`paid`, `failed`
//! or `choice <valid paths>`) and the pool contents afterwards. Lines
//! starting with `#` are comments.

use dir_test::{dir_test, Fixture};
use mtg_rules_rs::core::{Mana, ManaCost, ManaPool};
use mtg_rules_rs::game::PaymentOutcome;
use similar_asserts::assert_eq;

struct CostFixture {
    cost: ManaCost,
    pool: Mana,
    expect: String,
    left: Mana,
}

fn parse_mana(text: &str) -> Mana {
    if text.is_empty() || text == "none" {
        return Mana::default();
    }
    let parsed = ManaCost::parse(text).expect("mana should parse");
    assert!(parsed.choices.is_empty() && parsed.fixed.generic == 0, "not actual mana: {text}");
    parsed.fixed.specific()
}

fn parse_fixture(content: &str) -> CostFixture {
    let mut fields = std::collections::HashMap::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once(':').expect("key: value line");
        fields.insert(key.trim().to_string(), value.trim().to_string());
    }
    CostFixture {
        cost: ManaCost::parse(&fields["cost"]).expect("cost should parse"),
        pool: parse_mana(&fields["pool"]),
        expect: fields["expect"].clone(),
        left: parse_mana(fields.get("left").map_or("none", String::as_str)),
    }
}

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/tests/fixtures/costs",
    glob: "**/*.cost",
)]
fn test_cost_fixture(fixture: Fixture<&str>) {
    let case = parse_fixture(fixture.content());
    let mut pool = ManaPool::new();
    pool.add(case.pool);

    let affordable = pool.can_pay(&case.cost, None);
    let outcome = pool.pay(&case.cost, None, true);
    let described = match &outcome {
        PaymentOutcome::Paid => "paid".to_string(),
        PaymentOutcome::Failed => "failed".to_string(),
        PaymentOutcome::NeedsChoice(pending) => format!("choice {}", pending.valid_paths.len()),
    };

    assert_eq!(described, case.expect, "{}", fixture.path());
    assert_eq!(affordable, case.expect != "failed");
    assert_eq!(pool.contents(), case.left, "{}", fixture.path());
}
