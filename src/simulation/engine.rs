use tracing::{debug, warn};

use crate::domain::forecast::ForecastItem;

use super::types::{ForecastItemPatch, ScenarioDelta};

/// Applies scenario deltas to a copy of the base items.
///
/// Deletes run first, then overrides in recorded order, then adds. An add
/// whose id is already present replaces that item, so resolving the same
/// deltas again yields the same set.
pub fn resolve(base: &[ForecastItem], deltas: &[ScenarioDelta]) -> Vec<ForecastItem> {
    let mut items = base.to_vec();

    for delta in deltas {
        if let ScenarioDelta::Delete { id } = delta {
            let before = items.len();
            items.retain(|item| item.id != *id);
            if before == items.len() {
                debug!(item_id = %id, "delete targets no item; ignored");
            }
        }
    }

    for delta in deltas {
        if let ScenarioDelta::Override { id, patch } = delta {
            let Some(item) = items.iter_mut().find(|item| item.id == *id) else {
                debug!(item_id = %id, "override targets no item; ignored");
                continue;
            };
            let mut patched = item.clone();
            apply_patch(&mut patched, patch);
            match patched.validate() {
                Ok(()) => *item = patched,
                Err(err) => warn!(item_id = %id, %err, "override rejected"),
            }
        }
    }

    for delta in deltas {
        if let ScenarioDelta::Add(added) = delta {
            match items.iter_mut().find(|item| item.id == added.id) {
                Some(existing) => *existing = added.clone(),
                None => items.push(added.clone()),
            }
        }
    }

    items
}

fn apply_patch(item: &mut ForecastItem, patch: &ForecastItemPatch) {
    if let Some(label) = &patch.label {
        item.label = label.clone();
    }
    if let Some(direction) = patch.direction {
        item.direction = direction;
    }
    if let Some(category) = &patch.category {
        item.category = category.clone();
    }
    if let Some(amount) = patch.amount {
        item.amount = amount;
    }
    if let Some(currency) = &patch.currency {
        item.currency = currency.clone();
    }
    if let Some(schedule) = &patch.schedule {
        item.schedule = schedule.clone();
    }
    if let Some(off_budget) = patch.off_budget {
        item.off_budget = off_budget;
    }
    if let Some(provisioning) = &patch.provisioning {
        item.provisioning = provisioning.clone();
    }
    if let Some(vat) = &patch.vat {
        item.vat = vat.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::common::Direction;
    use crate::domain::forecast::{Cadence, Schedule, VatBasis, VatLink};
    use crate::simulation::types::Scenario;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(category: &str, amount: rust_decimal::Decimal) -> ForecastItem {
        ForecastItem::new(
            Direction::Expense,
            category,
            amount,
            Schedule::periodic(Cadence::Monthly, date(2024, 1, 1), None).unwrap(),
        )
        .unwrap()
    }

    fn base() -> Vec<ForecastItem> {
        vec![item("Rent", dec!(1000)), item("Payroll", dec!(5000))]
    }

    #[test]
    fn empty_deltas_return_base() {
        let base = base();
        assert_eq!(resolve(&base, &[]), base);
    }

    #[test]
    fn resolution_leaves_base_untouched() {
        let base = base();
        let snapshot = base.clone();
        let scenario = Scenario::new("Cuts")
            .delete_item(base[0].id)
            .override_item(base[1].id, ForecastItemPatch::amount(dec!(4000)));
        let resolved = scenario.resolve(&base);
        assert_eq!(base, snapshot);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].amount, dec!(4000));
    }

    #[test]
    fn delete_wins_over_override_of_same_id() {
        let base = base();
        let deltas = vec![
            ScenarioDelta::Override {
                id: base[0].id,
                patch: ForecastItemPatch::amount(dec!(1)),
            },
            ScenarioDelta::Delete { id: base[0].id },
        ];
        let resolved = resolve(&base, &deltas);
        assert!(resolved.iter().all(|item| item.id != base[0].id));
    }

    #[test]
    fn later_overrides_win_per_field() {
        let base = base();
        let id = base[0].id;
        let first = ForecastItemPatch {
            amount: Some(dec!(1100)),
            label: Some("Office rent".into()),
            ..ForecastItemPatch::default()
        };
        let second = ForecastItemPatch {
            amount: Some(dec!(1200)),
            vat: Some(Some(VatLink::new("standard", VatBasis::Exclusive))),
            ..ForecastItemPatch::default()
        };
        let resolved = resolve(
            &base,
            &[
                ScenarioDelta::Override { id, patch: first },
                ScenarioDelta::Override { id, patch: second },
            ],
        );
        assert_eq!(resolved[0].amount, dec!(1200));
        assert_eq!(resolved[0].label, "Office rent");
        assert!(resolved[0].vat.is_some());
    }

    #[test]
    fn overrides_of_unknown_ids_are_ignored() {
        let base = base();
        let deltas = vec![ScenarioDelta::Override {
            id: Uuid::new_v4(),
            patch: ForecastItemPatch::amount(dec!(1)),
        }];
        assert_eq!(resolve(&base, &deltas), base);
    }

    #[test]
    fn invalid_override_keeps_original_item() {
        let base = base();
        let deltas = vec![ScenarioDelta::Override {
            id: base[0].id,
            patch: ForecastItemPatch::amount(dec!(-5)),
        }];
        assert_eq!(resolve(&base, &deltas), base);
    }

    #[test]
    fn resolving_twice_is_idempotent() {
        let base = base();
        let added = item("Marketing", dec!(300));
        let deltas = vec![
            ScenarioDelta::Add(added),
            ScenarioDelta::Override {
                id: base[1].id,
                patch: ForecastItemPatch::amount(dec!(4500)),
            },
        ];
        let once = resolve(&base, &deltas);
        let twice = resolve(&once, &deltas);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn deltas_serialize_with_kind_tag() {
        let delta = ScenarioDelta::Delete { id: Uuid::nil() };
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(json["kind"], "delete");
        let back: ScenarioDelta = serde_json::from_value(json).unwrap();
        assert_eq!(back, delta);
        assert!(back.summary().starts_with("Delete "));
    }

    #[test]
    fn null_in_patch_json_clears_nullable_fields() {
        let mut taxed = item("Software", dec!(120));
        taxed.vat = Some(VatLink::new("standard", VatBasis::Exclusive));
        let base = vec![taxed];

        let clear: ScenarioDelta = serde_json::from_value(serde_json::json!({
            "kind": "override",
            "id": base[0].id,
            "patch": { "vat": null }
        }))
        .unwrap();
        let resolved = resolve(&base, std::slice::from_ref(&clear));
        assert_eq!(resolved[0].vat, None);

        let untouched: ScenarioDelta = serde_json::from_value(serde_json::json!({
            "kind": "override",
            "id": base[0].id,
            "patch": { "amount": "150" }
        }))
        .unwrap();
        let resolved = resolve(&base, &[untouched]);
        assert_eq!(resolved[0].amount, dec!(150));
        assert!(resolved[0].vat.is_some());

        let json = serde_json::to_value(&clear).unwrap();
        assert!(json["patch"]["vat"].is_null());
        assert!(json["patch"].get("provisioning").is_none());
        assert_eq!(serde_json::from_value::<ScenarioDelta>(json).unwrap(), clear);
    }
}
