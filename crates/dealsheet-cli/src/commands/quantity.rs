use dealsheet_core::error::DealsError;
use dealsheet_core::parse_deal_text;
use dealsheet_core::quantity::{
    build_quantity_tiers, get_next_tier_progress, normalize_qty_for_deal, QtyNormalizeMode,
};

pub fn run(qty: i64, deals: &[String], mode: &str) -> Result<(), DealsError> {
    let mode: QtyNormalizeMode = mode.parse()?;

    let tiers = deals
        .iter()
        .map(|deal| {
            parse_deal_text(deal).ok_or_else(|| {
                DealsError::OptionsInvalid(format!(
                    "'{deal}' is not a free-goods deal (expected e.g. \"10+1\" or \"Buy 10 get 1 FREE\")"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let quantity_tiers = build_quantity_tiers(&tiers);
    let normalized = normalize_qty_for_deal(qty, &quantity_tiers, mode);
    let progress = get_next_tier_progress(i64::from(normalized), &quantity_tiers);

    if i64::from(normalized) == qty {
        println!("Quantity: {normalized}");
    } else {
        println!("Quantity: {qty} -> {normalized}");
    }

    match progress.next_target_qty {
        Some(target) => println!(
            "Next tier: {} more to reach {target}",
            progress.remaining
        ),
        None => println!("Top tier reached"),
    }

    Ok(())
}
