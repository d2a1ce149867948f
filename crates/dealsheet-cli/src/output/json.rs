use dealsheet_core::error::DealsError;
use dealsheet_core::ParsedDeals;

pub fn print(parsed: &ParsedDeals) -> Result<(), DealsError> {
    let json = serde_json::to_string_pretty(parsed)?;
    println!("{json}");
    Ok(())
}
