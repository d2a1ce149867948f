use dealsheet_core::model::ParseDiagnostics;
use dealsheet_core::ParsedDeals;

pub fn print(parsed: &ParsedDeals) {
    println!("=== Deals {} to {} ===\n", parsed.starts_at, parsed.ends_at);

    if parsed.matrix.is_empty() {
        println!("  (no SKU deals)\n");
    } else {
        let max_sku = parsed
            .matrix
            .iter()
            .map(|r| r.sku.len())
            .max()
            .unwrap_or(6);

        for row in &parsed.matrix {
            let tiers: Vec<&str> = row.tiers.iter().map(|t| t.deal_text.as_str()).collect();
            println!("  {:<width$}  {}", row.sku, tiers.join(" / "), width = max_sku);
        }
        println!();
    }

    print_diagnostics(&parsed.diagnostics);

    if parsed.skipped_lines > 0 {
        println!("  {} line(s) skipped during parsing", parsed.skipped_lines);
    }
    if !parsed.warnings.is_empty() {
        println!("  Warnings:");
        for w in &parsed.warnings {
            println!("    {w}");
        }
    }
}

fn print_diagnostics(d: &ParseDiagnostics) {
    let fallback = if d.used_legacy_fallback {
        " (fallback)"
    } else {
        ""
    };
    println!("  Parser: {}{}", d.parser_engine, fallback);
    println!(
        "  Pages: {}  Headers: {}  SKU rows: {}  With free tiers: {}",
        d.parsed_pages, d.table_headers_detected, d.sku_rows_detected, d.sku_rows_with_free_tiers
    );
    println!(
        "  Skipped: {} without tiers, {} non-free\n",
        d.rows_skipped_no_tiers, d.rows_skipped_non_free
    );
}
