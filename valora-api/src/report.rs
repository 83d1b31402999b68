//! pt-BR console formatting for benchmark output

use valora_order::{Checkpoint, RunResult};

/// `1234567` -> `1.234.567`
pub fn format_integer_br(n: u64) -> String {
    group_thousands(&n.to_string())
}

/// Fixed `places` decimals, `.` as thousands separator and `,` as decimal mark
pub fn format_decimal_br(x: f64, places: usize) -> String {
    let fixed = format!("{:.*}", places, x.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    // -0,00 prints as 0,00
    let negative = x < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac_part) = frac_part {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

/// `R$ 252.499.706.518,10`
pub fn format_currency_brl(x: f64) -> String {
    format!("R$ {}", format_decimal_br(x, 2))
}

/// `100.000.000 processed | 17.14s`
pub fn format_checkpoint(checkpoint: &Checkpoint) -> String {
    format!(
        "{} processed | {:.2}s",
        format_integer_br(checkpoint.processed),
        checkpoint.elapsed.as_secs_f64()
    )
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Multi-line report for one run, `total_secs` being the caller-observed time
pub fn render_run(label: &str, result: &RunResult, total_secs: f64) -> String {
    let totals = &result.totals;
    let mut lines = vec![
        format!("{} ({} pedidos)", label, format_integer_br(result.record_count)),
        "-".repeat(30),
        format!(
            "  - Tempo de execução (Kernel): {}s",
            format_decimal_br(result.execution_time(), 4)
        ),
        format!("  - Tempo total:                {}s", format_decimal_br(total_secs, 4)),
        format!("  - Pedidos por segundo:        {}", format_decimal_br(result.ops_per_sec(), 0)),
    ];
    if let Some(cores) = result.cores_used {
        lines.push(format!("  - Núcleos utilizados:         {}", cores));
    }
    lines.extend([
        String::new(),
        "Totais Financeiros Processados:".to_string(),
        format!("  - Valor Produtos:  {}", format_currency_brl(totals.sum_value)),
        format!("  - Impostos:        {}", format_currency_brl(totals.sum_taxes)),
        format!("  - Frete:           {}", format_currency_brl(totals.sum_freight)),
        format!("  - Descontos:       {}", format_currency_brl(totals.sum_discount)),
        format!("  - TOTAL FINAL:     {}", format_currency_brl(totals.sum_total)),
    ]);
    lines.join("\n")
}
