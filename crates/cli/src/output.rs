//! Human-readable output helpers

use crop_advisor_domain::usecases::amendment::{
    AmendmentReport, FactorAssessment, FactorStatus, OverallAssessment,
};
use crop_advisor_domain::{Factor, RankedCropResult};

/// Format an amount with thousands separators and two decimals, e.g. `₹1,234.50`
pub fn format_currency(value: f64, symbol: &str) -> String {
    if !value.is_finite() {
        return format!("{}{}", symbol, value);
    }

    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}{}.{}", sign, symbol, grouped, fraction)
}

/// Title-case a crop identifier for display
pub fn display_name(crop: &str) -> String {
    crop.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_ranking(results: &[RankedCropResult], currency: &str) {
    println!(
        "{:<4} {:<14} {:>10} {:>18} {:>16} {:>10} {:>18}",
        "#", "Crop", "Confidence", "Revenue", "Monthly Profit", "ROI", "Adjusted Profit"
    );
    for (i, r) in results.iter().enumerate() {
        println!(
            "{:<4} {:<14} {:>9.1}% {:>18} {:>16} {:>9.1}% {:>18}",
            i + 1,
            display_name(&r.crop),
            r.confidence * 100.0,
            format_currency(r.revenue, currency),
            format_currency(r.monthly_profit, currency),
            r.roi,
            format_currency(r.adjusted_profit, currency),
        );
    }
}

/// Advice sentence for one assessed factor
pub fn factor_advice(crop: &str, assessment: &FactorAssessment) -> String {
    let current = assessment.current;
    let optimal = assessment.optimal;
    let diff = assessment.diff.abs();

    match (assessment.factor, assessment.status) {
        (Factor::Nitrogen | Factor::Phosphorus | Factor::Potassium, FactorStatus::Deficient) => {
            let symbol = assessment.factor.label();
            format!(
                "The soil is deficient in {symbol}. Current level is {current:.1}, but optimal level for {crop} is around {optimal:.1}. Consider adding {symbol}-rich fertilizer to increase by approximately {diff:.1} units."
            )
        }
        (Factor::Nitrogen | Factor::Phosphorus | Factor::Potassium, FactorStatus::Excess) => {
            let symbol = assessment.factor.label();
            format!(
                "The soil has excess {symbol}. Current level is {current:.1}, but optimal level for {crop} is around {optimal:.1}. Avoid adding more {symbol} fertilizers for now."
            )
        }
        (Factor::Ph, FactorStatus::Deficient) => format!(
            "The soil pH is too acidic at {current:.1}. Optimal pH for {crop} is around {optimal:.1}. Consider adding agricultural lime to raise the pH by approximately {diff:.1} units."
        ),
        (Factor::Ph, FactorStatus::Excess) => format!(
            "The soil pH is too alkaline at {current:.1}. Optimal pH for {crop} is around {optimal:.1}. Consider adding sulfur or organic matter to lower the pH by approximately {diff:.1} units."
        ),
        (Factor::Rainfall, FactorStatus::Deficient) => format!(
            "The area receives insufficient rainfall. Current average is {current:.1}mm, but {crop} typically requires around {optimal:.1}mm. Consider supplemental irrigation of approximately {:.1} litres.",
            assessment.irrigation_litres.unwrap_or_default()
        ),
        (Factor::Rainfall, FactorStatus::Excess) => format!(
            "The area receives excess rainfall. Current average is {current:.1}mm, but {crop} typically grows best with around {optimal:.1}mm. Consider improved drainage to manage the excess {diff:.1}mm."
        ),
        (Factor::Humidity, FactorStatus::Deficient) => format!(
            "The humidity level is too low at {current:.1}%. Optimal humidity for {crop} is around {optimal:.1}%. This may increase water requirements."
        ),
        (Factor::Humidity, FactorStatus::Excess) => format!(
            "The humidity level is too high at {current:.1}%. Optimal humidity for {crop} is around {optimal:.1}%. This may increase disease risk."
        ),
        (Factor::Temperature, FactorStatus::Deficient) => format!(
            "The temperature is too cool at {current:.1}°C. Optimal temperature for {crop} is around {optimal:.1}°C. Consider adjusting the planting date or using row covers."
        ),
        (Factor::Temperature, FactorStatus::Excess) => format!(
            "The temperature is too warm at {current:.1}°C. Optimal temperature for {crop} is around {optimal:.1}°C. Consider providing shade or adjusting the planting date."
        ),
        (factor, FactorStatus::WithinRange) => format!(
            "The {} level of {current:.1} is within range for {crop} (optimal: {optimal:.1}).",
            factor.label()
        ),
    }
}

pub fn print_amendment(report: &AmendmentReport) {
    let crop = display_name(&report.crop);
    println!("Soil Amendment Recommendations for {}", crop);
    println!("======================================");
    println!();

    println!("Soil:");
    for assessment in report.factors.iter().filter(|f| {
        matches!(
            f.factor,
            Factor::Nitrogen | Factor::Phosphorus | Factor::Potassium | Factor::Ph
        )
    }) {
        println!("  - {}", factor_advice(&report.crop, assessment));
    }
    println!();

    println!("Environment:");
    for assessment in report.factors.iter().filter(|f| {
        matches!(
            f.factor,
            Factor::Rainfall | Factor::Humidity | Factor::Temperature
        )
    }) {
        println!("  - {}", factor_advice(&report.crop, assessment));
    }
    println!();

    let verdict = match report.overall {
        OverallAssessment::Excellent => "conditions are excellent",
        OverallAssessment::Favorable => "conditions are favorable with minor adjustments",
        OverallAssessment::Moderate => "conditions need moderate amendments",
        OverallAssessment::Challenging => "conditions are challenging; consider another crop",
    };
    println!(
        "Overall: {} ({} of {} factors outside range)",
        verdict,
        report.significant_deviations,
        report.factors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(1234567.891, "₹"), "₹1,234,567.89");
        assert_eq!(format_currency(999.5, "$"), "$999.50");
        assert_eq!(format_currency(1000.0, "₹"), "₹1,000.00");
        assert_eq!(format_currency(0.0, "₹"), "₹0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(-5250.0, "₹"), "-₹5,250.00");
        assert_eq!(format_currency(-0.001, "₹"), "₹0.00");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("kidneybeans"), "Kidneybeans");
        assert_eq!(display_name("pigeon_peas"), "Pigeon Peas");
    }
}
