/// Digits grouped the Indian way: the last three together, then pairs
/// (`25,22,880`, `1,00,00,000`).
fn group_indian(whole: u64) -> String {
    let digits = whole.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

fn grouped(value: f64) -> (&'static str, String) {
    if !value.is_finite() {
        return ("", "0".to_string());
    }
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    (sign, group_indian(rounded.abs() as u64))
}

/// On-screen currency: rupee sign, lakh/crore grouping, whole rupees.
pub fn format_inr(value: f64) -> String {
    let (sign, digits) = grouped(value);
    format!("{sign}₹{digits}")
}

/// Document currency. Uses the `Rs` prefix so plain-text output stays
/// readable without the rupee glyph.
pub fn format_rs(value: f64) -> String {
    let (sign, digits) = grouped(value);
    format!("{sign}Rs {digits}")
}

/// Compact axis/label form: `₹25.2L`, or `₹1.5Cr` from one crore upwards.
pub fn format_lakhs(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = if value.is_finite() { value.abs() } else { 0.0 };
    if abs >= 10_000_000.0 {
        format!("{sign}₹{:.1}Cr", abs / 10_000_000.0)
    } else {
        format!("{sign}₹{:.1}L", abs / 100_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_lakh_and_crore() {
        assert_eq!(format_inr(0.0), "₹0");
        assert_eq!(format_inr(999.0), "₹999");
        assert_eq!(format_inr(1_000.0), "₹1,000");
        assert_eq!(format_inr(100_000.0), "₹1,00,000");
        assert_eq!(format_inr(2_522_880.4), "₹25,22,880");
        assert_eq!(format_inr(10_000_000.0), "₹1,00,00,000");
        assert_eq!(format_inr(1_234_567_890.0), "₹1,23,45,67,890");
    }

    #[test]
    fn rounds_to_whole_rupees() {
        assert_eq!(format_inr(99.5), "₹100");
        assert_eq!(format_rs(3_333.33), "Rs 3,333");
        assert_eq!(format_inr(-15_000.0), "-₹15,000");
        assert_eq!(format_inr(f64::NAN), "₹0");
    }

    #[test]
    fn compact_lakh_form() {
        assert_eq!(format_lakhs(2_522_880.0), "₹25.2L");
        assert_eq!(format_lakhs(50_000.0), "₹0.5L");
        assert_eq!(format_lakhs(15_000_000.0), "₹1.5Cr");
    }
}
