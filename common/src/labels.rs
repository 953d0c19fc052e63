//! Class table and display colors for the Mahogany inspection model.

/// Classes of the default inspection model, in model output order.
pub const CLASS_NAMES: &[&str] = &["mahogany leaves", "mahogany fruit", "mahogany branches"];

pub fn class_name(class_id: usize) -> &'static str {
    CLASS_NAMES.get(class_id).copied().unwrap_or("object")
}

/// BGR color for a class id.
pub fn class_color(class_id: usize) -> (f64, f64, f64) {
    match class_id {
        0 => (60.0, 200.0, 80.0),   // leaves (green)
        1 => (40.0, 140.0, 255.0),  // fruit (orange)
        2 => (200.0, 120.0, 60.0),  // branches (blue)
        _ => (210.0, 210.0, 210.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_classes_resolve() {
        assert_eq!(class_name(0), "mahogany leaves");
        assert_eq!(class_name(2), "mahogany branches");
    }

    #[test]
    fn unknown_class_falls_back() {
        assert_eq!(class_name(99), "object");
        assert_eq!(class_color(99), (210.0, 210.0, 210.0));
    }
}
